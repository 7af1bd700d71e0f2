pub mod config;
pub mod critter;
pub mod event;
pub mod geometry;
pub mod qtable;
pub mod rng;
pub mod sensor;
pub mod sound;
pub mod spatial;
pub mod thing;
pub mod world;

pub use config::{SimConfig, SimConfigError};
pub use event::WorldEvent;
pub use thing::{ThingId, ThingKind};
pub use world::{
    ExperimentError, PopulationStats, RunSummary, SpawnError, StepReport, ThingDescription,
    World, WorldInitError,
};
