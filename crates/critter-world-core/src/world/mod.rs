pub mod lifecycle;
pub mod metrics;

pub use metrics::*;

use crate::config::{Cluster, SimConfig, SimConfigError};
use crate::critter::Critter;
use crate::event::WorldEvent;
use crate::geometry::{self, Bounds};
use crate::rng::create_rng;
use crate::sensor::{FeelSensor, HearSensor, Sensor};
use crate::sound::Sound;
use crate::spatial::{SpatialIndex, ThingLocation};
use crate::thing::{Thing, ThingBody, ThingId, ThingKind, Vitals};
use rand::seq::IndexedRandom;
use rand::Rng;
use rand_chacha::ChaCha12Rng;
use std::collections::HashMap;
use std::{error::Error, fmt};
use tracing::info;

/// Owns every thing in the torus, the spatial index over their footprints,
/// recent sounds and the random source, and advances them tick by tick.
pub struct World {
    /// Things in stepping order.
    pub(crate) things: Vec<Thing>,
    pub(crate) slots: HashMap<ThingId, usize>,
    pub(crate) index: SpatialIndex,
    pub(crate) sounds: Vec<Sound>,
    pub(crate) config: SimConfig,
    pub(crate) rng: ChaCha12Rng,
    pub(crate) next_thing_id: u64,
    pub(crate) tick: u64,
    pub(crate) learning_enabled: bool,
    pub(crate) events: Vec<WorldEvent>,
    pub(crate) total_deaths: usize,
    pub(crate) total_placement_failures: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpawnError {
    /// No admissible position was found within the attempt budget.
    PlacementFailed { kind: ThingKind, attempts: usize },
    /// The kind already has its configured maximum count.
    PopulationFull { kind: ThingKind, maximum: usize },
}

impl fmt::Display for SpawnError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpawnError::PlacementFailed { kind, attempts } => write!(
                f,
                "no free position for {kind} after {attempts} attempts"
            ),
            SpawnError::PopulationFull { kind, maximum } => {
                write!(f, "{kind} population is at its maximum ({maximum})")
            }
        }
    }
}

impl Error for SpawnError {}

#[derive(Debug, Clone, PartialEq)]
pub enum WorldInitError {
    Config(SimConfigError),
    Spawn(SpawnError),
}

impl fmt::Display for WorldInitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorldInitError::Config(e) => write!(f, "{}", e),
            WorldInitError::Spawn(e) => write!(f, "initial population failed: {}", e),
        }
    }
}

impl From<SimConfigError> for WorldInitError {
    fn from(err: SimConfigError) -> Self {
        WorldInitError::Config(err)
    }
}

impl From<SpawnError> for WorldInitError {
    fn from(err: SpawnError) -> Self {
        WorldInitError::Spawn(err)
    }
}

impl Error for WorldInitError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            WorldInitError::Config(e) => Some(e),
            WorldInitError::Spawn(e) => Some(e),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExperimentError {
    InvalidSampleEvery,
    TooManySteps { max: usize, actual: usize },
    TooManySamples { max: usize, actual: usize },
}

impl fmt::Display for ExperimentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExperimentError::InvalidSampleEvery => write!(f, "sample_every must be positive"),
            ExperimentError::TooManySteps { max, actual } => {
                write!(f, "steps ({actual}) exceed supported maximum ({max})")
            }
            ExperimentError::TooManySamples { max, actual } => {
                write!(
                    f,
                    "sample count ({actual}) exceeds supported maximum ({max})"
                )
            }
        }
    }
}

impl Error for ExperimentError {}

/// Candidate position for a new thing. Inside a randomly chosen cluster when
/// any are given, otherwise uniform over the world inset by `radius`.
///
/// The cluster sample draws the x offset over the full radius first and the
/// y offset within the remaining chord, so density is higher near the axes
/// than for a uniform disk.
fn sample_candidate<R: Rng + ?Sized>(
    rng: &mut R,
    clusters: &[Cluster],
    width: f64,
    height: f64,
    radius: f64,
) -> [f64; 2] {
    match clusters.choose(rng) {
        Some(cluster) => {
            let r = cluster.radius;
            let mut x = rng.random_range(0.0..=r);
            let mut y = rng.random_range(0.0..=(r * r - x * x).max(0.0).sqrt());
            if rng.random_bool(0.5) {
                x = -x;
            }
            if rng.random_bool(0.5) {
                y = -y;
            }
            geometry::wrap_position(
                [cluster.center[0] + x, cluster.center[1] + y],
                width,
                height,
            )
        }
        None => [
            rng.random_range(radius..=width - radius),
            rng.random_range(radius..=height - radius),
        ],
    }
}

impl World {
    pub const MAX_EXPERIMENT_STEPS: usize = 1_000_000;
    pub const MAX_EXPERIMENT_SAMPLES: usize = 50_000;

    pub fn new(config: SimConfig) -> Self {
        Self::try_new(config).unwrap_or_else(|e| panic!("{e}"))
    }

    /// Validate `config`, then create the initial populations.
    pub fn try_new(config: SimConfig) -> Result<Self, WorldInitError> {
        config.validate()?;
        let mut world = Self {
            things: Vec::new(),
            slots: HashMap::new(),
            index: SpatialIndex::new(),
            sounds: Vec::new(),
            rng: create_rng(config.seed),
            next_thing_id: 0,
            tick: 0,
            learning_enabled: config.learning_enabled,
            events: Vec::new(),
            total_deaths: 0,
            total_placement_failures: 0,
            config,
        };
        world.populate_initial()?;
        Ok(world)
    }

    fn populate_initial(&mut self) -> Result<(), SpawnError> {
        let initial: Vec<(ThingKind, usize)> = self
            .config
            .populations
            .iter()
            .map(|p| (p.kind, p.initial))
            .collect();
        for (kind, count) in initial {
            for _ in 0..count {
                self.spawn(kind)?;
            }
        }
        Ok(())
    }

    /// Remove everything, recreate the initial populations and zero the tick
    /// counter. Ids keep increasing across resets.
    pub fn reset(&mut self) -> Result<(), WorldInitError> {
        self.things.clear();
        self.slots.clear();
        self.index.clear();
        self.sounds.clear();
        self.tick = 0;
        self.emit(WorldEvent::Reset);
        self.populate_initial()?;
        info!(things = self.things.len(), "world reset");
        Ok(())
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn width(&self) -> f64 {
        self.config.width
    }

    pub fn height(&self) -> f64 {
        self.config.height
    }

    pub fn things(&self) -> &[Thing] {
        &self.things
    }

    pub fn thing(&self, id: ThingId) -> Option<&Thing> {
        self.slots.get(&id).map(|&slot| &self.things[slot])
    }

    pub fn critter(&self, id: ThingId) -> Option<&Critter> {
        self.thing(id).and_then(Thing::critter)
    }

    /// Mutable critter access, e.g. to seed a Q-table or set a heading.
    pub fn critter_mut(&mut self, id: ThingId) -> Option<&mut Critter> {
        let slot = *self.slots.get(&id)?;
        self.things[slot].critter_mut()
    }

    pub fn sounds(&self) -> &[Sound] {
        &self.sounds
    }

    pub fn learning_enabled(&self) -> bool {
        self.learning_enabled
    }

    /// Switch learning on (configured rate) or off (rate 0) for every critter,
    /// including those spawned later.
    pub fn set_learning(&mut self, enabled: bool) {
        self.learning_enabled = enabled;
        let eta = self.config.eta(enabled);
        for critter in self.things.iter_mut().filter_map(Thing::critter_mut) {
            critter.eta = eta;
        }
        info!(enabled, eta, "learning toggled");
    }

    /// Number of live things of `kind`.
    pub fn population_count(&self, kind: ThingKind) -> usize {
        self.things
            .iter()
            .filter(|t| t.kind == kind && t.alive())
            .count()
    }

    /// Whether any thing of `kind`, other than `exclude`, intersects `bounds`.
    pub fn overlaps(&self, bounds: &Bounds, kind: ThingKind, exclude: Option<ThingId>) -> bool {
        self.index.overlaps(bounds, kind, exclude)
    }

    /// Things of any kind whose footprint intersects `bounds`, except `exclude`.
    pub fn query_overlapping(&self, bounds: &Bounds, exclude: Option<ThingId>) -> Vec<&Thing> {
        self.index
            .query_overlapping(bounds, exclude)
            .filter_map(|loc| self.thing(loc.id))
            .collect()
    }

    /// Spawn one `kind` at a sampled position that does not overlap a solid thing,
    /// honoring the kind's clusters and maximum.
    pub fn spawn(&mut self, kind: ThingKind) -> Result<ThingId, SpawnError> {
        self.check_capacity(kind)?;
        let radius = self.config.thing_radius;
        let (width, height) = (self.config.width, self.config.height);
        let clusters: &[Cluster] = self
            .config
            .populations
            .iter()
            .find(|p| p.kind == kind)
            .map(|p| p.clusters.as_slice())
            .unwrap_or_default();

        let attempts = self.config.max_spawn_attempts;
        for _ in 0..attempts {
            let candidate = sample_candidate(&mut self.rng, clusters, width, height, radius);
            let footprint = Bounds::around(candidate, radius);
            if !self.index.blocks(&footprint, None) {
                return Ok(self.place(kind, candidate));
            }
        }
        Err(SpawnError::PlacementFailed { kind, attempts })
    }

    /// Place a thing at an explicit position (wrapped into the torus) without
    /// solid-overlap rejection. The kind's maximum still applies.
    pub fn insert_thing(
        &mut self,
        kind: ThingKind,
        position: [f64; 2],
    ) -> Result<ThingId, SpawnError> {
        self.check_capacity(kind)?;
        let position = geometry::wrap_position(position, self.config.width, self.config.height);
        Ok(self.place(kind, position))
    }

    fn check_capacity(&self, kind: ThingKind) -> Result<(), SpawnError> {
        let maximum = self.config.population(kind).and_then(|p| p.maximum);
        match maximum {
            Some(maximum) if self.population_count(kind) >= maximum => {
                Err(SpawnError::PopulationFull { kind, maximum })
            }
            _ => Ok(()),
        }
    }

    fn next_id(&mut self) -> ThingId {
        let id = ThingId(self.next_thing_id);
        self.next_thing_id += 1;
        id
    }

    fn build_body(&mut self, kind: ThingKind) -> ThingBody {
        let vitals = Vitals::new(self.config.initial_strength);
        let sensor = match kind {
            ThingKind::Clod => return ThingBody::Clod,
            ThingKind::Plasmoid => return ThingBody::Plasmoid(vitals),
            ThingKind::Diskoid => Sensor::Feel(FeelSensor::new(
                self.config.feelers.clone(),
                self.config.feel_textures.clone(),
            )),
            ThingKind::Pentoid => Sensor::Hear(HearSensor::new(self.config.hearing)),
        };
        let heading = f64::from(self.rng.random_range(0..360u16));
        let food = kind.food().unwrap_or(ThingKind::Plasmoid);
        ThingBody::Critter(Box::new(Critter::new(
            vitals,
            heading,
            sensor,
            food,
            self.config.actions.clone(),
            &self.config.learning,
            self.config.eta(self.learning_enabled),
        )))
    }

    /// Construct, store and index a thing at `position`.
    fn place(&mut self, kind: ThingKind, position: [f64; 2]) -> ThingId {
        let id = self.next_id();
        let body = self.build_body(kind);
        let thing = Thing {
            id,
            kind,
            position,
            radius: self.config.thing_radius,
            texture: kind.texture(),
            solid: kind.is_solid(),
            body,
        };
        let heading = thing.critter().map(|c| c.heading);
        self.index.insert(ThingLocation::of(&thing));
        self.slots.insert(id, self.things.len());
        self.things.push(thing);
        self.emit(WorldEvent::Spawned {
            id,
            kind,
            position,
            heading,
        });
        id
    }

    pub(crate) fn emit(&mut self, event: WorldEvent) {
        if self.config.record_events {
            self.events.push(event);
        }
    }

    /// Take every event recorded since the last drain.
    pub fn drain_events(&mut self) -> Vec<WorldEvent> {
        std::mem::take(&mut self.events)
    }

    /// Snapshot of one thing for inspection, including a labelled Q-table
    /// for critters.
    pub fn describe(&self, id: ThingId) -> Option<ThingDescription> {
        let thing = self.thing(id)?;
        let vitals = thing.vitals();
        let critter = thing.critter();
        let brain = critter.map(|c| {
            let actions = c.actions().iter().map(|a| a.name().to_string()).collect();
            let rows = c
                .q()
                .rows()
                .enumerate()
                .map(|(state, values)| QRow {
                    state,
                    labels: labels_of(&c.sensor, state),
                    values: values.to_vec(),
                    best: c.q().best_action(state),
                })
                .collect();
            QTableView { actions, rows }
        });
        Some(ThingDescription {
            id,
            kind: thing.kind,
            position: thing.position,
            alive: thing.alive(),
            strength: vitals.map(|v| v.strength),
            age: vitals.map(|v| v.age),
            heading: critter.map(|c| c.heading),
            last_sensed: critter.and_then(|c| c.last().map(|t| labels_of(&c.sensor, t.state))),
            q_table: brain,
        })
    }

    /// Step `n` times and report the resulting populations.
    pub fn run(&mut self, n: usize) -> PopulationStats {
        for _ in 0..n {
            self.step();
        }
        self.population_stats()
    }

    pub fn run_experiment(&mut self, steps: usize, sample_every: usize) -> RunSummary {
        self.try_run_experiment(steps, sample_every)
            .unwrap_or_else(|e| panic!("{e}"))
    }

    pub fn try_run_experiment(
        &mut self,
        steps: usize,
        sample_every: usize,
    ) -> Result<RunSummary, ExperimentError> {
        if sample_every == 0 {
            return Err(ExperimentError::InvalidSampleEvery);
        }
        if steps > Self::MAX_EXPERIMENT_STEPS {
            return Err(ExperimentError::TooManySteps {
                max: Self::MAX_EXPERIMENT_STEPS,
                actual: steps,
            });
        }
        let estimated_samples = if steps == 0 {
            0
        } else {
            ((steps - 1) / sample_every) + 1
        };
        if estimated_samples > Self::MAX_EXPERIMENT_SAMPLES {
            return Err(ExperimentError::TooManySamples {
                max: Self::MAX_EXPERIMENT_SAMPLES,
                actual: estimated_samples,
            });
        }

        let deaths_before = self.total_deaths;
        let failures_before = self.total_placement_failures;
        let mut samples = Vec::with_capacity(estimated_samples);
        for step in 1..=steps {
            self.step();
            if step % sample_every == 0 || step == steps {
                samples.push(self.population_stats());
            }
        }
        Ok(RunSummary {
            schema_version: 1,
            steps,
            sample_every,
            final_tick: self.tick,
            samples,
            total_deaths: self.total_deaths - deaths_before,
            placement_failures: self.total_placement_failures - failures_before,
        })
    }
}

fn labels_of(sensor: &Sensor, state: usize) -> Vec<String> {
    sensor
        .decode(state)
        .labels()
        .into_iter()
        .map(str::to_string)
        .collect()
}
