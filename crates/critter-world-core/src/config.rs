use crate::critter::{Action, LearningParams};
use crate::sensor::{FeelSensor, FeelerSpec, HearingConfig};
use crate::thing::{ThingKind, Texture};
use serde::{Deserialize, Serialize};
use std::{error::Error, fmt};

/// Circular spawn region: new things of the owning kind land inside it.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Cluster {
    pub center: [f64; 2],
    pub radius: f64,
}

/// Population targets for one kind.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PopulationSpec {
    pub kind: ThingKind,
    /// Count created at construction and on reset.
    #[serde(default)]
    pub initial: usize,
    /// Count restored at the start of every tick.
    #[serde(default)]
    pub minimum: Option<usize>,
    /// Spawning refuses beyond this count.
    #[serde(default)]
    pub maximum: Option<usize>,
    /// When non-empty, spawns are placed inside one of these regions.
    #[serde(default)]
    pub clusters: Vec<Cluster>,
}

impl PopulationSpec {
    pub fn new(kind: ThingKind, initial: usize) -> Self {
        Self {
            kind,
            initial,
            minimum: None,
            maximum: None,
            clusters: Vec::new(),
        }
    }
}

/// Signed strength changes attached to living and acting.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CostConfig {
    /// Paid every tick just for living.
    pub step_cost: f64,
    /// Move blocked by a clod.
    pub hard_bump_cost: f64,
    /// Any eat attempt.
    pub eat_cost: f64,
    pub move_cost: f64,
    pub turn_cost: f64,
    /// Gained per food item eaten.
    pub food_reward: f64,
}

impl Default for CostConfig {
    fn default() -> Self {
        Self {
            step_cost: 0.0,
            hard_bump_cost: -3.0,
            eat_cost: -2.0,
            move_cost: -1.0,
            turn_cost: -1.0,
            food_reward: 22.0,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Deterministic seed for reproducible simulation runs.
    pub seed: u64,
    /// Width of the toroidal world in world units.
    pub width: f64,
    /// Height of the toroidal world in world units.
    pub height: f64,
    /// Footprint radius shared by every thing.
    pub thing_radius: f64,
    /// Strength every organism starts with.
    pub initial_strength: f64,
    /// Population targets, spawned in this order. Obstacles should come first
    /// so later kinds avoid them.
    pub populations: Vec<PopulationSpec>,
    pub learning: LearningParams,
    /// Whether critters start with `learning.learning_rate` or a frozen table.
    pub learning_enabled: bool,
    pub costs: CostConfig,
    /// Distance covered by one move action.
    pub move_dist: f64,
    /// How far a footprint may sink into a clod without colliding.
    pub bump_offset: f64,
    /// Half-extent of the box in front of the mouth searched by eat.
    pub eat_range: f64,
    /// Nominal turn in degrees.
    pub turn_angle: f64,
    /// Integer turn noise amplitude in degrees.
    pub turn_noise: i32,
    /// Ordered action list shared by every critter.
    pub actions: Vec<Action>,
    /// Feelers of the texture sensor.
    pub feelers: Vec<FeelerSpec>,
    /// Feature alphabet of the texture sensor.
    pub feel_textures: Vec<Texture>,
    pub hearing: HearingConfig,
    /// Ticks a feeding sound stays audible.
    pub sound_horizon: u32,
    /// Placement attempts before a spawn is reported as failed.
    pub max_spawn_attempts: usize,
    /// Record presentation events for `World::drain_events`.
    pub record_events: bool,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            width: 450.0,
            height: 450.0,
            thing_radius: 10.0,
            initial_strength: 5000.0,
            populations: vec![
                PopulationSpec::new(ThingKind::Clod, 4),
                PopulationSpec::new(ThingKind::Diskoid, 16),
                PopulationSpec::new(ThingKind::Pentoid, 5),
                PopulationSpec {
                    kind: ThingKind::Plasmoid,
                    initial: 95,
                    minimum: Some(80),
                    maximum: Some(120),
                    clusters: vec![
                        Cluster {
                            center: [100.0, 100.0],
                            radius: 40.0,
                        },
                        Cluster {
                            center: [300.0, 300.0],
                            radius: 80.0,
                        },
                    ],
                },
            ],
            learning: LearningParams::default(),
            learning_enabled: false,
            costs: CostConfig::default(),
            move_dist: 12.0,
            bump_offset: 0.0,
            eat_range: 5.0,
            turn_angle: 90.0,
            turn_noise: 5,
            actions: vec![Action::Move, Action::TurnLeft, Action::TurnRight, Action::Eat],
            feelers: vec![
                FeelerSpec::new(0.0, 13.0),
                FeelerSpec::new(90.0, 13.0),
                FeelerSpec::new(2.0, 20.0),
                FeelerSpec::new(270.0, 13.0),
            ],
            feel_textures: vec![Texture::Hard, Texture::Soft],
            hearing: HearingConfig::default(),
            sound_horizon: 4,
            max_spawn_attempts: 1000,
            record_events: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SimConfigError {
    InvalidWorldSize,
    WorldSizeTooLarge { max: f64, actual: f64 },
    InvalidThingRadius,
    InvalidInitialStrength,
    DuplicatePopulation(ThingKind),
    MinimumAboveMaximum { kind: ThingKind, minimum: usize, maximum: usize },
    InitialAboveMaximum { kind: ThingKind, initial: usize, maximum: usize },
    InvalidCluster { kind: ThingKind, index: usize },
    InvalidLearningRate,
    InvalidGamma,
    InvalidExploitation,
    InvalidCost(&'static str),
    InvalidMoveDist,
    InvalidEatRange,
    InvalidBumpOffset,
    InvalidTurn,
    EmptyActions,
    DuplicateAction(Action),
    EmptyFeelers,
    InvalidFeeler { index: usize },
    EmptyTextures,
    DuplicateTexture(Texture),
    TooManySensorStates { max: usize },
    InvalidHearing,
    InvalidSoundHorizon,
    InvalidSpawnAttempts,
}

impl fmt::Display for SimConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimConfigError::InvalidWorldSize => {
                write!(f, "width and height must be positive and finite")
            }
            SimConfigError::WorldSizeTooLarge { max, actual } => {
                write!(f, "world dimension ({actual}) exceeds supported maximum ({max})")
            }
            SimConfigError::InvalidThingRadius => write!(
                f,
                "thing_radius must be positive, finite and smaller than half the world"
            ),
            SimConfigError::InvalidInitialStrength => {
                write!(f, "initial_strength must be positive and finite")
            }
            SimConfigError::DuplicatePopulation(kind) => {
                write!(f, "population for {kind} is specified more than once")
            }
            SimConfigError::MinimumAboveMaximum {
                kind,
                minimum,
                maximum,
            } => write!(
                f,
                "{kind} minimum ({minimum}) must not exceed maximum ({maximum})"
            ),
            SimConfigError::InitialAboveMaximum {
                kind,
                initial,
                maximum,
            } => write!(
                f,
                "{kind} initial count ({initial}) must not exceed maximum ({maximum})"
            ),
            SimConfigError::InvalidCluster { kind, index } => write!(
                f,
                "{kind} cluster {index} needs a finite center inside the world and a positive radius"
            ),
            SimConfigError::InvalidLearningRate => {
                write!(f, "learning_rate must be finite and within [0,1]")
            }
            SimConfigError::InvalidGamma => write!(f, "gamma must be finite and within [0,1]"),
            SimConfigError::InvalidExploitation => {
                write!(f, "exploitation must be finite and non-negative")
            }
            SimConfigError::InvalidCost(name) => write!(f, "{name} must be finite"),
            SimConfigError::InvalidMoveDist => write!(f, "move_dist must be positive and finite"),
            SimConfigError::InvalidEatRange => {
                write!(f, "eat_range must be finite and non-negative")
            }
            SimConfigError::InvalidBumpOffset => write!(
                f,
                "bump_offset must be finite, non-negative and smaller than thing_radius"
            ),
            SimConfigError::InvalidTurn => write!(
                f,
                "turn_angle must be finite and turn_noise must be within [0,180]"
            ),
            SimConfigError::EmptyActions => write!(f, "actions must not be empty"),
            SimConfigError::DuplicateAction(action) => {
                write!(f, "action {} is listed more than once", action.name())
            }
            SimConfigError::EmptyFeelers => write!(f, "feelers must not be empty"),
            SimConfigError::InvalidFeeler { index } => {
                write!(f, "feeler {index} needs a finite angle and a positive length")
            }
            SimConfigError::EmptyTextures => write!(f, "feel_textures must not be empty"),
            SimConfigError::DuplicateTexture(texture) => {
                write!(f, "texture {} is listed more than once", texture.label())
            }
            SimConfigError::TooManySensorStates { max } => {
                write!(f, "texture sensor would need more than {max} states")
            }
            SimConfigError::InvalidHearing => write!(
                f,
                "hearing needs 0 < near_limit < far_limit and a positive finite radius"
            ),
            SimConfigError::InvalidSoundHorizon => {
                write!(f, "sound_horizon must be greater than 0")
            }
            SimConfigError::InvalidSpawnAttempts => {
                write!(f, "max_spawn_attempts must be greater than 0")
            }
        }
    }
}

impl Error for SimConfigError {}

impl SimConfig {
    pub const MAX_WORLD_SIZE: f64 = 4096.0;

    pub const MAX_SENSOR_STATES: usize = 65_536;

    pub fn validate(&self) -> Result<(), SimConfigError> {
        self.validate_world()?;
        self.validate_populations()?;
        self.validate_learning()?;
        self.validate_costs()?;
        self.validate_motion()?;
        self.validate_sensors()?;
        if self.sound_horizon == 0 {
            return Err(SimConfigError::InvalidSoundHorizon);
        }
        if self.max_spawn_attempts == 0 {
            return Err(SimConfigError::InvalidSpawnAttempts);
        }
        Ok(())
    }

    pub fn population(&self, kind: ThingKind) -> Option<&PopulationSpec> {
        self.populations.iter().find(|p| p.kind == kind)
    }

    /// Learning rate critters receive for the given toggle state.
    pub fn eta(&self, learning_enabled: bool) -> f64 {
        if learning_enabled {
            self.learning.learning_rate
        } else {
            0.0
        }
    }

    fn validate_world(&self) -> Result<(), SimConfigError> {
        for extent in [self.width, self.height] {
            if !(extent.is_finite() && extent > 0.0) {
                return Err(SimConfigError::InvalidWorldSize);
            }
            if extent > Self::MAX_WORLD_SIZE {
                return Err(SimConfigError::WorldSizeTooLarge {
                    max: Self::MAX_WORLD_SIZE,
                    actual: extent,
                });
            }
        }
        if !(self.thing_radius.is_finite()
            && self.thing_radius > 0.0
            && self.thing_radius * 2.0 < self.width.min(self.height))
        {
            return Err(SimConfigError::InvalidThingRadius);
        }
        if !(self.initial_strength.is_finite() && self.initial_strength > 0.0) {
            return Err(SimConfigError::InvalidInitialStrength);
        }
        Ok(())
    }

    fn validate_populations(&self) -> Result<(), SimConfigError> {
        for (idx, spec) in self.populations.iter().enumerate() {
            if self.populations[..idx].iter().any(|p| p.kind == spec.kind) {
                return Err(SimConfigError::DuplicatePopulation(spec.kind));
            }
            if let Some(maximum) = spec.maximum {
                if let Some(minimum) = spec.minimum.filter(|&m| m > maximum) {
                    return Err(SimConfigError::MinimumAboveMaximum {
                        kind: spec.kind,
                        minimum,
                        maximum,
                    });
                }
                if spec.initial > maximum {
                    return Err(SimConfigError::InitialAboveMaximum {
                        kind: spec.kind,
                        initial: spec.initial,
                        maximum,
                    });
                }
            }
            for (index, cluster) in spec.clusters.iter().enumerate() {
                let [cx, cy] = cluster.center;
                let center_ok = cx.is_finite()
                    && cy.is_finite()
                    && (0.0..=self.width).contains(&cx)
                    && (0.0..=self.height).contains(&cy);
                if !(center_ok && cluster.radius.is_finite() && cluster.radius > 0.0) {
                    return Err(SimConfigError::InvalidCluster {
                        kind: spec.kind,
                        index,
                    });
                }
            }
        }
        Ok(())
    }

    fn validate_learning(&self) -> Result<(), SimConfigError> {
        let p = &self.learning;
        if !(p.learning_rate.is_finite() && (0.0..=1.0).contains(&p.learning_rate)) {
            return Err(SimConfigError::InvalidLearningRate);
        }
        if !(p.gamma.is_finite() && (0.0..=1.0).contains(&p.gamma)) {
            return Err(SimConfigError::InvalidGamma);
        }
        if !(p.exploitation.is_finite() && p.exploitation >= 0.0) {
            return Err(SimConfigError::InvalidExploitation);
        }
        Ok(())
    }

    fn validate_costs(&self) -> Result<(), SimConfigError> {
        let c = &self.costs;
        let named = [
            ("step_cost", c.step_cost),
            ("hard_bump_cost", c.hard_bump_cost),
            ("eat_cost", c.eat_cost),
            ("move_cost", c.move_cost),
            ("turn_cost", c.turn_cost),
            ("food_reward", c.food_reward),
        ];
        if let Some(&(name, _)) = named.iter().find(|(_, v)| !v.is_finite()) {
            return Err(SimConfigError::InvalidCost(name));
        }
        Ok(())
    }

    fn validate_motion(&self) -> Result<(), SimConfigError> {
        if !(self.move_dist.is_finite() && self.move_dist > 0.0) {
            return Err(SimConfigError::InvalidMoveDist);
        }
        if !(self.eat_range.is_finite() && self.eat_range >= 0.0) {
            return Err(SimConfigError::InvalidEatRange);
        }
        if !(self.bump_offset.is_finite()
            && self.bump_offset >= 0.0
            && self.bump_offset < self.thing_radius)
        {
            return Err(SimConfigError::InvalidBumpOffset);
        }
        if !(self.turn_angle.is_finite() && (0..=180).contains(&self.turn_noise)) {
            return Err(SimConfigError::InvalidTurn);
        }
        if self.actions.is_empty() {
            return Err(SimConfigError::EmptyActions);
        }
        for (idx, action) in self.actions.iter().enumerate() {
            if self.actions[..idx].contains(action) {
                return Err(SimConfigError::DuplicateAction(*action));
            }
        }
        Ok(())
    }

    fn validate_sensors(&self) -> Result<(), SimConfigError> {
        if self.feelers.is_empty() {
            return Err(SimConfigError::EmptyFeelers);
        }
        for (index, feeler) in self.feelers.iter().enumerate() {
            if !(feeler.angle.is_finite() && feeler.length.is_finite() && feeler.length > 0.0) {
                return Err(SimConfigError::InvalidFeeler { index });
            }
        }
        if self.feel_textures.is_empty() {
            return Err(SimConfigError::EmptyTextures);
        }
        for (idx, texture) in self.feel_textures.iter().enumerate() {
            if self.feel_textures[..idx].contains(texture) {
                return Err(SimConfigError::DuplicateTexture(*texture));
            }
        }
        let states = FeelSensor::count_states(self.feelers.len(), self.feel_textures.len());
        if states.is_none_or(|n| n > Self::MAX_SENSOR_STATES) {
            return Err(SimConfigError::TooManySensorStates {
                max: Self::MAX_SENSOR_STATES,
            });
        }
        let h = &self.hearing;
        if !(h.radius.is_finite()
            && h.radius > 0.0
            && h.near_limit.is_finite()
            && h.far_limit.is_finite()
            && 0.0 < h.near_limit
            && h.near_limit < h.far_limit)
        {
            return Err(SimConfigError::InvalidHearing);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert_eq!(SimConfig::default().validate(), Ok(()));
    }

    #[test]
    fn partial_config_json_deserializes_with_defaults() {
        let json = r#"{
            "seed": 7,
            "width": 300.0,
            "populations": [
                {"kind": "clod", "initial": 2},
                {"kind": "plasmoid", "initial": 10, "minimum": 5,
                 "clusters": [{"center": [50.0, 50.0], "radius": 20.0}]}
            ],
            "learning": {"gamma": 0.9}
        }"#;
        let cfg: SimConfig = serde_json::from_str(json).expect("partial config should parse");
        assert_eq!(cfg.seed, 7);
        assert_eq!(cfg.height, 450.0);
        assert_eq!(cfg.learning.gamma, 0.9);
        assert_eq!(cfg.learning.learning_rate, 0.5);
        assert_eq!(cfg.populations.len(), 2);
        assert_eq!(cfg.populations[1].minimum, Some(5));
        assert_eq!(cfg.populations[1].maximum, None);
        assert_eq!(cfg.actions.len(), 4);
        assert_eq!(cfg.validate(), Ok(()));
    }

    #[test]
    fn rejects_bad_world_bounds() {
        let cfg = SimConfig {
            width: 0.0,
            ..SimConfig::default()
        };
        assert_eq!(cfg.validate(), Err(SimConfigError::InvalidWorldSize));
        let cfg = SimConfig {
            height: f64::NAN,
            ..SimConfig::default()
        };
        assert_eq!(cfg.validate(), Err(SimConfigError::InvalidWorldSize));
        let cfg = SimConfig {
            width: SimConfig::MAX_WORLD_SIZE + 1.0,
            ..SimConfig::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(SimConfigError::WorldSizeTooLarge { .. })
        ));
    }

    #[test]
    fn rejects_empty_action_list() {
        let cfg = SimConfig {
            actions: Vec::new(),
            ..SimConfig::default()
        };
        assert_eq!(cfg.validate(), Err(SimConfigError::EmptyActions));
    }

    #[test]
    fn rejects_duplicate_action() {
        let cfg = SimConfig {
            actions: vec![Action::Move, Action::Eat, Action::Move],
            ..SimConfig::default()
        };
        assert_eq!(
            cfg.validate(),
            Err(SimConfigError::DuplicateAction(Action::Move))
        );
    }

    #[test]
    fn rejects_malformed_cluster() {
        let mut cfg = SimConfig::default();
        cfg.populations[3].clusters[1].radius = -1.0;
        assert_eq!(
            cfg.validate(),
            Err(SimConfigError::InvalidCluster {
                kind: ThingKind::Plasmoid,
                index: 1
            })
        );
        let mut cfg = SimConfig::default();
        cfg.populations[3].clusters[0].center = [1000.0, 10.0];
        assert!(matches!(
            cfg.validate(),
            Err(SimConfigError::InvalidCluster { .. })
        ));
    }

    #[test]
    fn rejects_inconsistent_counts() {
        let mut cfg = SimConfig::default();
        cfg.populations[3].minimum = Some(200);
        assert!(matches!(
            cfg.validate(),
            Err(SimConfigError::MinimumAboveMaximum { .. })
        ));
        let mut cfg = SimConfig::default();
        cfg.populations[3].initial = 121;
        assert!(matches!(
            cfg.validate(),
            Err(SimConfigError::InitialAboveMaximum { .. })
        ));
    }

    #[test]
    fn rejects_duplicate_population() {
        let mut cfg = SimConfig::default();
        cfg.populations.push(PopulationSpec::new(ThingKind::Clod, 1));
        assert_eq!(
            cfg.validate(),
            Err(SimConfigError::DuplicatePopulation(ThingKind::Clod))
        );
    }

    #[test]
    fn rejects_sensor_state_explosion() {
        let cfg = SimConfig {
            feelers: vec![FeelerSpec::new(0.0, 10.0); 12],
            ..SimConfig::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(SimConfigError::TooManySensorStates { .. })
        ));
    }

    #[test]
    fn rejects_out_of_range_learning_params() {
        let mut cfg = SimConfig::default();
        cfg.learning.gamma = 1.5;
        assert_eq!(cfg.validate(), Err(SimConfigError::InvalidGamma));
        let mut cfg = SimConfig::default();
        cfg.learning.exploitation = -1.0;
        assert_eq!(cfg.validate(), Err(SimConfigError::InvalidExploitation));
    }

    #[test]
    fn eta_follows_learning_toggle() {
        let cfg = SimConfig::default();
        assert_eq!(cfg.eta(true), 0.5);
        assert_eq!(cfg.eta(false), 0.0);
    }
}
