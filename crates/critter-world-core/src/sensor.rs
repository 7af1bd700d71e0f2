//! Sensors turn a critter's surroundings into a discrete state index used as a
//! Q-table row.
//!
//! Two modalities exist: [`FeelSensor`] samples textures at the tips of
//! feelers, [`HearSensor`] locates the nearest recent feeding sound. Both
//! share the [`StateEncoder`] contract so readings can be mapped to a state
//! index and back.

use crate::geometry::{self, Bounds};
use crate::sound::Sound;
use crate::spatial::SpatialIndex;
use crate::thing::{Texture, ThingId};
use rand::seq::IndexedRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Half-extent of the box checked around a feeler tip.
const FEELER_TIP_HALF_EXTENT: f64 = 1.0;

/// Bidirectional mapping between symbolic readings and state indices.
pub trait StateEncoder {
    type Reading;

    /// Number of distinct states; every encoded index is below this.
    fn state_count(&self) -> usize;

    fn encode(&self, reading: &Self::Reading) -> usize;

    /// Inverse of [`StateEncoder::encode`]. `state` must be below `state_count()`.
    fn decode(&self, state: usize) -> Self::Reading;
}

/// Everything a sensor may look at while sensing.
pub struct SenseContext<'a> {
    pub self_id: ThingId,
    pub position: [f64; 2],
    pub heading: f64,
    pub index: &'a SpatialIndex,
    pub sounds: &'a [Sound],
    pub width: f64,
    pub height: f64,
}

/// A single feeler: angle relative to the heading and length from the body center.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FeelerSpec {
    pub angle: f64,
    pub length: f64,
}

impl FeelerSpec {
    pub const fn new(angle: f64, length: f64) -> Self {
        Self { angle, length }
    }
}

/// Textures felt at each feeler tip, in feeler order; `None` when nothing
/// from the alphabet was touched.
pub type FeelReading = Vec<Option<Texture>>;

#[derive(Clone, Debug, PartialEq)]
pub struct FeelSensor {
    feelers: Vec<FeelerSpec>,
    textures: Vec<Texture>,
    state_count: usize,
}

impl FeelSensor {
    /// `textures` is the feature alphabet; callers validate that it is
    /// non-empty, duplicate-free and that the state count fits in `usize`.
    pub fn new(feelers: Vec<FeelerSpec>, textures: Vec<Texture>) -> Self {
        let state_count = Self::count_states(feelers.len(), textures.len()).unwrap_or(usize::MAX);
        Self {
            feelers,
            textures,
            state_count,
        }
    }

    /// `(alphabet + 1) ^ feelers`, or `None` on overflow.
    pub fn count_states(feelers: usize, alphabet: usize) -> Option<usize> {
        let base = alphabet.checked_add(1)?;
        let exp = u32::try_from(feelers).ok()?;
        base.checked_pow(exp)
    }

    fn base(&self) -> usize {
        self.textures.len() + 1
    }

    fn digit(&self, feature: Option<Texture>) -> usize {
        feature
            .and_then(|t| self.textures.iter().position(|&known| known == t))
            .map_or(0, |idx| idx + 1)
    }

    /// Wrapped tip position of every feeler for the given pose.
    pub fn tips(&self, position: [f64; 2], heading: f64, width: f64, height: f64) -> Vec<[f64; 2]> {
        self.feelers
            .iter()
            .map(|f| {
                let tip = geometry::endpoint(
                    position,
                    geometry::normalize_degrees(heading + f.angle),
                    f.length,
                );
                geometry::wrap_position(tip, width, height)
            })
            .collect()
    }

    pub fn sense_symbolic<R: Rng + ?Sized>(&self, ctx: &SenseContext<'_>, rng: &mut R) -> FeelReading {
        self.tips(ctx.position, ctx.heading, ctx.width, ctx.height)
            .into_iter()
            .map(|tip| {
                let tip_box = Bounds::around(tip, FEELER_TIP_HALF_EXTENT);
                let felt: Vec<Texture> = ctx
                    .index
                    .query_overlapping(&tip_box, Some(ctx.self_id))
                    .map(|loc| loc.texture)
                    .filter(|t| self.textures.contains(t))
                    .collect();
                felt.choose(rng).copied()
            })
            .collect()
    }
}

impl StateEncoder for FeelSensor {
    type Reading = FeelReading;

    fn state_count(&self) -> usize {
        self.state_count
    }

    /// Mixed-radix number with base `alphabet + 1`; feeler 0 is the least
    /// significant digit and "none" is digit 0.
    fn encode(&self, reading: &FeelReading) -> usize {
        let base = self.base();
        reading
            .iter()
            .rev()
            .fold(0usize, |acc, &feature| acc * base + self.digit(feature))
    }

    fn decode(&self, state: usize) -> FeelReading {
        let base = self.base();
        let mut remainder = state;
        (0..self.feelers.len())
            .map(|_| {
                let digit = remainder % base;
                remainder /= base;
                digit.checked_sub(1).map(|idx| self.textures[idx])
            })
            .collect()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceBand {
    Near,
    Medium,
    Far,
}

impl DistanceBand {
    pub const ALL: [DistanceBand; 3] = [DistanceBand::Near, DistanceBand::Medium, DistanceBand::Far];

    pub fn label(self) -> &'static str {
        match self {
            DistanceBand::Near => "near",
            DistanceBand::Medium => "medium",
            DistanceBand::Far => "far",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Front,
    Back,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Front,
        Direction::Back,
        Direction::Left,
        Direction::Right,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Direction::Front => "front",
            Direction::Back => "back",
            Direction::Left => "left",
            Direction::Right => "right",
        }
    }

    /// Quadrant of a bearing relative to the heading, in degrees.
    ///
    /// front = [315, 45), left = [45, 135), back = [135, 225),
    /// right = [225, 315); every range includes its lower edge.
    pub fn classify(relative_bearing: f64) -> Self {
        let r = geometry::normalize_degrees(relative_bearing);
        if r < 45.0 || r >= 315.0 {
            Direction::Front
        } else if r < 135.0 {
            Direction::Left
        } else if r < 225.0 {
            Direction::Back
        } else {
            Direction::Right
        }
    }
}

/// Band and quadrant of the nearest audible sound.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Hearing {
    pub distance: DistanceBand,
    pub direction: Direction,
}

/// `None` when no sound is within hearing range.
pub type HearReading = Option<Hearing>;

/// Hearing radius and band thresholds.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HearingConfig {
    /// Sounds farther than this are ignored.
    pub radius: f64,
    /// Distances below this are "near".
    pub near_limit: f64,
    /// Distances at or above this are "far"; between the limits is "medium".
    pub far_limit: f64,
}

impl Default for HearingConfig {
    fn default() -> Self {
        Self {
            radius: 50.0,
            near_limit: 17.0,
            far_limit: 34.0,
        }
    }
}

impl HearingConfig {
    pub fn band(&self, distance: f64) -> DistanceBand {
        if distance < self.near_limit {
            DistanceBand::Near
        } else if distance < self.far_limit {
            DistanceBand::Medium
        } else {
            DistanceBand::Far
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct HearSensor {
    config: HearingConfig,
    table: Vec<HearReading>,
}

impl HearSensor {
    pub fn new(config: HearingConfig) -> Self {
        let mut table: Vec<HearReading> = DistanceBand::ALL
            .iter()
            .flat_map(|&distance| {
                Direction::ALL
                    .iter()
                    .map(move |&direction| Some(Hearing { distance, direction }))
            })
            .collect();
        table.push(None);
        Self { config, table }
    }

    pub fn sense_symbolic(&self, ctx: &SenseContext<'_>) -> HearReading {
        let mut nearest: Option<(f64, [f64; 2])> = None;
        for sound in ctx.sounds {
            let d = geometry::torus_distance(ctx.position, sound.position, ctx.width, ctx.height);
            if d > self.config.radius {
                continue;
            }
            if nearest.is_none_or(|(best, _)| d < best) {
                nearest = Some((d, sound.position));
            }
        }
        nearest.map(|(d, at)| {
            let bearing = geometry::torus_bearing(ctx.position, at, ctx.width, ctx.height);
            Hearing {
                distance: self.config.band(d),
                direction: Direction::classify(bearing - ctx.heading),
            }
        })
    }
}

impl StateEncoder for HearSensor {
    type Reading = HearReading;

    fn state_count(&self) -> usize {
        self.table.len()
    }

    fn encode(&self, reading: &HearReading) -> usize {
        let idx = self.table.iter().position(|entry| entry == reading);
        debug_assert!(idx.is_some(), "hearing table covers every reading");
        idx.unwrap_or(self.table.len() - 1)
    }

    fn decode(&self, state: usize) -> HearReading {
        self.table[state]
    }
}

/// Symbolic reading of either modality.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorReading {
    Feel(FeelReading),
    Hear(HearReading),
}

impl SensorReading {
    pub fn labels(&self) -> Vec<&'static str> {
        match self {
            SensorReading::Feel(features) => features
                .iter()
                .map(|f| f.map_or("none", Texture::label))
                .collect(),
            SensorReading::Hear(Some(h)) => vec![h.distance.label(), h.direction.label()],
            SensorReading::Hear(None) => vec!["none", "none"],
        }
    }
}

impl fmt::Display for SensorReading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.labels().join("|"))
    }
}

/// A critter's sensor, owned exclusively by that critter.
#[derive(Clone, Debug, PartialEq)]
pub enum Sensor {
    Feel(FeelSensor),
    Hear(HearSensor),
}

impl Sensor {
    /// Sense the surroundings, returning both the symbolic reading and its state index.
    pub fn sense<R: Rng + ?Sized>(&self, ctx: &SenseContext<'_>, rng: &mut R) -> (SensorReading, usize) {
        match self {
            Sensor::Feel(s) => {
                let reading = s.sense_symbolic(ctx, rng);
                let state = s.encode(&reading);
                (SensorReading::Feel(reading), state)
            }
            Sensor::Hear(s) => {
                let reading = s.sense_symbolic(ctx);
                let state = s.encode(&reading);
                (SensorReading::Hear(reading), state)
            }
        }
    }

    pub fn state_count(&self) -> usize {
        match self {
            Sensor::Feel(s) => s.state_count(),
            Sensor::Hear(s) => s.state_count(),
        }
    }

    pub fn decode(&self, state: usize) -> SensorReading {
        match self {
            Sensor::Feel(s) => SensorReading::Feel(s.decode(state)),
            Sensor::Hear(s) => SensorReading::Hear(s.decode(state)),
        }
    }
}
