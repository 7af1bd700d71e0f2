use super::World;
use crate::thing::{ThingId, ThingKind};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StepTimings {
    pub spawn_us: u64,
    pub agent_us: u64,
    pub sweep_us: u64,
    pub total_us: u64,
}

/// What a single `World::step` did.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StepReport {
    /// Tick counter after the step.
    pub tick: u64,
    pub spawned: usize,
    pub removed: usize,
    pub placement_failures: usize,
    pub timings: StepTimings,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct KindStats {
    pub kind: ThingKind,
    pub count: usize,
    pub mean_strength: f64,
    pub max_strength: f64,
    pub mean_age: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PopulationStats {
    pub tick: u64,
    /// One entry per organism kind, in declaration order.
    pub kinds: Vec<KindStats>,
}

impl PopulationStats {
    pub fn get(&self, kind: ThingKind) -> Option<&KindStats> {
        self.kinds.iter().find(|k| k.kind == kind)
    }

    pub fn count(&self, kind: ThingKind) -> usize {
        self.get(kind).map_or(0, |k| k.count)
    }
}

fn default_schema_version() -> u32 {
    1
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunSummary {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub steps: usize,
    pub sample_every: usize,
    pub final_tick: u64,
    pub samples: Vec<PopulationStats>,
    pub total_deaths: usize,
    pub placement_failures: usize,
}

/// One labelled Q-table row.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QRow {
    pub state: usize,
    /// Decoded symbolic state, one label per sensor slot.
    pub labels: Vec<String>,
    pub values: Vec<f64>,
    /// Index of the greedy action; ties go to the first.
    pub best: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QTableView {
    /// Column labels.
    pub actions: Vec<String>,
    pub rows: Vec<QRow>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ThingDescription {
    pub id: ThingId,
    pub kind: ThingKind,
    pub position: [f64; 2],
    pub alive: bool,
    pub strength: Option<f64>,
    pub age: Option<u64>,
    pub heading: Option<f64>,
    /// Reading behind the critter's most recent decision.
    pub last_sensed: Option<Vec<String>>,
    pub q_table: Option<QTableView>,
}

impl World {
    /// Count, strength and age summary of every live organism kind.
    pub fn population_stats(&self) -> PopulationStats {
        let kinds = ThingKind::ALL
            .into_iter()
            .filter(|kind| kind.is_organism())
            .map(|kind| {
                let vitals: Vec<_> = self
                    .things
                    .iter()
                    .filter(|t| t.kind == kind)
                    .filter_map(|t| t.vitals())
                    .filter(|v| v.alive())
                    .collect();
                let count = vitals.len();
                if count == 0 {
                    return KindStats {
                        kind,
                        count,
                        mean_strength: 0.0,
                        max_strength: 0.0,
                        mean_age: 0.0,
                    };
                }
                let n = count as f64;
                KindStats {
                    kind,
                    count,
                    mean_strength: vitals.iter().map(|v| v.strength).sum::<f64>() / n,
                    max_strength: vitals
                        .iter()
                        .map(|v| v.strength)
                        .fold(f64::NEG_INFINITY, f64::max),
                    mean_age: vitals.iter().map(|v| v.age as f64).sum::<f64>() / n,
                }
            })
            .collect();
        PopulationStats {
            tick: self.tick,
            kinds,
        }
    }
}
