use crate::geometry;
use crate::qtable::QTable;
use crate::rng::luce_choice;
use crate::sensor::Sensor;
use crate::thing::{ThingKind, Vitals};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Primitive actions a critter can select. A critter's action order fixes
/// the Q-table column layout.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Move,
    TurnLeft,
    TurnRight,
    Eat,
}

impl Action {
    pub fn name(self) -> &'static str {
        match self {
            Action::Move => "move",
            Action::TurnLeft => "turn_left",
            Action::TurnRight => "turn_right",
            Action::Eat => "eat",
        }
    }
}

/// Q-learning hyperparameters.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LearningParams {
    /// Learning rate used while learning is switched on.
    pub learning_rate: f64,
    /// Discount applied to the best value of the next state.
    pub gamma: f64,
    /// Inverse temperature of the action choice; 0 picks uniformly.
    pub exploitation: f64,
}

impl Default for LearningParams {
    fn default() -> Self {
        Self {
            learning_rate: 0.5,
            gamma: 0.8,
            exploitation: 1.0,
        }
    }
}

/// State, action and reinforcement of the previous tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transition {
    pub state: usize,
    pub action: usize,
    pub reinforcement: f64,
}

/// Learning agent state: heading, sensor, action list and Q-table.
#[derive(Clone, Debug)]
pub struct Critter {
    pub vitals: Vitals,
    /// Degrees in `[0, 360)`.
    pub heading: f64,
    pub sensor: Sensor,
    pub food: ThingKind,
    /// Current learning rate; 0 freezes the Q-table.
    pub eta: f64,
    pub gamma: f64,
    pub exploitation: f64,
    actions: Vec<Action>,
    q: QTable,
    last: Option<Transition>,
}

impl Critter {
    pub fn new(
        vitals: Vitals,
        heading: f64,
        sensor: Sensor,
        food: ThingKind,
        actions: Vec<Action>,
        params: &LearningParams,
        eta: f64,
    ) -> Self {
        let q = QTable::new(sensor.state_count(), actions.len());
        Self {
            vitals,
            heading: geometry::normalize_degrees(heading),
            sensor,
            food,
            eta,
            gamma: params.gamma,
            exploitation: params.exploitation,
            actions,
            q,
            last: None,
        }
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    pub fn q(&self) -> &QTable {
        &self.q
    }

    /// Mutable access to values; the table shape stays fixed.
    pub fn q_mut(&mut self) -> &mut QTable {
        &mut self.q
    }

    pub fn last(&self) -> Option<&Transition> {
        self.last.as_ref()
    }

    pub fn turn(&mut self, angle: f64) {
        self.heading = geometry::normalize_degrees(self.heading + angle);
    }

    /// Pick an action index for `state` with the exponential Luce rule.
    pub fn decide<R: Rng + ?Sized>(&self, state: usize, rng: &mut R) -> usize {
        luce_choice(self.q.row(state), self.exploitation, rng)
    }

    /// One-step Q-learning update of the previous state-action pair, using
    /// `current_state` as the successor. Returns `false` when there is no
    /// previous transition yet.
    pub fn learn(&mut self, current_state: usize) -> bool {
        let Some(last) = self.last else {
            return false;
        };
        let old = self.q.get(last.state, last.action);
        let target = last.reinforcement + self.gamma * self.q.best_value(current_state);
        self.q
            .set(last.state, last.action, (1.0 - self.eta) * old + self.eta * target);
        true
    }

    /// Close out a tick: learn from the previous transition, remember this
    /// one, and apply the reinforcement to strength.
    pub fn complete_tick(&mut self, state: usize, action: usize, reinforcement: f64) {
        self.learn(state);
        self.last = Some(Transition {
            state,
            action,
            reinforcement,
        });
        self.vitals.change_strength(reinforcement);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::create_rng;
    use crate::sensor::{HearSensor, HearingConfig};
    use proptest::prelude::*;

    const ACTIONS: [Action; 4] = [Action::Move, Action::TurnLeft, Action::TurnRight, Action::Eat];

    fn critter(eta: f64) -> Critter {
        Critter::new(
            Vitals::new(5000.0),
            0.0,
            Sensor::Hear(HearSensor::new(HearingConfig::default())),
            ThingKind::Diskoid,
            ACTIONS.to_vec(),
            &LearningParams::default(),
            eta,
        )
    }

    #[test]
    fn table_shape_follows_sensor_and_actions() {
        let c = critter(0.0);
        assert_eq!(c.q().n_states(), 13);
        assert_eq!(c.q().n_actions(), 4);
    }

    #[test]
    fn first_tick_skips_learning() {
        let mut c = critter(0.5);
        assert!(!c.learn(3));
        c.complete_tick(3, 1, -1.0);
        assert!(c.q().rows().all(|r| r.iter().all(|&v| v == 0.0)));
        assert_eq!(
            c.last(),
            Some(&Transition {
                state: 3,
                action: 1,
                reinforcement: -1.0
            })
        );
    }

    #[test]
    fn learn_matches_hand_computed_update() {
        let mut c = critter(0.5);
        c.gamma = 0.8;
        c.complete_tick(2, 3, -2.0);
        c.q_mut().set(5, 0, 1.0);
        c.q_mut().set(5, 1, -4.0);
        assert!(c.learn(5));
        // (1 - 0.5) * 0 + 0.5 * (-2 + 0.8 * 1.0)
        assert!((c.q().get(2, 3) - (-0.6)).abs() < 1e-12);
    }

    proptest! {
        #[test]
        fn zero_eta_freezes_values(
            seeded in proptest::collection::vec(-100.0f64..100.0, 13 * 4),
            ticks in proptest::collection::vec((0usize..13, 0usize..4, -50.0f64..50.0), 1..40),
        ) {
            let mut c = critter(0.0);
            for (i, v) in seeded.into_iter().enumerate() {
                c.q_mut().set(i / 4, i % 4, v);
            }
            let before = c.q().clone();
            for (state, action, reinforcement) in ticks {
                c.complete_tick(state, action, reinforcement);
                prop_assert_eq!(c.q(), &before);
            }
        }
    }

    #[test]
    fn reinforcement_changes_strength_and_can_kill() {
        let mut c = critter(0.0);
        c.vitals.strength = 2.0;
        c.complete_tick(0, 0, -1.0);
        assert!(c.vitals.alive());
        c.complete_tick(0, 0, -1.0);
        assert!(!c.vitals.alive());
    }

    #[test]
    fn decide_prefers_dominant_action() {
        let mut c = critter(0.0);
        c.exploitation = 10.0;
        c.q_mut().set(4, 3, 100.0);
        let mut rng = create_rng(1);
        for _ in 0..200 {
            assert_eq!(c.decide(4, &mut rng), 3);
        }
    }

    #[test]
    fn turning_wraps_heading() {
        let mut c = critter(0.0);
        c.turn(270.0);
        c.turn(95.0);
        assert!((c.heading - 5.0).abs() < 1e-9);
    }
}
