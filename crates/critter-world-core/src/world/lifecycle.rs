use super::metrics::{StepReport, StepTimings};
use super::{SpawnError, World};
use crate::critter::Action;
use crate::event::WorldEvent;
use crate::geometry::{self, Bounds};
use crate::sensor::SenseContext;
use crate::sound::{age_sounds, Sound};
use crate::spatial::ThingLocation;
use crate::thing::{Thing, ThingBody, ThingId, ThingKind, Vitals};
use rand::Rng;
use std::time::Instant;
use tracing::{debug, warn};

impl World {
    /// Advance the world by one tick: top up minimum populations, step every
    /// thing in list order, sweep the dead, then age sounds.
    ///
    /// Minimums are topped up again after the sweep so that no kind is left
    /// below its minimum between ticks.
    pub fn step(&mut self) -> StepReport {
        let total_start = Instant::now();

        let spawn_start = Instant::now();
        let (spawned, placement_failures) = self.replenish_minimums();
        let spawn_us = spawn_start.elapsed().as_micros() as u64;

        let agent_start = Instant::now();
        for slot in 0..self.things.len() {
            self.step_thing(slot);
        }
        let agent_us = agent_start.elapsed().as_micros() as u64;

        let sweep_start = Instant::now();
        let removed = self.sweep_dead();
        let sweep_us = sweep_start.elapsed().as_micros() as u64;

        let (refilled, refill_failures) = if removed > 0 {
            self.replenish_minimums()
        } else {
            (0, 0)
        };

        self.tick += 1;
        age_sounds(&mut self.sounds, self.config.sound_horizon);

        StepReport {
            tick: self.tick,
            spawned: spawned + refilled,
            removed,
            placement_failures: placement_failures + refill_failures,
            timings: StepTimings {
                spawn_us,
                agent_us,
                sweep_us,
                total_us: total_start.elapsed().as_micros() as u64,
            },
        }
    }

    /// Spawn up to each kind's minimum. A kind stops topping up at its first
    /// failure; the failure is counted, not propagated.
    fn replenish_minimums(&mut self) -> (usize, usize) {
        let targets: Vec<(ThingKind, usize)> = self
            .config
            .populations
            .iter()
            .filter_map(|p| p.minimum.map(|min| (p.kind, min)))
            .collect();

        let mut spawned = 0;
        let mut failures = 0;
        for (kind, minimum) in targets {
            let deficit = minimum.saturating_sub(self.population_count(kind));
            if deficit == 0 {
                continue;
            }
            debug!(%kind, deficit, tick = self.tick, "replenishing population");
            for _ in 0..deficit {
                match self.spawn(kind) {
                    Ok(_) => spawned += 1,
                    Err(SpawnError::PopulationFull { .. }) => break,
                    Err(err) => {
                        warn!(%kind, error = %err, "population top-up failed");
                        failures += 1;
                        break;
                    }
                }
            }
        }
        self.total_placement_failures += failures;
        (spawned, failures)
    }

    fn step_thing(&mut self, slot: usize) {
        let thing = &mut self.things[slot];
        if !thing.alive() {
            return;
        }
        match &mut thing.body {
            ThingBody::Clod => {}
            ThingBody::Plasmoid(vitals) => vitals.age += 1,
            ThingBody::Critter(critter) => {
                critter.vitals.age += 1;
                self.step_critter(slot);
            }
        }
    }

    /// Sense, decide, act and learn for the critter at `slot`.
    fn step_critter(&mut self, slot: usize) {
        let id = self.things[slot].id;
        let position = self.things[slot].position;
        let Some(critter) = self.things[slot].critter() else {
            return;
        };
        let ctx = SenseContext {
            self_id: id,
            position,
            heading: critter.heading,
            index: &self.index,
            sounds: &self.sounds,
            width: self.config.width,
            height: self.config.height,
        };
        let (_, state) = critter.sensor.sense(&ctx, &mut self.rng);
        let action_idx = critter.decide(state, &mut self.rng);
        let action = critter.actions()[action_idx];

        let turn_angle = self.config.turn_angle;
        let outcome = match action {
            Action::Move => self.act_move(slot),
            Action::TurnLeft => self.act_turn(slot, turn_angle),
            Action::TurnRight => self.act_turn(slot, 360.0 - turn_angle),
            Action::Eat => self.act_eat(slot),
        };
        let reinforcement = outcome + self.config.costs.step_cost;

        if let Some(critter) = self.things[slot].critter_mut() {
            critter.complete_tick(state, action_idx, reinforcement);
        }
    }

    /// Move forward by `move_dist` unless the destination footprint touches a solid thing.
    fn act_move(&mut self, slot: usize) -> f64 {
        let thing = &self.things[slot];
        let Some(heading) = thing.critter().map(|c| c.heading) else {
            return 0.0;
        };
        let (width, height) = (self.config.width, self.config.height);
        let destination = geometry::wrap_position(
            geometry::endpoint(thing.position, heading, self.config.move_dist),
            width,
            height,
        );
        let footprint = Bounds::around(
            destination,
            self.config.thing_radius - self.config.bump_offset,
        )
        .clamped(width, height);
        if self.index.blocks(&footprint, Some(thing.id)) {
            return self.config.costs.hard_bump_cost;
        }

        let id = thing.id;
        let location = ThingLocation::of(thing);
        self.index.relocate(&location, destination);
        self.things[slot].position = destination;
        self.emit(WorldEvent::Moved {
            id,
            position: destination,
        });
        self.config.costs.move_cost
    }

    /// Turn by `angle` plus integer noise.
    fn act_turn(&mut self, slot: usize, angle: f64) -> f64 {
        let noise = self.config.turn_noise;
        let jitter = if noise > 0 {
            self.rng.random_range(-noise..=noise)
        } else {
            0
        };
        let id = self.things[slot].id;
        let Some(critter) = self.things[slot].critter_mut() else {
            return 0.0;
        };
        critter.turn(angle + f64::from(jitter));
        let heading = critter.heading;
        self.emit(WorldEvent::Turned { id, heading });
        self.config.costs.turn_cost
    }

    /// Kill every live food item in front of the mouth. Each kill adds the
    /// food reward and leaves a sound at the eater's position.
    fn act_eat(&mut self, slot: usize) -> f64 {
        let thing = &self.things[slot];
        let Some((heading, food)) = thing.critter().map(|c| (c.heading, c.food)) else {
            return 0.0;
        };
        let (id, position) = (thing.id, thing.position);
        let mouth = geometry::wrap_position(
            geometry::endpoint(position, heading, self.config.thing_radius),
            self.config.width,
            self.config.height,
        );
        let zone = Bounds::around(mouth, self.config.eat_range);
        let mut prey: Vec<ThingId> = self
            .index
            .query_overlapping(&zone, Some(id))
            .filter(|loc| loc.kind == food)
            .map(|loc| loc.id)
            .collect();
        prey.sort_unstable();

        let mut outcome = self.config.costs.eat_cost;
        for prey_id in prey {
            let Some(&prey_slot) = self.slots.get(&prey_id) else {
                continue;
            };
            if self.things[prey_slot].vitals_mut().is_some_and(Vitals::die) {
                outcome += self.config.costs.food_reward;
                self.sounds.push(Sound::new(position));
                debug!(eater = %id, prey = %prey_id, "eaten");
            }
        }
        outcome
    }

    /// Drop organisms flagged dead, unindex them and rebuild the id slots.
    fn sweep_dead(&mut self) -> usize {
        if self.things.iter().all(Thing::alive) {
            return 0;
        }

        let old_things = std::mem::take(&mut self.things);
        let mut kept = Vec::with_capacity(old_things.len());
        let mut removed = 0;
        for thing in old_things {
            if thing.alive() {
                kept.push(thing);
                continue;
            }
            self.index.remove(&ThingLocation::of(&thing));
            self.emit(WorldEvent::Removed {
                id: thing.id,
                kind: thing.kind,
            });
            removed += 1;
        }

        self.things = kept;
        self.slots = self
            .things
            .iter()
            .enumerate()
            .map(|(slot, thing)| (thing.id, slot))
            .collect();
        self.total_deaths += removed;
        debug!(removed, tick = self.tick, "swept dead organisms");
        removed
    }
}
