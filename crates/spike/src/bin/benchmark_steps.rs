use critter_world_core::config::SimConfig;
use critter_world_core::thing::ThingKind;
use critter_world_core::world::World;
use rayon::prelude::*;
use std::time::Instant;

const WARMUP_STEPS: usize = 10;
const BENCHMARK_STEPS: usize = 500;

struct SeedResult {
    seed: u64,
    avg_step_us: f64,
    avg_agent_us: f64,
    deaths: usize,
    diskoids: usize,
    pentoids: usize,
}

fn bench_seed(seed: u64, learning_enabled: bool) -> SeedResult {
    let config = SimConfig {
        seed,
        learning_enabled,
        ..SimConfig::default()
    };
    let mut world = World::new(config);
    for _ in 0..WARMUP_STEPS {
        world.step();
    }

    let mut total_us = 0u64;
    let mut agent_us = 0u64;
    let mut deaths = 0usize;
    for _ in 0..BENCHMARK_STEPS {
        let report = world.step();
        total_us += report.timings.total_us;
        agent_us += report.timings.agent_us;
        deaths += report.removed;
    }

    SeedResult {
        seed,
        avg_step_us: total_us as f64 / BENCHMARK_STEPS as f64,
        avg_agent_us: agent_us as f64 / BENCHMARK_STEPS as f64,
        deaths,
        diskoids: world.population_count(ThingKind::Diskoid),
        pentoids: world.population_count(ThingKind::Pentoid),
    }
}

fn main() {
    if cfg!(debug_assertions) {
        eprintln!("WARNING: running in debug mode. Results are not representative.");
        eprintln!();
    }
    let seeds: Vec<u64> = (0..8).collect();

    for learning_enabled in [false, true] {
        println!("=== learning {} ===", if learning_enabled { "on" } else { "off" });
        let start = Instant::now();
        let results: Vec<SeedResult> = seeds
            .par_iter()
            .map(|&seed| bench_seed(seed, learning_enabled))
            .collect();
        for r in &results {
            println!(
                "  seed {:>2}: step {:>7.1} us (agents {:>7.1} us), removed {:>4}, diskoids {:>3}, pentoids {:>2}",
                r.seed, r.avg_step_us, r.avg_agent_us, r.deaths, r.diskoids, r.pentoids
            );
        }
        println!("  wall time for {} seeds: {:?}", seeds.len(), start.elapsed());
        println!();
    }
}
