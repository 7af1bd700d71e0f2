use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use critter_world_core::config::SimConfig;
use critter_world_core::thing::ThingKind;
use critter_world_core::world::World;
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "critter-world")]
#[command(about = "Toroidal critter world with Q-learning agents")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a simulation, optionally from a config file
    Run {
        /// Path to config file (JSON); defaults are used when omitted
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output directory for the run summary (optional)
        #[arg(long)]
        out: Option<PathBuf>,

        /// Number of ticks to simulate
        #[arg(long, default_value_t = 1000)]
        steps: usize,

        /// Record population statistics every N ticks
        #[arg(long, default_value_t = 100)]
        sample_every: usize,

        /// Start with learning switched on
        #[arg(long)]
        learn: bool,

        /// Override the config seed
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Dump the default configuration to stdout
    DumpDefaultConfig,
}

fn load_config(path: Option<&PathBuf>) -> Result<SimConfig> {
    let Some(path) = path else {
        return Ok(SimConfig::default());
    };
    let file = File::open(path).with_context(|| format!("failed to open config file {path:?}"))?;
    let config: SimConfig =
        serde_json::from_reader(BufReader::new(file)).context("failed to parse config")?;
    Ok(config)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();
    let cli = Cli::parse();

    match cli.command {
        Commands::DumpDefaultConfig => {
            let config = SimConfig::default();
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        Commands::Run {
            config,
            out,
            steps,
            sample_every,
            learn,
            seed,
        } => {
            let mut sim_config = load_config(config.as_ref())?;
            sim_config.learning_enabled |= learn;
            if let Some(seed) = seed {
                sim_config.seed = seed;
            }
            sim_config.validate().context("config validation error")?;

            info!(steps, seed = sim_config.seed, learn = sim_config.learning_enabled, "starting run");
            let mut world = World::try_new(sim_config).context("failed to initialize world")?;
            let summary = world
                .try_run_experiment(steps, sample_every)
                .context("invalid run parameters")?;

            if let Some(out_dir) = out {
                std::fs::create_dir_all(&out_dir).context("failed to create output directory")?;
                let summary_path = out_dir.join("summary.json");
                let file = File::create(summary_path).context("failed to create summary file")?;
                serde_json::to_writer_pretty(file, &summary).context("failed to write summary")?;
                println!("Run complete. Results saved to {:?}", out_dir);
            } else {
                println!(
                    "Run complete after {} ticks: {} deaths, {} placement failures",
                    summary.final_tick, summary.total_deaths, summary.placement_failures
                );
                if let Some(last) = summary.samples.last() {
                    for kind in ThingKind::ALL.into_iter().filter(|k| k.is_organism()) {
                        if let Some(stats) = last.get(kind) {
                            println!(
                                "  {:<9} count={:<4} mean_strength={:.1} max_strength={:.1} mean_age={:.1}",
                                kind.name(),
                                stats.count,
                                stats.mean_strength,
                                stats.max_strength,
                                stats.mean_age
                            );
                        }
                    }
                }
            }
        }
    }
    Ok(())
}
