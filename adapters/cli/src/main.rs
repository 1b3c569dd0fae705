#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs a Skyraid encounter headlessly.

use std::{path::PathBuf, time::Duration};

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use skyraid_system_bootstrap::Encounter;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod encounter_file;

/// Runs an encounter for a fixed number of ticks and prints a summary.
#[derive(Debug, Parser)]
#[command(name = "skyraid", version, about)]
struct Args {
    /// Encounter description in TOML.
    #[arg(long, default_value = "assets/encounter.toml")]
    config: PathBuf,
    /// Number of ticks to simulate.
    #[arg(long, default_value_t = 3600)]
    ticks: u64,
    /// Milliseconds per tick.
    #[arg(long, default_value_t = 16)]
    dt_ms: u64,
    /// Overrides the seed stored in the encounter.
    #[arg(long)]
    seed: Option<u64>,
    /// Damage the oldest active enemy every N ticks. Zero disables attrition.
    #[arg(long, default_value_t = 0)]
    attrition_every: u64,
    /// Damage dealt by each attrition hit.
    #[arg(long, default_value_t = 1)]
    attrition_damage: u32,
    /// Log filter directives. Falls back to `RUST_LOG`, then `info`.
    #[arg(long)]
    log: Option<String>,
    /// Stop early once the waves ran out and the boss left play.
    #[arg(long)]
    stop_when_complete: bool,
}

/// Entry point for the Skyraid command-line interface.
fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.log.as_deref())?;

    let mut config = encounter_file::load(&args.config)?;
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    for error in config.validate() {
        warn!(%error, "encounter configuration problem");
    }

    let mut encounter = Encounter::new(config);
    let dt = Duration::from_millis(args.dt_ms);
    for tick in 1..=args.ticks {
        encounter.step(dt);
        if args.attrition_every > 0 && tick % args.attrition_every == 0 {
            let _ = encounter.damage_oldest(args.attrition_damage);
        }
        if args.stop_when_complete && encounter.is_complete() {
            info!(tick, "encounter complete");
            break;
        }
    }

    println!("{}", encounter.summary());
    Ok(())
}

fn init_logging(directives: Option<&str>) -> Result<()> {
    let filter = match directives {
        Some(directives) => EnvFilter::try_new(directives)
            .with_context(|| format!("invalid log filter `{directives}`"))?,
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|error| anyhow!(error))
        .context("failed to install the log subscriber")
}
