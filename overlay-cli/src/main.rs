mod output;
mod replay;
mod script;

use std::{path::PathBuf, process};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{Level, error, info};
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};
use typing_overlay::OverlayConfig;

use crate::{
    output::{OutputFormat, print_event},
    script::ReplayScript,
};

/// Replay recorded comment feed batches through the typing overlay.
#[derive(Debug, Parser)]
#[command(name = "overlay-replay", version, about)]
struct Args {
    /// JSON script: an array of {"at_ms": .., "comments": [..]} steps
    script: PathBuf,

    /// Overlay configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output format for presentation events
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Json)]
    output: OutputFormat,

    /// Feed the steps to a live runner with real sleeps
    #[arg(long)]
    realtime: bool,

    /// How long to keep running after the last step (ms)
    #[arg(long)]
    tail_ms: Option<u64>,

    /// Seed for placement and jitter randomness
    #[arg(long)]
    seed: Option<u64>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    /// Only log errors
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    if let Err(e) = run(args).await {
        error!("Application error: {:#}", e);
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

async fn run(args: Args) -> Result<()> {
    init_logging(args.verbose, args.quiet)?;

    let mut config = match &args.config {
        Some(path) => OverlayConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => OverlayConfig::default(),
    };
    if args.seed.is_some() {
        config.rng_seed = args.seed;
    }

    let script = ReplayScript::load(&args.script)?;
    info!(
        "Loaded {} steps spanning {}ms from {}",
        script.steps().len(),
        script.duration_ms(),
        args.script.display()
    );

    if args.realtime {
        replay::replay_realtime(&script, config, args.tail_ms, args.output).await
    } else {
        let format = args.output;
        let summary = replay::replay_virtual(&script, config, args.tail_ms, |at_ms, event| {
            print_event(format, at_ms, event)
        })?;
        info!(
            "{} events, last at {}ms",
            summary.events, summary.last_event_ms
        );
        Ok(())
    }
}

/// Initialize logging on stderr, leaving stdout to the event stream.
fn init_logging(verbose: bool, quiet: bool) -> Result<()> {
    let filter = if quiet {
        EnvFilter::new("error")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env().add_directive(Level::INFO.into())
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_level(verbose),
        )
        .try_init()
        .context("failed to initialize logging")?;
    Ok(())
}
