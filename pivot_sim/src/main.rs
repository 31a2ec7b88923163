//! # Pivot Simulator Binary
//!
//! Runs a TOML-declared routine against the simulated robot and reports the
//! final pose.
//!
//! # Usage
//!
//! ```bash
//! pivot_sim --config pivot_sim/config/demo.toml
//!
//! # Verbose logging
//! pivot_sim --config pivot_sim/config/demo.toml -v
//!
//! # JSON logs
//! pivot_sim --config pivot_sim/config/demo.toml --json
//! ```

#![deny(warnings)]

use clap::Parser;
use pivot_common::config::{ConfigLoader, LogLevel};
use pivot_sim::Simulation;
use pivot_sim::config::SimConfig;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{Level, info, warn};
use tracing_subscriber::EnvFilter;

/// Pivot Simulator - differential-drive routine runner
#[derive(Parser, Debug)]
#[command(name = "pivot_sim")]
#[command(version)]
#[command(about = "Run a motion routine against a simulated line-following robot")]
#[command(long_about = None)]
struct Args {
    /// Path to the simulator configuration file.
    #[arg(short, long, value_name = "FILE")]
    config: PathBuf,

    /// Enable verbose logging (overrides the configured level)
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long)]
    json: bool,
}

fn main() {
    if let Err(e) = run() {
        eprintln!("pivot_sim: {e}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = SimConfig::load(&args.config)?;
    setup_tracing(&args, config.shared.log_level);

    info!("Pivot Simulator v{} starting...", env!("CARGO_PKG_VERSION"));
    info!("Loaded config from {:?}", args.config);

    let mut sim = Simulation::new(config)?;

    let abort = Arc::new(AtomicBool::new(false));
    let flag = abort.clone();
    ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        flag.store(true, Ordering::SeqCst);
    })?;

    let report = sim.run(&abort)?;
    let pose = sim.pose();
    if report.aborted {
        warn!(completed = report.completed, "Routine aborted");
    }
    info!(
        x = pose.x,
        y = pose.y,
        heading = pose.heading,
        elapsed_ms = sim.elapsed_ms(),
        completed = report.completed,
        "Routine finished"
    );
    Ok(())
}

/// Setup tracing subscriber based on CLI arguments and the configured level.
fn setup_tracing(args: &Args, configured: LogLevel) {
    let level = if args.verbose {
        Level::DEBUG
    } else {
        Level::from(configured)
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    if args.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
