use std::path::PathBuf;

use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;
use viewport::ViewportConfig;

mod scenario;

use scenario::{Scenario, ScenarioError};

/// Replays a viewport scenario against the simulated renderer and prints a
/// JSON report of renderer calls, callbacks and metrics.
#[derive(Debug, Parser)]
#[command(name = "viewport-replay", version)]
struct Args {
    /// Scenario file (JSON).
    scenario: PathBuf,

    /// Viewport config file (JSON); overrides the scenario's embedded config.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Pretty-print the report.
    #[arg(long)]
    pretty: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    if let Err(e) = real_main(&args) {
        error!("{e}");
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn real_main(args: &Args) -> Result<(), ScenarioError> {
    let scenario = Scenario::from_json_str(&scenario::read_to_string(&args.scenario)?)?;
    let config = match &args.config {
        Some(path) => ViewportConfig::from_json_str(&scenario::read_to_string(path)?)
            .map_err(ScenarioError::Config)?,
        None => scenario.config()?,
    };

    let report = scenario::run(&scenario, config);
    let out = if args.pretty {
        serde_json::to_string_pretty(&report)
    } else {
        serde_json::to_string(&report)
    }
    .map_err(ScenarioError::Report)?;
    println!("{out}");
    Ok(())
}
