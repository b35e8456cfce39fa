//! Replays a custom-tab scenario file and prints every toolbar decision and
//! back-press outcome.

mod scenario;

use clap::Parser;
use scenario::ReplayError;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::EnvFilter;
use wf_browser::WayfarerSettings;
use wf_browser::settings;

#[derive(Debug, Parser)]
#[command(name = "wayfarer-replay", about = "Replay custom-tab scenarios against the host screen")]
struct Args {
    /// Scenario JSON file.
    #[arg(long)]
    scenario: PathBuf,

    /// Settings JSON file. Defaults to `$HOME/.wayfarer/settings.json`.
    #[arg(long)]
    settings: Option<PathBuf>,
}

fn main() -> ExitCode {
    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("wayfarer-replay: {error}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), ReplayError> {
    let settings = match &args.settings {
        Some(path) => settings::load_settings_from_path(path)?,
        None => settings::load_settings()?,
    };
    init_logging(&settings);

    let json = std::fs::read_to_string(&args.scenario)?;
    let scenario = scenario::parse_scenario(&json)?;
    info!(path = ?args.scenario, steps = scenario.steps.len(), "replaying scenario");

    for line in scenario::replay(&scenario, settings) {
        println!("{line}");
    }
    Ok(())
}

/// `RUST_LOG` takes precedence over the configured level.
fn init_logging(settings: &WayfarerSettings) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.logging.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);

    let _ = if settings.logging.json {
        builder.json().try_init()
    } else {
        builder.compact().try_init()
    };
}
