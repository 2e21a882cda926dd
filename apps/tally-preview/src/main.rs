//! # Tally Preview
//!
//! Prints the pricing breakdown of a scenario file as JSON.
//!
//! ```text
//! tally-preview <scenario.toml> [--config <preview.toml>]
//! ```
//!
//! ## Startup Sequence
//! 1. Initialize tracing (logging, to stderr)
//! 2. Load config: defaults → preview.toml → TALLY_* environment
//! 3. Load the scenario
//! 4. Build the presenter and run the scenario's operation
//! 5. Print the breakdown to stdout

mod config;
mod error;
mod scenario;

use std::path::PathBuf;
use std::process::ExitCode;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use tally_core::PricingPresenter;

use crate::config::PreviewConfig;
use crate::error::{PreviewError, PreviewResult};
use crate::scenario::Scenario;

const USAGE: &str = "usage: tally-preview <scenario.toml> [--config <preview.toml>]";

fn main() -> ExitCode {
    init_tracing();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Preview failed");
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> PreviewResult<()> {
    let args = Args::parse(std::env::args().skip(1))?;

    let config = PreviewConfig::load(args.config)?;
    let scenario = Scenario::load(&args.scenario)?;
    let rates = config.exchange.rate_table();

    let mut presenter = PricingPresenter::new(config.pricing.clone(), scenario.catalogs())?;
    if let Some(rates) = rates.as_ref() {
        presenter = presenter.with_converter(rates);
    }

    let breakdown = scenario.run(&presenter)?;
    info!(
        items = breakdown.items.len(),
        discounts = breakdown.discounts.len(),
        tax_groups = breakdown.taxes.len(),
        "Breakdown ready"
    );

    println!("{}", serde_json::to_string_pretty(&breakdown)?);
    Ok(())
}

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=tally_core=trace` - Show proration decisions
/// - Default: INFO, DEBUG for tally crates
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tally_core=debug,tally_preview=debug"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

// =============================================================================
// Command Line
// =============================================================================

#[derive(Debug, PartialEq)]
struct Args {
    scenario: PathBuf,
    config: Option<PathBuf>,
}

impl Args {
    fn parse(mut args: impl Iterator<Item = String>) -> PreviewResult<Self> {
        let mut scenario = None;
        let mut config = None;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--config" | "-c" => {
                    let path = args
                        .next()
                        .ok_or_else(|| PreviewError::Usage(format!("--config needs a path\n{USAGE}")))?;
                    config = Some(PathBuf::from(path));
                }
                "--help" | "-h" => return Err(PreviewError::Usage(USAGE.to_string())),
                _ if scenario.is_none() => scenario = Some(PathBuf::from(&arg)),
                other => {
                    return Err(PreviewError::Usage(format!("unexpected argument '{other}'\n{USAGE}")))
                }
            }
        }

        let scenario = scenario.ok_or_else(|| PreviewError::Usage(USAGE.to_string()))?;
        Ok(Args { scenario, config })
    }
}
