//! PowerTree - Power Distribution Tree Calculator
//!
//! Loads a power tree snapshot, computes the operating point of every stage
//! and prints the results with any design-rule findings.
//!
//! # Usage
//!
//! ```bash
//! powertree board.json
//! powertree board.json --format json --low-efficiency 0.5 --strict
//! ```

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use powertree_core::{
    check::{CheckConfig, DEFAULT_CURRENT_HEADROOM, DEFAULT_LOW_EFFICIENCY_THRESHOLD},
    engine::evaluate_with_config,
    error::Result,
    report::{write_report, ReportFormat},
    snapshot,
};

/// Power distribution tree calculator
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the power tree snapshot (.json)
    #[arg(value_name = "SNAPSHOT_FILE")]
    snapshot_file: PathBuf,

    /// Report format
    #[arg(short, long, value_enum, default_value_t = ReportFormat::Text)]
    format: ReportFormat,

    /// Efficiency below which a regulator is flagged
    #[arg(long, default_value_t = DEFAULT_LOW_EFFICIENCY_THRESHOLD)]
    low_efficiency: f64,

    /// Fraction of a rated current treated as close to the limit
    #[arg(long, default_value_t = DEFAULT_CURRENT_HEADROOM)]
    headroom: f64,

    /// Exit with a failure status when any ERROR diagnostic is raised
    #[arg(long)]
    strict: bool,
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn run(args: &Args) -> Result<bool> {
    // Load the tree
    let tree = snapshot::load_file(&args.snapshot_file)?;

    // Compute and check
    let config = CheckConfig::new()
        .with_low_efficiency_threshold(args.low_efficiency)
        .with_current_headroom(args.headroom);
    let evaluation = evaluate_with_config(&tree, &config);
    info!(
        stages = tree.len(),
        errors = evaluation.errors().count(),
        warnings = evaluation.warnings().count(),
        "evaluated power tree"
    );

    // Report
    write_report(&mut io::stdout().lock(), &tree, &evaluation, args.format)?;

    Ok(evaluation.has_errors())
}

fn main() -> ExitCode {
    init_logging();
    let args = Args::parse();

    match run(&args) {
        Ok(has_errors) if args.strict && has_errors => ExitCode::FAILURE,
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            eprintln!("error: {e}");
            ExitCode::from(2)
        }
    }
}
