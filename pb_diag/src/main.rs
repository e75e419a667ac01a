//! Offline diagnostics for pickleball division snapshots.
//!
//! Loads a division snapshot exported as JSON and prints the round-robin
//! integrity report, standings, play-in banner and bracket graph.

mod config;
mod report;

use std::path::PathBuf;

use anyhow::{Context, Error};
use config::{DiagConfig, ReportKind};
use log::{info, warn};
use pico_args::Arguments;
use pickleball_engine::DivisionSnapshot;
use report::DiagnosticReport;

const HELP: &str = "\
Inspect a pickleball division snapshot

USAGE:
  pb_diag [OPTIONS]

OPTIONS:
  --snapshot   PATH        Division snapshot JSON  [default: env DIVISION_SNAPSHOT]
  --report     KIND        integrity, standings, bracket or all  [default: env DIAG_REPORT or all]

FLAGS:
  --json                   Print the report as JSON
  --check                  Exit with status 2 when round-robin integrity problems are found
  -h, --help               Print help information

ENVIRONMENT:
  DIVISION_SNAPSHOT        Division snapshot JSON path
  DIAG_REPORT              Report to print
  BRACKET_POLICY           ladder or power_of_two
  BRACKET_LADDER           Ladder steps, e.g. 8:4,16:8,24:16,32:32
  BRACKET_LADDER_FALLBACK  Bracket size above the last ladder step
  THIRD_PLACE_MATCH        Include a third-place match (true/false)
  RUST_LOG                 Log level, e.g. info or debug
";

fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let json = pargs.contains("--json");
    let check = pargs.contains("--check");
    let snapshot: Option<PathBuf> = pargs.opt_value_from_str("--snapshot")?;
    let report: Option<ReportKind> = pargs.opt_value_from_str("--report")?;

    env_logger::builder().format_target(false).init();

    let remaining = pargs.finish();
    if !remaining.is_empty() {
        warn!("Ignoring unexpected arguments: {remaining:?}");
    }

    let config = DiagConfig::from_env(snapshot, report, json, check)?;
    config.validate()?;

    info!("Loading snapshot from {}", config.snapshot_path.display());
    let raw = std::fs::read_to_string(&config.snapshot_path)
        .with_context(|| format!("Failed to read {}", config.snapshot_path.display()))?;
    let snapshot: DivisionSnapshot =
        serde_json::from_str(&raw).context("Snapshot is not a valid division snapshot")?;
    info!(
        "Division {} has {} teams and {} matches",
        snapshot.division.id,
        snapshot.teams.len(),
        snapshot.matches.len()
    );

    let report = DiagnosticReport::build(&snapshot, &config.engine, config.report)?;

    if config.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", report.render_text());
    }

    if config.check && !report.is_clean() {
        warn!(
            "Round-robin integrity check failed with {} problems",
            report.problem_count()
        );
        std::process::exit(2);
    }

    Ok(())
}
