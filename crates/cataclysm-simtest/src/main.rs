//! Cataclysm Headless Simulation Harness
//!
//! Runs the logic self-checks, then simulates an ecosystem under the
//! disruption catalog and prints each cycle. Runs entirely in-process.
//! With `--json`, stdout carries only JSON lines and the self-check report
//! goes to stderr.
//!
//! Usage:
//!   cargo run -p cataclysm-simtest
//!   cargo run -p cataclysm-simtest -- --cycles 100 --seed 7 --verbose
//!   cargo run -p cataclysm-simtest -- --catalog my_catalog.json --json

mod checks;
mod render;

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use cataclysm_logic::constants::{DEFAULT_CYCLES, DEFAULT_SEED};
use cataclysm_logic::disruption::Catalog;
use cataclysm_logic::driver::{RunSummary, SimulationConfig, SimulationDriver};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::render::{OutputMode, Presenter};

#[derive(Parser, Debug)]
#[command(name = "cataclysm-simtest", about = "Ecosystem disruption simulation harness")]
struct Cli {
    /// Number of cycles to simulate.
    #[arg(long, default_value_t = DEFAULT_CYCLES)]
    cycles: u32,

    /// Seed for the disruption RNG.
    #[arg(long, default_value_t = DEFAULT_SEED)]
    seed: u64,

    /// JSON file with a custom disruption catalog (defaults to the built-in one).
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Emit one JSON object per cycle instead of console text.
    #[arg(long)]
    json: bool,

    /// Print every self-check, not only failures.
    #[arg(long)]
    verbose: bool,

    /// Skip the self-check suite.
    #[arg(long)]
    skip_checks: bool,
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    let stdout = io::stdout();
    let stderr = io::stderr();
    if !execute(&cli, &mut stdout.lock(), &mut stderr.lock())? {
        std::process::exit(1);
    }
    Ok(())
}

/// Run the checks and the simulation. Returns `false` if a check failed.
///
/// Reports go to `out`. The self-check report goes to `out` on the console
/// and to `diag` in JSON mode.
fn execute<O: Write, D: Write>(cli: &Cli, out: &mut O, diag: &mut D) -> Result<bool> {
    let mode = if cli.json {
        OutputMode::JsonLines
    } else {
        OutputMode::Console
    };

    if !cli.skip_checks {
        let passed = match mode {
            OutputMode::Console => run_checks(cli.verbose, out)?,
            OutputMode::JsonLines => run_checks(cli.verbose, diag)?,
        };
        if !passed {
            return Ok(false);
        }
    }

    let catalog = load_catalog(cli.catalog.as_deref())?;
    let config = SimulationConfig {
        cycles: cli.cycles,
        seed: cli.seed,
        ..SimulationConfig::default()
    };
    let errors = config.validate();
    if !errors.is_empty() {
        let msgs: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
        bail!("invalid run configuration: {}", msgs.join("; "));
    }

    info!(
        cycles = config.cycles,
        seed = config.seed,
        events = catalog.len(),
        "starting simulation"
    );

    let mut state = config.initial_state();
    let mut rng = config.rng();
    let mut presenter = Presenter::new(mode, RunSummary::new(&state), &mut *out);
    SimulationDriver::new().run(&mut state, &catalog, &mut rng, config.cycles, &mut presenter);

    render::print_summary(&presenter.into_summary(), mode, out)
        .context("writing run summary")?;
    Ok(true)
}

fn load_catalog(path: Option<&Path>) -> Result<Catalog> {
    let Some(path) = path else {
        return Ok(Catalog::standard());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading catalog {}", path.display()))?;
    let catalog: Catalog = serde_json::from_str(&text)
        .with_context(|| format!("parsing catalog {}", path.display()))?;
    info!(path = %path.display(), events = catalog.len(), "loaded catalog");
    Ok(catalog)
}

/// Run the self-check suite and print the outcome. Returns `true` if all passed.
fn run_checks(verbose: bool, out: &mut dyn Write) -> io::Result<bool> {
    writeln!(out, "=== Cataclysm Simulation Harness ===\n")?;
    let results = checks::run_all(verbose, out)?;

    writeln!(out)?;
    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.len() - passed;

    for r in &results {
        let icon = if r.passed { "✓" } else { "✗" };
        if !r.passed || verbose {
            writeln!(out, "  {} {}: {}", icon, r.name, r.detail)?;
        }
    }

    writeln!(
        out,
        "\n=== CHECKS: {}/{} passed, {} failed ===",
        passed,
        results.len(),
        failed
    )?;
    Ok(failed == 0)
}
