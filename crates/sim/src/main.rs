//! `marketsim` - run or check marketplace scenario files.

use std::io;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;

use marketsim_observability::{FileOutput, LogConfig, LogFormat};
use marketsim_sim::{Scenario, run_scenario};

#[derive(Parser)]
#[command(name = "marketsim")]
#[command(about = "Simulate producers and consumers trading through a bounded marketplace")]
struct Cli {
    /// Emit console logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,

    /// Also write JSON logs to a daily rolling file in this directory
    #[arg(long, global = true, value_name = "DIR")]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a scenario and print one line per purchased item
    Run {
        /// Scenario file (JSON)
        scenario: PathBuf,

        /// Print a JSON summary of the run after the receipts
        #[arg(long)]
        summary: bool,
    },

    /// Validate a scenario file without running it
    Check {
        /// Scenario file (JSON)
        scenario: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut log_config = LogConfig::default();
    if cli.json_logs {
        log_config = log_config.with_format(LogFormat::Json);
    }
    if let Some(dir) = &cli.log_dir {
        log_config = log_config.with_file(FileOutput::new(dir, "marketplace.log"));
    }
    // Flushes the file writer on drop.
    let _guard = marketsim_observability::tracing::init_with(&log_config);

    match cli.command {
        Commands::Run { scenario, summary } => run(&scenario, summary),
        Commands::Check { scenario } => check(&scenario),
    }
}

fn load(path: &Path) -> anyhow::Result<Scenario> {
    Scenario::from_path(path).with_context(|| format!("loading {}", path.display()))
}

fn run(path: &Path, summary: bool) -> anyhow::Result<()> {
    let scenario = load(path)?;
    let mut stdout = io::stdout();
    let report = run_scenario(&scenario, &mut stdout)?;

    if summary {
        let json = serde_json::to_string_pretty(&report.summary())?;
        println!("{json}");
    }
    Ok(())
}

fn check(path: &Path) -> anyhow::Result<()> {
    let scenario = load(path)?;
    info!(
        products = scenario.products.len(),
        producers = scenario.producers.len(),
        consumers = scenario.consumers.len(),
        "scenario ok"
    );
    println!(
        "{}: {} products, {} producers, {} consumers",
        path.display(),
        scenario.products.len(),
        scenario.producers.len(),
        scenario.consumers.len()
    );
    Ok(())
}
