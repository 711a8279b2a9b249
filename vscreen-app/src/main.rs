//! vscreen: run the vision self-screening tests from a terminal.

mod app;
mod config;
mod input;
mod render;
mod store;

use std::io;
use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use comfy_table::Table;
use rand::SeedableRng;
use rand::rngs::StdRng;
use vscreen_core::{Eye, TestType};
use vscreen_experiment::{FailPolicy, TestSession};
use vscreen_timing::SystemTimer;

use app::App;
use config::AppConfig;
use store::JsonFileStore;

#[derive(Parser)]
#[command(name = "vscreen", version, about = "Vision self-screening tests")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the per-test progression table
    Tests {
        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Run one test interactively
    Run {
        /// Test to run (e.g. "visual_acuity", "amsler", "peripheral")
        test: TestType,

        /// Eye to start with for astigmatism and peripheral vision
        #[arg(long)]
        eye: Option<Eye>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,

        /// Results file (overrides [host] results_path)
        #[arg(long)]
        results: Option<PathBuf>,

        /// Seed for stimulus randomization
        #[arg(long)]
        seed: Option<u64>,

        /// Skip the disclaimer prompt
        #[arg(long)]
        accept_disclaimer: bool,
    },

    /// List saved results
    History {
        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,

        /// Results file (overrides [host] results_path)
        #[arg(long)]
        results: Option<PathBuf>,

        /// Only show one test
        #[arg(long)]
        test: Option<TestType>,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vscreen_app=info,vscreen_experiment=info".into()),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Tests { config } => list_tests(config),
        Commands::Run {
            test,
            eye,
            config,
            results,
            seed,
            accept_disclaimer,
        } => run_test(test, eye, config, results, seed, accept_disclaimer),
        Commands::History {
            config,
            results,
            test,
        } => history(config, results, test),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

fn list_tests(config: Option<PathBuf>) -> Result<()> {
    let config = AppConfig::load(config.as_deref())?;
    let mut table = Table::new();
    table.set_header(vec![
        "Test",
        "Levels",
        "Trials/level",
        "Pass",
        "On fail",
        "Feedback",
        "Eyes",
    ]);
    for test_type in TestType::ALL {
        let policy = config.engine.policy(test_type);
        table.add_row(vec![
            test_type.slug().to_string(),
            policy.levels.to_string(),
            policy.trials_per_level.to_string(),
            format!("≥{}/{}", policy.min_correct, policy.trials_per_level),
            match policy.on_fail {
                FailPolicy::Stop => "stop".to_string(),
                FailPolicy::Continue => "continue".to_string(),
            },
            format!("{}ms", policy.feedback_ms),
            if test_type.is_two_eye() { "each" } else { "both" }.to_string(),
        ]);
    }
    println!("{table}");
    Ok(())
}

fn run_test(
    test: TestType,
    eye: Option<Eye>,
    config: Option<PathBuf>,
    results: Option<PathBuf>,
    seed: Option<u64>,
    accept_disclaimer: bool,
) -> Result<()> {
    let mut config = AppConfig::load(config.as_deref())?;
    if accept_disclaimer {
        config.host.disclaimer_accepted = true;
    }
    if results.is_some() {
        config.host.results_path = results;
    }
    let results_path = config.host.results_path();
    let mut store = JsonFileStore::open(&results_path)
        .with_context(|| format!("failed to open results {}", results_path.display()))?;

    let stdin = io::stdin();
    let mut app = App::new(stdin.lock(), io::stdout(), config.host.clone());
    if !app.ensure_disclaimer()? {
        bail!("the disclaimer must be accepted before running a test");
    }

    let rng = seed.map_or_else(StdRng::from_os_rng, StdRng::seed_from_u64);
    let mut session = TestSession::new(test, config.engine, SystemTimer::new(), rng);
    let saved = app.run(&mut session, eye, &mut store)?;
    tracing::info!(count = saved.len(), path = %store.path().display(), "session finished");
    Ok(())
}

fn history(
    config: Option<PathBuf>,
    results: Option<PathBuf>,
    test: Option<TestType>,
) -> Result<()> {
    let config = AppConfig::load(config.as_deref())?;
    let path = results.unwrap_or_else(|| config.host.results_path());
    let store = JsonFileStore::open(&path)
        .with_context(|| format!("failed to open results {}", path.display()))?;

    let records: Vec<_> = store
        .records()
        .iter()
        .filter(|r| test.is_none_or(|t| t == r.test_type))
        .collect();
    if records.is_empty() {
        println!("No results yet.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["Completed", "Test", "Eye", "Score", "Status"]);
    for record in records {
        table.add_row(vec![
            record.result.completed_at.format("%Y-%m-%d %H:%M").to_string(),
            record.test_type.slug().to_string(),
            record.eye.map(|e| e.to_string()).unwrap_or_else(|| "-".into()),
            record.result.summary.headline(),
            format!("{:?}", record.result.status),
        ]);
    }
    println!("{table}");
    Ok(())
}
