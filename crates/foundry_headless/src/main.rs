//! Headless build-order agent runner.
//!
//! Runs the agent against the sandbox engine without a game client.
//!
//! # Usage
//!
//! ```bash
//! # Run one game and print metrics as JSON
//! cargo run -p foundry_headless -- run --scenario scenarios/standard.ron --ticks 2000 --json
//!
//! # Run a scenario over 32 seeds in parallel
//! cargo run -p foundry_headless -- batch --scenario standard --seeds 32 --output results/batch.json
//!
//! # Validate an agent config
//! cargo run -p foundry_headless -- check-config configs/agent.ron
//! ```
//!
//! Logs go to stderr; `RUST_LOG` overrides the default level.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use foundry_core::config::AgentConfig;
use foundry_headless::{
    batch::{run_batch, verify_determinism, BatchConfig},
    runner::{run_game, GameConfig},
    scenario::Scenario,
};

#[derive(Parser)]
#[command(name = "foundry_headless")]
#[command(about = "Headless runner for the build-order agent")]
#[command(version)]
struct Cli {
    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a single game
    Run {
        /// Scenario file, or "standard"
        #[arg(short, long, default_value = "standard")]
        scenario: String,

        /// Ticks to run
        #[arg(short, long, default_value = "2000")]
        ticks: u64,

        /// Agent config file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Sandbox seed
        #[arg(long, default_value = "0")]
        seed: u64,

        /// Print metrics as JSON on stdout
        #[arg(long)]
        json: bool,
    },

    /// Run a scenario across a range of seeds
    Batch {
        /// Scenario file, or "standard"
        #[arg(short, long, default_value = "standard")]
        scenario: String,

        /// Number of seeds
        #[arg(long, default_value = "16")]
        seeds: u32,

        /// First seed
        #[arg(long, default_value = "0")]
        seed_start: u64,

        /// Ticks per game
        #[arg(short, long, default_value = "2000")]
        ticks: u64,

        /// Agent config file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Maximum parallel games (0 = auto)
        #[arg(short, long, default_value = "0")]
        parallel: u32,

        /// Write results JSON here
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Run one seed several times and compare command logs
    Verify {
        /// Scenario file, or "standard"
        #[arg(short, long, default_value = "standard")]
        scenario: String,

        /// Seed to verify
        #[arg(long, default_value = "0")]
        seed: u64,

        /// Number of runs
        #[arg(short, long, default_value = "4")]
        runs: u32,

        /// Ticks per run
        #[arg(short, long, default_value = "2000")]
        ticks: u64,
    },

    /// Validate an agent config file
    CheckConfig {
        /// Agent config file
        path: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(true),
        )
        .with(filter)
        .init();

    match cli.command {
        Commands::Run {
            scenario,
            ticks,
            config,
            seed,
            json,
        } => cmd_run(&scenario, ticks, config, seed, json),
        Commands::Batch {
            scenario,
            seeds,
            seed_start,
            ticks,
            config,
            parallel,
            output,
        } => {
            let mut batch = BatchConfig::new(seeds).with_seed(seed_start).with_ticks(ticks);
            batch.parallel_games = parallel;
            if let Some(path) = output {
                batch = batch.with_output(path);
            }
            cmd_batch(&scenario, config, batch);
        }
        Commands::Verify {
            scenario,
            seed,
            runs,
            ticks,
        } => cmd_verify(&scenario, seed, runs, ticks),
        Commands::CheckConfig { path } => cmd_check_config(path),
    }
}

fn fail(message: impl std::fmt::Display) -> ! {
    eprintln!("Error: {message}");
    std::process::exit(1);
}

fn load_scenario(arg: &str) -> Scenario {
    Scenario::resolve(arg).unwrap_or_else(|e| fail(e))
}

fn load_agent_config(path: Option<PathBuf>) -> AgentConfig {
    match path {
        Some(path) => AgentConfig::load(&path).unwrap_or_else(|e| fail(e)),
        None => AgentConfig::default(),
    }
}

/// Run a single game
fn cmd_run(scenario: &str, ticks: u64, config: Option<PathBuf>, seed: u64, json: bool) {
    let scenario = load_scenario(scenario);
    let agent = load_agent_config(config);
    let result = run_game(GameConfig::new(scenario, ticks, seed).with_agent(agent))
        .unwrap_or_else(|e| fail(e));
    let metrics = &result.metrics;

    if json {
        match serde_json::to_string_pretty(metrics) {
            Ok(text) => println!("{text}"),
            Err(e) => fail(e),
        }
        return;
    }

    println!("Game {} ({} ticks)", metrics.game_id, metrics.duration_ticks);
    println!(
        "  commits: {}  idle ticks: {}  rejections: {}",
        metrics.total_commits(),
        metrics.idle_ticks,
        metrics.rejections
    );
    println!(
        "  minerals gathered/spent: {}/{}  gas gathered/spent: {}/{}",
        metrics.minerals_gathered, metrics.minerals_spent, metrics.gas_gathered, metrics.gas_spent
    );
    println!(
        "  enemies killed: {}/{}",
        metrics.enemies_killed, metrics.enemies_spawned
    );
    for (kind, count) in &metrics.final_counts {
        println!("  {kind:<16} {count:>4}");
    }
    println!("  command log hash: {:016x}", metrics.command_log_hash);
}

/// Run a scenario across seeds
fn cmd_batch(scenario: &str, config: Option<PathBuf>, batch: BatchConfig) {
    let scenario = load_scenario(scenario);
    let agent = load_agent_config(config);
    let results = run_batch(&scenario, &agent, batch);

    for seed_hash in &results.hashes {
        println!("seed {:>6}  {:016x}", seed_hash.seed, seed_hash.hash);
    }
    let summary = &results.summary;
    println!(
        "{} games, avg commits {:.1}, avg idle ticks {:.1}, {} expanded, {:.1}s",
        summary.total_games,
        summary.avg_commits,
        summary.avg_idle_ticks,
        summary.games_expanded,
        results.duration_seconds
    );

    if let Some(path) = &results.config.output {
        if let Err(e) = results.save(path) {
            fail(e);
        }
        tracing::info!(path = %path.display(), "Results saved");
    }
    if !results.errors.is_empty() {
        fail(format!("{} games failed", results.errors.len()));
    }
}

/// Verify determinism
fn cmd_verify(scenario: &str, seed: u64, runs: u32, ticks: u64) {
    let scenario = load_scenario(scenario);
    tracing::info!(scenario = %scenario.name, seed, runs, "Verifying determinism");

    if verify_determinism(&scenario, &AgentConfig::default(), ticks, seed, runs) {
        eprintln!("PASS: All {runs} runs produced identical command logs");
    } else {
        fail("non-determinism detected");
    }
}

/// Validate an agent config
fn cmd_check_config(path: PathBuf) {
    let config = load_agent_config(Some(path.clone()));
    println!("{}: ok", path.display());
    println!(
        "  caps: workers {}, marines {}, bases {}",
        config.caps.workers, config.caps.marines, config.caps.bases
    );
    println!("  reflex seed: {}", config.seed);
}
