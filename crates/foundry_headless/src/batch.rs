//! Batch game runner.
//!
//! Runs one scenario across a range of seeds in parallel using rayon and
//! reports per-seed command-log hashes alongside the aggregate summary.

use std::path::{Path, PathBuf};
use std::time::Instant;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use foundry_core::config::AgentConfig;

use crate::metrics::{BatchSummary, GameMetrics};
use crate::runner::{run_game, GameConfig};
use crate::scenario::Scenario;

/// Configuration for a batch run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Number of games to run
    pub game_count: u32,
    /// Maximum parallel games (0 = use rayon default)
    pub parallel_games: u32,
    /// Starting seed for deterministic runs
    pub seed_start: u64,
    /// Ticks per game
    pub max_ticks: u64,
    /// Output file for results
    pub output: Option<PathBuf>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            game_count: 16,
            parallel_games: 0,
            seed_start: 0,
            max_ticks: 2000,
            output: None,
        }
    }
}

impl BatchConfig {
    /// Create config for a number of games
    #[must_use]
    pub fn new(game_count: u32) -> Self {
        Self {
            game_count,
            ..Default::default()
        }
    }

    /// Set seed start
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed_start = seed;
        self
    }

    /// Set ticks per game
    #[must_use]
    pub fn with_ticks(mut self, ticks: u64) -> Self {
        self.max_ticks = ticks;
        self
    }

    /// Set output file
    #[must_use]
    pub fn with_output(mut self, path: PathBuf) -> Self {
        self.output = Some(path);
        self
    }
}

/// Command-log hash of one seed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedHash {
    /// Seed used for the sandbox and the reflex.
    pub seed: u64,
    /// Hash of the accepted command log.
    pub hash: u64,
}

/// Error during batch run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchError {
    /// Seed used
    pub seed: u64,
    /// Error message
    pub message: String,
}

/// Results from a batch run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResults {
    /// Scenario name
    pub scenario: String,
    /// Configuration used
    pub config: BatchConfig,
    /// Individual game metrics, in seed order
    pub games: Vec<GameMetrics>,
    /// Per-seed command-log hashes, in seed order
    pub hashes: Vec<SeedHash>,
    /// Aggregate summary
    pub summary: BatchSummary,
    /// Total runtime
    pub duration_seconds: f64,
    /// Errors encountered
    pub errors: Vec<BatchError>,
}

impl BatchResults {
    /// Save results to JSON file
    ///
    /// # Errors
    /// Returns any IO or serialization error.
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }

    /// Load results from JSON file
    ///
    /// # Errors
    /// Returns any IO or deserialization error.
    pub fn load(path: &Path) -> std::io::Result<Self> {
        let json = std::fs::read_to_string(path)?;
        serde_json::from_str(&json).map_err(std::io::Error::other)
    }

    /// Hash recorded for a seed.
    #[must_use]
    pub fn hash_for(&self, seed: u64) -> Option<u64> {
        self.hashes.iter().find(|h| h.seed == seed).map(|h| h.hash)
    }
}

fn game_config(scenario: &Scenario, agent: &AgentConfig, ticks: u64, seed: u64) -> GameConfig {
    let agent = AgentConfig {
        seed,
        ..agent.clone()
    };
    GameConfig::new(scenario.clone(), ticks, seed).with_agent(agent)
}

/// Run a batch of games, one per seed.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn run_batch(scenario: &Scenario, agent: &AgentConfig, config: BatchConfig) -> BatchResults {
    let start = Instant::now();
    info!(
        games = config.game_count,
        scenario = %scenario.name,
        seed_start = config.seed_start,
        "Starting batch run"
    );

    if config.parallel_games > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(config.parallel_games as usize)
            .build_global()
            .ok(); // Ignore if already set
    }

    let results: Vec<Result<GameMetrics, BatchError>> = (0..config.game_count)
        .into_par_iter()
        .map(|i| {
            let seed = config.seed_start.wrapping_add(u64::from(i));
            run_game(game_config(scenario, agent, config.max_ticks, seed))
                .map(|result| result.metrics)
                .map_err(|e| {
                    warn!(seed, error = %e, "Game failed");
                    BatchError {
                        seed,
                        message: e.to_string(),
                    }
                })
        })
        .collect();

    let (games, errors): (Vec<_>, Vec<_>) = results.into_iter().partition(Result::is_ok);
    let games: Vec<GameMetrics> = games.into_iter().filter_map(Result::ok).collect();
    let errors: Vec<BatchError> = errors.into_iter().filter_map(Result::err).collect();

    let hashes = games
        .iter()
        .map(|g| SeedHash {
            seed: g.seed,
            hash: g.command_log_hash,
        })
        .collect();
    let summary = BatchSummary::from_games(&games);
    let duration_seconds = start.elapsed().as_secs_f64();

    info!(
        games = games.len(),
        errors = errors.len(),
        duration_seconds,
        "Batch complete"
    );

    BatchResults {
        scenario: scenario.name.clone(),
        config,
        games,
        hashes,
        summary,
        duration_seconds,
        errors,
    }
}

/// Run the same seed several times and compare command-log hashes.
///
/// Returns `false` if any run fails or diverges.
#[must_use]
pub fn verify_determinism(
    scenario: &Scenario,
    agent: &AgentConfig,
    ticks: u64,
    seed: u64,
    runs: u32,
) -> bool {
    let hashes: Vec<Option<u64>> = (0..runs)
        .into_par_iter()
        .map(|_| {
            run_game(game_config(scenario, agent, ticks, seed))
                .ok()
                .map(|result| result.metrics.command_log_hash)
        })
        .collect();

    match hashes.first() {
        Some(Some(first)) => hashes.iter().all(|h| *h == Some(*first)),
        _ => false,
    }
}
