//! Full game runs against the sandbox engine.
//!
//! Drives one [`Agent`] over one [`SandboxEngine`] for a fixed number of
//! ticks, feeding every tick report to a [`MetricsCollector`].

use std::time::Instant;

use thiserror::Error;
use tracing::{debug, info};

use foundry_core::agent::Agent;
use foundry_core::config::AgentConfig;
use foundry_core::engine::WorldQuery;
use foundry_core::error::AgentError;
use foundry_core::snapshot::WorldSnapshot;

use crate::metrics::{GameMetrics, MetricsCollector};
use crate::sandbox::{LoggedCommand, SandboxEngine};
use crate::scenario::{Scenario, ScenarioError};

/// Progress logging interval (ticks).
const PROGRESS_LOG_INTERVAL: u64 = 500;

/// Errors that stop a run before it starts.
#[derive(Error, Debug)]
pub enum RunError {
    /// The agent configuration was rejected.
    #[error("Agent error: {0}")]
    Agent(#[from] AgentError),

    /// The scenario could not be loaded.
    #[error("Scenario error: {0}")]
    Scenario(#[from] ScenarioError),
}

/// Configuration for a single game run.
#[derive(Debug, Clone)]
pub struct GameConfig {
    /// Sandbox seed (wave jitter).
    pub seed: u64,
    /// Ticks to run.
    pub max_ticks: u64,
    /// Scenario to use.
    pub scenario: Scenario,
    /// Agent configuration.
    pub agent: AgentConfig,
    /// Game ID for tracking.
    pub game_id: String,
}

impl GameConfig {
    /// Run `scenario` with the default agent configuration.
    #[must_use]
    pub fn new(scenario: Scenario, max_ticks: u64, seed: u64) -> Self {
        Self {
            game_id: format!("{}_{seed}", scenario.name),
            seed,
            max_ticks,
            scenario,
            agent: AgentConfig::default(),
        }
    }

    /// Use a custom agent configuration.
    #[must_use]
    pub fn with_agent(mut self, agent: AgentConfig) -> Self {
        self.agent = agent;
        self
    }
}

/// Result of running a game.
#[derive(Debug)]
pub struct GameResult {
    /// Collected metrics.
    pub metrics: GameMetrics,
    /// World state after the last tick.
    pub final_snapshot: WorldSnapshot,
    /// Every command the sandbox accepted.
    pub command_log: Vec<LoggedCommand>,
}

/// Run a complete game.
///
/// Each tick the agent acts on the current world, then the sandbox advances.
///
/// # Errors
/// Returns [`RunError::Agent`] if the agent configuration fails validation.
pub fn run_game(config: GameConfig) -> Result<GameResult, RunError> {
    let started = Instant::now();
    info!(
        game_id = %config.game_id,
        seed = config.seed,
        max_ticks = config.max_ticks,
        scenario = %config.scenario.name,
        "Starting game"
    );

    let mut engine =
        SandboxEngine::from_scenario(&config.scenario, config.agent.costs.clone(), config.seed);
    let mut agent = Agent::new(config.agent)?;
    let mut collector = MetricsCollector::new(&config.game_id, &config.scenario.name, config.seed);

    for tick in 0..config.max_ticks {
        agent.on_step(&mut engine, tick);
        if let Some(report) = agent.last_report() {
            collector.record_tick(report);
        }
        engine.advance();

        if tick > 0 && tick % PROGRESS_LOG_INTERVAL == 0 {
            let snapshot = engine.snapshot();
            debug!(
                tick,
                units = snapshot.units.len(),
                minerals = snapshot.resources.minerals,
                pending = snapshot.pending.len(),
                "Progress"
            );
        }
    }

    let final_snapshot = engine.snapshot();
    let metrics = collector.finalize(&final_snapshot, engine.stats(), engine.command_log_hash());

    info!(
        game_id = %metrics.game_id,
        commits = metrics.total_commits(),
        idle_ticks = metrics.idle_ticks,
        rejections = metrics.rejections,
        elapsed_ms = started.elapsed().as_millis(),
        "Game finished"
    );

    Ok(GameResult {
        metrics,
        final_snapshot,
        command_log: engine.command_log().to_vec(),
    })
}
