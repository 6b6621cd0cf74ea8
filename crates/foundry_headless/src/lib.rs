//! Headless runner for the build-order agent.
//!
//! This crate drives [`foundry_core::agent::Agent`] against a deterministic
//! sandbox world instead of a real game client. This enables:
//!
//! - **Regression runs**: a scenario played for N ticks yields metrics
//! - **Determinism checks**: the accepted command log is hashed per seed
//! - **Batch runs**: many seeds in parallel with rayon
//!
//! # Example
//!
//! ```bash
//! cargo run -p foundry_headless -- run --scenario standard --ticks 2000 --json
//! cargo run -p foundry_headless -- batch --scenario scenarios/rush.ron --seeds 32
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod batch;
pub mod grid;
pub mod metrics;
pub mod runner;
pub mod sandbox;
pub mod scenario;

pub use batch::{run_batch, BatchConfig, BatchResults};
pub use metrics::{BatchSummary, GameMetrics, MetricsCollector};
pub use runner::{run_game, GameConfig, GameResult, RunError};
pub use sandbox::SandboxEngine;
pub use scenario::{Scenario, ScenarioError};
