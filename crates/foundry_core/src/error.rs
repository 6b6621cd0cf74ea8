//! Error types for the decision core.
//!
//! None of these are fatal to the agent. Policy preconditions that fail
//! (`Unaffordable`, `NoLegalPlacement`, `NoExpansionAvailable`) are skips that
//! get retried on the next tick; `EngineRejection` is logged and tolerated.

use thiserror::Error;

use crate::kind::UnitKind;
use crate::snapshot::UnitId;

/// Result type alias using [`AgentError`].
pub type Result<T> = std::result::Result<T, AgentError>;

/// Top-level error type for the agent.
#[derive(Debug, Error)]
pub enum AgentError {
    /// The ledger cannot cover the cost of a commitment.
    #[error("Cannot afford {kind:?}: need {minerals}m/{gas}g/{supply}s, have {available_minerals}m/{available_gas}g/{available_supply}s")]
    Unaffordable {
        /// Kind being committed.
        kind: UnitKind,
        /// Mineral cost.
        minerals: i32,
        /// Gas cost.
        gas: i32,
        /// Supply cost.
        supply: i32,
        /// Minerals left in the ledger.
        available_minerals: i32,
        /// Gas left in the ledger.
        available_gas: i32,
        /// Supply headroom left in the ledger.
        available_supply: i32,
    },

    /// No legal build location near the anchor this tick.
    #[error("No legal placement for {0:?}")]
    NoLegalPlacement(UnitKind),

    /// Every known expansion site is already claimed.
    #[error("No unclaimed expansion site available")]
    NoExpansionAvailable,

    /// The engine refused an issued command.
    #[error("Engine rejected command for unit {unit}: {reason}")]
    EngineRejection {
        /// Unit the command was addressed to.
        unit: UnitId,
        /// Engine-provided reason.
        reason: String,
    },

    /// Failed to read a configuration file.
    #[error("Failed to read config '{path}': {source}")]
    ConfigRead {
        /// Path that failed to load.
        path: String,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse a configuration file.
    #[error("Failed to parse config: {0}")]
    ConfigParse(#[from] ron::error::SpannedError),

    /// Configuration parsed but holds unusable values.
    #[error("Invalid config: {0}")]
    InvalidConfig(String),
}
