//! # Foundry Core
//!
//! Deterministic build-order agent for a real-time strategy game.
//!
//! Each tick the agent reads one [`snapshot::WorldSnapshot`] from the engine,
//! runs a fixed list of production policies against a shared
//! [`ledger::Ledger`], and issues the resulting orders. This crate contains
//! **only** decision logic:
//! - No IO (configs are loaded from strings or files by the caller's choice)
//! - No system randomness (the combat reflex uses a seeded RNG)
//! - No floating-point math (uses fixed-point)
//!
//! ## Crate Structure
//!
//! - [`agent`] - Tick orchestrator and per-tick reports
//! - [`policies`] - Production policies in priority order
//! - [`ledger`] - Per-tick budget and commitment tracking
//! - [`placement`] - Spacing-aware structure placement
//! - [`combat`] - Threat detection and response
//! - [`workers`] - Idle worker reassignment
//! - [`engine`] - The engine interface
//! - [`math`] - Fixed-point math utilities

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod agent;
pub mod combat;
pub mod config;
pub mod engine;
pub mod error;
pub mod kind;
pub mod ledger;
pub mod math;
pub mod placement;
pub mod policies;
pub mod snapshot;
pub mod workers;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::agent::{Agent, IssuedAction, TickReport};
    pub use crate::combat::{CombatReflex, ThreatState};
    pub use crate::config::{AgentConfig, Caps, Cost, CostTable};
    pub use crate::engine::{Command, Engine, WorldQuery};
    pub use crate::error::{AgentError, Result};
    pub use crate::kind::{Capabilities, UnitKind};
    pub use crate::ledger::Ledger;
    pub use crate::math::{Fixed, Vec2Fixed};
    pub use crate::policies::{standard_policies, Action, Policy, PolicyContext};
    pub use crate::snapshot::{
        BuildCommitment, CommitmentSite, Owner, ResourceNode, Resources, Unit, UnitId, UnitStatus,
        WorldSnapshot,
    };
}
