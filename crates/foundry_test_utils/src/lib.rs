//! # Foundry Test Utilities
//!
//! Shared testing utilities for all crates:
//! - Snapshot fixtures
//! - A scripted engine that records issued commands
//! - Determinism test harness
//! - Property-based testing strategies

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod determinism;
pub mod fixtures;
pub mod scripted;

pub use scripted::ScriptedEngine;

/// Re-export proptest for convenience.
pub use proptest;
