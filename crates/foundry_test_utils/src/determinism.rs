//! Determinism testing utilities.
//!
//! Provides a harness for verifying that the agent issues identical command
//! streams given identical inputs.
//!
//! # Testing Strategy
//!
//! Sources of non-determinism the agent has to avoid:
//!
//! - **Floating-point math**: positions and distances use
//!   [`foundry_core::math::Fixed`] throughout.
//!
//! - **HashMap iteration order**: the core only iterates `Vec`s in snapshot
//!   order and `BTree` collections.
//!
//! - **System randomness**: the combat reflex draws from a seeded ChaCha RNG.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use foundry_core::agent::Agent;

use crate::scripted::ScriptedEngine;

/// Result of a determinism test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Whether all runs produced identical results.
    pub is_deterministic: bool,
    /// Hashes from each run.
    pub hashes: Vec<u64>,
    /// Number of ticks run.
    pub ticks: u64,
}

impl DeterminismResult {
    /// Get all unique hashes (should be 1 for a deterministic agent).
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        let mut unique: Vec<u64> = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }

    /// Assert that every run matched, with a detailed error message.
    ///
    /// # Panics
    ///
    /// Panics if the runs produced different hashes.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic {
            let unique = self.unique_hashes();
            panic!(
                "Agent is non-deterministic!\n\
                 Runs: {}\n\
                 Ticks: {}\n\
                 Unique hashes: {} (expected 1)\n\
                 All hashes: {:?}",
                self.hashes.len(),
                self.ticks,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Run a stateful process multiple times and verify determinism.
///
/// # Arguments
///
/// * `runs` - Number of times to run
/// * `ticks` - Number of steps per run
/// * `setup` - Function to create the initial state
/// * `step` - Function to advance by one step
/// * `hash` - Function to compute the state hash
pub fn verify_determinism<S, Setup, Step, HashFn>(
    runs: usize,
    ticks: u64,
    setup: Setup,
    step: Step,
    hash: HashFn,
) -> DeterminismResult
where
    Setup: Fn() -> S,
    Step: Fn(&mut S, u64),
    HashFn: Fn(&S) -> u64,
{
    let mut hashes = Vec::with_capacity(runs);

    for _ in 0..runs {
        let mut state = setup();

        for tick in 0..ticks {
            step(&mut state, tick);
        }

        hashes.push(hash(&state));
    }

    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);

    DeterminismResult {
        is_deterministic,
        hashes,
        ticks,
    }
}

/// Drive an agent over a [`ScriptedEngine`] and hash the issued command log.
///
/// The engine's [`resolve`](ScriptedEngine::resolve) runs after every tick.
pub fn verify_agent_determinism<F>(runs: usize, ticks: u64, setup: F) -> DeterminismResult
where
    F: Fn() -> (Agent, ScriptedEngine),
{
    verify_determinism(
        runs,
        ticks,
        setup,
        |(agent, engine), tick| {
            agent.on_step(engine, tick);
            engine.resolve();
        },
        |(_, engine)| compute_hash(&engine.issued()),
    )
}

/// Compare two runs tick-by-tick, finding the first tick whose issued
/// commands differ.
///
/// Returns `None` if the runs never diverge.
pub fn find_first_divergence<F>(setup: F, ticks: u64) -> Option<u64>
where
    F: Fn() -> (Agent, ScriptedEngine),
{
    let (mut agent_a, mut engine_a) = setup();
    let (mut agent_b, mut engine_b) = setup();

    for tick in 0..ticks {
        agent_a.on_step(&mut engine_a, tick);
        agent_b.on_step(&mut engine_b, tick);
        engine_a.resolve();
        engine_b.resolve();

        if compute_hash(&engine_a.issued()) != compute_hash(&engine_b.issued()) {
            return Some(tick);
        }
    }

    None
}

/// Compute a simple hash for any hashable value.
pub fn compute_hash<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

/// Proptest strategies for agent testing.
pub mod strategies {
    use proptest::prelude::*;

    use foundry_core::kind::UnitKind;
    use foundry_core::math::{Fixed, Vec2Fixed};
    use foundry_core::snapshot::Resources;

    /// A fixed-point coordinate on a typical map.
    ///
    /// Range: -200 to 200
    pub fn arb_coordinate() -> impl Strategy<Value = Fixed> {
        (-200i32..200i32).prop_map(Fixed::from_num)
    }

    /// A position on a typical map.
    pub fn arb_position() -> impl Strategy<Value = Vec2Fixed> {
        (arb_coordinate(), arb_coordinate()).prop_map(|(x, y)| Vec2Fixed::new(x, y))
    }

    /// A position close to the origin, where bases and structures cluster.
    pub fn arb_near_position(radius: i32) -> impl Strategy<Value = Vec2Fixed> {
        (-radius..=radius, -radius..=radius).prop_map(|(x, y)| Vec2Fixed::from_units(x, y))
    }

    /// Resource totals an agent can realistically see.
    pub fn arb_resources() -> impl Strategy<Value = Resources> {
        (0i32..2000, 0i32..1000, 0i32..30)
            .prop_map(|(minerals, gas, supply_left)| Resources::new(minerals, gas, supply_left))
    }

    /// Any named structure kind.
    pub fn arb_structure_kind() -> impl Strategy<Value = UnitKind> {
        prop::sample::select(
            UnitKind::NAMED
                .iter()
                .copied()
                .filter(|k| k.is_structure())
                .collect::<Vec<_>>(),
        )
    }

    /// Any named non-structure kind.
    pub fn arb_trainable_kind() -> impl Strategy<Value = UnitKind> {
        prop::sample::select(
            UnitKind::NAMED
                .iter()
                .copied()
                .filter(|k| !k.is_structure())
                .collect::<Vec<_>>(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::opening_snapshot;
    use foundry_core::config::AgentConfig;

    #[test]
    fn test_verify_determinism_simple() {
        let result = verify_determinism(3, 100, || 0u64, |n, _| *n += 1, |n| *n);

        assert!(result.is_deterministic);
        assert_eq!(result.hashes, vec![100, 100, 100]);
    }

    #[test]
    fn test_detects_divergence() {
        use std::cell::Cell;
        let calls = Cell::new(0u64);
        let result = verify_determinism(
            2,
            1,
            || {
                calls.set(calls.get() + 1);
                calls.get()
            },
            |_, _| {},
            |n| *n,
        );
        assert!(!result.is_deterministic);
        assert_eq!(result.unique_hashes().len(), 2);
    }

    #[test]
    fn test_agent_opening_is_deterministic() {
        let setup = || {
            let agent = Agent::new(AgentConfig::default()).unwrap();
            let engine = ScriptedEngine::new(opening_snapshot(400, 0, 10)).with_income(60, 8);
            (agent, engine)
        };
        verify_agent_determinism(3, 50, setup).assert_deterministic();
        assert_eq!(find_first_divergence(setup, 50), None);
    }
}
