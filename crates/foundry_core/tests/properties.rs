//! Property tests for the ledger, placement and policy invariants.

use std::collections::BTreeSet;

use foundry_core::agent::Agent;
use foundry_core::config::{AgentConfig, Cost};
use foundry_core::kind::UnitKind;
use foundry_core::ledger::Ledger;
use foundry_core::math::Vec2Fixed;
use foundry_core::placement::{find_placement, PlacementQuery};
use foundry_core::policies::{standard_policies, PolicyContext};
use foundry_core::snapshot::UnitStatus;
use foundry_test_utils::determinism::strategies::{arb_near_position, arb_resources};
use foundry_test_utils::determinism::verify_agent_determinism;
use foundry_test_utils::fixtures::{fixed, opening_snapshot, pos, SnapshotBuilder};
use foundry_test_utils::proptest::prelude::*;
use foundry_test_utils::scripted::PlacementScript;
use foundry_test_utils::ScriptedEngine;

fn small_caps() -> AgentConfig {
    let mut config = AgentConfig::default();
    config.caps.workers = 10;
    config.caps.marines = 4;
    config.caps.hellions = 2;
    config.caps.transports = 1;
    config.caps.vikings = 1;
    config.caps.barracks = 1;
    config.caps.starports = 1;
    config.caps.factories = 1;
    config.caps.armories = 1;
    config.caps.engineering_bays = 1;
    config.caps.bases = 2;
    config
}

fn total_cost(config: &AgentConfig, kinds: impl Iterator<Item = UnitKind>) -> Cost {
    kinds.fold(Cost::default(), |acc, kind| {
        let cost = config.costs.get(kind);
        Cost::new(
            acc.minerals + cost.minerals,
            acc.gas + cost.gas,
            acc.supply + cost.supply,
        )
    })
}

proptest! {
    /// Closing resources never go negative and match opening minus commits.
    #[test]
    fn prop_ledger_conserves_resources(resources in arb_resources()) {
        let snapshot = opening_snapshot(resources.minerals, resources.gas, resources.supply_left);
        let config = AgentConfig::default();
        let mut engine = ScriptedEngine::new(snapshot);
        let mut agent = Agent::new(config.clone()).unwrap();
        agent.on_step(&mut engine, 0);

        let report = agent.last_report().unwrap();
        prop_assert!(report.closing.minerals >= 0);
        prop_assert!(report.closing.gas >= 0);
        prop_assert_eq!(report.opening, resources);

        let committed = total_cost(&config, report.commitments.iter().map(|c| c.kind));
        prop_assert_eq!(report.spent, committed);
        prop_assert_eq!(report.closing.minerals, resources.minerals - committed.minerals);
        prop_assert_eq!(report.closing.gas, resources.gas - committed.gas);
    }

    /// Planning twice from equal ledgers yields equal actions.
    #[test]
    fn prop_policies_are_idempotent(resources in arb_resources()) {
        let snapshot = opening_snapshot(resources.minerals, resources.gas, resources.supply_left);
        let config = AgentConfig::default();
        let engine = ScriptedEngine::new(snapshot.clone());
        let cx = PolicyContext::new(&snapshot, &config, &engine);
        let mut ledger = Ledger::open(&snapshot, &config.costs);

        for policy in standard_policies() {
            let mut first = ledger.clone();
            let mut second = ledger.clone();
            let a = policy.plan(&cx, &mut first);
            let b = policy.plan(&cx, &mut second);
            prop_assert_eq!(&a, &b, "{} is not idempotent", policy.name());
            prop_assert_eq!(&first, &second);
            ledger = first;
        }
    }

    /// No kind ever exceeds its cap, however long the agent runs.
    #[test]
    fn prop_caps_hold_over_many_ticks(
        minerals in 0i32..3000,
        gas in 0i32..1500,
        income in 20i32..200,
    ) {
        let config = small_caps();
        let mut engine = ScriptedEngine::new(opening_snapshot(minerals, gas, 15))
            .with_income(income, income / 3);
        let mut agent = Agent::new(config.clone()).unwrap();

        for tick in 0..60 {
            agent.on_step(&mut engine, tick);
            engine.resolve();
            let snapshot = engine.current();
            for kind in UnitKind::NAMED {
                if let Some(cap) = config.caps.cap(kind) {
                    prop_assert!(
                        snapshot.count(kind) <= cap as usize,
                        "{} exceeded its cap at tick {}: {} > {}",
                        kind, tick, snapshot.count(kind), cap
                    );
                }
            }
        }
    }

    /// The validator never accepts a spot within spacing of an owned structure.
    #[test]
    fn prop_placement_respects_spacing(
        structures in prop::collection::vec(arb_near_position(12), 0..8),
        candidate in arb_near_position(12),
    ) {
        let mut builder = SnapshotBuilder::new();
        for at in &structures {
            builder = builder.unit(UnitKind::SupplyDepot, *at, UnitStatus::Idle);
        }
        let snapshot = builder.build();
        let engine = ScriptedEngine::new(snapshot.clone())
            .with_placement(PlacementScript::Always(candidate));
        let ledger = Ledger::open(&snapshot, &AgentConfig::default().costs);
        let query = PlacementQuery {
            kind: UnitKind::Barracks,
            near: Vec2Fixed::ZERO,
            spacing: fixed(3),
            max_distance: fixed(20),
        };

        if let Some(spot) = find_placement(&query, &snapshot, &ledger, &engine) {
            prop_assert!(structures.iter().all(|s| !s.is_closer_than(spot, fixed(3))));
        }
    }
}

#[test]
fn test_spot_exactly_at_spacing_is_legal() {
    let snapshot = SnapshotBuilder::new()
        .idle(UnitKind::SupplyDepot, pos(0, 0))
        .build();
    let engine =
        ScriptedEngine::new(snapshot.clone()).with_placement(PlacementScript::Always(pos(3, 0)));
    let ledger = Ledger::open(&snapshot, &AgentConfig::default().costs);
    let query = PlacementQuery {
        kind: UnitKind::Barracks,
        near: Vec2Fixed::ZERO,
        spacing: fixed(3),
        max_distance: fixed(20),
    };
    assert_eq!(find_placement(&query, &snapshot, &ledger, &engine), Some(pos(3, 0)));
}

#[test]
fn test_builders_unique_within_tick() {
    let config = AgentConfig::default();
    let mut engine = ScriptedEngine::new(opening_snapshot(3000, 1000, 3));
    let mut agent = Agent::new(config).unwrap();
    agent.on_step(&mut engine, 0);

    let mut seen = BTreeSet::new();
    for (unit, _) in engine.issued() {
        assert!(seen.insert(*unit), "unit {unit} received two orders in one tick");
    }
}

#[test]
fn test_long_run_is_deterministic() {
    verify_agent_determinism(3, 120, || {
        let config = AgentConfig {
            seed: 99,
            ..small_caps()
        };
        let mut snapshot = opening_snapshot(400, 0, 10);
        let mut enemies = SnapshotBuilder::new().enemy(pos(8, 8)).build().enemies;
        enemies[0].id = 900;
        snapshot.enemies = enemies;
        let engine = ScriptedEngine::new(snapshot).with_income(80, 20);
        (Agent::new(config).unwrap(), engine)
    })
    .assert_deterministic();
}
