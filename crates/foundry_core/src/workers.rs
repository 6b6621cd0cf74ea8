//! Worker allocation.
//!
//! Idle gatherers that wandered off (or finished a construction job away from
//! the main base) are sent back to the nearest mineral patch. Workers near the
//! start location are left to the engine's own saturation logic.

use crate::config::AgentConfig;
use crate::engine::Command;
use crate::ledger::Ledger;
use crate::math::nearest_to;
use crate::policies::Action;
use crate::snapshot::WorldSnapshot;

/// Send idle, far-away gatherers to their nearest non-depleted mineral patch.
#[must_use]
pub fn allocate_workers(
    snapshot: &WorldSnapshot,
    config: &AgentConfig,
    ledger: &mut Ledger,
) -> Vec<Action> {
    let rally = AgentConfig::units(config.worker_rally_radius);
    let mut actions = Vec::new();

    for worker in snapshot.units.iter().filter(|u| {
        u.is_idle()
            && u.can_gather()
            && !u.is_structure()
            && u.position.is_farther_than(snapshot.start_location, rally)
    }) {
        if ledger.is_claimed(worker.id) {
            continue;
        }
        let patches = snapshot.minerals.iter().filter(|m| m.remaining > 0);
        let Some(patch) = nearest_to(worker.position, patches, |m| m.position) else {
            tracing::debug!("No mineral patch left for idle workers");
            break;
        };
        ledger.claim(worker.id);
        actions.push(Action::new(worker.id, Command::Gather(patch.id)));
    }
    actions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CostTable;
    use crate::kind::UnitKind;
    use crate::math::Vec2Fixed;
    use crate::snapshot::{Owner, ResourceNode, Unit, UnitStatus};

    fn scv(id: u64, x: i32, y: i32, status: UnitStatus) -> Unit {
        Unit {
            id,
            kind: UnitKind::Scv,
            position: Vec2Fixed::from_units(x, y),
            owner: Owner::Own,
            status,
            capabilities: UnitKind::Scv.default_capabilities(),
        }
    }

    fn patch(id: u64, x: i32, y: i32, remaining: i32) -> ResourceNode {
        ResourceNode {
            id,
            position: Vec2Fixed::from_units(x, y),
            remaining,
        }
    }

    fn world() -> WorldSnapshot {
        WorldSnapshot {
            units: vec![
                scv(1, 30, 0, UnitStatus::Idle),
                scv(2, 3, 0, UnitStatus::Idle),
                scv(3, 40, 0, UnitStatus::Busy),
            ],
            minerals: vec![
                patch(10, -8, 0, 1500),
                patch(11, 38, 0, 0),
                patch(12, 25, 5, 900),
            ],
            ..Default::default()
        }
    }

    #[test]
    fn test_far_idle_worker_goes_to_nearest_live_patch() {
        let snapshot = world();
        let mut ledger = Ledger::open(&snapshot, &CostTable::default());
        let actions = allocate_workers(&snapshot, &AgentConfig::default(), &mut ledger);

        assert_eq!(actions, vec![Action::new(1, Command::Gather(12))]);
        assert!(ledger.is_claimed(1));
    }

    #[test]
    fn test_no_patches_no_orders() {
        let mut snapshot = world();
        snapshot.minerals.clear();
        let mut ledger = Ledger::open(&snapshot, &CostTable::default());
        assert!(allocate_workers(&snapshot, &AgentConfig::default(), &mut ledger).is_empty());
    }
}
