//! Combat reflex: pull idle fighters onto enemies near the base.
//!
//! The threat state is recomputed from scratch every tick. One owned
//! structure, drawn with a seeded RNG, is the reference point; enemies
//! strictly within the threat radius of it put the reflex into
//! [`ThreatState::Responding`]. Every idle ground-attacker is then sent to
//! the single enemy nearest that structure. Simultaneous attacks on distant
//! structures can go unnoticed for a tick.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::config::AgentConfig;
use crate::engine::Command;
use crate::ledger::Ledger;
use crate::math::{nearest_to, Vec2Fixed};
use crate::policies::Action;
use crate::snapshot::{UnitId, WorldSnapshot};

/// Outcome of the threat check for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ThreatState {
    /// No enemy near the reference structure.
    Passive,
    /// Enemies near the reference structure.
    Responding {
        /// Structure used as the reference point.
        structure: UnitId,
        /// Position every responder attacks.
        target: Vec2Fixed,
        /// Enemies within range of the structure.
        enemies: usize,
    },
}

impl ThreatState {
    /// Whether the reflex is responding.
    #[must_use]
    pub const fn is_responding(&self) -> bool {
        matches!(self, Self::Responding { .. })
    }
}

/// Seeded threat detector.
#[derive(Debug, Clone)]
pub struct CombatReflex {
    rng: ChaCha8Rng,
}

impl CombatReflex {
    /// Create a reflex with a deterministic seed.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Pick a reference structure and look for enemies around it.
    ///
    /// Draws from the RNG once per call when any structure exists.
    pub fn assess(&mut self, snapshot: &WorldSnapshot, config: &AgentConfig) -> ThreatState {
        let structures: Vec<_> = snapshot.structures().collect();
        if structures.is_empty() {
            return ThreatState::Passive;
        }
        let structure = structures[self.rng.gen_range(0..structures.len())];
        let radius = AgentConfig::units(config.threat_radius);

        let nearby: Vec<_> = snapshot.enemies_near(structure.position, radius).collect();
        let Some(target) = nearest_to(structure.position, nearby.iter(), |e| e.position) else {
            return ThreatState::Passive;
        };
        ThreatState::Responding {
            structure: structure.id,
            target: target.position,
            enemies: nearby.len(),
        }
    }

    /// Orders for a threat state: every unclaimed idle ground-attacker
    /// attacks the target position.
    #[must_use]
    pub fn respond(state: &ThreatState, snapshot: &WorldSnapshot, ledger: &mut Ledger) -> Vec<Action> {
        let ThreatState::Responding { target, .. } = *state else {
            return Vec::new();
        };
        let responders: Vec<UnitId> = snapshot
            .units
            .iter()
            .filter(|u| u.is_idle() && u.can_attack_ground() && !u.is_structure())
            .filter(|u| !ledger.is_claimed(u.id))
            .map(|u| u.id)
            .collect();

        responders
            .into_iter()
            .map(|id| {
                ledger.claim(id);
                Action::new(id, Command::Attack(target))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CostTable;
    use crate::kind::UnitKind;
    use crate::snapshot::{Owner, Unit, UnitStatus};

    fn unit(id: UnitId, kind: UnitKind, owner: Owner, x: i32, y: i32) -> Unit {
        Unit {
            id,
            kind,
            position: Vec2Fixed::from_units(x, y),
            owner,
            status: UnitStatus::Idle,
            capabilities: kind.default_capabilities(),
        }
    }

    fn single_structure_world(enemy_at: (i32, i32)) -> WorldSnapshot {
        WorldSnapshot {
            units: vec![
                unit(1, UnitKind::CommandCenter, Owner::Own, 0, 0),
                unit(2, UnitKind::Marine, Owner::Own, 2, 2),
                unit(3, UnitKind::Scv, Owner::Own, 1, 1),
            ],
            enemies: vec![unit(50, UnitKind::Other(1), Owner::Enemy, enemy_at.0, enemy_at.1)],
            ..Default::default()
        }
    }

    #[test]
    fn test_no_structures_is_passive() {
        let mut reflex = CombatReflex::new(0);
        let state = reflex.assess(&WorldSnapshot::default(), &AgentConfig::default());
        assert_eq!(state, ThreatState::Passive);
    }

    #[test]
    fn test_enemy_in_range_triggers_response() {
        let mut reflex = CombatReflex::new(0);
        let snapshot = single_structure_world((10, 0));
        let state = reflex.assess(&snapshot, &AgentConfig::default());
        assert_eq!(
            state,
            ThreatState::Responding {
                structure: 1,
                target: Vec2Fixed::from_units(10, 0),
                enemies: 1,
            }
        );
    }

    #[test]
    fn test_enemy_at_radius_is_ignored() {
        let mut reflex = CombatReflex::new(0);
        let snapshot = single_structure_world((15, 0));
        assert!(!reflex.assess(&snapshot, &AgentConfig::default()).is_responding());
    }

    #[test]
    fn test_only_ground_attackers_respond() {
        let mut reflex = CombatReflex::new(0);
        let snapshot = single_structure_world((5, 0));
        let mut ledger = Ledger::open(&snapshot, &CostTable::default());
        let state = reflex.assess(&snapshot, &AgentConfig::default());

        let actions = CombatReflex::respond(&state, &snapshot, &mut ledger);
        assert_eq!(
            actions,
            vec![Action::new(2, Command::Attack(Vec2Fixed::from_units(5, 0)))]
        );
    }

    #[test]
    fn test_claimed_units_are_left_alone() {
        let mut reflex = CombatReflex::new(0);
        let snapshot = single_structure_world((5, 0));
        let mut ledger = Ledger::open(&snapshot, &CostTable::default());
        ledger.claim(2);
        let state = reflex.assess(&snapshot, &AgentConfig::default());
        assert!(CombatReflex::respond(&state, &snapshot, &mut ledger).is_empty());
    }

    #[test]
    fn test_same_seed_same_picks() {
        let mut snapshot = single_structure_world((5, 0));
        for i in 0..6 {
            snapshot
                .units
                .push(unit(100 + i, UnitKind::SupplyDepot, Owner::Own, 40 * i as i32, 40));
        }
        let config = AgentConfig::default();
        let mut a = CombatReflex::new(42);
        let mut b = CombatReflex::new(42);
        for _ in 0..20 {
            assert_eq!(a.assess(&snapshot, &config), b.assess(&snapshot, &config));
        }
    }
}
