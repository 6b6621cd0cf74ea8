//! Per-tick resource ledger.
//!
//! The ledger is built from the snapshot at the start of a tick and is the
//! only thing that changes while policies run. Every commit goes through
//! [`Ledger::reserve`], which deducts the cost immediately so that a later
//! policy in the same tick sees the reduced budget. That is what turns the
//! fixed policy order into a priority allocation of scarce resources.
//!
//! All calculations use integer math. There is no rollback: once a
//! commitment is reserved it stays reserved for the rest of the tick, even if
//! the engine later rejects the command.

use std::collections::BTreeSet;

use crate::config::{Cost, CostTable};
use crate::error::{AgentError, Result};
use crate::kind::UnitKind;
use crate::math::{Fixed, Vec2Fixed};
use crate::snapshot::{BuildCommitment, CommitmentSite, Resources, UnitId, WorldSnapshot};

/// Mutable budget and commitment tracker for one tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ledger {
    /// What is left to spend.
    available: Resources,
    /// Totals at tick start.
    opening: Resources,
    /// Prices.
    costs: CostTable,
    /// Commitments the engine reported at tick start.
    engine_pending: Vec<BuildCommitment>,
    /// Commitments made during this tick, in commit order.
    committed: Vec<BuildCommitment>,
    /// Units that already received an order this tick.
    claimed: BTreeSet<UnitId>,
}

impl Ledger {
    /// Open a ledger from a snapshot.
    #[must_use]
    pub fn open(snapshot: &WorldSnapshot, costs: &CostTable) -> Self {
        Self {
            available: snapshot.resources,
            opening: snapshot.resources,
            costs: costs.clone(),
            engine_pending: snapshot.pending.clone(),
            committed: Vec::new(),
            claimed: BTreeSet::new(),
        }
    }

    /// Remaining minerals, gas and supply headroom.
    #[must_use]
    pub const fn available(&self) -> Resources {
        self.available
    }

    /// Totals the tick started with.
    #[must_use]
    pub const fn opening(&self) -> Resources {
        self.opening
    }

    /// Sum of everything reserved this tick.
    #[must_use]
    pub fn spent(&self) -> Cost {
        Cost::new(
            self.opening.minerals - self.available.minerals,
            self.opening.gas - self.available.gas,
            self.opening.supply_left - self.available.supply_left,
        )
    }

    /// Price of a kind.
    #[must_use]
    pub fn cost(&self, kind: UnitKind) -> Cost {
        self.costs.get(kind)
    }

    /// Whether the remaining budget covers a kind.
    ///
    /// Supply is only checked for kinds that consume it, so a structure can
    /// still be afforded when supply is exhausted.
    #[must_use]
    pub fn can_afford(&self, kind: UnitKind) -> bool {
        let cost = self.cost(kind);
        self.available.minerals >= cost.minerals
            && self.available.gas >= cost.gas
            && (cost.supply == 0 || self.available.supply_left >= cost.supply)
    }

    /// Pending commitments of a kind: engine-reported plus this tick's.
    #[must_use]
    pub fn already_pending(&self, kind: UnitKind) -> usize {
        self.all_commitments().filter(|c| c.kind == kind).count()
    }

    /// Owned count plus pending, the number a cap is checked against.
    #[must_use]
    pub fn projected_count(&self, snapshot: &WorldSnapshot, kind: UnitKind) -> usize {
        snapshot.count(kind) + self.already_pending(kind)
    }

    /// Whether a commitment already targets the given resource node.
    #[must_use]
    pub fn node_committed(&self, node: UnitId) -> bool {
        self.all_commitments()
            .any(|c| c.site == CommitmentSite::Node(node))
    }

    /// Whether a producer was handed a training order for `kind` this tick.
    ///
    /// Scoped per kind: a producer that can train several kinds queues one
    /// of each.
    #[must_use]
    pub fn producer_committed(&self, producer: UnitId, kind: UnitKind) -> bool {
        self.committed
            .iter()
            .any(|c| c.kind == kind && c.site == CommitmentSite::Producer(producer))
    }

    /// Positional sites reserved this tick or reported pending, strictly
    /// within `radius` of `position`.
    #[must_use]
    pub fn site_reserved_near(&self, position: Vec2Fixed, radius: Fixed) -> bool {
        self.all_commitments().any(|c| match c.site {
            CommitmentSite::Position(site) => site.is_closer_than(position, radius),
            CommitmentSite::Node(_) | CommitmentSite::Producer(_) => false,
        })
    }

    /// Commitments made this tick.
    #[must_use]
    pub fn committed(&self) -> &[BuildCommitment] {
        &self.committed
    }

    /// Whether a unit already received an order this tick.
    #[must_use]
    pub fn is_claimed(&self, unit: UnitId) -> bool {
        self.claimed.contains(&unit)
    }

    /// Units that already received an order this tick.
    #[must_use]
    pub fn claimed(&self) -> &BTreeSet<UnitId> {
        &self.claimed
    }

    /// Mark a unit as ordered for the rest of the tick.
    pub fn claim(&mut self, unit: UnitId) {
        self.claimed.insert(unit);
    }

    /// Reserve the cost of a commitment.
    ///
    /// Fails without touching the budget if the commitment is unaffordable.
    pub fn reserve(&mut self, commitment: BuildCommitment) -> Result<()> {
        let cost = self.cost(commitment.kind);
        if !self.can_afford(commitment.kind) {
            return Err(AgentError::Unaffordable {
                kind: commitment.kind,
                minerals: cost.minerals,
                gas: cost.gas,
                supply: cost.supply,
                available_minerals: self.available.minerals,
                available_gas: self.available.gas,
                available_supply: self.available.supply_left,
            });
        }
        self.available.minerals -= cost.minerals;
        self.available.gas -= cost.gas;
        self.available.supply_left -= cost.supply;
        self.committed.push(commitment);
        Ok(())
    }

    fn all_commitments(&self) -> impl Iterator<Item = &BuildCommitment> + '_ {
        self.engine_pending.iter().chain(self.committed.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(minerals: i32, gas: i32, supply_left: i32) -> WorldSnapshot {
        WorldSnapshot {
            resources: Resources::new(minerals, gas, supply_left),
            ..Default::default()
        }
    }

    fn depot_at(x: i32, y: i32) -> BuildCommitment {
        BuildCommitment::new(
            UnitKind::SupplyDepot,
            CommitmentSite::Position(Vec2Fixed::from_units(x, y)),
        )
    }

    #[test]
    fn test_reserve_deducts_immediately() {
        let mut ledger = Ledger::open(&snapshot(300, 100, 10), &CostTable::default());

        ledger
            .reserve(BuildCommitment::new(UnitKind::Marine, CommitmentSite::Producer(7)))
            .expect("marine should be affordable");

        assert_eq!(ledger.available(), Resources::new(250, 100, 9));
        assert_eq!(ledger.spent(), Cost::new(50, 0, 1));
        assert!(ledger.producer_committed(7, UnitKind::Marine));
        assert!(!ledger.producer_committed(7, UnitKind::Hellion));
        assert_eq!(ledger.already_pending(UnitKind::Marine), 1);
    }

    #[test]
    fn test_unaffordable_leaves_budget_untouched() {
        let mut ledger = Ledger::open(&snapshot(120, 0, 10), &CostTable::default());

        let result = ledger.reserve(BuildCommitment::new(
            UnitKind::Factory,
            CommitmentSite::Position(Vec2Fixed::ZERO),
        ));

        assert!(matches!(result, Err(AgentError::Unaffordable { kind: UnitKind::Factory, .. })));
        assert_eq!(ledger.available(), Resources::new(120, 0, 10));
        assert!(ledger.committed().is_empty());
    }

    #[test]
    fn test_supply_only_gates_units() {
        let ledger = Ledger::open(&snapshot(500, 0, 0), &CostTable::default());
        assert!(!ledger.can_afford(UnitKind::Scv));
        assert!(ledger.can_afford(UnitKind::SupplyDepot));
    }

    #[test]
    fn test_pending_includes_engine_reports() {
        let mut snap = snapshot(500, 0, 10);
        snap.pending.push(depot_at(0, 0));
        let mut ledger = Ledger::open(&snap, &CostTable::default());
        assert_eq!(ledger.already_pending(UnitKind::SupplyDepot), 1);

        ledger.reserve(depot_at(10, 0)).expect("depot should be affordable");
        assert_eq!(ledger.already_pending(UnitKind::SupplyDepot), 2);
        // Engine-reported commitments are not part of this tick's spend.
        assert_eq!(ledger.committed().len(), 1);
    }

    #[test]
    fn test_site_reserved_near() {
        let mut ledger = Ledger::open(&snapshot(500, 0, 10), &CostTable::default());
        ledger.reserve(depot_at(10, 10)).expect("depot should be affordable");

        let three = Fixed::from_num(3);
        assert!(ledger.site_reserved_near(Vec2Fixed::from_units(11, 10), three));
        assert!(!ledger.site_reserved_near(Vec2Fixed::from_units(13, 10), three));
    }

    #[test]
    fn test_node_commitment() {
        let mut ledger = Ledger::open(&snapshot(500, 0, 10), &CostTable::default());
        ledger
            .reserve(BuildCommitment::new(UnitKind::Refinery, CommitmentSite::Node(42)))
            .expect("refinery should be affordable");
        assert!(ledger.node_committed(42));
        assert!(!ledger.node_committed(43));
    }

    #[test]
    fn test_claims() {
        let mut ledger = Ledger::open(&snapshot(0, 0, 0), &CostTable::default());
        assert!(!ledger.is_claimed(5));
        ledger.claim(5);
        assert!(ledger.is_claimed(5));
        assert_eq!(ledger.claimed().len(), 1);
    }
}
