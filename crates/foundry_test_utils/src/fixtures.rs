//! Test fixtures and helpers.
//!
//! Pre-built snapshots and unit configurations for consistent testing.
//! [`SnapshotBuilder`] hands out ids in insertion order, starting at 1, and
//! shares one id space across units, enemies and resource nodes.

use fixed::types::I32F32;
use foundry_core::kind::UnitKind;
use foundry_core::math::Vec2Fixed;
use foundry_core::snapshot::{
    BuildCommitment, CommitmentSite, Owner, ResourceNode, Resources, Unit, UnitId, UnitStatus,
    WorldSnapshot,
};

/// Create a fixed-point number from an integer.
#[must_use]
pub fn fixed(n: i32) -> I32F32 {
    I32F32::from_num(n)
}

/// Create a position from whole units.
#[must_use]
pub fn pos(x: i32, y: i32) -> Vec2Fixed {
    Vec2Fixed::from_units(x, y)
}

/// Create an owned unit with default capabilities for its kind.
#[must_use]
pub fn own_unit(id: UnitId, kind: UnitKind, at: Vec2Fixed, status: UnitStatus) -> Unit {
    Unit {
        id,
        kind,
        position: at,
        owner: Owner::Own,
        status,
        capabilities: kind.default_capabilities(),
    }
}

/// Parse a snapshot written in RON.
///
/// # Panics
///
/// Panics if the RON does not describe a valid snapshot.
#[must_use]
pub fn snapshot_from_ron(ron: &str) -> WorldSnapshot {
    ron::from_str(ron).unwrap_or_else(|err| panic!("invalid snapshot fixture: {err}"))
}

/// Fluent builder for [`WorldSnapshot`] fixtures.
#[derive(Debug, Clone)]
pub struct SnapshotBuilder {
    snapshot: WorldSnapshot,
    next_id: UnitId,
}

impl Default for SnapshotBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SnapshotBuilder {
    /// Empty world at the origin with no resources.
    #[must_use]
    pub fn new() -> Self {
        Self {
            snapshot: WorldSnapshot::default(),
            next_id: 1,
        }
    }

    fn take_id(&mut self) -> UnitId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Id the next added entity will receive.
    #[must_use]
    pub fn peek_id(&self) -> UnitId {
        self.next_id
    }

    /// Set resource totals.
    #[must_use]
    pub fn resources(mut self, minerals: i32, gas: i32, supply_left: i32) -> Self {
        self.snapshot.resources = Resources::new(minerals, gas, supply_left);
        self
    }

    /// Set the start location.
    #[must_use]
    pub fn start(mut self, at: Vec2Fixed) -> Self {
        self.snapshot.start_location = at;
        self
    }

    /// Add an owned unit.
    #[must_use]
    pub fn unit(mut self, kind: UnitKind, at: Vec2Fixed, status: UnitStatus) -> Self {
        let id = self.take_id();
        self.snapshot.units.push(own_unit(id, kind, at, status));
        self
    }

    /// Add an idle, completed base.
    #[must_use]
    pub fn base(self, at: Vec2Fixed) -> Self {
        self.unit(UnitKind::CommandCenter, at, UnitStatus::Idle)
    }

    /// Add a base that is busy training.
    #[must_use]
    pub fn busy_base(self, at: Vec2Fixed) -> Self {
        self.unit(UnitKind::CommandCenter, at, UnitStatus::Busy)
    }

    /// Add a gathering worker.
    #[must_use]
    pub fn worker(self, at: Vec2Fixed) -> Self {
        self.unit(UnitKind::Scv, at, UnitStatus::Busy)
    }

    /// Add `n` gathering workers stacked at a position.
    #[must_use]
    pub fn workers(self, n: usize, at: Vec2Fixed) -> Self {
        (0..n).fold(self, |builder, _| builder.worker(at))
    }

    /// Add an idle unit of any kind.
    #[must_use]
    pub fn idle(self, kind: UnitKind, at: Vec2Fixed) -> Self {
        self.unit(kind, at, UnitStatus::Idle)
    }

    /// Add a visible enemy unit.
    #[must_use]
    pub fn enemy(mut self, at: Vec2Fixed) -> Self {
        let id = self.take_id();
        self.snapshot.enemies.push(Unit {
            id,
            kind: UnitKind::Other(0),
            position: at,
            owner: Owner::Enemy,
            status: UnitStatus::Busy,
            capabilities: UnitKind::Marine.default_capabilities(),
        });
        self
    }

    /// Add a mineral patch.
    #[must_use]
    pub fn mineral(mut self, at: Vec2Fixed, remaining: i32) -> Self {
        let id = self.take_id();
        self.snapshot.minerals.push(ResourceNode {
            id,
            position: at,
            remaining,
        });
        self
    }

    /// Add a gas node.
    #[must_use]
    pub fn geyser(mut self, at: Vec2Fixed) -> Self {
        let id = self.take_id();
        self.snapshot.geysers.push(ResourceNode {
            id,
            position: at,
            remaining: 2250,
        });
        self
    }

    /// Add a known expansion site.
    #[must_use]
    pub fn expansion_site(mut self, at: Vec2Fixed) -> Self {
        self.snapshot.expansion_sites.push(at);
        self
    }

    /// Report a structure as pending at a position.
    #[must_use]
    pub fn pending_at(mut self, kind: UnitKind, at: Vec2Fixed) -> Self {
        self.snapshot
            .pending
            .push(BuildCommitment::new(kind, CommitmentSite::Position(at)));
        self
    }

    /// Report a unit as pending at a producer.
    #[must_use]
    pub fn pending_training(mut self, kind: UnitKind, producer: UnitId) -> Self {
        self.snapshot
            .pending
            .push(BuildCommitment::new(kind, CommitmentSite::Producer(producer)));
        self
    }

    /// Finish the snapshot.
    #[must_use]
    pub fn build(self) -> WorldSnapshot {
        self.snapshot
    }
}

/// A small opening: one idle base at the origin, six gathering workers,
/// eight mineral patches and two gas nodes.
#[must_use]
pub fn opening_snapshot(minerals: i32, gas: i32, supply_left: i32) -> WorldSnapshot {
    let mut builder = SnapshotBuilder::new()
        .resources(minerals, gas, supply_left)
        .base(pos(0, 0))
        .workers(6, pos(-4, 0));
    for i in 0..8 {
        builder = builder.mineral(pos(-8, i - 4), 1500);
    }
    builder
        .geyser(pos(6, -7))
        .geyser(pos(6, 7))
        .expansion_site(pos(0, 0))
        .expansion_site(pos(60, 0))
        .expansion_site(pos(0, 60))
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_assigns_sequential_ids() {
        let snapshot = SnapshotBuilder::new()
            .base(pos(0, 0))
            .worker(pos(1, 0))
            .mineral(pos(-5, 0), 100)
            .enemy(pos(30, 0))
            .build();

        assert_eq!(snapshot.units[0].id, 1);
        assert_eq!(snapshot.units[1].id, 2);
        assert_eq!(snapshot.minerals[0].id, 3);
        assert_eq!(snapshot.enemies[0].id, 4);
    }

    #[test]
    fn test_opening_snapshot_shape() {
        let snapshot = opening_snapshot(50, 0, 10);
        assert_eq!(snapshot.base_count(), 1);
        assert_eq!(snapshot.count(UnitKind::Scv), 6);
        assert_eq!(snapshot.minerals.len(), 8);
        assert_eq!(snapshot.geysers.len(), 2);
    }

    #[test]
    fn test_snapshot_from_ron() {
        let snapshot = snapshot_from_ron("(resources: (minerals: 75, gas: 0, supply_left: 3))");
        assert_eq!(snapshot.resources, Resources::new(75, 0, 3));
        assert!(snapshot.units.is_empty());
    }
}
