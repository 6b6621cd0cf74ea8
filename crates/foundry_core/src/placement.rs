//! Structure placement validation.
//!
//! The geometric search belongs to the engine; this module only decides
//! whether the spot the engine offers respects the agent's spacing rule.
//! A rejected spot is not retried within the tick. The caller treats `None`
//! as "try again next tick".

use crate::engine::WorldQuery;
use crate::kind::UnitKind;
use crate::ledger::Ledger;
use crate::math::{Fixed, Vec2Fixed};
use crate::snapshot::{UnitId, WorldSnapshot};

/// A request for a build location.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlacementQuery {
    /// Structure to place.
    pub kind: UnitKind,
    /// Anchor the search starts from.
    pub near: Vec2Fixed,
    /// Minimum distance to every owned structure.
    pub spacing: Fixed,
    /// Farthest the engine may search from the anchor.
    pub max_distance: Fixed,
}

/// Result of a spacing check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlacementResult {
    /// Placement is valid.
    Valid,
    /// An existing owned structure is closer than the spacing.
    TooCloseToStructure(UnitId),
    /// A site reserved earlier (this tick or pending) is closer than the spacing.
    TooCloseToReservedSite,
}

impl PlacementResult {
    /// Check if placement is valid.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        matches!(self, PlacementResult::Valid)
    }
}

/// Check a candidate position against existing structures and reserved sites.
#[must_use]
pub fn check_spacing(
    snapshot: &WorldSnapshot,
    ledger: &Ledger,
    position: Vec2Fixed,
    spacing: Fixed,
) -> PlacementResult {
    if let Some(structure) = snapshot
        .structures()
        .find(|s| s.position.is_closer_than(position, spacing))
    {
        return PlacementResult::TooCloseToStructure(structure.id);
    }
    if ledger.site_reserved_near(position, spacing) {
        return PlacementResult::TooCloseToReservedSite;
    }
    PlacementResult::Valid
}

/// Ask the engine for a spot and keep it only if it passes [`check_spacing`].
#[must_use]
pub fn find_placement(
    query: &PlacementQuery,
    snapshot: &WorldSnapshot,
    ledger: &Ledger,
    world: &dyn WorldQuery,
) -> Option<Vec2Fixed> {
    let candidate = world.find_placement(query.kind, query.near, query.max_distance)?;
    match check_spacing(snapshot, ledger, candidate, query.spacing) {
        PlacementResult::Valid => Some(candidate),
        rejected => {
            tracing::debug!(
                kind = %query.kind,
                x = %candidate.x,
                y = %candidate.y,
                reason = ?rejected,
                "Placement candidate rejected"
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;
    use crate::config::CostTable;
    use crate::snapshot::{BuildCommitment, CommitmentSite, Owner, Resources, Unit, UnitStatus};

    struct FixedSpot(Option<Vec2Fixed>);

    impl WorldQuery for FixedSpot {
        fn snapshot(&self) -> WorldSnapshot {
            WorldSnapshot::default()
        }

        fn find_placement(&self, _: UnitKind, _: Vec2Fixed, _: Fixed) -> Option<Vec2Fixed> {
            self.0
        }

        fn select_builder(&self, _: Vec2Fixed, _: &BTreeSet<UnitId>) -> Option<UnitId> {
            None
        }
    }

    fn world_with_depot_at(x: i32, y: i32) -> WorldSnapshot {
        WorldSnapshot {
            units: vec![Unit {
                id: 9,
                kind: UnitKind::SupplyDepot,
                position: Vec2Fixed::from_units(x, y),
                owner: Owner::Own,
                status: UnitStatus::Idle,
                capabilities: UnitKind::SupplyDepot.default_capabilities(),
            }],
            resources: Resources::new(1000, 0, 10),
            ..Default::default()
        }
    }

    fn query() -> PlacementQuery {
        PlacementQuery {
            kind: UnitKind::Barracks,
            near: Vec2Fixed::ZERO,
            spacing: Fixed::from_num(3),
            max_distance: Fixed::from_num(10),
        }
    }

    #[test]
    fn test_candidate_far_from_structures_is_kept() {
        let snap = world_with_depot_at(0, 0);
        let ledger = Ledger::open(&snap, &CostTable::default());
        let spot = Vec2Fixed::from_units(5, 0);

        let found = find_placement(&query(), &snap, &ledger, &FixedSpot(Some(spot)));
        assert_eq!(found, Some(spot));
    }

    #[test]
    fn test_candidate_inside_spacing_is_rejected() {
        let snap = world_with_depot_at(0, 0);
        let ledger = Ledger::open(&snap, &CostTable::default());
        let spot = Vec2Fixed::from_units(2, 0);

        assert_eq!(
            check_spacing(&snap, &ledger, spot, Fixed::from_num(3)),
            PlacementResult::TooCloseToStructure(9)
        );
        assert!(find_placement(&query(), &snap, &ledger, &FixedSpot(Some(spot))).is_none());
    }

    #[test]
    fn test_exactly_spacing_away_is_valid() {
        let snap = world_with_depot_at(0, 0);
        let ledger = Ledger::open(&snap, &CostTable::default());
        assert!(check_spacing(&snap, &ledger, Vec2Fixed::from_units(3, 0), Fixed::from_num(3)).is_valid());
    }

    #[test]
    fn test_reserved_site_blocks_placement() {
        let snap = world_with_depot_at(100, 100);
        let mut ledger = Ledger::open(&snap, &CostTable::default());
        ledger
            .reserve(BuildCommitment::new(
                UnitKind::SupplyDepot,
                CommitmentSite::Position(Vec2Fixed::from_units(5, 0)),
            ))
            .expect("depot should be affordable");

        assert_eq!(
            check_spacing(&snap, &ledger, Vec2Fixed::from_units(6, 0), Fixed::from_num(3)),
            PlacementResult::TooCloseToReservedSite
        );
    }

    #[test]
    fn test_engine_without_spot() {
        let snap = world_with_depot_at(0, 0);
        let ledger = Ledger::open(&snap, &CostTable::default());
        assert!(find_placement(&query(), &snap, &ledger, &FixedSpot(None)).is_none());
    }

    #[test]
    fn test_repeated_queries_agree() {
        let snap = world_with_depot_at(0, 0);
        let ledger = Ledger::open(&snap, &CostTable::default());
        let world = FixedSpot(Some(Vec2Fixed::from_units(7, 1)));
        let first = find_placement(&query(), &snap, &ledger, &world);
        let second = find_placement(&query(), &snap, &ledger, &world);
        assert_eq!(first, second);
    }
}
