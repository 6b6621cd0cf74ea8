//! A scripted engine for driving the agent in tests.
//!
//! [`ScriptedEngine`] serves a snapshot the test controls and records every
//! command the agent issues. By default it answers placement queries with a
//! deterministic ring search and builder queries with the nearest free
//! gatherer; both can be overridden. [`ScriptedEngine::resolve`] turns the
//! recorded orders into units instantly, which is enough to run the agent
//! over many ticks without the full sandbox.

use std::collections::{BTreeMap, BTreeSet};

use foundry_core::config::CostTable;
use foundry_core::engine::{Command, Engine, WorldQuery};
use foundry_core::error::{AgentError, Result};
use foundry_core::kind::UnitKind;
use foundry_core::math::{nearest_to, Fixed, Vec2Fixed};
use foundry_core::snapshot::{CommitmentSite, Resources, UnitId, UnitStatus, WorldSnapshot};

use crate::fixtures::own_unit;

/// Clearance the ring search keeps from existing structures.
const SEARCH_CLEARANCE: i32 = 3;

/// How the engine answers placement queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlacementScript {
    /// Ring search around the anchor.
    Search,
    /// Always answer with this position.
    Always(Vec2Fixed),
    /// Per-kind answers; unlisted kinds get no placement.
    PerKind(BTreeMap<UnitKind, Vec2Fixed>),
    /// Never find a spot.
    Blocked,
}

/// Engine double with a test-controlled snapshot.
#[derive(Debug, Clone)]
pub struct ScriptedEngine {
    snapshot: WorldSnapshot,
    placement: PlacementScript,
    builders_available: bool,
    rejected: BTreeSet<UnitId>,
    issued: Vec<(UnitId, Command)>,
    unresolved: usize,
    costs: CostTable,
    income: Resources,
    next_id: UnitId,
}

impl ScriptedEngine {
    /// Create an engine serving `snapshot`.
    #[must_use]
    pub fn new(snapshot: WorldSnapshot) -> Self {
        let next_id = snapshot
            .units
            .iter()
            .chain(&snapshot.enemies)
            .map(|u| u.id)
            .chain(snapshot.minerals.iter().map(|m| m.id))
            .chain(snapshot.geysers.iter().map(|g| g.id))
            .max()
            .unwrap_or(0)
            + 1;
        Self {
            snapshot,
            placement: PlacementScript::Search,
            builders_available: true,
            rejected: BTreeSet::new(),
            issued: Vec::new(),
            unresolved: 0,
            costs: CostTable::default(),
            income: Resources::default(),
            next_id,
        }
    }

    /// Change how placement queries are answered.
    #[must_use]
    pub fn with_placement(mut self, placement: PlacementScript) -> Self {
        self.placement = placement;
        self
    }

    /// Report no free worker for any build.
    #[must_use]
    pub fn without_builders(mut self) -> Self {
        self.builders_available = false;
        self
    }

    /// Refuse every command addressed to `unit`.
    #[must_use]
    pub fn rejecting(mut self, unit: UnitId) -> Self {
        self.rejected.insert(unit);
        self
    }

    /// Costs charged by [`resolve`](Self::resolve).
    #[must_use]
    pub fn with_costs(mut self, costs: CostTable) -> Self {
        self.costs = costs;
        self
    }

    /// Resources added on every [`resolve`](Self::resolve).
    #[must_use]
    pub fn with_income(mut self, minerals: i32, gas: i32) -> Self {
        self.income = Resources::new(minerals, gas, 0);
        self
    }

    /// The snapshot currently served.
    #[must_use]
    pub fn current(&self) -> &WorldSnapshot {
        &self.snapshot
    }

    /// Mutable access to the served snapshot.
    pub fn current_mut(&mut self) -> &mut WorldSnapshot {
        &mut self.snapshot
    }

    /// Every accepted command, in issue order.
    #[must_use]
    pub fn issued(&self) -> &[(UnitId, Command)] {
        &self.issued
    }

    /// Accepted commands of the given shape.
    pub fn issued_matching<F>(&self, predicate: F) -> impl Iterator<Item = &(UnitId, Command)>
    where
        F: Fn(&Command) -> bool,
    {
        self.issued.iter().filter(move |(_, c)| predicate(c))
    }

    /// Apply every command accepted since the last call.
    ///
    /// Trained units and structures appear immediately and completed. Costs
    /// are charged, supply structures raise the headroom, income is added and
    /// any engine-side pending list is cleared.
    pub fn resolve(&mut self) {
        let fresh: Vec<(UnitId, Command)> = self.issued[self.unresolved..].to_vec();
        self.unresolved = self.issued.len();

        for (actor, command) in fresh {
            match command {
                Command::Train(kind) => {
                    let at = self.position_of(actor).unwrap_or(self.snapshot.start_location);
                    self.spawn(kind, at);
                }
                Command::Build { kind, at } => self.spawn(kind, at),
                Command::BuildOn { kind, node } => {
                    let at = self
                        .snapshot
                        .geysers
                        .iter()
                        .find(|g| g.id == node)
                        .map_or(self.snapshot.start_location, |g| g.position);
                    self.spawn(kind, at);
                }
                Command::Gather(_) | Command::Attack(_) => {
                    if let Some(unit) = self.snapshot.units.iter_mut().find(|u| u.id == actor) {
                        unit.status = UnitStatus::Busy;
                    }
                }
            }
        }

        self.snapshot.pending.clear();
        self.snapshot.resources.minerals += self.income.minerals;
        self.snapshot.resources.gas += self.income.gas;
    }

    fn position_of(&self, unit: UnitId) -> Option<Vec2Fixed> {
        self.snapshot
            .units
            .iter()
            .find(|u| u.id == unit)
            .map(|u| u.position)
    }

    fn spawn(&mut self, kind: UnitKind, at: Vec2Fixed) {
        let cost = self.costs.get(kind);
        let resources = &mut self.snapshot.resources;
        resources.minerals -= cost.minerals;
        resources.gas -= cost.gas;
        resources.supply_left -= cost.supply;
        resources.supply_left += match kind {
            UnitKind::SupplyDepot => 8,
            UnitKind::CommandCenter => 15,
            _ => 0,
        };

        let status = if kind == UnitKind::Scv {
            UnitStatus::Busy
        } else {
            UnitStatus::Idle
        };
        let id = self.next_id;
        self.next_id += 1;
        self.snapshot.units.push(own_unit(id, kind, at, status));
    }

    fn blocked(&self, candidate: Vec2Fixed) -> bool {
        let clearance = Fixed::from_num(SEARCH_CLEARANCE);
        self.snapshot
            .structures()
            .any(|s| s.position.is_closer_than(candidate, clearance))
            || self.snapshot.pending.iter().any(|p| match p.site {
                CommitmentSite::Position(site) => site.is_closer_than(candidate, clearance),
                _ => false,
            })
    }

    /// Walk square rings outward from `near`, one unit at a time.
    fn ring_search(&self, near: Vec2Fixed, max_distance: Fixed) -> Option<Vec2Fixed> {
        let max_ring: i32 = max_distance.to_num();
        let max_sq = max_distance.saturating_mul(max_distance);
        for ring in SEARCH_CLEARANCE..=max_ring {
            for dx in -ring..=ring {
                for dy in -ring..=ring {
                    if dx.abs() != ring && dy.abs() != ring {
                        continue;
                    }
                    let candidate = near + Vec2Fixed::from_units(dx, dy);
                    if near.distance_squared(candidate) > max_sq {
                        continue;
                    }
                    if !self.blocked(candidate) {
                        return Some(candidate);
                    }
                }
            }
        }
        None
    }
}

impl WorldQuery for ScriptedEngine {
    fn snapshot(&self) -> WorldSnapshot {
        self.snapshot.clone()
    }

    fn find_placement(
        &self,
        kind: UnitKind,
        near: Vec2Fixed,
        max_distance: Fixed,
    ) -> Option<Vec2Fixed> {
        match &self.placement {
            PlacementScript::Search => self.ring_search(near, max_distance),
            PlacementScript::Always(at) => Some(*at),
            PlacementScript::PerKind(spots) => spots.get(&kind).copied(),
            PlacementScript::Blocked => None,
        }
    }

    fn select_builder(&self, near: Vec2Fixed, exclude: &BTreeSet<UnitId>) -> Option<UnitId> {
        if !self.builders_available {
            return None;
        }
        let free = self
            .snapshot
            .units
            .iter()
            .filter(|u| u.can_gather() && u.is_ready() && !exclude.contains(&u.id));
        nearest_to(near, free, |u| u.position).map(|u| u.id)
    }
}

impl Engine for ScriptedEngine {
    fn issue(&mut self, unit: UnitId, command: Command) -> Result<()> {
        if self.rejected.contains(&unit) {
            tracing::debug!(unit, "Scripted rejection");
            return Err(AgentError::EngineRejection {
                unit,
                reason: "scripted rejection".to_string(),
            });
        }
        self.issued.push((unit, command));
        Ok(())
    }
}
