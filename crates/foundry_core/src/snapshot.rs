//! Point-in-time view of the world handed to the agent each tick.
//!
//! A [`WorldSnapshot`] is read once at the start of a tick and never changes
//! during it. The query helpers below are the "idle / ready / closer-than /
//! nearest-to" filters every policy is built from; they are plain iterator
//! adapters and preserve the engine's listing order, which is what makes
//! "first base" and "first matching expansion site" well defined.

use serde::{Deserialize, Serialize};

use crate::kind::{Capabilities, UnitKind};
use crate::math::{Fixed, Vec2Fixed};

/// Engine identifier for a unit, structure or resource node.
pub type UnitId = u64;

/// Who controls a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Owner {
    /// Controlled by this agent.
    Own,
    /// Controlled by an opponent.
    Enemy,
}

/// Activity state of a unit as reported by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnitStatus {
    /// Completed and has no orders.
    Idle,
    /// Completed and executing an order (gathering, training, moving...).
    Busy,
    /// Still being built or trained. Not ready.
    InProduction,
}

/// A unit or structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Unit {
    /// Engine identifier.
    pub id: UnitId,
    /// Kind tag.
    pub kind: UnitKind,
    /// Current position.
    pub position: Vec2Fixed,
    /// Owner.
    pub owner: Owner,
    /// Activity state.
    pub status: UnitStatus,
    /// Capability flags.
    pub capabilities: Capabilities,
}

impl Unit {
    /// Completed (not under construction or in training).
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.status != UnitStatus::InProduction
    }

    /// Completed and without orders.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.status == UnitStatus::Idle
    }

    /// Whether the unit is a structure.
    #[must_use]
    pub fn is_structure(&self) -> bool {
        self.capabilities.contains(Capabilities::IS_STRUCTURE)
    }

    /// Whether the unit can harvest.
    #[must_use]
    pub fn can_gather(&self) -> bool {
        self.capabilities.contains(Capabilities::CAN_GATHER)
    }

    /// Whether the unit can attack ground targets.
    #[must_use]
    pub fn can_attack_ground(&self) -> bool {
        self.capabilities.contains(Capabilities::CAN_ATTACK_GROUND)
    }
}

/// A mineral patch or gas node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceNode {
    /// Engine identifier.
    pub id: UnitId,
    /// Position in world space.
    pub position: Vec2Fixed,
    /// Amount left in the node.
    pub remaining: i32,
}

/// Spendable totals at the start of the tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Resources {
    /// Mineral stockpile.
    pub minerals: i32,
    /// Gas stockpile.
    pub gas: i32,
    /// Supply headroom (cap minus used).
    pub supply_left: i32,
}

impl Resources {
    /// Create a resource total.
    #[must_use]
    pub const fn new(minerals: i32, gas: i32, supply_left: i32) -> Self {
        Self {
            minerals,
            gas,
            supply_left,
        }
    }
}

/// Where a commitment is anchored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CommitmentSite {
    /// A structure to be placed at a position.
    Position(Vec2Fixed),
    /// A structure built on a resource node (extractors).
    Node(UnitId),
    /// A unit trained by a producer.
    Producer(UnitId),
}

/// An in-flight request that has reserved resources but is not complete.
///
/// The engine reports the commitments it is still working on; the agent adds
/// its own for the current tick through the [`Ledger`](crate::ledger::Ledger).
/// A commitment stops being reported once the item shows up as a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BuildCommitment {
    /// Kind being built or trained.
    pub kind: UnitKind,
    /// Anchor of the request.
    pub site: CommitmentSite,
}

impl BuildCommitment {
    /// Create a commitment.
    #[must_use]
    pub const fn new(kind: UnitKind, site: CommitmentSite) -> Self {
        Self { kind, site }
    }
}

/// Everything the agent knows at the start of a tick.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldSnapshot {
    /// Owned units and structures, in engine order.
    pub units: Vec<Unit>,
    /// Visible enemy units and structures.
    pub enemies: Vec<Unit>,
    /// Mineral patches.
    pub minerals: Vec<ResourceNode>,
    /// Gas nodes.
    pub geysers: Vec<ResourceNode>,
    /// Resource totals.
    pub resources: Resources,
    /// Where the agent started the game.
    pub start_location: Vec2Fixed,
    /// Known expansion sites, in engine order.
    pub expansion_sites: Vec<Vec2Fixed>,
    /// Commitments the engine reports as still pending.
    pub pending: Vec<BuildCommitment>,
}

impl WorldSnapshot {
    /// Owned structures.
    pub fn structures(&self) -> impl Iterator<Item = &Unit> + '_ {
        self.units.iter().filter(|u| u.is_structure())
    }

    /// Owned units of a kind, any status.
    pub fn of_kind(&self, kind: UnitKind) -> impl Iterator<Item = &Unit> + '_ {
        self.units.iter().filter(move |u| u.kind == kind)
    }

    /// Completed owned units of a kind.
    pub fn ready_of_kind(&self, kind: UnitKind) -> impl Iterator<Item = &Unit> + '_ {
        self.of_kind(kind).filter(|u| u.is_ready())
    }

    /// Completed, order-less owned units of a kind.
    pub fn idle_of_kind(&self, kind: UnitKind) -> impl Iterator<Item = &Unit> + '_ {
        self.of_kind(kind).filter(|u| u.is_idle())
    }

    /// Number of owned units of a kind, including unfinished ones.
    #[must_use]
    pub fn count(&self, kind: UnitKind) -> usize {
        self.of_kind(kind).count()
    }

    /// Whether at least one completed unit of a kind exists.
    #[must_use]
    pub fn has_ready(&self, kind: UnitKind) -> bool {
        self.ready_of_kind(kind).next().is_some()
    }

    /// Owned bases, any status, in engine order.
    pub fn bases(&self) -> impl Iterator<Item = &Unit> + '_ {
        self.units.iter().filter(|u| u.kind.is_base())
    }

    /// Completed owned bases.
    pub fn ready_bases(&self) -> impl Iterator<Item = &Unit> + '_ {
        self.bases().filter(|u| u.is_ready())
    }

    /// The n-th owned base (0-based), if that many exist.
    #[must_use]
    pub fn nth_base(&self, n: usize) -> Option<&Unit> {
        self.bases().nth(n)
    }

    /// Number of owned bases.
    #[must_use]
    pub fn base_count(&self) -> usize {
        self.bases().count()
    }

    /// Gas nodes strictly within `radius` of `center`.
    pub fn geysers_near(
        &self,
        center: Vec2Fixed,
        radius: Fixed,
    ) -> impl Iterator<Item = &ResourceNode> + '_ {
        self.geysers
            .iter()
            .filter(move |g| g.position.is_closer_than(center, radius))
    }

    /// Enemy units strictly within `radius` of `center`.
    pub fn enemies_near(&self, center: Vec2Fixed, radius: Fixed) -> impl Iterator<Item = &Unit> + '_ {
        self.enemies
            .iter()
            .filter(move |e| e.position.is_closer_than(center, radius))
    }

    /// Engine-reported pending commitments of a kind.
    #[must_use]
    pub fn pending_count(&self, kind: UnitKind) -> usize {
        self.pending.iter().filter(|c| c.kind == kind).count()
    }
}
