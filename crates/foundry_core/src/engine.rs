//! The narrow interface between the agent and the game engine.
//!
//! The agent never owns world state. It reads a [`WorldSnapshot`] once per
//! tick, asks the engine a few read-only geometric questions through
//! [`WorldQuery`], and pushes orders out through [`Engine::issue`].
//!
//! # Command Flow
//!
//! All unit control flows through `issue()`. Orders are fire-and-forget: the
//! agent logs a rejection but keeps its own bookkeeping, and the engine stays
//! the source of truth for what is actually pending on the next tick.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::kind::UnitKind;
use crate::math::{Fixed, Vec2Fixed};
use crate::snapshot::{UnitId, WorldSnapshot};

/// An order for a single unit or producer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Command {
    /// Train a unit at this producer.
    Train(UnitKind),
    /// Construct a structure at a position with this worker.
    Build {
        /// Structure kind.
        kind: UnitKind,
        /// Placement position.
        at: Vec2Fixed,
    },
    /// Construct a structure on top of a resource node with this worker.
    BuildOn {
        /// Structure kind.
        kind: UnitKind,
        /// Resource node to build on.
        node: UnitId,
    },
    /// Harvest from a resource node.
    Gather(UnitId),
    /// Attack-move to a position.
    Attack(Vec2Fixed),
}

/// Read-only questions the agent asks the engine during a tick.
pub trait WorldQuery {
    /// Current state of the world.
    fn snapshot(&self) -> WorldSnapshot;

    /// Find a spot for `kind` near `near`, searching no farther than
    /// `max_distance`.
    ///
    /// Must be deterministic for a given world state. Spacing against other
    /// structures is enforced by the caller, not here.
    fn find_placement(&self, kind: UnitKind, near: Vec2Fixed, max_distance: Fixed)
        -> Option<Vec2Fixed>;

    /// Pick a free worker near `near`, skipping the units in `exclude`.
    ///
    /// `exclude` holds the units that already got an order this tick; the
    /// engine has not seen those orders take effect yet.
    fn select_builder(&self, near: Vec2Fixed, exclude: &BTreeSet<UnitId>) -> Option<UnitId>;
}

/// Full engine access: queries plus order submission.
pub trait Engine: WorldQuery {
    /// Issue a command to a single unit.
    ///
    /// # Errors
    /// Returns [`AgentError::EngineRejection`](crate::error::AgentError::EngineRejection)
    /// if the engine refuses the order (dead unit, invalid target...).
    fn issue(&mut self, unit: UnitId, command: Command) -> Result<()>;
}
