//! Production and tech structure rules.
//!
//! All five structure rules share one shape: a prerequisite, a cap, a single
//! global pending check, and a placement anchored on the n-th owned base.
//! Anchors are indexed lookups; a missing base turns the rule into a no-op.

use crate::config::AgentConfig;
use crate::kind::UnitKind;
use crate::ledger::Ledger;

use super::{build_near, skip, Action, Policy, PolicyContext};

/// What must exist (completed) before a structure is considered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prerequisite {
    /// At least one completed base.
    ReadyBase,
    /// At least one completed structure of a kind.
    Ready(UnitKind),
}

impl Prerequisite {
    fn is_met(self, cx: &PolicyContext<'_>) -> bool {
        match self {
            Self::ReadyBase => cx.snapshot.ready_bases().next().is_some(),
            Self::Ready(kind) => cx.snapshot.has_ready(kind),
        }
    }
}

/// Builds one structure of `kind` at a time until its cap is reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StructurePolicy {
    name: &'static str,
    kind: UnitKind,
    prerequisite: Prerequisite,
    /// Index of the base the placement search starts from.
    anchor_base: usize,
    /// Bases that must exist (any status) before building.
    min_bases: usize,
}

impl StructurePolicy {
    /// Create a structure rule.
    #[must_use]
    pub const fn new(
        name: &'static str,
        kind: UnitKind,
        prerequisite: Prerequisite,
        anchor_base: usize,
        min_bases: usize,
    ) -> Self {
        Self {
            name,
            kind,
            prerequisite,
            anchor_base,
            min_bases,
        }
    }

    /// Primary combat-unit producer, next to the main base.
    #[must_use]
    pub const fn barracks() -> Self {
        Self::new("barracks", UnitKind::Barracks, Prerequisite::ReadyBase, 0, 1)
    }

    /// Air producer, next to the main base once a barracks is up.
    #[must_use]
    pub const fn starport() -> Self {
        Self::new(
            "starport",
            UnitKind::Starport,
            Prerequisite::Ready(UnitKind::Barracks),
            0,
            1,
        )
    }

    /// Ground-vehicle producer at the second base.
    #[must_use]
    pub const fn factory() -> Self {
        Self::new(
            "factory",
            UnitKind::Factory,
            Prerequisite::Ready(UnitKind::Barracks),
            1,
            2,
        )
    }

    /// Vehicle upgrades at the second base once a factory is up.
    #[must_use]
    pub const fn armory() -> Self {
        Self::new(
            "armory",
            UnitKind::Armory,
            Prerequisite::Ready(UnitKind::Factory),
            1,
            2,
        )
    }

    /// Infantry upgrades at the third base.
    #[must_use]
    pub const fn engineering_bay() -> Self {
        Self::new(
            "engineering_bay",
            UnitKind::EngineeringBay,
            Prerequisite::ReadyBase,
            2,
            3,
        )
    }

    /// Kind this rule builds.
    #[must_use]
    pub const fn kind(&self) -> UnitKind {
        self.kind
    }
}

impl Policy for StructurePolicy {
    fn name(&self) -> &'static str {
        self.name
    }

    fn plan(&self, cx: &PolicyContext<'_>, ledger: &mut Ledger) -> Vec<Action> {
        if !self.prerequisite.is_met(cx) {
            return Vec::new();
        }
        if cx.snapshot.base_count() < self.min_bases {
            return Vec::new();
        }
        if cx.snapshot.count(self.kind) >= cx.cap(self.kind) {
            return Vec::new();
        }
        if ledger.already_pending(self.kind) > 0 {
            return Vec::new();
        }
        if !ledger.can_afford(self.kind) {
            skip(self.name, self.kind, &"insufficient resources");
            return Vec::new();
        }
        let Some(anchor) = cx.snapshot.nth_base(self.anchor_base) else {
            return Vec::new();
        };

        let radius = AgentConfig::units(cx.config.placement_radius);
        build_near(self.name, cx, ledger, self.kind, anchor.position, radius)
            .into_iter()
            .collect()
    }
}
