//! Production policies.
//!
//! A policy is one independent rule of the build order. It looks at the
//! tick's snapshot, consults the [`Ledger`], and reserves whatever it decides
//! to commit before handing the resulting [`Action`]s back to the
//! orchestrator. Policies never talk to the engine's command side; the only
//! engine access they get is the read-only [`WorldQuery`].
//!
//! # Evaluation Order
//!
//! [`standard_policies`] returns the rules in priority order. Earlier policies
//! get first claim on the shared budget:
//! 1. Worker training
//! 2. Supply provisioning
//! 3. Gas extraction
//! 4. Barracks
//! 5. Starport
//! 6. Factory
//! 7. Armory
//! 8. Engineering bay
//! 9. Base expansion
//! 10. Marines, hellions, medivacs, vikings

mod economy;
mod structures;
mod training;

pub use economy::{next_expansion, BaseExpansion, GasExtraction, SupplyProvisioning};
pub use structures::{Prerequisite, StructurePolicy};
pub use training::TrainingPolicy;

use serde::{Deserialize, Serialize};

use crate::config::AgentConfig;
use crate::engine::{Command, WorldQuery};
use crate::error::AgentError;
use crate::kind::UnitKind;
use crate::ledger::Ledger;
use crate::math::{Fixed, Vec2Fixed};
use crate::placement::{find_placement, PlacementQuery};
use crate::snapshot::{BuildCommitment, CommitmentSite, UnitId, WorldSnapshot};

/// A command a policy decided on, already paid for in the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Action {
    /// Unit or producer receiving the order.
    pub actor: UnitId,
    /// The order.
    pub command: Command,
}

impl Action {
    /// Create an action.
    #[must_use]
    pub const fn new(actor: UnitId, command: Command) -> Self {
        Self { actor, command }
    }
}

/// Read-only inputs shared by every policy in a tick.
#[derive(Clone, Copy)]
pub struct PolicyContext<'a> {
    /// The tick's snapshot.
    pub snapshot: &'a WorldSnapshot,
    /// Agent configuration.
    pub config: &'a AgentConfig,
    /// Engine queries.
    pub world: &'a dyn WorldQuery,
}

impl<'a> PolicyContext<'a> {
    /// Create a context.
    #[must_use]
    pub fn new(
        snapshot: &'a WorldSnapshot,
        config: &'a AgentConfig,
        world: &'a dyn WorldQuery,
    ) -> Self {
        Self {
            snapshot,
            config,
            world,
        }
    }

    /// Configured cap for a kind, `usize::MAX` when uncapped.
    #[must_use]
    pub fn cap(&self, kind: UnitKind) -> usize {
        self.config
            .caps
            .cap(kind)
            .map_or(usize::MAX, |cap| cap as usize)
    }
}

/// One rule of the build order.
pub trait Policy {
    /// Stable name used in logs and reports.
    fn name(&self) -> &'static str;

    /// Decide this tick's actions.
    ///
    /// Every returned action has already been reserved in `ledger` and its
    /// actor claimed. Running `plan` twice against the same snapshot with
    /// equal ledgers yields equal actions.
    fn plan(&self, cx: &PolicyContext<'_>, ledger: &mut Ledger) -> Vec<Action>;
}

/// The full build order, in priority order.
#[must_use]
pub fn standard_policies() -> Vec<Box<dyn Policy>> {
    vec![
        Box::new(TrainingPolicy::new("worker_training", UnitKind::Scv)),
        Box::new(SupplyProvisioning),
        Box::new(GasExtraction),
        Box::new(StructurePolicy::barracks()),
        Box::new(StructurePolicy::starport()),
        Box::new(StructurePolicy::factory()),
        Box::new(StructurePolicy::armory()),
        Box::new(StructurePolicy::engineering_bay()),
        Box::new(BaseExpansion),
        Box::new(TrainingPolicy::new("marine_training", UnitKind::Marine)),
        Box::new(TrainingPolicy::new("hellion_training", UnitKind::Hellion)),
        Box::new(TrainingPolicy::new("medivac_training", UnitKind::Medivac)),
        Box::new(TrainingPolicy::new("viking_training", UnitKind::VikingFighter)),
    ]
}

/// Log a precondition failure. Skips are routine and retried next tick.
pub(crate) fn skip(policy: &'static str, kind: UnitKind, reason: &dyn std::fmt::Display) {
    tracing::debug!(policy, kind = %kind, reason = %reason, "Policy skipped");
}

/// Reserve a commitment and claim its actor.
pub(crate) fn commit(
    policy: &'static str,
    ledger: &mut Ledger,
    commitment: BuildCommitment,
    actor: UnitId,
    command: Command,
) -> Option<Action> {
    match ledger.reserve(commitment) {
        Ok(()) => {
            ledger.claim(actor);
            Some(Action::new(actor, command))
        }
        Err(err) => {
            skip(policy, commitment.kind, &err);
            None
        }
    }
}

/// Place a structure near an anchor with a freshly selected builder.
pub(crate) fn build_near(
    policy: &'static str,
    cx: &PolicyContext<'_>,
    ledger: &mut Ledger,
    kind: UnitKind,
    anchor: Vec2Fixed,
    max_distance: Fixed,
) -> Option<Action> {
    let query = PlacementQuery {
        kind,
        near: anchor,
        spacing: AgentConfig::units(cx.config.building_spacing),
        max_distance,
    };
    let Some(position) = find_placement(&query, cx.snapshot, ledger, cx.world) else {
        skip(policy, kind, &AgentError::NoLegalPlacement(kind));
        return None;
    };
    let Some(builder) = cx.world.select_builder(position, ledger.claimed()) else {
        skip(policy, kind, &"no builder available");
        return None;
    };
    commit(
        policy,
        ledger,
        BuildCommitment::new(kind, CommitmentSite::Position(position)),
        builder,
        Command::Build { kind, at: position },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_order() {
        let names: Vec<&str> = standard_policies().iter().map(|p| p.name()).collect();
        assert_eq!(
            names,
            vec![
                "worker_training",
                "supply_provisioning",
                "gas_extraction",
                "barracks",
                "starport",
                "factory",
                "armory",
                "engineering_bay",
                "base_expansion",
                "marine_training",
                "hellion_training",
                "medivac_training",
                "viking_training",
            ]
        );
    }
}
