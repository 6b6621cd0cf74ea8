//! Supply, gas and expansion rules.

use crate::config::AgentConfig;
use crate::engine::Command;
use crate::error::AgentError;
use crate::kind::UnitKind;
use crate::ledger::Ledger;
use crate::math::{Fixed, Vec2Fixed};
use crate::placement::{find_placement, PlacementQuery};
use crate::snapshot::{BuildCommitment, CommitmentSite, ResourceNode, WorldSnapshot};

use super::{build_near, commit, skip, Action, Policy, PolicyContext};

/// Requests a supply structure when headroom runs low.
#[derive(Debug, Clone, Copy, Default)]
pub struct SupplyProvisioning;

impl Policy for SupplyProvisioning {
    fn name(&self) -> &'static str {
        "supply_provisioning"
    }

    fn plan(&self, cx: &PolicyContext<'_>, ledger: &mut Ledger) -> Vec<Action> {
        let kind = UnitKind::SupplyDepot;
        if ledger.available().supply_left >= cx.config.supply_threshold {
            return Vec::new();
        }
        if ledger.already_pending(kind) > 0 {
            return Vec::new();
        }
        let Some(base) = cx.snapshot.ready_bases().next() else {
            return Vec::new();
        };
        if !ledger.can_afford(kind) {
            skip(self.name(), kind, &"insufficient resources");
            return Vec::new();
        }

        let radius = AgentConfig::units(cx.config.placement_radius);
        build_near(self.name(), cx, ledger, kind, base.position, radius)
            .into_iter()
            .collect()
    }
}

/// Puts an extractor on every free gas node near a ready base.
///
/// Scanning stops at the first node that cannot be afforded or staffed, which
/// leaves the remaining budget to the structure policies further down.
#[derive(Debug, Clone, Copy, Default)]
pub struct GasExtraction;

impl GasExtraction {
    fn node_occupied(
        snapshot: &WorldSnapshot,
        ledger: &Ledger,
        node: &ResourceNode,
        occupancy: Fixed,
    ) -> bool {
        ledger.node_committed(node.id)
            || snapshot
                .of_kind(UnitKind::Refinery)
                .any(|r| r.position.is_closer_than(node.position, occupancy))
    }
}

impl Policy for GasExtraction {
    fn name(&self) -> &'static str {
        "gas_extraction"
    }

    fn plan(&self, cx: &PolicyContext<'_>, ledger: &mut Ledger) -> Vec<Action> {
        let kind = UnitKind::Refinery;
        let radius = AgentConfig::units(cx.config.gas_radius);
        let occupancy = AgentConfig::units(cx.config.extractor_occupancy_radius);
        let mut actions = Vec::new();

        for base in cx.snapshot.ready_bases() {
            for node in cx.snapshot.geysers_near(base.position, radius) {
                if Self::node_occupied(cx.snapshot, ledger, node, occupancy) {
                    continue;
                }
                if !ledger.can_afford(kind) {
                    skip(self.name(), kind, &"insufficient resources");
                    return actions;
                }
                let Some(builder) = cx.world.select_builder(node.position, ledger.claimed())
                else {
                    skip(self.name(), kind, &"no builder available");
                    return actions;
                };
                actions.extend(commit(
                    self.name(),
                    ledger,
                    BuildCommitment::new(kind, CommitmentSite::Node(node.id)),
                    builder,
                    Command::BuildOn {
                        kind,
                        node: node.id,
                    },
                ));
            }
        }
        actions
    }
}

/// First expansion site with no owned base strictly within `claim_radius`.
///
/// Sites are scanned in snapshot order; the first match wins.
#[must_use]
pub fn next_expansion(snapshot: &WorldSnapshot, claim_radius: Fixed) -> Option<Vec2Fixed> {
    snapshot.expansion_sites.iter().copied().find(|site| {
        !snapshot
            .bases()
            .any(|base| base.position.is_closer_than(*site, claim_radius))
    })
}

/// Claims a new base until the base cap is reached.
#[derive(Debug, Clone, Copy, Default)]
pub struct BaseExpansion;

impl Policy for BaseExpansion {
    fn name(&self) -> &'static str {
        "base_expansion"
    }

    fn plan(&self, cx: &PolicyContext<'_>, ledger: &mut Ledger) -> Vec<Action> {
        let kind = UnitKind::CommandCenter;
        if cx.snapshot.base_count() >= cx.cap(kind) {
            return Vec::new();
        }
        if ledger.already_pending(kind) > 0 {
            return Vec::new();
        }
        if !ledger.can_afford(kind) {
            skip(self.name(), kind, &"insufficient resources");
            return Vec::new();
        }
        let claim_radius = AgentConfig::units(cx.config.expansion_claim_radius);
        let Some(site) = next_expansion(cx.snapshot, claim_radius) else {
            skip(self.name(), kind, &AgentError::NoExpansionAvailable);
            return Vec::new();
        };

        // The builder walks over from the main base, not from the site.
        let builder_anchor = cx.snapshot.nth_base(0).map_or(site, |base| base.position);
        let Some(builder) = cx.world.select_builder(builder_anchor, ledger.claimed()) else {
            skip(self.name(), kind, &"no builder available");
            return Vec::new();
        };
        let query = PlacementQuery {
            kind,
            near: site,
            spacing: AgentConfig::units(cx.config.building_spacing),
            max_distance: AgentConfig::units(cx.config.expansion_placement_radius),
        };
        let Some(position) = find_placement(&query, cx.snapshot, ledger, cx.world) else {
            skip(self.name(), kind, &AgentError::NoLegalPlacement(kind));
            return Vec::new();
        };
        commit(
            self.name(),
            ledger,
            BuildCommitment::new(kind, CommitmentSite::Position(position)),
            builder,
            Command::Build { kind, at: position },
        )
        .into_iter()
        .collect()
    }
}
