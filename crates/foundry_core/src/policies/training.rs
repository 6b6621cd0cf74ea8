//! Unit training rules.

use crate::engine::Command;
use crate::kind::UnitKind;
use crate::ledger::Ledger;
use crate::snapshot::{BuildCommitment, CommitmentSite};

use super::{commit, skip, Action, Policy, PolicyContext};

/// Trains `kind` at every idle, completed producer while under the cap.
///
/// Each order is reserved before the next producer is looked at, so a loop
/// over several producers stops as soon as the budget or the cap runs out.
/// A producer already holding an order for the same kind this tick is
/// skipped; orders for other kinds do not block it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrainingPolicy {
    name: &'static str,
    kind: UnitKind,
}

impl TrainingPolicy {
    /// Create a training rule for a trainable kind.
    #[must_use]
    pub const fn new(name: &'static str, kind: UnitKind) -> Self {
        Self { name, kind }
    }

    /// Kind this rule trains.
    #[must_use]
    pub const fn kind(&self) -> UnitKind {
        self.kind
    }
}

impl Policy for TrainingPolicy {
    fn name(&self) -> &'static str {
        self.name
    }

    fn plan(&self, cx: &PolicyContext<'_>, ledger: &mut Ledger) -> Vec<Action> {
        let Some(producer_kind) = self.kind.producer() else {
            return Vec::new();
        };
        let cap = cx.cap(self.kind);
        let mut actions = Vec::new();

        for producer in cx.snapshot.idle_of_kind(producer_kind) {
            if ledger.producer_committed(producer.id, self.kind) {
                continue;
            }
            if ledger.projected_count(cx.snapshot, self.kind) >= cap {
                break;
            }
            if !ledger.can_afford(self.kind) {
                skip(self.name, self.kind, &"insufficient resources");
                break;
            }
            actions.extend(commit(
                self.name,
                ledger,
                BuildCommitment::new(self.kind, CommitmentSite::Producer(producer.id)),
                producer.id,
                Command::Train(self.kind),
            ));
        }
        actions
    }
}
