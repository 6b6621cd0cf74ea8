//! Tick orchestrator.
//!
//! # Tick Order
//!
//! Each call to [`Agent::on_step`] runs, against one snapshot and one ledger:
//! 1. Worker allocation
//! 2. Every policy, in priority order
//! 3. The combat reflex
//!
//! Every stage plans against the ledger first; the collected actions are then
//! issued to the engine in the same order. Issue failures are logged and
//! recorded in the [`TickReport`] but never undo a reservation.

use serde::Serialize;

use crate::combat::{CombatReflex, ThreatState};
use crate::config::{AgentConfig, Cost};
use crate::engine::Engine;
use crate::error::Result;
use crate::ledger::Ledger;
use crate::policies::{standard_policies, Action, Policy, PolicyContext};
use crate::snapshot::{BuildCommitment, Resources};
use crate::workers::allocate_workers;

/// Source tag for worker allocation orders.
pub const WORKER_ALLOCATION: &str = "worker_allocation";

/// Source tag for combat reflex orders.
pub const COMBAT_REFLEX: &str = "combat_reflex";

/// An action and what the engine made of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IssuedAction {
    /// Stage that produced the action.
    pub policy: &'static str,
    /// The action.
    pub action: Action,
    /// Whether the engine accepted it.
    pub accepted: bool,
}

/// Summary of one tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TickReport {
    /// Tick index passed by the host.
    pub tick: u64,
    /// Resources at tick start.
    pub opening: Resources,
    /// Resources left in the ledger after every stage ran.
    pub closing: Resources,
    /// Total reserved this tick.
    pub spent: Cost,
    /// Commitments reserved this tick, in commit order.
    pub commitments: Vec<BuildCommitment>,
    /// Every action issued this tick, in issue order.
    pub actions: Vec<IssuedAction>,
    /// Reflex outcome.
    pub threat: ThreatState,
}

impl TickReport {
    /// Number of actions the engine refused.
    #[must_use]
    pub fn rejected(&self) -> usize {
        self.actions.iter().filter(|a| !a.accepted).count()
    }

    /// Whether the tick produced no actions at all.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.actions.is_empty()
    }

    /// Actions produced by one stage.
    pub fn from_policy<'a>(&'a self, policy: &'a str) -> impl Iterator<Item = &'a Action> + 'a {
        self.actions
            .iter()
            .filter(move |a| a.policy == policy)
            .map(|a| &a.action)
    }
}

/// The build-order agent.
pub struct Agent {
    config: AgentConfig,
    policies: Vec<Box<dyn Policy>>,
    reflex: CombatReflex,
    last_report: Option<TickReport>,
}

impl std::fmt::Debug for Agent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Agent")
            .field("config", &self.config)
            .field("policies", &self.policy_names())
            .field("last_report", &self.last_report)
            .finish_non_exhaustive()
    }
}

impl Agent {
    /// Create an agent running the standard build order.
    ///
    /// # Errors
    /// Returns [`AgentError::InvalidConfig`](crate::error::AgentError::InvalidConfig)
    /// if the config fails validation.
    pub fn new(config: AgentConfig) -> Result<Self> {
        Self::with_policies(config, standard_policies())
    }

    /// Create an agent with a custom policy list, evaluated in the given order.
    ///
    /// # Errors
    /// Returns [`AgentError::InvalidConfig`](crate::error::AgentError::InvalidConfig)
    /// if the config fails validation.
    pub fn with_policies(config: AgentConfig, policies: Vec<Box<dyn Policy>>) -> Result<Self> {
        config.validate()?;
        let reflex = CombatReflex::new(config.seed);
        Ok(Self {
            config,
            policies,
            reflex,
            last_report: None,
        })
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Policy names in evaluation order.
    #[must_use]
    pub fn policy_names(&self) -> Vec<&'static str> {
        self.policies.iter().map(|p| p.name()).collect()
    }

    /// Summary of the most recent tick, if any ran.
    #[must_use]
    pub const fn last_report(&self) -> Option<&TickReport> {
        self.last_report.as_ref()
    }

    /// Run one tick against the engine.
    pub fn on_step<E: Engine>(&mut self, engine: &mut E, tick: u64) {
        let snapshot = engine.snapshot();
        let mut ledger = Ledger::open(&snapshot, &self.config.costs);
        let mut planned: Vec<(&'static str, Action)> = Vec::new();

        planned.extend(
            allocate_workers(&snapshot, &self.config, &mut ledger)
                .into_iter()
                .map(|action| (WORKER_ALLOCATION, action)),
        );

        {
            let cx = PolicyContext::new(&snapshot, &self.config, &*engine);
            for policy in &self.policies {
                let name = policy.name();
                planned.extend(
                    policy
                        .plan(&cx, &mut ledger)
                        .into_iter()
                        .map(|action| (name, action)),
                );
            }
        }

        let threat = self.reflex.assess(&snapshot, &self.config);
        planned.extend(
            CombatReflex::respond(&threat, &snapshot, &mut ledger)
                .into_iter()
                .map(|action| (COMBAT_REFLEX, action)),
        );

        let actions: Vec<IssuedAction> = planned
            .into_iter()
            .map(|(policy, action)| dispatch(engine, policy, action))
            .collect();

        let report = TickReport {
            tick,
            opening: ledger.opening(),
            closing: ledger.available(),
            spent: ledger.spent(),
            commitments: ledger.committed().to_vec(),
            actions,
            threat,
        };
        tracing::trace!(
            tick,
            actions = report.actions.len(),
            rejected = report.rejected(),
            minerals = report.closing.minerals,
            gas = report.closing.gas,
            "Tick complete"
        );
        self.last_report = Some(report);
    }
}

fn dispatch<E: Engine>(engine: &mut E, policy: &'static str, action: Action) -> IssuedAction {
    let accepted = match engine.issue(action.actor, action.command) {
        Ok(()) => {
            tracing::info!(policy, unit = action.actor, command = ?action.command, "Issued command");
            true
        }
        Err(err) => {
            tracing::warn!(policy, unit = action.actor, error = %err, "Engine rejected command");
            false
        }
    };
    IssuedAction {
        policy,
        action,
        accepted,
    }
}
