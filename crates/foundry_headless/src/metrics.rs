//! Game metrics collection for build-order analysis.
//!
//! A [`MetricsCollector`] is fed one [`TickReport`] per tick and turns the
//! run into a [`GameMetrics`] record. [`BatchSummary`] aggregates many runs.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use foundry_core::agent::TickReport;
use foundry_core::engine::Command;
use foundry_core::kind::UnitKind;
use foundry_core::snapshot::WorldSnapshot;

use crate::sandbox::SandboxStats;

/// Complete metrics for a single game.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GameMetrics {
    /// Unique game identifier.
    pub game_id: String,
    /// Scenario name.
    pub scenario: String,
    /// Seed used for the sandbox.
    pub seed: u64,
    /// Total game duration in ticks.
    pub duration_ticks: u64,

    // === Decisions ===
    /// Accepted commitments by kind.
    pub commits_by_kind: BTreeMap<String, u32>,
    /// Accepted actions by emitting policy.
    pub actions_by_policy: BTreeMap<String, u32>,
    /// Commands the engine refused.
    pub rejections: u32,
    /// Ticks where the agent issued nothing.
    pub idle_ticks: u64,
    /// Ticks spent responding to a threat.
    pub threat_ticks: u64,

    // === Economy ===
    /// Minerals delivered by workers.
    pub minerals_gathered: i64,
    /// Gas delivered by workers.
    pub gas_gathered: i64,
    /// Minerals charged by the engine.
    pub minerals_spent: i64,
    /// Gas charged by the engine.
    pub gas_spent: i64,

    // === Outcome ===
    /// Owned units at the end, by kind.
    pub final_counts: BTreeMap<String, u32>,
    /// Enemies spawned by waves.
    pub enemies_spawned: u32,
    /// Enemies destroyed.
    pub enemies_killed: u32,

    // === Timing ===
    /// Tick of the first accepted expansion.
    pub first_expansion_tick: Option<u64>,
    /// Tick of the first combat response.
    pub first_response_tick: Option<u64>,
    /// Timed events log.
    pub events: Vec<TimedEvent>,

    /// Hash of the accepted command log (for determinism validation).
    pub command_log_hash: u64,
}

impl GameMetrics {
    /// Create a new game metrics instance.
    #[must_use]
    pub fn new(game_id: impl Into<String>, scenario: impl Into<String>, seed: u64) -> Self {
        Self {
            game_id: game_id.into(),
            scenario: scenario.into(),
            seed,
            ..Default::default()
        }
    }

    /// Record a timed event.
    pub fn record_event(&mut self, tick: u64, event_type: EventType, details: &str) {
        self.events.push(TimedEvent {
            tick,
            event_type,
            details: details.to_string(),
        });
    }

    /// Total accepted commitments.
    #[must_use]
    pub fn total_commits(&self) -> u32 {
        self.commits_by_kind.values().sum()
    }

    /// Final count of one kind.
    #[must_use]
    pub fn final_count(&self, kind: UnitKind) -> u32 {
        self.final_counts
            .get(kind.short_name())
            .copied()
            .unwrap_or(0)
    }
}

/// A timed event during the game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimedEvent {
    /// Tick when the event occurred.
    pub tick: u64,
    /// Type of event.
    pub event_type: EventType,
    /// Event details.
    pub details: String,
}

/// Types of events that can be recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventType {
    /// A structure commitment was accepted.
    StructureCommitted,
    /// A new base was committed.
    ExpansionStarted,
    /// The engine refused an order.
    Rejected,
    /// The combat reflex started a response.
    ThreatResponse,
}

/// Summary statistics across multiple games.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Total games played.
    pub total_games: u32,
    /// Average commitments per game.
    pub avg_commits: f64,
    /// Average idle ticks per game.
    pub avg_idle_ticks: f64,
    /// Average minerals spent per game.
    pub avg_minerals_spent: f64,
    /// Average rejections per game.
    pub avg_rejections: f64,
    /// Average final count per kind.
    pub avg_final_counts: BTreeMap<String, f64>,
    /// Games that expanded at least once.
    pub games_expanded: u32,
    /// Average first expansion tick among games that expanded.
    pub avg_first_expansion_tick: Option<f64>,
    /// Distinct command-log hashes seen.
    pub distinct_hashes: usize,
}

impl BatchSummary {
    /// Calculate summary from a list of game metrics.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn from_games(games: &[GameMetrics]) -> Self {
        if games.is_empty() {
            return Self::default();
        }
        let n = games.len() as f64;
        let average = |f: &dyn Fn(&GameMetrics) -> f64| games.iter().map(f).sum::<f64>() / n;

        let mut count_totals: BTreeMap<String, u64> = BTreeMap::new();
        for game in games {
            for (kind, count) in &game.final_counts {
                *count_totals.entry(kind.clone()).or_default() += u64::from(*count);
            }
        }

        let expansions: Vec<u64> = games.iter().filter_map(|g| g.first_expansion_tick).collect();
        let mut hashes: Vec<u64> = games.iter().map(|g| g.command_log_hash).collect();
        hashes.sort_unstable();
        hashes.dedup();

        Self {
            total_games: games.len() as u32,
            avg_commits: average(&|g| f64::from(g.total_commits())),
            avg_idle_ticks: average(&|g| g.idle_ticks as f64),
            avg_minerals_spent: average(&|g| g.minerals_spent as f64),
            avg_rejections: average(&|g| f64::from(g.rejections)),
            avg_final_counts: count_totals
                .into_iter()
                .map(|(kind, total)| (kind, total as f64 / n))
                .collect(),
            games_expanded: expansions.len() as u32,
            avg_first_expansion_tick: (!expansions.is_empty())
                .then(|| expansions.iter().sum::<u64>() as f64 / expansions.len() as f64),
            distinct_hashes: hashes.len(),
        }
    }
}

/// Metrics collector fed by the agent's per-tick reports.
#[derive(Debug, Default)]
pub struct MetricsCollector {
    metrics: GameMetrics,
    current_tick: u64,
    was_responding: bool,
}

impl MetricsCollector {
    /// Create a new metrics collector.
    #[must_use]
    pub fn new(game_id: &str, scenario: &str, seed: u64) -> Self {
        Self {
            metrics: GameMetrics::new(game_id, scenario, seed),
            ..Default::default()
        }
    }

    /// Fold one tick's report into the metrics.
    pub fn record_tick(&mut self, report: &TickReport) {
        self.current_tick = report.tick;
        let metrics = &mut self.metrics;

        if report.is_idle() {
            metrics.idle_ticks += 1;
        }

        let responding = report.threat.is_responding();
        if responding {
            metrics.threat_ticks += 1;
            if !self.was_responding {
                metrics.first_response_tick.get_or_insert(report.tick);
                metrics.record_event(report.tick, EventType::ThreatResponse, "");
            }
        }
        self.was_responding = responding;

        for issued in &report.actions {
            if !issued.accepted {
                metrics.rejections += 1;
                metrics.record_event(report.tick, EventType::Rejected, issued.policy);
                continue;
            }
            *metrics
                .actions_by_policy
                .entry(issued.policy.to_string())
                .or_default() += 1;

            let kind = match issued.action.command {
                Command::Train(kind)
                | Command::Build { kind, .. }
                | Command::BuildOn { kind, .. } => kind,
                Command::Gather(_) | Command::Attack(_) => continue,
            };
            *metrics
                .commits_by_kind
                .entry(kind.short_name().to_string())
                .or_default() += 1;

            if kind.is_base() {
                metrics.first_expansion_tick.get_or_insert(report.tick);
                metrics.record_event(report.tick, EventType::ExpansionStarted, kind.short_name());
            } else if kind.is_structure() {
                metrics.record_event(report.tick, EventType::StructureCommitted, kind.short_name());
            }
        }
    }

    /// Finalize with the end state of the world and return the metrics.
    #[must_use]
    pub fn finalize(
        mut self,
        snapshot: &WorldSnapshot,
        stats: &SandboxStats,
        command_log_hash: u64,
    ) -> GameMetrics {
        let metrics = &mut self.metrics;
        metrics.duration_ticks = self.current_tick + 1;
        for unit in &snapshot.units {
            *metrics
                .final_counts
                .entry(unit.kind.short_name().to_string())
                .or_default() += 1;
        }
        metrics.minerals_gathered = stats.minerals_gathered;
        metrics.gas_gathered = stats.gas_gathered;
        metrics.minerals_spent = stats.minerals_spent;
        metrics.gas_spent = stats.gas_spent;
        metrics.enemies_spawned = stats.enemies_spawned;
        metrics.enemies_killed = stats.enemies_killed;
        metrics.command_log_hash = command_log_hash;
        self.metrics
    }

    /// Get current metrics (immutable).
    #[must_use]
    pub fn current(&self) -> &GameMetrics {
        &self.metrics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use foundry_core::agent::IssuedAction;
    use foundry_core::combat::ThreatState;
    use foundry_core::config::Cost;
    use foundry_core::math::Vec2Fixed;
    use foundry_core::policies::Action;
    use foundry_core::snapshot::Resources;

    fn report(tick: u64, actions: Vec<IssuedAction>, threat: ThreatState) -> TickReport {
        TickReport {
            tick,
            opening: Resources::default(),
            closing: Resources::default(),
            spent: Cost::default(),
            commitments: Vec::new(),
            actions,
            threat,
        }
    }

    fn issued(policy: &'static str, command: Command, accepted: bool) -> IssuedAction {
        IssuedAction {
            policy,
            action: Action::new(1, command),
            accepted,
        }
    }

    #[test]
    fn test_game_metrics_new() {
        let metrics = GameMetrics::new("game_001", "standard", 12345);
        assert_eq!(metrics.game_id, "game_001");
        assert_eq!(metrics.seed, 12345);
        assert_eq!(metrics.total_commits(), 0);
    }

    #[test]
    fn test_collector_counts_commits_and_rejections() {
        let mut collector = MetricsCollector::new("test", "scenario", 42);
        collector.record_tick(&report(0, Vec::new(), ThreatState::Passive));
        collector.record_tick(&report(
            1,
            vec![
                issued("worker_training", Command::Train(UnitKind::Scv), true),
                issued(
                    "base_expansion",
                    Command::Build {
                        kind: UnitKind::CommandCenter,
                        at: Vec2Fixed::from_units(60, 0),
                    },
                    true,
                ),
                issued("worker_allocation", Command::Gather(5), true),
                issued("marine_training", Command::Train(UnitKind::Marine), false),
            ],
            ThreatState::Passive,
        ));

        let metrics = collector.current();
        assert_eq!(metrics.idle_ticks, 1);
        assert_eq!(metrics.total_commits(), 2);
        assert_eq!(metrics.rejections, 1);
        assert_eq!(metrics.first_expansion_tick, Some(1));
        assert_eq!(metrics.actions_by_policy.get("worker_allocation"), Some(&1));
        assert!(metrics
            .events
            .iter()
            .any(|e| e.event_type == EventType::ExpansionStarted));
    }

    #[test]
    fn test_threat_response_recorded_once_per_episode() {
        let responding = ThreatState::Responding {
            structure: 1,
            target: Vec2Fixed::ZERO,
            enemies: 2,
        };
        let mut collector = MetricsCollector::new("test", "scenario", 0);
        for tick in 0..3 {
            collector.record_tick(&report(tick, Vec::new(), responding));
        }
        collector.record_tick(&report(3, Vec::new(), ThreatState::Passive));

        let metrics = collector.current();
        assert_eq!(metrics.threat_ticks, 3);
        assert_eq!(metrics.first_response_tick, Some(0));
        let responses = metrics
            .events
            .iter()
            .filter(|e| e.event_type == EventType::ThreatResponse)
            .count();
        assert_eq!(responses, 1);
    }

    #[test]
    fn test_batch_summary() {
        let mut game1 = GameMetrics::new("g1", "test", 1);
        game1.idle_ticks = 100;
        game1.first_expansion_tick = Some(300);
        game1.final_counts.insert("scv".to_string(), 20);
        game1.command_log_hash = 7;

        let mut game2 = GameMetrics::new("g2", "test", 2);
        game2.idle_ticks = 200;
        game2.final_counts.insert("scv".to_string(), 30);
        game2.command_log_hash = 7;

        let summary = BatchSummary::from_games(&[game1, game2]);

        assert_eq!(summary.total_games, 2);
        assert!((summary.avg_idle_ticks - 150.0).abs() < 0.001);
        assert_eq!(summary.games_expanded, 1);
        assert_eq!(summary.avg_first_expansion_tick, Some(300.0));
        assert_eq!(summary.avg_final_counts.get("scv"), Some(&25.0));
        assert_eq!(summary.distinct_hashes, 1);
    }

    #[test]
    fn test_empty_batch_summary() {
        assert_eq!(BatchSummary::from_games(&[]), BatchSummary::default());
    }
}
