//! Deterministic sandbox engine.
//!
//! A toy world that is just rich enough to drive the agent end to end:
//! workers mine and deliver on a fixed trip cycle, construction and training
//! take a per-kind number of ticks, structures are placed on an
//! [`OccupancyGrid`], and scripted enemy waves appear for the combat reflex to
//! deal with. Items under construction are reported as pending and only
//! show up in the unit list once complete. Producers queue up to five
//! orders and work through them back to back. A builder pulled off a mineral
//! patch returns to it when the structure is done, and a worker whose patch
//! runs dry moves to the closest live one.
//!
//! # Tick Order
//!
//! [`SandboxEngine::advance`] runs, in order:
//! 1. Enemy wave spawns
//! 2. Work order progress and completion
//! 3. Resource deliveries
//! 4. Combat (attackers step toward their target and hit what is in reach)

use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeMap, BTreeSet};
use std::hash::{Hash, Hasher};

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Serialize;

use foundry_core::config::CostTable;
use foundry_core::engine::{Command, Engine, WorldQuery};
use foundry_core::error::{AgentError, Result};
use foundry_core::kind::UnitKind;
use foundry_core::math::{nearest_to, Fixed, Vec2Fixed};
use foundry_core::snapshot::{
    BuildCommitment, CommitmentSite, Owner, ResourceNode, Resources, Unit, UnitId, UnitStatus,
    WorldSnapshot,
};

use crate::grid::{footprint_radius, OccupancyGrid};
use crate::scenario::{EconomySetup, EnemyWave, Scenario};

/// Hit points of a spawned enemy.
const ENEMY_HEALTH: i32 = 6;

/// Reach of an attacking unit, in whole units.
const ATTACK_REACH: i32 = 2;

/// Orders a producer can hold at once.
const PRODUCER_QUEUE: usize = 5;

/// Ticks to finish a kind.
#[must_use]
pub const fn build_ticks(kind: UnitKind) -> u64 {
    match kind {
        UnitKind::Scv => 12,
        UnitKind::Marine => 18,
        UnitKind::Hellion => 21,
        UnitKind::Medivac | UnitKind::VikingFighter => 30,
        UnitKind::SupplyDepot | UnitKind::Refinery => 21,
        UnitKind::EngineeringBay => 25,
        UnitKind::Starport => 36,
        UnitKind::Factory => 43,
        UnitKind::Barracks | UnitKind::Armory => 46,
        UnitKind::CommandCenter => 71,
        UnitKind::Other(_) => 1,
    }
}

/// What an owned unit is doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Job {
    Idle,
    Mining(UnitId),
    Harvesting(UnitId),
    Building,
    Training,
    Attacking(Vec2Fixed),
}

/// A construction or training order in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct WorkOrder {
    /// Id the finished unit will get.
    id: UnitId,
    kind: UnitKind,
    site: CommitmentSite,
    position: Vec2Fixed,
    remaining: u64,
    /// Worker or producer tied up by the order.
    worker: UnitId,
    /// Patch the worker goes back to when done.
    resume: Option<UnitId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Enemy {
    id: UnitId,
    position: Vec2Fixed,
    health: i32,
}

/// A command the sandbox accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct LoggedCommand {
    /// Tick the command was issued on.
    pub tick: u64,
    /// Receiving unit.
    pub unit: UnitId,
    /// The command.
    pub command: Command,
}

/// Running totals kept by the sandbox.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SandboxStats {
    /// Minerals delivered.
    pub minerals_gathered: i64,
    /// Gas delivered.
    pub gas_gathered: i64,
    /// Minerals charged for accepted orders.
    pub minerals_spent: i64,
    /// Gas charged for accepted orders.
    pub gas_spent: i64,
    /// Enemies destroyed.
    pub enemies_killed: u32,
    /// Enemies spawned by waves.
    pub enemies_spawned: u32,
    /// Completed items per kind.
    pub completed: BTreeMap<String, u32>,
    /// Commands refused.
    pub rejections: u32,
}

/// The sandbox world.
#[derive(Debug, Clone)]
pub struct SandboxEngine {
    tick: u64,
    units: Vec<Unit>,
    jobs: BTreeMap<UnitId, Job>,
    enemies: Vec<Enemy>,
    minerals: Vec<ResourceNode>,
    geysers: Vec<ResourceNode>,
    stockpile: Resources,
    start: Vec2Fixed,
    expansion_sites: Vec<Vec2Fixed>,
    orders: Vec<WorkOrder>,
    grid: OccupancyGrid,
    costs: CostTable,
    economy: EconomySetup,
    waves: Vec<EnemyWave>,
    rng: ChaCha8Rng,
    next_id: UnitId,
    log: Vec<LoggedCommand>,
    stats: SandboxStats,
}

impl SandboxEngine {
    /// Build the starting world of a scenario.
    ///
    /// `seed` drives wave jitter only.
    #[must_use]
    pub fn from_scenario(scenario: &Scenario, costs: CostTable, seed: u64) -> Self {
        let (width, height) = scenario.map_size;
        let (sx, sy) = scenario.start();
        let mut engine = Self {
            tick: 0,
            units: Vec::new(),
            jobs: BTreeMap::new(),
            enemies: Vec::new(),
            minerals: Vec::new(),
            geysers: Vec::new(),
            stockpile: Resources::new(scenario.minerals, scenario.gas, 0),
            start: Vec2Fixed::from_units(sx, sy),
            expansion_sites: scenario
                .expansion_sites
                .iter()
                .map(|&(x, y)| Vec2Fixed::from_units(x, y))
                .collect(),
            orders: Vec::new(),
            grid: OccupancyGrid::new(width, height),
            costs,
            economy: scenario.economy,
            waves: scenario.waves.clone(),
            rng: ChaCha8Rng::seed_from_u64(seed),
            next_id: 1,
            log: Vec::new(),
            stats: SandboxStats::default(),
        };

        for field in &scenario.mineral_fields {
            let id = engine.take_id();
            engine.grid.block(field.at.0, field.at.1);
            engine.minerals.push(ResourceNode {
                id,
                position: Vec2Fixed::from_units(field.at.0, field.at.1),
                remaining: field.amount,
            });
        }
        for field in &scenario.geysers {
            let id = engine.take_id();
            engine.grid.block(field.at.0, field.at.1);
            engine.geysers.push(ResourceNode {
                id,
                position: Vec2Fixed::from_units(field.at.0, field.at.1),
                remaining: field.amount,
            });
        }
        for &(x, y) in &scenario.bases {
            engine.spawn_structure(UnitKind::CommandCenter, Vec2Fixed::from_units(x, y));
        }
        for i in 0..scenario.workers {
            let offset = (i % 5) as i32 - 2;
            let at = Vec2Fixed::from_units(sx - 4, sy + offset);
            let id = engine.take_id();
            engine.add_unit(id, UnitKind::Scv, at);
            if let Some(patch) = engine.nearest_mineral(at) {
                engine.jobs.insert(id, Job::Mining(patch));
            }
        }
        engine
    }

    /// Current tick.
    #[must_use]
    pub const fn tick(&self) -> u64 {
        self.tick
    }

    /// Running totals.
    #[must_use]
    pub const fn stats(&self) -> &SandboxStats {
        &self.stats
    }

    /// Every accepted command, in issue order.
    #[must_use]
    pub fn command_log(&self) -> &[LoggedCommand] {
        &self.log
    }

    /// Hash of the accepted command log.
    #[must_use]
    pub fn command_log_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.log.hash(&mut hasher);
        hasher.finish()
    }

    /// Enemies alive.
    #[must_use]
    pub fn enemy_count(&self) -> usize {
        self.enemies.len()
    }

    /// Completed owned units of a kind.
    #[must_use]
    pub fn count(&self, kind: UnitKind) -> usize {
        self.units.iter().filter(|u| u.kind == kind).count()
    }

    fn take_id(&mut self) -> UnitId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn add_unit(&mut self, id: UnitId, kind: UnitKind, position: Vec2Fixed) {
        self.units.push(Unit {
            id,
            kind,
            position,
            owner: Owner::Own,
            status: UnitStatus::Idle,
            capabilities: kind.default_capabilities(),
        });
        self.jobs.insert(id, Job::Idle);
    }

    fn spawn_structure(&mut self, kind: UnitKind, at: Vec2Fixed) -> UnitId {
        let id = self.take_id();
        let (x, y) = OccupancyGrid::cell_of(at);
        self.grid.occupy(x, y, footprint_radius(kind), id);
        self.add_unit(id, kind, at);
        id
    }

    fn job(&self, unit: UnitId) -> Job {
        self.jobs.get(&unit).copied().unwrap_or(Job::Idle)
    }

    fn unit(&self, id: UnitId) -> Option<&Unit> {
        self.units.iter().find(|u| u.id == id)
    }

    fn nearest_mineral(&self, at: Vec2Fixed) -> Option<UnitId> {
        let live = self.minerals.iter().filter(|m| m.remaining > 0);
        nearest_to(at, live, |m| m.position).map(|m| m.id)
    }

    /// Keep mining `patch`, or move to the live patch closest to it.
    fn mining_job_near(&self, patch: ResourceNode) -> Job {
        if patch.remaining > 0 {
            return Job::Mining(patch.id);
        }
        self.nearest_mineral(patch.position).map_or(Job::Idle, Job::Mining)
    }

    fn supply_cap(&self) -> i32 {
        let provided: i32 = self
            .units
            .iter()
            .map(|u| match u.kind {
                UnitKind::CommandCenter => 15,
                UnitKind::SupplyDepot => 8,
                _ => 0,
            })
            .sum();
        provided.min(self.economy.max_supply)
    }

    fn supply_used(&self) -> i32 {
        let alive: i32 = self.units.iter().map(|u| self.costs.get(u.kind).supply).sum();
        let queued: i32 = self
            .orders
            .iter()
            .map(|o| self.costs.get(o.kind).supply)
            .sum();
        alive + queued
    }

    fn supply_left(&self) -> i32 {
        self.supply_cap() - self.supply_used()
    }

    fn reject(&mut self, unit: UnitId, reason: &str) -> Result<()> {
        self.stats.rejections += 1;
        tracing::debug!(unit, reason, "Sandbox rejected command");
        Err(AgentError::EngineRejection {
            unit,
            reason: reason.to_string(),
        })
    }

    fn charge(&mut self, kind: UnitKind) -> bool {
        let cost = self.costs.get(kind);
        let supply_ok = cost.supply == 0 || self.supply_left() >= cost.supply;
        if self.stockpile.minerals < cost.minerals || self.stockpile.gas < cost.gas || !supply_ok {
            return false;
        }
        self.stockpile.minerals -= cost.minerals;
        self.stockpile.gas -= cost.gas;
        self.stats.minerals_spent += i64::from(cost.minerals);
        self.stats.gas_spent += i64::from(cost.gas);
        true
    }

    fn node_taken(&self, node: UnitId, position: Vec2Fixed) -> bool {
        self.orders.iter().any(|o| o.site == CommitmentSite::Node(node))
            || self
                .units
                .iter()
                .any(|u| u.kind == UnitKind::Refinery && u.position == position)
    }

    /// Advance the world by one tick.
    pub fn advance(&mut self) {
        self.tick += 1;
        self.spawn_waves();
        self.progress_orders();
        self.deliver_resources();
        self.resolve_combat();
    }

    fn spawn_waves(&mut self) {
        let due: Vec<EnemyWave> = self
            .waves
            .iter()
            .filter(|w| w.tick == self.tick)
            .copied()
            .collect();
        for wave in due {
            for _ in 0..wave.count {
                let jitter = wave.jitter.max(0);
                let dx = self.rng.gen_range(-jitter..=jitter);
                let dy = self.rng.gen_range(-jitter..=jitter);
                let id = self.take_id();
                self.enemies.push(Enemy {
                    id,
                    position: Vec2Fixed::from_units(wave.at.0 + dx, wave.at.1 + dy),
                    health: ENEMY_HEALTH,
                });
            }
            self.stats.enemies_spawned += wave.count;
            tracing::info!(tick = self.tick, count = wave.count, "Enemy wave spawned");
        }
    }

    fn progress_orders(&mut self) {
        for order in &mut self.orders {
            order.remaining = order.remaining.saturating_sub(1);
        }
        let (done, pending): (Vec<WorkOrder>, Vec<WorkOrder>) = std::mem::take(&mut self.orders)
            .into_iter()
            .partition(|o| o.remaining == 0);
        self.orders = pending;

        for order in done {
            self.add_unit(order.id, order.kind, order.position);
            let next = if self.orders.iter().any(|o| o.worker == order.worker) {
                Job::Training
            } else {
                order
                    .resume
                    .and_then(|node| self.minerals.iter().find(|m| m.id == node))
                    .map_or(Job::Idle, |patch| self.mining_job_near(*patch))
            };
            self.jobs.insert(order.worker, next);
            if order.kind.is_structure() {
                if let Some(worker) = self.units.iter_mut().find(|u| u.id == order.worker) {
                    worker.position = order.position;
                }
            }
            if order.kind == UnitKind::Scv {
                if let Some(patch) = self.nearest_mineral(order.position) {
                    self.jobs.insert(order.id, Job::Mining(patch));
                }
            }
            if order.kind == UnitKind::Refinery {
                self.staff_refinery(order.id, order.position);
            }
            *self
                .stats
                .completed
                .entry(order.kind.short_name().to_string())
                .or_insert(0) += 1;
            tracing::debug!(tick = self.tick, kind = %order.kind, id = order.id, "Completed");
        }
    }

    /// Move the nearest miners onto a finished refinery.
    fn staff_refinery(&mut self, refinery: UnitId, at: Vec2Fixed) {
        let miners: Vec<&Unit> = self
            .units
            .iter()
            .filter(|u| matches!(self.job(u.id), Job::Mining(_)))
            .collect();
        let mut by_distance: Vec<(Fixed, UnitId)> = miners
            .iter()
            .map(|u| (u.position.distance_squared(at), u.id))
            .collect();
        by_distance.sort();
        for (_, id) in by_distance
            .into_iter()
            .take(self.economy.workers_per_refinery as usize)
        {
            self.jobs.insert(id, Job::Harvesting(refinery));
        }
    }

    fn deliver_resources(&mut self) {
        if self.tick % self.economy.trip_ticks != 0 {
            return;
        }
        let workers: Vec<(UnitId, Job)> = self
            .units
            .iter()
            .filter(|u| u.kind == UnitKind::Scv)
            .map(|u| (u.id, self.job(u.id)))
            .collect();

        for (worker, job) in workers {
            match job {
                Job::Mining(node) => {
                    let Some(patch) = self.minerals.iter_mut().find(|m| m.id == node) else {
                        continue;
                    };
                    let amount = self.economy.minerals_per_trip.min(patch.remaining);
                    patch.remaining -= amount;
                    let patch = *patch;
                    self.stockpile.minerals += amount;
                    self.stats.minerals_gathered += i64::from(amount);
                    if patch.remaining == 0 {
                        let next = self.mining_job_near(patch);
                        tracing::debug!(
                            tick = self.tick,
                            worker,
                            patch = patch.id,
                            next = ?next,
                            "Patch depleted"
                        );
                        self.jobs.insert(worker, next);
                    }
                }
                Job::Harvesting(refinery) => {
                    let Some(at) = self.unit(refinery).map(|r| r.position) else {
                        continue;
                    };
                    let Some(geyser) = self.geysers.iter_mut().find(|g| g.position == at) else {
                        continue;
                    };
                    let amount = self.economy.gas_per_trip.min(geyser.remaining);
                    geyser.remaining -= amount;
                    self.stockpile.gas += amount;
                    self.stats.gas_gathered += i64::from(amount);
                }
                _ => {}
            }
        }
    }

    fn resolve_combat(&mut self) {
        let reach = Fixed::from_num(ATTACK_REACH);
        let attackers: Vec<(UnitId, Vec2Fixed)> = self
            .units
            .iter()
            .filter_map(|u| match self.job(u.id) {
                Job::Attacking(target) => Some((u.id, target)),
                _ => None,
            })
            .collect();

        for (id, target) in attackers {
            let Some(index) = self.units.iter().position(|u| u.id == id) else {
                continue;
            };
            let position = step_toward(self.units[index].position, target);
            self.units[index].position = position;

            let in_reach = self
                .enemies
                .iter_mut()
                .filter(|e| e.health > 0 && !e.position.is_farther_than(position, reach));
            if let Some(enemy) = nearest_to(position, in_reach, |e| e.position) {
                enemy.health -= 1;
            }

            let target_clear = !self
                .enemies
                .iter()
                .any(|e| e.health > 0 && !e.position.is_farther_than(target, reach));
            if target_clear {
                self.jobs.insert(id, Job::Idle);
            }
        }

        let before = self.enemies.len();
        self.enemies.retain(|e| e.health > 0);
        let killed = before - self.enemies.len();
        if killed > 0 {
            self.stats.enemies_killed += killed as u32;
            tracing::debug!(tick = self.tick, killed, "Enemies destroyed");
        }
    }
}

/// One step of at most a unit along each axis.
fn step_toward(from: Vec2Fixed, to: Vec2Fixed) -> Vec2Fixed {
    let one = Fixed::ONE;
    let step = |a: Fixed, b: Fixed| {
        if b > a {
            a + (b - a).min(one)
        } else {
            a - (a - b).min(one)
        }
    };
    Vec2Fixed::new(step(from.x, to.x), step(from.y, to.y))
}

impl WorldQuery for SandboxEngine {
    fn snapshot(&self) -> WorldSnapshot {
        let units = self
            .units
            .iter()
            .map(|u| {
                let status = match self.job(u.id) {
                    Job::Idle => UnitStatus::Idle,
                    _ => UnitStatus::Busy,
                };
                Unit { status, ..*u }
            })
            .collect();
        let enemies = self
            .enemies
            .iter()
            .map(|e| Unit {
                id: e.id,
                kind: UnitKind::Other(1),
                position: e.position,
                owner: Owner::Enemy,
                status: UnitStatus::Busy,
                capabilities: UnitKind::Marine.default_capabilities(),
            })
            .collect();
        let pending = self
            .orders
            .iter()
            .map(|o| BuildCommitment::new(o.kind, o.site))
            .collect();

        WorldSnapshot {
            units,
            enemies,
            minerals: self.minerals.clone(),
            geysers: self.geysers.clone(),
            resources: Resources::new(
                self.stockpile.minerals,
                self.stockpile.gas,
                self.supply_left(),
            ),
            start_location: self.start,
            expansion_sites: self.expansion_sites.clone(),
            pending,
        }
    }

    fn find_placement(
        &self,
        kind: UnitKind,
        near: Vec2Fixed,
        max_distance: Fixed,
    ) -> Option<Vec2Fixed> {
        self.grid.search(kind, near, max_distance)
    }

    fn select_builder(&self, near: Vec2Fixed, exclude: &BTreeSet<UnitId>) -> Option<UnitId> {
        let free = self.units.iter().filter(|u| {
            u.kind == UnitKind::Scv
                && !exclude.contains(&u.id)
                && matches!(self.job(u.id), Job::Idle | Job::Mining(_))
        });
        nearest_to(near, free, |u| u.position).map(|u| u.id)
    }
}

impl Engine for SandboxEngine {
    fn issue(&mut self, unit: UnitId, command: Command) -> Result<()> {
        let Some(actor) = self.unit(unit).copied() else {
            return self.reject(unit, "unknown unit");
        };
        let resume = match self.job(unit) {
            Job::Mining(node) => Some(node),
            _ => None,
        };

        match command {
            Command::Train(kind) => {
                if kind.producer() != Some(actor.kind) {
                    return self.reject(unit, "cannot train that kind");
                }
                let queued: Vec<u64> = self
                    .orders
                    .iter()
                    .filter(|o| o.site == CommitmentSite::Producer(unit))
                    .map(|o| o.remaining)
                    .collect();
                if queued.len() >= PRODUCER_QUEUE {
                    return self.reject(unit, "production queue full");
                }
                if !self.charge(kind) {
                    return self.reject(unit, "cannot afford");
                }
                let id = self.take_id();
                // Queued items run back to back.
                let wait = queued.into_iter().max().unwrap_or(0);
                self.orders.push(WorkOrder {
                    id,
                    kind,
                    site: CommitmentSite::Producer(unit),
                    position: actor.position + Vec2Fixed::from_units(0, -3),
                    remaining: wait + build_ticks(kind),
                    worker: unit,
                    resume: None,
                });
                self.jobs.insert(unit, Job::Training);
            }
            Command::Build { kind, at } => {
                if actor.kind != UnitKind::Scv || !kind.is_structure() || kind == UnitKind::Refinery {
                    return self.reject(unit, "invalid build order");
                }
                let (x, y) = OccupancyGrid::cell_of(at);
                if !self.grid.is_area_free(x, y, footprint_radius(kind)) {
                    return self.reject(unit, "site occupied");
                }
                if !self.charge(kind) {
                    return self.reject(unit, "cannot afford");
                }
                let id = self.take_id();
                self.grid.occupy(x, y, footprint_radius(kind), id);
                self.orders.push(WorkOrder {
                    id,
                    kind,
                    site: CommitmentSite::Position(at),
                    position: at,
                    remaining: build_ticks(kind),
                    worker: unit,
                    resume,
                });
                self.jobs.insert(unit, Job::Building);
            }
            Command::BuildOn { kind, node } => {
                if actor.kind != UnitKind::Scv || kind != UnitKind::Refinery {
                    return self.reject(unit, "invalid build order");
                }
                let Some(position) = self.geysers.iter().find(|g| g.id == node).map(|g| g.position)
                else {
                    return self.reject(unit, "unknown gas node");
                };
                if self.node_taken(node, position) {
                    return self.reject(unit, "gas node taken");
                }
                if !self.charge(kind) {
                    return self.reject(unit, "cannot afford");
                }
                let id = self.take_id();
                self.orders.push(WorkOrder {
                    id,
                    kind,
                    site: CommitmentSite::Node(node),
                    position,
                    remaining: build_ticks(kind),
                    worker: unit,
                    resume,
                });
                self.jobs.insert(unit, Job::Building);
            }
            Command::Gather(node) => {
                if actor.kind != UnitKind::Scv {
                    return self.reject(unit, "not a gatherer");
                }
                if !self.minerals.iter().any(|m| m.id == node && m.remaining > 0) {
                    return self.reject(unit, "unknown or depleted mineral patch");
                }
                self.jobs.insert(unit, Job::Mining(node));
            }
            Command::Attack(target) => {
                if actor.is_structure() || !actor.can_attack_ground() {
                    return self.reject(unit, "cannot attack ground");
                }
                self.jobs.insert(unit, Job::Attacking(target));
            }
        }

        self.log.push(LoggedCommand {
            tick: self.tick,
            unit,
            command,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::NodeSetup;

    fn tiny() -> Scenario {
        Scenario {
            name: "tiny".into(),
            description: String::new(),
            map_size: (64, 64),
            bases: vec![(20, 20)],
            workers: 4,
            minerals: 500,
            gas: 0,
            mineral_fields: vec![NodeSetup::new(12, 20, 100), NodeSetup::new(12, 22, 100)],
            geysers: vec![NodeSetup::new(27, 14, 500)],
            expansion_sites: vec![(20, 20), (50, 50)],
            waves: vec![EnemyWave {
                tick: 2,
                count: 1,
                at: (30, 20),
                jitter: 0,
            }],
            economy: EconomySetup {
                trip_ticks: 1,
                ..EconomySetup::default()
            },
        }
    }

    fn engine() -> SandboxEngine {
        SandboxEngine::from_scenario(&tiny(), CostTable::default(), 0)
    }

    fn base_id(engine: &SandboxEngine) -> UnitId {
        engine
            .snapshot()
            .bases()
            .next()
            .map(|b| b.id)
            .unwrap()
    }

    #[test]
    fn test_initial_snapshot() {
        let snapshot = engine().snapshot();
        assert_eq!(snapshot.base_count(), 1);
        assert_eq!(snapshot.count(UnitKind::Scv), 4);
        assert_eq!(snapshot.resources, Resources::new(500, 0, 11));
        assert!(snapshot.pending.is_empty());
    }

    #[test]
    fn test_training_is_pending_until_done() {
        let mut engine = engine();
        let base = base_id(&engine);
        engine.issue(base, Command::Train(UnitKind::Scv)).unwrap();

        let snapshot = engine.snapshot();
        assert_eq!(snapshot.pending_count(UnitKind::Scv), 1);
        assert_eq!(snapshot.resources.supply_left, 10);

        for _ in 0..build_ticks(UnitKind::Scv) {
            engine.advance();
        }
        let snapshot = engine.snapshot();
        assert_eq!(snapshot.count(UnitKind::Scv), 5);
        assert!(snapshot.pending.is_empty());
    }

    #[test]
    fn test_producer_queue_runs_back_to_back() {
        let mut engine = engine();
        let base = base_id(&engine);
        engine.issue(base, Command::Train(UnitKind::Scv)).unwrap();
        engine.issue(base, Command::Train(UnitKind::Scv)).unwrap();
        assert_eq!(engine.snapshot().pending_count(UnitKind::Scv), 2);

        for _ in 0..build_ticks(UnitKind::Scv) {
            engine.advance();
        }
        let snapshot = engine.snapshot();
        assert_eq!(snapshot.count(UnitKind::Scv), 5);
        assert_eq!(snapshot.pending_count(UnitKind::Scv), 1);
        assert_eq!(snapshot.units.iter().find(|u| u.id == base).unwrap().status, UnitStatus::Busy);

        for _ in 0..build_ticks(UnitKind::Scv) {
            engine.advance();
        }
        let snapshot = engine.snapshot();
        assert_eq!(snapshot.count(UnitKind::Scv), 6);
        assert!(snapshot.pending.is_empty());
        assert_eq!(snapshot.units.iter().find(|u| u.id == base).unwrap().status, UnitStatus::Idle);
    }

    #[test]
    fn test_full_queue_rejected() {
        let mut engine = engine();
        let base = base_id(&engine);
        for _ in 0..PRODUCER_QUEUE {
            engine.issue(base, Command::Train(UnitKind::Scv)).unwrap();
        }
        assert!(engine.issue(base, Command::Train(UnitKind::Scv)).is_err());
        assert_eq!(engine.stats().rejections, 1);
    }

    #[test]
    fn test_workers_move_off_depleted_patch() {
        let mut scenario = tiny();
        scenario.mineral_fields = vec![NodeSetup::new(12, 20, 20), NodeSetup::new(12, 40, 1000)];
        let mut engine = SandboxEngine::from_scenario(&scenario, CostTable::default(), 0);

        // The first trip empties the near patch; stragglers move on the next.
        engine.advance();
        engine.advance();
        let snapshot = engine.snapshot();
        assert!(snapshot
            .of_kind(UnitKind::Scv)
            .all(|u| u.status == UnitStatus::Busy));

        let before = snapshot.resources.minerals;
        engine.advance();
        assert_eq!(engine.snapshot().resources.minerals, before + 20);
    }

    #[test]
    fn test_mining_income() {
        let mut engine = engine();
        engine.advance();
        assert_eq!(engine.snapshot().resources.minerals, 520);
        assert_eq!(engine.stats().minerals_gathered, 20);
    }

    #[test]
    fn test_build_occupies_site() {
        let mut engine = engine();
        let worker = engine.select_builder(Vec2Fixed::from_units(20, 20), &BTreeSet::new()).unwrap();
        let at = engine
            .find_placement(UnitKind::SupplyDepot, Vec2Fixed::from_units(20, 20), Fixed::from_num(10))
            .unwrap();
        engine
            .issue(worker, Command::Build { kind: UnitKind::SupplyDepot, at })
            .unwrap();

        let other = engine.select_builder(at, &BTreeSet::new()).unwrap();
        assert_ne!(other, worker);
        assert!(engine
            .issue(other, Command::Build { kind: UnitKind::Barracks, at })
            .is_err());
        assert_eq!(engine.stats().rejections, 1);
    }

    #[test]
    fn test_refinery_gets_staffed() {
        let mut engine = engine();
        let worker = engine.select_builder(Vec2Fixed::from_units(27, 14), &BTreeSet::new()).unwrap();
        let node = engine.snapshot().geysers[0].id;
        engine
            .issue(worker, Command::BuildOn { kind: UnitKind::Refinery, node })
            .unwrap();
        assert!(engine
            .issue(worker, Command::BuildOn { kind: UnitKind::Refinery, node })
            .is_err());

        for _ in 0..build_ticks(UnitKind::Refinery) {
            engine.advance();
        }
        let gas_before = engine.snapshot().resources.gas;
        engine.advance();
        assert!(engine.snapshot().resources.gas > gas_before);
    }

    #[test]
    fn test_wave_and_attack() {
        let mut engine = engine();
        engine.advance();
        engine.advance();
        assert_eq!(engine.enemy_count(), 1);

        let snapshot = engine.snapshot();
        let target = snapshot.enemies[0].position;
        let id = engine.take_id();
        engine.add_unit(id, UnitKind::Marine, Vec2Fixed::from_units(22, 20));
        engine.issue(id, Command::Attack(target)).unwrap();

        for _ in 0..30 {
            engine.advance();
        }
        assert_eq!(engine.enemy_count(), 0);
        assert_eq!(engine.stats().enemies_killed, 1);
    }

    #[test]
    fn test_unknown_unit_rejected() {
        let mut engine = engine();
        assert!(matches!(
            engine.issue(999, Command::Gather(1)),
            Err(AgentError::EngineRejection { unit: 999, .. })
        ));
    }
}
