//! Static agent configuration: caps, costs, radii and spacing.
//!
//! Everything here is supplied once at construction and never derived from
//! game state. Configs can be written as RON:
//!
//! ```ron
//! (
//!     caps: (workers: 60, marines: 40),
//!     building_spacing: 4,
//!     seed: 7,
//! )
//! ```
//!
//! Omitted fields fall back to [`AgentConfig::default`].

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AgentError, Result};
use crate::kind::UnitKind;
use crate::math::Fixed;

/// Per-kind count ceilings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Caps {
    /// Worker limit.
    pub workers: u32,
    /// Light infantry limit.
    pub marines: u32,
    /// Fast attack vehicle limit.
    pub hellions: u32,
    /// Aerial transport limit.
    pub transports: u32,
    /// Aerial fighter limit.
    pub vikings: u32,
    /// Base limit for the expansion policy.
    pub bases: u32,
    /// Primary producer limit.
    pub barracks: u32,
    /// Air producer limit.
    pub starports: u32,
    /// Ground-vehicle producer limit.
    pub factories: u32,
    /// Upgrade structure limit.
    pub armories: u32,
    /// Infantry upgrade structure limit.
    pub engineering_bays: u32,
}

impl Default for Caps {
    fn default() -> Self {
        Self {
            workers: 50,
            marines: 50,
            hellions: 20,
            transports: 8,
            vikings: 20,
            bases: 3,
            barracks: 2,
            starports: 2,
            factories: 2,
            armories: 3,
            engineering_bays: 2,
        }
    }
}

impl Caps {
    /// Ceiling for a kind, `None` when the kind is uncapped.
    #[must_use]
    pub const fn cap(&self, kind: UnitKind) -> Option<u32> {
        match kind {
            UnitKind::Scv => Some(self.workers),
            UnitKind::Marine => Some(self.marines),
            UnitKind::Hellion => Some(self.hellions),
            UnitKind::Medivac => Some(self.transports),
            UnitKind::VikingFighter => Some(self.vikings),
            UnitKind::CommandCenter => Some(self.bases),
            UnitKind::Barracks => Some(self.barracks),
            UnitKind::Starport => Some(self.starports),
            UnitKind::Factory => Some(self.factories),
            UnitKind::Armory => Some(self.armories),
            UnitKind::EngineeringBay => Some(self.engineering_bays),
            UnitKind::SupplyDepot | UnitKind::Refinery | UnitKind::Other(_) => None,
        }
    }
}

/// Price of a kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Cost {
    /// Mineral cost.
    pub minerals: i32,
    /// Gas cost.
    pub gas: i32,
    /// Supply consumed once trained.
    pub supply: i32,
}

impl Cost {
    /// Create a cost.
    #[must_use]
    pub const fn new(minerals: i32, gas: i32, supply: i32) -> Self {
        Self {
            minerals,
            gas,
            supply,
        }
    }
}

/// Prices for every kind the agent commits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CostTable(BTreeMap<UnitKind, Cost>);

impl Default for CostTable {
    fn default() -> Self {
        Self(
            [
                (UnitKind::Scv, Cost::new(50, 0, 1)),
                (UnitKind::Marine, Cost::new(50, 0, 1)),
                (UnitKind::Hellion, Cost::new(100, 0, 2)),
                (UnitKind::Medivac, Cost::new(100, 100, 2)),
                (UnitKind::VikingFighter, Cost::new(150, 75, 2)),
                (UnitKind::CommandCenter, Cost::new(400, 0, 0)),
                (UnitKind::SupplyDepot, Cost::new(100, 0, 0)),
                (UnitKind::Refinery, Cost::new(75, 0, 0)),
                (UnitKind::Barracks, Cost::new(150, 0, 0)),
                (UnitKind::Factory, Cost::new(150, 100, 0)),
                (UnitKind::Starport, Cost::new(150, 100, 0)),
                (UnitKind::Armory, Cost::new(150, 100, 0)),
                (UnitKind::EngineeringBay, Cost::new(125, 0, 0)),
            ]
            .into_iter()
            .collect(),
        )
    }
}

impl CostTable {
    /// Cost of a kind. Unknown kinds are free.
    #[must_use]
    pub fn get(&self, kind: UnitKind) -> Cost {
        self.0.get(&kind).copied().unwrap_or_default()
    }

    /// Override the cost of a kind.
    #[must_use]
    pub fn with(mut self, kind: UnitKind, cost: Cost) -> Self {
        self.0.insert(kind, cost);
        self
    }
}

/// Full agent configuration.
///
/// Distances are in whole world units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Count ceilings.
    pub caps: Caps,
    /// Prices.
    pub costs: CostTable,
    /// Minimum distance between a new structure and any owned structure.
    pub building_spacing: u32,
    /// Supply headroom below which a supply structure is requested.
    pub supply_threshold: i32,
    /// Search radius for standard structure placement.
    pub placement_radius: u32,
    /// Search radius around an expansion site.
    pub expansion_placement_radius: u32,
    /// Gas nodes this close to a ready base get an extractor.
    pub gas_radius: u32,
    /// An expansion site with an owned base this close is claimed.
    pub expansion_claim_radius: u32,
    /// Enemies this close to the reference structure trigger a response.
    pub threat_radius: u32,
    /// Idle workers farther than this from the start get sent to minerals.
    pub worker_rally_radius: u32,
    /// An extractor this close to a gas node occupies it.
    pub extractor_occupancy_radius: u32,
    /// Seed for the combat reflex's structure pick.
    pub seed: u64,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            caps: Caps::default(),
            costs: CostTable::default(),
            building_spacing: 3,
            supply_threshold: 5,
            placement_radius: 10,
            expansion_placement_radius: 20,
            gas_radius: 20,
            expansion_claim_radius: 10,
            threat_radius: 15,
            worker_rally_radius: 10,
            extractor_occupancy_radius: 1,
            seed: 0,
        }
    }
}

impl AgentConfig {
    /// Load a config from a RON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| AgentError::ConfigRead {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_ron_str(&contents)
    }

    /// Load a config from a RON string.
    pub fn from_ron_str(ron: &str) -> Result<Self> {
        let config: Self = ron::from_str(ron)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configs no policy could work with.
    pub fn validate(&self) -> Result<()> {
        let radii = [
            ("placement_radius", self.placement_radius),
            ("expansion_placement_radius", self.expansion_placement_radius),
            ("gas_radius", self.gas_radius),
            ("expansion_claim_radius", self.expansion_claim_radius),
            ("threat_radius", self.threat_radius),
            ("extractor_occupancy_radius", self.extractor_occupancy_radius),
        ];
        if let Some((name, _)) = radii.iter().find(|(_, value)| *value == 0) {
            return Err(AgentError::InvalidConfig(format!("{name} must be positive")));
        }
        if let Some(kind) = UnitKind::NAMED.into_iter().find(|kind| {
            let cost = self.costs.get(*kind);
            cost.minerals < 0 || cost.gas < 0 || cost.supply < 0
        }) {
            return Err(AgentError::InvalidConfig(format!("{kind} has a negative cost")));
        }
        Ok(())
    }

    /// Whole-unit distance as [`Fixed`].
    #[must_use]
    pub fn units(distance: u32) -> Fixed {
        Fixed::from_num(distance)
    }
}
