//! Scenario loading and configuration.
//!
//! A scenario describes the starting world for the sandbox engine: the map,
//! bases and workers, resource fields, expansion sites, economy rates and
//! scripted enemy waves. Coordinates are whole world units.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for scenario operations.
#[derive(Error, Debug)]
pub enum ScenarioError {
    /// File not found.
    #[error("Scenario file not found: {0}")]
    FileNotFound(String),
    /// Failed to read file.
    #[error("Failed to read scenario file: {0}")]
    ReadError(#[from] std::io::Error),
    /// Failed to parse RON.
    #[error("Failed to parse scenario: {0}")]
    ParseError(#[from] ron::error::SpannedError),
    /// Parsed but unusable.
    #[error("Invalid scenario: {0}")]
    Invalid(String),
}

/// A resource node placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeSetup {
    /// Position.
    pub at: (i32, i32),
    /// Amount in the node.
    pub amount: i32,
}

impl NodeSetup {
    /// Create a node placement.
    #[must_use]
    pub const fn new(x: i32, y: i32, amount: i32) -> Self {
        Self {
            at: (x, y),
            amount,
        }
    }
}

/// A group of enemies that appears at a given tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnemyWave {
    /// Tick the wave spawns on.
    pub tick: u64,
    /// Number of enemies.
    pub count: u32,
    /// Spawn center.
    pub at: (i32, i32),
    /// Seeded jitter applied to each spawn, in whole units.
    #[serde(default)]
    pub jitter: i32,
}

/// Gathering and construction rates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EconomySetup {
    /// Ticks between deliveries for one gatherer.
    pub trip_ticks: u64,
    /// Minerals per delivery.
    pub minerals_per_trip: i32,
    /// Gas per delivery.
    pub gas_per_trip: i32,
    /// Workers a refinery employs automatically once complete.
    pub workers_per_refinery: u32,
    /// Supply ceiling.
    pub max_supply: i32,
}

impl Default for EconomySetup {
    fn default() -> Self {
        Self {
            trip_ticks: 8,
            minerals_per_trip: 5,
            gas_per_trip: 4,
            workers_per_refinery: 3,
            max_supply: 200,
        }
    }
}

/// A complete scenario configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    /// Scenario name.
    pub name: String,
    /// Human-readable description.
    #[serde(default)]
    pub description: String,
    /// Map dimensions (width, height) in world units.
    pub map_size: (u32, u32),
    /// Completed bases at start. The first one is the start location.
    pub bases: Vec<(i32, i32)>,
    /// Workers spawned next to the first base.
    pub workers: u32,
    /// Starting minerals.
    pub minerals: i32,
    /// Starting gas.
    #[serde(default)]
    pub gas: i32,
    /// Mineral patches.
    pub mineral_fields: Vec<NodeSetup>,
    /// Gas nodes.
    #[serde(default)]
    pub geysers: Vec<NodeSetup>,
    /// Expansion sites, in the order the engine reports them.
    #[serde(default)]
    pub expansion_sites: Vec<(i32, i32)>,
    /// Scripted enemy waves.
    #[serde(default)]
    pub waves: Vec<EnemyWave>,
    /// Economy rates.
    #[serde(default)]
    pub economy: EconomySetup,
}

impl Default for Scenario {
    fn default() -> Self {
        Self::standard()
    }
}

impl Scenario {
    /// Load a scenario from a RON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ScenarioError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ScenarioError::FileNotFound(path.display().to_string()));
        }
        let contents = std::fs::read_to_string(path)?;
        Self::from_ron_str(&contents)
    }

    /// Built-in scenario by name, otherwise a RON file path.
    pub fn resolve(name_or_path: &str) -> Result<Self, ScenarioError> {
        match name_or_path {
            "standard" => Ok(Self::standard()),
            path => Self::load(path),
        }
    }

    /// Load from a RON string (useful for embedded scenarios).
    pub fn from_ron_str(ron: &str) -> Result<Self, ScenarioError> {
        let scenario: Scenario = ron::from_str(ron)?;
        scenario.validate()?;
        Ok(scenario)
    }

    /// Reject scenarios the sandbox cannot start from.
    pub fn validate(&self) -> Result<(), ScenarioError> {
        if self.bases.is_empty() {
            return Err(ScenarioError::Invalid("at least one base is required".into()));
        }
        if self.map_size.0 == 0 || self.map_size.1 == 0 {
            return Err(ScenarioError::Invalid("map size must be positive".into()));
        }
        if self.economy.trip_ticks == 0 {
            return Err(ScenarioError::Invalid("trip_ticks must be positive".into()));
        }
        let (w, h) = (self.map_size.0 as i32, self.map_size.1 as i32);
        let outside = |&(x, y): &(i32, i32)| x < 0 || y < 0 || x >= w || y >= h;
        if self.bases.iter().any(outside) || self.expansion_sites.iter().any(outside) {
            return Err(ScenarioError::Invalid("position outside the map".into()));
        }
        Ok(())
    }

    /// Start location (the first base).
    #[must_use]
    pub fn start(&self) -> (i32, i32) {
        self.bases.first().copied().unwrap_or_default()
    }

    /// One main base with a natural and a third, two enemy waves.
    #[must_use]
    pub fn standard() -> Self {
        let mut mineral_fields = Vec::new();
        for (bx, by) in [(40, 40), (100, 40), (40, 100)] {
            for i in 0..8 {
                mineral_fields.push(NodeSetup::new(bx - 8, by - 4 + i, 1500));
            }
        }
        Self {
            name: "standard".to_string(),
            description: "Main base, two open expansions, two enemy waves".to_string(),
            map_size: (160, 160),
            bases: vec![(40, 40)],
            workers: 12,
            minerals: 50,
            gas: 0,
            mineral_fields,
            geysers: vec![
                NodeSetup::new(47, 32, 2250),
                NodeSetup::new(47, 48, 2250),
                NodeSetup::new(107, 32, 2250),
                NodeSetup::new(107, 48, 2250),
            ],
            expansion_sites: vec![(40, 40), (100, 40), (40, 100)],
            waves: vec![
                EnemyWave {
                    tick: 600,
                    count: 4,
                    at: (52, 52),
                    jitter: 2,
                },
                EnemyWave {
                    tick: 1400,
                    count: 10,
                    at: (50, 46),
                    jitter: 3,
                },
            ],
            economy: EconomySetup::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_is_valid() {
        assert!(Scenario::standard().validate().is_ok());
    }

    #[test]
    fn test_from_ron_minimal() {
        let scenario = Scenario::from_ron_str(
            r#"(
                name: "tiny",
                map_size: (64, 64),
                bases: [(10, 10)],
                workers: 2,
                minerals: 100,
                mineral_fields: [(at: (4, 10), amount: 500)],
            )"#,
        )
        .unwrap();
        assert_eq!(scenario.start(), (10, 10));
        assert!(scenario.waves.is_empty());
        assert_eq!(scenario.economy, EconomySetup::default());
    }

    #[test]
    fn test_rejects_baseless_scenario() {
        let result = Scenario::from_ron_str(
            r#"(name: "none", map_size: (64, 64), bases: [], workers: 0, minerals: 0, mineral_fields: [])"#,
        );
        assert!(matches!(result, Err(ScenarioError::Invalid(_))));
    }

    #[test]
    fn test_resolve_builtin() {
        assert_eq!(Scenario::resolve("standard").unwrap(), Scenario::standard());
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            Scenario::load("/definitely/not/here.ron"),
            Err(ScenarioError::FileNotFound(_))
        ));
    }
}
