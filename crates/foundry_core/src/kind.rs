//! Unit and structure kind tags plus capability flags.
//!
//! The engine's numeric identifiers are opaque to the agent. [`UnitKind`]
//! names the kinds the build order reasons about and carries everything else
//! as [`UnitKind::Other`].

use serde::{Deserialize, Serialize};

/// Kind tag of a unit or structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum UnitKind {
    /// Worker: gathers and constructs.
    Scv,
    /// Light infantry trained at a barracks.
    Marine,
    /// Fast attack vehicle trained at a factory.
    Hellion,
    /// Aerial transport trained at a starport.
    Medivac,
    /// Aerial fighter trained at a starport.
    VikingFighter,
    /// Base (town hall). Trains workers.
    CommandCenter,
    /// Supply structure.
    SupplyDepot,
    /// Gas extractor, built on top of a gas node.
    Refinery,
    /// Primary combat-unit producer.
    Barracks,
    /// Ground-vehicle producer.
    Factory,
    /// Air producer.
    Starport,
    /// Vehicle upgrade structure.
    Armory,
    /// Infantry upgrade structure.
    EngineeringBay,
    /// Any engine kind the agent has no rule for.
    Other(u16),
}

impl UnitKind {
    /// Every named kind, in declaration order.
    pub const NAMED: [Self; 13] = [
        Self::Scv,
        Self::Marine,
        Self::Hellion,
        Self::Medivac,
        Self::VikingFighter,
        Self::CommandCenter,
        Self::SupplyDepot,
        Self::Refinery,
        Self::Barracks,
        Self::Factory,
        Self::Starport,
        Self::Armory,
        Self::EngineeringBay,
    ];

    /// Whether this kind is a structure.
    #[must_use]
    pub const fn is_structure(self) -> bool {
        matches!(
            self,
            Self::CommandCenter
                | Self::SupplyDepot
                | Self::Refinery
                | Self::Barracks
                | Self::Factory
                | Self::Starport
                | Self::Armory
                | Self::EngineeringBay
        )
    }

    /// Whether this kind is a base (town hall).
    #[must_use]
    pub const fn is_base(self) -> bool {
        matches!(self, Self::CommandCenter)
    }

    /// The structure kind that trains this unit, if any.
    #[must_use]
    pub const fn producer(self) -> Option<Self> {
        match self {
            Self::Scv => Some(Self::CommandCenter),
            Self::Marine => Some(Self::Barracks),
            Self::Hellion => Some(Self::Factory),
            Self::Medivac | Self::VikingFighter => Some(Self::Starport),
            _ => None,
        }
    }

    /// Capability flags an engine would typically report for this kind.
    #[must_use]
    pub const fn default_capabilities(self) -> Capabilities {
        match self {
            Self::Scv => Capabilities::CAN_GATHER,
            Self::Marine | Self::Hellion => Capabilities::CAN_ATTACK_GROUND,
            Self::Medivac | Self::VikingFighter | Self::Other(_) => Capabilities::NONE,
            _ => Capabilities::IS_STRUCTURE,
        }
    }

    /// Short lowercase name, used in logs and metrics.
    #[must_use]
    pub const fn short_name(self) -> &'static str {
        match self {
            Self::Scv => "scv",
            Self::Marine => "marine",
            Self::Hellion => "hellion",
            Self::Medivac => "medivac",
            Self::VikingFighter => "viking",
            Self::CommandCenter => "command_center",
            Self::SupplyDepot => "supply_depot",
            Self::Refinery => "refinery",
            Self::Barracks => "barracks",
            Self::Factory => "factory",
            Self::Starport => "starport",
            Self::Armory => "armory",
            Self::EngineeringBay => "engineering_bay",
            Self::Other(_) => "other",
        }
    }
}

impl std::fmt::Display for UnitKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Other(id) => write!(f, "other#{id}"),
            _ => f.write_str(self.short_name()),
        }
    }
}

/// Bitflags describing what a unit can do.
///
/// Reported by the engine per unit; the agent never derives them from the
/// kind tag on its own.
///
/// # Example
///
/// ```
/// use foundry_core::kind::Capabilities;
///
/// let caps = Capabilities::CAN_GATHER | Capabilities::CAN_ATTACK_GROUND;
/// assert!(caps.contains(Capabilities::CAN_GATHER));
/// assert!(!caps.contains(Capabilities::IS_STRUCTURE));
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Capabilities(u8);

impl Capabilities {
    /// No capabilities.
    pub const NONE: Self = Self(0);
    /// Can harvest from resource nodes.
    pub const CAN_GATHER: Self = Self(1 << 0);
    /// Can attack ground targets.
    pub const CAN_ATTACK_GROUND: Self = Self(1 << 1);
    /// Is a structure.
    pub const IS_STRUCTURE: Self = Self(1 << 2);

    /// Raw bit value.
    #[must_use]
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Union of two flag sets.
    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Whether every flag in `other` is set.
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl std::ops::BitOr for Capabilities {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        self.union(rhs)
    }
}

impl std::ops::BitOrAssign for Capabilities {
    fn bitor_assign(&mut self, rhs: Self) {
        *self = self.union(rhs);
    }
}
