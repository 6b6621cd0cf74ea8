//! Fixed-point math utilities for deterministic decisions.
//!
//! Every range check the agent makes (spacing, threat radius, gas radius,
//! expansion claims) goes through [`Vec2Fixed`]. Fixed-point arithmetic keeps
//! the decision for a given snapshot identical across platforms.

use fixed::types::I32F32;
use serde::{Deserialize, Serialize};

/// Fixed-point number type for all positions and distances.
///
/// Uses 32 bits for integer part and 32 bits for fractional part.
pub type Fixed = I32F32;

/// Fixed-point 2D vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Vec2Fixed {
    /// X coordinate.
    #[serde(with = "fixed_serde")]
    pub x: Fixed,
    /// Y coordinate.
    #[serde(with = "fixed_serde")]
    pub y: Fixed,
}

/// Serde support for fixed-point numbers.
///
/// Serializes fixed-point numbers as their raw bit representation (i64)
/// to preserve exact precision across serialization boundaries.
pub mod fixed_serde {
    use super::Fixed;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a fixed-point number as its raw bit representation.
    pub fn serialize<S>(value: &Fixed, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        value.to_bits().serialize(serializer)
    }

    /// Deserialize a fixed-point number from its raw bit representation.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Fixed, D::Error>
    where
        D: Deserializer<'de>,
    {
        let bits = i64::deserialize(deserializer)?;
        Ok(Fixed::from_bits(bits))
    }
}

impl Vec2Fixed {
    /// Create a new fixed-point vector.
    #[must_use]
    pub const fn new(x: Fixed, y: Fixed) -> Self {
        Self { x, y }
    }

    /// Create a vector from whole world units.
    #[must_use]
    pub fn from_units(x: i32, y: i32) -> Self {
        Self::new(Fixed::from_num(x), Fixed::from_num(y))
    }

    /// Zero vector.
    pub const ZERO: Self = Self {
        x: Fixed::ZERO,
        y: Fixed::ZERO,
    };

    /// Calculate squared distance (avoids sqrt for comparisons).
    ///
    /// Saturates instead of overflowing for points at opposite map corners.
    #[must_use]
    pub fn distance_squared(self, other: Self) -> Fixed {
        let dx = self.x.saturating_sub(other.x);
        let dy = self.y.saturating_sub(other.y);
        dx.saturating_mul(dx).saturating_add(dy.saturating_mul(dy))
    }

    /// Strictly closer than `radius` to `other`.
    ///
    /// Mirrors the engine's "closer than" filter: a point exactly `radius`
    /// away is *not* within range.
    #[must_use]
    pub fn is_closer_than(self, other: Self, radius: Fixed) -> bool {
        self.distance_squared(other) < radius.saturating_mul(radius)
    }

    /// Strictly farther than `radius` from `other`.
    #[must_use]
    pub fn is_farther_than(self, other: Self, radius: Fixed) -> bool {
        self.distance_squared(other) > radius.saturating_mul(radius)
    }
}

impl std::ops::Add for Vec2Fixed {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
        }
    }
}

impl std::ops::Sub for Vec2Fixed {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
        }
    }
}

/// Pick the candidate nearest to `origin`.
///
/// Ties keep the earliest candidate, so the result only depends on the
/// iteration order of `candidates`.
pub fn nearest_to<T, I, F>(origin: Vec2Fixed, candidates: I, position: F) -> Option<T>
where
    I: IntoIterator<Item = T>,
    F: Fn(&T) -> Vec2Fixed,
{
    let mut best: Option<(Fixed, T)> = None;
    for candidate in candidates {
        let dist = origin.distance_squared(position(&candidate));
        match &best {
            Some((best_dist, _)) if *best_dist <= dist => {}
            _ => best = Some((dist, candidate)),
        }
    }
    best.map(|(_, candidate)| candidate)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec2_distance_squared() {
        let a = Vec2Fixed::from_units(3, 0);
        let b = Vec2Fixed::from_units(0, 4);
        // 3² + 4² = 25
        assert_eq!(a.distance_squared(b), Fixed::from_num(25));
    }

    #[test]
    fn test_closer_than_is_strict() {
        let a = Vec2Fixed::ZERO;
        let b = Vec2Fixed::from_units(15, 0);
        assert!(!a.is_closer_than(b, Fixed::from_num(15)));
        assert!(a.is_closer_than(b, Fixed::from_num(16)));
        assert!(a.is_farther_than(b, Fixed::from_num(10)));
        assert!(!a.is_farther_than(b, Fixed::from_num(15)));
    }

    #[test]
    fn test_distance_saturates() {
        let a = Vec2Fixed::from_units(i32::MIN / 2, i32::MIN / 2);
        let b = Vec2Fixed::from_units(i32::MAX / 2, i32::MAX / 2);
        assert_eq!(a.distance_squared(b), Fixed::MAX);
    }

    #[test]
    fn test_nearest_to_prefers_first_on_tie() {
        let points = [
            ("east", Vec2Fixed::from_units(5, 0)),
            ("west", Vec2Fixed::from_units(-5, 0)),
            ("far", Vec2Fixed::from_units(50, 0)),
        ];
        let picked = nearest_to(Vec2Fixed::ZERO, points.iter(), |(_, p)| *p);
        assert_eq!(picked.map(|(name, _)| *name), Some("east"));
    }

    #[test]
    fn test_nearest_to_empty() {
        let none: Option<&Vec2Fixed> = nearest_to(Vec2Fixed::ZERO, [].iter(), |p| **p);
        assert!(none.is_none());
    }
}
