//! Deduplicated point registry records
//!
//! A point's identity is a pure function of its quantized position: asking
//! the store for a point at a previously-seen (quantized) position returns
//! the existing entry. Points are arena-allocated and never destroyed.

use glam::Vec3;
use std::collections::HashSet;

use super::half_edge::HalfEdgeKey;
use crate::cell::Biome;

/// Quantization precision: positions are rounded to this many world units
/// before hashing, so points closer than half a step collapse to one entry.
const QUANTIZE_STEP: f32 = 1.0e-4;

/// Stable identifier for a point in the registry
///
/// Indices are assigned in creation order and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PointId(pub u32);

impl PointId {
    /// Arena index for this point
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Hashable key derived from a quantized position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PositionKey(i64, i64, i64);

/// Quantize a position to its registry key
///
/// Deterministic: equal positions always map to equal keys, and positions
/// within the quantization step of each other usually collide (that is the
/// dedup mechanism, not an error).
pub fn quantize_position(position: Vec3) -> PositionKey {
    let q = |v: f32| (v / QUANTIZE_STEP).round() as i64;
    PositionKey(q(position.x), q(position.y), q(position.z))
}

/// A mesh point with its mutable simulation state
///
/// Created during base-mesh population or subdivision, mutated in place by
/// the deformation and height passes, freed only with the whole store.
#[derive(Debug, Clone)]
pub struct Point {
    /// Stable identity (also the arena index)
    pub id: PointId,

    /// Position on the sphere surface
    pub position: Vec3,

    /// Terrain height accumulated by the stress engine
    pub height: f32,

    /// Biome tag assigned after the height pass
    pub biome: Option<Biome>,

    /// Ids of the continents whose cells use this point
    pub continents: HashSet<usize>,

    /// Excluded from future random draws once consumed by deformation
    pub used: bool,

    /// Half-edges whose origin is this point
    pub(crate) outgoing: Vec<HalfEdgeKey>,
}

impl Point {
    pub(crate) fn new(id: PointId, position: Vec3) -> Self {
        Self {
            id,
            position,
            height: 0.0,
            biome: None,
            continents: HashSet::new(),
            used: false,
            outgoing: Vec::new(),
        }
    }

    /// Number of half-edges leaving this point
    #[inline]
    pub fn degree(&self) -> usize {
        self.outgoing.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quantize_identical_positions() {
        let a = quantize_position(Vec3::new(1.0, 2.0, 3.0));
        let b = quantize_position(Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(a, b);
    }

    #[test]
    fn test_quantize_sub_step_positions_collide() {
        let a = quantize_position(Vec3::new(1.0, 2.0, 3.0));
        let b = quantize_position(Vec3::new(1.0 + 0.4 * QUANTIZE_STEP, 2.0, 3.0));
        assert_eq!(a, b);
    }

    #[test]
    fn test_quantize_distinct_positions_differ() {
        let a = quantize_position(Vec3::new(1.0, 2.0, 3.0));
        let b = quantize_position(Vec3::new(1.0 + 10.0 * QUANTIZE_STEP, 2.0, 3.0));
        assert_ne!(a, b);
    }
}
