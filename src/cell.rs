//! Voronoi Cell Structure
//!
//! Represents a base point's dual polygon on the planet surface, with its
//! fan triangulation, continent membership, and tectonic state.

use glam::{Vec2, Vec3};
use std::collections::HashMap;

use crate::topology::{EdgeKey, PointId, TriangleKey};

/// Biome tag assigned to points and cells from the final height field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Biome {
    /// Below sea level
    Ocean,
    /// Land within the coastal band above sea level
    Coast,
    /// General lowland
    Plains,
    /// Elevated terrain
    Mountain,
}

impl Biome {
    /// Classify a height value against a sea level and mountain threshold
    pub fn from_height(height: f32, sea_level: f32, mountain_level: f32) -> Self {
        if height < sea_level {
            Biome::Ocean
        } else if height < sea_level + 0.1 * (mountain_level - sea_level) {
            Biome::Coast
        } else if height < mountain_level {
            Biome::Plains
        } else {
            Biome::Mountain
        }
    }

    /// Check if this biome is water
    pub fn is_water(&self) -> bool {
        matches!(self, Biome::Ocean)
    }

    /// Check if this biome is land
    pub fn is_land(&self) -> bool {
        !self.is_water()
    }
}

/// A single Voronoi cell: the dual polygon around one base mesh point
///
/// The polygon's corners are the circumcenters of the base point's incident
/// triangles, ordered counter-clockwise around the site and re-triangulated
/// into a fan for area and adjacency purposes.
#[derive(Debug, Clone)]
pub struct VoronoiCell {
    /// Unique identifier for this cell (0 to cell_count-1)
    pub id: usize,

    /// The base mesh point this cell is dual to
    pub site: PointId,

    /// Site position on the sphere surface
    pub center: Vec3,

    /// Circumcenter points forming the cell polygon, ordered counter-clockwise
    pub polygon: Vec<PointId>,

    /// Fan triangles committed to the topology store for this polygon
    pub fan: Vec<TriangleKey>,

    /// Edge keys along the polygon boundary (consecutive polygon corners)
    pub border_edges: Vec<EdgeKey>,

    /// Continent this cell belongs to (assigned by the flood fill)
    pub continent: Option<usize>,

    /// Whether any neighboring cell belongs to a different continent
    pub is_border: bool,

    /// For each boundary edge shared with a different continent, that
    /// continent's id
    pub boundary_neighbors: HashMap<EdgeKey, usize>,

    /// Cell height (base continent height plus stress deltas)
    pub height: f32,

    /// 2D movement vector in the owning continent's tangent basis
    pub movement: Vec2,

    /// Biome tag assigned after the height pass
    pub biome: Option<Biome>,
}

impl VoronoiCell {
    /// Create a new cell with geometry only; tectonic state is filled in by
    /// the continent and stress passes
    pub fn new(
        id: usize,
        site: PointId,
        center: Vec3,
        polygon: Vec<PointId>,
        fan: Vec<TriangleKey>,
        border_edges: Vec<EdgeKey>,
    ) -> Self {
        Self {
            id,
            site,
            center,
            polygon,
            fan,
            border_edges,
            continent: None,
            is_border: false,
            boundary_neighbors: HashMap::new(),
            height: 0.0,
            movement: Vec2::ZERO,
            biome: None,
        }
    }

    /// Number of polygon corners
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.polygon.len()
    }

    /// Approximate the cell's surface area from corner positions
    ///
    /// Treats the polygon as flat triangles fanned from the center; good
    /// enough for statistics, not a spherical-excess computation.
    pub fn approximate_area(&self, positions: &[Vec3]) -> f32 {
        if positions.len() < 3 {
            return 0.0;
        }
        let mut area = 0.0;
        for i in 0..positions.len() {
            let v1 = positions[i] - self.center;
            let v2 = positions[(i + 1) % positions.len()] - self.center;
            area += v1.cross(v2).length() * 0.5;
        }
        area
    }

    /// Great-circle distance to another cell's center
    pub fn distance_to(&self, other: &VoronoiCell, sphere_radius: f32) -> f32 {
        let cos_angle = self.center.dot(other.center)
            / (self.center.length() * other.center.length());
        sphere_radius * cos_angle.clamp(-1.0, 1.0).acos()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn geometry_cell(center: Vec3) -> VoronoiCell {
        VoronoiCell::new(0, PointId(0), center, vec![], vec![], vec![])
    }

    #[test]
    fn test_biome_classification() {
        assert_eq!(Biome::from_height(-1.0, 0.0, 5.0), Biome::Ocean);
        assert_eq!(Biome::from_height(0.2, 0.0, 5.0), Biome::Coast);
        assert_eq!(Biome::from_height(2.0, 0.0, 5.0), Biome::Plains);
        assert_eq!(Biome::from_height(6.0, 0.0, 5.0), Biome::Mountain);
    }

    #[test]
    fn test_biome_helpers() {
        assert!(Biome::Ocean.is_water());
        assert!(!Biome::Ocean.is_land());
        assert!(Biome::Coast.is_land());
        assert!(Biome::Plains.is_land());
        assert!(Biome::Mountain.is_land());
    }

    #[test]
    fn test_approximate_area() {
        let cell = geometry_cell(Vec3::new(10.0, 0.0, 0.0));
        let corners = vec![
            Vec3::new(10.0, 1.0, 0.0),
            Vec3::new(10.0, 0.0, 1.0),
            Vec3::new(10.0, -1.0, 0.0),
            Vec3::new(10.0, 0.0, -1.0),
        ];
        let area = cell.approximate_area(&corners);
        assert!(area > 0.0);
        assert!(area < 10.0);
    }

    #[test]
    fn test_distance_to() {
        let cell1 = geometry_cell(Vec3::new(10.0, 0.0, 0.0));
        let cell2 = geometry_cell(Vec3::new(0.0, 10.0, 0.0));

        let distance = cell1.distance_to(&cell2, 10.0);
        let expected = 10.0 * std::f32::consts::FRAC_PI_2;
        assert!((distance - expected).abs() < 0.01);
    }

    #[test]
    fn test_new_cell_has_no_tectonic_state() {
        let cell = geometry_cell(Vec3::X);
        assert!(cell.continent.is_none());
        assert!(!cell.is_border);
        assert!(cell.boundary_neighbors.is_empty());
        assert_eq!(cell.movement, Vec2::ZERO);
    }
}
