//! Half-edges, undirected edge identity, and triangles
//!
//! Every undirected mesh edge is stored as two oppositely-directed
//! half-edges that are twins of each other, created and destroyed together.
//! The canonical lookup key for an edge is the normalized (min, max) pair of
//! its endpoint ids, so (A, B) and (B, A) resolve to the same entity.

use slotmap::new_key_type;

use super::point::PointId;

new_key_type! {
    /// Arena key for a half-edge
    pub struct HalfEdgeKey;

    /// Arena key for a triangle
    pub struct TriangleKey;
}

/// One direction of an undirected mesh edge
#[derive(Debug, Clone, Copy)]
pub struct HalfEdge {
    /// Origin point
    pub from: PointId,
    /// Target point
    pub to: PointId,
    /// The oppositely-directed half-edge between the same two points
    pub twin: HalfEdgeKey,
    /// Triangle lying to the left of this half-edge, if any
    pub triangle: Option<TriangleKey>,
}

/// Normalized unordered identity for an undirected edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeKey(PointId, PointId);

impl EdgeKey {
    /// Build the canonical (min, max) key for an edge between two points
    #[inline]
    pub fn new(a: PointId, b: PointId) -> Self {
        if a <= b {
            EdgeKey(a, b)
        } else {
            EdgeKey(b, a)
        }
    }

    /// Smaller endpoint id
    #[inline]
    pub fn a(self) -> PointId {
        self.0
    }

    /// Larger endpoint id
    #[inline]
    pub fn b(self) -> PointId {
        self.1
    }

    /// Whether the edge touches the given point
    #[inline]
    pub fn contains(self, point: PointId) -> bool {
        self.0 == point || self.1 == point
    }

    /// The endpoint opposite to `point`, or None if the edge does not touch it
    #[inline]
    pub fn other(self, point: PointId) -> Option<PointId> {
        if self.0 == point {
            Some(self.1)
        } else if self.1 == point {
            Some(self.0)
        } else {
            None
        }
    }
}

/// A registered mesh triangle: exactly 3 points and their 3 bounding edges
#[derive(Debug, Clone, Copy)]
pub struct Triangle {
    /// Corner points in winding order
    pub points: [PointId; 3],
    /// Edge keys for the three sides (points[i] -> points[(i + 1) % 3])
    pub edges: [EdgeKey; 3],
}

impl Triangle {
    /// Edge keys for a corner triple, in side order
    #[inline]
    pub fn edge_keys(points: [PointId; 3]) -> [EdgeKey; 3] {
        [
            EdgeKey::new(points[0], points[1]),
            EdgeKey::new(points[1], points[2]),
            EdgeKey::new(points[2], points[0]),
        ]
    }

    /// Whether the triangle uses the given point as a corner
    #[inline]
    pub fn contains_point(&self, point: PointId) -> bool {
        self.points.contains(&point)
    }

    /// The corner opposite to the given edge, if the edge is one of this
    /// triangle's sides
    pub fn opposite_point(&self, edge: EdgeKey) -> Option<PointId> {
        if !self.edges.contains(&edge) {
            return None;
        }
        self.points
            .iter()
            .copied()
            .find(|&p| !edge.contains(p))
    }
}
