//! The shared topology store and its mutex wrapper
//!
//! One owning store holds every registry (points, half-edges, triangles,
//! edge indexes) so they cannot drift out of sync. All mutation and lookup
//! goes through `SharedStore`, which serializes access behind a single
//! process-wide mutex: callers never observe partial state, but compound
//! edits (an edge flip replaces 5 edges and rewires 2 triangles) must hold
//! one guard across the whole sequence.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use glam::Vec3;
use slotmap::SlotMap;

use super::half_edge::{EdgeKey, HalfEdge, HalfEdgeKey, Triangle, TriangleKey};
use super::point::{quantize_position, Point, PointId, PositionKey};
use crate::error::{PlanetError, Result};

/// Pipeline phase gate
///
/// The dual build and stress passes run strictly after all base-mesh and
/// deformation work; the phase is a monotonic counter that callers advance
/// and must respect. No concurrent mixing of phases is supported.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum GenerationPhase {
    /// Nothing built yet
    #[default]
    Ungenerated,
    /// Base icosahedron mesh populated, deformation may run
    BaseMesh,
    /// Dual (Voronoi) construction and later stages
    DualMesh,
}

impl GenerationPhase {
    fn next(self) -> GenerationPhase {
        match self {
            GenerationPhase::Ungenerated => GenerationPhase::BaseMesh,
            GenerationPhase::BaseMesh | GenerationPhase::DualMesh => GenerationPhase::DualMesh,
        }
    }
}

/// Half-edge topology store
///
/// Invariants maintained after every mutation:
/// 1. point identity is a pure function of quantized position
/// 2. every half-edge has a live twin, and `twin.twin == self`
/// 3. an edge key maps to 0-2 triangles, never more
/// 4. removing an edge removes both half-edges and detaches them from the
///    per-point outgoing sets in the same call
#[derive(Debug, Clone, Default)]
pub struct TopologyStore {
    points: Vec<Point>,
    position_index: HashMap<PositionKey, PointId>,
    half_edges: SlotMap<HalfEdgeKey, HalfEdge>,
    edge_pairs: HashMap<EdgeKey, (HalfEdgeKey, HalfEdgeKey)>,
    triangles: SlotMap<TriangleKey, Triangle>,
    edge_triangles: HashMap<EdgeKey, Vec<TriangleKey>>,
    phase: GenerationPhase,
    base_point_count: usize,
}

impl TopologyStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    // ---- points ----------------------------------------------------------

    /// Return the existing point whose quantized key matches the position,
    /// else create and register a new one. Never fails.
    pub fn get_or_create_point(&mut self, position: Vec3) -> PointId {
        let key = quantize_position(position);
        if let Some(&id) = self.position_index.get(&key) {
            return id;
        }
        let id = PointId(self.points.len() as u32);
        self.points.push(Point::new(id, position));
        self.position_index.insert(key, id);
        id
    }

    /// Immutable access to a point record
    #[inline]
    pub fn point(&self, id: PointId) -> &Point {
        &self.points[id.index()]
    }

    /// Mutable access to a point record (height, biome, flags)
    #[inline]
    pub fn point_mut(&mut self, id: PointId) -> &mut Point {
        &mut self.points[id.index()]
    }

    /// Position of a point
    #[inline]
    pub fn position(&self, id: PointId) -> Vec3 {
        self.points[id.index()].position
    }

    /// Number of registered points
    #[inline]
    pub fn num_points(&self) -> usize {
        self.points.len()
    }

    /// All point records in id order
    #[inline]
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    // ---- edges -----------------------------------------------------------

    /// Return the undirected edge between two points, creating the twin
    /// half-edge pair if it does not exist yet
    ///
    /// Endpoint registration is guaranteed by construction: `PointId`s are
    /// only handed out by `get_or_create_point`.
    pub fn get_or_create_edge(&mut self, a: PointId, b: PointId) -> EdgeKey {
        let key = EdgeKey::new(a, b);
        if self.edge_pairs.contains_key(&key) {
            return key;
        }

        let forward = self.half_edges.insert(HalfEdge {
            from: a,
            to: b,
            twin: HalfEdgeKey::default(),
            triangle: None,
        });
        let backward = self.half_edges.insert(HalfEdge {
            from: b,
            to: a,
            twin: forward,
            triangle: None,
        });
        self.half_edges[forward].twin = backward;

        self.points[a.index()].outgoing.push(forward);
        self.points[b.index()].outgoing.push(backward);
        self.edge_pairs.insert(key, (forward, backward));
        key
    }

    /// Whether the undirected edge exists
    #[inline]
    pub fn has_edge(&self, key: EdgeKey) -> bool {
        self.edge_pairs.contains_key(&key)
    }

    /// The twin half-edge pair registered under an edge key
    #[inline]
    pub fn edge_half_edges(&self, key: EdgeKey) -> Option<(HalfEdgeKey, HalfEdgeKey)> {
        self.edge_pairs.get(&key).copied()
    }

    /// Half-edge record lookup
    #[inline]
    pub fn half_edge(&self, key: HalfEdgeKey) -> Option<&HalfEdge> {
        self.half_edges.get(key)
    }

    /// Number of live half-edges (always 2x the undirected edge count)
    #[inline]
    pub fn num_half_edges(&self) -> usize {
        self.half_edges.len()
    }

    /// All undirected edge keys currently registered
    pub fn edge_keys(&self) -> Vec<EdgeKey> {
        self.edge_pairs.keys().copied().collect()
    }

    /// Euclidean length of an edge (0 if it does not exist)
    pub fn edge_length(&self, key: EdgeKey) -> f32 {
        self.position(key.a()).distance(self.position(key.b()))
    }

    /// Recompute both half-edges' triangle back-references from the
    /// triangles registered under the edge key
    ///
    /// Needed after an edge is removed and recreated while a bordering
    /// triangle survived: the fresh half-edge pair starts with no triangle
    /// links.
    pub fn relink_edge_triangles(&mut self, key: EdgeKey) {
        let Some(&(forward, backward)) = self.edge_pairs.get(&key) else {
            return;
        };
        self.half_edges[forward].triangle = None;
        self.half_edges[backward].triangle = None;

        let registered: Vec<TriangleKey> =
            self.edge_triangles.get(&key).cloned().unwrap_or_default();
        for tri in registered {
            let triangle = self.triangles[tri];
            let Some(slot) = triangle.edges.iter().position(|&k| k == key) else {
                continue;
            };
            let from = triangle.points[slot];
            let (wound, other) = if self.half_edges[forward].from == from {
                (forward, backward)
            } else {
                (backward, forward)
            };
            if self.half_edges[wound].triangle.is_none() {
                self.half_edges[wound].triangle = Some(tri);
            } else if self.half_edges[other].triangle.is_none() {
                self.half_edges[other].triangle = Some(tri);
            }
        }
    }

    /// Detach both half-edges of the undirected edge from the per-point
    /// outgoing sets and delete them from the half-edge registry
    ///
    /// Contract: the store does not repair triangles that still reference
    /// the removed edge key. A caller replacing edges (an edge flip) must
    /// re-wire those triangles via [`TopologyStore::update_triangle`] before
    /// further queries are made.
    pub fn remove_edge(&mut self, key: EdgeKey) {
        let Some((forward, backward)) = self.edge_pairs.remove(&key) else {
            return;
        };
        for he_key in [forward, backward] {
            if let Some(he) = self.half_edges.remove(he_key) {
                let outgoing = &mut self.points[he.from.index()].outgoing;
                outgoing.retain(|&k| k != he_key);
            }
        }
    }

    /// All half-edges whose origin is the point
    ///
    /// Each undirected incident edge appears exactly once (its twin is the
    /// incoming direction).
    pub fn incident_half_edges(&self, point: PointId) -> Vec<HalfEdgeKey> {
        self.points[point.index()].outgoing.clone()
    }

    /// Edge keys of all edges incident to the point
    pub fn incident_edge_keys(&self, point: PointId) -> Vec<EdgeKey> {
        self.points[point.index()]
            .outgoing
            .iter()
            .filter_map(|&k| self.half_edges.get(k))
            .map(|he| EdgeKey::new(he.from, he.to))
            .collect()
    }

    /// All triangles that use the point as a corner
    pub fn incident_triangles(&self, point: PointId) -> Vec<TriangleKey> {
        let mut found = Vec::new();
        for key in self.incident_edge_keys(point) {
            if let Some(tris) = self.edge_triangles.get(&key) {
                for &tri in tris {
                    if !found.contains(&tri) {
                        found.push(tri);
                    }
                }
            }
        }
        found
    }

    // ---- triangles -------------------------------------------------------

    /// Create a triangle from exactly 3 distinct points
    ///
    /// Creates or reuses the 3 bounding edges and registers the triangle
    /// under all 3 edge keys.
    ///
    /// # Errors
    ///
    /// `InvalidTopology` if the point count is not 3, the points are not
    /// distinct, or any edge already borders two triangles (manifold
    /// violation — surfaced hard, since ignoring it would corrupt the dual).
    pub fn add_triangle(&mut self, points: &[PointId]) -> Result<TriangleKey> {
        let corners: [PointId; 3] = points.try_into().map_err(|_| {
            PlanetError::InvalidTopology(format!(
                "triangle requires exactly 3 points, got {}",
                points.len()
            ))
        })?;
        if corners[0] == corners[1] || corners[1] == corners[2] || corners[0] == corners[2] {
            return Err(PlanetError::InvalidTopology(
                "triangle points must be distinct".into(),
            ));
        }

        let edges = Triangle::edge_keys(corners);
        for &key in &edges {
            self.get_or_create_edge(key.a(), key.b());
            if self.edge_triangles.get(&key).map_or(0, Vec::len) >= 2 {
                return Err(PlanetError::InvalidTopology(format!(
                    "edge {:?}-{:?} already borders two triangles",
                    key.a(),
                    key.b()
                )));
            }
        }

        let tri = self.triangles.insert(Triangle {
            points: corners,
            edges,
        });
        self.register_triangle(tri);
        Ok(tri)
    }

    /// Replace a triangle's corner points and re-register it everywhere it
    /// is indexed (triangle arena, all 3 edge-key lists) in one step
    ///
    /// # Errors
    ///
    /// `InvalidTopology` if the triangle does not exist, the new points are
    /// not distinct, or a new edge already borders two other triangles.
    pub fn update_triangle(&mut self, tri: TriangleKey, points: [PointId; 3]) -> Result<()> {
        if !self.triangles.contains_key(tri) {
            return Err(PlanetError::InvalidTopology(
                "cannot update a triangle that is not registered".into(),
            ));
        }
        if points[0] == points[1] || points[1] == points[2] || points[0] == points[2] {
            return Err(PlanetError::InvalidTopology(
                "triangle points must be distinct".into(),
            ));
        }

        self.unregister_triangle(tri);

        let edges = Triangle::edge_keys(points);
        for &key in &edges {
            self.get_or_create_edge(key.a(), key.b());
            if self.edge_triangles.get(&key).map_or(0, Vec::len) >= 2 {
                // Put the old registration back so the store stays coherent
                // before surfacing the violation.
                self.register_triangle(tri);
                return Err(PlanetError::InvalidTopology(format!(
                    "edge {:?}-{:?} already borders two triangles",
                    key.a(),
                    key.b()
                )));
            }
        }

        self.triangles[tri] = Triangle { points, edges };
        self.register_triangle(tri);
        Ok(())
    }

    /// Remove a triangle and all of its edge-key registrations
    ///
    /// The bounding edges themselves stay registered; they may be shared
    /// with other triangles.
    pub fn remove_triangle(&mut self, tri: TriangleKey) {
        if self.triangles.contains_key(tri) {
            self.unregister_triangle(tri);
            self.triangles.remove(tri);
        }
    }

    /// Triangle record lookup
    #[inline]
    pub fn triangle(&self, key: TriangleKey) -> Option<&Triangle> {
        self.triangles.get(key)
    }

    /// Number of registered triangles
    #[inline]
    pub fn num_triangles(&self) -> usize {
        self.triangles.len()
    }

    /// Keys of all registered triangles
    pub fn triangle_keys(&self) -> Vec<TriangleKey> {
        self.triangles.keys().collect()
    }

    /// The 0, 1, or 2 triangles sharing an undirected edge
    pub fn triangles_by_edge(&self, key: EdgeKey) -> &[TriangleKey] {
        self.edge_triangles.get(&key).map_or(&[], Vec::as_slice)
    }

    /// The two triangles across an edge, if the edge is flippable
    ///
    /// A flip is only legal when exactly 2 triangles share the edge;
    /// boundary edges (1 triangle) and dangling edges return None.
    pub fn try_flip(&self, key: EdgeKey) -> Option<(TriangleKey, TriangleKey)> {
        match self.edge_triangles.get(&key).map(Vec::as_slice) {
            Some(&[first, second]) => Some((first, second)),
            _ => None,
        }
    }

    /// Largest number of triangles registered on any single edge
    ///
    /// 2 on a healthy manifold; anything greater indicates corruption.
    pub fn max_triangles_per_edge(&self) -> usize {
        self.edge_triangles.values().map(Vec::len).max().unwrap_or(0)
    }

    fn register_triangle(&mut self, tri: TriangleKey) {
        let triangle = self.triangles[tri];
        for (i, &key) in triangle.edges.iter().enumerate() {
            self.edge_triangles.entry(key).or_default().push(tri);

            // Attach the half-edge back-reference: prefer the direction
            // matching the triangle winding, fall back to the twin slot.
            if let Some(&(forward, backward)) = self.edge_pairs.get(&key) {
                let from = triangle.points[i];
                let (wound, other) = if self.half_edges[forward].from == from {
                    (forward, backward)
                } else {
                    (backward, forward)
                };
                if self.half_edges[wound].triangle.is_none() {
                    self.half_edges[wound].triangle = Some(tri);
                } else if self.half_edges[other].triangle.is_none() {
                    self.half_edges[other].triangle = Some(tri);
                }
            }
        }
    }

    fn unregister_triangle(&mut self, tri: TriangleKey) {
        let triangle = self.triangles[tri];
        for &key in &triangle.edges {
            if let Some(list) = self.edge_triangles.get_mut(&key) {
                list.retain(|&t| t != tri);
                if list.is_empty() {
                    self.edge_triangles.remove(&key);
                }
            }
            if let Some(&(forward, backward)) = self.edge_pairs.get(&key) {
                for he in [forward, backward] {
                    if self.half_edges[he].triangle == Some(tri) {
                        self.half_edges[he].triangle = None;
                    }
                }
            }
        }
    }

    // ---- phase gate ------------------------------------------------------

    /// Current pipeline phase
    #[inline]
    pub fn phase(&self) -> GenerationPhase {
        self.phase
    }

    /// Advance the phase counter
    ///
    /// Entering `DualMesh` snapshots the base-point count: points created
    /// afterwards (circumcenters) are dual-mesh points.
    pub fn advance_phase(&mut self) -> GenerationPhase {
        let next = self.phase.next();
        if next == GenerationPhase::DualMesh && self.phase == GenerationPhase::BaseMesh {
            self.base_point_count = self.points.len();
        }
        self.phase = next;
        self.phase
    }

    /// Number of points that existed when the dual phase began
    ///
    /// Ids `0..base_point_count` are base-mesh points; the rest are dual
    /// (circumcenter) points. Zero until the dual phase is entered.
    #[inline]
    pub fn base_point_count(&self) -> usize {
        self.base_point_count
    }
}

/// Thread-shared topology store
///
/// Cloning is cheap (shared handle). Every kernel operation takes the whole
/// store lock; a poisoned lock is absorbed rather than propagated since the
/// store holds no invariant that a panicking reader could have broken
/// mid-write (all writes happen through `&mut` methods that complete or
/// error without partial registration).
#[derive(Debug, Clone, Default)]
pub struct SharedStore {
    inner: Arc<Mutex<TopologyStore>>,
}

impl SharedStore {
    /// Wrap a store for shared access
    pub fn new(store: TopologyStore) -> Self {
        Self {
            inner: Arc::new(Mutex::new(store)),
        }
    }

    /// Acquire the store lock
    ///
    /// Compound edits must perform all their calls through one guard.
    pub fn lock(&self) -> MutexGuard<'_, TopologyStore> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Unwrap the store once all workers are done
    ///
    /// Falls back to a clone if other handles are still alive.
    pub fn into_inner(self) -> TopologyStore {
        match Arc::try_unwrap(self.inner) {
            Ok(mutex) => mutex.into_inner().unwrap_or_else(|p| p.into_inner()),
            Err(arc) => arc.lock().unwrap_or_else(|p| p.into_inner()).clone(),
        }
    }
}
