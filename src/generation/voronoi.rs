//! Voronoi dual construction over the deformed base mesh
//!
//! Each base mesh point becomes a cell whose polygon corners are the
//! circumcenters of the point's incident triangles, projected back onto the
//! sphere. Circumcenters are deduplicated through the store's point registry
//! so neighboring cells share corner points and edge keys exactly, then each
//! polygon is triangulated in its tangent plane and the fan is committed to
//! the store alongside the base triangles.

use std::collections::HashMap;

use glam::{Vec2, Vec3};

use crate::cell::VoronoiCell;
use crate::error::{PlanetError, Result};
use crate::generation::delaunay;
use crate::topology::{EdgeKey, PointId, TopologyStore};

/// Degenerate-triangle guard for the circumcenter computation
const AREA_EPSILON: f32 = 1.0e-10;

/// The dual mesh: cells plus the adjacency indexes the tectonic passes use
#[derive(Debug, Default)]
pub struct DualMesh {
    /// One cell per base mesh point that produced a valid polygon
    pub cells: Vec<VoronoiCell>,
    /// Polygon boundary edge -> the (at most 2) cells sharing it
    pub cells_by_edge: HashMap<EdgeKey, Vec<usize>>,
    /// Polygon corner point -> every cell whose polygon uses it
    pub cells_by_point: HashMap<PointId, Vec<usize>>,
    /// Sites that produced no cell (fewer than 3 distinct circumcenters)
    pub skipped_sites: usize,
}

impl DualMesh {
    /// Cells adjacent to the given cell (sharing a polygon boundary edge)
    pub fn neighbors(&self, cell: usize) -> Vec<usize> {
        let mut found = Vec::new();
        for key in &self.cells[cell].border_edges {
            if let Some(sharers) = self.cells_by_edge.get(key) {
                for &other in sharers {
                    if other != cell && !found.contains(&other) {
                        found.push(other);
                    }
                }
            }
        }
        found
    }
}

/// Build the Voronoi dual for every base mesh point
///
/// The store must already be in the dual-mesh phase so the base point count
/// is frozen; every point this pass creates is a polygon corner. Sites whose
/// incident triangles yield fewer than 3 distinct circumcenters, whose
/// projected polygon is degenerate, or whose fan would claim an already-full
/// dual edge are skipped with a log message rather than failing the build.
///
/// # Errors
///
/// Planar triangulation failures other than degeneracy are propagated.
pub fn build_dual_mesh(store: &mut TopologyStore, radius: f32) -> Result<DualMesh> {
    let base_points = store.base_point_count();
    let mut dual = DualMesh::default();

    for raw in 0..base_points {
        let site = PointId(raw as u32);
        match build_cell(store, site, radius, dual.cells.len())? {
            Some(cell) => {
                let id = cell.id;
                for &corner in &cell.polygon {
                    dual.cells_by_point.entry(corner).or_default().push(id);
                }
                for &key in &cell.border_edges {
                    dual.cells_by_edge.entry(key).or_default().push(id);
                }
                dual.cells.push(cell);
            }
            None => dual.skipped_sites += 1,
        }
    }

    if dual.skipped_sites > 0 {
        log::warn!("dual mesh: skipped {} degenerate sites", dual.skipped_sites);
    }
    log::debug!("dual mesh: {} cells", dual.cells.len());
    Ok(dual)
}

/// Build the cell polygon and fan for one site, or None when degenerate
fn build_cell(
    store: &mut TopologyStore,
    site: PointId,
    radius: f32,
    id: usize,
) -> Result<Option<VoronoiCell>> {
    let center = store.position(site);
    let triangles = store.incident_triangles(site);

    // Circumcenters become dual points; the registry collapses duplicates
    // shared with neighboring cells.
    let mut corners: Vec<PointId> = Vec::with_capacity(triangles.len());
    for tri_key in triangles {
        let Some(triangle) = store.triangle(tri_key) else {
            continue;
        };
        let [a, b, c] = triangle.points;
        let Some(circumcenter) =
            circumcenter(store.position(a), store.position(b), store.position(c))
        else {
            continue;
        };
        let corner = store.get_or_create_point(circumcenter.normalize() * radius);
        if !corners.contains(&corner) {
            corners.push(corner);
        }
    }

    if corners.len() < 3 {
        log::debug!(
            "site {:?}: only {} distinct circumcenters, skipping cell",
            site,
            corners.len()
        );
        return Ok(None);
    }

    // Project the corners into the site's outward tangent plane; counter-
    // clockwise there is counter-clockwise seen from outside the sphere.
    let (u, v) = tangent_basis(center);
    let projected: Vec<Vec2> = corners
        .iter()
        .map(|&p| {
            let offset = store.position(p) - center;
            Vec2::new(offset.dot(u), offset.dot(v))
        })
        .collect();

    let local_triangles = match delaunay::triangulate(&projected) {
        Ok(triangles) => triangles,
        Err(PlanetError::DegenerateGeometry(reason)) => {
            log::debug!("site {:?}: degenerate polygon ({}), skipping cell", site, reason);
            return Ok(None);
        }
        Err(other) => return Err(other),
    };

    // On a deformed mesh, neighboring fans can occasionally fight over a
    // dual edge. That is a per-cell anomaly, not mesh corruption: unwind
    // this cell's partial fan and skip the site.
    let mut fan = Vec::with_capacity(local_triangles.len());
    for [a, b, c] in local_triangles {
        match store.add_triangle(&[corners[a], corners[b], corners[c]]) {
            Ok(tri) => fan.push(tri),
            Err(PlanetError::InvalidTopology(reason)) => {
                for tri in fan.drain(..) {
                    store.remove_triangle(tri);
                }
                log::debug!("site {:?}: fan collision ({}), skipping cell", site, reason);
                return Ok(None);
            }
            Err(other) => return Err(other),
        }
    }

    // Polygon boundary in counter-clockwise order
    let order = delaunay::angular_order(&projected);
    let polygon: Vec<PointId> = order.iter().map(|&i| corners[i]).collect();
    let border_edges: Vec<EdgeKey> = (0..polygon.len())
        .map(|i| EdgeKey::new(polygon[i], polygon[(i + 1) % polygon.len()]))
        .collect();

    Ok(Some(VoronoiCell::new(
        id,
        site,
        center,
        polygon,
        fan,
        border_edges,
    )))
}

/// True planar circumcenter of a triangle in 3D, None when degenerate
pub(crate) fn circumcenter(a: Vec3, b: Vec3, c: Vec3) -> Option<Vec3> {
    let ab = b - a;
    let ac = c - a;
    let normal = ab.cross(ac);
    let denominator = 2.0 * normal.length_squared();
    if denominator < AREA_EPSILON {
        return None;
    }

    let offset =
        (ac.length_squared() * normal.cross(ab) + ab.length_squared() * ac.cross(normal))
            / denominator;
    Some(a + offset)
}

/// Orthonormal tangent basis (u, v) at a surface position with u x v
/// pointing outward
pub(crate) fn tangent_basis(position: Vec3) -> (Vec3, Vec3) {
    let normal = position.normalize();
    let reference = if normal.x.abs() < 0.9 { Vec3::X } else { Vec3::Y };
    let u = normal.cross(reference).normalize();
    let v = normal.cross(u);
    (u, v)
}
