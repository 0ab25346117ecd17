//! Base mesh construction: icosahedron plus recursive subdivision
//!
//! Builds the 12 golden-ratio vertices of a regular icosahedron normalized
//! onto the configured sphere, then subdivides each triangle level by level
//! with a configurable vertices-per-edge count. Every generated point goes
//! through the store's point registry so adjacent triangles reuse identical
//! edge points and the mesh stays crack-free.

use glam::Vec3;

use crate::config::VertexDistribution;
use crate::error::Result;
use crate::topology::{PointId, TopologyStore};

/// Golden ratio constant for the icosahedron construction
const GOLDEN_RATIO: f32 = 1.618033988749895;

/// The 20 faces of a regular icosahedron over the 12 vertices below
const ICOSAHEDRON_FACES: [[usize; 3]; 20] = [
    [0, 11, 5],
    [0, 5, 1],
    [0, 1, 7],
    [0, 7, 10],
    [0, 10, 11],
    [1, 5, 9],
    [5, 11, 4],
    [11, 10, 2],
    [10, 7, 6],
    [7, 1, 8],
    [3, 9, 4],
    [3, 4, 2],
    [3, 2, 6],
    [3, 6, 8],
    [3, 8, 9],
    [4, 9, 5],
    [2, 4, 11],
    [6, 2, 10],
    [8, 6, 7],
    [9, 8, 1],
];

/// The 12 vertices of a regular icosahedron (un-normalized golden rectangles)
fn icosahedron_vertices() -> [Vec3; 12] {
    let t = GOLDEN_RATIO;
    [
        Vec3::new(-1.0, t, 0.0),
        Vec3::new(1.0, t, 0.0),
        Vec3::new(-1.0, -t, 0.0),
        Vec3::new(1.0, -t, 0.0),
        Vec3::new(0.0, -1.0, t),
        Vec3::new(0.0, 1.0, t),
        Vec3::new(0.0, -1.0, -t),
        Vec3::new(0.0, 1.0, -t),
        Vec3::new(t, 0.0, -1.0),
        Vec3::new(t, 0.0, 1.0),
        Vec3::new(-t, 0.0, -1.0),
        Vec3::new(-t, 0.0, 1.0),
    ]
}

/// Build the base mesh: icosahedron, subdivision levels, triangle commit
///
/// Returns the number of triangles committed to the store.
pub fn build_base_mesh(
    store: &mut TopologyStore,
    radius: f32,
    subdivisions: &[u32],
    distribution: VertexDistribution,
) -> Result<usize> {
    let corner_ids: Vec<PointId> = icosahedron_vertices()
        .iter()
        .map(|&v| store.get_or_create_point(v.normalize() * radius))
        .collect();

    let mut faces: Vec<[PointId; 3]> = ICOSAHEDRON_FACES
        .iter()
        .map(|&[a, b, c]| [corner_ids[a], corner_ids[b], corner_ids[c]])
        .collect();

    for &vertices_per_edge in subdivisions {
        let mut next = Vec::with_capacity(faces.len() * 4);
        for face in &faces {
            next.extend(subdivide_face(
                store,
                *face,
                vertices_per_edge,
                radius,
                distribution,
            ));
        }
        faces = next;
    }

    let count = faces.len();
    for face in &faces {
        store.add_triangle(face)?;
    }
    log::debug!(
        "base mesh: {} points, {} triangles ({} levels)",
        store.num_points(),
        count,
        subdivisions.len()
    );
    Ok(count)
}

/// Subdivide one triangle with N vertices per edge
///
/// - N = 0: the triangle is returned unchanged
/// - N = 1: the 3 edge midpoints split it into the standard 4 sub-triangles
/// - N = 2: a closed-form 9-triangle fan around the centroid
/// - N >= 3: distribution-driven edge points, a barycentric interior grid,
///   and lattice stitching
pub(crate) fn subdivide_face(
    store: &mut TopologyStore,
    face: [PointId; 3],
    vertices_per_edge: u32,
    radius: f32,
    distribution: VertexDistribution,
) -> Vec<[PointId; 3]> {
    match vertices_per_edge {
        0 => vec![face],
        1 => subdivide_midpoints(store, face, radius),
        2 => subdivide_centroid_fan(store, face, radius),
        n => subdivide_lattice(store, face, n, radius, distribution),
    }
}

/// Project a chord-space point back onto the sphere
#[inline]
fn on_sphere(position: Vec3, radius: f32) -> Vec3 {
    position.normalize() * radius
}

/// Standard 4-way midpoint split
fn subdivide_midpoints(
    store: &mut TopologyStore,
    [a, b, c]: [PointId; 3],
    radius: f32,
) -> Vec<[PointId; 3]> {
    let (pa, pb, pc) = (store.position(a), store.position(b), store.position(c));
    let ab = store.get_or_create_point(on_sphere((pa + pb) * 0.5, radius));
    let bc = store.get_or_create_point(on_sphere((pb + pc) * 0.5, radius));
    let ca = store.get_or_create_point(on_sphere((pc + pa) * 0.5, radius));

    vec![[a, ab, ca], [ab, b, bc], [ca, bc, c], [ab, bc, ca]]
}

/// Closed-form 9-triangle split: thirds along each edge plus a centroid fan
fn subdivide_centroid_fan(
    store: &mut TopologyStore,
    [a, b, c]: [PointId; 3],
    radius: f32,
) -> Vec<[PointId; 3]> {
    let (pa, pb, pc) = (store.position(a), store.position(b), store.position(c));
    let third = |from: Vec3, to: Vec3, t: f32| on_sphere(from.lerp(to, t), radius);

    let ab1 = store.get_or_create_point(third(pa, pb, 1.0 / 3.0));
    let ab2 = store.get_or_create_point(third(pa, pb, 2.0 / 3.0));
    let bc1 = store.get_or_create_point(third(pb, pc, 1.0 / 3.0));
    let bc2 = store.get_or_create_point(third(pb, pc, 2.0 / 3.0));
    let ca1 = store.get_or_create_point(third(pc, pa, 1.0 / 3.0));
    let ca2 = store.get_or_create_point(third(pc, pa, 2.0 / 3.0));
    let centroid = store.get_or_create_point(on_sphere((pa + pb + pc) / 3.0, radius));

    let hexagon = [ab1, ab2, bc1, bc2, ca1, ca2];
    let mut faces = vec![[ca2, a, ab1], [ab2, b, bc1], [bc2, c, ca1]];
    for i in 0..6 {
        faces.push([hexagon[i], hexagon[(i + 1) % 6], centroid]);
    }
    faces
}

/// Parameter values for N points along an edge, per the distribution
///
/// Linear: t = (i + 1) / (N + 1). Geometric: segment i has relative length
/// ratio^i; cumulative sums normalized into (0, 1).
fn edge_parameters(n: u32, distribution: VertexDistribution) -> Vec<f32> {
    match distribution {
        VertexDistribution::Linear => (0..n).map(|i| (i + 1) as f32 / (n + 1) as f32).collect(),
        VertexDistribution::Geometric { ratio } => {
            let total: f32 = (0..=n).map(|i| ratio.powi(i as i32)).sum();
            let mut cumulative = 0.0;
            (0..n)
                .map(|i| {
                    cumulative += ratio.powi(i as i32);
                    cumulative / total
                })
                .collect()
        }
    }
}

/// Point `index` (0-based, counted from `from`) along the edge between two
/// face corners
///
/// The parameter direction is canonicalized to run from the lower point id,
/// so two faces traversing a shared edge in opposite directions generate
/// bit-identical positions even when the distribution is asymmetric.
fn edge_point(
    store: &mut TopologyStore,
    from: PointId,
    to: PointId,
    index: usize,
    params: &[f32],
    radius: f32,
) -> PointId {
    let (start, end, t) = if from <= to {
        (from, to, params[index])
    } else {
        (to, from, params[params.len() - 1 - index])
    };
    let position = store.position(start).lerp(store.position(end), t);
    store.get_or_create_point(on_sphere(position, radius))
}

/// Full barycentric lattice subdivision for N >= 3
///
/// Resolution R = N + 1 segments per edge. Edge points use the configured
/// distribution; interior points sit on the barycentric grid (all positive
/// integer triples summing to R); triangles come from walking the lattice
/// rows and connecting each cell's two triangles.
fn subdivide_lattice(
    store: &mut TopologyStore,
    [a, b, c]: [PointId; 3],
    vertices_per_edge: u32,
    radius: f32,
    distribution: VertexDistribution,
) -> Vec<[PointId; 3]> {
    let resolution = (vertices_per_edge + 1) as usize;
    let (pa, pb, pc) = (store.position(a), store.position(b), store.position(c));
    let params = edge_parameters(vertices_per_edge, distribution);

    // Rows fan out from corner a: row r holds r + 1 points, row R is edge b-c.
    let mut rows: Vec<Vec<PointId>> = Vec::with_capacity(resolution + 1);
    for r in 0..=resolution {
        let mut row = Vec::with_capacity(r + 1);
        for s in 0..=r {
            // Barycentric coordinates (i, j, k), i + j + k = resolution
            let (i, j, k) = (resolution - r, r - s, s);
            let id = if i == resolution {
                a
            } else if j == resolution {
                b
            } else if k == resolution {
                c
            } else if k == 0 {
                // Edge a-b, parameterized by the distribution
                edge_point(store, a, b, j - 1, &params, radius)
            } else if j == 0 {
                // Edge a-c
                edge_point(store, a, c, k - 1, &params, radius)
            } else if i == 0 {
                // Edge b-c
                edge_point(store, b, c, k - 1, &params, radius)
            } else {
                // Interior: plain barycentric grid point
                let position =
                    (pa * i as f32 + pb * j as f32 + pc * k as f32) / resolution as f32;
                store.get_or_create_point(on_sphere(position, radius))
            };
            row.push(id);
        }
        rows.push(row);
    }

    let mut faces = Vec::with_capacity(resolution * resolution);
    for r in 0..resolution {
        for s in 0..=r {
            faces.push([rows[r][s], rows[r + 1][s], rows[r + 1][s + 1]]);
            if s < r {
                faces.push([rows[r][s], rows[r + 1][s + 1], rows[r][s + 1]]);
            }
        }
    }
    faces
}
