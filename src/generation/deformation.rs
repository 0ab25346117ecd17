//! Random edge-flip deformation of the base mesh
//!
//! Breaks up the regular icosphere lattice by repeatedly picking a random
//! point, picking one of its incident edges, and flipping that edge to the
//! opposite diagonal of the two bordering triangles. Cycles run in parallel;
//! every individual flip is a compound edit performed under a single store
//! guard so readers never observe a half-rewired quad.

use glam::Vec3;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;

use crate::config::PlanetConfig;
use crate::error::Result;
use crate::topology::{EdgeKey, PointId, SharedStore, TopologyStore};

/// Flips whose edge-length change strays further than optimal / FLIP_TOLERANCE
/// from the pre-flip length are rejected to keep triangles from degenerating.
const FLIP_TOLERANCE: f32 = 0.5;

/// Counters accumulated across all deformation cycles
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeformationStats {
    pub attempted: usize,
    pub flipped: usize,
}

/// Run the configured number of deformation cycles against the shared store
///
/// Each cycle gets its own deterministic RNG derived from the planet seed and
/// the cycle index, then performs the configured number of flip attempts.
/// Cycles run on the rayon pool; attempts from different cycles interleave
/// at edge granularity.
///
/// # Errors
///
/// Propagates `InvalidTopology` if a flip leaves the store unable to
/// re-register a triangle, which indicates mesh corruption.
pub fn deform_mesh(store: &SharedStore, config: &PlanetConfig) -> Result<DeformationStats> {
    let optimal = optimal_edge_length(config.radius(), store.lock().num_triangles());

    let stats = (0..config.deformation_cycles)
        .into_par_iter()
        .map(|cycle| {
            let mut rng = ChaCha8Rng::seed_from_u64(config.seed as u64 + cycle as u64);
            let mut stats = DeformationStats::default();
            for _ in 0..config.deformation_attempts {
                stats.attempted += 1;
                if attempt_random_flip(store, &mut rng, optimal)? {
                    stats.flipped += 1;
                }
            }
            Ok(stats)
        })
        .try_reduce(DeformationStats::default, |a, b| {
            Ok(DeformationStats {
                attempted: a.attempted + b.attempted,
                flipped: a.flipped + b.flipped,
            })
        })?;

    log::debug!(
        "deformation: {} of {} attempts flipped",
        stats.flipped,
        stats.attempted
    );
    Ok(stats)
}

/// Side length of an equilateral triangle when the sphere surface is divided
/// evenly among the mesh's triangles
pub(crate) fn optimal_edge_length(radius: f32, num_triangles: usize) -> f32 {
    let sphere_area = 4.0 * std::f32::consts::PI * radius * radius;
    let triangle_area = sphere_area / num_triangles.max(1) as f32;
    // Equilateral area = (sqrt(3) / 4) * s^2
    (triangle_area * 4.0 / 3.0_f32.sqrt()).sqrt()
}

/// One flip attempt: pick a random untouched point and one of its edges,
/// then flip if the quad passes the checks
fn attempt_random_flip(store: &SharedStore, rng: &mut ChaCha8Rng, optimal: f32) -> Result<bool> {
    let mut guard = store.lock();
    let num_points = guard.num_points();
    if num_points == 0 {
        return Ok(false);
    }

    let point = PointId(rng.gen_range(0..num_points as u32));
    if guard.point(point).used {
        return Ok(false);
    }

    let edges = guard.incident_edge_keys(point);
    if edges.is_empty() {
        return Ok(false);
    }
    let key = edges[rng.gen_range(0..edges.len())];

    flip_edge(&mut guard, key, optimal)
}

/// Flip one edge to the opposite diagonal of its two bordering triangles
///
/// Rejected (returning `Ok(false)`) when the edge does not border exactly
/// 2 triangles, the diagonal already exists in the mesh, or the length
/// change falls outside the tolerance window. On success the 4 quad corners
/// are marked used so later attempts leave the area alone.
pub(crate) fn flip_edge(store: &mut TopologyStore, key: EdgeKey, optimal: f32) -> Result<bool> {
    let Some((t1, t2)) = store.try_flip(key) else {
        return Ok(false);
    };

    let (a, b) = (key.a(), key.b());
    let (Some(c), Some(d)) = (
        store.triangle(t1).and_then(|t| t.opposite_point(key)),
        store.triangle(t2).and_then(|t| t.opposite_point(key)),
    ) else {
        return Ok(false);
    };
    if c == d || store.has_edge(EdgeKey::new(c, d)) {
        return Ok(false);
    }

    let shared_length = store.edge_length(key);
    let diagonal_length = distance(store.position(c), store.position(d));
    if (shared_length - diagonal_length).abs() > optimal / FLIP_TOLERANCE {
        return Ok(false);
    }

    // Compound rewire: drop both triangles and all 5 quad edges, then
    // rebuild the quad around the new diagonal.
    store.remove_triangle(t1);
    store.remove_triangle(t2);
    for edge in [
        key,
        EdgeKey::new(a, c),
        EdgeKey::new(b, c),
        EdgeKey::new(a, d),
        EdgeKey::new(b, d),
    ] {
        store.remove_edge(edge);
    }

    store.get_or_create_edge(c, d);
    store.add_triangle(&[a, c, d])?;
    store.add_triangle(&[b, d, c])?;

    // add_triangle only wires the two new triangles into the recreated
    // outer edges; the surviving neighbor triangles need their half-edge
    // links restored too.
    for edge in [
        EdgeKey::new(a, c),
        EdgeKey::new(b, c),
        EdgeKey::new(a, d),
        EdgeKey::new(b, d),
    ] {
        store.relink_edge_triangles(edge);
    }

    for corner in [a, b, c, d] {
        store.point_mut(corner).used = true;
    }
    Ok(true)
}

#[inline]
fn distance(a: Vec3, b: Vec3) -> f32 {
    (a - b).length()
}
