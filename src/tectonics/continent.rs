//! Continent partitioning over the Voronoi cell graph
//!
//! A two-phase flood fill: seeds grow one random neighbor at a time until
//! they reach a randomized minimum size, then a saturation sweep claims
//! everything left so every cell ends up in exactly one continent. Cell
//! adjacency here is point-sharing (two cells touching at a single corner
//! count as neighbors), which keeps the fill from leaking through pinch
//! points unevenly.

use glam::{Vec2, Vec3};
use rand::Rng;
use rand_chacha::ChaCha8Rng;

use crate::config::PlanetConfig;
use crate::error::{PlanetError, Result};
use crate::generation::voronoi::DualMesh;

/// Crust kind decides the continent's resting height band
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrustKind {
    Oceanic,
    Continental,
}

/// Seed-phase minimum size range (inclusive)
const MIN_SEED_SIZE: usize = 5;
const MAX_SEED_SIZE: usize = 8;

/// Resting height bands per crust kind
const OCEANIC_HEIGHT: std::ops::Range<f32> = -1.0..-0.3;
const CONTINENTAL_HEIGHT: std::ops::Range<f32> = 0.1..0.8;

/// Kinematic parameter ranges
const ROTATION_RANGE: std::ops::Range<f32> = -0.1..0.1;
const DRIFT_RANGE: std::ops::Range<f32> = -1.0..1.0;

/// One continent: a connected set of cells sharing crust and motion
#[derive(Debug, Clone)]
pub struct Continent {
    pub id: usize,
    pub crust: CrustKind,
    /// Resting height applied to every member cell before stress deltas
    pub base_height: f32,
    /// Member cell ids
    pub cells: Vec<usize>,
    /// Mean member position renormalized onto the sphere
    pub center: Vec3,
    /// Local 2D tangent basis at the center (u, v)
    pub basis: (Vec3, Vec3),
    /// Angular speed around the center axis
    pub rotation: f32,
    /// Translation in the tangent basis
    pub drift: Vec2,
}

impl Continent {
    /// World-space velocity of a surface position under this continent's
    /// rigid motion (drift plus rotation about the center)
    pub fn velocity_at(&self, position: Vec3) -> Vec3 {
        let movement = self.movement_at(position);
        self.basis.0 * movement.x + self.basis.1 * movement.y
    }

    /// 2D movement vector of a surface position in the tangent basis
    pub fn movement_at(&self, position: Vec3) -> Vec2 {
        let offset = position - self.center;
        let local = Vec2::new(offset.dot(self.basis.0), offset.dot(self.basis.1));
        self.drift + self.rotation * local.perp()
    }
}

/// Partition every cell into continents and derive per-cell kinematics
///
/// Writes `continent`, `height`, `movement`, `is_border`, and
/// `boundary_neighbors` into the dual mesh cells.
///
/// # Errors
///
/// `InvalidConfig` if the continent count is zero or exceeds the cell count.
pub fn partition_continents(
    dual: &mut DualMesh,
    config: &PlanetConfig,
    rng: &mut ChaCha8Rng,
) -> Result<Vec<Continent>> {
    let cell_count = dual.cells.len();
    if config.continent_count == 0 || config.continent_count > cell_count {
        return Err(PlanetError::InvalidConfig(format!(
            "continent count {} is out of range for {} cells",
            config.continent_count, cell_count
        )));
    }

    let adjacency = point_adjacency(dual);
    let mut owner: Vec<Option<usize>> = vec![None; cell_count];

    // Seed phase: each continent starts at a random unclaimed cell and
    // grows one random unclaimed neighbor at a time.
    let mut continents = Vec::with_capacity(config.continent_count);
    for id in 0..config.continent_count {
        let seed = loop {
            let candidate = rng.gen_range(0..cell_count);
            if owner[candidate].is_none() {
                break candidate;
            }
        };
        owner[seed] = Some(id);

        let crust = if rng.gen_range(0..3) < 2 {
            CrustKind::Oceanic
        } else {
            CrustKind::Continental
        };
        let base_height = match crust {
            CrustKind::Oceanic => rng.gen_range(OCEANIC_HEIGHT),
            CrustKind::Continental => rng.gen_range(CONTINENTAL_HEIGHT),
        };

        continents.push(Continent {
            id,
            crust,
            base_height,
            cells: vec![seed],
            center: Vec3::ZERO,
            basis: (Vec3::X, Vec3::Y),
            rotation: rng.gen_range(ROTATION_RANGE),
            drift: Vec2::new(rng.gen_range(DRIFT_RANGE), rng.gen_range(DRIFT_RANGE)),
        });
    }

    for continent in &mut continents {
        let target = rng.gen_range(MIN_SEED_SIZE..=MAX_SEED_SIZE);
        while continent.cells.len() < target {
            let frontier: Vec<usize> = continent
                .cells
                .iter()
                .flat_map(|&cell| adjacency[cell].iter().copied())
                .filter(|&n| owner[n].is_none())
                .collect();
            let Some(&claimed) = frontier.get(rng.gen_range(0..frontier.len().max(1))) else {
                break;
            };
            owner[claimed] = Some(continent.id);
            continent.cells.push(claimed);
        }
    }

    // Saturation phase: pop a random claimed cell that still has unclaimed
    // neighbors and claim all of them, until nothing is left unclaimed.
    let mut poppable: Vec<usize> = (0..cell_count).filter(|&c| owner[c].is_some()).collect();
    while !poppable.is_empty() {
        let slot = rng.gen_range(0..poppable.len());
        let cell = poppable[slot];
        let id = owner[cell].unwrap_or(0);

        let mut claimed_any = false;
        for &neighbor in &adjacency[cell] {
            if owner[neighbor].is_none() {
                owner[neighbor] = Some(id);
                continents[id].cells.push(neighbor);
                poppable.push(neighbor);
                claimed_any = true;
            }
        }
        if !claimed_any {
            poppable.swap_remove(slot);
        }
    }

    // A closed dual is connected, so this only fires on degenerate meshes.
    for cell in 0..cell_count {
        if owner[cell].is_none() {
            log::warn!("cell {} unreachable by flood fill, attaching to continent 0", cell);
            owner[cell] = Some(0);
            continents[0].cells.push(cell);
        }
    }

    for continent in &mut continents {
        finalize_kinematics(continent, dual, config.radius(), rng);
    }

    // Write ownership, resting height, and per-cell movement back
    for (cell_index, id) in owner.iter().enumerate() {
        let id = id.unwrap_or(0);
        let continent = &continents[id];
        let cell = &mut dual.cells[cell_index];
        cell.continent = Some(id);
        cell.height = continent.base_height;
        cell.movement = continent.movement_at(cell.center);
    }

    mark_borders(dual);

    log::debug!(
        "continents: {} over {} cells, sizes {:?}",
        continents.len(),
        cell_count,
        continents.iter().map(|c| c.cells.len()).collect::<Vec<_>>()
    );
    Ok(continents)
}

/// Cell adjacency through shared polygon corners
///
/// Corners are visited in point-id order: hash-map iteration order would
/// leak into the seeded growth draws and break run-to-run determinism.
fn point_adjacency(dual: &DualMesh) -> Vec<Vec<usize>> {
    let mut adjacency: Vec<Vec<usize>> = vec![Vec::new(); dual.cells.len()];
    let mut corners: Vec<_> = dual.cells_by_point.keys().copied().collect();
    corners.sort_unstable();
    for corner in corners {
        let sharers = &dual.cells_by_point[&corner];
        for &a in sharers {
            for &b in sharers {
                if a != b && !adjacency[a].contains(&b) {
                    adjacency[a].push(b);
                }
            }
        }
    }
    adjacency
}

/// Compute the continent center and a random tangent basis, oriented by
/// two random great-circle chord directions
fn finalize_kinematics(
    continent: &mut Continent,
    dual: &DualMesh,
    radius: f32,
    rng: &mut ChaCha8Rng,
) {
    let sum: Vec3 = continent
        .cells
        .iter()
        .map(|&c| dual.cells[c].center)
        .sum();
    let normal = if sum.length_squared() > 1.0e-8 {
        sum.normalize()
    } else {
        // Antipodally balanced continent; any axis works
        Vec3::Z
    };
    continent.center = normal * radius;

    // Two random chords give the basis its random in-plane orientation
    let u = loop {
        let chord = random_unit(rng);
        let projected = chord - normal * chord.dot(normal);
        if projected.length_squared() > 1.0e-6 {
            break projected.normalize();
        }
    };
    let v = normal.cross(u);
    continent.basis = (u, v);
}

fn random_unit(rng: &mut ChaCha8Rng) -> Vec3 {
    loop {
        let candidate = Vec3::new(
            rng.gen_range(-1.0..1.0),
            rng.gen_range(-1.0..1.0),
            rng.gen_range(-1.0..1.0),
        );
        let length = candidate.length_squared();
        if length > 1.0e-4 && length <= 1.0 {
            return candidate / length.sqrt();
        }
    }
}

/// Flag cells with a polygon edge against a different continent and record
/// which continent sits across each such edge
fn mark_borders(dual: &mut DualMesh) {
    let mut updates: Vec<(usize, crate::topology::EdgeKey, usize)> = Vec::new();
    let mut edges: Vec<_> = dual.cells_by_edge.keys().copied().collect();
    edges.sort_unstable();
    for edge in edges {
        let sharers = &dual.cells_by_edge[&edge];
        let [a, b] = sharers.as_slice() else {
            continue;
        };
        let (ca, cb) = (dual.cells[*a].continent, dual.cells[*b].continent);
        if let (Some(ca), Some(cb)) = (ca, cb) {
            if ca != cb {
                updates.push((*a, edge, cb));
                updates.push((*b, edge, ca));
            }
        }
    }
    for (cell, edge, other) in updates {
        let cell = &mut dual.cells[cell];
        cell.is_border = true;
        cell.boundary_neighbors.insert(edge, other);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    use crate::config::{PlanetPreset, VertexDistribution};
    use crate::generation::icosahedron::build_base_mesh;
    use crate::generation::voronoi::build_dual_mesh;
    use crate::topology::TopologyStore;

    fn dual_fixture() -> DualMesh {
        let mut store = TopologyStore::new();
        build_base_mesh(&mut store, 10.0, &[1], VertexDistribution::Linear).unwrap();
        store.advance_phase();
        store.advance_phase();
        build_dual_mesh(&mut store, 10.0).unwrap()
    }

    fn config(continents: usize) -> PlanetConfig {
        PlanetConfig::builder()
            .seed(11)
            .preset(PlanetPreset::Custom {
                radius: 10.0,
                subdivisions: vec![1],
            })
            .continent_count(continents)
            .unwrap()
            .build()
            .unwrap()
    }

    #[test]
    fn test_every_cell_claimed_exactly_once() {
        let mut dual = dual_fixture();
        let config = config(5);
        let mut rng = ChaCha8Rng::seed_from_u64(11);

        let continents = partition_continents(&mut dual, &config, &mut rng).unwrap();

        assert_eq!(continents.len(), 5);
        for cell in &dual.cells {
            assert!(cell.continent.is_some());
        }

        let total: usize = continents.iter().map(|c| c.cells.len()).sum();
        assert_eq!(total, dual.cells.len());

        // Membership lists agree with per-cell ownership
        for continent in &continents {
            for &member in &continent.cells {
                assert_eq!(dual.cells[member].continent, Some(continent.id));
            }
        }
    }

    #[test]
    fn test_heights_match_crust_kind() {
        let mut dual = dual_fixture();
        let config = config(6);
        let mut rng = ChaCha8Rng::seed_from_u64(3);

        let continents = partition_continents(&mut dual, &config, &mut rng).unwrap();
        for continent in &continents {
            match continent.crust {
                CrustKind::Oceanic => assert!(continent.base_height < 0.0),
                CrustKind::Continental => assert!(continent.base_height > 0.0),
            }
        }
    }

    #[test]
    fn test_border_marking_is_symmetric() {
        let mut dual = dual_fixture();
        let config = config(4);
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        partition_continents(&mut dual, &config, &mut rng).unwrap();

        for cell in &dual.cells {
            for (&edge, _) in &cell.boundary_neighbors {
                let sharers = &dual.cells_by_edge[&edge];
                let other = sharers.iter().find(|&&c| c != cell.id).unwrap();
                let back = dual.cells[*other].boundary_neighbors.get(&edge);
                assert_eq!(back, Some(&cell.continent.unwrap()));
            }
        }
    }

    #[test]
    fn test_partition_is_deterministic() {
        let config = config(4);

        let mut first = dual_fixture();
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        partition_continents(&mut first, &config, &mut rng).unwrap();

        let mut second = dual_fixture();
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        partition_continents(&mut second, &config, &mut rng).unwrap();

        for (a, b) in first.cells.iter().zip(second.cells.iter()) {
            assert_eq!(a.continent, b.continent);
            assert_eq!(a.height, b.height);
            assert_eq!(a.movement, b.movement);
            assert_eq!(a.is_border, b.is_border);
        }
    }

    #[test]
    fn test_invalid_continent_count() {
        let mut dual = dual_fixture();
        let config = config(2);
        let bad = PlanetConfig {
            continent_count: dual.cells.len() + 1,
            ..config
        };
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        assert!(matches!(
            partition_continents(&mut dual, &bad, &mut rng),
            Err(PlanetError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_continent_basis_is_orthonormal() {
        let mut dual = dual_fixture();
        let config = config(3);
        let mut rng = ChaCha8Rng::seed_from_u64(9);

        let continents = partition_continents(&mut dual, &config, &mut rng).unwrap();
        for continent in &continents {
            let (u, v) = continent.basis;
            let normal = continent.center.normalize();
            assert!((u.length() - 1.0).abs() < 1.0e-4);
            assert!((v.length() - 1.0).abs() < 1.0e-4);
            assert!(u.dot(v).abs() < 1.0e-4);
            assert!(u.dot(normal).abs() < 1.0e-4);
        }
    }

    #[test]
    fn test_rigid_motion_velocity() {
        let continent = Continent {
            id: 0,
            crust: CrustKind::Continental,
            base_height: 0.5,
            cells: vec![],
            center: Vec3::Z * 10.0,
            basis: (Vec3::X, Vec3::Y),
            rotation: 0.0,
            drift: Vec2::new(1.0, 0.0),
        };

        // Pure drift: every position moves along the u axis
        let velocity = continent.velocity_at(Vec3::new(1.0, 2.0, 9.5));
        assert!((velocity - Vec3::X).length() < 1.0e-5);

        // Pure rotation: motion is perpendicular to the offset
        let spinning = Continent {
            rotation: 1.0,
            drift: Vec2::ZERO,
            ..continent
        };
        let offset_position = Vec3::new(1.0, 0.0, 10.0);
        let velocity = spinning.velocity_at(offset_position);
        assert!((velocity - Vec3::Y).length() < 1.0e-4);
    }
}
