//! TectonicPlanet main structure

use std::collections::HashMap;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::cell::VoronoiCell;
use crate::config::PlanetConfig;
use crate::error::Result;
use crate::generation::{generate_mesh, DeformationStats, DualMesh};
use crate::tectonics::{
    apply_height_deltas, compute_stress_field, partition_continents, Continent,
};
use crate::topology::{EdgeKey, PointId, TopologyStore};

#[cfg(feature = "spatial-index")]
use crate::spatial::SpatialIndex;
#[cfg(feature = "spatial-index")]
use glam::Vec3;

/// Counters describing one generation run
#[derive(Debug, Clone, Copy, Default)]
pub struct GenerationReport {
    /// Base mesh points before the dual build
    pub base_points: usize,
    /// Triangles in the store (base plus dual fans)
    pub triangles: usize,
    /// Voronoi cells produced
    pub cells: usize,
    /// Edge-flip counters from the deformation cycles
    pub deformation: DeformationStats,
    /// Directly stressed continent boundary edges
    pub boundary_edges: usize,
    /// Base points that produced no Voronoi cell
    pub skipped_sites: usize,
}

/// A complete tectonically generated planet
///
/// Runs the whole pipeline on construction: icosahedron subdivision,
/// concurrent edge-flip deformation, the Voronoi dual, continent flood
/// fill, and the stress/height pass. The result keeps the full topology
/// store around so consumers can read polygon corner positions and heights
/// for rendering.
///
/// # Example
///
/// ```
/// use tectonic_planet::*;
///
/// let config = PlanetConfigBuilder::new()
///     .seed(42)
///     .preset(PlanetPreset::Tiny)
///     .build()
///     .unwrap();
///
/// let planet = TectonicPlanet::generate(config).unwrap();
/// println!("Generated {} cells", planet.cell_count());
///
/// if let Some(cell) = planet.get_cell(0) {
///     println!("Cell 0 biome: {:?}", cell.biome);
/// }
/// ```
#[derive(Clone)]
pub struct TectonicPlanet {
    /// Configuration used to generate this planet
    config: PlanetConfig,

    /// Full mesh topology (base triangles plus dual polygon fans)
    store: TopologyStore,

    /// All Voronoi cells (indexed by cell id)
    cells: Vec<VoronoiCell>,

    /// Per-cell neighbor lists (cells sharing a polygon boundary edge)
    neighbors: Vec<Vec<usize>>,

    /// Polygon boundary edge -> cells sharing it
    cells_by_edge: HashMap<EdgeKey, Vec<usize>>,

    /// Continents in seeding order
    continents: Vec<Continent>,

    /// Sphere radius for distance calculations
    radius: f32,

    /// Counters from the generation run
    report: GenerationReport,

    /// KD-tree for position-to-cell lookups
    #[cfg(feature = "spatial-index")]
    spatial_index: SpatialIndex,
}

impl TectonicPlanet {
    /// Generate a planet from a configuration
    ///
    /// # Errors
    ///
    /// `InvalidConfig` for impossible parameter combinations (more
    /// continents than cells) and `InvalidTopology` if the mesh is
    /// corrupted mid-pipeline; geometric anomalies on single cells are
    /// logged and skipped instead of failing the run.
    pub fn generate(config: PlanetConfig) -> Result<Self> {
        let radius = config.radius();

        let (mut store, mut dual, deformation) = generate_mesh(&config)?;

        let mut rng = ChaCha8Rng::seed_from_u64(config.seed as u64);
        let continents = partition_continents(&mut dual, &config, &mut rng)?;

        let field = compute_stress_field(&dual, &store, &continents, &config)?;
        apply_height_deltas(&mut dual, &mut store, &field, &config);

        let report = GenerationReport {
            base_points: store.base_point_count(),
            triangles: store.num_triangles(),
            cells: dual.cells.len(),
            deformation,
            boundary_edges: field.boundary_count,
            skipped_sites: dual.skipped_sites,
        };

        let neighbors: Vec<Vec<usize>> =
            (0..dual.cells.len()).map(|id| dual.neighbors(id)).collect();

        #[cfg(feature = "spatial-index")]
        let spatial_index = {
            let centers: Vec<Vec3> = dual.cells.iter().map(|c| c.center).collect();
            SpatialIndex::new(&centers)
        };

        let DualMesh {
            cells,
            cells_by_edge,
            ..
        } = dual;

        Ok(Self {
            config,
            store,
            cells,
            neighbors,
            cells_by_edge,
            continents,
            radius,
            report,
            #[cfg(feature = "spatial-index")]
            spatial_index,
        })
    }

    /// Configuration used to generate this planet
    #[inline]
    pub fn config(&self) -> &PlanetConfig {
        &self.config
    }

    /// Sphere radius
    #[inline]
    pub fn radius(&self) -> f32 {
        self.radius
    }

    /// Number of cells on this planet
    #[inline]
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Counters from the generation run
    #[inline]
    pub fn report(&self) -> &GenerationReport {
        &self.report
    }

    /// Get a cell by id, `None` when out of bounds
    #[inline]
    pub fn get_cell(&self, id: usize) -> Option<&VoronoiCell> {
        self.cells.get(id)
    }

    /// All cells as a slice
    #[inline]
    pub fn cells(&self) -> &[VoronoiCell] {
        &self.cells
    }

    /// All continents in seeding order
    #[inline]
    pub fn continents(&self) -> &[Continent] {
        &self.continents
    }

    /// The underlying topology store (polygon corner positions and heights)
    #[inline]
    pub fn store(&self) -> &TopologyStore {
        &self.store
    }

    /// World position of a polygon corner point
    #[inline]
    pub fn corner_position(&self, point: PointId) -> glam::Vec3 {
        self.store.position(point)
    }

    /// Ids of cells adjacent to the given cell
    ///
    /// Returns an empty slice for an invalid id.
    pub fn get_neighbors(&self, cell_id: usize) -> &[usize] {
        self.neighbors
            .get(cell_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// The cells sharing a polygon boundary edge
    pub fn cells_on_edge(&self, edge: EdgeKey) -> &[usize] {
        self.cells_by_edge
            .get(&edge)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Find the cell nearest a 3D position (requires the `spatial-index`
    /// feature)
    #[cfg(feature = "spatial-index")]
    pub fn find_cell_at(&self, position: Vec3) -> usize {
        self.spatial_index.find_nearest(position)
    }

    /// All cells within a hop count of a center cell (BFS)
    ///
    /// Hop 0 is just the center cell. Returns an empty vec for an invalid
    /// center id.
    pub fn find_cells_within_radius(&self, center_id: usize, hops: usize) -> Vec<usize> {
        if center_id >= self.cells.len() {
            return vec![];
        }

        let mut visited = std::collections::HashSet::new();
        let mut current = vec![center_id];
        visited.insert(center_id);

        for _ in 0..hops {
            let mut next = Vec::new();
            for &cell_id in &current {
                for &neighbor in self.get_neighbors(cell_id) {
                    if visited.insert(neighbor) {
                        next.push(neighbor);
                    }
                }
            }
            current = next;
        }

        visited.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{PlanetConfigBuilder, PlanetPreset};

    fn tiny_planet(seed: u32) -> TectonicPlanet {
        let config = PlanetConfigBuilder::new()
            .seed(seed)
            .preset(PlanetPreset::Custom {
                radius: 10.0,
                subdivisions: vec![1, 1],
            })
            .deformation(2, 60)
            .unwrap()
            .continent_count(6)
            .unwrap()
            .build()
            .unwrap();
        TectonicPlanet::generate(config).unwrap()
    }

    #[test]
    fn test_planet_generation() {
        let planet = tiny_planet(42);

        assert!(planet.cell_count() > 0);
        assert_eq!(planet.radius(), 10.0);
        assert_eq!(planet.continents().len(), 6);

        let report = planet.report();
        assert_eq!(report.base_points, 162);
        assert_eq!(report.cells, planet.cell_count());
        assert!(report.boundary_edges > 0);
    }

    #[test]
    fn test_every_cell_is_fully_populated() {
        let planet = tiny_planet(7);

        for cell in planet.cells() {
            assert!(cell.continent.is_some());
            assert!(cell.biome.is_some());
            assert!(cell.height.is_finite());
            assert!(cell.vertex_count() >= 3);
        }
    }

    #[test]
    fn test_get_cell_bounds() {
        let planet = tiny_planet(42);

        assert!(planet.get_cell(0).is_some());
        assert!(planet.get_cell(planet.cell_count()).is_none());
    }

    #[test]
    fn test_get_neighbors() {
        let planet = tiny_planet(42);

        let neighbors = planet.get_neighbors(0);
        assert!(neighbors.len() >= 3);
        assert!(neighbors.len() <= 10);

        // Adjacency is symmetric
        for &n in neighbors {
            assert!(planet.get_neighbors(n).contains(&0));
        }
    }

    #[cfg(feature = "spatial-index")]
    #[test]
    fn test_find_cell_at() {
        let planet = tiny_planet(42);

        let center = planet.get_cell(0).unwrap().center;
        assert_eq!(planet.find_cell_at(center), 0);
    }

    #[test]
    fn test_find_cells_within_radius() {
        let planet = tiny_planet(42);

        let r0 = planet.find_cells_within_radius(0, 0);
        assert_eq!(r0, vec![0]);

        let r1 = planet.find_cells_within_radius(0, 1);
        assert_eq!(r1.len(), 1 + planet.get_neighbors(0).len());

        let r2 = planet.find_cells_within_radius(0, 2);
        assert!(r2.len() > r1.len());
    }

    #[test]
    fn test_invalid_cell_id() {
        let planet = tiny_planet(42);

        assert!(planet.get_neighbors(999_999).is_empty());
        assert!(planet.find_cells_within_radius(999_999, 5).is_empty());
    }

    #[test]
    fn test_generation_is_deterministic() {
        // A single deformation cycle removes scheduling interleaving, so
        // two runs with the same seed produce identical planets.
        let build = || {
            let config = PlanetConfigBuilder::new()
                .seed(1234)
                .preset(PlanetPreset::Custom {
                    radius: 10.0,
                    subdivisions: vec![1, 1],
                })
                .deformation(1, 60)
                .unwrap()
                .continent_count(6)
                .unwrap()
                .build()
                .unwrap();
            TectonicPlanet::generate(config).unwrap()
        };
        let first = build();
        let second = build();

        assert_eq!(first.cell_count(), second.cell_count());
        for (a, b) in first.cells().iter().zip(second.cells().iter()) {
            assert_eq!(a.continent, b.continent);
            assert_eq!(a.biome, b.biome);
        }
    }
}
