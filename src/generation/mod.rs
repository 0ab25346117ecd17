//! Mesh generation pipeline
//!
//! Runs the phase-gated sequence that turns a configuration into a dual
//! mesh: icosahedron subdivision, concurrent edge-flip deformation, and the
//! Voronoi dual build. Plate tectonics run afterwards in [`crate::tectonics`].

pub mod deformation;
mod delaunay;
pub mod icosahedron;
pub mod voronoi;

pub use deformation::{deform_mesh, DeformationStats};
pub use icosahedron::build_base_mesh;
pub use voronoi::{build_dual_mesh, DualMesh};

use crate::config::PlanetConfig;
use crate::error::Result;
use crate::topology::{SharedStore, TopologyStore};

/// Build the deformed base mesh and its Voronoi dual from a configuration
///
/// Advances the store through its generation phases: the base mesh is built
/// and deformed first, then the point count is frozen and the dual polygons
/// are committed on top.
pub fn generate_mesh(config: &PlanetConfig) -> Result<(TopologyStore, DualMesh, DeformationStats)> {
    let mut store = TopologyStore::new();
    build_base_mesh(
        &mut store,
        config.radius(),
        &config.subdivisions(),
        config.distribution,
    )?;
    store.advance_phase();

    let shared = SharedStore::new(store);
    let stats = deform_mesh(&shared, config)?;
    let mut store = shared.into_inner();

    store.advance_phase();
    let dual = build_dual_mesh(&mut store, config.radius())?;

    Ok((store, dual, stats))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PlanetPreset;
    use crate::topology::GenerationPhase;

    #[test]
    fn test_generate_mesh_phases_and_counts() {
        let config = PlanetConfig::builder()
            .seed(5)
            .preset(PlanetPreset::Custom {
                radius: 10.0,
                subdivisions: vec![1, 1],
            })
            .deformation(2, 40)
            .unwrap()
            .build()
            .unwrap();

        let (store, dual, stats) = generate_mesh(&config).unwrap();

        assert_eq!(store.phase(), GenerationPhase::DualMesh);
        assert_eq!(stats.attempted, 80);

        // Icosphere level 2 has 162 base points; the dual adds its corners
        assert_eq!(store.base_point_count(), 162);
        assert!(store.num_points() > 162);
        // Every site either produced a cell or was counted as skipped
        assert_eq!(dual.cells.len() + dual.skipped_sites, 162);
        assert!(dual.cells.len() >= 140);
        assert!(store.max_triangles_per_edge() <= 2);
    }
}
