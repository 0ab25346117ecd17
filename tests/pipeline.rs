//! End-to-end pipeline invariants
//!
//! Runs the complete generation pipeline on a small planet and checks the
//! structural guarantees every stage is supposed to preserve.

use std::collections::HashSet;

use tectonic_planet::*;

fn small_planet() -> TectonicPlanet {
    let config = PlanetConfigBuilder::new()
        .seed(99)
        .preset(PlanetPreset::Custom {
            radius: 10.0,
            subdivisions: vec![1, 2],
        })
        .deformation(3, 80)
        .unwrap()
        .continent_count(8)
        .unwrap()
        .build()
        .unwrap();
    TectonicPlanet::generate(config).unwrap()
}

#[test]
fn full_pipeline_preserves_manifold() {
    let planet = small_planet();
    let store = planet.store();

    // Base triangles plus every committed dual fan stay within the
    // two-triangles-per-edge bound.
    assert!(store.max_triangles_per_edge() <= 2);

    // Twin symmetry holds for the whole store
    for key in store.edge_keys() {
        let (forward, backward) = store.edge_half_edges(key).unwrap();
        let f = store.half_edge(forward).unwrap();
        let b = store.half_edge(backward).unwrap();
        assert_eq!(f.twin, backward);
        assert_eq!(b.twin, forward);
        assert_eq!(f.from, b.to);
        assert_eq!(f.to, b.from);
    }
}

#[test]
fn full_pipeline_covers_every_cell_with_one_continent() {
    let planet = small_planet();

    let mut seen: HashSet<usize> = HashSet::new();
    for continent in planet.continents() {
        for &cell in &continent.cells {
            assert!(seen.insert(cell), "cell {} claimed twice", cell);
        }
    }
    assert_eq!(seen.len(), planet.cell_count());

    for cell in planet.cells() {
        let id = cell.continent.expect("unclaimed cell");
        assert!(planet.continents()[id].cells.contains(&cell.id));
    }
}

#[test]
fn full_pipeline_produces_heights_and_biomes() {
    let planet = small_planet();

    let mut land = 0usize;
    let mut water = 0usize;
    for cell in planet.cells() {
        assert!(cell.height.is_finite());
        match cell.biome.expect("untagged cell") {
            biome if biome.is_water() => water += 1,
            _ => land += 1,
        }
    }
    // 8 continents at 2:1 oceanic odds virtually always yield both kinds;
    // a planet with neither land nor water means the height pass broke.
    assert!(land + water == planet.cell_count());
    assert!(planet.report().boundary_edges > 0);
}

#[test]
fn full_pipeline_polygons_reference_valid_geometry() {
    let planet = small_planet();
    let store = planet.store();
    let radius = planet.radius();

    for cell in planet.cells() {
        // Polygon corners sit on the sphere
        for &corner in &cell.polygon {
            let distance = store.position(corner).length();
            assert!((distance - radius).abs() < 1.0e-2);
        }

        // The fan triangulation covers the polygon (at least n - 2 triangles)
        assert!(cell.fan.len() >= cell.vertex_count() - 2);
        for &tri in &cell.fan {
            assert!(store.triangle(tri).is_some());
        }

        // Border edges close a cycle over the polygon corners
        assert_eq!(cell.border_edges.len(), cell.vertex_count());
    }
}

#[test]
fn full_pipeline_neighbor_graph_is_symmetric() {
    let planet = small_planet();

    for id in 0..planet.cell_count() {
        for &neighbor in planet.get_neighbors(id) {
            assert!(
                planet.get_neighbors(neighbor).contains(&id),
                "asymmetric adjacency between {} and {}",
                id,
                neighbor
            );
        }
    }
}

#[test]
fn boundary_cells_know_their_opposing_continent() {
    let planet = small_planet();

    for cell in planet.cells() {
        if !cell.is_border {
            assert!(cell.boundary_neighbors.is_empty());
            continue;
        }
        for (&edge, &other_continent) in &cell.boundary_neighbors {
            assert_ne!(Some(other_continent), cell.continent);

            // The edge really is shared with a cell of that continent
            let sharers = planet.cells_on_edge(edge);
            let other = sharers
                .iter()
                .find(|&&c| c != cell.id)
                .expect("boundary edge with a single cell");
            assert_eq!(planet.get_cell(*other).unwrap().continent, Some(other_continent));
        }
    }
}
