//! Boundary stress computation, propagation, and the height pass
//!
//! Every polygon edge separating two continents gets an [`EdgeStress`]:
//! the relative plate velocity at the edge midpoint decomposed into
//! compression (normal to the edge) and shear (along it), classified into
//! convergent / divergent / transform / inactive. Stress then radiates
//! outward through the edge graph with distance-based attenuation, and a
//! final pass converts per-edge stress into per-vertex height deltas.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

use glam::Vec3;
use ordered_float::OrderedFloat;

use crate::cell::Biome;
use crate::config::PlanetConfig;
use crate::error::Result;
use crate::generation::voronoi::DualMesh;
use crate::tectonics::continent::Continent;
use crate::topology::{EdgeKey, TopologyStore};

/// Heap pops allowed per edge before propagation is cut short
const PROPAGATION_BUDGET_FACTOR: usize = 8;

/// Height thresholds used when tagging biomes after the height pass
const SEA_LEVEL: f32 = 0.0;
const MOUNTAIN_LEVEL: f32 = 0.9;

/// Kind of tectonic activity on an edge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StressClass {
    /// Below the activity threshold, or stress received by propagation only
    Inactive,
    /// Shear-dominated: plates sliding past each other
    Transform,
    /// Compression-dominated with plates separating
    Divergent,
    /// Compression-dominated with plates colliding
    Convergent,
}

/// Stress state of one polygon edge
#[derive(Debug, Clone, Copy)]
pub struct EdgeStress {
    pub edge: EdgeKey,
    /// Signed normal component of the relative velocity (positive = closing)
    pub compression: f32,
    /// Signed tangential component of the relative velocity
    pub shear: f32,
    /// Overall magnitude (attenuated for propagated edges)
    pub magnitude: f32,
    pub class: StressClass,
    /// Dominant stress direction, used for propagation alignment
    pub direction: Vec3,
}

/// Stress over the whole dual mesh: boundary edges plus everything the
/// propagation reached
#[derive(Debug, Default)]
pub struct StressField {
    pub edges: HashMap<EdgeKey, EdgeStress>,
    /// Number of boundary (directly stressed) edges
    pub boundary_count: usize,
}

/// Compute boundary stress and propagate it through the edge graph
pub fn compute_stress_field(
    dual: &DualMesh,
    store: &TopologyStore,
    continents: &[Continent],
    config: &PlanetConfig,
) -> Result<StressField> {
    let mut field = StressField::default();

    // Edge-key order keeps the sweep reproducible for a given seed
    let mut edges: Vec<_> = dual.cells_by_edge.keys().copied().collect();
    edges.sort_unstable();
    for edge in edges {
        let sharers = &dual.cells_by_edge[&edge];
        let [a, b] = sharers.as_slice() else {
            continue;
        };
        let (cell_a, cell_b) = (&dual.cells[*a], &dual.cells[*b]);
        let (Some(ca), Some(cb)) = (cell_a.continent, cell_b.continent) else {
            continue;
        };
        if ca == cb {
            continue;
        }

        let stress = boundary_stress(
            edge,
            store,
            &continents[ca],
            &continents[cb],
            cell_a.center,
            cell_b.center,
            config,
        );
        field.edges.insert(edge, stress);
    }
    field.boundary_count = field.edges.len();

    propagate(&mut field, dual, store, config);

    log::debug!(
        "stress field: {} boundary edges, {} total after propagation",
        field.boundary_count,
        field.edges.len()
    );
    Ok(field)
}

/// Decompose the relative velocity at one boundary edge
fn boundary_stress(
    edge: EdgeKey,
    store: &TopologyStore,
    from: &Continent,
    toward: &Continent,
    from_center: Vec3,
    toward_center: Vec3,
    config: &PlanetConfig,
) -> EdgeStress {
    let pa = store.position(edge.a());
    let pb = store.position(edge.b());
    let midpoint = (pa + pb) * 0.5;

    let tangent = (pb - pa).normalize_or_zero();
    // In-surface edge normal, oriented from the `from` cell toward `toward`
    let mut normal = midpoint.normalize_or_zero().cross(tangent);
    if normal.dot(toward_center - from_center) < 0.0 {
        normal = -normal;
    }

    let relative = from.velocity_at(midpoint) - toward.velocity_at(midpoint);
    let compression = relative.dot(normal) * config.compression_scale;
    let shear = relative.dot(tangent) * config.shear_scale;
    let class = classify(compression, shear, config);

    EdgeStress {
        edge,
        compression,
        shear,
        magnitude: (compression * compression + shear * shear).sqrt(),
        class,
        direction: if class == StressClass::Transform {
            tangent
        } else {
            normal
        },
    }
}

/// Classify a compression/shear pair
///
/// Below the activity threshold everything is inactive. Otherwise the
/// normalized shear has to dominate normalized compression by the transform
/// ratio to classify as transform; remaining edges are convergent or
/// divergent by the compression sign.
pub(crate) fn classify(compression: f32, shear: f32, config: &PlanetConfig) -> StressClass {
    let magnitude = (compression * compression + shear * shear).sqrt();
    if magnitude < config.activity_threshold {
        return StressClass::Inactive;
    }

    let normal_part = compression.abs() / magnitude;
    let shear_part = shear.abs() / magnitude;
    if shear_part > config.transform_ratio * normal_part {
        StressClass::Transform
    } else if compression >= 0.0 {
        StressClass::Convergent
    } else {
        StressClass::Divergent
    }
}

/// Attenuated magnitude at a propagation distance
#[inline]
pub(crate) fn attenuate(magnitude: f32, distance: f32, falloff: f32, alignment: f32) -> f32 {
    magnitude * (-distance / falloff).exp() * alignment
}

/// Multi-source shortest-distance propagation over the edge graph
///
/// Each reached edge takes its stress from the nearest boundary source,
/// attenuated by distance and by how well the hop direction lines up with
/// the source's stress direction. A pop budget bounds the sweep; hitting it
/// is a normal stop, not a failure.
fn propagate(field: &mut StressField, dual: &DualMesh, store: &TopologyStore, config: &PlanetConfig) {
    let adjacency = edge_adjacency(dual);
    let midpoint = |edge: EdgeKey| {
        (store.position(edge.a()) + store.position(edge.b())) * 0.5
    };

    type Entry = Reverse<(OrderedFloat<f32>, EdgeKey, EdgeKey)>;
    let mut heap: BinaryHeap<Entry> = BinaryHeap::new();

    for (&edge, stress) in &field.edges {
        if stress.class == StressClass::Inactive {
            continue;
        }
        let from = midpoint(edge);
        if let Some(neighbors) = adjacency.get(&edge) {
            for &next in neighbors {
                let distance = (midpoint(next) - from).length();
                heap.push(Reverse((OrderedFloat(distance), next, edge)));
            }
        }
    }

    let mut budget = adjacency.len().saturating_mul(PROPAGATION_BUDGET_FACTOR);
    while let Some(Reverse((OrderedFloat(distance), edge, source_edge))) = heap.pop() {
        if budget == 0 {
            log::debug!("stress propagation budget exhausted, stopping sweep");
            break;
        }
        budget -= 1;

        if distance > config.max_propagation_distance || field.edges.contains_key(&edge) {
            continue;
        }

        let source = field.edges[&source_edge];
        let hop = (midpoint(edge) - midpoint(source.edge)).normalize_or_zero();
        let alignment = source.direction.dot(hop).abs();
        let magnitude = attenuate(source.magnitude, distance, config.stress_falloff, alignment);

        field.edges.insert(
            edge,
            EdgeStress {
                edge,
                compression: 0.0,
                shear: 0.0,
                magnitude,
                class: StressClass::Inactive,
                direction: source.direction,
            },
        );

        let from = midpoint(edge);
        if let Some(neighbors) = adjacency.get(&edge) {
            for &next in neighbors {
                if field.edges.contains_key(&next) {
                    continue;
                }
                let hop_distance = (midpoint(next) - from).length();
                heap.push(Reverse((
                    OrderedFloat(distance + hop_distance),
                    next,
                    source.edge,
                )));
            }
        }
    }
}

/// Edges adjacent through a shared cell
fn edge_adjacency(dual: &DualMesh) -> HashMap<EdgeKey, Vec<EdgeKey>> {
    let mut adjacency: HashMap<EdgeKey, Vec<EdgeKey>> = HashMap::new();
    for cell in &dual.cells {
        for &edge in &cell.border_edges {
            let entry = adjacency.entry(edge).or_default();
            for &other in &cell.border_edges {
                if other != edge && !entry.contains(&other) {
                    entry.push(other);
                }
            }
        }
    }
    adjacency
}

/// Convert edge stress into vertex height deltas, then derive cell heights
/// and biome tags
///
/// Transform edges push their endpoints up by scaled shear; convergent and
/// divergent edges move them by signed scaled compression (trenches go
/// down); propagated edges contribute their attenuated magnitude.
pub fn apply_height_deltas(
    dual: &mut DualMesh,
    store: &mut TopologyStore,
    field: &StressField,
    config: &PlanetConfig,
) {
    // Deltas accumulate in edge-key order so the float sums (and the biome
    // thresholds they feed) come out identical run to run
    let mut stressed: Vec<&EdgeStress> = field.edges.values().collect();
    stressed.sort_unstable_by_key(|s| s.edge);
    for stress in stressed {
        let delta = match stress.class {
            StressClass::Transform => stress.shear.abs() * config.shear_height_scale,
            StressClass::Convergent | StressClass::Divergent => {
                stress.compression * config.compression_height_scale
            }
            StressClass::Inactive => stress.magnitude * config.inactive_height_scale,
        };
        for point in [stress.edge.a(), stress.edge.b()] {
            store.point_mut(point).height += delta;
        }
    }

    for cell in &mut dual.cells {
        let corner_delta: f32 = cell
            .polygon
            .iter()
            .map(|&p| store.point(p).height)
            .sum::<f32>()
            / cell.vertex_count().max(1) as f32;
        cell.height += corner_delta;

        let biome = Biome::from_height(cell.height, SEA_LEVEL, MOUNTAIN_LEVEL);
        cell.biome = Some(biome);
        for &corner in &cell.polygon {
            let point = store.point_mut(corner);
            if point.biome.is_none() {
                point.biome = Some(biome);
            }
            if let Some(id) = cell.continent {
                point.continents.insert(id);
            }
        }
    }
}
