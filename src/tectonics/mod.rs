//! Plate tectonics over the Voronoi dual: continent partitioning,
//! boundary stress, and the resulting height field

pub mod continent;
pub mod stress;

pub use continent::{partition_continents, Continent, CrustKind};
pub use stress::{
    apply_height_deltas, compute_stress_field, EdgeStress, StressClass, StressField,
};
