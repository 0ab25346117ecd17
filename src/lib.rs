//! Plate-tectonic planet mesh generation
//!
//! A standalone library that grows a Voronoi-tessellated sphere with
//! tectonic continents, boundary stress, and a height field, suitable for
//! use with any game engine (Bevy, Godot, etc.)
//!
//! The pipeline: a subdivided icosahedron, randomized edge-flip deformation
//! over a shared half-edge store, the spherical Voronoi dual, a two-phase
//! continent flood fill, and a stress pass that turns plate motion into
//! per-vertex heights and biome tags.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use tectonic_planet::*;
//!
//! let config = PlanetConfigBuilder::new()
//!     .seed(42)
//!     .preset(PlanetPreset::Small)
//!     .continent_count(16).unwrap()
//!     .build().unwrap();
//!
//! let planet = TectonicPlanet::generate(config).unwrap();
//! println!("Generated {} cells on {} continents",
//!     planet.cell_count(), planet.continents().len());
//! ```
//!
//! # Features
//!
//! - `spatial-index` (default): O(log n) position-to-cell lookups using a KD-tree
//! - `serde`: serialization support for the configuration types

// Modules
pub mod cell;
pub mod config;
pub mod error;
pub mod generation;
pub mod planet;
pub mod tectonics;
pub mod topology;

#[cfg(feature = "spatial-index")]
pub mod spatial;

// Re-export core types for convenience
pub use cell::{Biome, VoronoiCell};
pub use config::{PlanetConfig, PlanetConfigBuilder, PlanetPreset, VertexDistribution};
pub use error::{PlanetError, Result};
pub use generation::{DeformationStats, DualMesh};
pub use planet::{GenerationReport, TectonicPlanet};
pub use tectonics::{Continent, CrustKind, EdgeStress, StressClass, StressField};
pub use topology::{EdgeKey, GenerationPhase, PointId, SharedStore, TopologyStore};

#[cfg(feature = "spatial-index")]
pub use spatial::SpatialIndex;

// Re-export glam vectors for convenience
pub use glam::{Vec2, Vec3};
