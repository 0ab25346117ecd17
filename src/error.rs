//! Error types for planet generation

use std::fmt;

/// Errors that can occur during mesh construction or tectonic simulation
///
/// Most geometric anomalies are absorbed where they are detected (a degenerate
/// triangle is skipped, an iteration cap is a normal stop). Only structural
/// manifold violations surface to callers, since ignoring those would corrupt
/// every downstream dual/stress computation.
#[derive(Debug, Clone)]
pub enum PlanetError {
    /// Configuration validation failed
    InvalidConfig(String),
    /// A topology operation received inconsistent input (wrong point count,
    /// flip on an edge with fewer than 2 triangles, a third triangle on an edge)
    InvalidTopology(String),
    /// Zero-area triangle or collinear points during triangulation
    DegenerateGeometry(String),
    /// An iteration cap was reached before the refinement settled
    ResourceExhausted(String),
}

impl fmt::Display for PlanetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlanetError::InvalidConfig(msg) => write!(f, "invalid configuration: {}", msg),
            PlanetError::InvalidTopology(msg) => write!(f, "invalid topology: {}", msg),
            PlanetError::DegenerateGeometry(msg) => write!(f, "degenerate geometry: {}", msg),
            PlanetError::ResourceExhausted(msg) => write!(f, "resource exhausted: {}", msg),
        }
    }
}

impl std::error::Error for PlanetError {}

/// Result type alias for planet generation operations
pub type Result<T> = std::result::Result<T, PlanetError>;
