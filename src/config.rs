//! Planet Configuration and Builder
//!
//! This module provides configuration types for deterministic plate-tectonic
//! planet generation.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{PlanetError, Result};

/// How points are distributed along a subdivided triangle edge
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VertexDistribution {
    /// Evenly spaced parameterization: t = (i + 1) / (N + 1)
    Linear,
    /// Geometric progression: segment i has relative length ratio^i,
    /// cumulative sums normalized into (0, 1)
    Geometric {
        /// Ratio between consecutive segment lengths (must be > 0)
        ratio: f32,
    },
}

impl Default for VertexDistribution {
    fn default() -> Self {
        VertexDistribution::Linear
    }
}

/// Planet size presets
///
/// Each size maps to a sphere radius and a subdivision schedule (one
/// vertices-per-edge count per level). More levels and higher counts mean
/// more triangles and finer Voronoi cells.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub enum PlanetPreset {
    /// ~1,280 base triangles, radius 10
    Tiny,
    /// ~11,520 base triangles, radius 20
    Small,
    /// ~32,000 base triangles, radius 30
    Medium,
    /// ~80,000 base triangles, radius 45 (default)
    Large,
    /// Custom radius and subdivision schedule
    Custom {
        /// Sphere radius in world units
        radius: f32,
        /// Vertices per edge for each subdivision level
        subdivisions: Vec<u32>,
    },
}

impl PlanetPreset {
    /// Get the sphere radius for this preset
    pub fn radius(&self) -> f32 {
        match self {
            PlanetPreset::Tiny => 10.0,
            PlanetPreset::Small => 20.0,
            PlanetPreset::Medium => 30.0,
            PlanetPreset::Large => 45.0,
            PlanetPreset::Custom { radius, .. } => *radius,
        }
    }

    /// Get the subdivision schedule (vertices per edge, one entry per level)
    pub fn subdivisions(&self) -> Vec<u32> {
        match self {
            PlanetPreset::Tiny => vec![1, 1, 1],
            PlanetPreset::Small => vec![1, 1, 5],
            PlanetPreset::Medium => vec![3, 1, 4],
            PlanetPreset::Large => vec![3, 4, 3],
            PlanetPreset::Custom { subdivisions, .. } => subdivisions.clone(),
        }
    }

    /// Get a human-readable name for this preset
    pub fn name(&self) -> &'static str {
        match self {
            PlanetPreset::Tiny => "Tiny",
            PlanetPreset::Small => "Small",
            PlanetPreset::Medium => "Medium",
            PlanetPreset::Large => "Large",
            PlanetPreset::Custom { .. } => "Custom",
        }
    }
}

impl Default for PlanetPreset {
    fn default() -> Self {
        PlanetPreset::Tiny
    }
}

/// Configuration for deterministic plate-tectonic planet generation
///
/// The same configuration always produces the same planet topology and the
/// same continent layout (up to floating-point platform differences).
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct PlanetConfig {
    /// Random seed shared by deformation, flood fill, and kinematics
    pub seed: u32,

    /// Size preset (radius + subdivision schedule)
    pub preset: PlanetPreset,

    /// Override the radius from the preset
    pub radius_override: Option<f32>,

    /// Edge-point distribution used during subdivision
    pub distribution: VertexDistribution,

    /// Number of independent deformation cycles (run concurrently)
    pub deformation_cycles: usize,

    /// Random edge-flip attempts per deformation cycle
    pub deformation_attempts: usize,

    /// Number of continents seeded by the flood fill
    pub continent_count: usize,

    /// Scale applied to the normal velocity difference at a boundary edge
    pub compression_scale: f32,

    /// Scale applied to the tangential velocity difference at a boundary edge
    pub shear_scale: f32,

    /// Shear must exceed compression by this ratio to classify as transform
    pub transform_ratio: f32,

    /// Combined normalized magnitude below which a boundary edge is inactive
    pub activity_threshold: f32,

    /// e-folding distance for propagated stress attenuation
    pub stress_falloff: f32,

    /// Maximum distance stress propagates from a boundary edge
    pub max_propagation_distance: f32,

    /// Height delta per unit shear on transform edges
    pub shear_height_scale: f32,

    /// Height delta per unit compression on convergent/divergent edges
    pub compression_height_scale: f32,

    /// Height delta per unit propagated magnitude on inactive edges
    pub inactive_height_scale: f32,
}

impl PlanetConfig {
    /// Start building a configuration
    pub fn builder() -> PlanetConfigBuilder {
        PlanetConfigBuilder::new()
    }

    /// Get the sphere radius for this configuration
    ///
    /// Returns the radius_override if set, otherwise the preset radius.
    #[inline]
    pub fn radius(&self) -> f32 {
        self.radius_override.unwrap_or_else(|| self.preset.radius())
    }

    /// Get the subdivision schedule for this configuration
    #[inline]
    pub fn subdivisions(&self) -> Vec<u32> {
        self.preset.subdivisions()
    }
}

impl Default for PlanetConfig {
    fn default() -> Self {
        PlanetConfigBuilder::new().build().unwrap()
    }
}

/// Builder for creating PlanetConfig with validation
///
/// # Example
///
/// ```rust
/// use tectonic_planet::*;
///
/// let config = PlanetConfigBuilder::new()
///     .seed(42)
///     .preset(PlanetPreset::Tiny)
///     .continent_count(8)
///     .unwrap()
///     .deformation(4, 200)
///     .unwrap()
///     .build()
///     .unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct PlanetConfigBuilder {
    seed: Option<u32>,
    preset: PlanetPreset,
    radius_override: Option<f32>,
    distribution: VertexDistribution,
    deformation_cycles: usize,
    deformation_attempts: usize,
    continent_count: usize,
    compression_scale: f32,
    shear_scale: f32,
    transform_ratio: f32,
    activity_threshold: f32,
    stress_falloff: f32,
    max_propagation_distance: f32,
    shear_height_scale: f32,
    compression_height_scale: f32,
    inactive_height_scale: f32,
}

impl PlanetConfigBuilder {
    /// Create a new builder with default values
    ///
    /// Defaults:
    /// - seed: Random (generated from thread_rng)
    /// - preset: Tiny
    /// - distribution: Linear
    /// - deformation: 4 cycles x 120 attempts
    /// - continents: 12
    /// - stress scales: compression 1.0, shear 1.0
    /// - propagation: falloff 2.0, max distance 6.0
    pub fn new() -> Self {
        Self {
            seed: None,
            preset: PlanetPreset::default(),
            radius_override: None,
            distribution: VertexDistribution::default(),
            deformation_cycles: 4,
            deformation_attempts: 120,
            continent_count: 12,
            compression_scale: 1.0,
            shear_scale: 1.0,
            transform_ratio: 2.0,
            activity_threshold: 0.05,
            stress_falloff: 2.0,
            max_propagation_distance: 6.0,
            shear_height_scale: 0.4,
            compression_height_scale: 1.0,
            inactive_height_scale: 0.1,
        }
    }

    /// Set the random seed for planet generation
    pub fn seed(mut self, seed: u32) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set the planet size preset
    pub fn preset(mut self, preset: PlanetPreset) -> Self {
        self.preset = preset;
        self
    }

    /// Set the subdivision edge-point distribution
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` for a geometric distribution with a
    /// non-positive ratio.
    pub fn distribution(mut self, distribution: VertexDistribution) -> Result<Self> {
        if let VertexDistribution::Geometric { ratio } = distribution {
            if ratio <= 0.0 {
                return Err(PlanetError::InvalidConfig(format!(
                    "geometric ratio must be positive (got {})",
                    ratio
                )));
            }
        }
        self.distribution = distribution;
        Ok(self)
    }

    /// Override the sphere radius
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if radius <= 0.0
    pub fn radius_override(mut self, radius: f32) -> Result<Self> {
        if radius <= 0.0 {
            return Err(PlanetError::InvalidConfig(format!(
                "radius override must be positive (got {})",
                radius
            )));
        }
        self.radius_override = Some(radius);
        Ok(self)
    }

    /// Set deformation cycle and per-cycle attempt counts
    ///
    /// Cycles run concurrently on the worker pool; attempts are random
    /// edge-flip trials. Zero cycles disables deformation.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if attempts is 0 while cycles is nonzero.
    pub fn deformation(mut self, cycles: usize, attempts: usize) -> Result<Self> {
        if cycles > 0 && attempts == 0 {
            return Err(PlanetError::InvalidConfig(
                "deformation cycles require at least 1 attempt each".into(),
            ));
        }
        self.deformation_cycles = cycles;
        self.deformation_attempts = attempts;
        Ok(self)
    }

    /// Set the number of continents
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if count is 0.
    pub fn continent_count(mut self, count: usize) -> Result<Self> {
        if count == 0 {
            return Err(PlanetError::InvalidConfig(
                "at least one continent is required".into(),
            ));
        }
        self.continent_count = count;
        Ok(self)
    }

    /// Set the compression and shear stress scales
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if either scale is negative.
    pub fn stress_scales(mut self, compression: f32, shear: f32) -> Result<Self> {
        if compression < 0.0 || shear < 0.0 {
            return Err(PlanetError::InvalidConfig(format!(
                "stress scales must be non-negative (got {}, {})",
                compression, shear
            )));
        }
        self.compression_scale = compression;
        self.shear_scale = shear;
        Ok(self)
    }

    /// Set classification thresholds: shear-dominance ratio and the combined
    /// activity floor
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if ratio < 1 or threshold is negative.
    pub fn classification_thresholds(
        mut self,
        transform_ratio: f32,
        activity: f32,
    ) -> Result<Self> {
        if transform_ratio < 1.0 {
            return Err(PlanetError::InvalidConfig(format!(
                "transform ratio must be >= 1 (got {})",
                transform_ratio
            )));
        }
        if activity < 0.0 {
            return Err(PlanetError::InvalidConfig(format!(
                "activity threshold must be >= 0 (got {})",
                activity
            )));
        }
        self.transform_ratio = transform_ratio;
        self.activity_threshold = activity;
        Ok(self)
    }

    /// Set stress propagation falloff and maximum distance
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if either value is non-positive.
    pub fn propagation(mut self, falloff: f32, max_distance: f32) -> Result<Self> {
        if falloff <= 0.0 || max_distance <= 0.0 {
            return Err(PlanetError::InvalidConfig(format!(
                "propagation falloff and distance must be positive (got {}, {})",
                falloff, max_distance
            )));
        }
        self.stress_falloff = falloff;
        self.max_propagation_distance = max_distance;
        Ok(self)
    }

    /// Set the per-classification height scales (transform, convergent/divergent, inactive)
    pub fn height_scales(mut self, shear: f32, compression: f32, inactive: f32) -> Self {
        self.shear_height_scale = shear;
        self.compression_height_scale = compression;
        self.inactive_height_scale = inactive;
        self
    }

    /// Build the configuration
    ///
    /// If no seed was provided, generates a random seed using thread_rng.
    pub fn build(self) -> Result<PlanetConfig> {
        let seed = self.seed.unwrap_or_else(rand::random);

        Ok(PlanetConfig {
            seed,
            preset: self.preset,
            radius_override: self.radius_override,
            distribution: self.distribution,
            deformation_cycles: self.deformation_cycles,
            deformation_attempts: self.deformation_attempts,
            continent_count: self.continent_count,
            compression_scale: self.compression_scale,
            shear_scale: self.shear_scale,
            transform_ratio: self.transform_ratio,
            activity_threshold: self.activity_threshold,
            stress_falloff: self.stress_falloff,
            max_propagation_distance: self.max_propagation_distance,
            shear_height_scale: self.shear_height_scale,
            compression_height_scale: self.compression_height_scale,
            inactive_height_scale: self.inactive_height_scale,
        })
    }
}

impl Default for PlanetConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preset_radii() {
        assert_eq!(PlanetPreset::Tiny.radius(), 10.0);
        assert_eq!(PlanetPreset::Small.radius(), 20.0);
        assert_eq!(PlanetPreset::Medium.radius(), 30.0);
        assert_eq!(PlanetPreset::Large.radius(), 45.0);
    }

    #[test]
    fn test_preset_custom() {
        let custom = PlanetPreset::Custom {
            radius: 55.0,
            subdivisions: vec![2, 2],
        };
        assert_eq!(custom.radius(), 55.0);
        assert_eq!(custom.subdivisions(), vec![2, 2]);
        assert_eq!(custom.name(), "Custom");
    }

    #[test]
    fn test_builder_defaults() {
        let config = PlanetConfigBuilder::new().build().unwrap();
        assert_eq!(config.preset, PlanetPreset::Tiny);
        assert_eq!(config.distribution, VertexDistribution::Linear);
        assert_eq!(config.deformation_cycles, 4);
        assert_eq!(config.continent_count, 12);
        assert_eq!(config.radius_override, None);
    }

    #[test]
    fn test_builder_custom() {
        let config = PlanetConfigBuilder::new()
            .seed(42)
            .preset(PlanetPreset::Small)
            .continent_count(7)
            .unwrap()
            .deformation(2, 50)
            .unwrap()
            .build()
            .unwrap();

        assert_eq!(config.seed, 42);
        assert_eq!(config.preset, PlanetPreset::Small);
        assert_eq!(config.continent_count, 7);
        assert_eq!(config.deformation_cycles, 2);
        assert_eq!(config.deformation_attempts, 50);
    }

    #[test]
    fn test_radius_override() {
        let config = PlanetConfigBuilder::new()
            .seed(42)
            .radius_override(100.0)
            .unwrap()
            .build()
            .unwrap();

        assert_eq!(config.radius(), 100.0);
    }

    #[test]
    fn test_radius_no_override() {
        let config = PlanetConfigBuilder::new()
            .seed(42)
            .preset(PlanetPreset::Medium)
            .build()
            .unwrap();

        assert_eq!(config.radius(), PlanetPreset::Medium.radius());
    }

    #[test]
    fn test_invalid_radius() {
        assert!(PlanetConfigBuilder::new().radius_override(0.0).is_err());
        assert!(PlanetConfigBuilder::new().radius_override(-5.0).is_err());
    }

    #[test]
    fn test_invalid_continent_count() {
        assert!(PlanetConfigBuilder::new().continent_count(0).is_err());
    }

    #[test]
    fn test_invalid_deformation() {
        assert!(PlanetConfigBuilder::new().deformation(3, 0).is_err());
        // Zero cycles disables deformation entirely, attempts irrelevant
        assert!(PlanetConfigBuilder::new().deformation(0, 0).is_ok());
    }

    #[test]
    fn test_invalid_geometric_ratio() {
        let result =
            PlanetConfigBuilder::new().distribution(VertexDistribution::Geometric { ratio: 0.0 });
        assert!(result.is_err());

        let result =
            PlanetConfigBuilder::new().distribution(VertexDistribution::Geometric { ratio: 1.2 });
        assert!(result.is_ok());
    }

    #[test]
    fn test_invalid_thresholds() {
        assert!(PlanetConfigBuilder::new()
            .classification_thresholds(0.5, 0.1)
            .is_err());
        assert!(PlanetConfigBuilder::new()
            .classification_thresholds(2.0, -0.1)
            .is_err());
        assert!(PlanetConfigBuilder::new().propagation(0.0, 5.0).is_err());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_config_serialization() {
        let config = PlanetConfigBuilder::new()
            .seed(12345)
            .preset(PlanetPreset::Medium)
            .build()
            .unwrap();

        let json = serde_json::to_string(&config).unwrap();
        let restored: PlanetConfig = serde_json::from_str(&json).unwrap();

        assert_eq!(config.seed, restored.seed);
        assert_eq!(config.preset, restored.preset);
    }
}
