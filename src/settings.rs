//! Generation settings
//!
//! Every settings struct deserializes from JSON with per-field defaults, so a
//! config file only needs to name what it changes. Range checks live in the
//! `validate_values` methods and are applied at the boundary (file load, CLI),
//! never inside the generators.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::curve::HeightCurve;
use crate::error::{Result, TerrainError};
use crate::falloff::{FalloffMetric, DEFAULT_SIZE, DEFAULT_STRENGTH};

// =============================================================================
// NOISE
// =============================================================================

/// How raw fBm sums are squashed into `[0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NormalizeMode {
    /// Inverse-lerp by the min/max observed in this map. Best contrast, but
    /// neighbouring maps with different centres won't line up.
    #[default]
    Local,
    /// Divide by the theoretical amplitude sum. Consistent across maps.
    Global,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseSettings {
    pub normalize_mode: NormalizeMode,
    /// Feature size in cells (higher = broader hills)
    pub scale: f32,
    pub octaves: u32,
    /// Amplitude decay per octave (0.0-1.0)
    pub persistence: f32,
    /// Frequency multiplier per octave
    pub lacunarity: f32,
    pub seed: u64,
    pub offset: (f32, f32),
}

impl Default for NoiseSettings {
    fn default() -> Self {
        Self {
            normalize_mode: NormalizeMode::Local,
            scale: 50.0,
            octaves: 6,
            persistence: 0.6,
            lacunarity: 2.0,
            seed: 0,
            offset: (0.0, 0.0),
        }
    }
}

impl NoiseSettings {
    pub fn validate_values(&mut self) {
        self.scale = self.scale.max(0.01);
        self.octaves = self.octaves.max(1);
        self.lacunarity = self.lacunarity.max(1.0);
        self.persistence = self.persistence.clamp(0.0, 1.0);
    }
}

// =============================================================================
// HEIGHT MAP
// =============================================================================

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeightMapSettings {
    pub noise: NoiseSettings,

    pub use_falloff: bool,
    pub falloff_metric: FalloffMetric,
    /// Edge steepness, 1-10. Higher = steeper coast
    pub falloff_strength: f32,
    /// Island size, 0.5-5. Higher = smaller island
    pub falloff_size: f32,
    /// How much of the mask is subtracted, 0-1
    pub falloff_intensity: f32,

    pub height_multiplier: f32,
    pub height_curve: HeightCurve,
}

impl Default for HeightMapSettings {
    fn default() -> Self {
        Self {
            noise: NoiseSettings::default(),
            use_falloff: true,
            falloff_metric: FalloffMetric::Circular,
            falloff_strength: DEFAULT_STRENGTH,
            falloff_size: DEFAULT_SIZE,
            falloff_intensity: 1.0,
            height_multiplier: 30.0,
            height_curve: HeightCurve::identity(),
        }
    }
}

impl HeightMapSettings {
    /// Clamp falloff parameters into their supported ranges.
    pub fn validate_values(&mut self) {
        self.noise.validate_values();
        self.falloff_strength = self.falloff_strength.max(1.0);
        self.falloff_size = self.falloff_size.max(0.5);
        self.falloff_intensity = self.falloff_intensity.clamp(0.0, 1.0);
    }

    /// Validated copy, leaving `self` untouched.
    pub fn validated(&self) -> Self {
        let mut copy = self.clone();
        copy.validate_values();
        copy
    }

    /// Height of a cell whose remapped value is 0.
    pub fn min_height(&self) -> f32 {
        self.height_multiplier * self.height_curve.evaluate(0.0)
    }

    /// Height of a cell whose remapped value is 1.
    pub fn max_height(&self) -> f32 {
        self.height_multiplier * self.height_curve.evaluate(1.0)
    }
}

// =============================================================================
// MESH
// =============================================================================

pub const NUM_SUPPORTED_LODS: usize = 5;
pub const SUPPORTED_CHUNK_SIZES: [usize; 9] = [48, 72, 96, 120, 144, 168, 192, 216, 240];

/// Mesh resolution. The mesh itself is built downstream; the island only
/// needs the vertex count (grid size) and the world extent.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeshSettings {
    pub mesh_scale: f32,
    pub chunk_size_index: usize,
}

impl Default for MeshSettings {
    fn default() -> Self {
        Self {
            mesh_scale: 2.5,
            chunk_size_index: SUPPORTED_CHUNK_SIZES.len() - 1,
        }
    }
}

impl MeshSettings {
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size_index >= SUPPORTED_CHUNK_SIZES.len() {
            return Err(TerrainError::InvalidArgument(format!(
                "chunk size index {} out of range (0..{})",
                self.chunk_size_index,
                SUPPORTED_CHUNK_SIZES.len()
            )));
        }
        if !(self.mesh_scale > 0.0) {
            return Err(TerrainError::InvalidArgument(format!(
                "mesh scale must be positive, got {}",
                self.mesh_scale
            )));
        }
        Ok(())
    }

    /// Vertices per mesh edge, including the border ring used for normals.
    pub fn num_verts_per_line(&self) -> usize {
        SUPPORTED_CHUNK_SIZES[self.chunk_size_index.min(SUPPORTED_CHUNK_SIZES.len() - 1)] + 5
    }

    pub fn mesh_world_size(&self) -> f32 {
        (self.num_verts_per_line() - 3) as f32 * self.mesh_scale
    }
}

// =============================================================================
// WATER
// =============================================================================

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LakeSettings {
    pub generate: bool,
    pub water_level: f32,
    /// Minimum surface area in square world units
    pub min_lake_size: f32,
    /// Sample every N cells
    pub grid_resolution: usize,
    pub lake_depth: f32,
}

impl Default for LakeSettings {
    fn default() -> Self {
        Self {
            generate: true,
            water_level: 0.0,
            min_lake_size: 100.0,
            grid_resolution: 10,
            lake_depth: 5.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OceanSettings {
    pub generate: bool,
    pub size: f32,
}

impl Default for OceanSettings {
    fn default() -> Self {
        Self { generate: true, size: 2000.0 }
    }
}

// =============================================================================
// ISLAND
// =============================================================================

/// Everything the island pipeline needs. `mesh` and `height_map` are the
/// collaborators every step depends on; setting either to `null` in a config
/// file makes generation fail with `MissingDependency`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IslandConfig {
    pub mesh: Option<MeshSettings>,
    pub height_map: Option<HeightMapSettings>,
    pub island_lod: usize,
    pub lakes: LakeSettings,
    pub ocean: OceanSettings,
}

impl Default for IslandConfig {
    fn default() -> Self {
        Self {
            mesh: Some(MeshSettings::default()),
            height_map: Some(HeightMapSettings::default()),
            island_lod: 0,
            lakes: LakeSettings::default(),
            ocean: OceanSettings::default(),
        }
    }
}

impl IslandConfig {
    /// Load from a JSON file and clamp values into range.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let mut config: IslandConfig = serde_json::from_str(&text)?;
        config.validate_values();
        Ok(config)
    }

    pub fn validate_values(&mut self) {
        if let Some(height_map) = self.height_map.as_mut() {
            height_map.validate_values();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_falloff_clamps() {
        let mut settings = HeightMapSettings {
            falloff_strength: 0.2,
            falloff_size: 0.1,
            falloff_intensity: 1.7,
            ..Default::default()
        };
        settings.validate_values();
        assert_eq!(settings.falloff_strength, 1.0);
        assert_eq!(settings.falloff_size, 0.5);
        assert_eq!(settings.falloff_intensity, 1.0);

        settings.falloff_intensity = -0.3;
        assert_eq!(settings.validated().falloff_intensity, 0.0);
        // validated() leaves the original alone
        assert_eq!(settings.falloff_intensity, -0.3);
    }

    #[test]
    fn test_noise_clamps() {
        let mut noise = NoiseSettings {
            scale: 0.0,
            octaves: 0,
            persistence: 2.0,
            lacunarity: 0.5,
            ..Default::default()
        };
        noise.validate_values();
        assert_eq!(noise.scale, 0.01);
        assert_eq!(noise.octaves, 1);
        assert_eq!(noise.persistence, 1.0);
        assert_eq!(noise.lacunarity, 1.0);
    }

    #[test]
    fn test_min_max_height() {
        let settings = HeightMapSettings {
            height_multiplier: 40.0,
            height_curve: HeightCurve::linear(0.0, -0.1, 1.0, 1.0),
            ..Default::default()
        };
        assert_abs_diff_eq!(settings.min_height(), -4.0, epsilon = 1e-5);
        assert_abs_diff_eq!(settings.max_height(), 40.0, epsilon = 1e-5);
    }

    #[test]
    fn test_mesh_sizes() {
        let mesh = MeshSettings { mesh_scale: 2.5, chunk_size_index: 0 };
        assert_eq!(mesh.num_verts_per_line(), 53);
        assert_abs_diff_eq!(mesh.mesh_world_size(), 125.0);

        let bad = MeshSettings { chunk_size_index: 9, ..Default::default() };
        assert!(matches!(bad.validate(), Err(TerrainError::InvalidArgument(_))));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let json = r#"{
            "height_map": { "falloff_strength": 0.5, "falloff_metric": "square" },
            "lakes": { "water_level": 3.5 }
        }"#;
        let mut config: IslandConfig = serde_json::from_str(json).unwrap();
        config.validate_values();

        let height_map = config.height_map.as_ref().unwrap();
        assert_eq!(height_map.falloff_metric, FalloffMetric::Square);
        assert_eq!(height_map.falloff_strength, 1.0);
        assert_eq!(height_map.falloff_size, DEFAULT_SIZE);
        assert_eq!(config.lakes.water_level, 3.5);
        assert_eq!(config.lakes.grid_resolution, 10);
        assert!(config.mesh.is_some());
    }

    #[test]
    fn test_null_collaborator() {
        let config: IslandConfig = serde_json::from_str(r#"{ "height_map": null }"#).unwrap();
        assert!(config.height_map.is_none());
    }
}
