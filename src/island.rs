//! Island pipeline: terrain, then lakes, then the ocean plane.
//!
//! Terrain is required; lakes and ocean are optional steps. A lake detection
//! failure is logged and leaves the island without lakes rather than
//! discarding the terrain that was already generated.

use tracing::{info, warn};

use crate::error::{Result, TerrainError};
use crate::falloff::generate_default_falloff_map;
use crate::heightmap::{generate_height_map, HeightMap};
use crate::noise_map::NoiseProvider;
use crate::settings::{HeightMapSettings, IslandConfig, MeshSettings, NUM_SUPPORTED_LODS};
use crate::tilemap::Grid;
use crate::water_bodies::{detect_water_bodies, LakeDetectionParams, WaterBody};

/// Flat square of sea surrounding the island.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
pub struct OceanPlane {
    pub height: f32,
    pub size: f32,
}

/// Result of a full generation run.
#[derive(Clone, Debug)]
pub struct Island {
    pub height_map: HeightMap,
    pub water_bodies: Vec<WaterBody>,
    pub ocean: Option<OceanPlane>,
    pub world_size: f32,
    pub lod: usize,
}

impl Island {
    /// Square falloff at the island's resolution with the preview defaults.
    pub fn falloff_preview(&self) -> Result<Grid<f32>> {
        generate_default_falloff_map(self.height_map.width())
    }
}

pub struct IslandGenerator {
    config: IslandConfig,
}

impl IslandGenerator {
    pub fn new(config: IslandConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &IslandConfig {
        &self.config
    }

    /// Check that every collaborator is present and in range.
    pub fn validate_settings(&self) -> Result<(&MeshSettings, &HeightMapSettings)> {
        let mesh = self
            .config
            .mesh
            .as_ref()
            .ok_or(TerrainError::MissingDependency("mesh settings"))?;
        let height_map = self
            .config
            .height_map
            .as_ref()
            .ok_or(TerrainError::MissingDependency("height map settings"))?;
        mesh.validate()?;
        if self.config.island_lod >= NUM_SUPPORTED_LODS {
            return Err(TerrainError::InvalidArgument(format!(
                "island LOD {} out of range (0..{})",
                self.config.island_lod, NUM_SUPPORTED_LODS
            )));
        }
        Ok((mesh, height_map))
    }

    pub fn generate(&self, provider: &dyn NoiseProvider) -> Result<Island> {
        info!("starting island generation");
        let (mesh, height_map_settings) = self.validate_settings()?;

        let size = mesh.num_verts_per_line();
        let world_size = mesh.mesh_world_size();
        info!(size, world_size, "generating terrain");
        let height_map = generate_height_map(size, size, height_map_settings, (0.0, 0.0), provider)?;

        let water_bodies = if self.config.lakes.generate {
            self.generate_lakes(&height_map, world_size)
        } else {
            Vec::new()
        };

        let ocean = self.config.ocean.generate.then(|| OceanPlane {
            height: self.config.lakes.water_level,
            size: self.config.ocean.size,
        });

        info!(lakes = water_bodies.len(), ocean = ocean.is_some(), "island generation complete");
        Ok(Island {
            height_map,
            water_bodies,
            ocean,
            world_size,
            lod: self.config.island_lod,
        })
    }

    fn generate_lakes(&self, height_map: &HeightMap, world_size: f32) -> Vec<WaterBody> {
        let params = LakeDetectionParams::from(self.config.lakes.clone());
        match detect_water_bodies(height_map.values(), &params, world_size) {
            Ok(lakes) => lakes,
            Err(e) => {
                warn!("skipping lakes: {}", e);
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curve::HeightCurve;
    use crate::settings::{NoiseSettings, OceanSettings};
    use approx::assert_abs_diff_eq;

    /// Noise that is a bowl: low in the middle, high at the rim.
    struct BowlNoise;

    impl NoiseProvider for BowlNoise {
        fn sample(&self, width: usize, height: usize, _: &NoiseSettings, _: (f32, f32)) -> Grid<f32> {
            Grid::from_fn(width, height, |x, y| {
                let dx = x as f32 / width as f32 - 0.5;
                let dy = y as f32 / height as f32 - 0.5;
                ((dx * dx + dy * dy).sqrt() * 2.0).min(1.0)
            })
        }
    }

    fn bowl_config() -> IslandConfig {
        let mut config = IslandConfig::default();
        config.mesh = Some(MeshSettings { mesh_scale: 1.0, chunk_size_index: 0 });
        config.height_map = Some(HeightMapSettings {
            use_falloff: false,
            height_multiplier: 10.0,
            height_curve: HeightCurve::identity(),
            ..Default::default()
        });
        // height = 10 * v^2, so the lake is everything with v < ~0.55
        config.lakes.water_level = 3.0;
        config.lakes.min_lake_size = 1.0;
        config
    }

    #[test]
    fn test_missing_collaborators() {
        let mut config = IslandConfig::default();
        config.height_map = None;
        let result = IslandGenerator::new(config).generate(&BowlNoise);
        assert!(matches!(result, Err(TerrainError::MissingDependency("height map settings"))));

        let mut config = IslandConfig::default();
        config.mesh = None;
        let result = IslandGenerator::new(config).generate(&BowlNoise);
        assert!(matches!(result, Err(TerrainError::MissingDependency("mesh settings"))));
    }

    #[test]
    fn test_lod_out_of_range() {
        let mut config = bowl_config();
        config.island_lod = NUM_SUPPORTED_LODS;
        let result = IslandGenerator::new(config).generate(&BowlNoise);
        assert!(matches!(result, Err(TerrainError::InvalidArgument(_))));
    }

    #[test]
    fn test_bowl_produces_one_lake() {
        let island = IslandGenerator::new(bowl_config()).generate(&BowlNoise).unwrap();

        assert_eq!(island.height_map.width(), 53);
        assert_eq!(island.world_size, 50.0);
        assert_eq!(island.water_bodies.len(), 1);

        let lake = &island.water_bodies[0];
        // Stride 10 lattice: (20..=30, 20..=30) plus (40, 30) and (30, 40)
        assert_eq!(lake.cell_count, 6);
        assert!(lake.cells.contains(&(40, 30)));
        assert!(lake.cells.contains(&(30, 40)));

        // Bounding box spans cells 20..=40 on both axes, which is off-centre on 53 cells
        let to_world = |cell: f32| (cell / 53.0 - 0.5) * 50.0;
        let expected_center = (to_world(20.0) + to_world(40.0)) / 2.0;
        let expected_size = to_world(40.0) - to_world(20.0);
        assert_abs_diff_eq!(lake.center[0], expected_center, epsilon = 1e-4);
        assert_abs_diff_eq!(lake.center[2], expected_center, epsilon = 1e-4);
        assert_abs_diff_eq!(lake.center[0], 3.302, epsilon = 1e-3);
        assert_abs_diff_eq!(lake.size[0], expected_size, epsilon = 1e-4);
        assert_abs_diff_eq!(lake.size[1], 18.868, epsilon = 1e-3);
        assert_eq!(island.ocean, Some(OceanPlane { height: 3.0, size: 2000.0 }));
    }

    #[test]
    fn test_bad_lake_settings_only_skip_lakes() {
        let mut config = bowl_config();
        config.lakes.grid_resolution = 0;
        config.ocean = OceanSettings { generate: false, size: 0.0 };

        let island = IslandGenerator::new(config).generate(&BowlNoise).unwrap();
        assert!(island.water_bodies.is_empty());
        assert!(island.ocean.is_none());
        assert_eq!(island.height_map.width(), 53);
    }

    #[test]
    fn test_falloff_preview_matches_resolution() {
        let island = IslandGenerator::new(bowl_config()).generate(&BowlNoise).unwrap();
        let preview = island.falloff_preview().unwrap();
        assert_eq!(preview.dimensions(), (53, 53));
    }
}
