use rayon::prelude::*;
use tracing::debug;

use crate::curve::CurveSnapshot;
use crate::error::{Result, TerrainError};
use crate::falloff::generate_falloff_map;
use crate::noise_map::NoiseProvider;
use crate::settings::HeightMapSettings;
use crate::tilemap::Grid;

// =============================================================================
// HEIGHT MAP
// =============================================================================

/// Final elevation grid plus the bounds observed while it was written.
///
/// Fields are private: the bounds come from the same pass that produced the
/// values and are never recomputed, so nothing may touch the values after
/// construction.
#[derive(Clone, Debug)]
pub struct HeightMap {
    values: Grid<f32>,
    min_value: f32,
    max_value: f32,
}

impl HeightMap {
    pub fn values(&self) -> &Grid<f32> {
        &self.values
    }

    pub fn min_value(&self) -> f32 {
        self.min_value
    }

    pub fn max_value(&self) -> f32 {
        self.max_value
    }

    pub fn width(&self) -> usize {
        self.values.width
    }

    pub fn height(&self) -> usize {
        self.values.height
    }

    /// Value at `(x, y)` remapped to `[0, 1]` by the tracked bounds.
    pub fn normalized(&self, x: usize, y: usize) -> f32 {
        let range = self.max_value - self.min_value;
        if range > 0.0 {
            (*self.values.get(x, y) - self.min_value) / range
        } else {
            0.0
        }
    }
}

// =============================================================================
// SYNTHESIS
// =============================================================================

/// Blend raw noise, an optional falloff mask and the height curve into a
/// height map.
///
/// Per cell, in order:
/// 1. if falloff is enabled: `v = clamp01(v - intensity * mask)`
/// 2. `v *= curve(v) * height_multiplier` (the curve sees the
///    falloff-adjusted value, not the raw noise)
/// 3. fold `v` into the running min/max
///
/// A mask that is supplied while `use_falloff` is off is ignored, but must
/// still match the noise dimensions.
pub fn synthesize(
    noise: Grid<f32>,
    falloff: Option<&Grid<f32>>,
    settings: &HeightMapSettings,
    curve: &CurveSnapshot,
) -> Result<HeightMap> {
    if noise.is_empty() {
        return Err(TerrainError::InvalidArgument("noise grid is empty".into()));
    }
    if let Some(mask) = falloff {
        if !mask.same_shape(&noise) {
            return Err(TerrainError::DimensionMismatch {
                expected: noise.dimensions(),
                found: mask.dimensions(),
            });
        }
    }
    let mask = match (settings.use_falloff, falloff) {
        (true, Some(mask)) => Some(mask),
        (true, None) => return Err(TerrainError::MissingDependency("falloff mask")),
        (false, _) => None,
    };

    let intensity = settings.falloff_intensity;
    let multiplier = settings.height_multiplier;

    let mut values = noise;
    let (min_value, max_value) = values
        .par_rows_mut()
        .map(|(y, row)| {
            let mut row_min = f32::MAX;
            let mut row_max = f32::MIN;
            for (x, cell) in row.iter_mut().enumerate() {
                let mut v = *cell;
                if let Some(mask) = mask {
                    v = (v - *mask.get(x, y) * intensity).clamp(0.0, 1.0);
                }
                v *= curve.evaluate(v) * multiplier;
                *cell = v;

                if v < row_min { row_min = v; }
                if v > row_max { row_max = v; }
            }
            (row_min, row_max)
        })
        .reduce(
            || (f32::MAX, f32::MIN),
            |a, b| (a.0.min(b.0), a.1.max(b.1)),
        );

    Ok(HeightMap { values, min_value, max_value })
}

/// Sample noise, build the falloff mask when enabled, and synthesize.
///
/// Settings are validated on a private copy and the curve is snapshotted
/// before any cell is touched, so the caller's settings may change freely
/// while this runs.
pub fn generate_height_map(
    width: usize,
    height: usize,
    settings: &HeightMapSettings,
    sample_centre: (f32, f32),
    provider: &dyn NoiseProvider,
) -> Result<HeightMap> {
    if width == 0 || height == 0 {
        return Err(TerrainError::InvalidArgument(format!(
            "height map size must be positive, got {}x{}",
            width, height
        )));
    }

    let settings = settings.validated();
    let curve = settings.height_curve.snapshot();

    let noise = provider.sample(width, height, &settings.noise, sample_centre);
    debug!(width, height, seed = settings.noise.seed, "sampled noise");

    let falloff = if settings.use_falloff {
        debug!(
            metric = %settings.falloff_metric,
            strength = settings.falloff_strength,
            size = settings.falloff_size,
            "generating falloff mask"
        );
        Some(generate_falloff_map(
            width,
            settings.falloff_strength,
            settings.falloff_size,
            settings.falloff_metric,
        )?)
    } else {
        None
    };

    let height_map = synthesize(noise, falloff.as_ref(), &settings, &curve)?;
    debug!(
        min = height_map.min_value(),
        max = height_map.max_value(),
        "height map synthesized"
    );
    Ok(height_map)
}
