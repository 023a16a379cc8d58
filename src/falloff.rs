//! Island falloff masks
//!
//! A falloff mask rises from ~0 at the map centre to ~1 at the border. It is
//! subtracted from raw noise so that terrain sinks below water towards the
//! edges, leaving an island silhouette.

use std::fmt;
use std::str::FromStr;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TerrainError};
use crate::tilemap::Grid;

/// Default edge steepness used by the map preview.
pub const DEFAULT_STRENGTH: f32 = 3.0;
/// Default transition centre used by the map preview.
pub const DEFAULT_SIZE: f32 = 2.2;

/// Distance metric used to shape the island.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FalloffMetric {
    /// Chebyshev distance, produces a square island
    Square,
    /// Euclidean distance, produces a round island
    #[default]
    Circular,
}

impl FalloffMetric {
    /// Distance of normalized coordinates `x, y` in `[-1, 1]` from the centre.
    pub fn distance(self, x: f32, y: f32) -> f32 {
        match self {
            FalloffMetric::Square => x.abs().max(y.abs()),
            FalloffMetric::Circular => (x * x + y * y).sqrt(),
        }
    }
}

impl fmt::Display for FalloffMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Square => write!(f, "square"),
            Self::Circular => write!(f, "circular"),
        }
    }
}

impl FromStr for FalloffMetric {
    type Err = TerrainError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "square" => Ok(Self::Square),
            "circular" | "circle" => Ok(Self::Circular),
            other => Err(TerrainError::InvalidArgument(format!(
                "unknown falloff metric '{}'",
                other
            ))),
        }
    }
}

/// Sigmoid-like falloff curve `d^a / (d^a + (b - b*d)^a)`.
///
/// `a` controls how sharp the coastline transition is, `b` where it sits
/// (larger `b` shrinks the land area). `d` itself is not clamped, but the
/// base of the second term is floored at zero: past `d = 1` (only reachable by
/// the circular metric towards the corners) the mask saturates at 1 instead
/// of raising a negative base to a fractional power.
pub fn evaluate(d: f32, a: f32, b: f32) -> f32 {
    let inner = d.powf(a);
    inner / (inner + (b - b * d).max(0.0).powf(a))
}

/// Generate a `size x size` falloff mask.
pub fn generate_falloff_map(
    size: usize,
    strength: f32,
    falloff_size: f32,
    metric: FalloffMetric,
) -> Result<Grid<f32>> {
    if size == 0 {
        return Err(TerrainError::InvalidArgument("falloff map size must be positive".into()));
    }
    if !strength.is_finite() || !falloff_size.is_finite() {
        return Err(TerrainError::InvalidArgument(format!(
            "falloff parameters must be finite (strength {}, size {})",
            strength, falloff_size
        )));
    }
    if strength <= 0.0 || falloff_size <= 0.0 {
        return Err(TerrainError::InvalidArgument(format!(
            "falloff parameters must be positive (strength {}, size {})",
            strength, falloff_size
        )));
    }

    let size_f = size as f32;
    let mut map = Grid::new_with(size, size, 0.0f32);

    // Grid is indexed [x, y] with x = i, y = j of the normalized mapping
    map.par_rows_mut().for_each(|(j, row)| {
        let y = j as f32 / size_f * 2.0 - 1.0;
        for (i, cell) in row.iter_mut().enumerate() {
            let x = i as f32 / size_f * 2.0 - 1.0;
            *cell = evaluate(metric.distance(x, y), strength, falloff_size);
        }
    });

    Ok(map)
}

/// Square mask with the preview defaults (strength 3, size 2.2).
pub fn generate_default_falloff_map(size: usize) -> Result<Grid<f32>> {
    generate_falloff_map(size, DEFAULT_STRENGTH, DEFAULT_SIZE, FalloffMetric::Square)
}
