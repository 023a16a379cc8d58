//! Raw noise sources
//!
//! The heightmap pipeline only depends on the `NoiseProvider` trait. The
//! default provider is layered Perlin (fBm) with per-octave offsets drawn from
//! a seeded RNG, so the same seed always yields the same island.

use noise::{NoiseFn, Perlin};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;

use crate::settings::{NoiseSettings, NormalizeMode};
use crate::tilemap::Grid;

/// Octave offsets are drawn from `-OFFSET_RANGE..OFFSET_RANGE`.
const OFFSET_RANGE: f64 = 100_000.0;

/// Global normalization leaves headroom for sums that rarely reach the
/// theoretical maximum.
const GLOBAL_HEADROOM: f32 = 0.9;

/// Something that can fill a grid with noise values, conventionally in `[0, 1]`.
pub trait NoiseProvider: Send + Sync {
    fn sample(
        &self,
        width: usize,
        height: usize,
        settings: &NoiseSettings,
        sample_centre: (f32, f32),
    ) -> Grid<f32>;
}

/// Fractal Perlin noise.
#[derive(Clone, Copy, Debug, Default)]
pub struct PerlinNoise;

impl NoiseProvider for PerlinNoise {
    fn sample(
        &self,
        width: usize,
        height: usize,
        settings: &NoiseSettings,
        sample_centre: (f32, f32),
    ) -> Grid<f32> {
        let perlin = Perlin::new(settings.seed as u32);
        let mut rng = ChaCha8Rng::seed_from_u64(settings.seed);

        let octaves = settings.octaves.max(1) as usize;
        let mut octave_offsets = Vec::with_capacity(octaves);
        let mut max_possible_height = 0.0f32;
        let mut amplitude = 1.0f32;
        for _ in 0..octaves {
            let ox = rng.gen_range(-OFFSET_RANGE..OFFSET_RANGE)
                + (settings.offset.0 + sample_centre.0) as f64;
            let oy = rng.gen_range(-OFFSET_RANGE..OFFSET_RANGE)
                - (settings.offset.1 + sample_centre.1) as f64;
            octave_offsets.push((ox, oy));
            max_possible_height += amplitude;
            amplitude *= settings.persistence;
        }

        let scale = settings.scale.max(0.01) as f64;
        let half_width = width as f64 / 2.0;
        let half_height = height as f64 / 2.0;
        let persistence = settings.persistence as f64;
        let lacunarity = settings.lacunarity as f64;

        let mut map = Grid::new_with(width, height, 0.0f32);
        map.par_rows_mut().for_each(|(y, row)| {
            for (x, cell) in row.iter_mut().enumerate() {
                let mut amplitude = 1.0;
                let mut frequency = 1.0;
                let mut noise_height = 0.0;

                for &(ox, oy) in &octave_offsets {
                    let sample_x = (x as f64 - half_width + ox) / scale * frequency;
                    let sample_y = (y as f64 - half_height + oy) / scale * frequency;
                    noise_height += perlin.get([sample_x, sample_y]) * amplitude;
                    amplitude *= persistence;
                    frequency *= lacunarity;
                }

                *cell = noise_height as f32;
            }
        });

        match settings.normalize_mode {
            NormalizeMode::Local => {
                if let Some((min_v, max_v)) = map.min_max() {
                    let range = max_v - min_v;
                    map.par_rows_mut().for_each(|(_, row)| {
                        for cell in row.iter_mut() {
                            *cell = if range > 0.0 { (*cell - min_v) / range } else { 0.0 };
                        }
                    });
                }
            }
            NormalizeMode::Global => {
                let denom = max_possible_height / GLOBAL_HEADROOM;
                map.par_rows_mut().for_each(|(_, row)| {
                    for cell in row.iter_mut() {
                        *cell = ((*cell + 1.0) / denom).max(0.0);
                    }
                });
            }
        }

        map
    }
}
