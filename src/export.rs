//! PNG previews and JSON export
//!
//! Previews stand in for the texture painter: they are for looking at a
//! generated island, not for feeding a renderer.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use image::{GrayImage, ImageBuffer, Luma, Rgb, RgbImage};
use serde::Serialize;

use crate::error::Result;
use crate::heightmap::HeightMap;
use crate::tilemap::Grid;
use crate::water_bodies::{water_body_stats, WaterBody, WaterBodyStats};

const LAKE_COLOR: [u8; 3] = [64, 170, 230];
const OPEN_WATER_COLOR: [u8; 3] = [20, 50, 110];

/// Grayscale height map, black at the tracked minimum and white at the maximum.
pub fn export_height_map(height_map: &HeightMap, path: impl AsRef<Path>) -> Result<()> {
    let img: GrayImage = ImageBuffer::from_fn(height_map.width() as u32, height_map.height() as u32, |x, y| {
        Luma([to_byte(height_map.normalized(x as usize, y as usize))])
    });
    img.save(path)?;
    Ok(())
}

/// Grayscale falloff mask; values are already in `[0, 1]`.
pub fn export_falloff_map(falloff: &Grid<f32>, path: impl AsRef<Path>) -> Result<()> {
    let img: GrayImage = ImageBuffer::from_fn(falloff.width as u32, falloff.height as u32, |x, y| {
        Luma([to_byte(*falloff.get(x as usize, y as usize))])
    });
    img.save(path)?;
    Ok(())
}

/// Land in grayscale, submerged cells inside a detected lake's bounds in
/// light blue, every other submerged cell in dark blue.
pub fn export_lake_overlay(
    height_map: &HeightMap,
    lakes: &[WaterBody],
    water_level: f32,
    path: impl AsRef<Path>,
) -> Result<()> {
    let img = render_lake_overlay(height_map, lakes, water_level);
    img.save(path)?;
    Ok(())
}

fn render_lake_overlay(height_map: &HeightMap, lakes: &[WaterBody], water_level: f32) -> RgbImage {
    let values = height_map.values();
    let mut in_lake = Grid::new_with(values.width, values.height, false);

    for lake in lakes {
        let Some((min_x, min_y, max_x, max_y)) = cell_bounds(&lake.cells) else {
            continue;
        };
        for y in min_y..=max_y {
            for x in min_x..=max_x {
                if *values.get(x, y) < water_level {
                    in_lake.set(x, y, true);
                }
            }
        }
    }

    ImageBuffer::from_fn(values.width as u32, values.height as u32, |px, py| {
        let (x, y) = (px as usize, py as usize);
        if *in_lake.get(x, y) {
            Rgb(LAKE_COLOR)
        } else if *values.get(x, y) < water_level {
            Rgb(OPEN_WATER_COLOR)
        } else {
            let v = to_byte(height_map.normalized(x, y));
            Rgb([v, v, v])
        }
    })
}

/// Grid-space bounding box `(min_x, min_y, max_x, max_y)` of a cell list.
fn cell_bounds(cells: &[(usize, usize)]) -> Option<(usize, usize, usize, usize)> {
    let &(first_x, first_y) = cells.first()?;
    let mut bounds = (first_x, first_y, first_x, first_y);
    for &(x, y) in cells {
        bounds.0 = bounds.0.min(x);
        bounds.1 = bounds.1.min(y);
        bounds.2 = bounds.2.max(x);
        bounds.3 = bounds.3.max(y);
    }
    Some(bounds)
}

fn to_byte(t: f32) -> u8 {
    (t.clamp(0.0, 1.0) * 255.0).round() as u8
}

#[derive(Serialize)]
struct WaterBodyReport<'a> {
    stats: WaterBodyStats,
    lakes: &'a [WaterBody],
}

/// Write the lakes (without their cell lists) and summary stats as pretty JSON.
pub fn export_water_bodies_json(lakes: &[WaterBody], path: impl AsRef<Path>) -> Result<()> {
    let writer = BufWriter::new(File::create(path)?);
    let report = WaterBodyReport {
        stats: water_body_stats(lakes),
        lakes,
    };
    serde_json::to_writer_pretty(writer, &report)?;
    Ok(())
}
