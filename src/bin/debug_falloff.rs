//! Debug tool for comparing falloff masks visually
//! Renders a contact sheet of masks across strength, size and metric

use image::{ImageBuffer, Luma, Rgb, RgbImage};
use island_generator::falloff::{generate_falloff_map, FalloffMetric};
use island_generator::tilemap::Grid;

const CELL: usize = 128;
const GAP: u32 = 4;
const STRENGTHS: [f32; 4] = [1.0, 2.0, 3.0, 6.0];
const SIZES: [f32; 4] = [0.5, 1.5, 2.2, 4.0];

fn main() {
    println!("Generating falloff comparison sheets...");

    for metric in [FalloffMetric::Square, FalloffMetric::Circular] {
        let mut masks = Vec::new();
        for &strength in &STRENGTHS {
            for &size in &SIZES {
                println!("  {} a={:.1} b={:.1}", metric, strength, size);
                match generate_falloff_map(CELL, strength, size, metric) {
                    Ok(mask) => masks.push(mask),
                    Err(e) => {
                        eprintln!("Failed to generate mask: {}", e);
                        return;
                    }
                }
            }
        }

        let sheet = create_sheet(&masks, SIZES.len(), STRENGTHS.len());
        let path = format!("falloff_{}.png", metric);
        if let Err(e) = sheet.save(&path) {
            eprintln!("Failed to save {}: {}", path, e);
            return;
        }
        println!("Saved {} (rows: strength {:?}, columns: size {:?})", path, STRENGTHS, SIZES);
    }
}

/// Lay masks out row-major on a dark background; the 0.5 contour (the
/// nominal coastline) is drawn in orange.
fn create_sheet(masks: &[Grid<f32>], cols: usize, rows: usize) -> RgbImage {
    let cell = CELL as u32;
    let width = cols as u32 * (cell + GAP) + GAP;
    let height = rows as u32 * (cell + GAP) + GAP;
    let mut sheet: RgbImage = ImageBuffer::from_pixel(width, height, Rgb([40, 40, 40]));

    for (idx, mask) in masks.iter().enumerate() {
        let col = (idx % cols) as u32;
        let row = (idx / cols) as u32;
        if row as usize >= rows {
            break;
        }
        let x_offset = GAP + col * (cell + GAP);
        let y_offset = GAP + row * (cell + GAP);

        let gray: ImageBuffer<Luma<u8>, Vec<u8>> = ImageBuffer::from_fn(cell, cell, |x, y| {
            Luma([(mask.get(x as usize, y as usize).clamp(0.0, 1.0) * 255.0) as u8])
        });

        for (x, y, pixel) in gray.enumerate_pixels() {
            let v = pixel.0[0];
            let on_coast = crosses_half(mask, x as usize, y as usize);
            let color = if on_coast { Rgb([255, 140, 0]) } else { Rgb([v, v, v]) };
            sheet.put_pixel(x_offset + x, y_offset + y, color);
        }
    }

    sheet
}

fn crosses_half(mask: &Grid<f32>, x: usize, y: usize) -> bool {
    if x + 1 >= mask.width || y + 1 >= mask.height {
        return false;
    }
    let here = *mask.get(x, y) >= 0.5;
    here != (*mask.get(x + 1, y) >= 0.5) || here != (*mask.get(x, y + 1) >= 0.5)
}
