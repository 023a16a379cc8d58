//! Lake detection
//!
//! Finds connected regions of terrain below a water level and describes each
//! one by its world-space footprint. Only a strided lattice of cells is
//! inspected, which keeps the cost bounded on large maps at the price of
//! missing or mis-sizing features narrower than the stride.

use std::collections::VecDeque;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{Result, TerrainError};
use crate::settings::LakeSettings;
use crate::tilemap::Grid;

/// Hard cap on the cells collected for a single region.
pub const MAX_LAKE_CELLS: usize = 10_000;

/// Parameters for a detection pass
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LakeDetectionParams {
    /// Cells strictly below this height are water
    pub water_level: f32,
    /// Minimum area (world units squared) for a region to count as a lake
    pub min_lake_size: f32,
    /// Lattice spacing in cells; 1 inspects every cell
    pub stride: usize,
    /// Depth of the water volume under the surface
    pub lake_depth: f32,
}

impl Default for LakeDetectionParams {
    fn default() -> Self {
        LakeSettings::default().into()
    }
}

impl From<LakeSettings> for LakeDetectionParams {
    fn from(settings: LakeSettings) -> Self {
        Self {
            water_level: settings.water_level,
            min_lake_size: settings.min_lake_size,
            stride: settings.grid_resolution,
            lake_depth: settings.lake_depth,
        }
    }
}

/// A detected lake. Created once per detection pass and never modified.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct WaterBody {
    /// 1-based, in discovery order
    pub id: usize,
    /// Lattice cells belonging to the lake, in BFS order
    #[serde(skip)]
    pub cells: Vec<(usize, usize)>,
    /// Centre of the bounding box, `[x, water_level, z]`
    pub center: [f32; 3],
    /// Bounding box extent `[x, z]`
    pub size: [f32; 2],
    pub water_level: f32,
    pub depth: f32,
    pub cell_count: usize,
    /// `cell_count * pixel_size^2`
    pub area: f32,
    /// The flood fill stopped at `MAX_LAKE_CELLS` with cells still queued
    pub truncated: bool,
}

impl WaterBody {
    /// Corners of the water surface quad: `(-x,-z)`, `(+x,-z)`, `(-x,+z)`, `(+x,+z)`.
    pub fn surface_corners(&self) -> [[f32; 3]; 4] {
        let [cx, cy, cz] = self.center;
        let half_x = self.size[0] / 2.0;
        let half_z = self.size[1] / 2.0;
        [
            [cx - half_x, cy, cz - half_z],
            [cx + half_x, cy, cz - half_z],
            [cx - half_x, cy, cz + half_z],
            [cx + half_x, cy, cz + half_z],
        ]
    }

    /// Whether a world-space point is submerged in this lake's water volume.
    pub fn contains_point(&self, point: [f32; 3]) -> bool {
        let [cx, _, cz] = self.center;
        let [px, py, pz] = point;
        (px - cx).abs() <= self.size[0] / 2.0
            && (pz - cz).abs() <= self.size[1] / 2.0
            && py <= self.water_level
            && py >= self.water_level - self.depth
    }
}

/// Detect lakes in a height grid covering `world_size` world units.
///
/// Seeds are visited row-major over the lattice `x, y ≡ 0 (mod stride)`; each
/// unvisited seed below the water level starts a 4-connected BFS that moves
/// `stride` cells at a time. Cells are marked visited when enqueued. Regions
/// whose area is below `min_lake_size` are dropped. The output is ordered by
/// discovery and is identical for identical inputs.
pub fn detect_water_bodies(
    heights: &Grid<f32>,
    params: &LakeDetectionParams,
    world_size: f32,
) -> Result<Vec<WaterBody>> {
    if params.stride == 0 {
        return Err(TerrainError::InvalidArgument("lake detection stride must be positive".into()));
    }
    if heights.is_empty() {
        return Err(TerrainError::InvalidArgument("height grid is empty".into()));
    }
    if !(world_size > 0.0) || !world_size.is_finite() {
        return Err(TerrainError::InvalidArgument(format!(
            "world size must be positive, got {}",
            world_size
        )));
    }

    let width = heights.width;
    let height = heights.height;
    let stride = params.stride;
    // Full-resolution pixel size: each lattice cell counts as one pixel
    let pixel_size = world_size / width as f32;

    info!(width, height, stride, water_level = params.water_level, "starting lake detection");

    let mut visited = Grid::new_with(width, height, false);
    let mut lakes = Vec::new();

    for y in (0..height).step_by(stride) {
        for x in (0..width).step_by(stride) {
            if *visited.get(x, y) {
                continue;
            }
            if !(*heights.get(x, y) < params.water_level) {
                continue;
            }

            let (cells, truncated) = flood_fill(heights, &mut visited, x, y, params.water_level, stride);
            let area = cells.len() as f32 * pixel_size * pixel_size;

            if truncated {
                warn!(seed_x = x, seed_y = y, cells = cells.len(), "lake flood fill hit the cell cap");
            }
            if area < params.min_lake_size {
                continue;
            }

            let lake = describe_lake(lakes.len() + 1, cells, area, truncated, params, heights, world_size);
            debug!(id = lake.id, center = ?lake.center, size = ?lake.size, "found lake");
            lakes.push(lake);
        }
    }

    info!(lakes = lakes.len(), "lake detection complete");
    Ok(lakes)
}

/// BFS over the strided lattice from `(start_x, start_y)`.
/// Returns the collected cells and whether the cell cap cut the fill short.
fn flood_fill(
    heights: &Grid<f32>,
    visited: &mut Grid<bool>,
    start_x: usize,
    start_y: usize,
    threshold: f32,
    stride: usize,
) -> (Vec<(usize, usize)>, bool) {
    let mut result = Vec::new();
    let mut queue = VecDeque::new();

    queue.push_back((start_x, start_y));
    visited.set(start_x, start_y, true);

    while result.len() < MAX_LAKE_CELLS {
        let Some((x, y)) = queue.pop_front() else {
            break;
        };
        result.push((x, y));

        let neighbors = [
            x.checked_sub(stride).map(|nx| (nx, y)),
            x.checked_add(stride).map(|nx| (nx, y)),
            y.checked_sub(stride).map(|ny| (x, ny)),
            y.checked_add(stride).map(|ny| (x, ny)),
        ];
        for (nx, ny) in neighbors.into_iter().flatten() {
            if !heights.in_bounds(nx, ny) || *visited.get(nx, ny) {
                continue;
            }
            if *heights.get(nx, ny) < threshold {
                visited.set(nx, ny, true);
                queue.push_back((nx, ny));
            }
        }
    }

    let truncated = !queue.is_empty();
    (result, truncated)
}

/// Bounding box of the cells in world space and the lake built from it.
fn describe_lake(
    id: usize,
    cells: Vec<(usize, usize)>,
    area: f32,
    truncated: bool,
    params: &LakeDetectionParams,
    heights: &Grid<f32>,
    world_size: f32,
) -> WaterBody {
    let map_width = heights.width as f32;
    let map_height = heights.height as f32;

    let mut min_x = f32::MAX;
    let mut max_x = f32::MIN;
    let mut min_z = f32::MAX;
    let mut max_z = f32::MIN;

    for &(px, py) in &cells {
        let world_x = (px as f32 / map_width - 0.5) * world_size;
        let world_z = (py as f32 / map_height - 0.5) * world_size;
        if world_x < min_x { min_x = world_x; }
        if world_x > max_x { max_x = world_x; }
        if world_z < min_z { min_z = world_z; }
        if world_z > max_z { max_z = world_z; }
    }

    WaterBody {
        id,
        center: [(min_x + max_x) / 2.0, params.water_level, (min_z + max_z) / 2.0],
        size: [max_x - min_x, max_z - min_z],
        water_level: params.water_level,
        depth: params.lake_depth,
        cell_count: cells.len(),
        area,
        truncated,
        cells,
    }
}

/// Summary of a detection pass
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct WaterBodyStats {
    pub lake_count: usize,
    pub total_cells: usize,
    pub total_area: f32,
    pub smallest_lake: usize,
    pub largest_lake: usize,
    pub avg_lake_size: f32,
    pub truncated_lakes: usize,
}

pub fn water_body_stats(lakes: &[WaterBody]) -> WaterBodyStats {
    let mut stats = WaterBodyStats::default();
    if lakes.is_empty() {
        return stats;
    }

    stats.smallest_lake = usize::MAX;
    for lake in lakes {
        stats.lake_count += 1;
        stats.total_cells += lake.cell_count;
        stats.total_area += lake.area;
        stats.smallest_lake = stats.smallest_lake.min(lake.cell_count);
        stats.largest_lake = stats.largest_lake.max(lake.cell_count);
        if lake.truncated {
            stats.truncated_lakes += 1;
        }
    }
    stats.avg_lake_size = stats.total_cells as f32 / stats.lake_count as f32;

    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    /// 20x20 dry grid with a wet rectangle covering `x0..=x1`, `y0..=y1`.
    fn grid_with_pond(x0: usize, x1: usize, y0: usize, y1: usize) -> Grid<f32> {
        Grid::from_fn(20, 20, |x, y| {
            if (x0..=x1).contains(&x) && (y0..=y1).contains(&y) { -1.0 } else { 1.0 }
        })
    }

    fn params(min_lake_size: f32, stride: usize) -> LakeDetectionParams {
        LakeDetectionParams {
            water_level: 0.0,
            min_lake_size,
            stride,
            lake_depth: 5.0,
        }
    }

    #[test]
    fn test_area_filter_boundary() {
        // 5x4 pond = 20 cells; world 40 over 20 cells -> pixel 2, area 80
        let grid = grid_with_pond(5, 9, 6, 9);

        let lakes = detect_water_bodies(&grid, &params(80.0, 1), 40.0).unwrap();
        assert_eq!(lakes.len(), 1);
        assert_eq!(lakes[0].cell_count, 20);
        assert_abs_diff_eq!(lakes[0].area, 80.0);

        let lakes = detect_water_bodies(&grid, &params(80.01, 1), 40.0).unwrap();
        assert!(lakes.is_empty());
    }

    #[test]
    fn test_lake_geometry() {
        let grid = grid_with_pond(5, 9, 6, 9);
        let lakes = detect_water_bodies(&grid, &params(0.0, 1), 40.0).unwrap();
        let lake = &lakes[0];

        // world = 2 * cell - 20: x in [-10, -2], z in [-8, -2]
        assert_abs_diff_eq!(lake.center[0], -6.0, epsilon = 1e-4);
        assert_eq!(lake.center[1], 0.0);
        assert_abs_diff_eq!(lake.center[2], -5.0, epsilon = 1e-4);
        assert_abs_diff_eq!(lake.size[0], 8.0, epsilon = 1e-4);
        assert_abs_diff_eq!(lake.size[1], 6.0, epsilon = 1e-4);
        assert_eq!(lake.water_level, 0.0);
        assert!(!lake.truncated);
    }

    #[test]
    fn test_threshold_is_strict() {
        let grid = Grid::new_with(10, 10, 0.0f32);
        let lakes = detect_water_bodies(&grid, &params(0.0, 1), 10.0).unwrap();
        assert!(lakes.is_empty());
    }

    #[test]
    fn test_stride_samples_lattice_only() {
        // Pond x 5..=8, y 6..=10; even lattice hits x {6, 8} and y {6, 8, 10}
        let grid = grid_with_pond(5, 8, 6, 10);
        let lakes = detect_water_bodies(&grid, &params(0.0, 2), 40.0).unwrap();
        assert_eq!(lakes.len(), 1);
        assert_eq!(lakes[0].cell_count, 6);
        assert!(lakes[0].cells.iter().all(|&(x, y)| x % 2 == 0 && y % 2 == 0));
        // Area uses the full-resolution pixel size, not stride-scaled
        assert_abs_diff_eq!(lakes[0].area, 24.0);
    }

    #[test]
    fn test_narrow_feature_missed_by_stride() {
        // A one-cell-wide channel on an odd column never lands on the lattice
        let grid = Grid::from_fn(20, 20, |x, _| if x == 7 { -1.0 } else { 1.0 });
        assert!(detect_water_bodies(&grid, &params(0.0, 2), 20.0).unwrap().is_empty());
        assert_eq!(detect_water_bodies(&grid, &params(0.0, 1), 20.0).unwrap().len(), 1);
    }

    #[test]
    fn test_separate_ponds_in_scan_order() {
        let grid = Grid::from_fn(20, 20, |x, y| {
            let lower_left = x < 4 && (12..16).contains(&y);
            let upper_right = (14..18).contains(&x) && y < 3;
            if lower_left || upper_right { -1.0 } else { 1.0 }
        });
        let lakes = detect_water_bodies(&grid, &params(0.0, 1), 20.0).unwrap();
        assert_eq!(lakes.len(), 2);
        // Row-major scan reaches the upper-right pond (y = 0) first
        assert_eq!(lakes[0].id, 1);
        assert_eq!(lakes[0].cells[0], (14, 0));
        assert_eq!(lakes[1].id, 2);
        assert_eq!(lakes[1].cells[0], (0, 12));
    }

    #[test]
    fn test_diagonal_cells_not_connected() {
        let mut grid = Grid::new_with(6, 6, 1.0f32);
        grid.set(1, 1, -1.0);
        grid.set(2, 2, -1.0);
        let lakes = detect_water_bodies(&grid, &params(0.0, 1), 6.0).unwrap();
        assert_eq!(lakes.len(), 2);
    }

    #[test]
    fn test_cell_cap_truncates() {
        let grid = Grid::new_with(101, 101, -5.0f32);
        let lakes = detect_water_bodies(&grid, &params(0.0, 1), 101.0).unwrap();

        assert!(!lakes.is_empty());
        assert_eq!(lakes[0].cell_count, MAX_LAKE_CELLS);
        assert!(lakes[0].truncated);
        assert_eq!(lakes[0].cells.len(), MAX_LAKE_CELLS);
    }

    #[test]
    fn test_idempotent() {
        let grid = Grid::from_fn(30, 30, |x, y| ((x * 7 + y * 13) % 11) as f32 - 5.0);
        let p = params(1.0, 1);
        let first = detect_water_bodies(&grid, &p, 60.0).unwrap();
        let second = detect_water_bodies(&grid, &p, 60.0).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_invalid_arguments() {
        let grid = Grid::new_with(4, 4, 0.0f32);
        assert!(matches!(
            detect_water_bodies(&grid, &params(0.0, 0), 10.0),
            Err(TerrainError::InvalidArgument(_))
        ));
        assert!(matches!(
            detect_water_bodies(&grid, &params(0.0, 1), 0.0),
            Err(TerrainError::InvalidArgument(_))
        ));
        assert!(matches!(
            detect_water_bodies(&Grid::new(0, 0), &params(0.0, 1), 10.0),
            Err(TerrainError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_surface_and_volume() {
        let lake = WaterBody {
            id: 1,
            cells: Vec::new(),
            center: [10.0, 2.0, -4.0],
            size: [6.0, 2.0],
            water_level: 2.0,
            depth: 5.0,
            cell_count: 0,
            area: 0.0,
            truncated: false,
        };
        let corners = lake.surface_corners();
        assert_eq!(corners[0], [7.0, 2.0, -5.0]);
        assert_eq!(corners[3], [13.0, 2.0, -3.0]);

        assert!(lake.contains_point([10.0, 0.0, -4.0]));
        assert!(!lake.contains_point([10.0, 2.5, -4.0]));
        assert!(!lake.contains_point([10.0, -3.5, -4.0]));
        assert!(!lake.contains_point([14.0, 0.0, -4.0]));
    }

    #[test]
    fn test_stats() {
        let grid = Grid::from_fn(20, 20, |x, y| {
            let a = x < 2 && y < 2;
            let b = (10..15).contains(&x) && (10..13).contains(&y);
            if a || b { -1.0 } else { 1.0 }
        });
        let lakes = detect_water_bodies(&grid, &params(0.0, 1), 20.0).unwrap();
        let stats = water_body_stats(&lakes);
        assert_eq!(stats.lake_count, 2);
        assert_eq!(stats.smallest_lake, 4);
        assert_eq!(stats.largest_lake, 15);
        assert_eq!(stats.total_cells, 19);
        assert_abs_diff_eq!(stats.avg_lake_size, 9.5);
        assert_eq!(water_body_stats(&[]), WaterBodyStats::default());
    }
}
