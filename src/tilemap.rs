use rayon::prelude::*;

use crate::error::{Result, TerrainError};

/// A 2D grid stored row-major and indexed `[x, y]`.
///
/// Unlike a planet map the island does not wrap at any edge: coordinates
/// outside `0..width` / `0..height` are simply out of bounds.
#[derive(Clone, Debug, PartialEq)]
pub struct Grid<T> {
    pub width: usize,
    pub height: usize,
    data: Vec<T>,
}

impl<T: Clone + Default> Grid<T> {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![T::default(); width * height],
        }
    }
}

impl<T: Clone> Grid<T> {
    pub fn new_with(width: usize, height: usize, value: T) -> Self {
        Self {
            width,
            height,
            data: vec![value; width * height],
        }
    }
}

impl<T> Grid<T> {
    /// Wrap an existing row-major buffer.
    pub fn from_vec(width: usize, height: usize, data: Vec<T>) -> Result<Self> {
        if data.len() != width * height {
            return Err(TerrainError::InvalidArgument(format!(
                "buffer of {} cells does not fill a {}x{} grid",
                data.len(),
                width,
                height
            )));
        }
        Ok(Self { width, height, data })
    }

    /// Build a grid by evaluating `f(x, y)` for every cell.
    pub fn from_fn(width: usize, height: usize, mut f: impl FnMut(usize, usize) -> T) -> Self {
        let mut data = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                data.push(f(x, y));
            }
        }
        Self { width, height, data }
    }

    fn index(&self, x: usize, y: usize) -> usize {
        debug_assert!(self.in_bounds(x, y), "({x}, {y}) outside {}x{}", self.width, self.height);
        y * self.width + x
    }

    pub fn in_bounds(&self, x: usize, y: usize) -> bool {
        x < self.width && y < self.height
    }

    pub fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    pub fn same_shape<U>(&self, other: &Grid<U>) -> bool {
        self.dimensions() == other.dimensions()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn get(&self, x: usize, y: usize) -> &T {
        &self.data[self.index(x, y)]
    }

    pub fn set(&mut self, x: usize, y: usize, value: T) {
        let idx = self.index(x, y);
        self.data[idx] = value;
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// Iterate over all cells with their coordinates.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, &T)> {
        let width = self.width;
        self.data.iter().enumerate().map(move |(idx, val)| (idx % width, idx / width, val))
    }
}

impl<T: Send> Grid<T> {
    /// Parallel iterator over rows as `(y, row)`. Rows are disjoint so each
    /// worker owns its slice outright.
    pub fn par_rows_mut(&mut self) -> impl IndexedParallelIterator<Item = (usize, &mut [T])> {
        // chunks of zero length panic, and an empty grid has no rows anyway
        let width = self.width.max(1);
        self.data.par_chunks_mut(width).enumerate()
    }
}

impl Grid<f32> {
    /// Scan for the smallest and largest value. Returns `None` for an empty grid.
    pub fn min_max(&self) -> Option<(f32, f32)> {
        if self.data.is_empty() {
            return None;
        }
        let mut min_v = f32::MAX;
        let mut max_v = f32::MIN;
        for &v in &self.data {
            if v < min_v { min_v = v; }
            if v > max_v { max_v = v; }
        }
        Some((min_v, max_v))
    }
}
