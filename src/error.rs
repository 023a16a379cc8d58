//! Error taxonomy for island generation
//!
//! Contract violations (bad sizes, mismatched grids, absent collaborators) are
//! rejected immediately. Numeric edge cases such as zero distances or an empty
//! lake set are valid results and never surface here.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TerrainError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("Grid dimension mismatch: expected {expected:?}, found {found:?}")]
    DimensionMismatch {
        expected: (usize, usize),
        found: (usize, usize),
    },
    #[error("Missing dependency: {0}")]
    MissingDependency(&'static str),
    #[error("Failed to access file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Failed to write image: {0}")]
    Image(#[from] image::ImageError),
}

pub type Result<T> = std::result::Result<T, TerrainError>;
