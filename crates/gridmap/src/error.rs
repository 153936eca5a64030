//! Board error type.

use thiserror::Error;

/// Errors produced while building or loading a [`GridMap`](crate::GridMap).
#[derive(Debug, Error)]
pub enum GridMapError {
    /// Width or height is not strictly positive, or the board is too large.
    #[error("invalid map dimensions {width}x{height}")]
    InvalidDimensions {
        /// Requested width
        width: i32,
        /// Requested height
        height: i32,
    },

    /// Cell size is not a positive finite number.
    #[error("invalid cell size {0}")]
    InvalidCellSize(f32),

    /// Serialized map data could not be parsed.
    #[error("map parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Shorthand result type for board construction.
pub type GridMapResult<T> = Result<T, GridMapError>;
