//! Error types for isosweep.

use thiserror::Error;

/// The main error type for isosweep operations.
#[derive(Error, Debug)]
pub enum IsosweepError {
    /// The isovalue is negative or not a finite number.
    #[error("invalid isovalue {0}: must be finite and non-negative")]
    InvalidLevel(f32),

    /// The sampling stride is smaller than one lattice step.
    #[error("invalid grid size {0}: must be at least 1")]
    InvalidGridSize(u32),

    /// The volume has no samples along at least one axis.
    #[error("volume is empty: extents {x}x{y}x{z}")]
    EmptyVolume { x: usize, y: usize, z: usize },

    /// An axis extent exceeds what lattice coordinates can address.
    #[error("volume extent {extent} along {axis} axis exceeds the supported maximum {max}")]
    ExtentTooLarge {
        axis: char,
        extent: usize,
        max: usize,
    },

    /// Data size mismatch.
    #[error("data size mismatch: expected {expected}, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },

    /// A cell was assembled from the wrong number of corners.
    #[error("a cell needs exactly {expected} corners, got {actual}")]
    CornerCount { expected: usize, actual: usize },

    /// I/O error (options files, worker thread creation).
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON options parsing error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// A specialized Result type for isosweep operations.
pub type Result<T> = std::result::Result<T, IsosweepError>;
