//! Error types for grid construction.

use thiserror::Error;

/// Result type alias using GridError.
pub type GridResult<T> = Result<T, GridError>;

/// Errors raised while building or querying grids.
///
/// Every variant is fatal to the single country/resolution request that
/// produced it and carries no shared state, so callers running many requests
/// can skip the failed one and continue.
#[derive(Debug, Error)]
pub enum GridError {
    // === Resolution Errors ===
    #[error("Unsupported resolution for a predefined global grid: {0}°")]
    UnsupportedResolution(f64),

    #[error("Invalid resolution: {0} (must be positive and finite)")]
    InvalidResolution(f64),

    // === Shape Errors ===
    #[error("No shape data for country code: {0}")]
    UnknownCountry(String),

    #[error("Invalid country shape: {0}")]
    InvalidShape(String),

    #[error("Failed to load shapes: {0}")]
    ShapeLoad(String),

    // === Construction Errors ===
    #[error(
        "Degenerate coordinate range [{min_threshold}, {max_threshold}] at resolution {resolution}"
    )]
    DegenerateRange {
        min_threshold: f64,
        max_threshold: f64,
        resolution: f64,
    },

    #[error("Grid is empty: {0}")]
    EmptyGrid(String),

    #[error("Candidate lattice of {points} points exceeds limit of {limit}")]
    LatticeTooLarge { points: usize, limit: usize },

    #[error("Subset index {index} out of range for grid of {len} points")]
    InvalidSubset { index: usize, len: usize },

    #[error("Invalid coordinate axes: {0}")]
    InvalidAxis(String),
}

impl GridError {
    /// Stable machine-readable code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            GridError::UnsupportedResolution(_) => "UnsupportedResolution",
            GridError::InvalidResolution(_) => "InvalidResolution",
            GridError::UnknownCountry(_) => "UnknownCountry",
            GridError::InvalidShape(_) => "InvalidShape",
            GridError::ShapeLoad(_) => "ShapeLoad",
            GridError::DegenerateRange { .. } => "DegenerateRange",
            GridError::EmptyGrid(_) => "EmptyGrid",
            GridError::LatticeTooLarge { .. } => "LatticeTooLarge",
            GridError::InvalidSubset { .. } => "InvalidSubset",
            GridError::InvalidAxis(_) => "InvalidAxis",
        }
    }

    /// Create an EmptyGrid error.
    pub fn empty_grid(context: impl Into<String>) -> Self {
        Self::EmptyGrid(context.into())
    }
}

impl From<std::io::Error> for GridError {
    fn from(err: std::io::Error) -> Self {
        GridError::ShapeLoad(err.to_string())
    }
}

impl From<serde_json::Error> for GridError {
    fn from(err: serde_json::Error) -> Self {
        GridError::ShapeLoad(format!("JSON error: {}", err))
    }
}
