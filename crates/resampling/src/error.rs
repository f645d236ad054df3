//! Error types for raster access and resampling.

use chrono::{DateTime, Utc};
use grid_common::GridError;
use thiserror::Error;

/// Errors raised while reading or clipping raster data.
#[derive(Error, Debug)]
pub enum RasterError {
    /// Failed to read the raster file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The TIFF container could not be decoded.
    #[error("TIFF decoding error: {0}")]
    Decode(String),

    /// No geotransform could be derived from the file's tags.
    #[error("missing georeferencing: {0}")]
    MissingGeoreference(String),

    /// Pixel layout or transform this reader does not handle.
    #[error("unsupported raster layout: {0}")]
    Unsupported(String),

    /// Data length does not match the declared raster shape.
    #[error("shape mismatch for {name}: expected {expected} values, got {actual}")]
    ShapeMismatch {
        name: String,
        expected: usize,
        actual: usize,
    },

    /// The clip window does not overlap the raster.
    #[error("clip window {bbox} does not overlap raster extent {extent}")]
    EmptyClip { bbox: String, extent: String },
}

impl From<tiff::TiffError> for RasterError {
    fn from(err: tiff::TiffError) -> Self {
        match err {
            tiff::TiffError::IoError(e) => Self::Io(e),
            other => Self::Decode(other.to_string()),
        }
    }
}

/// Errors raised by the resampling pipeline.
#[derive(Error, Debug)]
pub enum ResampleError {
    /// Grid construction failed.
    #[error(transparent)]
    Grid(#[from] GridError),

    /// Raster access failed outside a resampling unit.
    #[error(transparent)]
    Raster(#[from] RasterError),

    /// Reading or resampling one source failed.
    #[error("{message} (country {country}, source {source_path}, time {})", format_timestamp(.timestamp))]
    SourceData {
        country: String,
        source_path: String,
        timestamp: Option<DateTime<Utc>>,
        message: String,
    },

    /// Invalid resampling configuration.
    #[error("configuration error: {0}")]
    Config(String),
}

impl ResampleError {
    /// Attach unit context to a raster failure.
    pub fn source_data(
        country: impl Into<String>,
        source_path: impl Into<String>,
        timestamp: Option<DateTime<Utc>>,
        err: impl std::fmt::Display,
    ) -> Self {
        Self::SourceData {
            country: country.into(),
            source_path: source_path.into(),
            timestamp,
            message: err.to_string(),
        }
    }

    /// Stable machine-readable code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Grid(e) => e.code(),
            Self::Raster(_) => "Raster",
            Self::SourceData { .. } => "SourceData",
            Self::Config(_) => "Config",
        }
    }
}

fn format_timestamp(timestamp: &Option<DateTime<Utc>>) -> String {
    match timestamp {
        Some(t) => t.to_rfc3339(),
        None => "unknown".to_string(),
    }
}

/// Result type for resampling operations.
pub type Result<T> = std::result::Result<T, ResampleError>;
