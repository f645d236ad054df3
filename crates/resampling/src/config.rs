//! Configuration for the resampling pipeline.

use serde::{Deserialize, Serialize};

/// Configuration for resampling raster data onto grids.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResampleConfig {
    /// Value written to masked cells.
    pub fill_value: f32,

    /// Maximum source distance in meters when resampling onto a country
    /// lattice.
    pub shape_search_radius_m: f64,

    /// Maximum source distance in meters when resampling onto gridpoints.
    pub gridpoint_search_radius_m: f64,

    /// Extra source cells kept around the clip window on every side.
    pub clip_buffer_cells: usize,
}

impl Default for ResampleConfig {
    fn default() -> Self {
        Self {
            fill_value: -99.0,
            shape_search_radius_m: 18_000.0,
            gridpoint_search_radius_m: 20_000.0,
            clip_buffer_cells: 1,
        }
    }
}

impl ResampleConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env();
        config
    }

    /// Override fields from environment variables that are set and parse.
    pub fn apply_env(&mut self) {
        if let Ok(val) = std::env::var("RESAMPLE_FILL_VALUE") {
            if let Ok(fill) = val.parse() {
                self.fill_value = fill;
            }
        }

        if let Ok(val) = std::env::var("RESAMPLE_SHAPE_RADIUS_M") {
            if let Ok(radius) = val.parse() {
                self.shape_search_radius_m = radius;
            }
        }

        if let Ok(val) = std::env::var("RESAMPLE_GRIDPOINT_RADIUS_M") {
            if let Ok(radius) = val.parse() {
                self.gridpoint_search_radius_m = radius;
            }
        }

        if let Ok(val) = std::env::var("RESAMPLE_CLIP_BUFFER") {
            if let Ok(cells) = val.parse() {
                self.clip_buffer_cells = cells;
            }
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if !self.fill_value.is_finite() {
            return Err("fill_value must be finite".to_string());
        }

        if self.shape_search_radius_m.is_nan() || self.shape_search_radius_m <= 0.0 {
            return Err("shape_search_radius_m must be > 0".to_string());
        }

        if self.gridpoint_search_radius_m.is_nan() || self.gridpoint_search_radius_m <= 0.0 {
            return Err("gridpoint_search_radius_m must be > 0".to_string());
        }

        Ok(())
    }
}
