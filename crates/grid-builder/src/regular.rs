//! Predefined global regular grids.

use grid_common::{GridError, GridResult};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::IndexMode;
use crate::grid::Grid;
use crate::range::cell_center;

/// Resolutions with a predefined global grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GlobalResolution {
    /// 1° grid, centers at (-179.5, -89.5), (-178.5, -89.5), ...
    OneDegree,
    /// 0.25° grid, centers at (-179.875, -89.875), ...
    QuarterDegree,
    /// 0.1° grid, centers at (-179.95, -89.95), ...
    TenthDegree,
    /// 0.01° grid, centers at (-179.995, -89.995), ...
    HundredthDegree,
}

impl GlobalResolution {
    pub const ALL: [GlobalResolution; 4] = [
        Self::OneDegree,
        Self::QuarterDegree,
        Self::TenthDegree,
        Self::HundredthDegree,
    ];

    /// Select the predefined grid for a resolution in degrees.
    pub fn from_degrees(resolution: f64) -> GridResult<Self> {
        Self::ALL
            .into_iter()
            .find(|r| (r.degrees() - resolution).abs() < 1e-9)
            .ok_or(GridError::UnsupportedResolution(resolution))
    }

    /// Resolution in degrees.
    pub fn degrees(&self) -> f64 {
        match self {
            Self::OneDegree => 1.0,
            Self::QuarterDegree => 0.25,
            Self::TenthDegree => 0.1,
            Self::HundredthDegree => 0.01,
        }
    }

    /// Cells per 360° of longitude.
    pub fn lon_cells(&self) -> usize {
        (360.0 / self.degrees()).round() as usize
    }

    /// Cells per 180° of latitude.
    pub fn lat_cells(&self) -> usize {
        (180.0 / self.degrees()).round() as usize
    }

    /// Longitude axis, west to east.
    pub fn londim(&self) -> Vec<f64> {
        let first = -(self.lon_cells() as i64) / 2;
        (0..self.lon_cells() as i64)
            .map(|i| cell_center(first + i, self.degrees()))
            .collect()
    }

    /// Latitude axis, south to north.
    pub fn latdim(&self) -> Vec<f64> {
        let first = -(self.lat_cells() as i64) / 2;
        (0..self.lat_cells() as i64)
            .map(|i| cell_center(first + i, self.degrees()))
            .collect()
    }
}

impl std::fmt::Display for GlobalResolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}°", self.degrees())
    }
}

/// Build the global regular grid for a predefined resolution.
///
/// The point set is the Cartesian product of the axes in row-major order,
/// shape `(latdim.len(), londim.len())`. Only the axes are stored, so even
/// the 0.01° grid stays small until an index is requested.
pub fn build_regular_grid(resolution: f64, index_mode: IndexMode) -> GridResult<Grid> {
    let global = GlobalResolution::from_degrees(resolution)?;
    let grid = Grid::regular(global.londim(), global.latdim(), index_mode)?
        .with_resolution(global.degrees());

    debug!(
        resolution = %global,
        rows = global.lat_cells(),
        cols = global.lon_cells(),
        "Built global regular grid"
    );

    Ok(grid)
}
