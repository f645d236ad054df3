//! Country grids: a regular lattice fitted to one country's outline.

use std::sync::Arc;

use grid_common::{BoundingBox, GridError, GridPoints, GridResult};
use tracing::{debug, info};

use crate::config::GridConfig;
use crate::grid::Grid;
use crate::range::{lattice_axis, lattice_len, reduce_range};
use crate::shape::{CountryShape, ShapeProvider};
use crate::trim::trim;

/// A regular grid trimmed to a country, together with the country's shape.
#[derive(Debug, Clone)]
pub struct CountryGrid {
    shape: Arc<CountryShape>,
    grid: Grid,
    resolution: f64,
}

impl CountryGrid {
    /// Build the grid for `shape` at the configured resolution.
    ///
    /// The candidate lattice covers the shape's bounding box; outer rows and
    /// columns without interior points are then trimmed away.
    pub fn new(shape: Arc<CountryShape>, config: &GridConfig) -> GridResult<Self> {
        config.validate()?;
        let resolution = config.resolution;
        let bbox = *shape.bbox();

        let (min_lon, max_lon) = reduce_range(bbox.min_lon, bbox.max_lon, resolution)?;
        let (min_lat, max_lat) = reduce_range(bbox.min_lat, bbox.max_lat, resolution)?;

        let ncols = lattice_len(min_lon, max_lon, resolution);
        let nrows = lattice_len(min_lat, max_lat, resolution);
        let points = ncols.saturating_mul(nrows);
        if points > config.max_lattice_points {
            return Err(GridError::LatticeTooLarge {
                points,
                limit: config.max_lattice_points,
            });
        }

        let lons = lattice_axis(min_lon, max_lon, resolution);
        let lats = lattice_axis(min_lat, max_lat, resolution);
        debug!(
            country = %shape.code(),
            rows = nrows,
            cols = ncols,
            "Built candidate lattice"
        );

        let (lons, lats) = trim(shape.as_ref(), &lons, &lats);
        if lons.is_empty() || lats.is_empty() {
            return Err(GridError::empty_grid(format!(
                "{} at {}°: trimming removed every lattice line",
                shape.code(),
                resolution
            )));
        }

        let grid = Grid::regular(lons, lats, config.index_mode)?.with_resolution(resolution);

        info!(
            country = %shape.code(),
            resolution = resolution,
            rows = grid.shape().map(|(rows, _)| rows).unwrap_or(0),
            cols = grid.shape().map(|(_, cols)| cols).unwrap_or(0),
            "Built country grid"
        );

        Ok(Self {
            shape,
            grid,
            resolution,
        })
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn into_grid(self) -> Grid {
        self.grid
    }

    pub fn shape(&self) -> &CountryShape {
        &self.shape
    }

    pub fn code(&self) -> &str {
        self.shape.code()
    }

    /// Resolution captured when the grid was built.
    pub fn resolution(&self) -> f64 {
        self.resolution
    }

    /// Gridpoints inside the country, boundary inclusive, by ascending gpi.
    ///
    /// Fails with [`GridError::EmptyGrid`] when no gridpoint falls inside
    /// the country, e.g. a small island at a coarse resolution.
    pub fn country_gridpoints(&self) -> GridResult<GridPoints> {
        let points = self.grid.points_in_shape(&self.shape);
        if points.is_empty() {
            return Err(GridError::empty_grid(format!(
                "{} at {}°: no gridpoint inside the country",
                self.code(),
                self.resolution
            )));
        }
        Ok(points)
    }

    /// Nearest gridpoint and its great-circle distance in meters.
    pub fn find_nearest_gpi(&self, lon: f64, lat: f64) -> Option<(usize, f64)> {
        self.grid.find_nearest_gpi(lon, lat)
    }

    /// Gridpoints inside `bbox`, edges inclusive.
    pub fn bbox_grid_points(&self, bbox: &BoundingBox) -> GridPoints {
        self.grid.bbox_grid_points(bbox)
    }
}

/// Look up a country's shape and build its grid.
pub fn build_country_grid(
    provider: &dyn ShapeProvider,
    country_code: &str,
    config: &GridConfig,
) -> GridResult<CountryGrid> {
    let shape = provider.shape(country_code)?;
    CountryGrid::new(shape, config)
}
