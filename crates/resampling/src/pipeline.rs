//! Resampling raster data onto country grids.
//!
//! Two destinations are supported:
//!
//! - [`resample_to_shape`]: the country's trimmed regular lattice, masked
//!   outside the country outline and wherever the source had no data
//! - [`resample_to_gridpoints`]: the points of the global grid that fall
//!   inside the country, as a table keyed by gridpoint index

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use grid_builder::{
    build_regular_grid, CountryGrid, GridConfig, IndexMode, PointContainment, ShapeProvider,
};
use grid_common::GridError;
use serde::Serialize;
use tracing::{debug, info};

use crate::config::ResampleConfig;
use crate::error::{ResampleError, Result};
use crate::kernel::NeighbourIndex;
use crate::mask::MaskedField;
use crate::raster::{ClippedRaster, RasterSource};

/// Raster data resampled onto a country lattice.
///
/// Rows run north to south and columns west to east. `lons`, `lats` and
/// `gpis` are flattened in the same row-major order as every field.
#[derive(Debug, Clone, Serialize)]
pub struct ResampledShape {
    pub country: String,
    pub source: String,
    pub fields: BTreeMap<String, MaskedField>,
    pub lons: Vec<f64>,
    pub lats: Vec<f64>,
    pub gpis: Vec<usize>,
    pub shape: (usize, usize),
    pub timestamp: Option<DateTime<Utc>>,
}

impl ResampledShape {
    pub fn field(&self, name: &str) -> Option<&MaskedField> {
        self.fields.get(name)
    }
}

/// Raster data resampled onto individual gridpoints.
#[derive(Debug, Clone, Serialize)]
pub struct GridpointTable {
    pub country: String,
    pub source: String,
    /// Gridpoint indices, ascending.
    pub gpis: Vec<usize>,
    pub lons: Vec<f64>,
    pub lats: Vec<f64>,
    /// One value per gridpoint and variable; NaN where no source cell was in
    /// range or the source had no data.
    pub columns: BTreeMap<String, Vec<f32>>,
    pub timestamp: Option<DateTime<Utc>>,
}

impl GridpointTable {
    pub fn len(&self) -> usize {
        self.gpis.len()
    }

    pub fn is_empty(&self) -> bool {
        self.gpis.is_empty()
    }

    pub fn column(&self, name: &str) -> Option<&[f32]> {
        self.columns.get(name).map(Vec::as_slice)
    }

    /// Value of `name` at gridpoint `gpi`.
    pub fn value(&self, gpi: usize, name: &str) -> Option<f32> {
        let row = self.gpis.binary_search(&gpi).ok()?;
        self.columns.get(name).map(|values| values[row])
    }
}

/// Identity of one resampling unit, attached to raster failures.
struct Unit {
    country: String,
    source: String,
    timestamp: Option<DateTime<Utc>>,
}

impl Unit {
    fn error(&self, err: impl std::fmt::Display) -> ResampleError {
        ResampleError::source_data(&self.country, &self.source, self.timestamp, err)
    }

    fn clip(
        &self,
        source: &dyn RasterSource,
        bbox: &grid_common::BoundingBox,
        buffer_cells: usize,
    ) -> Result<ClippedRaster> {
        let clipped = source
            .clip_bbox(bbox, buffer_cells)
            .map_err(|e| self.error(e))?;
        clipped.validate().map_err(|e| self.error(e))?;
        Ok(clipped)
    }
}

/// Variable name with an optional `prefix_` prepended.
pub fn prefixed_name(prefix: Option<&str>, name: &str) -> String {
    match prefix {
        Some(p) if !p.is_empty() => format!("{}_{}", p, name),
        _ => name.to_string(),
    }
}

/// Resample `source` onto the trimmed lattice of `country`.
///
/// A destination cell is masked when it is not strictly inside the country
/// outline, or when the nearest source cell within
/// [`ResampleConfig::shape_search_radius_m`] is missing or holds no data.
/// The mask is evaluated per variable. Output variables are renamed with
/// `prefix`; the source is left untouched.
pub fn resample_to_shape(
    source: &dyn RasterSource,
    shapes: &dyn ShapeProvider,
    country: &str,
    prefix: Option<&str>,
    grid_config: &GridConfig,
    config: &ResampleConfig,
) -> Result<ResampledShape> {
    config.validate().map_err(ResampleError::Config)?;

    let shape = shapes.shape(country)?;
    let mut unit = Unit {
        country: shape.code().to_string(),
        source: source.describe(),
        timestamp: source.timestamp(),
    };

    let clipped = unit.clip(source, shape.bbox(), config.clip_buffer_cells)?;
    unit.timestamp = clipped.timestamp.or(unit.timestamp);

    let country_grid = CountryGrid::new(shape.clone(), grid_config)?;
    let grid = country_grid.grid();
    let (londim, latdim) = match (grid.londim(), grid.latdim()) {
        (Some(londim), Some(latdim)) => (londim, latdim),
        _ => return Err(GridError::empty_grid(format!("{}: grid has no axes", unit.country)).into()),
    };
    let (nrows, ncols) = (latdim.len(), londim.len());

    // Destination mesh, north to south
    let mut lons = Vec::with_capacity(nrows * ncols);
    let mut lats = Vec::with_capacity(nrows * ncols);
    let mut gpis = Vec::with_capacity(nrows * ncols);
    for row in (0..nrows).rev() {
        for (col, &lon) in londim.iter().enumerate() {
            lons.push(lon);
            lats.push(latdim[row]);
            gpis.push(row * ncols + col);
        }
    }

    let neighbours = NeighbourIndex::build(
        &clipped.lons,
        &clipped.lats,
        lons.iter().copied().zip(lats.iter().copied()),
        config.shape_search_radius_m,
    );
    debug!(
        country = %unit.country,
        cells = neighbours.len(),
        matched = neighbours.matched(),
        "Matched destination cells to source"
    );

    let outside: Vec<bool> = lons
        .iter()
        .zip(&lats)
        .map(|(&lon, &lat)| !shape.contains_strict(lon, lat))
        .collect();

    let mut fields = BTreeMap::new();
    for (name, values) in &clipped.variables {
        let resampled = neighbours.apply(values, |v| clipped.is_valid(v));
        let mask = outside
            .iter()
            .zip(&resampled)
            .map(|(&out, value)| out || value.is_nan())
            .collect();
        let field = MaskedField::new(resampled, mask, config.fill_value, (nrows, ncols))
            .map_err(|e| unit.error(e))?;
        fields.insert(prefixed_name(prefix, name), field);
    }

    info!(
        country = %unit.country,
        source = %unit.source,
        rows = nrows,
        cols = ncols,
        variables = fields.len(),
        "Resampled raster to country shape"
    );

    Ok(ResampledShape {
        country: unit.country,
        source: unit.source,
        fields,
        lons,
        lats,
        gpis,
        shape: (nrows, ncols),
        timestamp: unit.timestamp,
    })
}

/// Resample `source` onto the global-grid points inside `country`.
///
/// The global grid is the predefined grid at `grid_config.resolution`.
/// Each point takes the nearest source cell within
/// [`ResampleConfig::gridpoint_search_radius_m`].
pub fn resample_to_gridpoints(
    source: &dyn RasterSource,
    shapes: &dyn ShapeProvider,
    country: &str,
    grid_config: &GridConfig,
    config: &ResampleConfig,
) -> Result<GridpointTable> {
    config.validate().map_err(ResampleError::Config)?;

    let shape = shapes.shape(country)?;
    let mut unit = Unit {
        country: shape.code().to_string(),
        source: source.describe(),
        timestamp: source.timestamp(),
    };

    let global = build_regular_grid(grid_config.resolution, IndexMode::Disabled)?;
    let points = global.points_in_shape(&shape);
    if points.is_empty() {
        return Err(GridError::empty_grid(format!(
            "{} at {}°: no global gridpoint inside the country",
            unit.country, grid_config.resolution
        ))
        .into());
    }

    let clipped = unit.clip(source, shape.bbox(), config.clip_buffer_cells)?;
    unit.timestamp = clipped.timestamp.or(unit.timestamp);

    let neighbours = NeighbourIndex::build(
        &clipped.lons,
        &clipped.lats,
        points.iter().map(|p| (p.lon, p.lat)),
        config.gridpoint_search_radius_m,
    );

    let columns: BTreeMap<String, Vec<f32>> = clipped
        .variables
        .iter()
        .map(|(name, values)| (name.clone(), neighbours.apply(values, |v| clipped.is_valid(v))))
        .collect();

    info!(
        country = %unit.country,
        source = %unit.source,
        points = points.len(),
        matched = neighbours.matched(),
        "Resampled raster to gridpoints"
    );

    Ok(GridpointTable {
        country: unit.country,
        source: unit.source,
        gpis: points.gpis(),
        lons: points.lons(),
        lats: points.lats(),
        columns,
        timestamp: unit.timestamp,
    })
}
