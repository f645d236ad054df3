//! Resampling of raster data onto country grids.
//!
//! Rasters are read through the [`RasterSource`] trait, clipped to the
//! country's bounding box and matched to destination points with a
//! nearest-neighbour kernel bounded by a great-circle search radius.
//!
//! ```text
//! GeoTIFF / MemoryRaster
//!      │ clip_bbox(country bbox, buffer)
//!      ▼
//! ClippedRaster ──► NeighbourIndex ──┬─► resample_to_shape()      → ResampledShape
//!                                    │      (country lattice, masked)
//!                                    └─► resample_to_gridpoints() → GridpointTable
//!                                           (global grid points in country)
//! ```
//!
//! Independent country x raster jobs run in parallel with [`run_batch`].

pub mod batch;
pub mod config;
pub mod error;
pub mod geotiff;
pub mod kernel;
pub mod mask;
pub mod pipeline;
pub mod raster;

pub use batch::{run_batch, run_batch_with, run_job, BatchJob, BatchOutcome, BatchOutput, ResampleMode};
pub use config::ResampleConfig;
pub use error::{RasterError, ResampleError, Result};
pub use geotiff::{layer_extent, parse_tiff_datetime, GeoTiffRaster, GDAL_NODATA_TAG};
pub use kernel::{nearest_on_axis, NeighbourIndex};
pub use mask::MaskedField;
pub use pipeline::{
    prefixed_name, resample_to_gridpoints, resample_to_shape, GridpointTable, ResampledShape,
};
pub use raster::{ClippedRaster, GeoTransform, MemoryRaster, RasterSource};
