//! Georeferenced raster access.
//!
//! Rasters are addressed through [`RasterSource`], which hands out
//! [`ClippedRaster`] windows: per-variable row-major values plus the
//! cell-center longitude and latitude axes of the window.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use grid_common::BoundingBox;
use serde::{Deserialize, Serialize};

use crate::error::RasterError;

/// Affine pixel-to-geographic transform, coefficients in GDAL order.
///
/// A pixel corner `(col, row)` maps to
/// `lon = origin_lon + col * pixel_width + row * row_rotation` and
/// `lat = origin_lat + col * col_rotation + row * pixel_height`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoTransform {
    pub origin_lon: f64,
    pub pixel_width: f64,
    pub row_rotation: f64,
    pub origin_lat: f64,
    pub col_rotation: f64,
    pub pixel_height: f64,
}

impl GeoTransform {
    pub fn from_gdal(gt: [f64; 6]) -> Self {
        Self {
            origin_lon: gt[0],
            pixel_width: gt[1],
            row_rotation: gt[2],
            origin_lat: gt[3],
            col_rotation: gt[4],
            pixel_height: gt[5],
        }
    }

    pub fn to_gdal(&self) -> [f64; 6] {
        [
            self.origin_lon,
            self.pixel_width,
            self.row_rotation,
            self.origin_lat,
            self.col_rotation,
            self.pixel_height,
        ]
    }

    /// North-up transform from the upper-left corner and cell size.
    pub fn north_up(west: f64, north: f64, cell_width: f64, cell_height: f64) -> Self {
        Self::from_gdal([west, cell_width, 0.0, north, 0.0, -cell_height])
    }

    /// Extent `(lon_min, lat_min, lon_max, lat_max)` of a raster of the
    /// given size.
    ///
    /// The corners are taken as the origin and the pixel corner
    /// `(width, height)`; for rotated rasters this is the extent of those
    /// two corners only.
    pub fn extent(&self, width: usize, height: usize) -> BoundingBox {
        let w = width as f64;
        let h = height as f64;
        BoundingBox::new(
            self.origin_lon,
            self.origin_lat + w * self.col_rotation + h * self.pixel_height,
            self.origin_lon + w * self.pixel_width + h * self.row_rotation,
            self.origin_lat,
        )
    }

    /// Move the origin from the center of the first cell to its corner.
    ///
    /// Used for rasters whose georeference addresses cell centers.
    pub fn shifted_to_corner(&self) -> Self {
        Self {
            origin_lon: self.origin_lon - 0.5 * (self.pixel_width + self.row_rotation),
            origin_lat: self.origin_lat - 0.5 * (self.col_rotation + self.pixel_height),
            ..*self
        }
    }

    /// True when rows and columns are aligned with latitude and longitude.
    pub fn is_axis_aligned(&self) -> bool {
        self.row_rotation == 0.0 && self.col_rotation == 0.0
    }

    /// Longitude of the center of column `col` (axis-aligned rasters).
    pub fn col_center(&self, col: usize) -> f64 {
        self.origin_lon + (col as f64 + 0.5) * self.pixel_width
    }

    /// Latitude of the center of row `row` (axis-aligned rasters).
    pub fn row_center(&self, row: usize) -> f64 {
        self.origin_lat + (row as f64 + 0.5) * self.pixel_height
    }
}

/// A window of raster data with its cell-center axes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClippedRaster {
    /// Row-major values per variable, `lats.len() * lons.len()` each.
    pub variables: BTreeMap<String, Vec<f32>>,
    pub lons: Vec<f64>,
    pub lats: Vec<f64>,
    pub timestamp: Option<DateTime<Utc>>,
    /// Source value marking missing data, in addition to NaN.
    pub nodata: Option<f64>,
}

impl ClippedRaster {
    /// `(rows, cols)` of every variable.
    pub fn shape(&self) -> (usize, usize) {
        (self.lats.len(), self.lons.len())
    }

    /// Check that every variable matches the axes.
    pub fn validate(&self) -> Result<(), RasterError> {
        let expected = self.lats.len() * self.lons.len();
        for (name, values) in &self.variables {
            if values.len() != expected {
                return Err(RasterError::ShapeMismatch {
                    name: name.clone(),
                    expected,
                    actual: values.len(),
                });
            }
        }
        Ok(())
    }

    /// True when `value` is real data rather than NaN or the nodata value.
    ///
    /// The nodata value is narrowed to the sample precision before the
    /// comparison, so float markers such as `-3.4e+38` match exactly.
    pub fn is_valid(&self, value: f32) -> bool {
        if value.is_nan() {
            return false;
        }
        match self.nodata {
            Some(nodata) => value != nodata as f32,
            None => true,
        }
    }
}

/// Read access to a georeferenced raster.
pub trait RasterSource {
    /// Label for logs and errors, usually the file path.
    fn describe(&self) -> String;

    /// Geographic extent of the full raster.
    fn extent(&self) -> BoundingBox;

    /// Acquisition time, when the source records one.
    fn timestamp(&self) -> Option<DateTime<Utc>>;

    /// Names of the variables served by this source.
    fn variable_names(&self) -> Vec<String>;

    /// Cut out every variable over `bbox`.
    ///
    /// Keeps the cells whose centers fall inside `bbox` (edges inclusive)
    /// plus `buffer_cells` further cells on each side where available.
    fn clip_bbox(&self, bbox: &BoundingBox, buffer_cells: usize) -> Result<ClippedRaster, RasterError>;
}

/// A fully loaded axis-aligned raster held in memory.
#[derive(Debug, Clone)]
pub struct MemoryRaster {
    label: String,
    transform: GeoTransform,
    width: usize,
    height: usize,
    variables: BTreeMap<String, Vec<f32>>,
    nodata: Option<f64>,
    timestamp: Option<DateTime<Utc>>,
}

impl MemoryRaster {
    /// Create a raster with no variables yet.
    pub fn new(
        label: impl Into<String>,
        transform: GeoTransform,
        width: usize,
        height: usize,
    ) -> Result<Self, RasterError> {
        if !transform.is_axis_aligned() {
            return Err(RasterError::Unsupported(
                "rotated geotransforms are not supported".to_string(),
            ));
        }
        if width == 0 || height == 0 {
            return Err(RasterError::Unsupported(format!(
                "empty raster {}x{}",
                width, height
            )));
        }

        Ok(Self {
            label: label.into(),
            transform,
            width,
            height,
            variables: BTreeMap::new(),
            nodata: None,
            timestamp: None,
        })
    }

    /// Add a row-major variable of `width * height` values.
    pub fn with_variable(
        mut self,
        name: impl Into<String>,
        values: Vec<f32>,
    ) -> Result<Self, RasterError> {
        let name = name.into();
        let expected = self.width * self.height;
        if values.len() != expected {
            return Err(RasterError::ShapeMismatch {
                name,
                expected,
                actual: values.len(),
            });
        }
        self.variables.insert(name, values);
        Ok(self)
    }

    pub fn with_nodata(mut self, nodata: f64) -> Self {
        self.nodata = Some(nodata);
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn transform(&self) -> &GeoTransform {
        &self.transform
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn nodata(&self) -> Option<f64> {
        self.nodata
    }

    pub fn variable(&self, name: &str) -> Option<&[f32]> {
        self.variables.get(name).map(Vec::as_slice)
    }
}

impl RasterSource for MemoryRaster {
    fn describe(&self) -> String {
        self.label.clone()
    }

    fn extent(&self) -> BoundingBox {
        self.transform.extent(self.width, self.height)
    }

    fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.timestamp
    }

    fn variable_names(&self) -> Vec<String> {
        self.variables.keys().cloned().collect()
    }

    fn clip_bbox(&self, bbox: &BoundingBox, buffer_cells: usize) -> Result<ClippedRaster, RasterError> {
        let t = &self.transform;
        let cols = window(
            t.origin_lon,
            t.pixel_width,
            self.width,
            bbox.min_lon,
            bbox.max_lon,
            buffer_cells,
        );
        let rows = window(
            t.origin_lat,
            t.pixel_height,
            self.height,
            bbox.min_lat,
            bbox.max_lat,
            buffer_cells,
        );

        let (cols, rows) = match (cols, rows) {
            (Some(cols), Some(rows)) => (cols, rows),
            _ => {
                return Err(RasterError::EmptyClip {
                    bbox: bbox.to_string(),
                    extent: self.extent().to_string(),
                })
            }
        };

        let lons: Vec<f64> = cols.clone().map(|c| t.col_center(c)).collect();
        let lats: Vec<f64> = rows.clone().map(|r| t.row_center(r)).collect();

        let variables = self
            .variables
            .iter()
            .map(|(name, values)| {
                let mut window_values = Vec::with_capacity(lons.len() * lats.len());
                for row in rows.clone() {
                    let start = row * self.width;
                    window_values.extend_from_slice(&values[start + cols.start..start + cols.end]);
                }
                (name.clone(), window_values)
            })
            .collect();

        Ok(ClippedRaster {
            variables,
            lons,
            lats,
            timestamp: self.timestamp,
            nodata: self.nodata,
        })
    }
}

/// Index range of cells along one axis whose centers lie in `[lo, hi]`,
/// widened by `buffer` cells and clamped to the raster.
///
/// Returns `None` when the widened range does not overlap the raster.
fn window(
    origin: f64,
    step: f64,
    n: usize,
    lo: f64,
    hi: f64,
    buffer: usize,
) -> Option<std::ops::Range<usize>> {
    const EPS: f64 = 1e-9;

    if step == 0.0 || !step.is_finite() || n == 0 {
        return None;
    }

    // Cell i has its center at origin + (i + 0.5) * step
    let (first, last) = if step > 0.0 {
        (
            ((lo - origin) / step - 0.5 - EPS).ceil(),
            ((hi - origin) / step - 0.5 + EPS).floor(),
        )
    } else {
        (
            ((hi - origin) / step - 0.5 - EPS).ceil(),
            ((lo - origin) / step - 0.5 + EPS).floor(),
        )
    };

    let start = (first as i64 - buffer as i64).max(0);
    let end = (last as i64 + buffer as i64).min(n as i64 - 1);
    if start > end {
        return None;
    }
    Some(start as usize..end as usize + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_utils::{assert_approx_eq, create_test_grid};

    /// 10x5 raster of 1° cells, upper-left corner at (0, 5).
    fn raster() -> MemoryRaster {
        MemoryRaster::new("mem://test", GeoTransform::north_up(0.0, 5.0, 1.0, 1.0), 10, 5)
            .unwrap()
            .with_variable("sm", create_test_grid(10, 5))
            .unwrap()
    }

    #[test]
    fn test_extent_formula() {
        let t = GeoTransform::from_gdal([10.0, 0.5, 0.0, 50.0, 0.0, -0.25]);
        let extent = t.extent(20, 8);
        assert_eq!(extent, BoundingBox::new(10.0, 48.0, 20.0, 50.0));
    }

    #[test]
    fn test_extent_with_rotation_terms() {
        let t = GeoTransform::from_gdal([0.0, 1.0, 0.1, 10.0, 0.2, -1.0]);
        let extent = t.extent(4, 3);
        assert_approx_eq!(extent.min_lon, 0.0, 1e-12);
        assert_approx_eq!(extent.min_lat, 10.0 + 4.0 * 0.2 - 3.0, 1e-12);
        assert_approx_eq!(extent.max_lon, 4.0 + 3.0 * 0.1, 1e-12);
        assert_approx_eq!(extent.max_lat, 10.0, 1e-12);
    }

    #[test]
    fn test_shift_to_corner() {
        let t = GeoTransform::north_up(-0.5, 2.5, 1.0, 1.0).shifted_to_corner();
        assert_eq!(t, GeoTransform::north_up(-1.0, 3.0, 1.0, 1.0));
    }

    #[test]
    fn test_gdal_round_trip_order() {
        let gt = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        assert_eq!(GeoTransform::from_gdal(gt).to_gdal(), gt);
    }

    #[test]
    fn test_clip_without_buffer() {
        let clipped = raster()
            .clip_bbox(&BoundingBox::new(2.0, 1.0, 4.0, 3.0), 0)
            .unwrap();
        assert_eq!(clipped.lons, vec![2.5, 3.5]);
        assert_eq!(clipped.lats, vec![2.5, 1.5]);
        // Row 2 of the raster holds lat 2.5
        assert_eq!(clipped.variables["sm"], vec![2002.0, 3002.0, 2003.0, 3003.0]);
        assert!(clipped.validate().is_ok());
    }

    #[test]
    fn test_clip_buffer_is_clamped() {
        let clipped = raster()
            .clip_bbox(&BoundingBox::new(0.0, 0.0, 1.0, 1.0), 2)
            .unwrap();
        assert_eq!(clipped.lons, vec![0.5, 1.5, 2.5]);
        assert_eq!(clipped.lats, vec![2.5, 1.5, 0.5]);
        assert_eq!(clipped.shape(), (3, 3));
    }

    #[test]
    fn test_clip_inside_single_cell_needs_buffer() {
        let bbox = BoundingBox::new(3.1, 2.1, 3.4, 2.4);
        assert!(matches!(
            raster().clip_bbox(&bbox, 0),
            Err(RasterError::EmptyClip { .. })
        ));
        let clipped = raster().clip_bbox(&bbox, 1).unwrap();
        assert_eq!(clipped.lons, vec![2.5, 3.5]);
        assert_eq!(clipped.lats, vec![2.5, 1.5]);
    }

    #[test]
    fn test_clip_outside_raster() {
        let err = raster()
            .clip_bbox(&BoundingBox::new(50.0, 50.0, 60.0, 60.0), 1)
            .unwrap_err();
        assert!(matches!(err, RasterError::EmptyClip { .. }));
    }

    #[test]
    fn test_variable_shape_checked() {
        let err = MemoryRaster::new("mem://bad", GeoTransform::north_up(0.0, 1.0, 1.0, 1.0), 2, 2)
            .unwrap()
            .with_variable("sm", vec![1.0; 3])
            .unwrap_err();
        assert!(matches!(
            err,
            RasterError::ShapeMismatch {
                expected: 4,
                actual: 3,
                ..
            }
        ));
    }

    #[test]
    fn test_rotated_transform_rejected() {
        let t = GeoTransform::from_gdal([0.0, 1.0, 0.5, 0.0, 0.0, -1.0]);
        assert!(matches!(
            MemoryRaster::new("mem://rot", t, 2, 2),
            Err(RasterError::Unsupported(_))
        ));
    }

    #[test]
    fn test_nodata_validity() {
        let mut clipped = raster()
            .clip_bbox(&BoundingBox::new(0.0, 0.0, 1.0, 1.0), 0)
            .unwrap();
        clipped.nodata = Some(-9999.0);
        assert!(clipped.is_valid(0.0));
        assert!(!clipped.is_valid(-9999.0));
        assert!(!clipped.is_valid(f32::NAN));
    }

    #[test]
    fn test_float_nodata_matches_in_sample_precision() {
        let mut clipped = raster()
            .clip_bbox(&BoundingBox::new(0.0, 0.0, 1.0, 1.0), 0)
            .unwrap();

        clipped.nodata = Some("-3.4e+38".parse().unwrap());
        assert!(!clipped.is_valid(-3.4e38f32));
        assert!(clipped.is_valid(-3.3e38f32));

        clipped.nodata = Some(0.1);
        assert!(!clipped.is_valid(0.1f32));
        assert!(clipped.is_valid(0.2f32));
    }
}
