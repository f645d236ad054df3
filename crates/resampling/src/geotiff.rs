//! GeoTIFF reading via the `tiff` crate.
//!
//! Georeferencing is taken from `ModelTransformationTag` when present,
//! otherwise from `ModelPixelScaleTag` + `ModelTiepointTag`. Rasters
//! flagged `PixelIsPoint` in the GeoKey directory are shifted by half a
//! cell so the transform always addresses cell corners. The GDAL nodata
//! tag and the TIFF `DateTime` tag are honoured when present.

use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use grid_common::BoundingBox;
use tiff::decoder::{Decoder, DecodingResult};
use tiff::tags::Tag;
use tracing::debug;

use crate::error::RasterError;
use crate::raster::{ClippedRaster, GeoTransform, MemoryRaster, RasterSource};

/// GDAL's private nodata tag, stored as an ASCII number.
pub const GDAL_NODATA_TAG: u16 = 42113;

/// GeoTIFF key directory tag.
const GEO_KEY_DIRECTORY_TAG: u16 = 34735;

/// `GTRasterTypeGeoKey` and its `RasterPixelIsPoint` value.
const GT_RASTER_TYPE_GEO_KEY: u32 = 1025;
const RASTER_PIXEL_IS_POINT: u32 = 2;

/// TIFF `DateTime` format.
const TIFF_DATETIME_FORMAT: &str = "%Y:%m:%d %H:%M:%S";

/// A GeoTIFF file loaded into memory.
#[derive(Debug, Clone)]
pub struct GeoTiffRaster {
    path: PathBuf,
    raster: MemoryRaster,
}

impl GeoTiffRaster {
    /// Open a GeoTIFF and load every band.
    ///
    /// Bands are named `band_1`, `band_2`, ...
    pub fn open(path: impl AsRef<Path>) -> Result<Self, RasterError> {
        Self::open_inner(path.as_ref(), None)
    }

    /// Open a single-band GeoTIFF and serve its band as `variable`.
    pub fn open_as(path: impl AsRef<Path>, variable: &str) -> Result<Self, RasterError> {
        Self::open_inner(path.as_ref(), Some(variable))
    }

    fn open_inner(path: &Path, variable: Option<&str>) -> Result<Self, RasterError> {
        let file = File::open(path)?;
        let mut decoder = Decoder::new(BufReader::new(file))?;

        let (width, height) = decoder.dimensions()?;
        let (width, height) = (width as usize, height as usize);
        let transform = read_geotransform(&mut decoder)?;
        let nodata = read_nodata(&mut decoder)?;
        let timestamp = read_timestamp(&mut decoder)?;
        let samples = read_samples_per_pixel(&mut decoder)?;

        if variable.is_some() && samples != 1 {
            return Err(RasterError::Unsupported(format!(
                "{}: a variable name needs a single-band file, found {} bands",
                path.display(),
                samples
            )));
        }

        let values = decoding_result_to_f32(decoder.read_image()?);
        let expected = width * height * samples;
        if values.len() != expected {
            return Err(RasterError::ShapeMismatch {
                name: path.display().to_string(),
                expected,
                actual: values.len(),
            });
        }

        let mut raster = MemoryRaster::new(path.display().to_string(), transform, width, height)?;
        for band in 0..samples {
            let name = match variable {
                Some(name) => name.to_string(),
                None => format!("band_{}", band + 1),
            };
            let band_values: Vec<f32> = values.iter().skip(band).step_by(samples).copied().collect();
            raster = raster.with_variable(name, band_values)?;
        }
        if let Some(nodata) = nodata {
            raster = raster.with_nodata(nodata);
        }
        if let Some(timestamp) = timestamp {
            raster = raster.with_timestamp(timestamp);
        }

        debug!(
            path = %path.display(),
            width = width,
            height = height,
            bands = samples,
            "Opened GeoTIFF"
        );

        Ok(Self {
            path: path.to_path_buf(),
            raster,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn transform(&self) -> &GeoTransform {
        self.raster.transform()
    }

    pub fn width(&self) -> usize {
        self.raster.width()
    }

    pub fn height(&self) -> usize {
        self.raster.height()
    }

    pub fn nodata(&self) -> Option<f64> {
        self.raster.nodata()
    }

    pub fn variable(&self, name: &str) -> Option<&[f32]> {
        self.raster.variable(name)
    }
}

impl RasterSource for GeoTiffRaster {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn extent(&self) -> BoundingBox {
        self.raster.extent()
    }

    fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.raster.timestamp()
    }

    fn variable_names(&self) -> Vec<String> {
        self.raster.variable_names()
    }

    fn clip_bbox(&self, bbox: &BoundingBox, buffer_cells: usize) -> Result<ClippedRaster, RasterError> {
        self.raster.clip_bbox(bbox, buffer_cells)
    }
}

/// Extent `(lon_min, lat_min, lon_max, lat_max)` of a GeoTIFF file.
///
/// Only the header is read; pixel data is not decoded.
pub fn layer_extent(path: impl AsRef<Path>) -> Result<BoundingBox, RasterError> {
    let file = File::open(path.as_ref())?;
    let mut decoder = Decoder::new(BufReader::new(file))?;
    let (width, height) = decoder.dimensions()?;
    let transform = read_geotransform(&mut decoder)?;
    Ok(transform.extent(width as usize, height as usize))
}

fn read_geotransform<R: Read + Seek>(decoder: &mut Decoder<R>) -> Result<GeoTransform, RasterError> {
    let transform = read_model_transform(decoder)?;
    if read_raster_type(decoder)? == Some(RASTER_PIXEL_IS_POINT) {
        return Ok(transform.shifted_to_corner());
    }
    Ok(transform)
}

fn read_model_transform<R: Read + Seek>(decoder: &mut Decoder<R>) -> Result<GeoTransform, RasterError> {
    // Row-major 4x4 model transformation matrix
    if let Some(value) = decoder.find_tag(Tag::ModelTransformationTag)? {
        let m = value.into_f64_vec()?;
        if m.len() < 8 {
            return Err(RasterError::MissingGeoreference(format!(
                "ModelTransformationTag has {} values, expected 16",
                m.len()
            )));
        }
        return Ok(GeoTransform::from_gdal([m[3], m[0], m[1], m[7], m[4], m[5]]));
    }

    let scale = decoder
        .find_tag(Tag::ModelPixelScaleTag)?
        .map(|v| v.into_f64_vec())
        .transpose()?;
    let tiepoint = decoder
        .find_tag(Tag::ModelTiepointTag)?
        .map(|v| v.into_f64_vec())
        .transpose()?;

    match (scale, tiepoint) {
        (Some(scale), Some(tie)) if scale.len() >= 2 && tie.len() >= 6 => {
            // Tiepoint maps raster (i, j) to model (x, y)
            let (i, j, x, y) = (tie[0], tie[1], tie[3], tie[4]);
            let (sx, sy) = (scale[0], scale[1]);
            Ok(GeoTransform::from_gdal([
                x - i * sx,
                sx,
                0.0,
                y + j * sy,
                0.0,
                -sy,
            ]))
        }
        _ => Err(RasterError::MissingGeoreference(
            "neither ModelTransformationTag nor ModelPixelScaleTag + ModelTiepointTag present"
                .to_string(),
        )),
    }
}

/// Value of `GTRasterTypeGeoKey`, if the file carries a GeoKey directory.
///
/// The directory is a header of four shorts followed by one
/// `(key, location, count, value)` entry per key. Only keys stored inline
/// (location 0) are read.
fn read_raster_type<R: Read + Seek>(decoder: &mut Decoder<R>) -> Result<Option<u32>, RasterError> {
    let directory = match decoder.find_tag(Tag::from_u16_exhaustive(GEO_KEY_DIRECTORY_TAG))? {
        Some(value) => value.into_u32_vec()?,
        None => return Ok(None),
    };

    let raster_type = directory
        .get(4..)
        .unwrap_or_default()
        .chunks_exact(4)
        .find(|entry| entry[0] == GT_RASTER_TYPE_GEO_KEY && entry[1] == 0)
        .map(|entry| entry[3]);
    Ok(raster_type)
}

fn read_nodata<R: Read + Seek>(decoder: &mut Decoder<R>) -> Result<Option<f64>, RasterError> {
    let nodata = decoder
        .find_tag(Tag::from_u16_exhaustive(GDAL_NODATA_TAG))?
        .map(|v| v.into_string())
        .transpose()?
        .and_then(|s| s.trim_matches(|c: char| c == '\0' || c.is_whitespace()).parse().ok());
    Ok(nodata)
}

fn read_timestamp<R: Read + Seek>(
    decoder: &mut Decoder<R>,
) -> Result<Option<DateTime<Utc>>, RasterError> {
    let timestamp = decoder
        .find_tag(Tag::DateTime)?
        .map(|v| v.into_string())
        .transpose()?
        .and_then(|s| parse_tiff_datetime(&s));
    Ok(timestamp)
}

fn read_samples_per_pixel<R: Read + Seek>(decoder: &mut Decoder<R>) -> Result<usize, RasterError> {
    let samples = decoder
        .find_tag(Tag::SamplesPerPixel)?
        .map(|v| v.into_u32())
        .transpose()?
        .unwrap_or(1);
    Ok(samples.max(1) as usize)
}

/// Parse a TIFF `DateTime` value (`YYYY:MM:DD HH:MM:SS`) as UTC.
pub fn parse_tiff_datetime(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim_matches(|c: char| c == '\0' || c.is_whitespace());
    NaiveDateTime::parse_from_str(s, TIFF_DATETIME_FORMAT)
        .ok()
        .map(|ndt| Utc.from_utc_datetime(&ndt))
}

fn decoding_result_to_f32(result: DecodingResult) -> Vec<f32> {
    match result {
        DecodingResult::F32(v) => v,
        DecodingResult::F64(v) => v.into_iter().map(|x| x as f32).collect(),
        DecodingResult::U8(v) => v.into_iter().map(f32::from).collect(),
        DecodingResult::U16(v) => v.into_iter().map(f32::from).collect(),
        DecodingResult::U32(v) => v.into_iter().map(|x| x as f32).collect(),
        DecodingResult::U64(v) => v.into_iter().map(|x| x as f32).collect(),
        DecodingResult::I8(v) => v.into_iter().map(f32::from).collect(),
        DecodingResult::I16(v) => v.into_iter().map(f32::from).collect(),
        DecodingResult::I32(v) => v.into_iter().map(|x| x as f32).collect(),
        DecodingResult::I64(v) => v.into_iter().map(|x| x as f32).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_utils::time;

    #[test]
    fn test_parse_tiff_datetime() {
        let ts = parse_tiff_datetime(time::TIFF_DATETIME).unwrap();
        assert_eq!(ts.format("%Y-%m-%dT%H:%M:%S").to_string(), time::REFERENCE_TIME);
        assert!(parse_tiff_datetime("2014:06:13 00:00:00\0").is_some());
        assert!(parse_tiff_datetime("yesterday").is_none());
    }

    #[test]
    fn test_decoding_result_conversion() {
        assert_eq!(
            decoding_result_to_f32(DecodingResult::I16(vec![-9999, 12])),
            vec![-9999.0, 12.0]
        );
        assert_eq!(
            decoding_result_to_f32(DecodingResult::F64(vec![0.25])),
            vec![0.25]
        );
    }

    #[test]
    fn test_missing_file() {
        let err = GeoTiffRaster::open("/nonexistent/file.tif").unwrap_err();
        assert!(matches!(err, RasterError::Io(_)));
    }
}
