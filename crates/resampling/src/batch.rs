//! Parallel execution of independent resampling jobs.
//!
//! Each job pairs one country with one raster file. Jobs share nothing but
//! the read-only shape provider and configs, so they run on the rayon pool
//! and a failing job is reported in its own outcome without stopping the
//! others.

use std::path::PathBuf;
use std::str::FromStr;

use grid_builder::{GridConfig, ShapeProvider};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::ResampleConfig;
use crate::error::{RasterError, ResampleError, Result};
use crate::geotiff::GeoTiffRaster;
use crate::pipeline::{resample_to_gridpoints, resample_to_shape, GridpointTable, ResampledShape};
use crate::raster::RasterSource;

/// Destination of a resampling job.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResampleMode {
    /// The country's trimmed lattice, masked outside the outline.
    #[default]
    Shape,
    /// The global-grid points inside the country.
    Gridpoints,
}

impl FromStr for ResampleMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "shape" => Ok(Self::Shape),
            "gridpoints" | "points" => Ok(Self::Gridpoints),
            other => Err(format!("unknown resample mode: {}", other)),
        }
    }
}

/// One country x raster unit of work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchJob {
    pub country: String,
    pub source: PathBuf,
    /// Name for the band of a single-band file. Bands are named `band_N`
    /// otherwise.
    #[serde(default)]
    pub variable: Option<String>,
    #[serde(default)]
    pub prefix: Option<String>,
    #[serde(default)]
    pub mode: ResampleMode,
}

/// Result data of a successful job.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum BatchOutput {
    Shape(ResampledShape),
    Gridpoints(GridpointTable),
}

/// A job together with its result.
#[derive(Debug)]
pub struct BatchOutcome {
    pub job: BatchJob,
    pub result: Result<BatchOutput>,
}

impl BatchOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Run `jobs` in parallel, reading each source as a GeoTIFF.
///
/// Outcomes are returned in job order.
pub fn run_batch(
    jobs: &[BatchJob],
    shapes: &dyn ShapeProvider,
    grid_config: &GridConfig,
    config: &ResampleConfig,
) -> Vec<BatchOutcome> {
    run_batch_with(jobs, shapes, grid_config, config, |job| match &job.variable {
        Some(variable) => GeoTiffRaster::open_as(&job.source, variable),
        None => GeoTiffRaster::open(&job.source),
    })
}

/// Run `jobs` in parallel with a custom raster opener.
pub fn run_batch_with<S, F>(
    jobs: &[BatchJob],
    shapes: &dyn ShapeProvider,
    grid_config: &GridConfig,
    config: &ResampleConfig,
    open: F,
) -> Vec<BatchOutcome>
where
    S: RasterSource,
    F: Fn(&BatchJob) -> std::result::Result<S, RasterError> + Sync,
{
    let outcomes: Vec<BatchOutcome> = jobs
        .par_iter()
        .map(|job| {
            let result = open(job)
                .map_err(|e| {
                    ResampleError::source_data(&job.country, job.source.display().to_string(), None, e)
                })
                .and_then(|source| run_job(job, &source, shapes, grid_config, config));

            if let Err(e) = &result {
                warn!(
                    country = %job.country,
                    source = %job.source.display(),
                    code = e.code(),
                    error = %e,
                    "Resampling job failed"
                );
            }

            BatchOutcome {
                job: job.clone(),
                result,
            }
        })
        .collect();

    let succeeded = outcomes.iter().filter(|o| o.is_ok()).count();
    info!(
        jobs = outcomes.len(),
        succeeded = succeeded,
        failed = outcomes.len() - succeeded,
        "Batch complete"
    );

    outcomes
}

/// Run a single job against an already opened source.
pub fn run_job(
    job: &BatchJob,
    source: &dyn RasterSource,
    shapes: &dyn ShapeProvider,
    grid_config: &GridConfig,
    config: &ResampleConfig,
) -> Result<BatchOutput> {
    match job.mode {
        ResampleMode::Shape => resample_to_shape(
            source,
            shapes,
            &job.country,
            job.prefix.as_deref(),
            grid_config,
            config,
        )
        .map(BatchOutput::Shape),
        ResampleMode::Gridpoints => {
            resample_to_gridpoints(source, shapes, &job.country, grid_config, config)
                .map(BatchOutput::Gridpoints)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_parsing() {
        assert_eq!("shape".parse::<ResampleMode>().unwrap(), ResampleMode::Shape);
        assert_eq!("GridPoints".parse::<ResampleMode>().unwrap(), ResampleMode::Gridpoints);
        assert!("raster".parse::<ResampleMode>().is_err());
    }

    #[test]
    fn test_job_defaults_from_json() {
        let job: BatchJob =
            serde_json::from_str(r#"{"country": "AT", "source": "/data/sm.tif"}"#).unwrap();
        assert_eq!(job.mode, ResampleMode::Shape);
        assert!(job.variable.is_none());
        assert!(job.prefix.is_none());

        let job: BatchJob = serde_json::from_str(
            r#"{"country": "AT", "source": "/data/sm.tif", "mode": "gridpoints", "prefix": "ECV"}"#,
        )
        .unwrap();
        assert_eq!(job.mode, ResampleMode::Gridpoints);
        assert_eq!(job.prefix.as_deref(), Some("ECV"));
    }
}
