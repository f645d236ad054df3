//! Subcommand implementations. Each returns a serializable report.

use std::path::Path;

use anyhow::{Context, Result};
use grid_builder::{
    build_country_grid, build_regular_grid, GlobalResolution, GridConfig, ShapeCatalog,
    ShapeProvider,
};
use grid_common::{BoundingBox, GridPoints};
use resampling::{
    layer_extent, run_batch, run_job, BatchJob, BatchOutput, GeoTiffRaster, ResampleConfig,
    ResampleMode,
};
use serde::Serialize;
use tracing::info;

#[derive(Debug, Serialize)]
pub struct GlobalGridReport {
    pub resolution: f64,
    pub rows: usize,
    pub cols: usize,
    pub n_gpi: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bbox: Option<BoundingBox>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub points: Option<GridPoints>,
}

#[derive(Debug, Serialize)]
pub struct CountryGridReport {
    pub country: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub resolution: f64,
    pub bbox: BoundingBox,
    pub rows: usize,
    pub cols: usize,
    pub londim: Vec<f64>,
    pub latdim: Vec<f64>,
    pub n_points: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub points: Option<GridPoints>,
}

#[derive(Debug, Serialize)]
pub struct ErrorReport {
    pub code: &'static str,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct JobReport {
    pub job: BatchJob,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<BatchOutput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorReport>,
}

#[derive(Debug, Serialize)]
pub struct BatchReport {
    pub jobs: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub results: Vec<JobReport>,
}

pub fn load_shapes(path: Option<&Path>) -> Result<ShapeCatalog> {
    let path = path.context("No shape catalog configured (set shapes.path or --shapes)")?;
    ShapeCatalog::from_json_file(path)
        .with_context(|| format!("Failed to load shape catalog from {:?}", path))
}

/// Describe a predefined global grid, optionally listing the points in `bbox`.
pub fn global(config: &GridConfig, bbox: Option<BoundingBox>) -> Result<GlobalGridReport> {
    let global = GlobalResolution::from_degrees(config.resolution)?;
    let grid = build_regular_grid(config.resolution, config.index_mode)?;

    Ok(GlobalGridReport {
        resolution: global.degrees(),
        rows: global.lat_cells(),
        cols: global.lon_cells(),
        n_gpi: grid.n_gpi(),
        points: bbox.map(|bbox| grid.bbox_grid_points(&bbox)),
        bbox,
    })
}

/// Build the trimmed grid of one country.
pub fn country(
    shapes: &dyn ShapeProvider,
    code: &str,
    config: &GridConfig,
    include_points: bool,
) -> Result<CountryGridReport> {
    let country_grid = build_country_grid(shapes, code, config)?;
    let points = country_grid.country_gridpoints()?;
    let grid = country_grid.grid();
    let (rows, cols) = grid.shape().unwrap_or((0, 0));

    Ok(CountryGridReport {
        country: country_grid.code().to_string(),
        name: country_grid.shape().name().map(str::to_string),
        resolution: country_grid.resolution(),
        bbox: *country_grid.shape().bbox(),
        rows,
        cols,
        londim: grid.londim().map(<[f64]>::to_vec).unwrap_or_default(),
        latdim: grid.latdim().map(<[f64]>::to_vec).unwrap_or_default(),
        n_points: points.len(),
        points: include_points.then_some(points),
    })
}

pub fn extent(path: &Path) -> Result<BoundingBox> {
    layer_extent(path).with_context(|| format!("Failed to read extent of {:?}", path))
}

/// Resample a single GeoTIFF for one country.
pub fn resample(
    shapes: &dyn ShapeProvider,
    job: &BatchJob,
    grid_config: &GridConfig,
    resample_config: &ResampleConfig,
) -> Result<BatchOutput> {
    let source = match &job.variable {
        Some(variable) => GeoTiffRaster::open_as(&job.source, variable),
        None => GeoTiffRaster::open(&job.source),
    }
    .with_context(|| format!("Failed to open {:?}", job.source))?;

    let output = run_job(job, &source, shapes, grid_config, resample_config)?;
    Ok(output)
}

/// Read batch jobs from a YAML (`.yaml`, `.yml`) or JSON file.
pub fn load_jobs(path: &Path) -> Result<Vec<BatchJob>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read jobs from {:?}", path))?;

    let jobs: Vec<BatchJob> = match path.extension().and_then(|s| s.to_str()) {
        Some("yaml") | Some("yml") => serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse jobs YAML from {:?}", path))?,
        _ => serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse jobs JSON from {:?}", path))?,
    };

    info!(path = %path.display(), jobs = jobs.len(), "Loaded batch jobs");
    Ok(jobs)
}

/// Run every job, collecting successes and failures side by side.
pub fn batch(
    shapes: &dyn ShapeProvider,
    jobs: &[BatchJob],
    grid_config: &GridConfig,
    resample_config: &ResampleConfig,
) -> BatchReport {
    let outcomes = run_batch(jobs, shapes, grid_config, resample_config);

    let results: Vec<JobReport> = outcomes
        .into_iter()
        .map(|outcome| match outcome.result {
            Ok(output) => JobReport {
                job: outcome.job,
                output: Some(output),
                error: None,
            },
            Err(e) => JobReport {
                job: outcome.job,
                output: None,
                error: Some(ErrorReport {
                    code: e.code(),
                    message: e.to_string(),
                }),
            },
        })
        .collect();

    let succeeded = results.iter().filter(|r| r.error.is_none()).count();
    BatchReport {
        jobs: results.len(),
        succeeded,
        failed: results.len() - succeeded,
        results,
    }
}

/// Job description for a single `resample` invocation.
pub fn single_job(
    code: &str,
    source: &Path,
    mode: ResampleMode,
    variable: Option<String>,
    prefix: Option<String>,
) -> BatchJob {
    BatchJob {
        country: code.to_string(),
        source: source.to_path_buf(),
        variable,
        prefix,
        mode,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use grid_builder::CountryShape;
    use test_utils::{polygons, shape_catalog_json};

    fn catalog() -> ShapeCatalog {
        let mut catalog = ShapeCatalog::new();
        catalog.insert(
            CountryShape::from_ring("TR", polygons::LOWER_LEFT_TRIANGLE)
                .unwrap()
                .with_name("Triangle"),
        );
        catalog
    }

    #[test]
    fn test_global_report() {
        let report = global(&GridConfig::with_resolution(1.0), None).unwrap();
        assert_eq!((report.rows, report.cols), (180, 360));
        assert_eq!(report.n_gpi, 64_800);
        assert!(report.points.is_none());

        let bbox = BoundingBox::new(0.0, 0.0, 2.0, 1.0);
        let report = global(&GridConfig::with_resolution(1.0), Some(bbox)).unwrap();
        assert_eq!(report.points.unwrap().len(), 2);
    }

    #[test]
    fn test_global_unsupported_resolution() {
        assert!(global(&GridConfig::with_resolution(0.5), None).is_err());
    }

    #[test]
    fn test_country_report() {
        let report = country(&catalog(), "tr", &GridConfig::with_resolution(1.0), true).unwrap();
        assert_eq!(report.country, "TR");
        assert_eq!(report.name.as_deref(), Some("Triangle"));
        assert_eq!((report.rows, report.cols), (3, 3));
        assert_eq!(report.londim, vec![0.5, 1.5, 2.5]);
        assert_eq!(report.n_points, 6);
        assert_eq!(report.points.map(|p| p.gpis()), Some(vec![0, 1, 2, 3, 4, 6]));

        let json = serde_json::to_value(
            country(&catalog(), "TR", &GridConfig::with_resolution(1.0), false).unwrap(),
        )
        .unwrap();
        assert!(json.get("points").is_none());
        assert_eq!(json["n_points"], 6);
    }

    #[test]
    fn test_load_shapes_requires_path() {
        assert!(load_shapes(None).is_err());

        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("shapes.json");
        let json = shape_catalog_json(&[("SQ", "Square", &[polygons::SQUARE_2X2][..])]);
        std::fs::write(&path, json).unwrap();
        assert_eq!(load_shapes(Some(&path)).unwrap().len(), 1);
    }

    #[test]
    fn test_load_jobs_yaml_and_json() {
        let dir = tempfile::TempDir::new().unwrap();

        let yaml = dir.path().join("jobs.yaml");
        std::fs::write(
            &yaml,
            "- country: AT\n  source: /data/sm.tif\n- country: DE\n  source: /data/sm.tif\n  mode: gridpoints\n",
        )
        .unwrap();
        let jobs = load_jobs(&yaml).unwrap();
        assert_eq!(jobs.len(), 2);
        assert_eq!(jobs[1].mode, ResampleMode::Gridpoints);

        let json = dir.path().join("jobs.json");
        std::fs::write(&json, r#"[{"country": "AT", "source": "/data/sm.tif", "prefix": "ECV"}]"#)
            .unwrap();
        let jobs = load_jobs(&json).unwrap();
        assert_eq!(jobs[0].prefix.as_deref(), Some("ECV"));
    }

    #[test]
    fn test_batch_report_counts_failures() {
        let shapes = catalog();
        let jobs = vec![
            single_job("TR", Path::new("/nonexistent/a.tif"), ResampleMode::Shape, None, None),
            single_job("XX", Path::new("/nonexistent/b.tif"), ResampleMode::Shape, None, None),
        ];

        let report = batch(
            &shapes,
            &jobs,
            &GridConfig::with_resolution(1.0),
            &ResampleConfig::default(),
        );
        assert_eq!((report.jobs, report.succeeded, report.failed), (2, 0, 2));
        assert_eq!(report.results[0].error.as_ref().map(|e| e.code), Some("SourceData"));
    }
}
