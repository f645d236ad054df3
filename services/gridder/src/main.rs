//! Country grid builder and raster resampler.
//!
//! Builds predefined global grids and country-clipped grids, reports
//! GeoTIFF extents and resamples GeoTIFF rasters onto country grids,
//! one job at a time or as a parallel batch. Results are written as JSON.

mod commands;
mod config;

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use grid_common::BoundingBox;
use resampling::ResampleMode;
use serde::Serialize;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use config::GridderConfig;

#[derive(Parser, Debug)]
#[command(name = "gridder")]
#[command(about = "Country-clipped regular grids and raster resampling")]
struct Args {
    /// Configuration file path
    #[arg(short, long, env = "GRIDDER_CONFIG")]
    config: Option<PathBuf>,

    /// Shape catalog (JSON), overrides shapes.path
    #[arg(long)]
    shapes: Option<PathBuf>,

    /// Grid resolution in degrees, overrides grid.resolution
    #[arg(short, long, global = true)]
    resolution: Option<f64>,

    /// Log level, overrides logging.level
    #[arg(long)]
    log_level: Option<String>,

    /// Log as JSON
    #[arg(long)]
    log_json: bool,

    /// Write output here instead of stdout
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Describe a predefined global grid
    Global {
        /// List the gridpoints inside lon_min,lat_min,lon_max,lat_max
        #[arg(long)]
        bbox: Option<String>,
    },

    /// Build the trimmed grid of a country
    Country {
        /// Country code
        code: String,

        /// Include every country gridpoint in the output
        #[arg(long)]
        points: bool,
    },

    /// Print the extent of a GeoTIFF
    Extent {
        path: PathBuf,
    },

    /// Resample a GeoTIFF onto a country grid
    Resample {
        /// Country code
        code: String,

        /// GeoTIFF file
        source: PathBuf,

        /// shape (country lattice) or gridpoints (global grid points)
        #[arg(long, default_value = "shape")]
        mode: ResampleMode,

        /// Variable name for a single-band file
        #[arg(long)]
        variable: Option<String>,

        /// Prefix for output variable names
        #[arg(long)]
        prefix: Option<String>,
    },

    /// Run a batch of resampling jobs from a YAML or JSON file
    Batch {
        jobs: PathBuf,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = GridderConfig::load(args.config.as_deref())?;
    if let Some(shapes) = &args.shapes {
        config.shapes.path = Some(shapes.clone());
    }
    if let Some(resolution) = args.resolution {
        config.grid.resolution = resolution;
    }
    if let Some(level) = &args.log_level {
        config.logging.level = level.to_lowercase();
    }
    if args.log_json {
        config.logging.format = "json".to_string();
    }
    config.validate()?;

    init_tracing(&config)?;
    info!(
        resolution = config.grid.resolution,
        index_mode = %config.grid.index_mode,
        "Starting gridder"
    );

    match &args.command {
        Command::Global { bbox } => {
            let bbox = bbox
                .as_deref()
                .map(BoundingBox::parse)
                .transpose()
                .context("Invalid --bbox")?;
            let report = commands::global(&config.grid, bbox)?;
            write_output(args.output.as_deref(), &report)
        }
        Command::Country { code, points } => {
            let shapes = commands::load_shapes(config.shapes.path.as_deref())?;
            let report = commands::country(&shapes, code, &config.grid, *points)?;
            write_output(args.output.as_deref(), &report)
        }
        Command::Extent { path } => {
            let extent = commands::extent(path)?;
            write_output(args.output.as_deref(), &extent)
        }
        Command::Resample {
            code,
            source,
            mode,
            variable,
            prefix,
        } => {
            let shapes = commands::load_shapes(config.shapes.path.as_deref())?;
            let job = commands::single_job(code, source, *mode, variable.clone(), prefix.clone());
            let output = commands::resample(&shapes, &job, &config.grid, &config.resample)?;
            write_output(args.output.as_deref(), &output)
        }
        Command::Batch { jobs } => {
            let shapes = commands::load_shapes(config.shapes.path.as_deref())?;
            let jobs = commands::load_jobs(jobs)?;
            let report = commands::batch(&shapes, &jobs, &config.grid, &config.resample);
            info!(
                jobs = report.jobs,
                succeeded = report.succeeded,
                failed = report.failed,
                "Batch finished"
            );
            write_output(args.output.as_deref(), &report)
        }
    }
}

fn init_tracing(config: &GridderConfig) -> Result<()> {
    let level = match config.logging.level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    // Logs go to stderr so stdout carries only the JSON result
    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_writer(std::io::stderr);

    if config.logging.format == "json" {
        tracing::subscriber::set_global_default(builder.json().finish())?;
    } else {
        tracing::subscriber::set_global_default(builder.finish())?;
    }

    Ok(())
}

fn write_output<T: Serialize>(path: Option<&Path>, value: &T) -> Result<()> {
    match path {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create output file {:?}", path))?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut writer, value)?;
            writer.write_all(b"\n")?;
            writer.flush()?;
            info!(path = %path.display(), "Wrote output");
        }
        None => {
            let stdout = std::io::stdout();
            let mut writer = stdout.lock();
            serde_json::to_writer_pretty(&mut writer, value)?;
            writer.write_all(b"\n")?;
        }
    }
    Ok(())
}
