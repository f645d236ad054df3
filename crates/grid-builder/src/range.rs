//! Coordinate range reduction onto a zero-anchored lattice.
//!
//! Cell centers of a lattice with resolution `r` sit at `(k + 0.5) * r` for
//! integer `k`. Every axis in this crate is generated from that formula so
//! the same cell yields bit-identical coordinates in global and country
//! grids.

use grid_common::{GridError, GridResult};

/// Reduce an interval to the outermost lattice cell centers that cover it.
///
/// The minimum is snapped up to the next lattice line and then moved half a
/// cell outward if that stays inside the interval, otherwise half a cell
/// inward. The maximum is handled symmetrically with `floor`.
///
/// Fails with [`GridError::DegenerateRange`] when the interval is too narrow
/// to hold a single center, i.e. the reduced minimum exceeds the maximum.
pub fn reduce_range(
    min_threshold: f64,
    max_threshold: f64,
    resolution: f64,
) -> GridResult<(f64, f64)> {
    if !resolution.is_finite() || resolution <= 0.0 {
        return Err(GridError::InvalidResolution(resolution));
    }

    let degenerate = || GridError::DegenerateRange {
        min_threshold,
        max_threshold,
        resolution,
    };

    if !min_threshold.is_finite() || !max_threshold.is_finite() {
        return Err(degenerate());
    }

    let half = resolution / 2.0;
    let mut min_center = (min_threshold / resolution).ceil() * resolution;
    let mut max_center = (max_threshold / resolution).floor() * resolution;

    if min_center - half < min_threshold {
        min_center += half;
    } else {
        min_center -= half;
    }

    if max_center + half > max_threshold {
        max_center -= half;
    } else {
        max_center += half;
    }

    if min_center > max_center {
        return Err(degenerate());
    }

    Ok((
        cell_center(cell_index(min_center, resolution), resolution),
        cell_center(cell_index(max_center, resolution), resolution),
    ))
}

/// Lattice index of the cell whose center is closest to `center`.
pub fn cell_index(center: f64, resolution: f64) -> i64 {
    (center / resolution - 0.5).round() as i64
}

/// Center coordinate of lattice cell `k`.
pub fn cell_center(k: i64, resolution: f64) -> f64 {
    (k as f64 + 0.5) * resolution
}

/// Every lattice center from `min_center` to `max_center` inclusive.
///
/// Returns an empty axis when `min_center > max_center`.
pub fn lattice_axis(min_center: f64, max_center: f64, resolution: f64) -> Vec<f64> {
    let first = cell_index(min_center, resolution);
    let last = cell_index(max_center, resolution);
    (first..=last).map(|k| cell_center(k, resolution)).collect()
}

/// Number of centers [`lattice_axis`] would produce, without allocating.
pub fn lattice_len(min_center: f64, max_center: f64, resolution: f64) -> usize {
    let first = cell_index(min_center, resolution);
    let last = cell_index(max_center, resolution);
    if last < first {
        0
    } else {
        (last - first + 1) as usize
    }
}
