//! Boundary trimming of candidate lattices.
//!
//! Each side of the lattice is scanned inward from its outer edge. A
//! longitude column (or latitude row) is dropped while none of its points
//! lies strictly inside the region; the scan of a side stops at the first
//! line with an interior point, or at the middle of the axis. Empty lines
//! between two occupied ones are kept.
//!
//! # Performance
//!
//! This is the hot path of country grid construction: in the worst case it
//! runs `lon_axis.len() * lat_axis.len()` point-in-polygon tests. Callers
//! bound the lattice size before trimming (see
//! [`GridConfig::max_lattice_points`](crate::GridConfig::max_lattice_points)).

use tracing::debug;

use crate::shape::PointContainment;

/// Which axis a side scan walks along.
#[derive(Debug, Clone, Copy)]
enum Axis {
    Lon,
    Lat,
}

/// Remove outer lattice lines without interior points from all four sides.
///
/// Returns the trimmed `(lon_axis, lat_axis)`; surviving coordinates keep
/// their relative order.
pub fn trim<R>(region: &R, lon_axis: &[f64], lat_axis: &[f64]) -> (Vec<f64>, Vec<f64>)
where
    R: PointContainment + ?Sized,
{
    let half_lon = lon_axis.len() / 2;
    let half_lat = lat_axis.len() / 2;

    let left = scan_side(region, lon_axis, lat_axis, Axis::Lon, (0..half_lon).collect());
    let right = scan_side(
        region,
        lon_axis,
        lat_axis,
        Axis::Lon,
        (0..half_lon).map(|i| lon_axis.len() - 1 - i).collect(),
    );
    let bottom = scan_side(region, lat_axis, lon_axis, Axis::Lat, (0..half_lat).collect());
    let top = scan_side(
        region,
        lat_axis,
        lon_axis,
        Axis::Lat,
        (0..half_lat).map(|i| lat_axis.len() - 1 - i).collect(),
    );

    debug!(
        left = left.len(),
        right = right.len(),
        bottom = bottom.len(),
        top = top.len(),
        "Trimmed blank lattice frame"
    );

    let del_lons: Vec<usize> = left.into_iter().chain(right).collect();
    let del_lats: Vec<usize> = bottom.into_iter().chain(top).collect();

    (
        remove_indices(lon_axis, &del_lons),
        remove_indices(lat_axis, &del_lats),
    )
}

/// Walk `order` over `scanned` and collect indices until a line has an
/// interior point.
fn scan_side<R>(
    region: &R,
    scanned: &[f64],
    orthogonal: &[f64],
    axis: Axis,
    order: Vec<usize>,
) -> Vec<usize>
where
    R: PointContainment + ?Sized,
{
    let mut removed = Vec::new();
    for i in order {
        if line_has_interior_point(region, scanned[i], orthogonal, axis) {
            break;
        }
        removed.push(i);
    }
    removed
}

/// True when any point on the line at `value` lies strictly inside.
fn line_has_interior_point<R>(
    region: &R,
    value: f64,
    orthogonal: &[f64],
    axis: Axis,
) -> bool
where
    R: PointContainment + ?Sized,
{
    orthogonal.iter().any(|&w| match axis {
        Axis::Lon => region.contains_strict(value, w),
        Axis::Lat => region.contains_strict(w, value),
    })
}

fn remove_indices(axis: &[f64], removed: &[usize]) -> Vec<f64> {
    axis.iter()
        .enumerate()
        .filter(|(i, _)| !removed.contains(i))
        .map(|(_, &v)| v)
        .collect()
}
