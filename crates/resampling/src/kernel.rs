//! Nearest-neighbour resampling from a regular source lattice.
//!
//! Source cells are located by binary search on the source axes, which may
//! run in either direction. A match further away than the search radius
//! (great-circle distance) leaves the destination cell empty.

use grid_common::haversine_distance;

/// Source cell chosen for each destination point.
#[derive(Debug, Clone, PartialEq)]
pub struct NeighbourIndex {
    /// Flat row-major source index per destination point.
    pub indices: Vec<Option<usize>>,
}

impl NeighbourIndex {
    /// Match every `(lon, lat)` destination point to its nearest source cell
    /// within `max_distance_m`.
    pub fn build(
        src_lons: &[f64],
        src_lats: &[f64],
        dest: impl IntoIterator<Item = (f64, f64)>,
        max_distance_m: f64,
    ) -> Self {
        let ncols = src_lons.len();
        let indices = dest
            .into_iter()
            .map(|(lon, lat)| {
                let col = nearest_on_axis(src_lons, lon)?;
                let row = nearest_on_axis(src_lats, lat)?;
                let distance = haversine_distance(lon, lat, src_lons[col], src_lats[row]);
                (distance <= max_distance_m).then_some(row * ncols + col)
            })
            .collect();
        Self { indices }
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Number of destination points with a source cell in range.
    pub fn matched(&self) -> usize {
        self.indices.iter().filter(|i| i.is_some()).count()
    }

    /// Gather source values; unmatched or invalid cells become NaN.
    pub fn apply(&self, src: &[f32], is_valid: impl Fn(f32) -> bool) -> Vec<f32> {
        self.indices
            .iter()
            .map(|index| match index.and_then(|i| src.get(i).copied()) {
                Some(value) if is_valid(value) => value,
                _ => f32::NAN,
            })
            .collect()
    }
}

/// Index of the axis value closest to `value` on a monotonic axis.
///
/// Ties go to the lower index. Returns `None` for an empty axis.
pub fn nearest_on_axis(axis: &[f64], value: f64) -> Option<usize> {
    let (first, last) = (*axis.first()?, *axis.last()?);
    let n = axis.len();

    let ascending = first <= last;
    let upper = if ascending {
        axis.partition_point(|&v| v < value)
    } else {
        axis.partition_point(|&v| v > value)
    };

    if upper == 0 {
        return Some(0);
    }
    if upper == n {
        return Some(n - 1);
    }
    let below = (value - axis[upper - 1]).abs();
    let above = (axis[upper] - value).abs();
    Some(if below <= above { upper - 1 } else { upper })
}
