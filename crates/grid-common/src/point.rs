//! Gridpoint records.

use serde::{Deserialize, Serialize};

/// A single gridpoint: its index and cell-center coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridPoint {
    pub gpi: usize,
    pub lon: f64,
    pub lat: f64,
}

impl GridPoint {
    pub fn new(gpi: usize, lon: f64, lat: f64) -> Self {
        Self { gpi, lon, lat }
    }
}

/// An ordered set of gridpoints, sorted by ascending gpi.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GridPoints {
    points: Vec<GridPoint>,
}

impl GridPoints {
    /// Build from arbitrary points. Sorts by gpi and drops duplicate gpis.
    pub fn new(mut points: Vec<GridPoint>) -> Self {
        points.sort_by_key(|p| p.gpi);
        points.dedup_by_key(|p| p.gpi);
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, GridPoint> {
        self.points.iter()
    }

    pub fn as_slice(&self) -> &[GridPoint] {
        &self.points
    }

    /// Look up a point by gpi.
    pub fn get(&self, gpi: usize) -> Option<&GridPoint> {
        self.points
            .binary_search_by_key(&gpi, |p| p.gpi)
            .ok()
            .map(|i| &self.points[i])
    }

    pub fn contains_gpi(&self, gpi: usize) -> bool {
        self.get(gpi).is_some()
    }

    pub fn gpis(&self) -> Vec<usize> {
        self.points.iter().map(|p| p.gpi).collect()
    }

    pub fn lons(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.lon).collect()
    }

    pub fn lats(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.lat).collect()
    }
}

impl<'a> IntoIterator for &'a GridPoints {
    type Item = &'a GridPoint;
    type IntoIter = std::slice::Iter<'a, GridPoint>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}

impl FromIterator<GridPoint> for GridPoints {
    fn from_iter<I: IntoIterator<Item = GridPoint>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_points_sorted_and_deduplicated() {
        let points = GridPoints::new(vec![
            GridPoint::new(5, 1.5, 0.5),
            GridPoint::new(1, 0.5, 0.5),
            GridPoint::new(5, 1.5, 0.5),
        ]);
        assert_eq!(points.gpis(), vec![1, 5]);
        assert_eq!(points.get(5).map(|p| p.lon), Some(1.5));
        assert!(points.get(2).is_none());
    }
}
