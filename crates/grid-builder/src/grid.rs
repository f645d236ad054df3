//! The grid value type shared by global and country grids.
//!
//! A [`Grid`] is built once and read-only afterwards. The only derived state
//! is the spatial index, which is created on the first lookup that needs it.
//!
//! # Gridpoint numbering
//!
//! For regular layouts `gpi = row * ncols + col`, where row 0 is the
//! southernmost latitude and column 0 the westernmost longitude. Irregular
//! layouts number points in the order their coordinates were given.

use std::sync::OnceLock;

use grid_common::{haversine_distance, BoundingBox, GridError, GridPoint, GridPoints, GridResult};

use crate::config::IndexMode;
use crate::index::SpatialIndex;
use crate::shape::{CountryShape, PointContainment};

/// Coordinate storage of a grid.
#[derive(Debug, Clone, PartialEq)]
pub enum GridLayout {
    /// Cartesian product of two ascending axes.
    Regular { londim: Vec<f64>, latdim: Vec<f64> },
    /// Explicit per-point coordinates.
    Irregular { lons: Vec<f64>, lats: Vec<f64> },
}

/// An indexed set of gridpoints with optional active subset.
#[derive(Debug)]
pub struct Grid {
    layout: GridLayout,
    subset: Option<Vec<usize>>,
    resolution: Option<f64>,
    index_mode: IndexMode,
    index: OnceLock<SpatialIndex>,
}

impl Clone for Grid {
    /// The clone starts without an index and builds its own on demand.
    fn clone(&self) -> Self {
        Self {
            layout: self.layout.clone(),
            subset: self.subset.clone(),
            resolution: self.resolution,
            index_mode: self.index_mode,
            index: OnceLock::new(),
        }
    }
}

impl Grid {
    /// Create a regular grid from its longitude and latitude axes.
    ///
    /// Both axes must be non-empty and strictly ascending.
    pub fn regular(londim: Vec<f64>, latdim: Vec<f64>, index_mode: IndexMode) -> GridResult<Self> {
        if londim.is_empty() || latdim.is_empty() {
            return Err(GridError::empty_grid(format!(
                "regular grid with {} longitudes and {} latitudes",
                londim.len(),
                latdim.len()
            )));
        }
        check_ascending("longitude", &londim)?;
        check_ascending("latitude", &latdim)?;

        Ok(Self::from_layout(
            GridLayout::Regular { londim, latdim },
            index_mode,
        ))
    }

    /// Create an irregular grid from per-point coordinates.
    pub fn irregular(lons: Vec<f64>, lats: Vec<f64>, index_mode: IndexMode) -> GridResult<Self> {
        if lons.len() != lats.len() {
            return Err(GridError::InvalidAxis(format!(
                "{} longitudes but {} latitudes",
                lons.len(),
                lats.len()
            )));
        }
        if lons.is_empty() {
            return Err(GridError::empty_grid("irregular grid without points"));
        }

        Ok(Self::from_layout(
            GridLayout::Irregular { lons, lats },
            index_mode,
        ))
    }

    fn from_layout(layout: GridLayout, index_mode: IndexMode) -> Self {
        Self {
            layout,
            subset: None,
            resolution: None,
            index_mode,
            index: OnceLock::new(),
        }
    }

    /// Record the lattice spacing this grid was built with.
    pub fn with_resolution(mut self, resolution: f64) -> Self {
        self.resolution = Some(resolution);
        self
    }

    /// Restrict the active points to `subset`.
    ///
    /// Indices are sorted and deduplicated. Any previously built index is
    /// dropped since it covered a different point set.
    pub fn with_subset(mut self, mut subset: Vec<usize>) -> GridResult<Self> {
        let len = self.n_gpi();
        if let Some(&index) = subset.iter().find(|&&gpi| gpi >= len) {
            return Err(GridError::InvalidSubset { index, len });
        }
        subset.sort_unstable();
        subset.dedup();

        self.subset = Some(subset);
        self.index = OnceLock::new();
        Ok(self)
    }

    pub fn layout(&self) -> &GridLayout {
        &self.layout
    }

    pub fn is_regular(&self) -> bool {
        matches!(self.layout, GridLayout::Regular { .. })
    }

    pub fn resolution(&self) -> Option<f64> {
        self.resolution
    }

    pub fn index_mode(&self) -> IndexMode {
        self.index_mode
    }

    pub fn subset(&self) -> Option<&[usize]> {
        self.subset.as_deref()
    }

    /// Total number of points, active or not.
    pub fn n_gpi(&self) -> usize {
        match &self.layout {
            GridLayout::Regular { londim, latdim } => londim.len() * latdim.len(),
            GridLayout::Irregular { lons, .. } => lons.len(),
        }
    }

    /// Number of active points.
    pub fn n_active(&self) -> usize {
        match &self.subset {
            Some(subset) => subset.len(),
            None => self.n_gpi(),
        }
    }

    /// `(rows, cols)` of a regular grid.
    pub fn shape(&self) -> Option<(usize, usize)> {
        match &self.layout {
            GridLayout::Regular { londim, latdim } => Some((latdim.len(), londim.len())),
            GridLayout::Irregular { .. } => None,
        }
    }

    pub fn londim(&self) -> Option<&[f64]> {
        match &self.layout {
            GridLayout::Regular { londim, .. } => Some(londim),
            GridLayout::Irregular { .. } => None,
        }
    }

    pub fn latdim(&self) -> Option<&[f64]> {
        match &self.layout {
            GridLayout::Regular { latdim, .. } => Some(latdim),
            GridLayout::Irregular { .. } => None,
        }
    }

    pub fn gpi2lonlat(&self, gpi: usize) -> Option<(f64, f64)> {
        match &self.layout {
            GridLayout::Regular { londim, latdim } => {
                let (row, col) = self.gpi2rowcol(gpi)?;
                Some((londim[col], latdim[row]))
            }
            GridLayout::Irregular { lons, lats } => Some((*lons.get(gpi)?, *lats.get(gpi)?)),
        }
    }

    pub fn gpi2rowcol(&self, gpi: usize) -> Option<(usize, usize)> {
        let (_, ncols) = self.shape()?;
        if gpi >= self.n_gpi() {
            return None;
        }
        Some((gpi / ncols, gpi % ncols))
    }

    pub fn rowcol2gpi(&self, row: usize, col: usize) -> Option<usize> {
        let (nrows, ncols) = self.shape()?;
        if row >= nrows || col >= ncols {
            return None;
        }
        Some(row * ncols + col)
    }

    fn point(&self, gpi: usize) -> Option<GridPoint> {
        self.gpi2lonlat(gpi)
            .map(|(lon, lat)| GridPoint::new(gpi, lon, lat))
    }

    /// Every point in gpi order, ignoring the subset.
    pub fn points(&self) -> impl Iterator<Item = GridPoint> + '_ {
        (0..self.n_gpi()).filter_map(move |gpi| self.point(gpi))
    }

    /// Active points in gpi order.
    pub fn active_points(&self) -> Box<dyn Iterator<Item = GridPoint> + '_> {
        match &self.subset {
            Some(subset) => Box::new(subset.iter().filter_map(move |&gpi| self.point(gpi))),
            None => Box::new(self.points()),
        }
    }

    /// Build the spatial index over the active points if allowed.
    ///
    /// Returns `None` when indexing is disabled. Safe to call from several
    /// threads; the index is built exactly once.
    pub fn ensure_index(&self) -> Option<&SpatialIndex> {
        match self.index_mode {
            IndexMode::Disabled => None,
            IndexMode::Lazy => Some(
                self.index
                    .get_or_init(|| SpatialIndex::bulk_load(self.active_points())),
            ),
        }
    }

    pub fn has_index(&self) -> bool {
        self.index.get().is_some()
    }

    /// Full regular layout with no subset: lookups can work on the axes.
    fn full_axes(&self) -> Option<(&[f64], &[f64])> {
        match (&self.layout, &self.subset) {
            (GridLayout::Regular { londim, latdim }, None) => Some((londim, latdim)),
            _ => None,
        }
    }

    /// Nearest active gridpoint to `(lon, lat)`.
    ///
    /// Nearness is measured in lon/lat degrees, which for a lattice selects
    /// the cell containing the query point. Returns the gpi and the
    /// great-circle distance to it in meters, or `None` for a grid without
    /// active points.
    pub fn find_nearest_gpi(&self, lon: f64, lat: f64) -> Option<(usize, f64)> {
        let nearest = if let Some((londim, latdim)) = self.full_axes() {
            let col = nearest_in_ascending(londim, lon);
            let row = nearest_in_ascending(latdim, lat);
            self.point(row * londim.len() + col)?
        } else if let Some(index) = self.ensure_index() {
            index.nearest(lon, lat)?
        } else {
            self.active_points().min_by(|a, b| {
                planar_distance_2(a, lon, lat).total_cmp(&planar_distance_2(b, lon, lat))
            })?
        };

        let distance = haversine_distance(lon, lat, nearest.lon, nearest.lat);
        Some((nearest.gpi, distance))
    }

    /// Active gridpoints inside `bbox`, edges inclusive.
    pub fn bbox_grid_points(&self, bbox: &BoundingBox) -> GridPoints {
        if let Some((londim, latdim)) = self.full_axes() {
            let ncols = londim.len();
            let (col_start, col_end) = ascending_range(londim, bbox.min_lon, bbox.max_lon);
            let (row_start, row_end) = ascending_range(latdim, bbox.min_lat, bbox.max_lat);

            let mut points = Vec::with_capacity((col_end - col_start) * (row_end - row_start));
            for row in row_start..row_end {
                for col in col_start..col_end {
                    points.push(GridPoint::new(row * ncols + col, londim[col], latdim[row]));
                }
            }
            return GridPoints::new(points);
        }

        match self.ensure_index() {
            Some(index) => index
                .query_bbox(bbox)
                .into_iter()
                .filter_map(|gpi| self.point(gpi))
                .collect(),
            None => self
                .active_points()
                .filter(|p| bbox.contains(p.lon, p.lat))
                .collect(),
        }
    }

    /// Active gridpoints inside `shape`, boundary inclusive.
    ///
    /// Candidates come from the shape's bounding box and are then tested
    /// against the polygon.
    pub fn points_in_shape(&self, shape: &CountryShape) -> GridPoints {
        let candidates = self.bbox_grid_points(shape.bbox());
        candidates
            .iter()
            .filter(|p| shape.contains_inclusive(p.lon, p.lat))
            .copied()
            .collect()
    }
}

fn check_ascending(name: &str, axis: &[f64]) -> GridResult<()> {
    if axis.iter().any(|v| !v.is_finite()) {
        return Err(GridError::InvalidAxis(format!(
            "{} axis has non-finite values",
            name
        )));
    }
    if axis.windows(2).any(|w| w[0] >= w[1]) {
        return Err(GridError::InvalidAxis(format!(
            "{} axis is not strictly ascending",
            name
        )));
    }
    Ok(())
}

/// Index of the axis value closest to `value`. Ties go to the lower index.
fn nearest_in_ascending(axis: &[f64], value: f64) -> usize {
    let upper = axis.partition_point(|&v| v < value);
    if upper == 0 {
        return 0;
    }
    if upper == axis.len() {
        return axis.len() - 1;
    }
    if value - axis[upper - 1] <= axis[upper] - value {
        upper - 1
    } else {
        upper
    }
}

/// Half-open index range of axis values within `[min, max]`.
fn ascending_range(axis: &[f64], min: f64, max: f64) -> (usize, usize) {
    let start = axis.partition_point(|&v| v < min);
    let end = axis.partition_point(|&v| v <= max);
    (start, end.max(start))
}

fn planar_distance_2(point: &GridPoint, lon: f64, lat: f64) -> f64 {
    let dx = point.lon - lon;
    let dy = point.lat - lat;
    dx * dx + dy * dy
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid_3x2(mode: IndexMode) -> Grid {
        // 3 columns, 2 rows
        Grid::regular(vec![0.5, 1.5, 2.5], vec![10.5, 11.5], mode).unwrap()
    }

    #[test]
    fn test_regular_numbering() {
        let grid = grid_3x2(IndexMode::Lazy);
        assert_eq!(grid.n_gpi(), 6);
        assert_eq!(grid.shape(), Some((2, 3)));
        assert_eq!(grid.gpi2rowcol(4), Some((1, 1)));
        assert_eq!(grid.rowcol2gpi(1, 2), Some(5));
        assert_eq!(grid.gpi2lonlat(5), Some((2.5, 11.5)));
        assert_eq!(grid.gpi2lonlat(6), None);
        assert_eq!(grid.rowcol2gpi(2, 0), None);

        let lats: Vec<f64> = grid.points().map(|p| p.lat).collect();
        assert_eq!(lats, vec![10.5, 10.5, 10.5, 11.5, 11.5, 11.5]);
    }

    #[test]
    fn test_regular_rejects_bad_axes() {
        assert!(matches!(
            Grid::regular(vec![], vec![0.5], IndexMode::Lazy),
            Err(GridError::EmptyGrid(_))
        ));
        assert!(matches!(
            Grid::regular(vec![1.5, 0.5], vec![0.5], IndexMode::Lazy),
            Err(GridError::InvalidAxis(_))
        ));
        assert!(matches!(
            Grid::regular(vec![0.5, f64::NAN], vec![0.5], IndexMode::Lazy),
            Err(GridError::InvalidAxis(_))
        ));
    }

    #[test]
    fn test_irregular_grid() {
        let grid = Grid::irregular(vec![3.0, 1.0], vec![4.0, 2.0], IndexMode::Lazy).unwrap();
        assert_eq!(grid.n_gpi(), 2);
        assert_eq!(grid.shape(), None);
        assert_eq!(grid.gpi2rowcol(0), None);
        assert_eq!(grid.gpi2lonlat(1), Some((1.0, 2.0)));

        assert!(matches!(
            Grid::irregular(vec![1.0], vec![], IndexMode::Lazy),
            Err(GridError::InvalidAxis(_))
        ));
    }

    #[test]
    fn test_subset_validation_and_ordering() {
        let grid = grid_3x2(IndexMode::Lazy).with_subset(vec![4, 1, 4]).unwrap();
        assert_eq!(grid.subset(), Some(&[1, 4][..]));
        assert_eq!(grid.n_active(), 2);
        let gpis: Vec<usize> = grid.active_points().map(|p| p.gpi).collect();
        assert_eq!(gpis, vec![1, 4]);

        let err = grid_3x2(IndexMode::Lazy).with_subset(vec![6]).unwrap_err();
        assert!(matches!(err, GridError::InvalidSubset { index: 6, len: 6 }));
    }

    #[test]
    fn test_index_built_lazily_for_subsets() {
        let grid = grid_3x2(IndexMode::Lazy).with_subset(vec![1, 3, 4]).unwrap();
        assert!(!grid.has_index());
        let (gpi, _) = grid.find_nearest_gpi(1.4, 11.2).unwrap();
        assert_eq!(gpi, 4);
        assert!(grid.has_index());
    }

    #[test]
    fn test_full_grid_nearest_uses_axes() {
        let grid = grid_3x2(IndexMode::Lazy);
        let (gpi, _) = grid.find_nearest_gpi(1.4, 11.2).unwrap();
        assert_eq!(gpi, 4);
        assert!(!grid.has_index());
    }

    #[test]
    fn test_axis_index_and_linear_lookups_agree() {
        let axes = grid_3x2(IndexMode::Lazy);
        let indexed = grid_3x2(IndexMode::Lazy)
            .with_subset((0..6).collect())
            .unwrap();
        let linear = grid_3x2(IndexMode::Disabled)
            .with_subset((0..6).collect())
            .unwrap();

        for &(lon, lat) in &[(0.0, 10.0), (1.4, 11.2), (2.9, 11.9), (-5.0, 20.0)] {
            let a = axes.find_nearest_gpi(lon, lat).unwrap();
            let b = indexed.find_nearest_gpi(lon, lat).unwrap();
            let c = linear.find_nearest_gpi(lon, lat).unwrap();
            assert_eq!(a.0, b.0);
            assert_eq!(a.0, c.0);
            assert!((a.1 - b.1).abs() < 1e-6);
            assert!((a.1 - c.1).abs() < 1e-6);
        }
        assert!(indexed.has_index());
        assert!(linear.ensure_index().is_none());
        assert!(!linear.has_index());
    }

    #[test]
    fn test_nearest_respects_subset() {
        let grid = grid_3x2(IndexMode::Disabled).with_subset(vec![0, 5]).unwrap();
        let (gpi, _) = grid.find_nearest_gpi(1.6, 11.2).unwrap();
        assert_eq!(gpi, 5);
    }

    #[test]
    fn test_nearest_distance_is_great_circle() {
        let grid = grid_3x2(IndexMode::Lazy);
        let (gpi, distance) = grid.find_nearest_gpi(0.5, 10.5).unwrap();
        assert_eq!(gpi, 0);
        assert!(distance < 1e-6);

        let (_, distance) = grid.find_nearest_gpi(0.5, 9.5).unwrap();
        assert!((distance - 111_195.0).abs() < 10.0);
    }

    #[test]
    fn test_bbox_grid_points_all_paths_agree() {
        let bbox = BoundingBox::new(0.5, 10.0, 1.5, 11.0);
        let expected = vec![0, 1];

        assert_eq!(grid_3x2(IndexMode::Lazy).bbox_grid_points(&bbox).gpis(), expected);
        assert_eq!(grid_3x2(IndexMode::Disabled).bbox_grid_points(&bbox).gpis(), expected);

        let subset_lazy = grid_3x2(IndexMode::Lazy).with_subset(vec![0, 1, 2, 3, 4, 5]).unwrap();
        assert_eq!(subset_lazy.bbox_grid_points(&bbox).gpis(), expected);

        let subset_linear = grid_3x2(IndexMode::Disabled).with_subset(vec![1, 4]).unwrap();
        assert_eq!(subset_linear.bbox_grid_points(&bbox).gpis(), vec![1]);
    }

    #[test]
    fn test_bbox_outside_grid_is_empty() {
        let grid = grid_3x2(IndexMode::Lazy);
        assert!(grid
            .bbox_grid_points(&BoundingBox::new(50.0, 50.0, 60.0, 60.0))
            .is_empty());
    }

    #[test]
    fn test_nearest_in_ascending() {
        let axis = [0.5, 1.5, 2.5];
        assert_eq!(nearest_in_ascending(&axis, -3.0), 0);
        assert_eq!(nearest_in_ascending(&axis, 1.0), 0);
        assert_eq!(nearest_in_ascending(&axis, 1.1), 1);
        assert_eq!(nearest_in_ascending(&axis, 9.0), 2);
    }

    #[test]
    fn test_clone_drops_index() {
        let grid = grid_3x2(IndexMode::Lazy);
        grid.ensure_index();
        let copy = grid.clone();
        assert!(grid.has_index());
        assert!(!copy.has_index());
        assert_eq!(copy.layout(), grid.layout());
    }
}
