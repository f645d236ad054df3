//! R-tree spatial index over gridpoints.
//!
//! Coordinates are indexed in plain lon/lat degrees. For lattice grids the
//! planar nearest cell is the cell that contains the query point, which is
//! what gridpoint lookups need; callers that care about true distance use
//! the great-circle distance of the returned point.

use grid_common::{BoundingBox, GridPoint};
use rstar::{PointDistance, RTree, RTreeObject, AABB};

/// Index entry: one gridpoint.
#[derive(Debug, Clone, Copy)]
struct IndexedPoint(GridPoint);

impl RTreeObject for IndexedPoint {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point([self.0.lon, self.0.lat])
    }
}

impl PointDistance for IndexedPoint {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = self.0.lon - point[0];
        let dy = self.0.lat - point[1];
        dx * dx + dy * dy
    }
}

/// Spatial index over a fixed set of gridpoints.
pub struct SpatialIndex {
    tree: RTree<IndexedPoint>,
}

impl SpatialIndex {
    /// Bulk-load an index from gridpoints.
    pub fn bulk_load<I>(points: I) -> Self
    where
        I: IntoIterator<Item = GridPoint>,
    {
        let entries: Vec<IndexedPoint> = points.into_iter().map(IndexedPoint).collect();
        Self {
            tree: RTree::bulk_load(entries),
        }
    }

    /// The gridpoint nearest to `(lon, lat)` in degree space.
    pub fn nearest(&self, lon: f64, lat: f64) -> Option<GridPoint> {
        self.tree.nearest_neighbor(&[lon, lat]).map(|entry| entry.0)
    }

    /// Gpis of all points inside `bbox` (edges inclusive), ascending.
    pub fn query_bbox(&self, bbox: &BoundingBox) -> Vec<usize> {
        let envelope = AABB::from_corners([bbox.min_lon, bbox.min_lat], [bbox.max_lon, bbox.max_lat]);
        let mut gpis: Vec<usize> = self
            .tree
            .locate_in_envelope(&envelope)
            .map(|entry| entry.0.gpi)
            .collect();
        gpis.sort_unstable();
        gpis
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
}

impl std::fmt::Debug for SpatialIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpatialIndex")
            .field("points", &self.len())
            .finish()
    }
}
