//! Predefined global grids.

use grid_builder::{
    build_regular_grid, BoundingBox, CountryShape, GlobalResolution, GridError, IndexMode,
};
use test_utils::{assert_approx_eq, polygons};

#[test]
fn test_axis_lengths_for_every_resolution() {
    for resolution in GlobalResolution::ALL {
        let grid = build_regular_grid(resolution.degrees(), IndexMode::Disabled).unwrap();
        let r = resolution.degrees();

        let lon_len = (360.0 / r).round() as usize;
        let lat_len = (180.0 / r).round() as usize;
        assert_eq!(grid.londim().unwrap().len(), lon_len, "{}", resolution);
        assert_eq!(grid.latdim().unwrap().len(), lat_len, "{}", resolution);
        assert_eq!(grid.n_gpi(), lon_len * lat_len);
        assert_eq!(grid.shape(), Some((lat_len, lon_len)));
        assert_eq!(grid.resolution(), Some(r));
    }
}

#[test]
fn test_unsupported_resolution() {
    let err = build_regular_grid(0.5, IndexMode::Lazy).unwrap_err();
    assert!(matches!(err, GridError::UnsupportedResolution(r) if r == 0.5));
}

#[test]
fn test_quarter_degree_is_its_own_lattice() {
    let quarter = build_regular_grid(0.25, IndexMode::Disabled).unwrap();
    let tenth = build_regular_grid(0.1, IndexMode::Disabled).unwrap();
    assert_ne!(quarter.n_gpi(), tenth.n_gpi());
    assert_approx_eq!(quarter.londim().unwrap()[0], -179.875, 1e-9);
}

#[test]
fn test_one_degree_gpi_layout() {
    let grid = build_regular_grid(1.0, IndexMode::Disabled).unwrap();

    // Row 0 is the southernmost latitude
    assert_eq!(grid.gpi2lonlat(0), Some((-179.5, -89.5)));
    assert_eq!(grid.gpi2lonlat(1), Some((-178.5, -89.5)));
    assert_eq!(grid.gpi2lonlat(360), Some((-179.5, -88.5)));
    assert_eq!(grid.gpi2lonlat(grid.n_gpi() - 1), Some((179.5, 89.5)));
}

#[test]
fn test_country_points_on_global_grid() {
    let grid = build_regular_grid(1.0, IndexMode::Disabled).unwrap();
    let square = CountryShape::from_ring("SQ", polygons::SQUARE_2X2).unwrap();

    let points = grid.points_in_shape(&square);
    // (0.5, 0.5) is row 90, column 180
    assert_eq!(points.gpis(), vec![32580, 32581, 32940, 32941]);
}

#[test]
fn test_bbox_query_on_hundredth_grid() {
    let grid = build_regular_grid(0.01, IndexMode::Lazy).unwrap();
    let points = grid.bbox_grid_points(&BoundingBox::new(10.0, 47.0, 10.05, 47.02));

    assert_eq!(points.len(), 5 * 2);
    assert!(!grid.has_index());
    for p in &points {
        assert!(p.lon > 10.0 && p.lon < 10.05);
        assert!(p.lat > 47.0 && p.lat < 47.02);
    }
}

#[test]
fn test_nearest_on_global_grid_without_index() {
    let grid = build_regular_grid(0.1, IndexMode::Disabled).unwrap();
    let (gpi, distance) = grid.find_nearest_gpi(16.37, 48.21).unwrap();
    let (lon, lat) = grid.gpi2lonlat(gpi).unwrap();
    assert_approx_eq!(lon, 16.35, 1e-9);
    assert_approx_eq!(lat, 48.25, 1e-9);
    assert!(distance < 5_000.0);
}

#[test]
fn test_nearest_on_global_grid_skips_index() {
    let grid = build_regular_grid(0.1, IndexMode::Lazy).unwrap();
    let (gpi, _) = grid.find_nearest_gpi(16.37, 48.21).unwrap();

    assert_eq!(gpi, 4_977_163);
    assert!(!grid.has_index());
}
