//! Common test fixtures for country grid tests.
//!
//! Polygons are plain `(lon, lat)` rings so this crate stays free of
//! geometry dependencies; callers convert them into their own types.

/// Country polygon rings for testing. Rings are closed (first == last).
pub mod polygons {
    /// Square aligned to two one-degree cells per side.
    pub const SQUARE_2X2: &[(f64, f64)] = &[
        (0.0, 0.0),
        (2.0, 0.0),
        (2.0, 2.0),
        (0.0, 2.0),
        (0.0, 0.0),
    ];

    /// Right triangle in the lower-left corner of the 0..4 degree square.
    ///
    /// On the one-degree lattice `[0.5, 1.5, 2.5, 3.5]` it leaves the
    /// top row and rightmost column completely outside.
    pub const LOWER_LEFT_TRIANGLE: &[(f64, f64)] = &[
        (0.0, 0.0),
        (3.2, 0.0),
        (0.0, 3.2),
        (0.0, 0.0),
    ];

    /// Non-convex L shape: the lower 4x1 strip plus the left 1x4 strip.
    pub const L_SHAPE: &[(f64, f64)] = &[
        (0.0, 0.0),
        (4.0, 0.0),
        (4.0, 1.0),
        (1.0, 1.0),
        (1.0, 4.0),
        (0.0, 4.0),
        (0.0, 0.0),
    ];

    /// Western island of a two-part country.
    pub const ISLAND_WEST: &[(f64, f64)] = &[
        (0.0, 0.0),
        (2.0, 0.0),
        (2.0, 2.0),
        (0.0, 2.0),
        (0.0, 0.0),
    ];

    /// Eastern island of a two-part country, separated by an empty
    /// two-degree channel from `ISLAND_WEST`.
    pub const ISLAND_EAST: &[(f64, f64)] = &[
        (4.0, 0.0),
        (6.0, 0.0),
        (6.0, 2.0),
        (4.0, 2.0),
        (4.0, 0.0),
    ];

    /// Outer square with a central hole (see `HOLE`).
    pub const FRAME_OUTER: &[(f64, f64)] = &[
        (0.0, 0.0),
        (3.0, 0.0),
        (3.0, 3.0),
        (0.0, 3.0),
        (0.0, 0.0),
    ];

    /// Hole covering the center cell of `FRAME_OUTER`.
    pub const HOLE: &[(f64, f64)] = &[
        (1.0, 1.0),
        (2.0, 1.0),
        (2.0, 2.0),
        (1.0, 2.0),
        (1.0, 1.0),
    ];

    /// Box narrower than one degree in longitude, too thin for a one
    /// degree lattice.
    pub const SLIVER: &[(f64, f64)] = &[
        (0.2, 0.0),
        (0.4, 0.0),
        (0.4, 3.0),
        (0.2, 3.0),
        (0.2, 0.0),
    ];

    /// Simplified outline of Austria.
    pub const AUSTRIA: &[(f64, f64)] = &[
        (9.53, 47.27),
        (9.93, 47.53),
        (12.93, 47.47),
        (13.02, 48.59),
        (14.90, 48.97),
        (16.94, 48.62),
        (17.16, 48.01),
        (16.11, 46.87),
        (14.59, 46.37),
        (12.38, 46.77),
        (10.44, 46.89),
        (9.53, 47.27),
    ];
}

/// Common time values for testing.
pub mod time {
    /// TIFF `DateTime` tag value for the reference time.
    pub const TIFF_DATETIME: &str = "2014:06:13 00:00:00";

    /// ISO form of the same instant.
    pub const REFERENCE_TIME: &str = "2014-06-13T00:00:00";
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_closed(ring: &[(f64, f64)]) -> bool {
        ring.first() == ring.last()
    }

    #[test]
    fn test_rings_are_closed() {
        for ring in [
            polygons::SQUARE_2X2,
            polygons::LOWER_LEFT_TRIANGLE,
            polygons::L_SHAPE,
            polygons::ISLAND_WEST,
            polygons::ISLAND_EAST,
            polygons::FRAME_OUTER,
            polygons::HOLE,
            polygons::SLIVER,
            polygons::AUSTRIA,
        ] {
            assert!(is_closed(ring));
        }
    }
}
