//! Great-circle distances on a spherical earth.

/// Mean earth radius in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Calculate the Haversine distance between two points in meters.
pub fn haversine_distance(lon1: f64, lat1: f64, lon2: f64, lat2: f64) -> f64 {
    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lon = (lon2 - lon1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().min(1.0).asin();

    EARTH_RADIUS_M * c
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_haversine_distance() {
        // Vienna to Graz is roughly 145 km
        let d = haversine_distance(16.37, 48.21, 15.44, 47.07);
        assert!((d - 145_000.0).abs() < 5_000.0, "got {}", d);
    }

    #[test]
    fn test_haversine_same_point() {
        assert_eq!(haversine_distance(-97.5, 35.2, -97.5, 35.2), 0.0);
    }

    #[test]
    fn test_one_degree_of_latitude() {
        let d = haversine_distance(0.0, 0.0, 0.0, 1.0);
        assert!((d - 111_195.0).abs() < 10.0, "got {}", d);
    }
}
