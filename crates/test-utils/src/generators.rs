//! Test data generators for synthetic gridded fields.
//!
//! These generators create predictable, verifiable patterns that can be
//! used across the test suite.

use serde_json::{json, Value};

/// Creates a test grid with predictable values.
///
/// Each cell value is calculated as: `col * 1000 + row`
///
/// This makes it easy to verify that data is being read/written correctly
/// by checking that grid[row][col] == col * 1000 + row.
///
/// # Returns
///
/// A `Vec<f32>` in row-major order (row 0 first, then row 1, etc.)
///
/// # Example
///
/// ```
/// use test_utils::create_test_grid;
///
/// let grid = create_test_grid(10, 5);
/// assert_eq!(grid.len(), 50); // 10 * 5
/// assert_eq!(grid[0], 0.0);   // col=0, row=0 -> 0*1000 + 0
/// assert_eq!(grid[1], 1000.0); // col=1, row=0 -> 1*1000 + 0
/// assert_eq!(grid[10], 1.0);  // col=0, row=1 -> 0*1000 + 1
/// ```
pub fn create_test_grid(width: usize, height: usize) -> Vec<f32> {
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            data.push((col * 1000 + row) as f32);
        }
    }
    data
}

/// Creates a grid filled with a constant value.
pub fn create_constant_grid(width: usize, height: usize, value: f32) -> Vec<f32> {
    vec![value; width * height]
}

/// Creates a grid with NaN values at specified positions.
///
/// # Arguments
///
/// * `width` - Number of columns
/// * `height` - Number of rows
/// * `nan_positions` - List of (col, row) positions that should be NaN
///
/// # Returns
///
/// A `Vec<f32>` with NaN at specified positions, zeros elsewhere.
pub fn create_grid_with_nans(
    width: usize,
    height: usize,
    nan_positions: &[(usize, usize)],
) -> Vec<f32> {
    let mut data = vec![0.0f32; width * height];
    for &(col, row) in nan_positions {
        if col < width && row < height {
            data[row * width + col] = f32::NAN;
        }
    }
    data
}

/// Cell-center axis starting at `first` with `n` steps of `step`.
///
/// `step` may be negative for north-up latitude axes.
pub fn lattice_axis(first: f64, step: f64, n: usize) -> Vec<f64> {
    (0..n).map(|i| first + i as f64 * step).collect()
}

/// Serialize rings into the JSON layout read by the shape catalog.
///
/// Each entry is `(code, name, exterior rings)`; every ring becomes its own
/// polygon without holes.
pub fn shape_catalog_json(entries: &[(&str, &str, &[&[(f64, f64)]])]) -> String {
    let shapes: Vec<Value> = entries
        .iter()
        .map(|(code, name, rings)| {
            let polygons: Vec<Value> = rings
                .iter()
                .map(|ring| json!({ "exterior": ring }))
                .collect();
            json!({ "code": code, "name": name, "polygons": polygons })
        })
        .collect();
    json!({ "shapes": shapes }).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_test_grid() {
        let grid = create_test_grid(10, 5);
        assert_eq!(grid.len(), 50);
        assert_eq!(grid[0], 0.0); // col=0, row=0
        assert_eq!(grid[1], 1000.0); // col=1, row=0
        assert_eq!(grid[10], 1.0); // col=0, row=1
        assert_eq!(grid[11], 1001.0); // col=1, row=1
    }

    #[test]
    fn test_create_constant_grid() {
        let grid = create_constant_grid(10, 10, 42.0);
        assert_eq!(grid.len(), 100);
        assert!(grid.iter().all(|&v| v == 42.0));
    }

    #[test]
    fn test_create_grid_with_nans() {
        let grid = create_grid_with_nans(10, 10, &[(5, 5), (0, 0)]);
        assert!(grid[0].is_nan()); // (0, 0)
        assert!(grid[55].is_nan()); // (5, 5) = row 5 * 10 + col 5
        assert!(!grid[1].is_nan()); // (1, 0) should be 0.0
    }

    #[test]
    fn test_lattice_axis_descending() {
        let axis = lattice_axis(3.5, -1.0, 4);
        assert_eq!(axis, vec![3.5, 2.5, 1.5, 0.5]);
    }

    #[test]
    fn test_shape_catalog_json_layout() {
        let ring: &[(f64, f64)] = &[(0.0, 0.0), (1.0, 0.0), (0.0, 1.0), (0.0, 0.0)];
        let json: Value =
            serde_json::from_str(&shape_catalog_json(&[("XX", "Test", &[ring][..])])).unwrap();
        assert_eq!(json["shapes"][0]["code"], "XX");
        assert_eq!(json["shapes"][0]["polygons"][0]["exterior"][1], json!([1.0, 0.0]));
    }

    #[test]
    fn test_shape_catalog_json_escapes_names() {
        let ring: &[(f64, f64)] = &[(0.0, 0.0), (1.0, 0.0), (0.0, 1.0), (0.0, 0.0)];
        let text = shape_catalog_json(&[("CI", "Cote d\"Ivoire", &[ring][..])]);
        let json: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(json["shapes"][0]["name"], "Cote d\"Ivoire");
    }
}
