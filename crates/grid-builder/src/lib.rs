//! Regular Global Grids and Country-Clipped Grids
//!
//! This crate builds regular lon/lat lattices and fits them to country
//! outlines:
//!
//! - **Global grids**: predefined 1°, 0.25°, 0.1° and 0.01° lattices
//! - **Country grids**: a lattice over a country's bounding box, with
//!   blank outer rows and columns trimmed away
//! - **Lookups**: nearest gridpoint and bounding-box queries backed by a
//!   lazily built R-tree
//!
//! # Architecture
//!
//! ```text
//! Country code
//!      │
//!      ▼
//! ShapeProvider::shape(code) ──► CountryShape (polygon + bbox)
//!      │
//!      ├─► reduce_range(bbox.lon), reduce_range(bbox.lat)
//!      │
//!      ├─► lattice_axis() ──► candidate lattice
//!      │
//!      ├─► trim() ──► strip blank outer rows/columns
//!      │
//!      └─► Grid::regular() ──► CountryGrid
//!               │
//!               ├─► country_gridpoints()   (bbox filter + polygon test)
//!               ├─► find_nearest_gpi()      (R-tree, built on first use)
//!               └─► bbox_grid_points()
//! ```
//!
//! # Example
//!
//! ```ignore
//! use grid_builder::{build_country_grid, GridConfig, ShapeCatalog};
//!
//! let shapes = ShapeCatalog::from_json_file("shapes.json")?;
//! let grid = build_country_grid(&shapes, "AU", &GridConfig::with_resolution(0.1))?;
//!
//! for point in &grid.country_gridpoints()? {
//!     println!("{} {} {}", point.gpi, point.lon, point.lat);
//! }
//! ```

pub mod config;
pub mod country;
pub mod grid;
pub mod index;
pub mod range;
pub mod regular;
pub mod shape;
pub mod trim;

// Re-export commonly used types at crate root
pub use config::{GridConfig, IndexMode};
pub use country::{build_country_grid, CountryGrid};
pub use grid::{Grid, GridLayout};
pub use index::SpatialIndex;
pub use range::{lattice_axis, reduce_range};
pub use regular::{build_regular_grid, GlobalResolution};
pub use shape::{CountryShape, PointContainment, ShapeCatalog, ShapeProvider};
pub use trim::trim;

pub use grid_common::{BoundingBox, GridError, GridPoint, GridPoints, GridResult};
