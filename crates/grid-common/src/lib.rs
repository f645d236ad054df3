//! Common types shared across the country-grids workspace.

pub mod bbox;
pub mod distance;
pub mod error;
pub mod point;

pub use bbox::BoundingBox;
pub use distance::haversine_distance;
pub use error::{GridError, GridResult};
pub use point::{GridPoint, GridPoints};
