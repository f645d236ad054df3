//! Country shapes and point-in-polygon tests.
//!
//! A [`CountryShape`] is immutable once built and is shared behind an `Arc`
//! so one load per country code serves every grid built from it.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use geo::{BoundingRect, Contains, Coord, Intersects, LineString, MultiPolygon, Point, Polygon};
use grid_common::{BoundingBox, GridError, GridResult};
use serde::Deserialize;
use tracing::info;

/// Point containment against a region.
///
/// Two variants are needed: grid trimming only keeps lattice lines with a
/// point strictly inside the region, while final gridpoint selection keeps
/// points on the boundary as well.
pub trait PointContainment {
    /// True when the point lies in the interior. Boundary points are outside.
    fn contains_strict(&self, lon: f64, lat: f64) -> bool;

    /// True when the point lies in the interior or on the boundary.
    fn contains_inclusive(&self, lon: f64, lat: f64) -> bool;
}

/// The polygon outline and bounding box of one country.
#[derive(Debug, Clone)]
pub struct CountryShape {
    code: String,
    name: Option<String>,
    geometry: MultiPolygon<f64>,
    bbox: BoundingBox,
}

impl CountryShape {
    /// Build a shape from a (multi-)polygon geometry.
    pub fn new(code: impl Into<String>, geometry: MultiPolygon<f64>) -> GridResult<Self> {
        let code = normalize_code(&code.into());

        let rect = geometry
            .bounding_rect()
            .ok_or_else(|| GridError::InvalidShape(format!("{}: geometry is empty", code)))?;
        let bbox = BoundingBox::new(rect.min().x, rect.min().y, rect.max().x, rect.max().y);
        if !bbox.is_valid() {
            return Err(GridError::InvalidShape(format!(
                "{}: non-finite coordinates",
                code
            )));
        }

        Ok(Self {
            code,
            name: None,
            geometry,
            bbox,
        })
    }

    /// Build a single-polygon shape from an exterior ring of `(lon, lat)`.
    pub fn from_ring(code: impl Into<String>, ring: &[(f64, f64)]) -> GridResult<Self> {
        Self::from_rings(code, &[ring])
    }

    /// Build a multi-part shape, one polygon without holes per ring.
    pub fn from_rings(code: impl Into<String>, rings: &[&[(f64, f64)]]) -> GridResult<Self> {
        let polygons = rings
            .iter()
            .map(|ring| Polygon::new(to_line_string(ring), vec![]))
            .collect();
        Self::new(code, MultiPolygon::new(polygons))
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn geometry(&self) -> &MultiPolygon<f64> {
        &self.geometry
    }

    pub fn bbox(&self) -> &BoundingBox {
        &self.bbox
    }
}

impl PointContainment for CountryShape {
    fn contains_strict(&self, lon: f64, lat: f64) -> bool {
        self.geometry.contains(&Point::new(lon, lat))
    }

    fn contains_inclusive(&self, lon: f64, lat: f64) -> bool {
        self.geometry.intersects(&Point::new(lon, lat))
    }
}

fn to_line_string(ring: &[(f64, f64)]) -> LineString<f64> {
    LineString::new(ring.iter().map(|&(x, y)| Coord { x, y }).collect())
}

fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

// ============================================================================
// Shape providers
// ============================================================================

/// Source of country shapes, keyed by country code.
pub trait ShapeProvider: Send + Sync {
    /// Look up the shape for a country code.
    fn shape(&self, code: &str) -> GridResult<Arc<CountryShape>>;

    /// All codes this provider knows, sorted.
    fn codes(&self) -> Vec<String>;
}

/// In-memory shape catalog.
///
/// Codes are matched case-insensitively.
#[derive(Debug, Default, Clone)]
pub struct ShapeCatalog {
    shapes: HashMap<String, Arc<CountryShape>>,
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    shapes: Vec<ShapeRecord>,
}

#[derive(Debug, Deserialize)]
struct ShapeRecord {
    code: String,
    #[serde(default)]
    name: Option<String>,
    polygons: Vec<PolygonRecord>,
}

#[derive(Debug, Deserialize)]
struct PolygonRecord {
    exterior: Vec<[f64; 2]>,
    #[serde(default)]
    interiors: Vec<Vec<[f64; 2]>>,
}

impl ShapeRecord {
    fn into_shape(self) -> GridResult<CountryShape> {
        if self.polygons.is_empty() {
            return Err(GridError::InvalidShape(format!(
                "{}: no polygons",
                self.code
            )));
        }

        let polygons = self
            .polygons
            .into_iter()
            .map(|p| {
                let exterior = record_ring(&p.exterior);
                let interiors = p.interiors.iter().map(|ring| record_ring(ring)).collect();
                Polygon::new(exterior, interiors)
            })
            .collect();

        let shape = CountryShape::new(self.code, MultiPolygon::new(polygons))?;
        Ok(match self.name {
            Some(name) => shape.with_name(name),
            None => shape,
        })
    }
}

fn record_ring(ring: &[[f64; 2]]) -> LineString<f64> {
    LineString::new(ring.iter().map(|&[x, y]| Coord { x, y }).collect())
}

impl ShapeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a shape.
    pub fn insert(&mut self, shape: CountryShape) {
        self.shapes.insert(shape.code().to_string(), Arc::new(shape));
    }

    /// Parse a catalog from its JSON representation:
    ///
    /// ```json
    /// {"shapes": [{"code": "AU", "name": "Austria",
    ///   "polygons": [{"exterior": [[9.5, 47.2], ...], "interiors": []}]}]}
    /// ```
    pub fn from_json_str(json: &str) -> GridResult<Self> {
        let file: CatalogFile = serde_json::from_str(json)?;
        let mut catalog = Self::new();
        for record in file.shapes {
            catalog.insert(record.into_shape()?);
        }
        Ok(catalog)
    }

    /// Load a catalog from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> GridResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| GridError::ShapeLoad(format!("{}: {}", path.display(), e)))?;
        let catalog = Self::from_json_str(&json)?;
        info!(path = %path.display(), shapes = catalog.len(), "Loaded shape catalog");
        Ok(catalog)
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }
}

impl ShapeProvider for ShapeCatalog {
    fn shape(&self, code: &str) -> GridResult<Arc<CountryShape>> {
        self.shapes
            .get(&normalize_code(code))
            .cloned()
            .ok_or_else(|| GridError::UnknownCountry(code.to_string()))
    }

    fn codes(&self) -> Vec<String> {
        let mut codes: Vec<String> = self.shapes.keys().cloned().collect();
        codes.sort();
        codes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_utils::{polygons, shape_catalog_json};

    #[test]
    fn test_shape_bbox() {
        let shape = CountryShape::from_ring("xx", polygons::LOWER_LEFT_TRIANGLE).unwrap();
        assert_eq!(shape.code(), "XX");
        assert_eq!(*shape.bbox(), BoundingBox::new(0.0, 0.0, 3.2, 3.2));
    }

    #[test]
    fn test_strict_and_inclusive_containment_differ_on_boundary() {
        let shape = CountryShape::from_ring("SQ", polygons::SQUARE_2X2).unwrap();

        assert!(shape.contains_strict(1.0, 1.0));
        assert!(shape.contains_inclusive(1.0, 1.0));

        // Edge point
        assert!(!shape.contains_strict(2.0, 1.0));
        assert!(shape.contains_inclusive(2.0, 1.0));

        // Vertex
        assert!(!shape.contains_strict(0.0, 0.0));
        assert!(shape.contains_inclusive(0.0, 0.0));

        assert!(!shape.contains_inclusive(2.5, 1.0));
    }

    #[test]
    fn test_hole_is_outside() {
        let geometry = MultiPolygon::new(vec![Polygon::new(
            to_line_string(polygons::FRAME_OUTER),
            vec![to_line_string(polygons::HOLE)],
        )]);
        let shape = CountryShape::new("FR", geometry).unwrap();

        assert!(shape.contains_strict(0.5, 0.5));
        assert!(!shape.contains_strict(1.5, 1.5));
        assert!(!shape.contains_inclusive(1.5, 1.5));
    }

    #[test]
    fn test_empty_geometry_rejected() {
        let err = CountryShape::new("XX", MultiPolygon::new(vec![])).unwrap_err();
        assert!(matches!(err, GridError::InvalidShape(_)));
    }

    #[test]
    fn test_catalog_from_json() {
        let json = shape_catalog_json(&[
            ("SQ", "Square", &[polygons::SQUARE_2X2][..]),
            (
                "ISL",
                "Islands",
                &[polygons::ISLAND_WEST, polygons::ISLAND_EAST][..],
            ),
        ]);
        let catalog = ShapeCatalog::from_json_str(&json).unwrap();

        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.codes(), vec!["ISL".to_string(), "SQ".to_string()]);

        let islands = catalog.shape("isl").unwrap();
        assert_eq!(islands.name(), Some("Islands"));
        assert_eq!(islands.geometry().0.len(), 2);
        assert_eq!(*islands.bbox(), BoundingBox::new(0.0, 0.0, 6.0, 2.0));
    }

    #[test]
    fn test_catalog_interiors_parsed() {
        let json = r#"{"shapes":[{"code":"FR","polygons":[{
            "exterior":[[0,0],[3,0],[3,3],[0,3],[0,0]],
            "interiors":[[[1,1],[2,1],[2,2],[1,2],[1,1]]]}]}]}"#;
        let catalog = ShapeCatalog::from_json_str(json).unwrap();
        let shape = catalog.shape("FR").unwrap();
        assert!(!shape.contains_inclusive(1.5, 1.5));
        assert!(shape.contains_strict(2.5, 2.5));
    }

    #[test]
    fn test_unknown_country() {
        let catalog = ShapeCatalog::new();
        let err = catalog.shape("ZZ").unwrap_err();
        assert!(matches!(err, GridError::UnknownCountry(code) if code == "ZZ"));
    }

    #[test]
    fn test_catalog_rejects_shape_without_polygons() {
        let json = r#"{"shapes":[{"code":"XX","polygons":[]}]}"#;
        assert!(matches!(
            ShapeCatalog::from_json_str(json),
            Err(GridError::InvalidShape(_))
        ));
    }
}
