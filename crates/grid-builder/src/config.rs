//! Configuration for grid construction.

use grid_common::{GridError, GridResult};
use serde::{Deserialize, Serialize};

/// Configuration for building grids.
///
/// The resolution is read once when a grid is built; changing the config
/// afterwards does not affect grids that already exist.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Spatial resolution in degrees.
    pub resolution: f64,

    /// Whether lookups may build a spatial index.
    pub index_mode: IndexMode,

    /// Upper bound on candidate lattice points before trimming.
    pub max_lattice_points: usize,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            resolution: 0.1,
            index_mode: IndexMode::Lazy,
            max_lattice_points: 25_000_000,
        }
    }
}

impl GridConfig {
    /// Create a config with the given resolution and default limits.
    pub fn with_resolution(resolution: f64) -> Self {
        Self {
            resolution,
            ..Self::default()
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env();
        config
    }

    /// Override fields from environment variables that are set and parse.
    pub fn apply_env(&mut self) {
        if let Ok(val) = std::env::var("GRID_RESOLUTION") {
            if let Ok(res) = val.parse() {
                self.resolution = res;
            }
        }

        if let Ok(val) = std::env::var("GRID_INDEX") {
            self.index_mode = IndexMode::from_str(&val);
        }

        if let Ok(val) = std::env::var("GRID_MAX_LATTICE_POINTS") {
            if let Ok(limit) = val.parse() {
                self.max_lattice_points = limit;
            }
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> GridResult<()> {
        if !self.resolution.is_finite() || self.resolution <= 0.0 {
            return Err(GridError::InvalidResolution(self.resolution));
        }

        if self.max_lattice_points == 0 {
            return Err(GridError::LatticeTooLarge {
                points: 1,
                limit: 0,
            });
        }

        Ok(())
    }
}

/// Whether a grid may build a spatial index for lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexMode {
    /// Build the index on the first lookup.
    #[default]
    Lazy,
    /// Never build an index; lookups scan every active point.
    Disabled,
}

impl IndexMode {
    /// Parse from string (case-insensitive).
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "disabled" | "off" | "false" | "0" => Self::Disabled,
            _ => Self::Lazy,
        }
    }

    /// Get the mode name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Lazy => "lazy",
            Self::Disabled => "disabled",
        }
    }
}

impl std::fmt::Display for IndexMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = GridConfig::default();
        assert_eq!(config.resolution, 0.1);
        assert_eq!(config.index_mode, IndexMode::Lazy);
        assert_eq!(config.max_lattice_points, 25_000_000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = GridConfig::with_resolution(0.0);
        assert!(matches!(
            config.validate(),
            Err(GridError::InvalidResolution(_))
        ));

        config.resolution = f64::NAN;
        assert!(config.validate().is_err());

        config.resolution = -0.25;
        assert!(config.validate().is_err());

        config = GridConfig::default();
        config.max_lattice_points = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_index_mode_from_str() {
        assert_eq!(IndexMode::from_str("lazy"), IndexMode::Lazy);
        assert_eq!(IndexMode::from_str("DISABLED"), IndexMode::Disabled);
        assert_eq!(IndexMode::from_str("off"), IndexMode::Disabled);
        assert_eq!(IndexMode::from_str("invalid"), IndexMode::Lazy);
    }
}
