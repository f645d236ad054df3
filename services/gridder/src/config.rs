//! Gridder configuration.
//!
//! Loaded from an optional YAML file with `grid`, `resample`, `shapes` and
//! `logging` sections. Every section and field is optional. `${VAR}` and
//! `${VAR:-default}` are substituted from the environment before parsing,
//! then the `GRID_*` and `RESAMPLE_*` variables override parsed values.

use anyhow::{Context, Result};
use grid_builder::GridConfig;
use resampling::ResampleConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const VALID_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];
const VALID_FORMATS: [&str; 2] = ["json", "pretty"];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GridderConfig {
    pub grid: GridConfig,
    pub resample: ResampleConfig,
    pub shapes: ShapesConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ShapesConfig {
    /// JSON shape catalog.
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl GridderConfig {
    /// Load the YAML file if given, apply environment overrides and validate.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_yaml_file(path)?,
            None => Self::default(),
        };
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {:?}", path))?;
        let expanded = expand_env_vars(&content)?;
        Self::from_yaml_str(&expanded)
            .with_context(|| format!("Failed to parse config from {:?}", path))
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        // An empty document is a valid, all-default config
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yaml::from_str(content)?;
        Ok(config)
    }

    pub fn apply_env(&mut self) {
        self.grid.apply_env();
        self.resample.apply_env();

        if let Ok(val) = std::env::var("GRIDDER_SHAPES") {
            self.shapes.path = Some(PathBuf::from(val));
        }

        if let Ok(val) = std::env::var("GRIDDER_LOG_LEVEL") {
            self.logging.level = val.to_lowercase();
        }

        if let Ok(val) = std::env::var("GRIDDER_LOG_FORMAT") {
            self.logging.format = val.to_lowercase();
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.grid.validate().context("Invalid grid config")?;
        self.resample
            .validate()
            .map_err(|e| anyhow::anyhow!("Invalid resample config: {}", e))?;

        anyhow::ensure!(
            VALID_LEVELS.contains(&self.logging.level.as_str()),
            "Invalid log level: {}. Must be one of: {:?}",
            self.logging.level,
            VALID_LEVELS
        );
        anyhow::ensure!(
            VALID_FORMATS.contains(&self.logging.format.as_str()),
            "Invalid log format: {}. Must be one of: {:?}",
            self.logging.format,
            VALID_FORMATS
        );

        Ok(())
    }
}

/// Expand environment variables in YAML content.
/// Supports ${VAR} and ${VAR:-default} syntax.
fn expand_env_vars(content: &str) -> Result<String> {
    let mut result = String::with_capacity(content.len());
    let mut chars = content.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && chars.peek() == Some(&'{') {
            chars.next();

            let mut var_expr = String::new();
            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(c) => var_expr.push(c),
                    None => anyhow::bail!("Unclosed variable substitution: ${{{}", var_expr),
                }
            }

            result.push_str(&resolve_var_expr(&var_expr)?);
        } else {
            result.push(ch);
        }
    }

    Ok(result)
}

fn resolve_var_expr(expr: &str) -> Result<String> {
    if let Some((var_name, default)) = expr.split_once(":-") {
        match std::env::var(var_name.trim()) {
            Ok(val) if !val.is_empty() => Ok(val),
            _ => Ok(default.to_string()),
        }
    } else {
        std::env::var(expr.trim()).with_context(|| format!("Environment variable {} not set", expr))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use grid_builder::IndexMode;

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = GridderConfig::from_yaml_str(
            r#"
grid:
  resolution: 0.25
resample:
  fill_value: -999
shapes:
  path: /data/shapes.json
"#,
        )
        .unwrap();

        assert_eq!(config.grid.resolution, 0.25);
        assert_eq!(config.grid.index_mode, IndexMode::Lazy);
        assert_eq!(config.resample.fill_value, -999.0);
        assert_eq!(config.resample.gridpoint_search_radius_m, 20_000.0);
        assert_eq!(config.shapes.path, Some(PathBuf::from("/data/shapes.json")));
        assert_eq!(config.logging.level, "info");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_yaml_is_default() {
        let config = GridderConfig::from_yaml_str("").unwrap();
        assert_eq!(config.grid.resolution, 0.1);
        assert!(config.shapes.path.is_none());
    }

    #[test]
    fn test_index_mode_from_yaml() {
        let config = GridderConfig::from_yaml_str("grid:\n  index_mode: disabled\n").unwrap();
        assert_eq!(config.grid.index_mode, IndexMode::Disabled);
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut config = GridderConfig::default();
        config.logging.level = "verbose".to_string();
        assert!(config.validate().is_err());

        let mut config = GridderConfig::default();
        config.logging.format = "xml".to_string();
        assert!(config.validate().is_err());

        let mut config = GridderConfig::default();
        config.grid.resolution = -1.0;
        assert!(config.validate().is_err());

        let mut config = GridderConfig::default();
        config.resample.shape_search_radius_m = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_expand_env_vars_with_default() {
        std::env::remove_var("GRIDDER_TEST_UNSET_DIR");
        let result = expand_env_vars("path: ${GRIDDER_TEST_UNSET_DIR:-/data}/shapes.json").unwrap();
        assert_eq!(result, "path: /data/shapes.json");
    }

    #[test]
    fn test_expand_env_vars_simple() {
        std::env::set_var("GRIDDER_TEST_SHAPES_DIR", "/srv/shapes");
        let result = expand_env_vars("${GRIDDER_TEST_SHAPES_DIR}/world.json").unwrap();
        assert_eq!(result, "/srv/shapes/world.json");
    }

    #[test]
    fn test_expand_env_vars_errors() {
        std::env::remove_var("GRIDDER_TEST_REQUIRED");
        assert!(expand_env_vars("${GRIDDER_TEST_REQUIRED}").is_err());
        assert!(expand_env_vars("${UNCLOSED").is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("gridder.yaml");
        std::fs::write(&path, "grid:\n  resolution: 1.0\nlogging:\n  format: json\n").unwrap();

        let config = GridderConfig::from_yaml_file(&path).unwrap();
        assert_eq!(config.grid.resolution, 1.0);
        assert_eq!(config.logging.format, "json");

        assert!(GridderConfig::from_yaml_file(&dir.path().join("missing.yaml")).is_err());
    }
}
