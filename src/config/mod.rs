//! Configuration file support for tilemark.
//!
//! Settings are read from `~/.config/tilemark/config.toml` (or the platform's
//! config directory). They cover the tile server location, draw-mode defaults
//! and the fallback style of rendered annotations.
//!
//! If no config file exists, defaults are used.

pub mod types;

pub use types::{DrawConfig, RetireOn, StyleConfig, ViewerConfig};

use crate::annotation::ColorValue;
use anyhow::{Context, Result};
use log::{debug, info, warn};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use url::Url;

const NODE_SIZE_RANGE: std::ops::RangeInclusive<u32> = 1..=16384;
const LINE_WIDTH_RANGE: std::ops::RangeInclusive<f64> = 0.0..=100.0;

/// Root configuration, deserialized from TOML.
///
/// # Example TOML
/// ```toml
/// [viewer]
/// api_root = "https://tiles.example.org/api/v1"
/// tile_path = "item/{item}/tiles/zxy/{z}/{x}/{y}"
/// node_width = 1280
/// node_height = 800
///
/// [draw]
/// trigger_by_default = true
/// retire_on = "next-turn"
///
/// [style]
/// line_color = "#00ff00"
/// line_width = 2.0
/// fill_color = "rgba(0, 255, 0, 0.25)"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default, JsonSchema)]
pub struct Config {
    /// Tile server and element size
    #[serde(default)]
    pub viewer: ViewerConfig,

    /// Draw-mode defaults
    #[serde(default)]
    pub draw: DrawConfig,

    /// Fallback annotation style
    #[serde(default)]
    pub style: StyleConfig,
}

impl Config {
    /// Validates and clamps values to acceptable ranges.
    ///
    /// Every correction is logged at `warn`. Malformed strings fall back to
    /// their defaults; numbers are clamped:
    /// - `node_width`, `node_height`: 1 - 16384
    /// - `line_width`: 0.0 - 100.0
    pub fn validate_and_clamp(&mut self) {
        if let Err(err) = Url::parse(&self.viewer.api_root) {
            warn!(
                "Invalid api_root '{}' ({}), falling back to default",
                self.viewer.api_root, err
            );
            self.viewer.api_root = types::default_api_root();
        }

        if !self.viewer.tile_path.contains("{z}")
            || !self.viewer.tile_path.contains("{x}")
            || !self.viewer.tile_path.contains("{y}")
        {
            warn!(
                "tile_path '{}' lacks {{z}}/{{x}}/{{y}} placeholders, falling back to default",
                self.viewer.tile_path
            );
            self.viewer.tile_path = types::default_tile_path();
        }

        if !NODE_SIZE_RANGE.contains(&self.viewer.node_width) {
            warn!(
                "Invalid node_width {}, clamping to 1-16384 range",
                self.viewer.node_width
            );
            self.viewer.node_width = self.viewer.node_width.clamp(1, 16384);
        }
        if !NODE_SIZE_RANGE.contains(&self.viewer.node_height) {
            warn!(
                "Invalid node_height {}, clamping to 1-16384 range",
                self.viewer.node_height
            );
            self.viewer.node_height = self.viewer.node_height.clamp(1, 16384);
        }

        if !LINE_WIDTH_RANGE.contains(&self.style.line_width) {
            warn!(
                "Invalid line_width {:.1}, clamping to 0.0-100.0 range",
                self.style.line_width
            );
            // NaN fails the range check and clamps to NaN, so reset it outright
            self.style.line_width = if self.style.line_width.is_nan() {
                0.0
            } else {
                self.style.line_width.clamp(0.0, 100.0)
            };
        }

        if ColorValue::parse(&self.style.line_color).is_err() {
            warn!(
                "Invalid line_color '{}', falling back to default",
                self.style.line_color
            );
            self.style.line_color = types::default_line_color();
        }
        if ColorValue::parse(&self.style.fill_color).is_err() {
            warn!(
                "Invalid fill_color '{}', falling back to default",
                self.style.fill_color
            );
            self.style.fill_color = types::default_fill_color();
        }
    }

    /// Returns the path to the configuration file.
    ///
    /// # Errors
    /// Returns an error if the config directory cannot be determined (e.g., HOME not set).
    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Could not find config directory")?
            .join("tilemark");

        Ok(config_dir.join("config.toml"))
    }

    /// Loads the configuration file, or returns defaults if it does not exist.
    pub fn load() -> Result<Self> {
        let config_path = Self::get_config_path()?;
        Self::load_from(&config_path)
    }

    /// Loads configuration from `path`; a missing file yields defaults.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or is not
    /// valid TOML.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!("Config file not found, using defaults");
            debug!("Expected config at: {}", path.display());
            return Ok(Self::default());
        }

        let config_str = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        let mut config: Config = toml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config from {}", path.display()))?;

        config.validate_and_clamp();

        info!("Loaded config from {}", path.display());
        debug!("Config: {:?}", config);

        Ok(config)
    }

    /// Writes the configuration to the default path.
    pub fn save(&self) -> Result<()> {
        let config_path = Self::get_config_path()?;
        self.save_to(&config_path)
    }

    /// Serializes to TOML and writes `path`, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let config_str = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(path, config_str)
            .with_context(|| format!("Failed to write config to {}", path.display()))?;

        info!("Saved config to {}", path.display());
        Ok(())
    }

    /// JSON schema of the configuration file.
    pub fn json_schema() -> schemars::Schema {
        schemars::schema_for!(Config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_yields_defaults() {
        let temp = TempDir::new().unwrap();
        let config = Config::load_from(&temp.path().join("absent.toml")).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.draw.retire_on, RetireOn::NextTurn);
        assert!(config.draw.trigger_by_default);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        fs::write(
            &path,
            "[draw]\nretire_on = \"draw-pass\"\n\n[viewer]\nnode_width = 640\n",
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.draw.retire_on, RetireOn::DrawPass);
        assert_eq!(config.viewer.node_width, 640);
        assert_eq!(config.viewer.node_height, 1024);
        assert_eq!(config.style, StyleConfig::default());
    }

    #[test]
    fn out_of_range_values_are_clamped() {
        let mut config = Config::default();
        config.viewer.node_width = 0;
        config.viewer.node_height = 100_000;
        config.style.line_width = 250.0;
        config.validate_and_clamp();

        assert_eq!(config.viewer.node_width, 1);
        assert_eq!(config.viewer.node_height, 16384);
        assert_eq!(config.style.line_width, 100.0);
    }

    #[test]
    fn malformed_strings_fall_back_to_defaults() {
        let mut config = Config::default();
        config.viewer.api_root = "not a url".into();
        config.viewer.tile_path = "tiles/{z}".into();
        config.style.line_color = "chartreuse-ish".into();
        config.style.fill_color = "#12".into();
        config.validate_and_clamp();

        assert_eq!(config, Config::default());
    }

    #[test]
    fn invalid_toml_is_an_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        fs::write(&path, "[viewer\nnode_width = ").unwrap();
        let err = Config::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config"));
    }

    #[test]
    fn save_then_load_preserves_values() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join("config.toml");
        let mut config = Config::default();
        config.style.line_color = "#ff0000".into();
        config.draw.retire_on = RetireOn::DrawPass;

        config.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path).unwrap(), config);
    }

    #[test]
    fn schema_names_every_section() {
        let schema = serde_json::to_value(Config::json_schema()).unwrap();
        let properties = schema.get("properties").unwrap();
        for section in ["viewer", "draw", "style"] {
            assert!(properties.get(section).is_some(), "missing {section}");
        }
    }
}
