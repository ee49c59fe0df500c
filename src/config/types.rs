//! Configuration type definitions.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Tile server and viewer element settings.
///
/// Used to build the tile layer URL and the map parameters for an image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ViewerConfig {
    /// Root of the tile server API, e.g. `http://localhost:8080/api/v1`
    #[serde(default = "default_api_root")]
    pub api_root: String,

    /// Tile path below the API root. `{item}` is replaced with the image
    /// identifier; `{z}`, `{x}` and `{y}` are left for the viewport.
    #[serde(default = "default_tile_path")]
    pub tile_path: String,

    /// Width of the element hosting the map in pixels (valid range: 1 - 16384)
    #[serde(default = "default_node_size")]
    pub node_width: u32,

    /// Height of the element hosting the map in pixels (valid range: 1 - 16384)
    #[serde(default = "default_node_size")]
    pub node_height: u32,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            api_root: default_api_root(),
            tile_path: default_tile_path(),
            node_width: default_node_size(),
            node_height: default_node_size(),
        }
    }
}

/// When the transient layer of a finished draw session is deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum RetireOn {
    /// On the event-loop turn after the shape event was handled
    #[default]
    NextTurn,
    /// Once the viewport reports its draw pass as complete
    DrawPass,
}

/// Draw-mode defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DrawConfig {
    /// Publish `annotationCreated` for sessions started without options
    #[serde(default = "default_trigger")]
    pub trigger_by_default: bool,

    /// When finished draw layers are deleted (next-turn, draw-pass)
    #[serde(default)]
    pub retire_on: RetireOn,
}

impl Default for DrawConfig {
    fn default() -> Self {
        Self {
            trigger_by_default: default_trigger(),
            retire_on: RetireOn::default(),
        }
    }
}

/// Fallback style of rendered annotation features.
///
/// Colors accept `#rgb`, `#rrggbb`, `rgb(r, g, b)` and `rgba(r, g, b, a)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct StyleConfig {
    #[serde(default = "default_line_color")]
    pub line_color: String,

    /// Stroke width in pixels (valid range: 0.0 - 100.0)
    #[serde(default = "default_line_width")]
    pub line_width: f64,

    #[serde(default = "default_fill_color")]
    pub fill_color: String,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            line_color: default_line_color(),
            line_width: default_line_width(),
            fill_color: default_fill_color(),
        }
    }
}

pub(super) fn default_api_root() -> String {
    "http://localhost:8080/api/v1".to_string()
}

pub(super) fn default_tile_path() -> String {
    "item/{item}/tiles/zxy/{z}/{x}/{y}".to_string()
}

fn default_node_size() -> u32 {
    1024
}

fn default_trigger() -> bool {
    true
}

pub(super) fn default_line_color() -> String {
    "#000000".to_string()
}

fn default_line_width() -> f64 {
    2.0
}

pub(super) fn default_fill_color() -> String {
    "rgba(0, 0, 0, 0)".to_string()
}
