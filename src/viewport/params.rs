//! Pixel-space map parameters for tiled images.

use serde::{Deserialize, Serialize};

/// Tile metadata reported by the tile server for one image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TileInfo {
    pub levels: u32,
    pub size_x: u32,
    pub size_y: u32,
    pub tile_width: u32,
    pub tile_height: u32,
}

impl TileInfo {
    /// All dimensions must be non-zero before a map can be built.
    pub fn is_usable(&self) -> bool {
        self.levels > 0
            && self.size_x > 0
            && self.size_y > 0
            && self.tile_width > 0
            && self.tile_height > 0
    }
}

/// Tile URL with `{z}`, `{x}` and `{y}` placeholders left for the viewport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TileUrlTemplate(String);

impl TileUrlTemplate {
    /// Joins the API root with a tile path, substituting `{item}`.
    pub fn new(api_root: &str, tile_path: &str, item: &str) -> Self {
        Self(format!(
            "{}/{}",
            api_root.trim_end_matches('/'),
            tile_path.trim_start_matches('/').replace("{item}", item)
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Resolves the placeholders for one tile.
    pub fn expand(&self, z: u32, x: u32, y: u32) -> String {
        self.0
            .replace("{z}", &z.to_string())
            .replace("{x}", &x.to_string())
            .replace("{y}", &y.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

/// Parameters for the tile layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TileLayerParams {
    pub url: TileUrlTemplate,
    pub max_level: u32,
    pub tile_width: u32,
    pub tile_height: u32,
    pub width: u32,
    pub height: u32,
    pub wrap_x: bool,
    pub wrap_y: bool,
}

impl TileLayerParams {
    fn scale(&self, level: u32) -> f64 {
        2f64.powi((self.max_level - level.min(self.max_level)) as i32)
    }

    /// Number of tile columns and rows at `level`.
    pub fn tiles_at_zoom(&self, level: u32) -> (u32, u32) {
        let scale = self.scale(level);
        (
            (self.width as f64 / self.tile_width as f64 / scale).ceil() as u32,
            (self.height as f64 / self.tile_height as f64 / scale).ceil() as u32,
        )
    }

    /// Image size in pixels at `level`.
    pub fn tiles_max_bounds(&self, level: u32) -> (u32, u32) {
        let scale = self.scale(level);
        (
            (self.width as f64 / scale).floor() as u32,
            (self.height as f64 / scale).floor() as u32,
        )
    }
}

/// Map parameters for displaying an image in pixel coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapParams {
    pub max_bounds: Bounds,
    pub center: [f64; 2],
    pub min_level: i32,
    pub max_level: u32,
    pub zoom: f64,
    pub units_per_pixel: f64,
    pub layer: TileLayerParams,
}

impl MapParams {
    /// Computes map parameters for an image shown in a `node_width` x
    /// `node_height` element.
    ///
    /// The deepest level shows the image at native resolution; the shallowest
    /// fits the whole image in the element. A zero-sized element falls back
    /// to one tile.
    pub fn pixel_coordinates(
        node_width: u32,
        node_height: u32,
        info: &TileInfo,
        url: TileUrlTemplate,
    ) -> Self {
        let width = info.size_x.max(1) as f64;
        let height = info.size_y.max(1) as f64;
        let tile_width = info.tile_width.max(1);
        let tile_height = info.tile_height.max(1);

        let tiles_across = (width / tile_width as f64).max(height / tile_height as f64);
        let max_level = tiles_across.log2().ceil().max(0.0) as u32;

        let node_width = if node_width == 0 { tile_width } else { node_width };
        let node_height = if node_height == 0 { tile_height } else { node_height };
        let fit = (node_width as f64 / width).min(node_height as f64 / height);
        let min_level = fit.log2().floor().min(0.0) as i32;

        Self {
            max_bounds: Bounds {
                left: 0.0,
                top: 0.0,
                right: width,
                bottom: height,
            },
            center: [width / 2.0, height / 2.0],
            min_level,
            max_level,
            zoom: min_level as f64,
            units_per_pixel: 2f64.powi(max_level as i32),
            layer: TileLayerParams {
                url,
                max_level,
                tile_width,
                tile_height,
                width: width as u32,
                height: height as u32,
                wrap_x: false,
                wrap_y: false,
            },
        }
    }
}
