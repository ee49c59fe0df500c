//! Viewport contract types.

use super::params::{MapParams, TileLayerParams};
use crate::annotation::FeatureCollection;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Opaque handle to a layer owned by the viewport library.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LayerHandle(pub u64);

/// Handle of a shape-event subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubscriptionId(pub u64);

/// Interactive drawing modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    Point,
    Line,
    Polygon,
    Rectangle,
}

impl ShapeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ShapeKind::Point => "point",
            ShapeKind::Line => "line",
            ShapeKind::Polygon => "polygon",
            ShapeKind::Rectangle => "rectangle",
        }
    }
}

impl fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ShapeKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "point" => Ok(ShapeKind::Point),
            "line" => Ok(ShapeKind::Line),
            "polygon" => Ok(ShapeKind::Polygon),
            "rectangle" => Ok(ShapeKind::Rectangle),
            other => Err(format!(
                "unknown shape '{other}' (expected point, line, polygon or rectangle)"
            )),
        }
    }
}

/// Feature primitives a feature layer can draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Primitive {
    Point,
    Line,
    Polygon,
}

impl Primitive {
    pub const ALL: [Primitive; 3] = [Primitive::Point, Primitive::Line, Primitive::Polygon];
}

/// Layer types the core asks the viewport for.
#[derive(Debug, Clone, PartialEq)]
pub enum LayerKind {
    /// Base image tiles
    Tile(TileLayerParams),
    /// Rendered annotation geometry, limited to the listed primitives
    Feature { primitives: Vec<Primitive> },
    /// Transient layer accepting interactive annotation drawing
    AnnotationDraw,
}

impl LayerKind {
    pub fn name(&self) -> &'static str {
        match self {
            LayerKind::Tile(_) => "tile",
            LayerKind::Feature { .. } => "feature",
            LayerKind::AnnotationDraw => "annotation-draw",
        }
    }
}

/// Lifecycle state of an interactive annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnnotationState {
    /// Still being drawn
    Create,
    /// Completed by the user
    Done,
    /// Being edited after completion
    Edit,
}

/// The viewport library's native record of an interactively drawn shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawAnnotation {
    /// Identity supplied by the drawing layer, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub kind: ShapeKind,
    #[serde(default = "default_state")]
    pub state: AnnotationState,
    /// Vertices in pixel space, in drawing order
    pub coordinates: Vec<[f64; 2]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke_width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill_color: Option<String>,
}

fn default_state() -> AnnotationState {
    AnnotationState::Done
}

impl RawAnnotation {
    pub fn new(kind: ShapeKind, coordinates: Vec<[f64; 2]>) -> Self {
        Self {
            id: None,
            kind,
            state: AnnotationState::Done,
            coordinates,
            label: None,
            stroke_color: None,
            stroke_width: None,
            fill_color: None,
        }
    }
}

/// Events the viewport library delivers to the core.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewportEvent {
    /// An interactive annotation on `layer` changed state
    AnnotationState {
        layer: LayerHandle,
        annotation: RawAnnotation,
    },
    /// The library finished the draw pass that followed the last event
    DrawPassComplete,
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ViewportError {
    #[error("unknown layer {0:?}")]
    UnknownLayer(LayerHandle),

    #[error("{kind} layer {layer:?} does not support {operation}")]
    Unsupported {
        layer: LayerHandle,
        kind: &'static str,
        operation: &'static str,
    },

    #[error("viewport has been torn down")]
    TornDown,

    #[error("map construction failed: {0}")]
    MapConstruction(String),

    #[error("geometry rejected: {0}")]
    Geometry(String),
}

/// Facade over the external map/viewport library.
///
/// All calls happen on the event-loop thread.
pub trait Viewport {
    fn create_layer(&mut self, kind: LayerKind) -> Result<LayerHandle, ViewportError>;

    /// Deletes a layer. Unknown handles are ignored.
    fn delete_layer(&mut self, layer: LayerHandle);

    /// Sets (or with `None`, clears) the interactive drawing mode of a layer.
    fn set_interaction_mode(
        &mut self,
        layer: LayerHandle,
        mode: Option<ShapeKind>,
    ) -> Result<(), ViewportError>;

    /// Subscribes to annotation state changes on `layer`.
    fn subscribe_shape_events(&mut self, layer: LayerHandle)
    -> Result<SubscriptionId, ViewportError>;

    fn unsubscribe(&mut self, subscription: SubscriptionId);

    /// Feeds geometry into a feature layer.
    fn read_geometry(
        &mut self,
        layer: LayerHandle,
        geometry: &FeatureCollection,
    ) -> Result<(), ViewportError>;

    /// Requests a repaint. Fire-and-forget.
    fn draw(&mut self);

    /// Destroys the map and every layer still attached to it.
    fn teardown(&mut self);
}

/// Constructs map instances (the loaded viewport library).
pub trait ViewportBackend {
    type Viewport: Viewport;

    fn create_map(&mut self, params: &MapParams) -> Result<Self::Viewport, ViewportError>;
}
