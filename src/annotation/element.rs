//! Normalized annotation elements.

use super::color::ColorValue;
use super::identity;
use serde::{Deserialize, Serialize};

/// An `[x, y, z]` coordinate in base-layer pixel space, origin at the upper
/// left. `z` is always 0 for now.
pub type Coordinate = [f64; 3];

/// One normalized shape record.
///
/// Serializes as a flat JSON object with a `type` tag, e.g.
/// `{"id": "...", "type": "rectangle", "center": [..], "width": 10, ...}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotationElement {
    /// Stable element identity. Assigned by the draw controller when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Shape type and geometry
    #[serde(flatten)]
    pub shape: ElementShape,
    /// Optional label and colors
    #[serde(flatten)]
    pub style: ElementStyle,
}

/// Shape geometry, tagged by element `type`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ElementShape {
    /// Single point
    Point { center: Coordinate },
    /// Open line string, or a polygon when `closed` is set
    Polyline {
        points: Vec<Coordinate>,
        #[serde(default)]
        closed: bool,
    },
    /// Rectangle around `center`, rotated by `rotation` radians
    Rectangle {
        center: Coordinate,
        width: f64,
        height: f64,
        #[serde(default)]
        rotation: f64,
    },
    /// Circle of `radius` pixels
    Circle { center: Coordinate, radius: f64 },
    /// Ellipse inscribed in the rotated `width` x `height` box
    Ellipse {
        center: Coordinate,
        width: f64,
        height: f64,
        #[serde(default)]
        rotation: f64,
    },
    /// Arrow; the first point is the head
    Arrow { points: [Coordinate; 2] },
}

impl ElementShape {
    /// The `type` tag of this shape.
    pub fn type_name(&self) -> &'static str {
        match self {
            ElementShape::Point { .. } => "point",
            ElementShape::Polyline { .. } => "polyline",
            ElementShape::Rectangle { .. } => "rectangle",
            ElementShape::Circle { .. } => "circle",
            ElementShape::Ellipse { .. } => "ellipse",
            ElementShape::Arrow { .. } => "arrow",
        }
    }
}

/// Label visibility on the rendered layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LabelVisibility {
    Hidden,
    Always,
    OnHover,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Label {
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility: Option<LabelVisibility>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<ColorValue>,
}

impl Label {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            visibility: None,
            font_size: None,
            color: None,
        }
    }
}

/// Presentation fields shared by every element type.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementStyle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<Label>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_color: Option<ColorValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill_color: Option<ColorValue>,
}

impl AnnotationElement {
    pub fn new(shape: ElementShape) -> Self {
        Self {
            id: None,
            shape,
            style: ElementStyle::default(),
        }
    }

    /// Returns the element identity, generating one first if it is missing.
    pub fn ensure_id(&mut self) -> &str {
        self.id.get_or_insert_with(identity::generate_id)
    }
}
