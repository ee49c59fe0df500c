//! GeoJSON-like geometry export.
//!
//! Overlay layers only understand three primitives (point, line, polygon), so
//! every element type is flattened into one of them here. Circles and
//! ellipses are tessellated; rectangles become their (possibly rotated)
//! corner ring.

use super::element::{AnnotationElement, Coordinate, ElementShape};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::f64::consts::TAU;

/// Number of segments used to approximate circles and ellipses.
pub const CURVE_SEGMENTS: usize = 32;

pub type Position = [f64; 2];

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename = "FeatureCollection")]
pub struct FeatureCollection {
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename = "Feature")]
pub struct Feature {
    pub geometry: Geometry,
    #[serde(default)]
    pub properties: Map<String, Value>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "coordinates")]
pub enum Geometry {
    Point(Position),
    LineString(Vec<Position>),
    Polygon(Vec<Vec<Position>>),
}

impl Geometry {
    pub fn primitive_name(&self) -> &'static str {
        match self {
            Geometry::Point(_) => "point",
            Geometry::LineString(_) => "line",
            Geometry::Polygon(_) => "polygon",
        }
    }
}

/// Converts one element into its feature.
pub fn element_feature(element: &AnnotationElement) -> Feature {
    let geometry = match &element.shape {
        ElementShape::Point { center } => Geometry::Point(xy(center)),
        ElementShape::Polyline { points, closed } => {
            let positions: Vec<Position> = points.iter().map(xy).collect();
            if *closed {
                Geometry::Polygon(vec![close_ring(positions)])
            } else {
                Geometry::LineString(positions)
            }
        }
        ElementShape::Rectangle {
            center,
            width,
            height,
            rotation,
        } => Geometry::Polygon(vec![close_ring(
            rectangle_corners(center, *width, *height, *rotation).to_vec(),
        )]),
        ElementShape::Circle { center, radius } => Geometry::Polygon(vec![ellipse_ring(
            center,
            radius * 2.0,
            radius * 2.0,
            0.0,
        )]),
        ElementShape::Ellipse {
            center,
            width,
            height,
            rotation,
        } => Geometry::Polygon(vec![ellipse_ring(center, *width, *height, *rotation)]),
        ElementShape::Arrow { points } => {
            Geometry::LineString(points.iter().map(xy).collect())
        }
    };

    Feature {
        geometry,
        properties: element_properties(element),
    }
}

/// Converts a list of elements into a feature collection, in order.
pub fn feature_collection<'a>(
    elements: impl IntoIterator<Item = &'a AnnotationElement>,
) -> FeatureCollection {
    FeatureCollection {
        features: elements.into_iter().map(element_feature).collect(),
    }
}

/// Corners of a rectangle in drawing order, starting at the (unrotated)
/// upper-left corner.
pub fn rectangle_corners(center: &Coordinate, width: f64, height: f64, rotation: f64) -> [Position; 4] {
    let (hw, hh) = (width / 2.0, height / 2.0);
    [(-hw, -hh), (hw, -hh), (hw, hh), (-hw, hh)].map(|(dx, dy)| rotate(center, dx, dy, rotation))
}

fn ellipse_ring(center: &Coordinate, width: f64, height: f64, rotation: f64) -> Vec<Position> {
    let (rx, ry) = (width / 2.0, height / 2.0);
    let ring: Vec<Position> = (0..CURVE_SEGMENTS)
        .map(|i| {
            let theta = TAU * i as f64 / CURVE_SEGMENTS as f64;
            rotate(center, rx * theta.cos(), ry * theta.sin(), rotation)
        })
        .collect();
    close_ring(ring)
}

fn rotate(center: &Coordinate, dx: f64, dy: f64, rotation: f64) -> Position {
    let (sin, cos) = rotation.sin_cos();
    [
        center[0] + dx * cos - dy * sin,
        center[1] + dx * sin + dy * cos,
    ]
}

fn close_ring(mut ring: Vec<Position>) -> Vec<Position> {
    if let (Some(first), Some(last)) = (ring.first().copied(), ring.last().copied()) {
        if first != last {
            ring.push(first);
        }
    }
    ring
}

fn xy(coordinate: &Coordinate) -> Position {
    [coordinate[0], coordinate[1]]
}

fn element_properties(element: &AnnotationElement) -> Map<String, Value> {
    let mut properties = Map::new();
    properties.insert(
        "element".into(),
        Value::String(element.shape.type_name().to_string()),
    );
    if let Some(id) = &element.id {
        properties.insert("id".into(), Value::String(id.clone()));
    }
    let style = &element.style;
    if let Some(color) = &style.line_color {
        properties.insert("lineColor".into(), Value::String(color.as_str().to_string()));
    }
    if let Some(width) = style.line_width {
        properties.insert("lineWidth".into(), Value::from(width));
    }
    if let Some(color) = &style.fill_color {
        properties.insert("fillColor".into(), Value::String(color.as_str().to_string()));
    }
    if let Some(label) = &style.label {
        properties.insert("label".into(), Value::String(label.value.clone()));
    }
    properties
}
