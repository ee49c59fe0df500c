//! Conversion of interactive drawing results into annotation elements.
//!
//! [`convert`] is a pure function: it never touches the viewport and never
//! returns a partially valid element. Degenerate input (too few distinct
//! vertices, zero extent, non-finite coordinates) is reported as a
//! [`ConvertError`] instead.

mod region;

pub use region::Region;

use crate::annotation::{AnnotationElement, ColorValue, Coordinate, ElementShape, Label};
use crate::viewport::{RawAnnotation, ShapeKind};
use log::debug;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ConvertError {
    #[error("{kind} has non-finite coordinates")]
    NonFinite { kind: ShapeKind },

    #[error("{kind} needs {expected} vertices, got {found}")]
    VertexCount {
        kind: ShapeKind,
        expected: &'static str,
        found: usize,
    },

    #[error("{kind} has zero extent")]
    ZeroExtent { kind: ShapeKind },

    #[error("cannot derive a region from a {0} element")]
    NotARectangle(&'static str),
}

/// Converts a completed interactive annotation into a normalized element.
///
/// The element keeps the identity supplied by the drawing layer, if any.
/// Styling hints are copied over when they parse as colors; invalid ones are
/// dropped rather than failing the conversion.
pub fn convert(raw: &RawAnnotation) -> Result<AnnotationElement, ConvertError> {
    let kind = raw.kind;
    if raw
        .coordinates
        .iter()
        .any(|[x, y]| !x.is_finite() || !y.is_finite())
    {
        return Err(ConvertError::NonFinite { kind });
    }

    let shape = match kind {
        ShapeKind::Point => point(&raw.coordinates)?,
        ShapeKind::Line => line(&raw.coordinates)?,
        ShapeKind::Polygon => polygon(&raw.coordinates)?,
        ShapeKind::Rectangle => rectangle(&raw.coordinates)?,
    };

    let mut element = AnnotationElement::new(shape);
    element.id = raw.id.clone();
    element.style.label = raw.label.as_ref().map(Label::new);
    element.style.line_color = parse_color(raw.stroke_color.as_deref());
    element.style.line_width = raw.stroke_width.filter(|w| w.is_finite() && *w >= 0.0);
    element.style.fill_color = parse_color(raw.fill_color.as_deref());
    Ok(element)
}

fn parse_color(text: Option<&str>) -> Option<ColorValue> {
    let text = text?;
    match ColorValue::parse(text) {
        Ok(color) => Some(color),
        Err(err) => {
            debug!("Dropping style color: {}", err);
            None
        }
    }
}

fn point(coordinates: &[[f64; 2]]) -> Result<ElementShape, ConvertError> {
    match coordinates {
        [only] => Ok(ElementShape::Point { center: xyz(*only) }),
        _ => Err(ConvertError::VertexCount {
            kind: ShapeKind::Point,
            expected: "exactly 1",
            found: coordinates.len(),
        }),
    }
}

fn line(coordinates: &[[f64; 2]]) -> Result<ElementShape, ConvertError> {
    let points = dedup_consecutive(coordinates);
    if points.len() < 2 {
        return Err(ConvertError::VertexCount {
            kind: ShapeKind::Line,
            expected: "at least 2 distinct",
            found: points.len(),
        });
    }
    Ok(ElementShape::Polyline {
        points: points.into_iter().map(xyz).collect(),
        closed: false,
    })
}

fn polygon(coordinates: &[[f64; 2]]) -> Result<ElementShape, ConvertError> {
    let mut points = dedup_consecutive(coordinates);
    if points.len() > 1 && points.first() == points.last() {
        points.pop();
    }
    if points.len() < 3 {
        return Err(ConvertError::VertexCount {
            kind: ShapeKind::Polygon,
            expected: "at least 3 distinct",
            found: points.len(),
        });
    }
    if shoelace_area(&points) == 0.0 {
        return Err(ConvertError::ZeroExtent {
            kind: ShapeKind::Polygon,
        });
    }
    Ok(ElementShape::Polyline {
        points: points.into_iter().map(xyz).collect(),
        closed: true,
    })
}

/// Rectangle from its four corners in drawing order.
///
/// Width is the first edge, height the second; rotation is the angle of the
/// first edge.
fn rectangle(coordinates: &[[f64; 2]]) -> Result<ElementShape, ConvertError> {
    let corners: [[f64; 2]; 4] = match coordinates {
        [a, b, c, d] => [*a, *b, *c, *d],
        [a, b, c, d, e] if a == e => [*a, *b, *c, *d],
        _ => {
            return Err(ConvertError::VertexCount {
                kind: ShapeKind::Rectangle,
                expected: "exactly 4",
                found: coordinates.len(),
            });
        }
    };

    let width = distance(corners[0], corners[1]);
    let height = distance(corners[1], corners[2]);
    if width == 0.0 || height == 0.0 {
        return Err(ConvertError::ZeroExtent {
            kind: ShapeKind::Rectangle,
        });
    }

    let cx = corners.iter().map(|c| c[0]).sum::<f64>() / 4.0;
    let cy = corners.iter().map(|c| c[1]).sum::<f64>() / 4.0;
    let rotation = (corners[1][1] - corners[0][1]).atan2(corners[1][0] - corners[0][0]);

    Ok(ElementShape::Rectangle {
        center: [cx, cy, 0.0],
        width,
        height,
        rotation,
    })
}

fn dedup_consecutive(coordinates: &[[f64; 2]]) -> Vec<[f64; 2]> {
    let mut points = coordinates.to_vec();
    points.dedup();
    points
}

fn shoelace_area(points: &[[f64; 2]]) -> f64 {
    let twice: f64 = points
        .iter()
        .zip(points.iter().cycle().skip(1))
        .map(|(a, b)| a[0] * b[1] - b[0] * a[1])
        .sum();
    (twice / 2.0).abs()
}

fn distance(a: [f64; 2], b: [f64; 2]) -> f64 {
    (b[0] - a[0]).hypot(b[1] - a[1])
}

fn xyz([x, y]: [f64; 2]) -> Coordinate {
    [x, y, 0.0]
}
