//! Annotation data model.
//!
//! This module defines the shapes exchanged with the rest of the system:
//! - [`AnnotationElement`]: one normalized shape (point, polyline, rectangle, ...)
//! - [`Annotation`]: the read-only contract for persistent annotations
//! - [`ElementAnnotation`]: a concrete annotation document
//! - [`geojson`]: export of elements into point/line/polygon features

pub mod color;
pub mod document;
pub mod element;
pub mod geojson;
pub mod identity;

pub use color::{ColorParseError, ColorValue, Rgba};
pub use document::{Annotation, ElementAnnotation};
pub use element::{
    AnnotationElement, Coordinate, ElementShape, ElementStyle, Label, LabelVisibility,
};
pub use geojson::{Feature, FeatureCollection, Geometry};
pub use identity::{generate_id, is_generated_id};
