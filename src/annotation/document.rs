//! Annotation documents: identified collections of elements.

use super::element::AnnotationElement;
use super::geojson::{self, FeatureCollection};
use serde::{Deserialize, Serialize};

/// Read-only view of a persistent annotation.
///
/// Annotations are owned by the host application; overlays only need a
/// stable identity and a geometry export.
pub trait Annotation {
    /// Identity unique within one viewer.
    fn id(&self) -> &str;

    /// Geometry of every element, as point/line/polygon features.
    fn geojson(&self) -> FeatureCollection;
}

/// An annotation document as stored by the annotation service.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementAnnotation {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub elements: Vec<AnnotationElement>,
}

impl ElementAnnotation {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
            elements: Vec::new(),
        }
    }

    pub fn with_elements(mut self, elements: Vec<AnnotationElement>) -> Self {
        self.elements = elements;
        self
    }
}

impl Annotation for ElementAnnotation {
    fn id(&self) -> &str {
        &self.id
    }

    fn geojson(&self) -> FeatureCollection {
        geojson::feature_collection(&self.elements)
    }
}
