//! Rendering persistent annotations onto feature layers.

use super::registry::LayerRegistry;
use crate::annotation::{Annotation, FeatureCollection};
use crate::viewport::{LayerHandle, LayerKind, Primitive, Viewport, ViewportError};
use log::{debug, warn};
use serde_json::Value;

/// Style applied to features that do not carry their own.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureStyle {
    pub line_color: String,
    pub line_width: f64,
    pub fill_color: String,
}

impl Default for FeatureStyle {
    fn default() -> Self {
        Self {
            line_color: "#000000".to_string(),
            line_width: 2.0,
            fill_color: "rgba(0, 0, 0, 0)".to_string(),
        }
    }
}

/// Turns annotations into overlay layers, one layer per annotation.
#[derive(Debug, Default)]
pub struct AnnotationRenderer {
    registry: LayerRegistry,
    style: FeatureStyle,
}

impl AnnotationRenderer {
    pub fn new(style: FeatureStyle) -> Self {
        Self {
            registry: LayerRegistry::new(),
            style,
        }
    }

    /// Renders `annotation` on a fresh feature layer.
    ///
    /// Any layer previously rendered for the same identity is deleted, so
    /// exactly one layer remains registered when this returns, even when the
    /// viewport rejects the geometry. An annotation without elements yields
    /// an empty layer.
    pub fn render<V, A>(
        &mut self,
        viewport: &mut V,
        annotation: &A,
    ) -> Result<LayerHandle, ViewportError>
    where
        V: Viewport + ?Sized,
        A: Annotation + ?Sized,
    {
        let mut geometry = annotation.geojson();
        self.apply_default_style(&mut geometry);

        let layer = viewport.create_layer(LayerKind::Feature {
            primitives: Primitive::ALL.to_vec(),
        })?;
        self.registry.set(viewport, annotation.id(), layer);

        if let Err(err) = viewport.read_geometry(layer, &geometry) {
            warn!(
                "Layer {:?} rejected geometry of annotation {}: {}",
                layer,
                annotation.id(),
                err
            );
            return Err(err);
        }
        debug!(
            "Rendered annotation {} ({} features) on layer {:?}",
            annotation.id(),
            geometry.len(),
            layer
        );
        viewport.draw();
        Ok(layer)
    }

    /// Removes the layer rendered for `annotation`. No-op if it was never
    /// rendered.
    pub fn unrender<V, A>(&mut self, viewport: &mut V, annotation: &A) -> bool
    where
        V: Viewport + ?Sized,
        A: Annotation + ?Sized,
    {
        self.registry.remove(viewport, annotation.id())
    }

    pub fn registry(&self) -> &LayerRegistry {
        &self.registry
    }

    pub(crate) fn registry_mut(&mut self) -> &mut LayerRegistry {
        &mut self.registry
    }

    pub(super) fn apply_default_style(&self, geometry: &mut FeatureCollection) {
        for feature in &mut geometry.features {
            let properties = &mut feature.properties;
            properties
                .entry("lineColor")
                .or_insert_with(|| Value::String(self.style.line_color.clone()));
            properties
                .entry("lineWidth")
                .or_insert_with(|| Value::from(self.style.line_width));
            properties
                .entry("fillColor")
                .or_insert_with(|| Value::String(self.style.fill_color.clone()));
        }
    }
}
