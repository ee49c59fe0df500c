//! Persistent annotation overlays.
//!
//! - [`LayerRegistry`]: one overlay layer per annotation identity
//! - [`AnnotationRenderer`]: exports annotation geometry onto feature layers

mod registry;
mod renderer;

pub use registry::LayerRegistry;
pub use renderer::{AnnotationRenderer, FeatureStyle};
