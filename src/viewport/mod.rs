//! Viewport contract.
//!
//! The tiled-image engine (tile fetching, projection, pan/zoom) is an external
//! library. The core reaches it only through the [`Viewport`] and
//! [`ViewportBackend`] traits defined here, plus the plain data types they
//! exchange:
//! - [`LayerHandle`] / [`LayerKind`]: layers the core creates and deletes
//! - [`ViewportEvent`]: shape-state and draw-pass notifications
//! - [`MapParams`]: pixel-space map setup derived from [`TileInfo`]

pub mod params;
pub mod types;

pub use params::{Bounds, MapParams, TileInfo, TileLayerParams, TileUrlTemplate};
pub use types::{
    AnnotationState, LayerHandle, LayerKind, Primitive, RawAnnotation, ShapeKind, SubscriptionId,
    Viewport, ViewportBackend, ViewportError, ViewportEvent,
};
