//! Annotation overlays and interactive draw mode for tiled-image viewports.
//!
//! The crate sits between a host application and an external map library:
//! - [`viewport`]: the contract the map library is reached through
//! - [`overlay`]: one feature layer per rendered annotation
//! - [`draw_mode`]: single-session interactive drawing with future-based results
//! - [`convert`]: normalization of drawn shapes into annotation elements
//! - [`viewer`] and [`runtime`]: the viewer and the event loop driving it
//! - [`bus`]: the typed publish/subscribe boundary to the host
//!
//! [`headless`] provides an in-memory map library used by the CLI and tests.

pub mod annotation;
pub mod bus;
pub mod config;
pub mod convert;
pub mod draw_mode;
pub mod headless;
pub mod overlay;
pub mod runtime;
pub mod viewer;
pub mod viewport;

pub use config::Config;
pub use viewer::{Viewer, ViewerError, ViewerSettings};
