//! Interactive draw mode.
//!
//! A session asks the viewport for a transient annotation-draw layer, waits
//! for the user to complete one shape, converts it into an element and
//! resolves the caller's future. See [`DrawModeController`] for the state
//! machine.

mod controller;
mod types;

pub use controller::DrawModeController;
pub use types::{DrawError, DrawOptions, DrawOutcome, DrawRequest, DrawState, RegionRequest};
