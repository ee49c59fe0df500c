//! Event-bus boundary.
//!
//! The host application talks to the viewer over a publish/subscribe channel.
//! Everything crossing that boundary is typed here:
//! - [`BusCommand`]: requests consumed by the viewer (`startDrawMode`, `drawRegion`, ...)
//! - [`BusEvent`]: notifications published by the viewer (`annotationCreated`, `imageRendered`)
//! - [`EventSink`]: the only publishing interface internal components see
//!
//! [`BusAdapter`] is the production sink, forwarding events onto an unbounded
//! `futures` channel read by the host.

use crate::annotation::AnnotationElement;
use crate::convert::Region;
use crate::draw_mode::DrawOptions;
use crate::viewport::{RawAnnotation, ShapeKind};
use futures::channel::mpsc;
use log::debug;
use serde::Serialize;
use std::sync::{Arc, Mutex};

/// Notifications published to the host.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum BusEvent {
    /// A draw-mode session produced an element
    #[serde(rename_all = "camelCase")]
    AnnotationCreated {
        element: AnnotationElement,
        raw: RawAnnotation,
    },
    /// The map and its tile layer are up
    #[serde(rename_all = "camelCase")]
    ImageRendered { item: String, width: u32, height: u32 },
}

/// Requests the host sends to the viewer.
#[derive(Debug, Clone)]
pub enum BusCommand {
    /// Build the map if the backend and image metadata are available
    Render,
    /// Start a draw-mode session; `None` uses the configured default options
    StartDrawMode {
        shape: ShapeKind,
        options: Option<DrawOptions>,
    },
    /// Draw a rectangle and store its pixel region in `model`
    DrawRegion { model: Option<RegionModel> },
    /// Abort the pending draw-mode session, if any
    CancelDraw,
    /// Tear the viewer down and stop the loop
    Shutdown,
}

/// Destination of published events.
pub trait EventSink {
    fn publish(&mut self, event: BusEvent);
}

impl EventSink for Vec<BusEvent> {
    fn publish(&mut self, event: BusEvent) {
        self.push(event);
    }
}

/// Forwards published events to the host over an unbounded channel.
#[derive(Debug, Clone)]
pub struct BusAdapter {
    outgoing: mpsc::UnboundedSender<BusEvent>,
}

impl BusAdapter {
    /// Creates the adapter and the receiving end handed to the host.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<BusEvent>) {
        let (outgoing, incoming) = mpsc::unbounded();
        (Self { outgoing }, incoming)
    }
}

impl EventSink for BusAdapter {
    fn publish(&mut self, event: BusEvent) {
        if let Err(err) = self.outgoing.unbounded_send(event) {
            debug!(
                "Bus receiver closed, dropping {:?}",
                err.into_inner()
            );
        }
    }
}

/// Shared slot a `drawRegion` request writes its result into.
///
/// Clones share the same slot, so the host keeps one clone and passes the
/// other along with the command.
#[derive(Debug, Clone, Default)]
pub struct RegionModel(Arc<Mutex<Option<Region>>>);

impl RegionModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn region(&self) -> Option<Region> {
        match self.0.lock() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }

    pub(crate) fn set_region(&self, region: Region) {
        match self.0.lock() {
            Ok(mut guard) => *guard = Some(region),
            Err(poisoned) => *poisoned.into_inner() = Some(region),
        }
    }
}
