//! Draw-mode request, outcome and error types.

use crate::annotation::AnnotationElement;
use crate::bus::RegionModel;
use crate::convert::{ConvertError, Region};
use crate::viewport::{RawAnnotation, ShapeKind, ViewportError};
use futures::channel::oneshot;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use thiserror::Error;

/// Options of a draw-mode session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrawOptions {
    /// Publish `annotationCreated` when the shape completes
    #[serde(default = "default_trigger")]
    pub trigger: bool,
}

fn default_trigger() -> bool {
    true
}

impl Default for DrawOptions {
    fn default() -> Self {
        Self {
            trigger: default_trigger(),
        }
    }
}

impl DrawOptions {
    pub fn silent() -> Self {
        Self { trigger: false }
    }
}

/// Observable state of the draw controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawState {
    /// No session and nothing left to clean up
    Idle,
    /// A session is waiting for the user to finish a shape
    AwaitingShape(ShapeKind),
    /// The last session resolved; its transient layer is not deleted yet
    Resolved,
}

/// The product of a completed session.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawOutcome {
    /// Normalized element, always carrying an identity
    pub element: AnnotationElement,
    /// The viewport's own record of the shape
    pub raw: RawAnnotation,
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum DrawError {
    #[error("draw mode requires an active viewport")]
    MissingViewport,

    #[error("a draw-mode session is already awaiting a shape")]
    SessionBusy,

    #[error("draw-mode session was cancelled")]
    Cancelled,

    #[error("draw-mode session was dropped before a shape was produced")]
    Abandoned,

    #[error("drawn shape could not be converted: {0}")]
    Conversion(#[from] ConvertError),

    #[error("viewport error: {0}")]
    Viewport(#[from] ViewportError),
}

pub(crate) type DrawResult = Result<DrawOutcome, DrawError>;

/// Future resolving once the session's shape is produced.
///
/// Resolves exactly once. Dropping it abandons the session; the controller
/// cleans the transient layer up on its next start or event.
#[derive(Debug)]
#[must_use = "a draw request does nothing unless awaited"]
pub struct DrawRequest {
    receiver: oneshot::Receiver<DrawResult>,
}

impl DrawRequest {
    pub(crate) fn new(receiver: oneshot::Receiver<DrawResult>) -> Self {
        Self { receiver }
    }
}

impl Future for DrawRequest {
    type Output = DrawResult;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.receiver).poll(cx) {
            Poll::Ready(Ok(result)) => Poll::Ready(result),
            Poll::Ready(Err(oneshot::Canceled)) => Poll::Ready(Err(DrawError::Abandoned)),
            Poll::Pending => Poll::Pending,
        }
    }
}

/// Future of a `drawRegion` request.
///
/// Wraps a rectangle session; on completion the element is rounded to a
/// [`Region`], written into the model and returned.
#[derive(Debug)]
#[must_use = "a region request does nothing unless awaited"]
pub struct RegionRequest {
    request: DrawRequest,
    model: RegionModel,
}

impl RegionRequest {
    pub(crate) fn new(request: DrawRequest, model: RegionModel) -> Self {
        Self { request, model }
    }

    /// The model the region is written into (created if none was given).
    pub fn model(&self) -> &RegionModel {
        &self.model
    }
}

impl Future for RegionRequest {
    type Output = Result<Region, DrawError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let outcome = match Pin::new(&mut self.request).poll(cx) {
            Poll::Ready(result) => result?,
            Poll::Pending => return Poll::Pending,
        };
        let region = Region::from_element(&outcome.element)?;
        self.model.set_region(region);
        Poll::Ready(Ok(region))
    }
}
