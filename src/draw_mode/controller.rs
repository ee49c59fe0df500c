//! Single-slot draw-mode state machine.

use super::types::{DrawError, DrawOptions, DrawOutcome, DrawRequest, DrawResult, DrawState};
use crate::bus::{BusEvent, EventSink};
use crate::convert;
use crate::viewport::{
    AnnotationState, LayerHandle, LayerKind, RawAnnotation, ShapeKind, SubscriptionId, Viewport,
};
use futures::channel::oneshot;
use log::{debug, info, warn};

/// The pending session: a transient draw layer waiting for one shape.
#[derive(Debug)]
struct DrawSession {
    serial: u64,
    mode: ShapeKind,
    layer: LayerHandle,
    subscription: SubscriptionId,
    options: DrawOptions,
    responder: oneshot::Sender<DrawResult>,
}

/// A finished session whose layer waits for deletion.
#[derive(Debug, Clone, Copy)]
struct RetiringLayer {
    serial: u64,
    layer: LayerHandle,
    subscription: SubscriptionId,
}

/// Arbitrates interactive drawing sessions.
///
/// ```text
/// Idle --start--> AwaitingShape --shape done--> Resolved --retire--> Idle
///                      |
///                      +--cancel--> Idle
/// ```
///
/// Only one session may await a shape at a time; a second `start` is
/// rejected with [`DrawError::SessionBusy`]. A resolved session's layer is
/// not deleted while its shape event is being handled, because the viewport
/// still runs a draw pass against it; the owner calls [`retire`] on a later
/// turn. A new session may start before the previous one is retired.
///
/// [`retire`]: DrawModeController::retire
#[derive(Debug, Default)]
pub struct DrawModeController {
    active: Option<DrawSession>,
    retiring: Vec<RetiringLayer>,
    next_serial: u64,
}

impl DrawModeController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> DrawState {
        match &self.active {
            Some(session) => DrawState::AwaitingShape(session.mode),
            None if !self.retiring.is_empty() => DrawState::Resolved,
            None => DrawState::Idle,
        }
    }

    /// Transient layer of the awaiting session.
    pub fn active_layer(&self) -> Option<LayerHandle> {
        self.active.as_ref().map(|session| session.layer)
    }

    pub fn has_retiring(&self) -> bool {
        !self.retiring.is_empty()
    }

    /// Opens a session drawing `mode` shapes.
    ///
    /// On success the viewport holds a new annotation-draw layer in `mode`,
    /// subscribed for shape events. If the viewport fails midway, whatever
    /// was created is deleted again and the error is returned.
    pub fn start<V>(
        &mut self,
        viewport: &mut V,
        mode: ShapeKind,
        options: DrawOptions,
    ) -> Result<DrawRequest, DrawError>
    where
        V: Viewport + ?Sized,
    {
        if let Some(session) = self.active.take() {
            if session.responder.is_canceled() {
                info!(
                    "Draw session {} was abandoned by its caller, discarding",
                    session.serial
                );
                Self::discard(viewport, session.layer, session.subscription);
            } else {
                warn!(
                    "Rejecting {} draw request: session {} still awaiting a {}",
                    mode, session.serial, session.mode
                );
                self.active = Some(session);
                return Err(DrawError::SessionBusy);
            }
        }

        let layer = viewport.create_layer(LayerKind::AnnotationDraw)?;
        if let Err(err) = viewport.set_interaction_mode(layer, Some(mode)) {
            viewport.delete_layer(layer);
            return Err(err.into());
        }
        let subscription = match viewport.subscribe_shape_events(layer) {
            Ok(subscription) => subscription,
            Err(err) => {
                viewport.delete_layer(layer);
                return Err(err.into());
            }
        };

        let (responder, receiver) = oneshot::channel();
        let serial = self.next_serial;
        self.next_serial += 1;
        self.active = Some(DrawSession {
            serial,
            mode,
            layer,
            subscription,
            options,
            responder,
        });
        debug!(
            "Draw session {} awaiting {} on layer {:?} (trigger: {})",
            serial, mode, layer, options.trigger
        );
        Ok(DrawRequest::new(receiver))
    }

    /// Handles a shape-state event from the viewport.
    ///
    /// Events for other layers, or for shapes that are not done yet, are
    /// ignored and `false` is returned. A completed shape is converted,
    /// published through `sink` when the session's `trigger` option is set,
    /// and then delivered to the session's future, in that order. The
    /// session's layer is queued for [`retire`](Self::retire).
    pub fn on_annotation_state(
        &mut self,
        layer: LayerHandle,
        raw: &RawAnnotation,
        sink: &mut dyn EventSink,
    ) -> bool {
        let session = match self.active.take() {
            Some(session) if session.layer == layer && raw.state == AnnotationState::Done => {
                session
            }
            other => {
                self.active = other;
                return false;
            }
        };

        let result = convert::convert(raw).map(|mut element| {
            element.ensure_id();
            element
        });

        let delivered = match result {
            Ok(element) => {
                debug!(
                    "Draw session {} produced {} element {}",
                    session.serial,
                    element.shape.type_name(),
                    element.id.as_deref().unwrap_or_default()
                );
                if session.options.trigger {
                    sink.publish(BusEvent::AnnotationCreated {
                        element: element.clone(),
                        raw: raw.clone(),
                    });
                }
                session.responder.send(Ok(DrawOutcome {
                    element,
                    raw: raw.clone(),
                }))
            }
            Err(err) => {
                warn!(
                    "Draw session {} produced an unusable {}: {}",
                    session.serial, raw.kind, err
                );
                session.responder.send(Err(DrawError::Conversion(err)))
            }
        };
        if delivered.is_err() {
            debug!(
                "Draw session {} resolved after its request was dropped",
                session.serial
            );
        }

        self.retiring.push(RetiringLayer {
            serial: session.serial,
            layer: session.layer,
            subscription: session.subscription,
        });
        true
    }

    /// Deletes the layers of resolved sessions. Returns how many were deleted.
    pub fn retire<V>(&mut self, viewport: &mut V) -> usize
    where
        V: Viewport + ?Sized,
    {
        let count = self.retiring.len();
        for retiring in self.retiring.drain(..) {
            debug!(
                "Retiring layer {:?} of draw session {}",
                retiring.layer, retiring.serial
            );
            Self::discard(viewport, retiring.layer, retiring.subscription);
        }
        count
    }

    /// Aborts the awaiting session.
    ///
    /// Its future fails with [`DrawError::Cancelled`] and its layer is
    /// deleted immediately. Returns `false` if nothing was awaiting.
    pub fn cancel<V>(&mut self, viewport: &mut V) -> bool
    where
        V: Viewport + ?Sized,
    {
        let Some(session) = self.active.take() else {
            return false;
        };
        info!("Cancelling draw session {}", session.serial);
        let _ = session.responder.send(Err(DrawError::Cancelled));
        if let Err(err) = viewport.set_interaction_mode(session.layer, None) {
            debug!("Could not leave interaction mode: {}", err);
        }
        Self::discard(viewport, session.layer, session.subscription);
        true
    }

    fn discard<V>(viewport: &mut V, layer: LayerHandle, subscription: SubscriptionId)
    where
        V: Viewport + ?Sized,
    {
        viewport.unsubscribe(subscription);
        viewport.delete_layer(layer);
    }
}
