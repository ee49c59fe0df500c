//! In-memory viewport that records every call.
//!
//! [`HeadlessBackend`] stands in for the real map library when no display is
//! available: it keeps track of live layers and subscriptions, validates
//! handles the way the library would, and appends each call to a shared
//! [`CallLog`] so the sequence can be inspected or printed afterwards.

use crate::annotation::FeatureCollection;
use crate::viewport::{
    LayerHandle, LayerKind, MapParams, ShapeKind, SubscriptionId, Viewport, ViewportBackend,
    ViewportError,
};
use log::debug;
use serde::Serialize;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// One recorded viewport call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "call", rename_all = "kebab-case")]
pub enum ViewportCall {
    CreateMap { width: f64, height: f64, max_level: u32 },
    CreateLayer { layer: LayerHandle, kind: &'static str },
    DeleteLayer { layer: LayerHandle },
    SetInteractionMode { layer: LayerHandle, mode: Option<ShapeKind> },
    Subscribe { layer: LayerHandle, subscription: SubscriptionId },
    Unsubscribe { subscription: SubscriptionId },
    ReadGeometry { layer: LayerHandle, features: usize },
    Draw,
    Teardown,
}

/// Shared, append-only record of viewport calls.
#[derive(Debug, Clone, Default)]
pub struct CallLog(Rc<RefCell<Vec<ViewportCall>>>);

impl CallLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, call: ViewportCall) {
        self.0.borrow_mut().push(call);
    }

    pub fn calls(&self) -> Vec<ViewportCall> {
        self.0.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    /// Handles passed to `delete_layer`, in call order.
    pub fn deletions(&self) -> Vec<LayerHandle> {
        self.0
            .borrow()
            .iter()
            .filter_map(|call| match call {
                ViewportCall::DeleteLayer { layer } => Some(*layer),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, predicate: impl Fn(&ViewportCall) -> bool) -> usize {
        self.0.borrow().iter().filter(|call| predicate(call)).count()
    }
}

#[derive(Debug)]
struct LayerEntry {
    kind: &'static str,
    mode: Option<ShapeKind>,
    features: usize,
}

/// A map instance with no display.
#[derive(Debug)]
pub struct HeadlessViewport {
    log: CallLog,
    layers: HashMap<LayerHandle, LayerEntry>,
    subscriptions: HashMap<SubscriptionId, LayerHandle>,
    next_layer: u64,
    next_subscription: u64,
    torn_down: bool,
}

impl HeadlessViewport {
    pub fn new(log: CallLog) -> Self {
        Self {
            log,
            layers: HashMap::new(),
            subscriptions: HashMap::new(),
            next_layer: 1,
            next_subscription: 1,
            torn_down: false,
        }
    }

    pub fn log(&self) -> &CallLog {
        &self.log
    }

    pub fn live_layers(&self) -> usize {
        self.layers.len()
    }

    pub fn has_layer(&self, layer: LayerHandle) -> bool {
        self.layers.contains_key(&layer)
    }

    pub fn layer_kind(&self, layer: LayerHandle) -> Option<&'static str> {
        self.layers.get(&layer).map(|entry| entry.kind)
    }

    pub fn interaction_mode(&self, layer: LayerHandle) -> Option<ShapeKind> {
        self.layers.get(&layer).and_then(|entry| entry.mode)
    }

    pub fn feature_count(&self, layer: LayerHandle) -> Option<usize> {
        self.layers.get(&layer).map(|entry| entry.features)
    }

    pub fn live_subscriptions(&self) -> usize {
        self.subscriptions.len()
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    fn entry_mut(&mut self, layer: LayerHandle) -> Result<&mut LayerEntry, ViewportError> {
        if self.torn_down {
            return Err(ViewportError::TornDown);
        }
        self.layers
            .get_mut(&layer)
            .ok_or(ViewportError::UnknownLayer(layer))
    }
}

impl Viewport for HeadlessViewport {
    fn create_layer(&mut self, kind: LayerKind) -> Result<LayerHandle, ViewportError> {
        if self.torn_down {
            return Err(ViewportError::TornDown);
        }
        let layer = LayerHandle(self.next_layer);
        self.next_layer += 1;
        self.layers.insert(
            layer,
            LayerEntry {
                kind: kind.name(),
                mode: None,
                features: 0,
            },
        );
        self.log.push(ViewportCall::CreateLayer {
            layer,
            kind: kind.name(),
        });
        Ok(layer)
    }

    fn delete_layer(&mut self, layer: LayerHandle) {
        self.log.push(ViewportCall::DeleteLayer { layer });
        if self.layers.remove(&layer).is_none() {
            debug!("Headless viewport: delete of unknown layer {:?}", layer);
        }
        self.subscriptions.retain(|_, owner| *owner != layer);
    }

    fn set_interaction_mode(
        &mut self,
        layer: LayerHandle,
        mode: Option<ShapeKind>,
    ) -> Result<(), ViewportError> {
        let entry = self.entry_mut(layer)?;
        if entry.kind != "annotation-draw" {
            return Err(ViewportError::Unsupported {
                layer,
                kind: entry.kind,
                operation: "interaction modes",
            });
        }
        entry.mode = mode;
        self.log
            .push(ViewportCall::SetInteractionMode { layer, mode });
        Ok(())
    }

    fn subscribe_shape_events(
        &mut self,
        layer: LayerHandle,
    ) -> Result<SubscriptionId, ViewportError> {
        self.entry_mut(layer)?;
        let subscription = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.subscriptions.insert(subscription, layer);
        self.log.push(ViewportCall::Subscribe {
            layer,
            subscription,
        });
        Ok(subscription)
    }

    fn unsubscribe(&mut self, subscription: SubscriptionId) {
        self.subscriptions.remove(&subscription);
        self.log.push(ViewportCall::Unsubscribe { subscription });
    }

    fn read_geometry(
        &mut self,
        layer: LayerHandle,
        geometry: &FeatureCollection,
    ) -> Result<(), ViewportError> {
        let entry = self.entry_mut(layer)?;
        if entry.kind != "feature" {
            return Err(ViewportError::Unsupported {
                layer,
                kind: entry.kind,
                operation: "geometry import",
            });
        }
        entry.features += geometry.len();
        self.log.push(ViewportCall::ReadGeometry {
            layer,
            features: geometry.len(),
        });
        Ok(())
    }

    fn draw(&mut self) {
        self.log.push(ViewportCall::Draw);
    }

    fn teardown(&mut self) {
        self.layers.clear();
        self.subscriptions.clear();
        self.torn_down = true;
        self.log.push(ViewportCall::Teardown);
    }
}

/// Builds [`HeadlessViewport`]s sharing one call log.
#[derive(Debug, Clone, Default)]
pub struct HeadlessBackend {
    log: CallLog,
}

impl HeadlessBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn log(&self) -> &CallLog {
        &self.log
    }
}

impl ViewportBackend for HeadlessBackend {
    type Viewport = HeadlessViewport;

    fn create_map(&mut self, params: &MapParams) -> Result<HeadlessViewport, ViewportError> {
        if params.max_bounds.right <= 0.0 || params.max_bounds.bottom <= 0.0 {
            return Err(ViewportError::MapConstruction(
                "image has no extent".to_string(),
            ));
        }
        self.log.push(ViewportCall::CreateMap {
            width: params.max_bounds.right,
            height: params.max_bounds.bottom,
            max_level: params.max_level,
        });
        Ok(HeadlessViewport::new(self.log.clone()))
    }
}
