//! Identity → layer bookkeeping.

use crate::viewport::{LayerHandle, Viewport};
use log::debug;
use std::collections::HashMap;

/// Maps annotation identities to the overlay layer rendering them.
///
/// At most one live layer exists per identity: installing a new layer for an
/// identity deletes the previous one through the viewport first.
#[derive(Debug, Default)]
pub struct LayerRegistry {
    layers: HashMap<String, LayerHandle>,
}

impl LayerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs `layer` for `id`, deleting any layer it replaces.
    pub fn set<V>(&mut self, viewport: &mut V, id: &str, layer: LayerHandle)
    where
        V: Viewport + ?Sized,
    {
        if let Some(previous) = self.layers.remove(id) {
            if previous != layer {
                debug!("Replacing layer {:?} for annotation {}", previous, id);
                viewport.delete_layer(previous);
            }
        }
        self.layers.insert(id.to_string(), layer);
    }

    pub fn get(&self, id: &str) -> Option<LayerHandle> {
        self.layers.get(id).copied()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.layers.contains_key(id)
    }

    /// Deletes and forgets the layer for `id`.
    ///
    /// Returns `false` (and touches nothing) if `id` has no layer.
    pub fn remove<V>(&mut self, viewport: &mut V, id: &str) -> bool
    where
        V: Viewport + ?Sized,
    {
        match self.layers.remove(id) {
            Some(layer) => {
                viewport.delete_layer(layer);
                true
            }
            None => false,
        }
    }

    /// Deletes every registered layer.
    pub fn clear<V>(&mut self, viewport: &mut V) -> usize
    where
        V: Viewport + ?Sized,
    {
        let count = self.layers.len();
        for (_, layer) in self.layers.drain() {
            viewport.delete_layer(layer);
        }
        count
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.layers.keys().map(String::as_str)
    }
}
