//! The image viewer: one map, its annotation overlays and draw mode.
//!
//! [`Viewer`] owns the viewport created by the backend and is the only place
//! that hands it to the [`AnnotationRenderer`] and the [`DrawModeController`].
//! Components never reach the viewport on their own; every operation that
//! needs one checks that the map has been rendered first.

use crate::annotation::Annotation;
use crate::bus::{BusEvent, EventSink, RegionModel};
use crate::config::{Config, RetireOn};
use crate::draw_mode::{
    DrawError, DrawModeController, DrawOptions, DrawRequest, DrawState, RegionRequest,
};
use crate::overlay::{AnnotationRenderer, FeatureStyle};
use crate::viewport::{
    LayerHandle, LayerKind, MapParams, ShapeKind, TileInfo, TileUrlTemplate, Viewport,
    ViewportBackend, ViewportError, ViewportEvent,
};
use log::{debug, error, info};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ViewerError {
    #[error(transparent)]
    Viewport(#[from] ViewportError),

    #[error(transparent)]
    Draw(#[from] DrawError),

    #[error("event loop error: {0}")]
    EventLoop(String),

    #[error("failed to spawn task: {0}")]
    Spawn(String),
}

/// Settings a viewer is created with, usually taken from [`Config`].
#[derive(Debug, Clone, PartialEq)]
pub struct ViewerSettings {
    pub api_root: String,
    pub tile_path: String,
    pub node_width: u32,
    pub node_height: u32,
    pub retire_on: RetireOn,
    /// Options used by `start_draw_mode` calls that pass none
    pub draw_options: DrawOptions,
    pub style: FeatureStyle,
}

impl From<&Config> for ViewerSettings {
    fn from(config: &Config) -> Self {
        Self {
            api_root: config.viewer.api_root.clone(),
            tile_path: config.viewer.tile_path.clone(),
            node_width: config.viewer.node_width,
            node_height: config.viewer.node_height,
            retire_on: config.draw.retire_on,
            draw_options: DrawOptions {
                trigger: config.draw.trigger_by_default,
            },
            style: FeatureStyle {
                line_color: config.style.line_color.clone(),
                line_width: config.style.line_width,
                fill_color: config.style.fill_color.clone(),
            },
        }
    }
}

impl Default for ViewerSettings {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

/// The image currently shown.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageSource {
    pub item: String,
    pub info: TileInfo,
}

pub struct Viewer<B: ViewportBackend, S: EventSink> {
    settings: ViewerSettings,
    backend: Option<B>,
    image: Option<ImageSource>,
    viewport: Option<B::Viewport>,
    renderer: AnnotationRenderer,
    draw: DrawModeController,
    sink: S,
}

impl<B: ViewportBackend, S: EventSink> Viewer<B, S> {
    pub fn new(settings: ViewerSettings, sink: S) -> Self {
        let renderer = AnnotationRenderer::new(settings.style.clone());
        Self {
            settings,
            backend: None,
            image: None,
            viewport: None,
            renderer,
            draw: DrawModeController::new(),
            sink,
        }
    }

    /// Provides the loaded viewport library. Rendering waits for it.
    pub fn attach_backend(&mut self, backend: B) {
        self.backend = Some(backend);
    }

    /// Sets the image to display. Takes effect on the next render of a
    /// viewer that has not built its map yet.
    pub fn set_image(&mut self, item: impl Into<String>, info: TileInfo) {
        self.image = Some(ImageSource {
            item: item.into(),
            info,
        });
    }

    pub fn image(&self) -> Option<&ImageSource> {
        self.image.as_ref()
    }

    pub fn is_rendered(&self) -> bool {
        self.viewport.is_some()
    }

    /// Map parameters for the current image, if any.
    pub fn map_params(&self) -> Option<MapParams> {
        let image = self.image.as_ref()?;
        let url = TileUrlTemplate::new(&self.settings.api_root, &self.settings.tile_path, &image.item);
        Some(MapParams::pixel_coordinates(
            self.settings.node_width,
            self.settings.node_height,
            &image.info,
            url,
        ))
    }

    /// Builds the map and its tile layer.
    ///
    /// Returns `Ok(false)` while the backend or usable image metadata is
    /// still missing. Once rendered, further calls return `Ok(true)` without
    /// touching the viewport.
    pub fn render(&mut self) -> Result<bool, ViewerError> {
        if self.viewport.is_some() {
            return Ok(true);
        }
        let Some(image) = self.image.clone().filter(|image| image.info.is_usable()) else {
            debug!("Render deferred: no usable image metadata");
            return Ok(false);
        };
        let Some(params) = self.map_params() else {
            return Ok(false);
        };
        let Some(backend) = self.backend.as_mut() else {
            debug!("Render deferred: viewport library not loaded");
            return Ok(false);
        };

        let mut viewport = backend.create_map(&params)?;
        if let Err(err) = viewport.create_layer(LayerKind::Tile(params.layer.clone())) {
            viewport.teardown();
            return Err(err.into());
        }
        viewport.draw();
        self.viewport = Some(viewport);

        info!(
            "Rendered image {} ({}x{}, {} levels)",
            image.item, image.info.size_x, image.info.size_y, params.max_level
        );
        self.sink.publish(BusEvent::ImageRendered {
            item: image.item,
            width: image.info.size_x,
            height: image.info.size_y,
        });
        Ok(true)
    }

    /// Draws `annotation` on its own overlay layer, replacing any earlier
    /// rendering of the same annotation. Returns `Ok(None)` before the map
    /// is rendered.
    pub fn render_annotation<A>(&mut self, annotation: &A) -> Result<Option<LayerHandle>, ViewerError>
    where
        A: Annotation + ?Sized,
    {
        let Some(viewport) = self.viewport.as_mut() else {
            debug!("Skipping annotation {}: map not rendered", annotation.id());
            return Ok(None);
        };
        let layer = self.renderer.render(viewport, annotation)?;
        Ok(Some(layer))
    }

    pub fn unrender_annotation<A>(&mut self, annotation: &A) -> bool
    where
        A: Annotation + ?Sized,
    {
        match self.viewport.as_mut() {
            Some(viewport) => self.renderer.unrender(viewport, annotation),
            None => false,
        }
    }

    /// Removes every rendered annotation layer.
    pub fn clear_annotations(&mut self) -> usize {
        match self.viewport.as_mut() {
            Some(viewport) => self.renderer.registry_mut().clear(viewport),
            None => 0,
        }
    }

    pub fn annotation_layer(&self, id: &str) -> Option<LayerHandle> {
        self.renderer.registry().get(id)
    }

    pub fn annotation_count(&self) -> usize {
        self.renderer.registry().len()
    }

    /// Starts an interactive draw session for `shape`.
    ///
    /// `None` options fall back to the configured defaults.
    pub fn start_draw_mode(
        &mut self,
        shape: ShapeKind,
        options: Option<DrawOptions>,
    ) -> Result<DrawRequest, DrawError> {
        let Some(viewport) = self.viewport.as_mut() else {
            error!("Cannot start {} draw mode: map not rendered", shape);
            return Err(DrawError::MissingViewport);
        };
        let options = options.unwrap_or(self.settings.draw_options);
        self.draw.start(viewport, shape, options)
    }

    /// Asks the user for a rectangle and stores its rounded pixel region
    /// in `model` (a fresh one if `None`). Does not publish.
    pub fn draw_region(&mut self, model: Option<RegionModel>) -> Result<RegionRequest, DrawError> {
        let request = self.start_draw_mode(ShapeKind::Rectangle, Some(DrawOptions::silent()))?;
        Ok(RegionRequest::new(request, model.unwrap_or_default()))
    }

    pub fn cancel_draw(&mut self) -> bool {
        match self.viewport.as_mut() {
            Some(viewport) => self.draw.cancel(viewport),
            None => false,
        }
    }

    /// Transient layer of the session awaiting a shape.
    pub fn active_draw_layer(&self) -> Option<LayerHandle> {
        self.draw.active_layer()
    }

    pub fn draw_state(&self) -> DrawState {
        self.draw.state()
    }

    /// Feeds one viewport event through the viewer.
    ///
    /// Returns `true` when a draw session resolved and its layer should be
    /// retired on the next loop turn.
    pub fn handle_viewport_event(&mut self, event: ViewportEvent) -> bool {
        match event {
            ViewportEvent::AnnotationState { layer, annotation } => {
                let resolved = self
                    .draw
                    .on_annotation_state(layer, &annotation, &mut self.sink);
                resolved && self.settings.retire_on == RetireOn::NextTurn
            }
            ViewportEvent::DrawPassComplete => {
                if self.settings.retire_on == RetireOn::DrawPass {
                    self.retire_draw_sessions();
                }
                false
            }
        }
    }

    /// Deletes the layers of resolved draw sessions.
    pub fn retire_draw_sessions(&mut self) -> usize {
        match self.viewport.as_mut() {
            Some(viewport) => self.draw.retire(viewport),
            None => 0,
        }
    }

    /// Cancels drawing, removes every layer and tears the map down.
    ///
    /// The viewer can be rendered again afterwards.
    pub fn destroy(&mut self) {
        let Some(mut viewport) = self.viewport.take() else {
            return;
        };
        self.draw.cancel(&mut viewport);
        self.draw.retire(&mut viewport);
        let removed = self.renderer.registry_mut().clear(&mut viewport);
        if removed > 0 {
            debug!("Removed {} annotation layers", removed);
        }
        viewport.teardown();
        info!("Viewer destroyed");
    }

    pub fn settings(&self) -> &ViewerSettings {
        &self.settings
    }

    pub fn viewport(&self) -> Option<&B::Viewport> {
        self.viewport.as_ref()
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }
}

impl<B: ViewportBackend, S: EventSink> Drop for Viewer<B, S> {
    fn drop(&mut self) {
        if self.viewport.is_some() {
            debug!("Viewer dropped while rendered, destroying");
            self.destroy();
        }
    }
}

#[cfg(test)]
mod tests;
