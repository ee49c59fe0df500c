use super::*;
use crate::annotation::{AnnotationElement, ElementAnnotation, ElementShape};
use crate::bus::BusEvent;
use crate::headless::{HeadlessBackend, ViewportCall};
use crate::viewport::RawAnnotation;
use futures::executor::block_on;

type TestViewer = Viewer<HeadlessBackend, Vec<BusEvent>>;

fn info() -> TileInfo {
    TileInfo {
        levels: 5,
        size_x: 4000,
        size_y: 3000,
        tile_width: 256,
        tile_height: 256,
    }
}

fn viewer_with(settings: ViewerSettings) -> (TestViewer, HeadlessBackend) {
    let backend = HeadlessBackend::new();
    let mut viewer = Viewer::new(settings, Vec::new());
    viewer.attach_backend(backend.clone());
    viewer.set_image("item-1", info());
    (viewer, backend)
}

fn rendered() -> (TestViewer, HeadlessBackend) {
    let (mut viewer, backend) = viewer_with(ViewerSettings::default());
    assert!(viewer.render().unwrap());
    (viewer, backend)
}

fn done(layer: LayerHandle, raw: RawAnnotation) -> ViewportEvent {
    ViewportEvent::AnnotationState {
        layer,
        annotation: raw,
    }
}

#[test]
fn render_waits_for_backend_and_image() {
    let mut viewer: TestViewer = Viewer::new(ViewerSettings::default(), Vec::new());
    assert!(!viewer.render().unwrap());

    viewer.set_image("item-1", info());
    assert!(!viewer.render().unwrap());

    viewer.attach_backend(HeadlessBackend::new());
    assert!(viewer.render().unwrap());
    assert!(viewer.is_rendered());
}

#[test]
fn render_rejects_unusable_metadata() {
    let mut viewer: TestViewer = Viewer::new(ViewerSettings::default(), Vec::new());
    viewer.attach_backend(HeadlessBackend::new());
    viewer.set_image(
        "empty",
        TileInfo {
            levels: 0,
            ..info()
        },
    );
    assert!(!viewer.render().unwrap());
}

#[test]
fn render_is_idempotent_and_publishes_once() {
    let (mut viewer, backend) = rendered();
    assert!(viewer.render().unwrap());

    let log = backend.log();
    assert_eq!(
        log.count(|call| matches!(call, ViewportCall::CreateMap { .. })),
        1
    );
    assert_eq!(
        log.count(|call| matches!(call, ViewportCall::CreateLayer { kind: "tile", .. })),
        1
    );
    assert_eq!(
        viewer.sink(),
        &vec![BusEvent::ImageRendered {
            item: "item-1".into(),
            width: 4000,
            height: 3000
        }]
    );
}

#[test]
fn map_params_use_configured_tile_url() {
    let (viewer, _backend) = viewer_with(ViewerSettings::default());
    let params = viewer.map_params().unwrap();
    assert_eq!(
        params.layer.url.as_str(),
        "http://localhost:8080/api/v1/item/item-1/tiles/zxy/{z}/{x}/{y}"
    );
    assert_eq!(params.max_level, 4);
}

#[test]
fn draw_mode_without_viewport_is_an_error() {
    let (mut viewer, backend) = viewer_with(ViewerSettings::default());
    assert_eq!(
        viewer.start_draw_mode(ShapeKind::Point, None).err(),
        Some(DrawError::MissingViewport)
    );
    assert!(viewer.draw_region(None).is_err());
    assert!(backend.log().is_empty());
}

#[test]
fn annotations_are_skipped_before_render() {
    let (mut viewer, _backend) = viewer_with(ViewerSettings::default());
    let doc = ElementAnnotation::new("a1", "first");
    assert_eq!(viewer.render_annotation(&doc).unwrap(), None);
    assert_eq!(viewer.annotation_count(), 0);
}

#[test]
fn rerendering_an_annotation_replaces_its_layer() {
    let (mut viewer, backend) = rendered();
    let doc = ElementAnnotation::new("a1", "first").with_elements(vec![AnnotationElement::new(
        ElementShape::Point {
            center: [1.0, 2.0, 0.0],
        },
    )]);

    let first = viewer.render_annotation(&doc).unwrap().unwrap();
    let second = viewer.render_annotation(&doc).unwrap().unwrap();
    assert_ne!(first, second);
    assert_eq!(viewer.annotation_layer("a1"), Some(second));
    assert_eq!(backend.log().deletions(), vec![first]);

    assert!(viewer.unrender_annotation(&doc));
    assert!(!viewer.unrender_annotation(&doc));
    assert_eq!(viewer.annotation_layer("a1"), None);
}

#[test]
fn resolved_session_asks_for_next_turn_retirement() {
    let (mut viewer, backend) = rendered();
    let request = viewer.start_draw_mode(ShapeKind::Point, None).unwrap();
    let layer = viewer.active_draw_layer().unwrap();

    let retire = viewer.handle_viewport_event(done(
        layer,
        RawAnnotation::new(ShapeKind::Point, vec![[5.0, 5.0]]),
    ));
    assert!(retire);
    assert!(block_on(request).is_ok());
    assert!(backend.log().deletions().is_empty());

    assert_eq!(viewer.retire_draw_sessions(), 1);
    assert_eq!(backend.log().deletions(), vec![layer]);
    assert!(matches!(
        viewer.sink().last(),
        Some(BusEvent::AnnotationCreated { .. })
    ));
}

#[test]
fn draw_pass_mode_retires_on_pass_completion() {
    let settings = ViewerSettings {
        retire_on: RetireOn::DrawPass,
        ..ViewerSettings::default()
    };
    let (mut viewer, backend) = viewer_with(settings);
    viewer.render().unwrap();
    let _request = viewer.start_draw_mode(ShapeKind::Point, None).unwrap();
    let layer = viewer.active_draw_layer().unwrap();

    let retire = viewer.handle_viewport_event(done(
        layer,
        RawAnnotation::new(ShapeKind::Point, vec![[5.0, 5.0]]),
    ));
    assert!(!retire);
    assert_eq!(viewer.draw_state(), DrawState::Resolved);

    viewer.handle_viewport_event(ViewportEvent::DrawPassComplete);
    assert_eq!(backend.log().deletions(), vec![layer]);
    assert_eq!(viewer.draw_state(), DrawState::Idle);
}

#[test]
fn configured_default_options_apply_when_none_given() {
    let settings = ViewerSettings {
        draw_options: DrawOptions::silent(),
        ..ViewerSettings::default()
    };
    let (mut viewer, _backend) = viewer_with(settings);
    viewer.render().unwrap();
    viewer.sink_mut().clear();

    let _request = viewer.start_draw_mode(ShapeKind::Point, None).unwrap();
    let layer = viewer.active_draw_layer().unwrap();
    viewer.handle_viewport_event(done(
        layer,
        RawAnnotation::new(ShapeKind::Point, vec![[5.0, 5.0]]),
    ));
    assert!(viewer.sink().is_empty());
}

#[test]
fn draw_region_fills_model_without_publishing() {
    let (mut viewer, _backend) = rendered();
    viewer.sink_mut().clear();
    let model = RegionModel::new();
    let request = viewer.draw_region(Some(model.clone())).unwrap();
    let layer = viewer.active_draw_layer().unwrap();
    assert_eq!(viewer.draw_state(), DrawState::AwaitingShape(ShapeKind::Rectangle));

    viewer.handle_viewport_event(done(
        layer,
        RawAnnotation::new(
            ShapeKind::Rectangle,
            vec![[10.0, 20.0], [60.0, 20.0], [60.0, 50.0], [10.0, 50.0]],
        ),
    ));

    let region = block_on(request).unwrap();
    assert_eq!(region.to_array(), [10, 20, 50, 30]);
    assert_eq!(model.region(), Some(region));
    assert!(viewer.sink().is_empty());
}

#[test]
fn destroy_cancels_session_and_tears_down() {
    let (mut viewer, backend) = rendered();
    viewer
        .render_annotation(&ElementAnnotation::new("a1", "first"))
        .unwrap();
    let request = viewer.start_draw_mode(ShapeKind::Polygon, None).unwrap();

    viewer.destroy();
    assert_eq!(block_on(request), Err(DrawError::Cancelled));
    assert!(!viewer.is_rendered());
    assert_eq!(viewer.annotation_count(), 0);
    assert_eq!(
        backend
            .log()
            .count(|call| matches!(call, ViewportCall::Teardown)),
        1
    );

    viewer.destroy();
    assert_eq!(
        backend
            .log()
            .count(|call| matches!(call, ViewportCall::Teardown)),
        1
    );
}

#[test]
fn settings_follow_config() {
    let mut config = Config::default();
    config.draw.trigger_by_default = false;
    config.draw.retire_on = RetireOn::DrawPass;
    config.style.line_width = 4.0;

    let settings = ViewerSettings::from(&config);
    assert_eq!(settings.draw_options, DrawOptions::silent());
    assert_eq!(settings.retire_on, RetireOn::DrawPass);
    assert_eq!(settings.style.line_width, 4.0);
}
