use super::*;
use crate::bus::{BusEvent, RegionModel};
use crate::config::RetireOn;
use crate::draw_mode::{DrawOptions, DrawState};
use crate::headless::{CallLog, HeadlessBackend, ViewportCall};
use crate::viewer::ViewerSettings;
use crate::viewport::{RawAnnotation, ShapeKind, TileInfo};
use std::cell::RefCell;
use std::rc::Rc;

type TestLoop = ViewerLoop<HeadlessBackend, Vec<BusEvent>>;

fn build(settings: ViewerSettings) -> (TestLoop, CallLog) {
    let backend = HeadlessBackend::new();
    let log = backend.log().clone();
    let mut viewer = Viewer::new(settings, Vec::new());
    viewer.attach_backend(backend);
    viewer.set_image(
        "slide",
        TileInfo {
            levels: 4,
            size_x: 2048,
            size_y: 1024,
            tile_width: 256,
            tile_height: 256,
        },
    );
    (ViewerLoop::new(viewer).unwrap(), log)
}

fn rendered(settings: ViewerSettings) -> (TestLoop, CallLog) {
    let (mut viewer_loop, log) = build(settings);
    viewer_loop.commands().send(BusCommand::Render).unwrap();
    viewer_loop.dispatch(Some(Duration::ZERO)).unwrap();
    assert!(viewer_loop.viewer().is_rendered());
    (viewer_loop, log)
}

fn finish(viewer_loop: &mut TestLoop, raw: RawAnnotation) {
    let layer = viewer_loop.viewer().active_draw_layer().unwrap();
    viewer_loop
        .viewport_events()
        .send(ViewportEvent::AnnotationState {
            layer,
            annotation: raw,
        })
        .unwrap();
    viewer_loop.dispatch(Some(Duration::ZERO)).unwrap();
}

#[test]
fn render_command_builds_map_and_publishes() {
    let (viewer_loop, log) = rendered(ViewerSettings::default());
    assert!(matches!(
        viewer_loop.viewer().sink().as_slice(),
        [BusEvent::ImageRendered { item, .. }] if item == "slide"
    ));
    assert_eq!(
        log.count(|call| matches!(call, ViewportCall::CreateMap { .. })),
        1
    );
}

#[test]
fn resolution_runs_before_layer_is_deleted() {
    let (mut viewer_loop, log) = rendered(ViewerSettings::default());
    let request = viewer_loop
        .viewer_mut()
        .start_draw_mode(ShapeKind::Point, None)
        .unwrap();
    let layer = viewer_loop.viewer().active_draw_layer().unwrap();

    let seen: Rc<RefCell<Option<(usize, usize)>>> = Rc::new(RefCell::new(None));
    let handler_seen = Rc::clone(&seen);
    let handler_log = log.clone();
    viewer_loop
        .spawn_local(async move {
            if request.await.is_ok() {
                let deleted = handler_log.deletions().len();
                let unsubscribed =
                    handler_log.count(|call| matches!(call, ViewportCall::Unsubscribe { .. }));
                *handler_seen.borrow_mut() = Some((deleted, unsubscribed));
            }
        })
        .unwrap();

    finish(
        &mut viewer_loop,
        RawAnnotation::new(ShapeKind::Point, vec![[7.0, 8.0]]),
    );

    assert_eq!(*seen.borrow(), Some((0, 0)));
    assert_eq!(log.deletions(), vec![layer]);
    assert_eq!(viewer_loop.viewer().draw_state(), DrawState::Idle);
    assert!(matches!(
        viewer_loop.viewer().sink().last(),
        Some(BusEvent::AnnotationCreated { .. })
    ));
}

#[test]
fn draw_pass_setting_defers_deletion_to_pass_event() {
    let settings = ViewerSettings {
        retire_on: RetireOn::DrawPass,
        ..ViewerSettings::default()
    };
    let (mut viewer_loop, log) = rendered(settings);
    viewer_loop
        .commands()
        .send(BusCommand::StartDrawMode {
            shape: ShapeKind::Line,
            options: Some(DrawOptions::silent()),
        })
        .unwrap();
    viewer_loop.dispatch(Some(Duration::ZERO)).unwrap();

    finish(
        &mut viewer_loop,
        RawAnnotation::new(ShapeKind::Line, vec![[0.0, 0.0], [10.0, 10.0]]),
    );
    assert!(log.deletions().is_empty());
    assert_eq!(viewer_loop.viewer().draw_state(), DrawState::Resolved);

    viewer_loop
        .viewport_events()
        .send(ViewportEvent::DrawPassComplete)
        .unwrap();
    viewer_loop.dispatch(Some(Duration::ZERO)).unwrap();
    assert_eq!(log.deletions().len(), 1);
    assert_eq!(viewer_loop.viewer().draw_state(), DrawState::Idle);
}

#[test]
fn draw_region_command_fills_the_model() {
    let (mut viewer_loop, _log) = rendered(ViewerSettings::default());
    let model = RegionModel::new();
    viewer_loop
        .commands()
        .send(BusCommand::DrawRegion {
            model: Some(model.clone()),
        })
        .unwrap();
    viewer_loop.dispatch(Some(Duration::ZERO)).unwrap();

    finish(
        &mut viewer_loop,
        RawAnnotation::new(
            ShapeKind::Rectangle,
            vec![[0.0, 0.0], [40.0, 0.0], [40.0, 20.0], [0.0, 20.0]],
        ),
    );
    assert_eq!(model.region().map(|r| r.to_array()), Some([0, 0, 40, 20]));
}

#[test]
fn overlapping_start_commands_keep_first_session() {
    let (mut viewer_loop, log) = rendered(ViewerSettings::default());
    for shape in [ShapeKind::Point, ShapeKind::Polygon] {
        viewer_loop
            .commands()
            .send(BusCommand::StartDrawMode {
                shape,
                options: None,
            })
            .unwrap();
    }
    viewer_loop.dispatch(Some(Duration::ZERO)).unwrap();

    assert_eq!(
        viewer_loop.viewer().draw_state(),
        DrawState::AwaitingShape(ShapeKind::Point)
    );
    assert_eq!(
        log.count(|call| matches!(call, ViewportCall::CreateLayer { kind: "annotation-draw", .. })),
        1
    );
}

#[test]
fn cancel_command_deletes_pending_layer() {
    let (mut viewer_loop, log) = rendered(ViewerSettings::default());
    viewer_loop
        .commands()
        .send(BusCommand::StartDrawMode {
            shape: ShapeKind::Polygon,
            options: None,
        })
        .unwrap();
    viewer_loop.dispatch(Some(Duration::ZERO)).unwrap();
    let layer = viewer_loop.viewer().active_draw_layer().unwrap();

    viewer_loop.commands().send(BusCommand::CancelDraw).unwrap();
    viewer_loop.dispatch(Some(Duration::ZERO)).unwrap();
    assert_eq!(log.deletions(), vec![layer]);
    assert_eq!(viewer_loop.viewer().draw_state(), DrawState::Idle);
}

#[test]
fn shutdown_stops_run_and_tears_down() {
    let (mut viewer_loop, log) = rendered(ViewerSettings::default());
    viewer_loop.commands().send(BusCommand::Shutdown).unwrap();
    viewer_loop.run().unwrap();

    assert!(viewer_loop.host().should_exit());
    assert!(!viewer_loop.viewer().is_rendered());
    assert_eq!(log.count(|call| matches!(call, ViewportCall::Teardown)), 1);
}
