//! Frame-loop integration tests: lifecycle, frame driver and scripted engine
//! wired together and ticked by hand on the test thread.

use crossbeam_channel::Receiver;
use nalgebra::{UnitQuaternion, Vector2, Vector3};

use ar_session::config::PipelineConfig;
use ar_session::engine::{
    Capabilities, EngineError, FrameScript, ScriptHandle, ScriptedEngine, TrackingMode,
};
use ar_session::geometry::{Pose, ScreenPoint};
use ar_session::input::{GestureEvent, GestureSender, gesture_channel};
use ar_session::system::{FrameDriver, SessionLifecycle, SessionState, UiEvent, ui_channel};
use ar_session::tracking::trackable::{
    ImageGeometry, ImageTrackingMethod, PlaneGeometry, PlaneType,
};
use ar_session::tracking::{AnchorId, Trackable, TrackableId, TrackableKind, TrackingState};

const WIDTH: u32 = 1080;
const HEIGHT: u32 = 1920;

struct Pipeline {
    lifecycle: SessionLifecycle,
    driver: FrameDriver,
    gestures: GestureSender,
    ui: Receiver<UiEvent>,
    script: ScriptHandle,
}

impl Pipeline {
    fn new(config: PipelineConfig) -> Self {
        let (engine, script) = ScriptedEngine::new();
        let lifecycle = SessionLifecycle::new(Box::new(engine), config.capabilities.clone());
        let (gestures, gesture_rx) = gesture_channel(config.gesture_capacity);
        let (ui_tx, ui) = ui_channel();
        let mut driver = FrameDriver::new(lifecycle.frame_access(), gesture_rx, ui_tx, &config);
        driver.on_surface_created(3);
        driver.on_surface_changed(WIDTH, HEIGHT);
        Self {
            lifecycle,
            driver,
            gestures,
            ui,
            script,
        }
    }

    fn resumed(config: PipelineConfig) -> Self {
        let mut pipeline = Self::new(config);
        pipeline.lifecycle.on_resume().unwrap();
        pipeline
    }

    fn events(&self) -> Vec<UiEvent> {
        self.ui.try_iter().collect()
    }
}

fn center() -> ScreenPoint {
    ScreenPoint::new(WIDTH as f32 / 2.0, HEIGHT as f32 / 2.0)
}

/// Plane two meters ahead of the identity camera, facing it.
fn wall(id: u64, state: TrackingState) -> Trackable {
    Trackable::new(
        TrackableId(id),
        state,
        TrackableKind::Plane(PlaneGeometry {
            center_pose: Pose {
                rotation: UnitQuaternion::from_axis_angle(
                    &Vector3::x_axis(),
                    std::f32::consts::FRAC_PI_2,
                ),
                translation: Vector3::new(0.0, 0.0, -2.0),
            },
            polygon: vec![
                Vector2::new(-1.0, -1.0),
                Vector2::new(1.0, -1.0),
                Vector2::new(1.0, 1.0),
                Vector2::new(-1.0, 1.0),
            ],
            plane_type: PlaneType::Vertical,
        }),
    )
}

fn poster(id: u64, metadata: Option<&str>) -> Trackable {
    Trackable::new(
        TrackableId(id),
        TrackingState::Tracking,
        TrackableKind::Image(ImageGeometry {
            center_pose: Pose::from_translation(0.0, -0.5, -1.0),
            extent_x: 0.4,
            extent_z: 0.3,
            database_index: 0,
            name: "poster".to_string(),
            metadata: metadata.map(str::to_string),
            tracking_method: ImageTrackingMethod::FullTracking,
        }),
    )
}

#[test]
fn test_nothing_drawn_before_resume() {
    let mut pipeline = Pipeline::new(PipelineConfig::default());
    assert!(pipeline.driver.on_draw_frame().is_none());
    assert_eq!(pipeline.script.log().updates, 0);
}

#[test]
fn test_single_tap_places_object_on_plane() {
    let mut pipeline = Pipeline::resumed(PipelineConfig::default());
    pipeline.script.push_frame(FrameScript::new().with_update(wall(1, TrackingState::Tracking)));
    let first = pipeline.driver.on_draw_frame().unwrap();
    assert_eq!(first.tracked, 1);

    assert!(pipeline.gestures.enqueue(GestureEvent::SingleTap(center())));
    let output = pipeline.driver.on_draw_frame().unwrap();

    assert_eq!(pipeline.driver.object_count(), 1);
    assert_eq!(output.objects.len(), 1);
    // Anchored on the wall, two meters ahead.
    assert!((output.objects[0].model[14] + 2.0).abs() < 1e-3);
    assert!(pipeline.events().contains(&UiEvent::ObjectPlaced { count: 1 }));
}

#[test]
fn test_one_gesture_consumed_per_tick() {
    let mut pipeline = Pipeline::resumed(PipelineConfig::default());
    pipeline.script.push_frame(FrameScript::new().with_update(wall(1, TrackingState::Tracking)));
    pipeline.driver.on_draw_frame();

    assert!(pipeline.gestures.enqueue(GestureEvent::SingleTap(center())));
    assert!(pipeline.gestures.enqueue(GestureEvent::SingleTap(center())));
    assert!(!pipeline.gestures.enqueue(GestureEvent::SingleTap(center())));

    pipeline.driver.on_draw_frame();
    assert_eq!(pipeline.driver.object_count(), 1);
    pipeline.driver.on_draw_frame();
    assert_eq!(pipeline.driver.object_count(), 2);
    pipeline.driver.on_draw_frame();
    assert_eq!(pipeline.driver.object_count(), 2);
    assert_eq!(pipeline.gestures.dropped(), 1);
}

#[test]
fn test_pool_evicts_oldest_and_detaches_once() {
    let config = PipelineConfig::default();
    let capacity = config.object_pool_capacity;
    let mut pipeline = Pipeline::resumed(config);
    pipeline.script.push_frame(FrameScript::new().with_update(wall(1, TrackingState::Tracking)));
    pipeline.driver.on_draw_frame();

    for _ in 0..=capacity {
        assert!(pipeline.gestures.enqueue(GestureEvent::SingleTap(center())));
        pipeline.driver.on_draw_frame();
    }

    let log = pipeline.script.log();
    assert_eq!(pipeline.driver.object_count(), capacity);
    assert_eq!(log.anchors_created, capacity + 1);
    assert_eq!(log.detach_count(AnchorId(0)), 1);
    assert_eq!(log.detach_count(AnchorId(1)), 0);
    assert_eq!(pipeline.script.live_anchors(), capacity);
}

#[test]
fn test_stopped_anchor_removes_object() {
    let mut pipeline = Pipeline::resumed(PipelineConfig::default());
    pipeline.script.push_frame(FrameScript::new().with_update(wall(1, TrackingState::Tracking)));
    pipeline.driver.on_draw_frame();
    pipeline.gestures.enqueue(GestureEvent::SingleTap(center()));
    pipeline.driver.on_draw_frame();
    assert_eq!(pipeline.driver.object_count(), 1);

    pipeline
        .script
        .push_frame(FrameScript::new().with_anchor_state(AnchorId(0), TrackingState::Stopped));
    pipeline.driver.on_draw_frame();

    assert_eq!(pipeline.driver.object_count(), 0);
    assert_eq!(pipeline.script.log().detach_count(AnchorId(0)), 1);
}

#[test]
fn test_taps_ignored_while_camera_not_tracking() {
    let mut pipeline = Pipeline::resumed(PipelineConfig::default());
    pipeline.script.push_frame(FrameScript::new().with_update(wall(1, TrackingState::Tracking)));
    pipeline.driver.on_draw_frame();

    pipeline.gestures.enqueue(GestureEvent::SingleTap(center()));
    pipeline
        .script
        .push_frame(FrameScript::new().with_camera(Pose::identity(), TrackingState::Paused));
    pipeline.driver.on_draw_frame();

    assert_eq!(pipeline.driver.object_count(), 0);
    assert_eq!(pipeline.gestures.dropped(), 0);
    // The gesture was consumed, not deferred.
    pipeline.driver.on_draw_frame();
    assert_eq!(pipeline.driver.object_count(), 0);
}

#[test]
fn test_double_tap_selects_and_scroll_rotates() {
    let mut pipeline = Pipeline::resumed(PipelineConfig::default());
    pipeline.script.push_frame(FrameScript::new().with_update(wall(1, TrackingState::Tracking)));
    pipeline.driver.on_draw_frame();
    pipeline.gestures.enqueue(GestureEvent::SingleTap(center()));
    let placed = pipeline.driver.on_draw_frame().unwrap();

    pipeline.gestures.enqueue(GestureEvent::DoubleTap(center()));
    pipeline.driver.on_draw_frame();
    assert_eq!(pipeline.driver.selected_object(), Some(0));
    assert!(pipeline.events().contains(&UiEvent::SelectionChanged(0)));

    pipeline.gestures.enqueue(GestureEvent::Scroll {
        from: center(),
        to: center(),
        dx: 50.0,
        dy: 0.0,
    });
    let rotated = pipeline.driver.on_draw_frame().unwrap();
    assert!(rotated.objects[0].selected);
    assert_ne!(rotated.objects[0].model, placed.objects[0].model);
}

#[test]
fn test_searching_hint_until_surface_found() {
    let mut pipeline = Pipeline::resumed(PipelineConfig::default());
    pipeline.driver.on_draw_frame();
    pipeline.driver.on_draw_frame();
    assert_eq!(pipeline.events(), vec![UiEvent::Searching(TrackingMode::World)]);

    pipeline.script.push_frame(FrameScript::new().with_update(wall(1, TrackingState::Tracking)));
    pipeline.driver.on_draw_frame();
    assert_eq!(pipeline.events(), vec![UiEvent::SearchingDone]);

    pipeline.script.push_frame(FrameScript::new().with_update(wall(1, TrackingState::Stopped)));
    pipeline.driver.on_draw_frame();
    assert_eq!(
        pipeline.events(),
        vec![
            UiEvent::TrackableLost(TrackableId(1)),
            UiEvent::Searching(TrackingMode::World)
        ]
    );
}

#[test]
fn test_frame_fault_skips_tick_without_state_change() {
    let mut pipeline = Pipeline::resumed(PipelineConfig::default());
    pipeline
        .script
        .push_frame(FrameScript::new().with_fault(EngineError::DeadlineExceeded));

    assert!(pipeline.driver.on_draw_frame().is_none());
    assert_eq!(pipeline.driver.faults(), 1);
    assert_eq!(pipeline.lifecycle.state(), SessionState::Resumed);
    assert!(pipeline.driver.on_draw_frame().is_some());
}

#[test]
fn test_zero_width_surface_skips_frames_until_resized() {
    let mut pipeline = Pipeline::resumed(PipelineConfig::default());
    pipeline.driver.on_surface_changed(0, HEIGHT);

    assert!(pipeline.driver.on_draw_frame().is_none());
    assert!(pipeline.driver.on_draw_frame().is_none());
    assert_eq!(pipeline.driver.faults(), 2);
    assert_eq!(pipeline.lifecycle.state(), SessionState::Resumed);

    pipeline.driver.on_surface_changed(WIDTH, HEIGHT);
    assert!(pipeline.driver.on_draw_frame().is_some());
    assert_eq!(pipeline.driver.faults(), 2);
}

#[test]
fn test_collapsed_clip_range_skips_frames() {
    let config = PipelineConfig {
        near_clip: 1.0,
        far_clip: 1.0,
        ..PipelineConfig::default()
    };
    let mut pipeline = Pipeline::resumed(config);

    assert!(pipeline.driver.on_draw_frame().is_none());
    assert_eq!(pipeline.driver.faults(), 1);
    assert_eq!(pipeline.lifecycle.state(), SessionState::Resumed);
}

#[test]
fn test_new_session_forgets_previous_objects() {
    let mut pipeline = Pipeline::resumed(PipelineConfig::default());
    pipeline.script.push_frame(FrameScript::new().with_update(wall(1, TrackingState::Tracking)));
    pipeline.driver.on_draw_frame();
    pipeline.gestures.enqueue(GestureEvent::SingleTap(center()));
    pipeline.driver.on_draw_frame();
    assert_eq!(pipeline.driver.object_count(), 1);

    pipeline.lifecycle.on_pause();
    pipeline.script.fail_next_resume(EngineError::CameraNotAvailable);
    assert!(pipeline.lifecycle.on_resume().is_err());
    pipeline.lifecycle.on_resume().unwrap();

    pipeline.driver.on_draw_frame().unwrap();
    assert_eq!(pipeline.driver.object_count(), 0);
    // The old anchor died with its session and is never detached again.
    assert_eq!(pipeline.script.log().detach_count(AnchorId(0)), 0);
}

#[test]
fn test_image_mode_outlines_and_labels() {
    let config = PipelineConfig {
        capabilities: Capabilities::for_mode(TrackingMode::Cloud),
        ..PipelineConfig::default()
    };
    let mut pipeline = Pipeline::resumed(config);

    pipeline
        .script
        .push_frame(FrameScript::new().with_update(poster(7, Some("cafe-menu"))));
    let output = pipeline.driver.on_draw_frame().unwrap();

    assert_eq!(output.image_outlines.len(), 1);
    assert_eq!(output.image_outlines[0].id, TrackableId(7));
    assert_eq!(output.image_outlines[0].vertices.len(), 16);
    assert_eq!(pipeline.script.log().anchors_created, 1);
    assert!(pipeline.events().contains(&UiEvent::LabelRecognized("cafe-menu".into())));

    // Same label again is not reposted.
    pipeline
        .script
        .push_frame(FrameScript::new().with_update(poster(7, Some("cafe-menu"))));
    pipeline.driver.on_draw_frame();
    assert!(pipeline.events().is_empty());

    // Taps never place objects outside world mode.
    pipeline.gestures.enqueue(GestureEvent::SingleTap(center()));
    pipeline.driver.on_draw_frame();
    assert_eq!(pipeline.driver.object_count(), 0);
}

#[test]
fn test_image_only_sessions_skip_anchors() {
    let mut capabilities = Capabilities::for_mode(TrackingMode::Image);
    capabilities.image_only = true;
    let config = PipelineConfig {
        capabilities,
        ..PipelineConfig::default()
    };
    let mut pipeline = Pipeline::resumed(config);

    pipeline.script.push_frame(FrameScript::new().with_update(poster(2, None)));
    let output = pipeline.driver.on_draw_frame().unwrap();

    assert_eq!(output.tracked, 1);
    assert_eq!(pipeline.script.log().anchors_created, 0);
}
