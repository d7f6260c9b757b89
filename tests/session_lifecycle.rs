//! Lifecycle integration tests through the threaded `ArSystem`.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use ar_session::config::PipelineConfig;
use ar_session::engine::{Availability, EngineError, ScriptHandle, ScriptedEngine};
use ar_session::system::{
    ArSystem, FrameOutput, Renderer, RequiredAction, SessionError, SessionState, Surface,
};

#[derive(Clone, Default)]
struct CountingRenderer {
    frames: Arc<Mutex<usize>>,
}

impl Renderer for CountingRenderer {
    fn on_surface_created(&mut self) -> Surface {
        Surface {
            camera_texture: 9,
            width: 720,
            height: 1280,
        }
    }

    fn draw(&mut self, _output: &FrameOutput) {
        *self.frames.lock() += 1;
    }
}

fn start() -> (ArSystem, ScriptHandle, CountingRenderer) {
    let config = PipelineConfig {
        frame_interval_ms: 1,
        ..PipelineConfig::default()
    };
    let (engine, script) = ScriptedEngine::new();
    let renderer = CountingRenderer::default();
    let system = ArSystem::start(Box::new(engine), config, Box::new(renderer.clone())).unwrap();
    (system, script, renderer)
}

fn wait_for(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(2));
    }
    false
}

#[test]
fn test_pause_before_resume_is_noop() {
    let (mut system, script, _) = start();
    system.on_pause();
    assert_eq!(system.state(), SessionState::Uninitialized);
    assert_eq!(script.log().pauses, 0);
    assert_eq!(script.log().sessions_created, 0);
}

#[test]
fn test_render_thread_draws_only_while_resumed() {
    let (mut system, script, renderer) = start();
    thread::sleep(Duration::from_millis(20));
    assert_eq!(*renderer.frames.lock(), 0);

    system.on_resume().unwrap();
    assert!(wait_for(|| *renderer.frames.lock() > 3));
    assert_eq!(script.log().camera_texture, Some(9));

    system.on_pause();
    let after_pause = script.log().updates;
    thread::sleep(Duration::from_millis(20));
    assert_eq!(script.log().updates, after_pause);
}

#[test]
fn test_double_destroy_stops_once() {
    let (mut system, script, _) = start();
    system.on_resume().unwrap();
    system.on_destroy();
    system.on_destroy();

    assert_eq!(system.state(), SessionState::Stopped);
    assert_eq!(script.log().stops, 1);

    system.shutdown();
    assert_eq!(script.log().stops, 1);
}

#[test]
fn test_destroy_while_rendering_is_safe() {
    let (mut system, script, renderer) = start();
    system.on_resume().unwrap();
    assert!(wait_for(|| *renderer.frames.lock() > 0));

    system.on_destroy();
    let updates = script.log().updates;
    thread::sleep(Duration::from_millis(20));

    // No frame is pulled from a stopped session.
    assert_eq!(script.log().updates, updates);
    assert_eq!(script.log().stops, 1);
}

#[test]
fn test_install_failures_map_to_actions() {
    let cases = [
        (Availability::NotInstalled, SessionError::ServiceNotInstalled, RequiredAction::RedirectToStore),
        (Availability::ApkTooOld, SessionError::ServiceApkTooOld, RequiredAction::UpdateApp),
        (Availability::SdkTooOld, SessionError::ClientSdkTooOld, RequiredAction::UpdateApp),
    ];
    for (availability, expected, action) in cases {
        let (mut system, script, _) = start();
        script.set_availability(availability);

        let err = system.on_resume().unwrap_err();

        assert_eq!(err, expected);
        assert_eq!(err.required_action(), action);
        assert!(!err.user_message().is_empty());
        assert_eq!(system.state(), SessionState::Failed(expected));
        assert_eq!(script.log().sessions_created, 0);
    }
}

#[test]
fn test_create_failure_is_fatal() {
    let (mut system, script, _) = start();
    script.fail_next_create(EngineError::Other("driver crashed".into()));

    let err = system.on_resume().unwrap_err();

    assert_eq!(err.required_action(), RequiredAction::CloseScreen);
    assert!(matches!(system.state(), SessionState::Failed(SessionError::Fatal(_))));
}

#[test]
fn test_camera_unavailable_then_retry_succeeds() {
    let (mut system, script, renderer) = start();
    script.fail_next_resume(EngineError::CameraNotAvailable);

    assert_eq!(system.on_resume(), Err(SessionError::CameraUnavailable));
    assert_eq!(script.log().stops, 1);

    system.on_resume().unwrap();
    assert_eq!(system.state(), SessionState::Resumed);
    assert!(wait_for(|| *renderer.frames.lock() > 0));
    assert_eq!(script.log().sessions_created, 2);
}
