use std::path::Path;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{Result, bail};
use nalgebra::{UnitQuaternion, Vector2, Vector3};
use parking_lot::Mutex;
use tracing_subscriber::EnvFilter;

use ar_session::config::PipelineConfig;
use ar_session::engine::{DisplayRotation, FrameScript, ScriptedEngine};
use ar_session::geometry::{Pose, ScreenPoint};
use ar_session::input::GestureEvent;
use ar_session::system::{ArSystem, FrameOutput, Renderer, SessionState, Surface};
use ar_session::tracking::trackable::{PlaneGeometry, PlaneType};
use ar_session::tracking::{Trackable, TrackableId, TrackableKind, TrackingState};

const SURFACE_WIDTH: u32 = 1080;
const SURFACE_HEIGHT: u32 = 1920;

#[derive(Debug, Default)]
struct RenderStats {
    frames: usize,
    max_objects: usize,
    last_objects: usize,
    last_tracked: usize,
}

/// Renderer that only counts what it would draw.
struct SummaryRenderer {
    stats: Arc<Mutex<RenderStats>>,
}

impl Renderer for SummaryRenderer {
    fn on_surface_created(&mut self) -> Surface {
        Surface {
            camera_texture: 1,
            width: SURFACE_WIDTH,
            height: SURFACE_HEIGHT,
        }
    }

    fn draw(&mut self, output: &FrameOutput) {
        let mut stats = self.stats.lock();
        stats.frames += 1;
        stats.last_objects = output.objects.len();
        stats.max_objects = stats.max_objects.max(output.objects.len());
        stats.last_tracked = output.tracked;
    }
}

/// A 2m x 2m wall two meters in front of the camera, facing it.
fn wall() -> Trackable {
    Trackable::new(
        TrackableId(1),
        TrackingState::Tracking,
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

fn settle() {
    thread::sleep(Duration::from_millis(120));
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => PipelineConfig::load(Path::new(&path))?,
        None => PipelineConfig::default(),
    };
    println!("Pipeline config: {:?}", config);

    let (engine, script) = ScriptedEngine::new();
    let stats = Arc::new(Mutex::new(RenderStats::default()));
    let renderer = SummaryRenderer {
        stats: Arc::clone(&stats),
    };
    let mut system = ArSystem::start(Box::new(engine), config.clone(), Box::new(renderer))?;

    // Pausing before the first resume does nothing.
    system.on_pause();

    if let Err(err) = system.on_resume() {
        println!("Resume failed: {} (action: {:?})", err.user_message(), err.required_action());
        system.shutdown();
        return Ok(());
    }
    script.push_frame(FrameScript::new().with_update(wall()));
    settle();

    let center = ScreenPoint::new(SURFACE_WIDTH as f32 / 2.0, SURFACE_HEIGHT as f32 / 2.0);
    system.gestures().enqueue(GestureEvent::SingleTap(center));
    settle();

    system.on_display_changed(DisplayRotation::Rotation90);
    system.gestures().enqueue(GestureEvent::DoubleTap(center));
    settle();
    system.gestures().enqueue(GestureEvent::Scroll {
        from: center,
        to: ScreenPoint::new(center.x + 40.0, center.y),
        dx: 40.0,
        dy: 0.0,
    });
    settle();

    system.on_pause();
    settle();
    system.on_resume()?;

    // Tap past the pool capacity to exercise eviction.
    for i in 0..(config.object_pool_capacity + 4) {
        let offset = (i % 5) as f32 * 20.0;
        system
            .gestures()
            .enqueue(GestureEvent::SingleTap(ScreenPoint::new(center.x + offset, center.y)));
        thread::sleep(Duration::from_millis(config.frame_interval_ms * 2));
    }
    settle();

    let events: Vec<_> = system.ui_events().try_iter().collect();
    let dropped = system.gestures().dropped();
    let driver = system.shutdown();
    if system.state() != SessionState::Stopped {
        bail!("Session not stopped after shutdown: {:?}", system.state());
    }

    let stats = stats.lock();
    println!("\n=== Session summary ===");
    println!("Frames drawn: {}", stats.frames);
    println!("Objects: last frame {}, peak {}", stats.last_objects, stats.max_objects);
    println!("Tracked entries (last frame): {}", stats.last_tracked);
    println!("Gestures dropped: {}", dropped);
    if let Some(driver) = driver {
        println!(
            "Driver: {} objects alive, selected {:?}, {} faulted ticks",
            driver.object_count(),
            driver.selected_object(),
            driver.faults()
        );
    }
    println!("UI events ({}):", events.len());
    for event in &events {
        println!("  {:?}", event);
    }
    let log = script.log();
    println!(
        "Engine calls: {} created, {} resumes, {} pauses, {} stops, {} anchors created",
        log.sessions_created, log.resumes, log.pauses, log.stops, log.anchors_created
    );

    Ok(())
}
