//! AR System - top-level entry point and render thread orchestration.
//!
//! `ArSystem` is what a hosting screen talks to. It owns the session
//! lifecycle (driven from the calling UI thread) and spawns the render
//! thread, which ticks a [`FrameDriver`] until shutdown.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use anyhow::{Context, Result};
use crossbeam_channel::Receiver;
use tracing::{debug, info};

use crate::config::PipelineConfig;
use crate::engine::{ArEngine, DisplayRotation};
use crate::input::{GestureSender, gesture_channel};

use super::error::SessionError;
use super::frame_driver::{FrameDriver, FrameOutput};
use super::lifecycle::SessionLifecycle;
use super::messages::{UiEvent, ui_channel};
use super::state::SessionState;

/// GL surface handed to the render loop once it exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Surface {
    /// Texture the engine writes camera images into.
    pub camera_texture: u32,
    pub width: u32,
    pub height: u32,
}

/// Drawing side of the render thread.
pub trait Renderer: Send {
    /// Called once, on the render thread, before the first tick.
    fn on_surface_created(&mut self) -> Surface;

    fn draw(&mut self, output: &FrameOutput);
}

/// Lifecycle owner plus the render thread.
pub struct ArSystem {
    lifecycle: SessionLifecycle,
    gestures: GestureSender,
    ui_events: Receiver<UiEvent>,
    shutdown: Arc<AtomicBool>,
    render_handle: Option<JoinHandle<FrameDriver>>,
}

impl ArSystem {
    /// Create the lifecycle and start the render thread. No session exists
    /// until the first `on_resume`.
    pub fn start(
        engine: Box<dyn ArEngine>,
        config: PipelineConfig,
        renderer: Box<dyn Renderer>,
    ) -> Result<Self> {
        let lifecycle = SessionLifecycle::new(engine, config.capabilities.clone());
        let (gestures, gesture_rx) = gesture_channel(config.gesture_capacity);
        let (ui_tx, ui_events) = ui_channel();
        let shutdown = Arc::new(AtomicBool::new(false));

        let driver = FrameDriver::new(lifecycle.frame_access(), gesture_rx, ui_tx, &config);
        let interval = Duration::from_millis(config.frame_interval_ms);
        let render_handle = Self::spawn_render_thread(driver, renderer, shutdown.clone(), interval)?;

        Ok(Self {
            lifecycle,
            gestures,
            ui_events,
            shutdown,
            render_handle: Some(render_handle),
        })
    }

    fn spawn_render_thread(
        mut driver: FrameDriver,
        mut renderer: Box<dyn Renderer>,
        shutdown: Arc<AtomicBool>,
        interval: Duration,
    ) -> Result<JoinHandle<FrameDriver>> {
        thread::Builder::new()
            .name("ar-render".into())
            .spawn(move || {
                let surface = renderer.on_surface_created();
                driver.on_surface_created(surface.camera_texture);
                driver.on_surface_changed(surface.width, surface.height);

                while !shutdown.load(Ordering::SeqCst) {
                    if let Some(output) = driver.on_draw_frame() {
                        renderer.draw(&output);
                    }
                    thread::sleep(interval);
                }
                debug!(faults = driver.faults(), "render thread exiting");
                driver
            })
            .context("Failed to spawn render thread")
    }

    pub fn on_resume(&mut self) -> Result<(), SessionError> {
        self.lifecycle.on_resume()
    }

    pub fn on_pause(&mut self) {
        self.lifecycle.on_pause();
    }

    pub fn on_destroy(&mut self) {
        self.lifecycle.on_destroy();
    }

    pub fn on_display_changed(&self, rotation: DisplayRotation) {
        self.lifecycle.on_display_changed(rotation);
    }

    pub fn state(&self) -> SessionState {
        self.lifecycle.state()
    }

    /// UI-thread handle for posting gestures.
    pub fn gestures(&self) -> &GestureSender {
        &self.gestures
    }

    /// Events posted by the render thread.
    pub fn ui_events(&self) -> &Receiver<UiEvent> {
        &self.ui_events
    }

    /// Stop the render thread and the session. Returns the driver so callers
    /// can inspect final render-side state.
    pub fn shutdown(&mut self) -> Option<FrameDriver> {
        self.shutdown.store(true, Ordering::SeqCst);
        let driver = self.render_handle.take().and_then(|handle| handle.join().ok());
        self.lifecycle.on_destroy();
        info!("ar system shut down");
        driver
    }
}

impl Drop for ArSystem {
    fn drop(&mut self) {
        if self.render_handle.is_some() {
            self.shutdown();
        }
    }
}
