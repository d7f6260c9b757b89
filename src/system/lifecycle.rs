//! Session lifecycle: create, configure, resume, pause and stop the engine
//! session in response to host lifecycle callbacks.
//!
//! The session handle lives in a slot behind a single mutex shared with the
//! render thread. Every transition takes the lock for its whole duration,
//! and so does every render tick, so a frame never observes a session that
//! is half paused or already stopped.

use std::sync::Arc;

use parking_lot::{MappedMutexGuard, Mutex, MutexGuard};
use tracing::{debug, error, info, warn};

use crate::engine::{
    ArEngine, Capabilities, DisplayGeometry, DisplayRotation, EngineSession, FrameSnapshot,
};
use crate::geometry::Viewport;

use super::error::{FrameError, SessionError};
use super::state::SessionState;

/// Everything guarded by the session lock.
struct SessionSlot {
    state: SessionState,
    session: Option<Box<dyn EngineSession>>,
    /// Bumped each time a new engine session is created. Anchors are only
    /// meaningful within one generation.
    generation: u64,
    /// Rotation changes are only delivered while resumed.
    display_listener: bool,
    display: DisplayGeometry,
    display_dirty: bool,
    camera_texture: Option<u32>,
    /// Last engine failure that did not end the session.
    last_fault: Option<SessionError>,
}

impl SessionSlot {
    fn new() -> Self {
        Self {
            state: SessionState::Uninitialized,
            session: None,
            generation: 0,
            display_listener: false,
            display: DisplayGeometry::default(),
            display_dirty: false,
            camera_texture: None,
            last_fault: None,
        }
    }

    /// Release any held session and record the failure.
    fn fail(&mut self, err: SessionError) -> Result<(), SessionError> {
        if let Some(mut session) = self.session.take() {
            session.stop();
        }
        self.display_listener = false;
        error!(error = %err, action = ?err.required_action(), "session transition failed");
        self.state = SessionState::Failed(err.clone());
        Err(err)
    }

    fn register_display_listener(&mut self) {
        self.display_listener = true;
        self.display_dirty = true;
    }
}

/// Owns the engine and drives the session state machine.
pub struct SessionLifecycle {
    engine: Box<dyn ArEngine>,
    capabilities: Capabilities,
    slot: Arc<Mutex<SessionSlot>>,
}

impl SessionLifecycle {
    pub fn new(engine: Box<dyn ArEngine>, capabilities: Capabilities) -> Self {
        Self {
            engine,
            capabilities,
            slot: Arc::new(Mutex::new(SessionSlot::new())),
        }
    }

    pub fn state(&self) -> SessionState {
        self.slot.lock().state.clone()
    }

    /// Most recent engine failure that left the session usable, such as a
    /// failed pause.
    pub fn last_fault(&self) -> Option<SessionError> {
        self.slot.lock().last_fault.clone()
    }

    pub fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    /// Render-thread view of the session.
    pub fn frame_access(&self) -> FrameAccess {
        FrameAccess {
            slot: Arc::clone(&self.slot),
        }
    }

    /// Bring the session to `Resumed`, creating it first if none is held.
    ///
    /// A no-op when already resumed. After `on_destroy` it does nothing.
    /// On failure no session is held and the state is `Failed`; calling
    /// again retries from scratch.
    pub fn on_resume(&mut self) -> Result<(), SessionError> {
        let mut slot = self.slot.lock();

        match slot.state {
            SessionState::Resumed => {
                debug!("resume requested while already resumed");
                return Ok(());
            }
            SessionState::Stopped => {
                warn!("resume requested after destroy, ignoring");
                return Ok(());
            }
            _ => {}
        }

        if slot.session.is_none() {
            if let Some(err) = SessionError::from_availability(self.engine.check_availability()) {
                return slot.fail(err);
            }

            let mut session = match self.engine.create_session(&self.capabilities) {
                Ok(session) => session,
                Err(err) => return slot.fail(err.into()),
            };
            slot.state = SessionState::Configuring;
            info!(mode = ?self.capabilities.mode, "session created, configuring");

            if let Err(err) = session.configure(&self.capabilities) {
                session.stop();
                return slot.fail(err.into());
            }
            slot.generation += 1;
            slot.session = Some(session);
        }

        let resumed = match slot.session.as_mut() {
            Some(session) => session.resume(),
            None => return slot.fail(SessionError::Fatal("session missing after create".into())),
        };
        match resumed {
            Ok(()) => {
                slot.register_display_listener();
                slot.state = SessionState::Resumed;
                info!(generation = slot.generation, "session resumed");
                Ok(())
            }
            Err(err) => slot.fail(err.into()),
        }
    }

    /// Pause the engine and stop listening for rotation changes. Only has an
    /// effect while resumed, so pausing before the first resume is a no-op.
    pub fn on_pause(&mut self) {
        let mut slot = self.slot.lock();
        if !slot.state.is_resumed() {
            debug!(state = ?slot.state, "pause ignored");
            return;
        }

        slot.display_listener = false;
        if let Some(session) = slot.session.as_mut() {
            if let Err(err) = session.pause() {
                let err = SessionError::from(err);
                warn!(error = %err, action = ?err.required_action(), "engine pause failed");
                slot.last_fault = Some(err);
            }
        }
        slot.state = SessionState::Paused;
        info!("session paused");
    }

    /// Stop and release the session. Stopping happens at most once no
    /// matter how often this is called.
    pub fn on_destroy(&mut self) {
        let mut slot = self.slot.lock();
        if let Some(mut session) = slot.session.take() {
            session.stop();
            info!(generation = slot.generation, "session stopped");
        }
        slot.display_listener = false;
        slot.state = SessionState::Stopped;
    }

    /// Device rotation callback. Dropped unless the listener is registered.
    pub fn on_display_changed(&self, rotation: DisplayRotation) {
        let mut slot = self.slot.lock();
        if !slot.display_listener {
            return;
        }
        if slot.display.rotation != rotation {
            slot.display.rotation = rotation;
            slot.display_dirty = true;
        }
    }
}

/// Cloneable render-thread handle onto the session slot.
#[derive(Clone)]
pub struct FrameAccess {
    slot: Arc<Mutex<SessionSlot>>,
}

impl FrameAccess {
    /// GL surface created: remember the texture the camera writes into.
    pub fn set_camera_texture(&self, texture_id: u32) {
        self.slot.lock().camera_texture = Some(texture_id);
    }

    /// GL surface resized. Applied to the engine on the next tick.
    pub fn set_viewport(&self, viewport: Viewport) {
        let mut slot = self.slot.lock();
        slot.display.viewport = viewport;
        slot.display_dirty = true;
    }

    pub fn state(&self) -> SessionState {
        self.slot.lock().state.clone()
    }

    /// Pull the next frame.
    ///
    /// `Ok(None)` when no session is resumed. The returned frame keeps the
    /// session lock until it is dropped, so lifecycle transitions wait for
    /// the tick to finish. Engine errors are returned as [`FrameError`] and
    /// leave the session state untouched.
    pub fn tick(&self) -> Result<Option<ActiveFrame<'_>>, FrameError> {
        let mut slot = self.slot.lock();
        if !slot.state.is_resumed() {
            return Ok(None);
        }

        let generation = slot.generation;
        let texture = slot.camera_texture;
        let pending = if slot.display_dirty {
            slot.display_dirty = false;
            Some(slot.display)
        } else {
            None
        };

        let Some(session) = slot.session.as_mut() else {
            return Ok(None);
        };
        if let Some(texture) = texture {
            session.set_camera_texture_name(texture);
        }
        if let Some(geometry) = pending {
            debug!(?geometry, "applying display geometry");
            session.set_display_geometry(geometry);
        }
        let frame = session.update()?;

        match MutexGuard::try_map(slot, |slot| slot.session.as_deref_mut()) {
            Ok(session) => Ok(Some(ActiveFrame {
                frame,
                session,
                generation,
            })),
            Err(_) => Ok(None),
        }
    }
}

/// A frame together with exclusive access to the session that produced it.
pub struct ActiveFrame<'a> {
    frame: FrameSnapshot,
    session: MappedMutexGuard<'a, dyn EngineSession + 'static>,
    generation: u64,
}

impl ActiveFrame<'_> {
    pub fn frame(&self) -> &FrameSnapshot {
        &self.frame
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Borrow the frame and the session at the same time.
    pub fn split(&mut self) -> (&FrameSnapshot, &mut (dyn EngineSession + 'static)) {
        (&self.frame, &mut *self.session)
    }
}
