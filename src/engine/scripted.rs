//! Deterministic in-memory engine.
//!
//! Frames are queued as [`FrameScript`]s through a [`ScriptHandle`] and
//! replayed one per `update()`. The handle also records every call the
//! pipeline makes so tests can check ordering and call counts after the
//! session has been boxed away behind the lifecycle.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use crate::geometry::{Pose, Viewport};
use crate::tracking::{
    Anchor, AnchorId, AnchorUpdate, Trackable, TrackableId, TrackableKind, TrackableType,
    TrackingState,
};

use super::{
    ArEngine, Availability, Camera, Capabilities, DisplayGeometry, EngineError, EngineSession,
    FrameSnapshot, HitResult, HitSource,
};

/// Nanoseconds between scripted frames (30 fps).
const FRAME_INTERVAL_NS: i64 = 33_333_333;

/// Default vertical field of view of the scripted camera (radians).
const DEFAULT_FOV_Y: f32 = 1.0;

/// What the engine reports for one `update()`.
#[derive(Debug, Clone)]
pub struct FrameScript {
    pub camera_pose: Option<Pose>,
    pub camera_state: TrackingState,
    pub updates: Vec<Trackable>,
    pub anchor_states: Vec<(AnchorId, TrackingState)>,
    /// Fixed hit-test answer; ray casting against the scene otherwise.
    pub hits: Option<Vec<HitResult>>,
    /// Fail this update instead of producing a frame.
    pub fault: Option<EngineError>,
}

impl FrameScript {
    pub fn new() -> Self {
        Self {
            camera_pose: None,
            camera_state: TrackingState::Tracking,
            updates: Vec::new(),
            anchor_states: Vec::new(),
            hits: None,
            fault: None,
        }
    }

    pub fn with_update(mut self, trackable: Trackable) -> Self {
        self.updates.push(trackable);
        self
    }

    pub fn with_camera(mut self, pose: Pose, state: TrackingState) -> Self {
        self.camera_pose = Some(pose);
        self.camera_state = state;
        self
    }

    pub fn with_anchor_state(mut self, id: AnchorId, state: TrackingState) -> Self {
        self.anchor_states.push((id, state));
        self
    }

    pub fn with_hits(mut self, hits: Vec<HitResult>) -> Self {
        self.hits = Some(hits);
        self
    }

    pub fn with_fault(mut self, fault: EngineError) -> Self {
        self.fault = Some(fault);
        self
    }
}

impl Default for FrameScript {
    fn default() -> Self {
        Self::new()
    }
}

/// Calls observed by the scripted engine.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallLog {
    pub availability_checks: usize,
    pub sessions_created: usize,
    pub configures: usize,
    pub resumes: usize,
    pub pauses: usize,
    pub stops: usize,
    pub updates: usize,
    pub camera_texture: Option<u32>,
    pub display_geometry: Option<DisplayGeometry>,
    pub display_updates: usize,
    pub anchors_created: usize,
    /// Detach count per anchor id.
    pub detached: HashMap<AnchorId, usize>,
}

impl CallLog {
    pub fn detach_count(&self, id: AnchorId) -> usize {
        self.detached.get(&id).copied().unwrap_or(0)
    }
}

#[derive(Debug)]
struct ScriptState {
    availability: Availability,
    create_failure: Option<EngineError>,
    configure_failure: Option<EngineError>,
    resume_failures: VecDeque<EngineError>,
    pause_failure: Option<EngineError>,
    pending: VecDeque<FrameScript>,
    scene: HashMap<TrackableId, Trackable>,
    anchors: HashMap<AnchorId, (Pose, TrackingState)>,
    next_anchor_id: u64,
    camera_pose: Pose,
    camera_state: TrackingState,
    display: DisplayGeometry,
    anchor_limit: Option<usize>,
    timestamp_ns: i64,
    log: CallLog,
}

/// Test-side handle into a [`ScriptedEngine`].
#[derive(Debug, Clone)]
pub struct ScriptHandle {
    state: Arc<Mutex<ScriptState>>,
}

impl ScriptHandle {
    /// Queue a frame for a future `update()`.
    pub fn push_frame(&self, frame: FrameScript) {
        self.state.lock().pending.push_back(frame);
    }

    pub fn pending_frames(&self) -> usize {
        self.state.lock().pending.len()
    }

    pub fn set_availability(&self, availability: Availability) {
        self.state.lock().availability = availability;
    }

    /// Fail the next `create_session`.
    pub fn fail_next_create(&self, err: EngineError) {
        self.state.lock().create_failure = Some(err);
    }

    /// Fail the next `configure`.
    pub fn fail_next_configure(&self, err: EngineError) {
        self.state.lock().configure_failure = Some(err);
    }

    /// Fail the next `resume`.
    pub fn fail_next_resume(&self, err: EngineError) {
        self.state.lock().resume_failures.push_back(err);
    }

    /// Cap the number of live anchors; creation past it fails with
    /// `ResourceExhausted`.
    pub fn set_anchor_limit(&self, limit: Option<usize>) {
        self.state.lock().anchor_limit = limit;
    }

    /// Fail the next `pause`. The session still stops running.
    pub fn fail_next_pause(&self, err: EngineError) {
        self.state.lock().pause_failure = Some(err);
    }

    pub fn log(&self) -> CallLog {
        self.state.lock().log.clone()
    }

    /// Anchors that are created and not yet detached.
    pub fn live_anchors(&self) -> usize {
        self.state.lock().anchors.len()
    }
}

/// Engine implementation replaying scripted frames.
#[derive(Debug)]
pub struct ScriptedEngine {
    state: Arc<Mutex<ScriptState>>,
}

impl ScriptedEngine {
    pub fn new() -> (Self, ScriptHandle) {
        let state = Arc::new(Mutex::new(ScriptState {
            availability: Availability::Supported,
            create_failure: None,
            configure_failure: None,
            resume_failures: VecDeque::new(),
            pause_failure: None,
            pending: VecDeque::new(),
            scene: HashMap::new(),
            anchors: HashMap::new(),
            next_anchor_id: 0,
            camera_pose: Pose::identity(),
            camera_state: TrackingState::Tracking,
            display: DisplayGeometry {
                viewport: Viewport::new(1080, 1920),
                ..DisplayGeometry::default()
            },
            anchor_limit: None,
            timestamp_ns: 0,
            log: CallLog::default(),
        }));
        let handle = ScriptHandle {
            state: Arc::clone(&state),
        };
        (Self { state }, handle)
    }
}

impl ArEngine for ScriptedEngine {
    fn check_availability(&mut self) -> Availability {
        let mut state = self.state.lock();
        state.log.availability_checks += 1;
        state.availability
    }

    fn create_session(
        &mut self,
        _capabilities: &Capabilities,
    ) -> Result<Box<dyn EngineSession>, EngineError> {
        let mut state = self.state.lock();
        if let Some(err) = state.create_failure.take() {
            return Err(err);
        }
        state.log.sessions_created += 1;
        Ok(Box::new(ScriptedSession {
            state: Arc::clone(&self.state),
            running: false,
        }))
    }
}

/// Session produced by [`ScriptedEngine`].
#[derive(Debug)]
struct ScriptedSession {
    state: Arc<Mutex<ScriptState>>,
    running: bool,
}

impl EngineSession for ScriptedSession {
    fn configure(&mut self, _capabilities: &Capabilities) -> Result<(), EngineError> {
        let mut state = self.state.lock();
        state.log.configures += 1;
        match state.configure_failure.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn resume(&mut self) -> Result<(), EngineError> {
        let mut state = self.state.lock();
        state.log.resumes += 1;
        if let Some(err) = state.resume_failures.pop_front() {
            return Err(err);
        }
        self.running = true;
        Ok(())
    }

    fn pause(&mut self) -> Result<(), EngineError> {
        let mut state = self.state.lock();
        state.log.pauses += 1;
        self.running = false;
        match state.pause_failure.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn stop(&mut self) {
        let mut state = self.state.lock();
        state.log.stops += 1;
        state.anchors.clear();
        self.running = false;
    }

    fn set_camera_texture_name(&mut self, texture_id: u32) {
        self.state.lock().log.camera_texture = Some(texture_id);
    }

    fn set_display_geometry(&mut self, geometry: DisplayGeometry) {
        let mut state = self.state.lock();
        state.display = geometry;
        state.log.display_geometry = Some(geometry);
        state.log.display_updates += 1;
    }

    fn update(&mut self) -> Result<FrameSnapshot, EngineError> {
        if !self.running {
            return Err(EngineError::SessionPaused);
        }

        let mut state = self.state.lock();
        state.log.updates += 1;
        let script = state.pending.pop_front().unwrap_or_default();
        if let Some(err) = script.fault {
            return Err(err);
        }

        state.timestamp_ns += FRAME_INTERVAL_NS;
        if let Some(pose) = script.camera_pose {
            state.camera_pose = pose;
        }
        state.camera_state = script.camera_state;

        for trackable in &script.updates {
            if trackable.state == TrackingState::Stopped {
                state.scene.remove(&trackable.id);
            } else {
                state.scene.insert(trackable.id, trackable.clone());
            }
        }
        for (id, anchor_state) in &script.anchor_states {
            if let Some(entry) = state.anchors.get_mut(id) {
                entry.1 = *anchor_state;
            }
        }

        let camera = Camera {
            pose: state.camera_pose,
            tracking_state: state.camera_state,
            fov_y: DEFAULT_FOV_Y,
            viewport: state.display.viewport,
        };
        let mut frame = FrameSnapshot::new(state.timestamp_ns, camera);
        frame.updated = script.updates;

        let mut anchors: Vec<AnchorUpdate> = state
            .anchors
            .iter()
            .map(|(id, (pose, anchor_state))| AnchorUpdate {
                id: *id,
                state: *anchor_state,
                pose: *pose,
            })
            .collect();
        anchors.sort_by_key(|a| a.id);
        frame.anchors = anchors;

        frame.hits = match script.hits {
            Some(hits) => HitSource::Fixed(hits),
            None => {
                let mut scene: Vec<Trackable> = state
                    .scene
                    .values()
                    .filter(|t| matches!(t.kind, TrackableKind::Plane(_) | TrackableKind::Point(_)))
                    .cloned()
                    .collect();
                scene.sort_by_key(|t| t.id);
                HitSource::Raycast(scene)
            }
        };

        debug!(
            timestamp_ns = frame.timestamp_ns,
            updated = frame.updated.len(),
            anchors = frame.anchors.len(),
            "scripted frame"
        );
        Ok(frame)
    }

    fn all_trackables(&self, kind: TrackableType) -> Vec<Trackable> {
        let state = self.state.lock();
        let mut all: Vec<Trackable> = state
            .scene
            .values()
            .filter(|t| t.trackable_type() == kind)
            .cloned()
            .collect();
        all.sort_by_key(|t| t.id);
        all
    }

    fn create_anchor(&mut self, pose: &Pose) -> Result<Anchor, EngineError> {
        let mut state = self.state.lock();
        if state.anchor_limit.is_some_and(|limit| state.anchors.len() >= limit) {
            return Err(EngineError::ResourceExhausted);
        }
        let id = AnchorId(state.next_anchor_id);
        state.next_anchor_id += 1;
        state.anchors.insert(id, (*pose, TrackingState::Tracking));
        state.log.anchors_created += 1;
        Ok(Anchor::new(id, *pose))
    }

    fn detach_anchor(&mut self, anchor: Anchor) {
        let mut state = self.state.lock();
        state.anchors.remove(&anchor.id());
        *state.log.detached.entry(anchor.id()).or_insert(0) += 1;
    }
}
