//! Tracking engine seam.
//!
//! The AR engine (camera pipeline, feature tracking, plane detection,
//! recognition) lives outside this crate. The pipeline talks to it only
//! through [`ArEngine`] and [`EngineSession`]; every call is synchronous and
//! made either from a lifecycle transition or from the render thread while
//! it holds the session lock.

pub mod capabilities;
pub mod error;
pub mod frame;
pub mod scripted;

pub use capabilities::{Capabilities, TrackingMode};
pub use error::EngineError;
pub use frame::{Camera, DisplayGeometry, DisplayRotation, FrameSnapshot, HitResult, HitSource};
pub use scripted::{FrameScript, ScriptHandle, ScriptedEngine};

use crate::geometry::Pose;
use crate::tracking::{Anchor, Trackable, TrackableType};

/// Result of the install/compatibility check run before a session exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Availability {
    Supported,
    NotInstalled,
    ApkTooOld,
    SdkTooOld,
    UnsupportedDevice,
}

/// Entry point of the engine: availability and session creation.
pub trait ArEngine: Send {
    fn check_availability(&mut self) -> Availability;

    fn create_session(
        &mut self,
        capabilities: &Capabilities,
    ) -> Result<Box<dyn EngineSession>, EngineError>;
}

/// A live engine session.
pub trait EngineSession: Send {
    fn configure(&mut self, capabilities: &Capabilities) -> Result<(), EngineError>;

    fn resume(&mut self) -> Result<(), EngineError>;

    fn pause(&mut self) -> Result<(), EngineError>;

    /// Stop the session and release its resources. Called at most once.
    fn stop(&mut self);

    /// GL texture the engine writes the camera image into.
    fn set_camera_texture_name(&mut self, texture_id: u32);

    fn set_display_geometry(&mut self, geometry: DisplayGeometry);

    /// Block until the next camera frame is processed.
    fn update(&mut self) -> Result<FrameSnapshot, EngineError>;

    /// Every trackable of a variant currently known to the engine.
    fn all_trackables(&self, kind: TrackableType) -> Vec<Trackable>;

    fn create_anchor(&mut self, pose: &Pose) -> Result<Anchor, EngineError>;

    /// Release an anchor. Takes the handle so it cannot be used afterwards.
    fn detach_anchor(&mut self, anchor: Anchor);
}
