//! Per-entity tracking confidence as reported by the engine.

use serde::{Deserialize, Serialize};

/// Tracking state of a trackable, anchor or the camera.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TrackingState {
    /// Detected but not confidently tracked right now; may resume.
    Paused,
    /// Tracked with full confidence this frame.
    Tracking,
    /// Permanently lost; the engine will never report it again.
    Stopped,
}

impl TrackingState {
    pub fn is_tracking(self) -> bool {
        self == Self::Tracking
    }
}

impl Default for TrackingState {
    fn default() -> Self {
        Self::Paused
    }
}
