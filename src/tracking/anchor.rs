//! Anchors: world poses pinned by the engine.
//!
//! An [`Anchor`] is a move-only handle. Exactly one owner (a registry entry
//! or a virtual object) holds it, and detaching hands the handle back to
//! the engine by value, so a detached anchor cannot be read again.

use crate::geometry::Pose;

use super::state::TrackingState;
use super::types::AnchorId;

/// Engine anchor handle together with its latest observed pose and state.
#[derive(Debug, PartialEq)]
pub struct Anchor {
    id: AnchorId,
    pose: Pose,
    state: TrackingState,
}

impl Anchor {
    /// Wrap an anchor the engine has just created at `pose`.
    pub fn new(id: AnchorId, pose: Pose) -> Self {
        Self {
            id,
            pose,
            state: TrackingState::Tracking,
        }
    }

    pub fn id(&self) -> AnchorId {
        self.id
    }

    pub fn pose(&self) -> &Pose {
        &self.pose
    }

    pub fn tracking_state(&self) -> TrackingState {
        self.state
    }

    /// Apply a per-frame update reported by the engine.
    pub fn observe(&mut self, state: TrackingState, pose: Pose) {
        self.state = state;
        self.pose = pose;
    }
}

/// Per-frame anchor observation carried by a frame snapshot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnchorUpdate {
    pub id: AnchorId,
    pub state: TrackingState,
    pub pose: Pose,
}
