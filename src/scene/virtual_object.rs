//! Placed virtual objects and the bounded pool that owns them.
//!
//! # Pool policy
//! - A confirmed single tap pins a new anchor and appends an object.
//! - At capacity the oldest object leaves first; its anchor is detached
//!   before the new object is stored.
//! - Objects whose anchor reports Stopped are detached and dropped.
//! - At most one object is selected at a time.

use nalgebra::{Matrix4, UnitQuaternion, Vector3};
use tracing::debug;

use crate::engine::{Camera, EngineError, EngineSession, FrameSnapshot, HitResult};
use crate::geometry::ScreenPoint;
use crate::hit_test::selection::{self, Selectable};
use crate::ring::BoundedRing;
use crate::tracking::{Anchor, TrackableKind, TrackingState};

/// Default number of objects kept alive at once.
pub const DEFAULT_POOL_CAPACITY: usize = 16;

/// Object color for placements on feature points (RGBA).
const POINT_COLOR: [f32; 4] = [66.0 / 255.0, 133.0 / 255.0, 244.0 / 255.0, 1.0];
/// Object color for placements on planes (RGBA).
const PLANE_COLOR: [f32; 4] = [139.0 / 255.0, 195.0 / 255.0, 74.0 / 255.0, 1.0];
/// Fallback color.
const DEFAULT_COLOR: [f32; 4] = [1.0, 1.0, 1.0, 1.0];

/// Half-size of an unscaled object's bounding cube (meters).
const BASE_HALF_EXTENT: f32 = 0.1;

/// A renderable entity pinned to an anchor.
#[derive(Debug)]
pub struct VirtualObject {
    anchor: Anchor,
    pub color: [f32; 4],
    pub scale: f32,
    /// Yaw around the anchor's up axis (radians).
    pub rotation: f32,
    pub selected: bool,
}

impl VirtualObject {
    pub fn new(anchor: Anchor, color: [f32; 4], scale: f32) -> Self {
        Self {
            anchor,
            color,
            scale,
            rotation: 0.0,
            selected: false,
        }
    }

    pub fn anchor(&self) -> &Anchor {
        &self.anchor
    }

    /// Model matrix: anchor pose, then yaw, then uniform scale.
    pub fn model_matrix(&self) -> Matrix4<f32> {
        let yaw = UnitQuaternion::from_axis_angle(&Vector3::y_axis(), self.rotation);
        self.anchor.pose().to_matrix() * yaw.to_homogeneous() * Matrix4::new_scaling(self.scale)
    }

    pub fn is_visible(&self) -> bool {
        self.anchor.tracking_state() == TrackingState::Tracking
    }

    fn selectable(&self) -> Selectable {
        Selectable {
            pose: *self.anchor.pose(),
            half_extent: BASE_HALF_EXTENT * self.scale,
        }
    }
}

/// Color for an object placed on the given hit.
pub fn color_for_hit(hit: &HitResult) -> [f32; 4] {
    match hit.trackable.kind {
        TrackableKind::Point(_) => POINT_COLOR,
        TrackableKind::Plane(_) => PLANE_COLOR,
        _ => DEFAULT_COLOR,
    }
}

/// Bounded FIFO pool of placed objects.
#[derive(Debug)]
pub struct VirtualObjectPool {
    objects: BoundedRing<VirtualObject>,
    scale: f32,
}

impl VirtualObjectPool {
    pub fn new(capacity: usize, scale: f32) -> Self {
        Self {
            objects: BoundedRing::new(capacity),
            scale,
        }
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.objects.capacity()
    }

    /// Objects oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &VirtualObject> + '_ {
        self.objects.iter()
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.objects.iter().position(|o| o.selected)
    }

    /// Pin an anchor at the hit and append an object. When the pool is
    /// full the oldest object is evicted and its anchor detached before the
    /// new anchor is created.
    pub fn place(
        &mut self,
        hit: &HitResult,
        session: &mut dyn EngineSession,
    ) -> Result<(), EngineError> {
        if self.objects.is_full() {
            if let Some(oldest) = self.objects.pop() {
                debug!(anchor = %oldest.anchor.id(), "pool full, evicting oldest object");
                session.detach_anchor(oldest.anchor);
            }
        }
        let anchor = session.create_anchor(&hit.hit_pose)?;
        let object = VirtualObject::new(anchor, color_for_hit(hit), self.scale);
        if let Some(evicted) = self.objects.push(object) {
            session.detach_anchor(evicted.anchor);
        }
        Ok(())
    }

    /// Refresh anchor poses from the frame and drop objects whose anchor
    /// stopped. Returns how many were dropped.
    pub fn sync(&mut self, frame: &FrameSnapshot, session: &mut dyn EngineSession) -> usize {
        for object in self.objects.iter_mut() {
            if let Some(update) = frame.anchor_update(object.anchor.id()) {
                object.anchor.observe(update.state, update.pose);
            }
        }
        let stopped = self
            .objects
            .retain_or_take(|o| o.anchor.tracking_state() != TrackingState::Stopped);
        let count = stopped.len();
        for object in stopped {
            debug!(anchor = %object.anchor.id(), "anchor stopped, removing object");
            session.detach_anchor(object.anchor);
        }
        count
    }

    /// Select the object under `tap`, deselecting any other. A miss leaves
    /// the current selection untouched.
    pub fn select_at(
        &mut self,
        camera: &Camera,
        near: f32,
        far: f32,
        tap: ScreenPoint,
    ) -> Option<usize> {
        let targets: Vec<Selectable> = self.objects.iter().map(|o| o.selectable()).collect();
        let picked = selection::pick(camera, near, far, tap, targets)?;
        for (i, object) in self.objects.iter_mut().enumerate() {
            object.selected = i == picked;
        }
        Some(picked)
    }

    /// Spin the selected object by `delta` radians.
    pub fn rotate_selected(&mut self, delta: f32) -> bool {
        match self.objects.iter_mut().find(|o| o.selected) {
            Some(object) => {
                object.rotation = (object.rotation + delta) % std::f32::consts::TAU;
                true
            }
            None => false,
        }
    }

    /// Detach every anchor and empty the pool.
    pub fn clear(&mut self, session: &mut dyn EngineSession) {
        for object in self.objects.drain() {
            session.detach_anchor(object.anchor);
        }
    }

    /// Empty the pool without talking to the engine.
    pub fn forget(&mut self) {
        self.objects.drain();
    }
}
