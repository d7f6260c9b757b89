//! Hit-test resolution: pick the tracked surface or point a tap refers to.
//!
//! Candidates arrive ranked by the engine, nearest first. Each one is
//! classified:
//! - **Plane**: valid iff the hit lies inside the plane polygon and the
//!   camera is on the front side of the plane.
//! - **Point**: valid iff it carries an estimated surface normal.
//! - Everything else is ignored.
//!
//! The first valid plane wins outright, even when a valid point is closer,
//! because planes give better placement orientation. Without a valid plane
//! the nearest valid point is used.

use tracing::debug;

use crate::engine::{Camera, FrameSnapshot, HitResult};
use crate::geometry::polygon::signed_distance_to_plane;
use crate::geometry::ScreenPoint;
use crate::tracking::trackable::PointOrientationMode;
use crate::tracking::{TrackableKind, TrackingState};

/// Classification of a single candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Candidate {
    ValidPlane,
    ValidPoint,
    Rejected,
}

/// Stateless resolver over a frame's ranked hit candidates.
#[derive(Debug, Clone, Copy, Default)]
pub struct HitTestResolver;

impl HitTestResolver {
    pub fn new() -> Self {
        Self
    }

    /// Resolve a screen point against the frame. `None` means no usable hit.
    pub fn resolve(&self, frame: &FrameSnapshot, point: ScreenPoint) -> Option<HitResult> {
        if frame.camera.tracking_state != TrackingState::Tracking {
            debug!("camera not tracking, hit test skipped");
            return None;
        }
        self.select(&frame.camera, frame.hit_test(point))
    }

    /// Apply the precedence rule to candidates already sorted by distance.
    pub fn select(&self, camera: &Camera, candidates: Vec<HitResult>) -> Option<HitResult> {
        let mut first_point: Option<HitResult> = None;

        for hit in candidates {
            match classify(camera, &hit) {
                Candidate::ValidPlane => {
                    debug!(id = %hit.trackable.id, distance = hit.distance, "hit plane");
                    return Some(hit);
                }
                Candidate::ValidPoint => {
                    if first_point.is_none() {
                        first_point = Some(hit);
                    }
                }
                Candidate::Rejected => {}
            }
        }

        if let Some(hit) = &first_point {
            debug!(id = %hit.trackable.id, distance = hit.distance, "hit oriented point");
        }
        first_point
    }
}

/// Classify one candidate against the current camera.
pub fn classify(camera: &Camera, hit: &HitResult) -> Candidate {
    match &hit.trackable.kind {
        TrackableKind::Plane(plane) => {
            let in_polygon = plane.is_pose_in_polygon(&hit.hit_pose);
            let in_front =
                signed_distance_to_plane(&plane.center_pose, &camera.pose.translation) > 0.0;
            if in_polygon && in_front {
                Candidate::ValidPlane
            } else {
                Candidate::Rejected
            }
        }
        TrackableKind::Point(point) => match point.orientation_mode {
            PointOrientationMode::EstimatedSurfaceNormal => Candidate::ValidPoint,
            PointOrientationMode::InitializedToIdentity => Candidate::Rejected,
        },
        TrackableKind::Image(_)
        | TrackableKind::Body(_)
        | TrackableKind::Hand(_)
        | TrackableKind::Face(_) => Candidate::Rejected,
    }
}
