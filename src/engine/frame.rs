//! Per-update frame snapshot: camera, updated trackables, anchors, hit test.

use nalgebra::{Matrix4, Perspective3, Unit, Vector3};
use serde::{Deserialize, Serialize};

use crate::geometry::{Pose, ScreenPoint, Viewport};
use crate::tracking::{AnchorUpdate, Trackable, TrackableKind, TrackableType, TrackingState};

/// Screen rotation relative to the sensor's natural orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DisplayRotation {
    #[default]
    Rotation0,
    Rotation90,
    Rotation180,
    Rotation270,
}

/// Display geometry the engine needs to align the camera image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DisplayGeometry {
    pub rotation: DisplayRotation,
    pub viewport: Viewport,
}

/// Physical camera for one frame. Looks down its local -Z axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub pose: Pose,
    pub tracking_state: TrackingState,
    /// Vertical field of view in radians.
    pub fov_y: f32,
    pub viewport: Viewport,
}

impl Camera {
    /// World-to-camera matrix.
    pub fn view_matrix(&self) -> Matrix4<f32> {
        self.pose.inverse().to_matrix()
    }

    pub fn projection_matrix(&self, near: f32, far: f32) -> Matrix4<f32> {
        Perspective3::new(self.viewport.aspect(), self.fov_y, near, far).to_homogeneous()
    }

    /// World-space ray through a screen point: (origin, unit direction).
    pub fn screen_ray(&self, p: ScreenPoint) -> (Vector3<f32>, Unit<Vector3<f32>>) {
        let width = self.viewport.width.max(1) as f32;
        let height = self.viewport.height.max(1) as f32;
        let ndc_x = 2.0 * p.x / width - 1.0;
        let ndc_y = 1.0 - 2.0 * p.y / height;
        let half_h = (self.fov_y * 0.5).tan();
        let dir_cam = Vector3::new(ndc_x * half_h * self.viewport.aspect(), ndc_y * half_h, -1.0);
        let dir_world = Unit::new_normalize(self.pose.rotation * dir_cam);
        (self.pose.translation, dir_world)
    }
}

/// One ranked hit-test candidate.
#[derive(Debug, Clone, PartialEq)]
pub struct HitResult {
    pub trackable: Trackable,
    /// Intersection pose; for planes it carries the plane orientation.
    pub hit_pose: Pose,
    /// Distance from the camera along the ray (meters).
    pub distance: f32,
}

/// Where a frame's hit-test answers come from.
#[derive(Debug, Clone, PartialEq)]
pub enum HitSource {
    /// Candidates fixed by the engine regardless of the screen point.
    Fixed(Vec<HitResult>),
    /// Ray cast against the given planes and points.
    Raycast(Vec<Trackable>),
}

impl Default for HitSource {
    fn default() -> Self {
        Self::Fixed(Vec::new())
    }
}

/// Distance within which a ray is considered to touch a feature point.
const POINT_HIT_RADIUS: f32 = 0.05;

/// The engine's bundle for one `update()` call.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameSnapshot {
    pub timestamp_ns: i64,
    pub camera: Camera,
    /// Trackables whose state or pose changed since the previous update.
    pub updated: Vec<Trackable>,
    /// Latest state of every live anchor.
    pub anchors: Vec<AnchorUpdate>,
    pub hits: HitSource,
}

impl FrameSnapshot {
    pub fn new(timestamp_ns: i64, camera: Camera) -> Self {
        Self {
            timestamp_ns,
            camera,
            updated: Vec::new(),
            anchors: Vec::new(),
            hits: HitSource::default(),
        }
    }

    /// Updated trackables of one variant.
    pub fn updated_trackables(&self, kind: TrackableType) -> impl Iterator<Item = &Trackable> + '_ {
        self.updated
            .iter()
            .filter(move |t| t.trackable_type() == kind)
    }

    pub fn anchor_update(&self, id: crate::tracking::AnchorId) -> Option<&AnchorUpdate> {
        self.anchors.iter().find(|a| a.id == id)
    }

    /// Ranked candidates for a screen point, ascending by distance.
    pub fn hit_test(&self, p: ScreenPoint) -> Vec<HitResult> {
        let mut hits = match &self.hits {
            HitSource::Fixed(results) => results.clone(),
            HitSource::Raycast(scene) => raycast(&self.camera, p, scene),
        };
        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits
    }
}

fn raycast(camera: &Camera, p: ScreenPoint, scene: &[Trackable]) -> Vec<HitResult> {
    let (origin, dir) = camera.screen_ray(p);
    let mut hits = Vec::new();

    for trackable in scene {
        match &trackable.kind {
            TrackableKind::Plane(plane) => {
                let normal = plane.center_pose.y_axis();
                let denom = normal.dot(&dir);
                if denom.abs() < 1e-6 {
                    continue;
                }
                let t = (plane.center_pose.translation - origin).dot(&normal) / denom;
                if t <= 0.0 {
                    continue;
                }
                hits.push(HitResult {
                    trackable: trackable.clone(),
                    hit_pose: Pose {
                        rotation: plane.center_pose.rotation,
                        translation: origin + dir.into_inner() * t,
                    },
                    distance: t,
                });
            }
            TrackableKind::Point(point) => {
                let to_point = point.pose.translation - origin;
                let t = to_point.dot(&dir);
                if t <= 0.0 {
                    continue;
                }
                let closest = origin + dir.into_inner() * t;
                if (point.pose.translation - closest).norm() > POINT_HIT_RADIUS {
                    continue;
                }
                hits.push(HitResult {
                    trackable: trackable.clone(),
                    hit_pose: point.pose,
                    distance: t,
                });
            }
            TrackableKind::Image(_)
            | TrackableKind::Body(_)
            | TrackableKind::Hand(_)
            | TrackableKind::Face(_) => {}
        }
    }
    hits
}
