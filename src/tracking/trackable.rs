//! Trackables: entities recognized and followed by the engine across frames.
//!
//! Every trackable shares an identity and a [`TrackingState`]; the geometry
//! depends on the variant. Consumers dispatch with an exhaustive `match` on
//! [`TrackableKind`].

use nalgebra::{Vector2, Vector3};
use serde::{Deserialize, Serialize};

use crate::geometry::polygon;
use crate::geometry::Pose;

use super::state::TrackingState;
use super::types::TrackableId;

/// Discriminant of [`TrackableKind`], used to filter engine queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TrackableType {
    Plane,
    Point,
    Image,
    Body,
    Hand,
    Face,
}

/// Orientation of a plane relative to gravity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaneType {
    HorizontalUpwardFacing,
    HorizontalDownwardFacing,
    Vertical,
}

/// A detected planar surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaneGeometry {
    /// Center of the plane; local +Y is the surface normal.
    pub center_pose: Pose,
    /// Boundary in the center pose's local XZ coordinates.
    pub polygon: Vec<Vector2<f32>>,
    pub plane_type: PlaneType,
}

impl PlaneGeometry {
    /// Whether a world-space pose lies within the plane boundary.
    pub fn is_pose_in_polygon(&self, pose: &Pose) -> bool {
        polygon::contains_world_point(&self.center_pose, &self.polygon, &pose.translation)
    }
}

/// Whether a feature point carries a usable surface orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PointOrientationMode {
    /// Free-floating point without orientation.
    InitializedToIdentity,
    /// Orientation derived from the estimated surface normal around the point.
    EstimatedSurfaceNormal,
}

/// A single feature point from the point cloud.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointGeometry {
    pub pose: Pose,
    pub orientation_mode: PointOrientationMode,
}

/// How the engine is currently following an augmented image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageTrackingMethod {
    /// Image is in view and tracked from the camera feed.
    FullTracking,
    /// Image left the view; its last known pose is reported.
    LastKnownPose,
    NotTracking,
}

/// A recognized reference image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageGeometry {
    /// Center of the physical image; the image lies in the local XZ plane.
    pub center_pose: Pose,
    /// Physical width along local X (meters).
    pub extent_x: f32,
    /// Physical depth along local Z (meters).
    pub extent_z: f32,
    /// Index of the reference image in the database.
    pub database_index: i32,
    pub name: String,
    /// Identifier attached by cloud recognition, if any.
    pub metadata: Option<String>,
    pub tracking_method: ImageTrackingMethod,
}

/// Named 3D landmarks with per-landmark confidence (bodies, hands, faces).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LandmarkSet {
    pub points: Vec<Vector3<f32>>,
    pub confidence: Vec<f32>,
}

impl LandmarkSet {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Landmarks whose confidence meets `threshold`.
    pub fn confident(&self, threshold: f32) -> impl Iterator<Item = &Vector3<f32>> + '_ {
        self.points
            .iter()
            .zip(self.confidence.iter().chain(std::iter::repeat(&0.0)))
            .filter(move |(_, c)| **c >= threshold)
            .map(|(p, _)| p)
    }
}

/// A tracked face mesh anchored at the head center.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaceGeometry {
    pub center_pose: Pose,
    pub landmarks: LandmarkSet,
}

/// Variant-specific geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TrackableKind {
    Plane(PlaneGeometry),
    Point(PointGeometry),
    Image(ImageGeometry),
    Body(LandmarkSet),
    Hand(LandmarkSet),
    Face(FaceGeometry),
}

/// Read-only snapshot of an engine trackable for one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trackable {
    pub id: TrackableId,
    pub state: TrackingState,
    pub kind: TrackableKind,
}

impl Trackable {
    pub fn new(id: TrackableId, state: TrackingState, kind: TrackableKind) -> Self {
        Self { id, state, kind }
    }

    pub fn trackable_type(&self) -> TrackableType {
        match &self.kind {
            TrackableKind::Plane(_) => TrackableType::Plane,
            TrackableKind::Point(_) => TrackableType::Point,
            TrackableKind::Image(_) => TrackableType::Image,
            TrackableKind::Body(_) => TrackableType::Body,
            TrackableKind::Hand(_) => TrackableType::Hand,
            TrackableKind::Face(_) => TrackableType::Face,
        }
    }

    /// Pose an anchor for this trackable would be pinned at.
    ///
    /// Landmark-only variants have no single reference pose.
    pub fn reference_pose(&self) -> Option<Pose> {
        match &self.kind {
            TrackableKind::Plane(plane) => Some(plane.center_pose),
            TrackableKind::Point(point) => Some(point.pose),
            TrackableKind::Image(image) => Some(image.center_pose),
            TrackableKind::Face(face) => Some(face.center_pose),
            TrackableKind::Body(_) | TrackableKind::Hand(_) => None,
        }
    }

    pub fn as_image(&self) -> Option<&ImageGeometry> {
        match &self.kind {
            TrackableKind::Image(image) => Some(image),
            _ => None,
        }
    }

    pub fn as_plane(&self) -> Option<&PlaneGeometry> {
        match &self.kind {
            TrackableKind::Plane(plane) => Some(plane),
            _ => None,
        }
    }
}
