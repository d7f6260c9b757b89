//! Pose: 6-DOF rigid transformation (rotation + translation).
//!
//! Poses reported by the tracking engine are expressed in world space and
//! map points from the local frame of the tracked entity into the world:
//!
//! ```text
//! p_world = R * p_local + t
//! ```
//!
//! Single precision is used throughout because every pose ends up in a
//! GL matrix or vertex buffer.

use nalgebra::{Matrix4, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

/// Rigid transform in world space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub rotation: UnitQuaternion<f32>,
    pub translation: Vector3<f32>,
}

impl Pose {
    /// Identity transformation (no rotation, no translation).
    pub fn identity() -> Self {
        Self {
            rotation: UnitQuaternion::identity(),
            translation: Vector3::zeros(),
        }
    }

    /// Pure translation with identity rotation.
    pub fn from_translation(x: f32, y: f32, z: f32) -> Self {
        Self {
            rotation: UnitQuaternion::identity(),
            translation: Vector3::new(x, y, z),
        }
    }

    pub fn tx(&self) -> f32 {
        self.translation.x
    }

    pub fn ty(&self) -> f32 {
        self.translation.y
    }

    pub fn tz(&self) -> f32 {
        self.translation.z
    }

    /// World-space direction of the local +X axis.
    pub fn x_axis(&self) -> Vector3<f32> {
        self.rotation * Vector3::x()
    }

    /// World-space direction of the local +Y axis.
    ///
    /// For planes this is the surface normal.
    pub fn y_axis(&self) -> Vector3<f32> {
        self.rotation * Vector3::y()
    }

    /// World-space direction of the local +Z axis.
    pub fn z_axis(&self) -> Vector3<f32> {
        self.rotation * Vector3::z()
    }

    /// Compose two poses: `self ∘ other`.
    ///
    /// The result applies `other` inside the frame of `self`:
    /// `[R1 | t1] ∘ [R2 | t2] = [R1*R2 | R1*t2 + t1]`.
    pub fn compose(&self, other: &Pose) -> Self {
        Self {
            rotation: self.rotation * other.rotation,
            translation: self.rotation * other.translation + self.translation,
        }
    }

    /// Inverse transformation: `[R^T | -R^T*t]`.
    pub fn inverse(&self) -> Self {
        let rot_inv = self.rotation.inverse();
        Self {
            rotation: rot_inv,
            translation: -(rot_inv * self.translation),
        }
    }

    /// Transform a single point from the local frame into world space.
    pub fn transform_point(&self, p: &Vector3<f32>) -> Vector3<f32> {
        self.rotation * p + self.translation
    }

    /// Homogeneous 4x4 matrix `[R | t; 0 0 0 1]`.
    pub fn to_matrix(&self) -> Matrix4<f32> {
        self.rotation
            .to_homogeneous()
            .append_translation(&self.translation)
    }

    /// Column-major 16-float layout expected by GL uniform uploads.
    pub fn to_column_major(&self) -> [f32; 16] {
        let mut out = [0.0; 16];
        out.copy_from_slice(self.to_matrix().as_slice());
        out
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self::identity()
    }
}
