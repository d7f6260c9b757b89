//! Outline geometry for a tracked augmented image.
//!
//! Corners are fixed fractions of the image's physical extents in its local
//! XZ plane. The depth pair is inset so the outline sits slightly inside the
//! printed image. Each corner is a zero-elevation offset composed onto the
//! right of the center pose, so the outline follows the image's rotation.

use crate::geometry::Pose;
use crate::tracking::trackable::ImageGeometry;

/// (x, z) fractions of (extent_x, extent_z) for each corner, in winding order.
const CORNER_COEFFICIENTS: [[f32; 2]; 4] = [
    [-0.5, -0.45],
    [0.5, -0.45],
    [0.5, 0.45],
    [-0.5, 0.45],
];

/// Floats per packed vertex (homogeneous x, y, z, w).
pub const COMPONENTS_PER_VERTEX: usize = 4;

/// Two triangles covering the quad, indexing into the packed corners.
pub const QUAD_TRIANGLE_INDICES: [u16; 6] = [0, 1, 2, 0, 2, 3];

/// Recomputes an image outline every frame into a reusable buffer.
#[derive(Debug, Default)]
pub struct ImageQuadProjector {
    buffer: Vec<f32>,
}

impl ImageQuadProjector {
    pub fn new() -> Self {
        Self { buffer: Vec::new() }
    }

    /// Number of corners produced per image.
    pub fn corner_count(&self) -> usize {
        CORNER_COEFFICIENTS.len()
    }

    /// Current size of the backing buffer in floats.
    pub fn buffer_len(&self) -> usize {
        self.buffer.len()
    }

    /// World-space corner poses for an image.
    pub fn corners(center: &Pose, extent_x: f32, extent_z: f32) -> [Pose; 4] {
        CORNER_COEFFICIENTS.map(|[cx, cz]| {
            let local = Pose::from_translation(cx * extent_x, 0.0, cz * extent_z);
            center.compose(&local)
        })
    }

    /// Pack the outline of `image` as `[x, y, z, 1]` per corner.
    pub fn project(&mut self, image: &ImageGeometry) -> &[f32] {
        self.project_pose(&image.center_pose, image.extent_x, image.extent_z)
    }

    pub fn project_pose(&mut self, center: &Pose, extent_x: f32, extent_z: f32) -> &[f32] {
        let needed = CORNER_COEFFICIENTS.len() * COMPONENTS_PER_VERTEX;
        self.ensure_capacity(needed);

        for (i, corner) in Self::corners(center, extent_x, extent_z).iter().enumerate() {
            let base = i * COMPONENTS_PER_VERTEX;
            self.buffer[base] = corner.tx();
            self.buffer[base + 1] = corner.ty();
            self.buffer[base + 2] = corner.tz();
            self.buffer[base + 3] = 1.0;
        }
        &self.buffer[..needed]
    }

    fn ensure_capacity(&mut self, needed: usize) {
        if self.buffer.len() >= needed {
            return;
        }
        let mut len = self.buffer.len().max(1);
        while len < needed {
            len *= 2;
        }
        self.buffer.resize(len, 0.0);
    }
}
