//! Double-tap selection against the on-screen footprint of placed objects.

use nalgebra::Vector3;

use crate::engine::Camera;
use crate::geometry::projection::ScreenRect;
use crate::geometry::{Pose, ScreenPoint};

/// A selectable object: its world pose and half-size of its bounding cube.
#[derive(Debug, Clone, Copy)]
pub struct Selectable {
    pub pose: Pose,
    pub half_extent: f32,
}

/// Screen rectangle covering the projected bounding cube, if any corner is
/// in front of the camera.
pub fn projected_bounds(
    camera: &Camera,
    near: f32,
    far: f32,
    target: &Selectable,
) -> Option<ScreenRect> {
    let view_proj = camera.projection_matrix(near, far) * camera.view_matrix();
    let h = target.half_extent;
    let corners = [-h, h].into_iter().flat_map(|x| {
        [-h, h]
            .into_iter()
            .flat_map(move |y| [-h, h].into_iter().map(move |z| Vector3::new(x, y, z)))
    });
    ScreenRect::enclosing(corners.filter_map(|local| {
        let world = target.pose.transform_point(&local);
        camera.viewport.project(&view_proj, &world)
    }))
}

/// Index of the object under `tap`, nearest to the camera when several
/// overlap.
pub fn pick(
    camera: &Camera,
    near: f32,
    far: f32,
    tap: ScreenPoint,
    targets: impl IntoIterator<Item = Selectable>,
) -> Option<usize> {
    let cam_pos = camera.pose.translation;
    targets
        .into_iter()
        .enumerate()
        .filter(|(_, target)| {
            projected_bounds(camera, near, far, target).is_some_and(|rect| rect.contains(&tap))
        })
        .map(|(i, target)| (i, (target.pose.translation - cam_pos).norm_squared()))
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(i, _)| i)
}
