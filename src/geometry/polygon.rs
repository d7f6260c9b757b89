//! Planar polygon containment in a plane's local XZ frame.

use nalgebra::{Vector2, Vector3};

use super::Pose;

/// Even-odd ray casting test for a closed polygon.
///
/// Points exactly on an edge may land on either side.
pub fn contains_point(polygon: &[Vector2<f32>], p: &Vector2<f32>) -> bool {
    if polygon.len() < 3 {
        return false;
    }

    let mut inside = false;
    let mut j = polygon.len() - 1;
    for i in 0..polygon.len() {
        let a = polygon[i];
        let b = polygon[j];
        if (a.y > p.y) != (b.y > p.y) {
            let x_cross = (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x;
            if p.x < x_cross {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// Whether a world-space point lies inside a polygon given in the local
/// XZ coordinates of `center`. Elevation above the plane is ignored.
pub fn contains_world_point(center: &Pose, polygon: &[Vector2<f32>], world: &Vector3<f32>) -> bool {
    let local = center.inverse().transform_point(world);
    contains_point(polygon, &Vector2::new(local.x, local.z))
}

/// Signed distance from `point` to the plane through `plane` whose normal
/// is the plane's local +Y axis. Positive means in front of the surface.
pub fn signed_distance_to_plane(plane: &Pose, point: &Vector3<f32>) -> f32 {
    (point - plane.translation).dot(&plane.y_axis())
}
