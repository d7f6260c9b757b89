//! Screen-space projection.
//!
//! Screen coordinates follow the touch convention: origin top-left,
//! X to the right, Y down, in pixels.

use nalgebra::{Matrix4, Vector3, Vector4};
use serde::{Deserialize, Serialize};

/// A touch location in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScreenPoint {
    pub x: f32,
    pub y: f32,
}

impl ScreenPoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Pixel size of the render surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Width over height; 1.0 while either side is zero.
    pub fn aspect(&self) -> f32 {
        if self.width == 0 || self.height == 0 {
            1.0
        } else {
            self.width as f32 / self.height as f32
        }
    }

    /// Project a world point through `view_proj` into pixel coordinates.
    ///
    /// Returns `None` for points at or behind the camera plane.
    pub fn project(&self, view_proj: &Matrix4<f32>, world: &Vector3<f32>) -> Option<ScreenPoint> {
        let clip: Vector4<f32> = view_proj * world.push(1.0);
        if clip.w <= f32::EPSILON {
            return None;
        }
        let ndc_x = clip.x / clip.w;
        let ndc_y = clip.y / clip.w;
        Some(ScreenPoint {
            x: (ndc_x + 1.0) * 0.5 * self.width as f32,
            y: (1.0 - ndc_y) * 0.5 * self.height as f32,
        })
    }
}

/// Axis-aligned rectangle in pixel space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenRect {
    pub min: ScreenPoint,
    pub max: ScreenPoint,
}

impl ScreenRect {
    /// Smallest rectangle enclosing all `points`, or `None` if empty.
    pub fn enclosing(points: impl IntoIterator<Item = ScreenPoint>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let mut rect = Self {
            min: first,
            max: first,
        };
        for p in iter {
            rect.min.x = rect.min.x.min(p.x);
            rect.min.y = rect.min.y.min(p.y);
            rect.max.x = rect.max.x.max(p.x);
            rect.max.y = rect.max.y.max(p.y);
        }
        Some(rect)
    }

    pub fn contains(&self, p: &ScreenPoint) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Perspective3;

    #[test]
    fn test_point_on_optical_axis_projects_to_center() {
        let viewport = Viewport::new(1080, 1920);
        let proj = Perspective3::new(viewport.aspect(), 1.0, 0.1, 100.0).to_homogeneous();

        let p = viewport
            .project(&proj, &Vector3::new(0.0, 0.0, -2.0))
            .expect("in front of camera");

        assert_relative_eq!(p.x, 540.0, epsilon = 1e-3);
        assert_relative_eq!(p.y, 960.0, epsilon = 1e-3);
    }

    #[test]
    fn test_empty_viewport_has_unit_aspect() {
        assert_eq!(Viewport::new(0, 1920).aspect(), 1.0);
        assert_eq!(Viewport::new(1080, 0).aspect(), 1.0);
        assert_eq!(Viewport::default().aspect(), 1.0);
    }

    #[test]
    fn test_point_behind_camera_is_rejected() {
        let viewport = Viewport::new(640, 480);
        let proj = Perspective3::new(viewport.aspect(), 1.0, 0.1, 100.0).to_homogeneous();

        assert!(viewport.project(&proj, &Vector3::new(0.0, 0.0, 2.0)).is_none());
    }

    #[test]
    fn test_up_is_smaller_screen_y() {
        let viewport = Viewport::new(640, 480);
        let proj = Perspective3::new(viewport.aspect(), 1.0, 0.1, 100.0).to_homogeneous();

        let p = viewport
            .project(&proj, &Vector3::new(0.0, 0.5, -2.0))
            .expect("in front of camera");
        assert!(p.y < 240.0);
    }

    #[test]
    fn test_enclosing_rect() {
        let rect = ScreenRect::enclosing([
            ScreenPoint::new(10.0, 40.0),
            ScreenPoint::new(30.0, 5.0),
            ScreenPoint::new(20.0, 20.0),
        ])
        .expect("non-empty");

        assert!(rect.contains(&ScreenPoint::new(15.0, 10.0)));
        assert!(!rect.contains(&ScreenPoint::new(35.0, 10.0)));
        assert!(ScreenRect::enclosing(Vec::new()).is_none());
    }
}
