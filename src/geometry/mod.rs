//! Geometry utilities: rigid poses, plane polygons, screen projection.

pub mod polygon;
pub mod pose;
pub mod projection;

pub use pose::Pose;
pub use projection::{ScreenPoint, Viewport};
