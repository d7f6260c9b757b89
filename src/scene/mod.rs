//! Renderable scene state derived from tracking: placed objects and image
//! outlines.

pub mod image_quad;
pub mod virtual_object;

pub use image_quad::ImageQuadProjector;
pub use virtual_object::{VirtualObject, VirtualObjectPool};
