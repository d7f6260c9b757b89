//! Mapping screen taps onto tracked geometry and placed objects.

pub mod resolver;
pub mod selection;

pub use resolver::{Candidate, HitTestResolver};
pub use selection::{pick, Selectable};
