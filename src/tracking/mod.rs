//! Tracking data: trackables reported by the engine, anchors pinned in the
//! world, and the per-frame registry reconciling the two.
//!
//! - [`trackable`] - sum type over planes, points, images, bodies, hands, faces
//! - [`anchor`] - move-only anchor handles
//! - [`registry`] - per-frame reconciliation of updated trackables

pub mod anchor;
pub mod registry;
pub mod state;
pub mod trackable;
pub mod types;

pub use anchor::{Anchor, AnchorUpdate};
pub use registry::{AnchorPolicy, ReconcileReport, RegistryEntry, TrackableRegistry};
pub use state::TrackingState;
pub use trackable::{Trackable, TrackableKind, TrackableType};
pub use types::{AnchorId, TrackableId};
