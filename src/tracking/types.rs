//! Core ID types for engine-side entities.

use serde::{Deserialize, Serialize};

/// Stable identity of a trackable reported by the engine.
///
/// The engine keeps the same id for an entity across frames for as long as
/// it exists, so ids are lightweight handles for keying registries without
/// holding on to engine objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TrackableId(pub u64);

impl TrackableId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for TrackableId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "TR{}", self.0)
    }
}

/// Identity of an anchor pinned by the engine.
///
/// Anchor ids are assigned by the engine when an anchor is created and are
/// never reused within a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AnchorId(pub u64);

impl AnchorId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for AnchorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AN{}", self.0)
    }
}
