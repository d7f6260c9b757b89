//! Trackable registry: per-frame reconciliation of engine trackables
//! against application-side entries and anchors.
//!
//! # Policy
//! For each trackable the engine reports as *updated* this frame:
//! - **Tracking, unseen**: create an entry; pin an anchor at the
//!   trackable's reference pose if the [`AnchorPolicy`] asks for one.
//! - **Tracking, known**: refresh the stored snapshot (anchor kept).
//! - **Paused**: no change.
//! - **Stopped**: detach the anchor and remove the entry.
//!
//! An entry therefore exists iff the latest observed state of its
//! trackable is Tracking, or it was Tracking and has only paused since.
//!
//! Images also carry an optional recognition label; a label differing from
//! the last one seen is reported once, at most once per frame.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::engine::{EngineSession, FrameSnapshot};

use super::anchor::Anchor;
use super::state::TrackingState;
use super::trackable::{Trackable, TrackableType};
use super::types::TrackableId;

/// Whether entries of a registry get a persistent anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnchorPolicy {
    Never,
    /// Pin an anchor at the trackable's reference pose on first Tracking.
    AtReferencePose,
}

/// Application-side state for one trackable.
#[derive(Debug)]
pub struct RegistryEntry {
    pub trackable: Trackable,
    anchor: Option<Anchor>,
    /// Frame index of the last refresh.
    pub last_refreshed: u64,
}

impl RegistryEntry {
    pub fn anchor(&self) -> Option<&Anchor> {
        self.anchor.as_ref()
    }
}

/// What one reconciliation pass changed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReconcileReport {
    pub created: Vec<TrackableId>,
    pub refreshed: usize,
    /// Entries removed because their trackable stopped. Any UI state keyed
    /// by these ids is stale.
    pub removed: Vec<TrackableId>,
    /// New recognition label, if one appeared this frame.
    pub label: Option<String>,
}

impl ReconcileReport {
    pub fn is_empty(&self) -> bool {
        self.created.is_empty()
            && self.refreshed == 0
            && self.removed.is_empty()
            && self.label.is_none()
    }
}

/// Registry for one trackable variant.
#[derive(Debug)]
pub struct TrackableRegistry {
    kind: TrackableType,
    policy: AnchorPolicy,
    entries: HashMap<TrackableId, RegistryEntry>,
    last_label: Option<String>,
    frame_index: u64,
}

impl TrackableRegistry {
    pub fn new(kind: TrackableType, policy: AnchorPolicy) -> Self {
        Self {
            kind,
            policy,
            entries: HashMap::new(),
            last_label: None,
            frame_index: 0,
        }
    }

    pub fn kind(&self) -> TrackableType {
        self.kind
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: TrackableId) -> Option<&RegistryEntry> {
        self.entries.get(&id)
    }

    pub fn contains(&self, id: TrackableId) -> bool {
        self.entries.contains_key(&id)
    }

    /// Entries in ascending id order.
    pub fn entries(&self) -> Vec<&RegistryEntry> {
        let mut entries: Vec<&RegistryEntry> = self.entries.values().collect();
        entries.sort_by_key(|e| e.trackable.id);
        entries
    }

    /// Reconcile this frame's updated trackables of the registry's variant.
    pub fn reconcile(
        &mut self,
        frame: &FrameSnapshot,
        session: &mut dyn EngineSession,
    ) -> ReconcileReport {
        self.frame_index += 1;
        let mut report = ReconcileReport::default();

        for trackable in frame.updated_trackables(self.kind) {
            match trackable.state {
                TrackingState::Tracking => {
                    self.track(trackable, session, &mut report);
                    self.observe_label(trackable, &mut report);
                }
                TrackingState::Paused => {}
                TrackingState::Stopped => {
                    if let Some(entry) = self.entries.remove(&trackable.id) {
                        if let Some(anchor) = entry.anchor {
                            session.detach_anchor(anchor);
                        }
                        debug!(id = %trackable.id, kind = ?self.kind, "registry entry removed");
                        report.removed.push(trackable.id);
                    }
                }
            }
        }
        report
    }

    fn track(
        &mut self,
        trackable: &Trackable,
        session: &mut dyn EngineSession,
        report: &mut ReconcileReport,
    ) {
        if let Some(entry) = self.entries.get_mut(&trackable.id) {
            entry.trackable = trackable.clone();
            entry.last_refreshed = self.frame_index;
            report.refreshed += 1;
            return;
        }

        let anchor = match (self.policy, trackable.reference_pose()) {
            (AnchorPolicy::AtReferencePose, Some(pose)) => match session.create_anchor(&pose) {
                Ok(anchor) => Some(anchor),
                Err(err) => {
                    warn!(id = %trackable.id, error = %err, "could not anchor trackable");
                    None
                }
            },
            _ => None,
        };

        debug!(
            id = %trackable.id,
            kind = ?self.kind,
            anchored = anchor.is_some(),
            "registry entry created"
        );
        self.entries.insert(
            trackable.id,
            RegistryEntry {
                trackable: trackable.clone(),
                anchor,
                last_refreshed: self.frame_index,
            },
        );
        report.created.push(trackable.id);
    }

    fn observe_label(&mut self, trackable: &Trackable, report: &mut ReconcileReport) {
        if report.label.is_some() {
            return;
        }
        let Some(label) = trackable.as_image().and_then(|image| image.metadata.as_ref()) else {
            return;
        };
        if self.last_label.as_ref() == Some(label) {
            return;
        }
        self.last_label = Some(label.clone());
        report.label = Some(label.clone());
    }

    /// Detach every anchor and drop all entries.
    pub fn clear(&mut self, session: &mut dyn EngineSession) {
        for (_, entry) in self.entries.drain() {
            if let Some(anchor) = entry.anchor {
                session.detach_anchor(anchor);
            }
        }
        self.last_label = None;
    }

    /// Drop all entries without talking to the engine.
    ///
    /// Used when the session that owned the anchors is already gone.
    pub fn forget(&mut self) {
        self.entries.clear();
        self.last_label = None;
    }
}
