//! Session configuration handed to the engine.
//!
//! The engine treats this as an opaque request; the pipeline only looks at
//! the mode to decide which trackables to follow.

use serde::{Deserialize, Serialize};

use crate::tracking::TrackableType;

/// Which tracking pipeline the engine runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackingMode {
    /// Rear camera, planes and feature points, tap-to-place.
    World,
    Body,
    Hand,
    /// Front camera face mesh.
    Face,
    /// Local augmented-image database.
    Image,
    /// Image recognition backed by a cloud service.
    Cloud,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaneFindingMode {
    Disabled,
    Horizontal,
    Vertical,
    HorizontalAndVertical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FocusMode {
    Fixed,
    Auto,
}

/// Capability request for a new session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Capabilities {
    pub mode: TrackingMode,
    pub plane_finding: PlaneFindingMode,
    pub focus: FocusMode,
    pub light_estimation: bool,
    /// Track images without world tracking (no 6-DoF anchors).
    pub image_only: bool,
    /// Opaque augmented-image database blob.
    #[serde(skip)]
    pub image_database: Option<Vec<u8>>,
    /// Opaque cloud-recognition credentials.
    pub cloud_auth: Option<String>,
}

impl Capabilities {
    pub fn world() -> Self {
        Self::default()
    }

    pub fn for_mode(mode: TrackingMode) -> Self {
        let plane_finding = match mode {
            TrackingMode::World => PlaneFindingMode::HorizontalAndVertical,
            _ => PlaneFindingMode::Disabled,
        };
        Self {
            mode,
            plane_finding,
            ..Self::default()
        }
    }

    /// Trackable variants the frame loop follows in this mode.
    pub fn followed_types(&self) -> &'static [TrackableType] {
        match self.mode {
            TrackingMode::World => &[TrackableType::Plane],
            TrackingMode::Body => &[TrackableType::Body],
            TrackingMode::Hand => &[TrackableType::Hand],
            TrackingMode::Face => &[TrackableType::Face],
            TrackingMode::Image | TrackingMode::Cloud => &[TrackableType::Image],
        }
    }

    /// Whether taps place virtual objects via hit testing.
    pub fn supports_placement(&self) -> bool {
        self.mode == TrackingMode::World
    }
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            mode: TrackingMode::World,
            plane_finding: PlaneFindingMode::HorizontalAndVertical,
            focus: FocusMode::Auto,
            light_estimation: true,
            image_only: false,
            image_database: None,
            cloud_auth: None,
        }
    }
}
