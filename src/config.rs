//! Pipeline configuration.
//!
//! Every field has a default, so a config file only needs the keys it
//! overrides:
//!
//! ```yaml
//! capabilities:
//!   mode: image
//!   image_only: true
//! object_pool_capacity: 8
//! ```

use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use crate::engine::Capabilities;
use crate::input::DEFAULT_GESTURE_CAPACITY;
use crate::scene::virtual_object::DEFAULT_POOL_CAPACITY;
use crate::tracking::AnchorPolicy;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub capabilities: Capabilities,
    /// Pending gestures held between UI and render thread.
    pub gesture_capacity: usize,
    /// Placed objects kept alive before the oldest is evicted.
    pub object_pool_capacity: usize,
    pub object_scale: f32,
    pub near_clip: f32,
    pub far_clip: f32,
    /// Whether newly tracked images get an anchor at their center.
    pub image_anchors: AnchorPolicy,
    /// Object yaw per scrolled pixel (radians).
    pub rotation_per_pixel: f32,
    /// Target render tick interval in milliseconds.
    pub frame_interval_ms: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            capabilities: Capabilities::default(),
            gesture_capacity: DEFAULT_GESTURE_CAPACITY,
            object_pool_capacity: DEFAULT_POOL_CAPACITY,
            object_scale: 1.0,
            near_clip: 0.1,
            far_clip: 100.0,
            image_anchors: AnchorPolicy::AtReferencePose,
            rotation_per_pixel: 0.01,
            frame_interval_ms: 33,
        }
    }
}

impl PipelineConfig {
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(text).context("Failed to parse pipeline config")?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("Failed to open {:?}", path))?;
        let config: Self = serde_yaml::from_reader(file)
            .with_context(|| format!("Failed to parse {:?}", path))?;
        config.validate()?;
        Ok(config)
    }

    /// Anchor policy for image entries. Image-only sessions have no world
    /// tracking to anchor against.
    pub fn image_anchor_policy(&self) -> AnchorPolicy {
        if self.capabilities.image_only {
            AnchorPolicy::Never
        } else {
            self.image_anchors
        }
    }

    fn validate(&self) -> Result<()> {
        if !(self.near_clip > 0.0 && self.near_clip < self.far_clip) {
            bail!(
                "Invalid clip range: near {} must be positive and below far {}",
                self.near_clip,
                self.far_clip
            );
        }
        if !(self.object_scale > 0.0) {
            bail!("Object scale must be positive, got {}", self.object_scale);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::TrackingMode;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.gesture_capacity, 2);
        assert_eq!(config.object_pool_capacity, 16);
        assert_eq!(config.near_clip, 0.1);
        assert_eq!(config.far_clip, 100.0);
        assert_eq!(config.capabilities.mode, TrackingMode::World);
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = PipelineConfig::from_yaml_str(
            "capabilities:\n  mode: image\n  image_only: true\nobject_pool_capacity: 4\n",
        )
        .unwrap();

        assert_eq!(config.capabilities.mode, TrackingMode::Image);
        assert_eq!(config.object_pool_capacity, 4);
        assert_eq!(config.gesture_capacity, 2);
        assert_eq!(config.image_anchor_policy(), AnchorPolicy::Never);
    }

    #[test]
    fn test_rejects_inverted_clip_range() {
        let err = PipelineConfig::from_yaml_str("near_clip: 10.0\nfar_clip: 1.0\n").unwrap_err();
        assert!(err.to_string().contains("clip"));
    }

    #[test]
    fn test_load_missing_file_reports_path() {
        let err = PipelineConfig::load(Path::new("/nonexistent/pipeline.yaml")).unwrap_err();
        assert!(err.to_string().contains("pipeline.yaml"));
    }
}
