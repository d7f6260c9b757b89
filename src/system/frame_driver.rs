//! Render-thread frame loop.
//!
//! Each tick pulls one frame while holding the session, reconciles the
//! registries, consumes at most one gesture, and packs what the renderer
//! needs. Faults inside a tick are logged and the frame is skipped.

use std::f32::consts::PI;

use nalgebra::Matrix4;
use tracing::{debug, trace, warn};

use crate::config::PipelineConfig;
use crate::engine::{Camera, Capabilities, EngineSession, FrameSnapshot};
use crate::geometry::Viewport;
use crate::hit_test::HitTestResolver;
use crate::input::{GestureEvent, GestureReceiver};
use crate::scene::{ImageQuadProjector, VirtualObjectPool};
use crate::tracking::{AnchorPolicy, TrackableId, TrackableRegistry, TrackableType, TrackingState};

use super::error::FrameError;
use super::lifecycle::{ActiveFrame, FrameAccess};
use super::messages::{UiEvent, UiSender};

/// Draw data for one placed object.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectDraw {
    pub model: [f32; 16],
    pub color: [f32; 4],
    pub selected: bool,
}

/// Outline of one tracked image, packed `[x, y, z, 1]` per corner.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageOutline {
    pub id: TrackableId,
    pub vertices: Vec<f32>,
}

/// Everything the renderer needs for one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameOutput {
    pub timestamp_ns: i64,
    pub camera_tracking: TrackingState,
    pub view: [f32; 16],
    pub projection: [f32; 16],
    pub objects: Vec<ObjectDraw>,
    pub image_outlines: Vec<ImageOutline>,
    /// Registry entries across all followed variants.
    pub tracked: usize,
}

fn column_major(m: &Matrix4<f32>) -> [f32; 16] {
    let mut out = [0.0; 16];
    out.copy_from_slice(m.as_slice());
    out
}

/// Per-generation tracking and scene state.
struct FrameState {
    capabilities: Capabilities,
    registries: Vec<TrackableRegistry>,
    objects: VirtualObjectPool,
    resolver: HitTestResolver,
    projector: ImageQuadProjector,
    near_clip: f32,
    far_clip: f32,
    rotation_per_pixel: f32,
    /// Whether the searching hint is currently shown. `None` until the
    /// first frame of a generation decides.
    searching: Option<bool>,
}

impl FrameState {
    fn new(config: &PipelineConfig) -> Self {
        let registries = config
            .capabilities
            .followed_types()
            .iter()
            .map(|&kind| {
                let policy = match kind {
                    TrackableType::Image => config.image_anchor_policy(),
                    _ => AnchorPolicy::Never,
                };
                TrackableRegistry::new(kind, policy)
            })
            .collect();

        Self {
            capabilities: config.capabilities.clone(),
            registries,
            objects: VirtualObjectPool::new(config.object_pool_capacity, config.object_scale),
            resolver: HitTestResolver::new(),
            projector: ImageQuadProjector::new(),
            near_clip: config.near_clip,
            far_clip: config.far_clip,
            rotation_per_pixel: config.rotation_per_pixel,
            searching: None,
        }
    }

    /// Drop all handles from a previous session without touching the engine.
    fn forget(&mut self) {
        for registry in &mut self.registries {
            registry.forget();
        }
        self.objects.forget();
        self.searching = None;
    }

    fn process(
        &mut self,
        frame: &FrameSnapshot,
        session: &mut dyn EngineSession,
        gesture: Option<GestureEvent>,
        ui: &UiSender,
    ) -> Result<FrameOutput, FrameError> {
        let camera = &frame.camera;
        let pose_finite = camera.pose.translation.iter().all(|v| v.is_finite())
            && camera.pose.rotation.coords.iter().all(|v| v.is_finite());
        if !pose_finite {
            return Err(FrameError::Malformed("non-finite camera pose".into()));
        }
        self.check_projection(camera)?;

        self.objects.sync(frame, session);

        for registry in &mut self.registries {
            let report = registry.reconcile(frame, session);
            if let Some(label) = report.label {
                ui.post(UiEvent::LabelRecognized(label));
            }
            for id in report.removed {
                ui.post(UiEvent::TrackableLost(id));
            }
        }
        self.update_searching(ui);

        if let Some(gesture) = gesture {
            if camera.tracking_state.is_tracking() {
                self.handle_gesture(gesture, frame, session, ui);
            } else {
                debug!(?gesture, "camera not tracking, gesture discarded");
            }
        }

        Ok(self.pack(frame))
    }

    /// Reject inputs the perspective projection cannot be built from.
    fn check_projection(&self, camera: &Camera) -> Result<(), FrameError> {
        let viewport = camera.viewport;
        if viewport.width == 0 || viewport.height == 0 || viewport.aspect() <= f32::EPSILON {
            return Err(FrameError::Malformed(format!(
                "degenerate viewport {}x{}",
                viewport.width, viewport.height
            )));
        }
        if !(camera.fov_y.is_finite() && camera.fov_y > 0.0 && camera.fov_y < PI) {
            return Err(FrameError::Malformed(format!("invalid fov {}", camera.fov_y)));
        }
        let clips_valid = self.near_clip.is_finite()
            && self.far_clip.is_finite()
            && self.near_clip > 0.0
            && self.far_clip - self.near_clip > f32::EPSILON;
        if !clips_valid {
            return Err(FrameError::Malformed(format!(
                "invalid clip range {}..{}",
                self.near_clip, self.far_clip
            )));
        }
        Ok(())
    }

    fn update_searching(&mut self, ui: &UiSender) {
        let searching = self.registries.iter().all(|r| r.is_empty());
        if self.searching == Some(searching) {
            return;
        }
        if searching {
            ui.post(UiEvent::Searching(self.capabilities.mode));
        } else if self.searching.is_some() {
            ui.post(UiEvent::SearchingDone);
        }
        self.searching = Some(searching);
    }

    fn handle_gesture(
        &mut self,
        gesture: GestureEvent,
        frame: &FrameSnapshot,
        session: &mut dyn EngineSession,
        ui: &UiSender,
    ) {
        match gesture {
            GestureEvent::SingleTap(point) => {
                if !self.capabilities.supports_placement() {
                    trace!("placement disabled in this mode");
                    return;
                }
                let Some(hit) = self.resolver.resolve(frame, point) else {
                    debug!(?point, "tap hit nothing placeable");
                    return;
                };
                match self.objects.place(&hit, session) {
                    Ok(()) => ui.post(UiEvent::ObjectPlaced {
                        count: self.objects.len(),
                    }),
                    Err(err) => warn!(error = %err, "anchor creation failed"),
                }
            }
            GestureEvent::DoubleTap(point) => {
                if let Some(index) =
                    self.objects
                        .select_at(&frame.camera, self.near_clip, self.far_clip, point)
                {
                    ui.post(UiEvent::SelectionChanged(index));
                }
            }
            GestureEvent::Scroll { dx, .. } => {
                self.objects.rotate_selected(dx * self.rotation_per_pixel);
            }
        }
    }

    fn pack(&mut self, frame: &FrameSnapshot) -> FrameOutput {
        let camera = &frame.camera;
        let objects = self
            .objects
            .iter()
            .filter(|o| o.is_visible())
            .map(|o| ObjectDraw {
                model: column_major(&o.model_matrix()),
                color: o.color,
                selected: o.selected,
            })
            .collect();

        let mut image_outlines = Vec::new();
        for registry in &self.registries {
            for entry in registry.entries() {
                if entry.trackable.state != TrackingState::Tracking {
                    continue;
                }
                if let Some(image) = entry.trackable.as_image() {
                    image_outlines.push(ImageOutline {
                        id: entry.trackable.id,
                        vertices: self.projector.project(image).to_vec(),
                    });
                }
            }
        }

        FrameOutput {
            timestamp_ns: frame.timestamp_ns,
            camera_tracking: camera.tracking_state,
            view: camera.pose.inverse().to_column_major(),
            projection: column_major(&camera.projection_matrix(self.near_clip, self.far_clip)),
            objects,
            image_outlines,
            tracked: self.registries.iter().map(|r| r.len()).sum(),
        }
    }
}

/// Owns render-thread state and runs one tick per draw callback.
pub struct FrameDriver {
    access: FrameAccess,
    gestures: GestureReceiver,
    ui: UiSender,
    state: FrameState,
    generation: Option<u64>,
    faults: u64,
}

impl FrameDriver {
    pub fn new(
        access: FrameAccess,
        gestures: GestureReceiver,
        ui: UiSender,
        config: &PipelineConfig,
    ) -> Self {
        Self {
            access,
            gestures,
            ui,
            state: FrameState::new(config),
            generation: None,
            faults: 0,
        }
    }

    pub fn on_surface_created(&mut self, camera_texture: u32) {
        self.access.set_camera_texture(camera_texture);
    }

    pub fn on_surface_changed(&mut self, width: u32, height: u32) {
        self.access.set_viewport(Viewport::new(width, height));
    }

    /// Run one tick. `None` when there is nothing to draw: no resumed
    /// session, or the tick faulted.
    pub fn on_draw_frame(&mut self) -> Option<FrameOutput> {
        let mut active: ActiveFrame<'_> = match self.access.tick() {
            Ok(Some(active)) => active,
            Ok(None) => return None,
            Err(err) => {
                self.faults += 1;
                warn!(error = %err, faults = self.faults, "frame skipped");
                return None;
            }
        };

        if self.generation != Some(active.generation()) {
            if self.generation.is_some() {
                debug!(generation = active.generation(), "new session, dropping stale handles");
            }
            self.state.forget();
            self.generation = Some(active.generation());
        }

        let gesture = self.gestures.dequeue();
        let (frame, session) = active.split();
        match self.state.process(frame, session, gesture, &self.ui) {
            Ok(output) => Some(output),
            Err(err) => {
                self.faults += 1;
                warn!(error = %err, faults = self.faults, "frame skipped");
                None
            }
        }
    }

    /// Ticks skipped because of faults.
    pub fn faults(&self) -> u64 {
        self.faults
    }

    /// Placed objects currently alive.
    pub fn object_count(&self) -> usize {
        self.state.objects.len()
    }

    pub fn selected_object(&self) -> Option<usize> {
        self.state.objects.selected_index()
    }

    /// Entries held for a variant.
    pub fn tracked(&self, kind: TrackableType) -> usize {
        self.state
            .registries
            .iter()
            .filter(|r| r.kind() == kind)
            .map(|r| r.len())
            .sum()
    }
}
