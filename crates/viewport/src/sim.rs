//! In-process renderer used by tests and the replay tool.
//!
//! `SimRenderer` implements [`MapRenderer`] over a flat Web Mercator
//! camera, records every mutating call in order, and lets the driver decide
//! when animations end and when the popup content node becomes available.

use std::collections::BTreeMap;

use foundation::geo::{LngLat, mercator_px};
use foundation::ids::PopupId;
use foundation::screen::{Padding, ScreenPoint, ScreenSize};
use serde::Serialize;

use crate::config::StyleManifest;
use crate::marker::Marker;
use crate::renderer::{
    Anchor, CameraOptions, CameraState, LayerSpec, MapRenderer, RendererError, SourceSpec,
    TransitionTag,
};

/// A mutating renderer call, in the order it was made.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "call", content = "args", rename_all = "snake_case")]
pub enum SimCall {
    AddSource(String),
    AddLayer(String),
    SetSourceData { source: String, features: usize },
    EaseTo(CameraOptions),
    CreatePopup(PopupId),
    SetPopupPosition(PopupId, LngLat),
    SetPopupAnchor(PopupId, Anchor),
    SetPopupVisible(PopupId, bool),
    RemovePopup(PopupId),
}

#[derive(Debug, Clone, PartialEq)]
struct SimPopup {
    position: Option<LngLat>,
    anchor: Option<Anchor>,
    visible: bool,
}

#[derive(Debug)]
pub struct SimRenderer {
    style_loaded: bool,
    sources: BTreeMap<String, usize>,
    layers: Vec<String>,
    camera: CameraState,
    animation: Option<CameraOptions>,
    popups: BTreeMap<PopupId, SimPopup>,
    next_popup: u32,
    popup_node_ready: bool,
    popup_size: ScreenSize,
    fail_next_add_layer: bool,
    calls: Vec<SimCall>,
}

impl Default for SimRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl SimRenderer {
    /// A 400x800 portrait viewport over Rotterdam at zoom 12, style loaded.
    pub fn new() -> Self {
        Self::with_viewport(ScreenSize::new(400.0, 800.0))
    }

    pub fn with_viewport(viewport: ScreenSize) -> Self {
        Self {
            style_loaded: true,
            sources: BTreeMap::new(),
            layers: Vec::new(),
            camera: CameraState {
                center: LngLat::new(4.47, 51.92),
                zoom: 12.0,
                bearing: 0.0,
                pitch: 0.0,
                viewport,
                padding: Padding::default(),
                is_moving: false,
            },
            animation: None,
            popups: BTreeMap::new(),
            next_popup: 0,
            popup_node_ready: true,
            popup_size: ScreenSize::new(220.0, 120.0),
            fail_next_add_layer: false,
            calls: Vec::new(),
        }
    }

    pub fn calls(&self) -> &[SimCall] {
        &self.calls
    }

    pub fn take_calls(&mut self) -> Vec<SimCall> {
        std::mem::take(&mut self.calls)
    }

    pub fn set_style_loaded(&mut self, loaded: bool) {
        self.style_loaded = loaded;
    }

    /// Simulates a style swap: every source and layer is gone.
    pub fn reload_style(&mut self) {
        self.sources.clear();
        self.layers.clear();
    }

    pub fn fail_next_add_layer(&mut self) {
        self.fail_next_add_layer = true;
    }

    pub fn has_all(&self, manifest: &StyleManifest) -> bool {
        manifest.sources.iter().all(|s| self.sources.contains_key(&s.id))
            && manifest.layers.iter().all(|l| self.layers.contains(&l.id))
    }

    /// Number of features last pushed into `source_id`.
    pub fn source_len(&self, source_id: &str) -> Option<usize> {
        self.sources.get(source_id).copied()
    }

    pub fn jump_to(&mut self, center: LngLat, zoom: f64) {
        self.camera.center = center;
        self.camera.zoom = zoom;
    }

    pub fn set_orientation(&mut self, bearing: f64, pitch: f64) {
        self.camera.bearing = bearing;
        self.camera.pitch = pitch;
    }

    /// Marks the camera as moving under a user gesture.
    pub fn set_moving(&mut self, moving: bool) {
        self.camera.is_moving = moving;
    }

    pub fn animation(&self) -> Option<&CameraOptions> {
        self.animation.as_ref()
    }

    /// Completes the running animation and returns the tag its
    /// movement-ended event carries.
    pub fn finish_animation(&mut self) -> Option<TransitionTag> {
        let options = self.animation.take()?;
        self.camera.center = options.center;
        self.camera.zoom = options.zoom;
        self.camera.bearing = options.bearing;
        self.camera.pitch = options.pitch;
        self.camera.padding = options.padding;
        self.camera.is_moving = false;
        Some(options.tag)
    }

    pub fn set_popup_node_ready(&mut self, ready: bool) {
        self.popup_node_ready = ready;
    }

    pub fn set_popup_size(&mut self, size: ScreenSize) {
        self.popup_size = size;
    }

    pub fn popups_created(&self) -> u32 {
        self.next_popup
    }

    pub fn popups_alive(&self) -> usize {
        self.popups.len()
    }

    pub fn popup_visible(&self) -> bool {
        self.popups.values().any(|p| p.visible)
    }

    pub fn popup_anchor(&self) -> Option<Anchor> {
        self.popups.values().find_map(|p| p.anchor)
    }

    pub fn popup_position(&self) -> Option<LngLat> {
        self.popups.values().find_map(|p| p.position)
    }
}

impl MapRenderer for SimRenderer {
    fn is_style_loaded(&self) -> bool {
        self.style_loaded
    }

    fn has_source(&self, id: &str) -> bool {
        self.sources.contains_key(id)
    }

    fn add_source(&mut self, source: &SourceSpec) -> Result<(), RendererError> {
        if !self.style_loaded {
            return Err(RendererError::Rejected("style is not loaded".to_string()));
        }
        if self.sources.contains_key(&source.id) {
            return Err(RendererError::DuplicateId(source.id.clone()));
        }
        self.sources.insert(source.id.clone(), 0);
        self.calls.push(SimCall::AddSource(source.id.clone()));
        Ok(())
    }

    fn has_layer(&self, id: &str) -> bool {
        self.layers.iter().any(|l| l == id)
    }

    fn add_layer(&mut self, layer: &LayerSpec) -> Result<(), RendererError> {
        if std::mem::take(&mut self.fail_next_add_layer) {
            return Err(RendererError::Rejected(format!("layer {}", layer.id)));
        }
        if !self.sources.contains_key(&layer.source) {
            return Err(RendererError::UnknownSource(layer.source.clone()));
        }
        if self.has_layer(&layer.id) {
            return Err(RendererError::DuplicateId(layer.id.clone()));
        }
        self.layers.push(layer.id.clone());
        self.calls.push(SimCall::AddLayer(layer.id.clone()));
        Ok(())
    }

    fn set_source_data(
        &mut self,
        source_id: &str,
        markers: &[Marker],
    ) -> Result<(), RendererError> {
        let Some(len) = self.sources.get_mut(source_id) else {
            return Err(RendererError::UnknownSource(source_id.to_string()));
        };
        *len = markers.len();
        self.calls.push(SimCall::SetSourceData {
            source: source_id.to_string(),
            features: markers.len(),
        });
        Ok(())
    }

    fn camera(&self) -> CameraState {
        self.camera
    }

    fn ease_to(&mut self, options: &CameraOptions) {
        self.animation = Some(*options);
        self.camera.is_moving = true;
        self.calls.push(SimCall::EaseTo(*options));
    }

    fn project(&self, at: LngLat) -> ScreenPoint {
        let c = self.camera;
        let origin = ScreenPoint::new(
            (c.viewport.width + c.padding.left - c.padding.right) / 2.0,
            (c.viewport.height + c.padding.top - c.padding.bottom) / 2.0,
        );
        let p = mercator_px(at, c.zoom);
        let center = mercator_px(c.center, c.zoom);
        let (dx, dy) = (p[0] - center[0], p[1] - center[1]);
        let (sin, cos) = (-c.bearing.to_radians()).sin_cos();
        ScreenPoint::new(
            origin.x + dx * cos - dy * sin,
            origin.y + dx * sin + dy * cos,
        )
    }

    fn create_popup(&mut self) -> PopupId {
        let id = PopupId(self.next_popup);
        self.next_popup += 1;
        self.popups.insert(
            id,
            SimPopup {
                position: None,
                anchor: None,
                visible: false,
            },
        );
        self.calls.push(SimCall::CreatePopup(id));
        id
    }

    fn set_popup_position(&mut self, popup: PopupId, at: LngLat) {
        if let Some(p) = self.popups.get_mut(&popup) {
            p.position = Some(at);
        }
        self.calls.push(SimCall::SetPopupPosition(popup, at));
    }

    fn set_popup_anchor(&mut self, popup: PopupId, anchor: Anchor) {
        if let Some(p) = self.popups.get_mut(&popup) {
            p.anchor = Some(anchor);
        }
        self.calls.push(SimCall::SetPopupAnchor(popup, anchor));
    }

    fn set_popup_visible(&mut self, popup: PopupId, visible: bool) {
        if let Some(p) = self.popups.get_mut(&popup) {
            p.visible = visible;
        }
        self.calls.push(SimCall::SetPopupVisible(popup, visible));
    }

    fn popup_content_size(&self, popup: PopupId) -> Option<ScreenSize> {
        if !self.popup_node_ready || !self.popups.contains_key(&popup) {
            return None;
        }
        Some(self.popup_size)
    }

    fn remove_popup(&mut self, popup: PopupId) {
        self.popups.remove(&popup);
        self.calls.push(SimCall::RemovePopup(popup));
    }
}
