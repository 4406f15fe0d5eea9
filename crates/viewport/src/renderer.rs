//! Capability interface of the external map renderer.
//!
//! The viewport never talks to a concrete engine. Everything it needs
//! (style readiness, source/layer registration, camera animation, projection
//! and a popup primitive) goes through [`MapRenderer`], so the coordination
//! logic runs unchanged against [`crate::sim::SimRenderer`] in tests.

use foundation::geo::LngLat;
use foundation::ids::PopupId;
use foundation::screen::{Padding, ScreenPoint, ScreenSize};
use foundation::time::Millis;
use serde::{Deserialize, Serialize};

use crate::marker::Marker;

/// Camera as currently reported by the renderer.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraState {
    pub center: LngLat,
    pub zoom: f64,
    pub bearing: f64,
    pub pitch: f64,
    pub viewport: ScreenSize,
    pub padding: Padding,
    /// A transition or user gesture is in progress.
    pub is_moving: bool,
}

/// Opaque tag attached to a camera transition and echoed back by the
/// renderer in the matching movement-ended event.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransitionTag(pub u64);

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraOptions {
    pub center: LngLat,
    pub zoom: f64,
    pub bearing: f64,
    pub pitch: f64,
    pub padding: Padding,
    pub duration: Millis,
    pub tag: TransitionTag,
}

/// Vertical orientation of a popup relative to its target point.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Anchor {
    /// Popup tip at the bottom: the popup sits above the point.
    Bottom,
    /// Popup tip at the top: the popup sits below the point.
    Top,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    GeoJson,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceSpec {
    pub id: String,
    pub kind: SourceKind,
    /// Cluster nearby points in the source.
    #[serde(default)]
    pub cluster: bool,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerKind {
    Circle,
    Symbol,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerSpec {
    pub id: String,
    pub source: String,
    pub kind: LayerKind,
    /// Renderer-specific paint properties, passed through untouched.
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub paint: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RendererError {
    DuplicateId(String),
    UnknownSource(String),
    Rejected(String),
}

impl std::fmt::Display for RendererError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RendererError::DuplicateId(id) => write!(f, "id already registered: {id}"),
            RendererError::UnknownSource(id) => write!(f, "unknown source: {id}"),
            RendererError::Rejected(msg) => write!(f, "renderer rejected operation: {msg}"),
        }
    }
}

impl std::error::Error for RendererError {}

/// What the viewport consumes from the map renderer.
///
/// Events flow the other way: the host forwards renderer events (load,
/// style load, movement ended, idle) to [`crate::view::MapViewport`].
pub trait MapRenderer {
    /// The current style is fully loaded and accepts sources/layers.
    fn is_style_loaded(&self) -> bool;

    fn has_source(&self, id: &str) -> bool;
    fn add_source(&mut self, source: &SourceSpec) -> Result<(), RendererError>;
    fn has_layer(&self, id: &str) -> bool;
    fn add_layer(&mut self, layer: &LayerSpec) -> Result<(), RendererError>;
    fn set_source_data(
        &mut self,
        source_id: &str,
        markers: &[Marker],
    ) -> Result<(), RendererError>;

    fn camera(&self) -> CameraState;
    /// Starts an animated transition, interrupting any running one.
    fn ease_to(&mut self, options: &CameraOptions);
    /// Projects a coordinate to viewport pixels under the current camera.
    fn project(&self, at: LngLat) -> ScreenPoint;

    fn create_popup(&mut self) -> PopupId;
    fn set_popup_position(&mut self, popup: PopupId, at: LngLat);
    fn set_popup_anchor(&mut self, popup: PopupId, anchor: Anchor);
    fn set_popup_visible(&mut self, popup: PopupId, visible: bool);
    /// Rendered size of the popup content, `None` while its node is not mounted.
    fn popup_content_size(&self, popup: PopupId) -> Option<ScreenSize>;
    fn remove_popup(&mut self, popup: PopupId);
}
