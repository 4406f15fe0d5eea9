use foundation::geo::LngLat;
use foundation::ids::MarkerId;
use serde::{Deserialize, Serialize};

/// A point of interest shown on the map, as supplied by the data layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    pub id: MarkerId,
    pub lat: f64,
    pub lng: f64,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl Marker {
    pub fn new(id: impl Into<String>, lat: f64, lng: f64) -> Self {
        Self {
            id: MarkerId::new(id),
            lat,
            lng,
            title: String::new(),
            category: None,
        }
    }

    pub fn position(&self) -> LngLat {
        LngLat::new(self.lng, self.lat)
    }
}

/// The upstream tri-state selection model.
///
/// `focus_id` is a one-shot intent and is expected to be cleared by the
/// host once `on_focus_consumed` fires; `highlighted_id` persists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    #[serde(default)]
    pub highlighted_id: Option<MarkerId>,
    #[serde(default)]
    pub focus_id: Option<MarkerId>,
    #[serde(default)]
    pub detail_id: Option<MarkerId>,
}

/// Everything the host passes on each render.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ViewportProps {
    #[serde(default)]
    pub markers: Vec<Marker>,
    #[serde(default)]
    pub selection: Selection,
    /// Height of the fixed header overlapping the top of the map, 0 when hidden.
    #[serde(default)]
    pub header_height_px: f64,
}

impl ViewportProps {
    pub fn marker(&self, id: &MarkerId) -> Option<&Marker> {
        self.markers.iter().find(|m| &m.id == id)
    }
}

/// Upstream callbacks invoked by the viewport.
pub trait ViewportCallbacks {
    /// The highlighted marker changed (settled focus, marker click, popup close).
    fn on_highlight(&mut self, id: Option<&MarkerId>);
    /// The user asked for the detail view of a marker.
    fn on_open_detail(&mut self, id: &MarkerId);
    /// The focus request for `id` has been fully handled and may be cleared.
    fn on_focus_consumed(&mut self, id: &MarkerId);
}
