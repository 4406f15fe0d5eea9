use foundation::geo::LngLat;
use foundation::ids::{MarkerId, PopupId};
use foundation::screen::{ScreenPoint, ScreenSize};
use tracing::{debug, trace};

use crate::guard::is_focusable;
use crate::marker::Marker;
use crate::renderer::{Anchor, MapRenderer};

/// Picks the popup orientation that keeps it inside the viewport.
///
/// Prefers showing the popup above the point (`Anchor::Bottom`); falls back
/// to below, and when neither side fits, to the side with more room.
pub fn classify_anchor(
    point: ScreenPoint,
    popup: ScreenSize,
    viewport: ScreenSize,
    top_inset_px: f64,
    offset_px: f64,
) -> Anchor {
    let needed = popup.height + offset_px;
    let above = point.y - top_inset_px;
    let below = viewport.height - point.y;
    if above >= needed {
        Anchor::Bottom
    } else if below >= needed {
        Anchor::Top
    } else if above >= below {
        Anchor::Bottom
    } else {
        Anchor::Top
    }
}

/// Result of one [`PopupManager::sync`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PopupSync {
    Hidden,
    Shown(Anchor),
    /// The content node is not mounted yet; the popup stays hidden until a
    /// later sync can measure it.
    Deferred,
    /// Torn down; nothing was touched.
    Detached,
}

/// Owns the single preview popup of a viewport.
///
/// The overlay is created on first use, then only repositioned, reanchored
/// and toggled. It is removed once, on teardown.
#[derive(Debug, Default)]
pub struct PopupManager {
    handle: Option<PopupId>,
    target: Option<MarkerId>,
    position: Option<LngLat>,
    anchor: Option<Anchor>,
    visible: bool,
    constructed: u32,
    detached: bool,
}

impl PopupManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handle(&self) -> Option<PopupId> {
        self.handle
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn target(&self) -> Option<&MarkerId> {
        self.target.as_ref()
    }

    pub fn anchor(&self) -> Option<Anchor> {
        self.anchor
    }

    /// How many overlays this manager has created. Never more than one.
    pub fn constructed(&self) -> u32 {
        self.constructed
    }

    /// Brings the popup in line with `highlighted`.
    ///
    /// Idempotent: with unchanged inputs and camera, a repeated call makes no
    /// renderer calls. The anchor is applied before the popup is made visible,
    /// so it never paints with the wrong orientation.
    pub fn sync<R: MapRenderer>(
        &mut self,
        map: &mut R,
        highlighted: Option<&Marker>,
        header_height_px: f64,
        offset_px: f64,
    ) -> PopupSync {
        if self.detached {
            return PopupSync::Detached;
        }
        let Some(marker) = highlighted.filter(|m| is_focusable(m)) else {
            self.hide(map);
            self.target = None;
            return PopupSync::Hidden;
        };

        let handle = self.ensure_handle(map);
        let position = marker.position();
        if self.target.as_ref() != Some(&marker.id) {
            self.target = Some(marker.id.clone());
        }
        if self.position != Some(position) {
            map.set_popup_position(handle, position);
            self.position = Some(position);
        }

        let Some(size) = map.popup_content_size(handle) else {
            trace!(target_id = %marker.id, "popup node not mounted, anchor deferred");
            self.hide(map);
            return PopupSync::Deferred;
        };

        let viewport = map.camera().viewport;
        let anchor = classify_anchor(
            map.project(position),
            size,
            viewport,
            header_height_px.max(0.0),
            offset_px,
        );
        if self.anchor != Some(anchor) {
            map.set_popup_anchor(handle, anchor);
            self.anchor = Some(anchor);
        }
        if !self.visible {
            debug!(target_id = %marker.id, ?anchor, "showing popup");
            map.set_popup_visible(handle, true);
            self.visible = true;
        }
        PopupSync::Shown(anchor)
    }

    /// The overlay hid itself (close button). Keeps the instance for reuse.
    pub fn mark_closed(&mut self) {
        self.visible = false;
    }

    /// Detaches the manager and hands back the overlay for deferred removal.
    ///
    /// After this every `sync` is a no-op. The caller removes the returned
    /// handle outside of its own teardown.
    pub fn detach(&mut self) -> Option<PopupId> {
        self.detached = true;
        self.visible = false;
        self.target = None;
        self.handle.take()
    }

    fn ensure_handle<R: MapRenderer>(&mut self, map: &mut R) -> PopupId {
        if let Some(handle) = self.handle {
            return handle;
        }
        let handle = map.create_popup();
        self.constructed += 1;
        debug!(popup = handle.0, "constructed popup overlay");
        self.handle = Some(handle);
        handle
    }

    fn hide<R: MapRenderer>(&mut self, map: &mut R) {
        if !self.visible {
            return;
        }
        if let Some(handle) = self.handle {
            debug!(popup = handle.0, "hiding popup");
            map.set_popup_visible(handle, false);
        }
        self.visible = false;
    }
}
