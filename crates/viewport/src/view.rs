//! The view-level unit: one mounted map viewport.
//!
//! `MapViewport` owns the renderer handle and wires the controllers
//! together. The host calls [`MapViewport::render`] on every re-render and
//! forwards renderer events (`on_load`, `on_style_load`, `on_move_end`,
//! `on_idle`, `on_frame`). Each entry point is safe to call repeatedly:
//! unchanged inputs never repeat side effects.
//!
//! Ordering within one focus lifecycle:
//! attach → transition → settle → highlight → popup → consumption.

use foundation::ids::{MarkerId, PopupId};
use runtime::deferred::{DeferredQueue, Phase};
use runtime::frame::Frame;
use runtime::metrics::Metrics;
use tracing::{debug, info, trace, warn};

use crate::camera::{CameraPhase, FocusCamera, FocusRequest, FocusStep};
use crate::config::{MARKERS_SOURCE_ID, ViewportConfig};
use crate::focus::FocusConsumption;
use crate::guard::is_focusable;
use crate::marker::{Marker, ViewportCallbacks, ViewportProps};
use crate::popup::{PopupManager, PopupSync};
use crate::renderer::{MapRenderer, TransitionTag};
use crate::style::{StyleAttachment, StyleGeneration};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Deferred {
    /// Retry anchor classification for this highlight.
    Anchor(MarkerId),
    RemovePopup(PopupId),
}

pub struct MapViewport<R: MapRenderer, C: ViewportCallbacks> {
    map: R,
    callbacks: C,
    config: ViewportConfig,
    mounted: bool,
    loaded: bool,
    generation: StyleGeneration,
    attachment: StyleAttachment,
    camera: FocusCamera,
    popup: PopupManager,
    focus: FocusConsumption,
    props: ViewportProps,
    /// Upstream highlight as of the last render.
    props_highlight: Option<MarkerId>,
    /// Effective highlight: upstream value, or a settle that upstream has
    /// not echoed back yet.
    highlight: Option<MarkerId>,
    markers_dirty: bool,
    markers_synced_for: Option<StyleGeneration>,
    deferred: DeferredQueue<Deferred>,
    metrics: Metrics,
}

impl<R: MapRenderer, C: ViewportCallbacks> MapViewport<R, C> {
    pub fn new(map: R, config: ViewportConfig, callbacks: C) -> Self {
        info!("mounting map viewport");
        Self {
            map,
            callbacks,
            config,
            mounted: true,
            loaded: false,
            generation: StyleGeneration::default(),
            attachment: StyleAttachment::new(),
            camera: FocusCamera::new(),
            popup: PopupManager::new(),
            focus: FocusConsumption::new(),
            props: ViewportProps::default(),
            props_highlight: None,
            highlight: None,
            markers_dirty: true,
            markers_synced_for: None,
            deferred: DeferredQueue::new(),
            metrics: Metrics::new(),
        }
    }

    pub fn map(&self) -> &R {
        &self.map
    }

    /// Direct renderer access for the host (e.g. to drive a simulated one).
    pub fn map_mut(&mut self) -> &mut R {
        &mut self.map
    }

    pub fn callbacks(&self) -> &C {
        &self.callbacks
    }

    pub fn config(&self) -> &ViewportConfig {
        &self.config
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub fn highlight(&self) -> Option<&MarkerId> {
        self.highlight.as_ref()
    }

    pub fn camera_phase(&self) -> &CameraPhase {
        self.camera.phase()
    }

    pub fn popup(&self) -> &PopupManager {
        &self.popup
    }

    pub fn style_generation(&self) -> StyleGeneration {
        self.generation
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    /// Unmounted and all deferred cleanup has run.
    pub fn is_torn_down(&self) -> bool {
        !self.mounted && self.deferred.is_empty()
    }

    /// Releases the renderer once teardown has completed.
    pub fn into_parts(self) -> (R, C) {
        (self.map, self.callbacks)
    }

    /// Applies a re-render of the host with `props`.
    pub fn render(&mut self, props: ViewportProps) {
        if !self.mounted {
            trace!("render after unmount ignored");
            return;
        }
        if props.markers != self.props.markers {
            self.markers_dirty = true;
        }
        self.props = props;

        if self.props.selection.highlighted_id != self.props_highlight {
            self.props_highlight = self.props.selection.highlighted_id.clone();
            self.highlight = self.props_highlight.clone();
        }

        self.converge();
        let focus_id = self.props.selection.focus_id.clone();
        if let Some(request) = self.focus.observe(focus_id.as_ref()) {
            self.dispatch_focus(request);
        }
        self.sync_popup();
    }

    /// The map finished its initial load.
    pub fn on_load(&mut self) {
        if !self.mounted || self.loaded {
            return;
        }
        debug!("map loaded");
        self.loaded = true;
        self.converge();
        self.sync_popup();
    }

    /// The renderer (re)loaded its style; everything attached before is gone.
    pub fn on_style_load(&mut self) {
        if !self.mounted {
            return;
        }
        self.generation = self.generation.next();
        self.metrics
            .set_gauge("style.generation", self.generation.0 as i64);
        debug!(generation = self.generation.0, "style generation advanced");
        self.converge();
        self.sync_popup();
    }

    /// The renderer went idle; a readiness signal like any other.
    pub fn on_idle(&mut self) {
        if !self.mounted {
            return;
        }
        self.converge();
        self.sync_popup();
    }

    /// A camera movement ended. `tag` is the tag of the transition that
    /// ended, `None` for user gestures.
    pub fn on_move_end(&mut self, tag: Option<TransitionTag>) {
        if !self.mounted {
            return;
        }
        if let Some(request) = self.camera.on_move_end(tag) {
            match self.props.marker(&request.target).cloned() {
                Some(marker) if is_focusable(&marker) => self.settle(&request, &marker),
                _ => {
                    debug!(target_id = %request.target, "focus target vanished during transition");
                    self.consume(&request);
                }
            }
        }
        // The highlighted point may have moved on screen.
        self.sync_popup();
    }

    /// An animation-frame boundary. Runs deferred work.
    pub fn on_frame(&mut self, frame: Frame) {
        for (_, task) in self.deferred.drain_phase(Phase::PrePaint) {
            match task {
                Deferred::Anchor(id) if self.mounted && self.highlight.as_ref() == Some(&id) => {
                    trace!(frame = frame.index, target_id = %id, "retrying popup anchor");
                    self.sync_popup();
                }
                Deferred::Anchor(id) => {
                    trace!(frame = frame.index, target_id = %id, "dropping stale anchor retry");
                }
                Deferred::RemovePopup(handle) => self.remove_popup(handle),
            }
        }
        for (_, task) in self.deferred.drain_phase(Phase::PostFrame) {
            if let Deferred::RemovePopup(handle) = task {
                self.remove_popup(handle);
            }
        }
    }

    pub fn on_marker_click(&mut self, id: &MarkerId) {
        if !self.mounted {
            return;
        }
        self.highlight = Some(id.clone());
        self.callbacks.on_highlight(Some(id));
        self.sync_popup();
    }

    pub fn on_map_click(&mut self) {
        if !self.mounted || self.highlight.is_none() {
            return;
        }
        self.clear_highlight();
    }

    pub fn on_popup_click(&mut self) {
        if !self.mounted {
            return;
        }
        let Some(id) = self.highlight.clone() else {
            return;
        };
        if self.props.selection.detail_id.as_ref() == Some(&id) {
            return;
        }
        self.callbacks.on_open_detail(&id);
    }

    /// The user closed the popup through the overlay itself.
    pub fn on_popup_closed(&mut self) {
        if !self.mounted {
            return;
        }
        self.popup.mark_closed();
        if self.highlight.is_some() {
            self.clear_highlight();
        }
    }

    /// Unmounts the view. Popup removal is scheduled for the next frame
    /// rather than performed inline; every later event is ignored.
    pub fn unmount(&mut self) {
        if !self.mounted {
            return;
        }
        info!("unmounting map viewport");
        self.mounted = false;
        self.focus.abandon();
        self.camera.reset();
        self.deferred
            .cancel_where(|task| matches!(task, Deferred::Anchor(_)));
        if let Some(handle) = self.popup.detach() {
            debug!(popup = handle.0, "popup removal scheduled");
            self.deferred
                .defer(Phase::PostFrame, Deferred::RemovePopup(handle));
        }
    }

    /// Attaches the style if needed. `true` when the map is attach-ready.
    fn attach_ready(&mut self) -> bool {
        let style_ready = self.map.is_style_loaded();
        let before = self.attachment.attached_generation();
        let ready = self.attachment.ensure_attached(
            &mut self.map,
            style_ready,
            self.generation,
            &self.config.style,
        );
        if ready {
            if before != Some(self.generation) {
                self.metrics.inc("style.attachments");
            }
            self.sync_marker_source();
        }
        ready
    }

    /// Runs everything that waits on readiness.
    fn converge(&mut self) {
        if !self.attach_ready() || !self.loaded {
            return;
        }
        if let Some(request) = self.focus.take_queued() {
            debug!(seq = request.seq, target_id = %request.target, "replaying queued focus");
            self.dispatch_focus(request);
        }
    }

    fn dispatch_focus(&mut self, request: FocusRequest) {
        if !self.focus.is_open(&request) {
            return;
        }
        if !self.loaded || !self.attach_ready() {
            self.park(request);
            return;
        }

        let Some(marker) = self.props.marker(&request.target).cloned() else {
            if self.props.markers.is_empty() {
                // Marker data has not arrived yet.
                self.park(request);
                return;
            }
            debug!(target_id = %request.target, "focus target unknown");
            if let Some(active) = self.camera.active_request().cloned() {
                self.camera.reset();
                self.metrics.inc("focus.superseded");
                self.consume(&active);
            }
            self.metrics.inc("focus.rejected");
            self.consume(&request);
            return;
        };

        let outcome = self.camera.focus(
            &mut self.map,
            request.clone(),
            &marker,
            self.props.header_height_px,
            &self.config,
        );
        if let Some(old) = outcome.superseded {
            self.metrics.inc("focus.superseded");
            self.consume(&old);
        }
        match outcome.step {
            FocusStep::Animating(_) => self.metrics.inc("camera.transitions"),
            FocusStep::Joined(_) => {}
            FocusStep::SettledInPlace => {
                self.metrics.inc("camera.skipped");
                self.settle(&request, &marker);
            }
            FocusStep::Rejected => {
                self.metrics.inc("focus.rejected");
                self.consume(&request);
            }
        }
    }

    fn park(&mut self, request: FocusRequest) {
        // A running transition belongs to an older request; it must not settle.
        if let Some(active) = self.camera.active_request().cloned() {
            debug!(seq = active.seq, target_id = %active.target, "transition superseded by parked focus");
            self.camera.reset();
            self.metrics.inc("focus.superseded");
            self.consume(&active);
        }
        if let Some(old) = self.focus.queue(request) {
            self.metrics.inc("focus.superseded");
            self.consume(&old);
        }
    }

    fn settle(&mut self, request: &FocusRequest, marker: &Marker) {
        debug!(target_id = %marker.id, "focus settled");
        self.metrics.inc("focus.settled");
        self.highlight = Some(marker.id.clone());
        self.callbacks.on_highlight(Some(&marker.id));
        self.sync_popup();
        self.consume(request);
    }

    fn consume(&mut self, request: &FocusRequest) {
        if self.focus.consume(request, &mut self.callbacks) {
            self.metrics.inc("focus.consumed");
        }
    }

    fn clear_highlight(&mut self) {
        self.highlight = None;
        self.callbacks.on_highlight(None);
        self.sync_popup();
    }

    fn sync_popup(&mut self) {
        if !self.mounted || !self.attachment.is_attached(self.generation) {
            return;
        }
        let marker = self
            .highlight
            .as_ref()
            .and_then(|id| self.props.marker(id))
            .cloned();
        let before = self.popup.constructed();
        let result = self.popup.sync(
            &mut self.map,
            marker.as_ref(),
            self.props.header_height_px,
            self.config.popup_offset_px,
        );
        if self.popup.constructed() > before {
            self.metrics.inc("popup.constructed");
        }

        if let (PopupSync::Deferred, Some(marker)) = (result, marker) {
            let already = self
                .deferred
                .contains(|task| task == &Deferred::Anchor(marker.id.clone()));
            if !already {
                self.deferred
                    .defer(Phase::PrePaint, Deferred::Anchor(marker.id));
            }
        }
    }

    fn sync_marker_source(&mut self) {
        if !self.markers_dirty && self.markers_synced_for == Some(self.generation) {
            return;
        }
        if !self.config.style.sources.iter().any(|s| s.id == MARKERS_SOURCE_ID) {
            return;
        }
        match self
            .map
            .set_source_data(MARKERS_SOURCE_ID, &self.props.markers)
        {
            Ok(()) => {
                trace!(count = self.props.markers.len(), "marker source updated");
                self.markers_dirty = false;
                self.markers_synced_for = Some(self.generation);
            }
            Err(err) => warn!("marker source update failed: {err}"),
        }
    }

    fn remove_popup(&mut self, handle: PopupId) {
        debug!(popup = handle.0, "removing popup overlay");
        self.map.remove_popup(handle);
        self.metrics.inc("popup.removed");
    }
}

impl<R: MapRenderer + std::fmt::Debug, C: ViewportCallbacks> std::fmt::Debug for MapViewport<R, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MapViewport")
            .field("map", &self.map)
            .field("mounted", &self.mounted)
            .field("loaded", &self.loaded)
            .field("generation", &self.generation)
            .field("camera", self.camera.phase())
            .field("highlight", &self.highlight)
            .finish_non_exhaustive()
    }
}
