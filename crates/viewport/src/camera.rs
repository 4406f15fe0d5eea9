//! Focus camera: turns a focus request into at most one camera transition.
//!
//! State machine:
//! `Idle → TransitionRequested → Transitioning → Settled`, with
//! `TransitionRequested → Settled` when the target is already in view and
//! `Idle → Settled` for targets that fail the coordinate guard.
//!
//! There is no cancel primitive. A newer request replaces the active one,
//! and movement-ended events are matched against the tag of the transition
//! issued for the latest request, so a stale animation can never settle.

use foundation::geo::LngLat;
use foundation::ids::MarkerId;
use foundation::screen::{Padding, ScreenRect};
use foundation::time::Millis;
use tracing::{debug, trace};

use crate::config::ViewportConfig;
use crate::guard::is_focusable;
use crate::marker::Marker;
use crate::renderer::{CameraOptions, CameraState, MapRenderer, TransitionTag};

/// A one-shot intent to move the camera to, and highlight, a marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FocusRequest {
    /// Monotonic per viewport; later requests supersede earlier ones.
    pub seq: u64,
    pub target: MarkerId,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CameraPhase {
    #[default]
    Idle,
    TransitionRequested(FocusRequest),
    Transitioning {
        request: FocusRequest,
        tag: TransitionTag,
    },
    Settled(FocusRequest),
}

/// What [`FocusCamera::focus`] did with a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FocusStep {
    /// An animated transition was issued; settle arrives with movement-ended.
    Animating(TransitionTag),
    /// The target was already in view; settled without camera motion.
    SettledInPlace,
    /// The target failed the coordinate guard; settled without camera motion.
    Rejected,
    /// A transition to the same target is already running; the request
    /// joins it and settles with it.
    Joined(TransitionTag),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FocusOutcome {
    pub step: FocusStep,
    /// The previously active request, now discarded.
    pub superseded: Option<FocusRequest>,
}

/// Target camera pose of a focus transition.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FocusPose {
    pub center: LngLat,
    pub zoom: f64,
    pub bearing: f64,
    pub pitch: f64,
    pub padding: Padding,
    pub duration: Millis,
}

impl FocusPose {
    pub fn options(&self, tag: TransitionTag) -> CameraOptions {
        CameraOptions {
            center: self.center,
            zoom: self.zoom,
            bearing: self.bearing,
            pitch: self.pitch,
            padding: self.padding,
            duration: self.duration,
            tag,
        }
    }
}

/// Computes where the camera should end up to focus `target`.
///
/// Never zooms out, keeps bearing and pitch, and pads the top by the header
/// height plus a fraction of the viewport so the target clears the header.
pub fn plan_pose(
    camera: &CameraState,
    target: LngLat,
    header_height_px: f64,
    config: &ViewportConfig,
) -> FocusPose {
    let top = header_height_px.max(0.0) + config.header_clearance_ratio * camera.viewport.height;
    FocusPose {
        center: target,
        zoom: camera.zoom.max(config.min_focus_zoom),
        bearing: camera.bearing,
        pitch: camera.pitch,
        padding: Padding::new(
            top,
            config.bottom_safe_margin_px,
            config.side_padding_px,
            config.side_padding_px,
        ),
        duration: config.effective_transition(),
    }
}

/// Whether `pose` is already what the screen shows, so animating would be a no-op.
fn already_in_view<R: MapRenderer>(
    map: &R,
    camera: &CameraState,
    pose: &FocusPose,
    tolerance_px: f64,
) -> bool {
    if camera.is_moving || camera.zoom < pose.zoom {
        return false;
    }
    let focus_point = ScreenRect::from_size(camera.viewport)
        .inset(pose.padding)
        .center();
    map.project(pose.center).distance(focus_point) <= tolerance_px
}

#[derive(Debug, Default)]
pub struct FocusCamera {
    phase: CameraPhase,
    next_tag: u64,
}

impl FocusCamera {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> &CameraPhase {
        &self.phase
    }

    /// The request that has not settled yet, if any.
    pub fn active_request(&self) -> Option<&FocusRequest> {
        match &self.phase {
            CameraPhase::TransitionRequested(r) => Some(r),
            CameraPhase::Transitioning { request, .. } => Some(request),
            CameraPhase::Idle | CameraPhase::Settled(_) => None,
        }
    }

    pub fn in_flight(&self) -> Option<TransitionTag> {
        match &self.phase {
            CameraPhase::Transitioning { tag, .. } => Some(*tag),
            _ => None,
        }
    }

    /// Drives `request` towards `marker`. The map must be attach-ready.
    pub fn focus<R: MapRenderer>(
        &mut self,
        map: &mut R,
        request: FocusRequest,
        marker: &Marker,
        header_height_px: f64,
        config: &ViewportConfig,
    ) -> FocusOutcome {
        let superseded = self.active_request().cloned();

        if !is_focusable(marker) {
            debug!(target_id = %request.target, "focus target has no usable coordinate");
            self.phase = CameraPhase::Settled(request);
            return FocusOutcome {
                step: FocusStep::Rejected,
                superseded,
            };
        }

        if let CameraPhase::Transitioning { request: active, tag } = &self.phase
            && active.target == request.target
        {
            let tag = *tag;
            trace!(target_id = %request.target, "joining running transition");
            self.phase = CameraPhase::Transitioning { request, tag };
            return FocusOutcome {
                step: FocusStep::Joined(tag),
                superseded,
            };
        }

        self.phase = CameraPhase::TransitionRequested(request.clone());
        let camera = map.camera();
        let pose = plan_pose(&camera, marker.position(), header_height_px, config);

        if already_in_view(map, &camera, &pose, config.in_view_tolerance_px) {
            debug!(target_id = %request.target, "focus target already in view");
            self.phase = CameraPhase::Settled(request);
            return FocusOutcome {
                step: FocusStep::SettledInPlace,
                superseded,
            };
        }

        let tag = TransitionTag(self.next_tag);
        self.next_tag = self.next_tag.wrapping_add(1);
        debug!(
            target_id = %request.target,
            zoom = pose.zoom,
            top_padding = pose.padding.top,
            duration_ms = pose.duration.0,
            "issuing focus transition"
        );
        map.ease_to(&pose.options(tag));
        self.phase = CameraPhase::Transitioning { request, tag };
        FocusOutcome {
            step: FocusStep::Animating(tag),
            superseded,
        }
    }

    /// Handles a movement-ended event. Returns the request that settled,
    /// or `None` for user gestures and superseded transitions.
    pub fn on_move_end(&mut self, tag: Option<TransitionTag>) -> Option<FocusRequest> {
        match &self.phase {
            CameraPhase::Transitioning { request, tag: active } if Some(*active) == tag => {
                let request = request.clone();
                self.phase = CameraPhase::Settled(request.clone());
                Some(request)
            }
            _ => {
                trace!(?tag, "ignoring movement end");
                None
            }
        }
    }

    /// Forgets any active request without touching the renderer.
    pub fn reset(&mut self) {
        self.phase = CameraPhase::Idle;
    }
}
