use std::collections::BTreeSet;

use foundation::ids::MarkerId;
use tracing::{debug, trace};

use crate::camera::FocusRequest;
use crate::marker::ViewportCallbacks;

/// Turns the upstream `focus_id` into one-shot [`FocusRequest`]s and reports
/// each of them back exactly once.
///
/// A request is distinct when `focus_id` changes to a non-null value, so a
/// re-render that still carries a stale id never re-triggers a transition.
/// Every request handed out stays open until [`FocusConsumption::consume`]
/// closes it; closing twice is a no-op.
#[derive(Debug, Default)]
pub struct FocusConsumption {
    last_seen: Option<MarkerId>,
    next_seq: u64,
    open: BTreeSet<u64>,
    queued: Option<FocusRequest>,
}

impl FocusConsumption {
    pub fn new() -> Self {
        Self::default()
    }

    /// Observes the upstream focus id of a render.
    ///
    /// Returns a new request when the id changed to a non-null value.
    pub fn observe(&mut self, focus_id: Option<&MarkerId>) -> Option<FocusRequest> {
        if self.last_seen.as_ref() == focus_id {
            return None;
        }
        self.last_seen = focus_id.cloned();
        let target = focus_id?.clone();

        let seq = self.next_seq;
        self.next_seq = self.next_seq.wrapping_add(1);
        self.open.insert(seq);
        trace!(seq, target_id = %target, "new focus request");
        Some(FocusRequest { seq, target })
    }

    /// Parks `request` until the map can serve it. A request already parked
    /// is superseded and returned so the caller can consume it.
    pub fn queue(&mut self, request: FocusRequest) -> Option<FocusRequest> {
        debug!(seq = request.seq, target_id = %request.target, "focus request queued");
        self.queued.replace(request)
    }

    pub fn queued(&self) -> Option<&FocusRequest> {
        self.queued.as_ref()
    }

    pub fn take_queued(&mut self) -> Option<FocusRequest> {
        self.queued.take()
    }

    pub fn is_open(&self, request: &FocusRequest) -> bool {
        self.open.contains(&request.seq)
    }

    /// Closes `request` and notifies upstream. Returns `false` if it was
    /// already closed, in which case upstream is not notified again.
    pub fn consume<C: ViewportCallbacks>(
        &mut self,
        request: &FocusRequest,
        callbacks: &mut C,
    ) -> bool {
        if !self.open.remove(&request.seq) {
            return false;
        }
        if self.queued.as_ref().is_some_and(|q| q.seq == request.seq) {
            self.queued = None;
        }
        debug!(seq = request.seq, target_id = %request.target, "focus consumed");
        callbacks.on_focus_consumed(&request.target);
        true
    }

    /// Drops every open request without notifying upstream (view teardown).
    pub fn abandon(&mut self) {
        self.open.clear();
        self.queued = None;
    }
}
