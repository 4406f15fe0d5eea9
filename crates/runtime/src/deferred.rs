//! Deterministic queue of work deferred to the next frame boundary.
//!
//! Key properties:
//! - Items drain per [`Phase`], `PrePaint` before `PostFrame`.
//! - Within a phase, items drain in insertion order.
//! - Cancellation does not perturb the order of remaining items.
//! - Work deferred while a phase is draining lands in the next frame.
//!
//! Vec-backed; the queue rarely holds more than a handful of items.

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DeferredId(pub u64);

/// When deferred work runs relative to the frame it was scheduled for.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Phase {
    /// Before the frame paints; layout-dependent fixes go here.
    PrePaint,
    /// After the frame; destructive cleanup goes here.
    PostFrame,
}

#[derive(Debug)]
struct Item<T> {
    id: DeferredId,
    phase: Phase,
    payload: T,
    canceled: bool,
}

#[derive(Debug)]
pub struct DeferredQueue<T> {
    next_id: u64,
    items: Vec<Item<T>>,
}

impl<T> Default for DeferredQueue<T> {
    fn default() -> Self {
        Self {
            next_id: 0,
            items: Vec::new(),
        }
    }
}

impl<T> DeferredQueue<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.iter().filter(|i| !i.canceled).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn defer(&mut self, phase: Phase, payload: T) -> DeferredId {
        let id = DeferredId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        self.items.push(Item {
            id,
            phase,
            payload,
            canceled: false,
        });
        id
    }

    /// Cancels every pending item matching `pred`. Returns how many were canceled.
    pub fn cancel_where(&mut self, mut pred: impl FnMut(&T) -> bool) -> usize {
        let mut n = 0;
        for item in self.items.iter_mut().filter(|i| !i.canceled) {
            if pred(&item.payload) {
                item.canceled = true;
                n += 1;
            }
        }
        n
    }

    pub fn contains(&self, mut pred: impl FnMut(&T) -> bool) -> bool {
        self.items
            .iter()
            .any(|i| !i.canceled && pred(&i.payload))
    }

    /// Removes and returns all live items of `phase`, oldest first.
    pub fn drain_phase(&mut self, phase: Phase) -> Vec<(DeferredId, T)> {
        let mut out = Vec::new();
        let mut keep = Vec::with_capacity(self.items.len());
        for item in self.items.drain(..) {
            if item.canceled {
                continue;
            }
            if item.phase == phase {
                out.push((item.id, item.payload));
            } else {
                keep.push(item);
            }
        }
        self.items = keep;
        out
    }
}
