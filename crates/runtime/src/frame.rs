use foundation::time::Time;

/// An animation-frame boundary as reported by the host.
///
/// Work deferred "to the next frame" runs when the host delivers one of
/// these, before the frame is painted.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Frame {
    /// 0-based frame index since mount.
    pub index: u64,
    /// Host timestamp of the frame (milliseconds since mount).
    pub time: Time,
}

impl Frame {
    pub fn new(index: u64, time: Time) -> Self {
        Self { index, time }
    }

    pub fn first() -> Self {
        Self::new(0, Time(0.0))
    }

    /// The following frame, `dt_ms` later.
    pub fn next(self, dt_ms: f64) -> Self {
        Self::new(self.index + 1, Time(self.time.0 + dt_ms))
    }
}
