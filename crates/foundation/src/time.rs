use serde::{Deserialize, Serialize};

/// Point in time, milliseconds since the view was mounted.
#[derive(Copy, Clone, Debug, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Time(pub f64);

/// Duration in whole milliseconds, the unit camera animations are issued in.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Millis(pub u32);

impl Millis {
    /// Returns `self`, raised to `floor` when shorter.
    pub fn at_least(self, floor: Millis) -> Millis {
        self.max(floor)
    }
}
