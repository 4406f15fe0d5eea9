use serde::{Deserialize, Serialize};

/// Stable identifier of a map marker, as issued by the data layer.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MarkerId(String);

impl MarkerId {
    pub fn new(id: impl Into<String>) -> Self {
        MarkerId(id.into())
    }
}

impl std::fmt::Display for MarkerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MarkerId {
    fn from(value: &str) -> Self {
        MarkerId::new(value)
    }
}

/// Identifier of a popup overlay handed out by the renderer.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PopupId(pub u32);
