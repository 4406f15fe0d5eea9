use foundation::time::Millis;
use serde::{Deserialize, Serialize};

use crate::renderer::{LayerKind, LayerSpec, SourceKind, SourceSpec};

/// Id of the source the marker list is pushed into.
pub const MARKERS_SOURCE_ID: &str = "markers";

/// Sources and layers attached to every style generation, in registration order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleManifest {
    pub sources: Vec<SourceSpec>,
    pub layers: Vec<LayerSpec>,
}

impl Default for StyleManifest {
    fn default() -> Self {
        Self {
            sources: vec![SourceSpec {
                id: MARKERS_SOURCE_ID.to_string(),
                kind: SourceKind::GeoJson,
                cluster: false,
            }],
            layers: vec![
                LayerSpec {
                    id: "markers-circle".to_string(),
                    source: MARKERS_SOURCE_ID.to_string(),
                    kind: LayerKind::Circle,
                    paint: serde_json::json!({ "circle-radius": 7, "circle-color": "#e4572e" }),
                },
                LayerSpec {
                    id: "markers-label".to_string(),
                    source: MARKERS_SOURCE_ID.to_string(),
                    kind: LayerKind::Symbol,
                    paint: serde_json::Value::Null,
                },
            ],
        }
    }
}

/// Tuning of the viewport. All distances in pixels, durations in milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportConfig {
    /// Focusing never ends below this zoom.
    pub min_focus_zoom: f64,
    pub transition_ms: Millis,
    /// Floor applied to every animated transition.
    pub min_transition_ms: Millis,
    /// Extra top clearance below the header, as a fraction of viewport height.
    pub header_clearance_ratio: f64,
    pub bottom_safe_margin_px: f64,
    pub side_padding_px: f64,
    /// A target this close to the focus point (at an acceptable zoom) is
    /// settled without animating.
    pub in_view_tolerance_px: f64,
    /// Gap between the popup and its target point.
    pub popup_offset_px: f64,
    pub style: StyleManifest,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            min_focus_zoom: 14.0,
            transition_ms: Millis(600),
            min_transition_ms: Millis(450),
            header_clearance_ratio: 0.10,
            bottom_safe_margin_px: 96.0,
            side_padding_px: 24.0,
            in_view_tolerance_px: 4.0,
            popup_offset_px: 14.0,
            style: StyleManifest::default(),
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Parse(serde_json::Error),
    Invalid { field: &'static str, reason: String },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Parse(e) => write!(f, "failed to parse viewport config: {e}"),
            ConfigError::Invalid { field, reason } => {
                write!(f, "invalid viewport config field {field}: {reason}")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Parse(e) => Some(e),
            ConfigError::Invalid { .. } => None,
        }
    }
}

impl ViewportConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: ViewportConfig = serde_json::from_str(json).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.min_focus_zoom.is_finite() || self.min_focus_zoom < 0.0 {
            return Err(invalid("min_focus_zoom", "must be a finite, non-negative zoom"));
        }
        if !(0.0..1.0).contains(&self.header_clearance_ratio) {
            return Err(invalid("header_clearance_ratio", "must be within [0, 1)"));
        }
        for (field, v) in [
            ("bottom_safe_margin_px", self.bottom_safe_margin_px),
            ("side_padding_px", self.side_padding_px),
            ("in_view_tolerance_px", self.in_view_tolerance_px),
            ("popup_offset_px", self.popup_offset_px),
        ] {
            if !v.is_finite() || v < 0.0 {
                return Err(invalid(field, "must be a finite, non-negative pixel value"));
            }
        }
        for layer in &self.style.layers {
            if !self.style.sources.iter().any(|s| s.id == layer.source) {
                return Err(ConfigError::Invalid {
                    field: "style.layers",
                    reason: format!("layer {} references unknown source {}", layer.id, layer.source),
                });
            }
        }
        Ok(())
    }

    /// Duration actually issued for animated transitions.
    pub fn effective_transition(&self) -> Millis {
        self.transition_ms.at_least(self.min_transition_ms)
    }
}

fn invalid(field: &'static str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, ViewportConfig};
    use foundation::time::Millis;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_object_yields_defaults() {
        let config = ViewportConfig::from_json_str("{}").unwrap();
        assert_eq!(config, ViewportConfig::default());
    }

    #[test]
    fn partial_override_keeps_other_defaults() {
        let config =
            ViewportConfig::from_json_str(r#"{ "min_focus_zoom": 16.5, "transition_ms": 200 }"#)
                .unwrap();
        assert_eq!(config.min_focus_zoom, 16.5);
        assert_eq!(config.effective_transition(), Millis(450));
        assert_eq!(config.bottom_safe_margin_px, 96.0);
    }

    #[test]
    fn rejects_negative_margin() {
        let err = ViewportConfig::from_json_str(r#"{ "bottom_safe_margin_px": -1 }"#).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "bottom_safe_margin_px",
                ..
            }
        ));
    }

    #[test]
    fn rejects_layer_on_unknown_source() {
        let json = r#"{ "style": { "sources": [], "layers": [
            { "id": "l", "source": "nope", "kind": "circle" } ] } }"#;
        let err = ViewportConfig::from_json_str(json).unwrap_err();
        assert!(err.to_string().contains("unknown source nope"));
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        assert!(matches!(
            ViewportConfig::from_json_str("{ not json"),
            Err(ConfigError::Parse(_))
        ));
    }
}
