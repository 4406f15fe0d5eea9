use std::path::{Path, PathBuf};

use foundation::geo::LngLat;
use foundation::ids::MarkerId;
use foundation::screen::ScreenSize;
use runtime::frame::Frame;
use runtime::metrics::MetricsSnapshot;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use viewport::sim::{SimCall, SimRenderer};
use viewport::{
    ConfigError, MapViewport, TransitionTag, ViewportCallbacks, ViewportConfig, ViewportProps,
};

#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub config: Option<serde_json::Value>,
    #[serde(default = "default_viewport")]
    pub viewport: ScreenSize,
    #[serde(default)]
    pub camera: Option<StartCamera>,
    pub steps: Vec<Step>,
}

fn default_viewport() -> ScreenSize {
    ScreenSize::new(400.0, 800.0)
}

#[derive(Debug, Copy, Clone, Deserialize)]
pub struct StartCamera {
    pub center: LngLat,
    pub zoom: f64,
}

/// One host-side event fed to the viewport, in scenario order.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum Step {
    Render { props: ViewportProps },
    Load,
    /// Style swap; `reset` also wipes the simulated renderer's tables.
    StyleLoad {
        #[serde(default = "yes")]
        reset: bool,
    },
    StyleReady { ready: bool },
    /// Ends the running animation and forwards its movement-ended event.
    FinishAnimation,
    MoveEnd {
        #[serde(default)]
        tag: Option<u64>,
    },
    Idle,
    Frame {
        #[serde(default = "frame_ms")]
        dt_ms: f64,
    },
    PopupNodeReady { ready: bool },
    MarkerClick { id: MarkerId },
    MapClick,
    PopupClick,
    PopupClosed,
    Unmount,
}

fn yes() -> bool {
    true
}

fn frame_ms() -> f64 {
    16.0
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "callback", content = "id", rename_all = "snake_case")]
pub enum Callback {
    Highlight(Option<MarkerId>),
    OpenDetail(MarkerId),
    FocusConsumed(MarkerId),
}

#[derive(Debug, Default)]
pub struct CallbackLog(pub Vec<Callback>);

impl ViewportCallbacks for CallbackLog {
    fn on_highlight(&mut self, id: Option<&MarkerId>) {
        self.0.push(Callback::Highlight(id.cloned()));
    }

    fn on_open_detail(&mut self, id: &MarkerId) {
        self.0.push(Callback::OpenDetail(id.clone()));
    }

    fn on_focus_consumed(&mut self, id: &MarkerId) {
        self.0.push(Callback::FocusConsumed(id.clone()));
    }
}

#[derive(Debug, Serialize)]
pub struct Report {
    pub calls: Vec<SimCall>,
    pub callbacks: Vec<Callback>,
    pub metrics: MetricsSnapshot,
    pub highlight: Option<MarkerId>,
    pub popup_visible: bool,
    pub torn_down: bool,
}

#[derive(Debug)]
pub enum ScenarioError {
    Io { path: PathBuf, source: std::io::Error },
    Parse(serde_json::Error),
    Config(ConfigError),
    Report(serde_json::Error),
}

impl std::fmt::Display for ScenarioError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScenarioError::Io { path, source } => {
                write!(f, "failed to read {}: {source}", path.display())
            }
            ScenarioError::Parse(e) => write!(f, "failed to parse scenario: {e}"),
            ScenarioError::Config(e) => write!(f, "{e}"),
            ScenarioError::Report(e) => write!(f, "failed to write report: {e}"),
        }
    }
}

impl std::error::Error for ScenarioError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ScenarioError::Io { source, .. } => Some(source),
            ScenarioError::Parse(e) | ScenarioError::Report(e) => Some(e),
            ScenarioError::Config(e) => Some(e),
        }
    }
}

pub fn read_to_string(path: &Path) -> Result<String, ScenarioError> {
    std::fs::read_to_string(path).map_err(|source| ScenarioError::Io {
        path: path.to_path_buf(),
        source,
    })
}

impl Scenario {
    pub fn from_json_str(json: &str) -> Result<Self, ScenarioError> {
        serde_json::from_str(json).map_err(ScenarioError::Parse)
    }

    /// The scenario's embedded config, or defaults.
    pub fn config(&self) -> Result<ViewportConfig, ScenarioError> {
        match &self.config {
            None => Ok(ViewportConfig::default()),
            Some(value) => {
                let config: ViewportConfig = serde_json::from_value(value.clone())
                    .map_err(|e| ScenarioError::Config(ConfigError::Parse(e)))?;
                config.validate().map_err(ScenarioError::Config)?;
                Ok(config)
            }
        }
    }
}

/// Plays `scenario` against a simulated renderer and reports what happened.
pub fn run(scenario: &Scenario, config: ViewportConfig) -> Report {
    let mut map = SimRenderer::with_viewport(scenario.viewport);
    if let Some(camera) = scenario.camera {
        map.jump_to(camera.center, camera.zoom);
    }
    let mut view = MapViewport::new(map, config, CallbackLog::default());
    let mut frame = Frame::first();

    for (i, step) in scenario.steps.iter().enumerate() {
        debug!(step = i, ?step, "replaying step");
        match step {
            Step::Render { props } => view.render(props.clone()),
            Step::Load => view.on_load(),
            Step::StyleLoad { reset } => {
                if *reset {
                    view.map_mut().reload_style();
                }
                view.on_style_load();
            }
            Step::StyleReady { ready } => view.map_mut().set_style_loaded(*ready),
            Step::FinishAnimation => {
                let tag = view.map_mut().finish_animation();
                view.on_move_end(tag);
            }
            Step::MoveEnd { tag } => view.on_move_end(tag.map(TransitionTag)),
            Step::Idle => view.on_idle(),
            Step::Frame { dt_ms } => {
                frame = frame.next(*dt_ms);
                view.on_frame(frame);
            }
            Step::PopupNodeReady { ready } => view.map_mut().set_popup_node_ready(*ready),
            Step::MarkerClick { id } => view.on_marker_click(id),
            Step::MapClick => view.on_map_click(),
            Step::PopupClick => view.on_popup_click(),
            Step::PopupClosed => view.on_popup_closed(),
            Step::Unmount => view.unmount(),
        }
    }

    let metrics = view.metrics().snapshot();
    let highlight = view.highlight().cloned();
    let torn_down = view.is_torn_down();
    let popup_visible = view.map().popup_visible();
    let (mut map, callbacks) = view.into_parts();
    info!(
        steps = scenario.steps.len(),
        calls = map.calls().len(),
        "scenario replayed"
    );

    Report {
        calls: map.take_calls(),
        callbacks: callbacks.0,
        metrics,
        highlight,
        popup_visible,
        torn_down,
    }
}
