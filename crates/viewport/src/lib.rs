//! Map viewport coordination: keeps an external map renderer's style
//! attachment, focus camera and preview popup consistent with the host's
//! selection state.

pub mod camera;
pub mod config;
pub mod focus;
pub mod guard;
pub mod marker;
pub mod popup;
pub mod renderer;
pub mod sim;
pub mod style;
pub mod view;

pub use config::{ConfigError, ViewportConfig};
pub use marker::{Marker, Selection, ViewportCallbacks, ViewportProps};
pub use renderer::{Anchor, CameraOptions, CameraState, MapRenderer, RendererError, TransitionTag};
pub use view::MapViewport;
