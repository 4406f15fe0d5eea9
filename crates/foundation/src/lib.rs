pub mod geo;
pub mod ids;
pub mod screen;
pub mod time;

// Foundation crate: small, well-tested primitives only.
pub use geo::*;
pub use ids::*;
pub use screen::*;
pub use time::*;
