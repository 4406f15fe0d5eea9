pub mod deferred;
pub mod frame;
pub mod metrics;

pub use deferred::*;
pub use frame::*;
pub use metrics::*;
