//! Port definitions: traits at the boundary of the orchestration core.
//!
//! Ports are the boundaries between the core and the outside world. They are
//! defined here (in `app`) so that both the core and the adapter layer can
//! depend on them without creating circular dependencies.

pub mod dispatcher;
pub mod driver;
pub mod observer;

pub use dispatcher::EffectDispatcher;
pub use driver::DeviceDriver;
pub use observer::PlaybackObserver;
