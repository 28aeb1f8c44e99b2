//! # effecthub-app
//!
//! Application layer: the orchestration core and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** at the edges of the core:
//!   - `DeviceDriver`: implemented by every concrete transport driver
//!   - `EffectDispatcher`: what the scheduler fires into (the router in production)
//!   - `PlaybackObserver`: callbacks ingress adapters use to report playback
//! - Provide the **in-process core**:
//!   - `DeviceDirectory`: concurrent registry with optional protocol isolation
//!   - `DispatchGateway`: uniform `send_command` / `is_connected` over bound drivers
//!   - `EffectRouter`: target resolution, translation and per-device aggregation
//!   - `TimelineScheduler`: time-accurate playback with pause/resume/seek
//!
//! ## Dependency rule
//! Depends on `effecthub-domain` only (plus `tokio` for sync primitives, timers
//! and task spawning). Never imports adapter crates. Adapters depend on *this*
//! crate, not the reverse.

pub mod directory;
pub mod gateway;
pub mod ports;
pub mod router;
pub mod scheduler;
