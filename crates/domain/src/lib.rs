//! # effecthub-domain
//!
//! Pure domain model for the effecthub multi-sensory effect system.
//!
//! ## Responsibilities
//! - Foundational types: typed identifiers, error conventions, timestamps
//! - Define **Effects** (one sensory output request: type, timing, intensity, parameters)
//! - Define **Device records** (what a device can do and which protocols announced it)
//! - Define **Timelines** (ordered, time-offset sequences of effects) and playback status
//! - Define **Dispatch** targets and aggregated per-device outcomes
//! - Define the **translation table** turning symbolic parameters into driver values
//! - Contain all invariant enforcement and domain logic
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;
pub mod time;

pub mod device;
pub mod dispatch;
pub mod effect;
pub mod timeline;
pub mod translation;
