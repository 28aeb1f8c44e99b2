//! Dispatch targets and aggregated per-device outcomes.
//!
//! A single router call may touch many devices. Per-device problems
//! (unsupported capability, unreachable device, rejected command) are
//! collected into a [`DispatchResult`] instead of failing the whole call.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::effect::Location;
use crate::id::DeviceId;

/// What an effect is aimed at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Target {
    /// A single device by id.
    Device(DeviceId),
    /// Every visible device of a type.
    DeviceType(String),
    /// Every visible device placed at a location.
    Location(Location),
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Device(id) => write!(f, "device({id})"),
            Self::DeviceType(device_type) => write!(f, "type({device_type})"),
            Self::Location(location) => write!(f, "location({location})"),
        }
    }
}

/// Driver acknowledgement of a command.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ack {
    /// Optional driver-specific detail (firmware reply, sequence number, …).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<serde_json::Value>,
}

/// Failure reported by a driver for one command. Never retried by the core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[serde(tag = "kind", content = "reason", rename_all = "snake_case")]
pub enum DriverError {
    /// The device is not currently connected.
    #[error("device unreachable")]
    Unreachable,
    /// The device is connected but refused the command.
    #[error("command rejected: {0}")]
    Rejected(String),
    /// The driver gave up waiting for the device.
    #[error("command timed out")]
    Timeout,
}

/// Why a resolved device was not sent a command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SkipReason {
    /// The device lacks the effect type in its capabilities.
    Unsupported { effect_type: String },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unsupported { effect_type } => write!(f, "unsupported effect {effect_type}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedDevice {
    pub device_id: DeviceId,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedDevice {
    pub device_id: DeviceId,
    pub error: DriverError,
}

/// Aggregate outcome of dispatching one effect.
///
/// Partial success is not an error: callers inspect the three lists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchResult {
    pub delivered: Vec<DeviceId>,
    pub skipped: Vec<SkippedDevice>,
    pub failed: Vec<FailedDevice>,
    /// Set when the target resolved to zero devices.
    pub no_target_found: bool,
}

impl DispatchResult {
    /// Result for a target that resolved to nothing.
    #[must_use]
    pub fn no_target() -> Self {
        Self {
            no_target_found: true,
            ..Self::default()
        }
    }

    /// Number of devices the target resolved to.
    #[must_use]
    pub fn resolved(&self) -> usize {
        self.delivered.len() + self.skipped.len() + self.failed.len()
    }

    /// Whether every resolved device accepted the command.
    #[must_use]
    pub fn is_complete_success(&self) -> bool {
        !self.no_target_found && self.skipped.is_empty() && self.failed.is_empty()
    }

    pub fn push_delivered(&mut self, device_id: DeviceId) {
        self.delivered.push(device_id);
    }

    pub fn push_skipped(&mut self, device_id: DeviceId, reason: SkipReason) {
        self.skipped.push(SkippedDevice { device_id, reason });
    }

    pub fn push_failed(&mut self, device_id: DeviceId, error: DriverError) {
        self.failed.push(FailedDevice { device_id, error });
    }
}
