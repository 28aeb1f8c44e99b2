//! # effecthub-adapter-simulated
//!
//! In-memory [`DeviceDriver`] standing in for real transports. Useful for
//! demos, integration tests and exercising partial-failure paths without
//! hardware.
//!
//! ## Behaviour
//!
//! | Device state | `send_command` result |
//! |--------------|-----------------------|
//! | unknown or disconnected | `DriverError::Unreachable` |
//! | fault `Reject(reason)` | `DriverError::Rejected(reason)` |
//! | fault `Timeout` | `DriverError::Timeout` (after the configured latency) |
//! | healthy | `Ack` echoing device and command; the command is logged |
//!
//! ## Dependency rule
//!
//! Depends on `effecthub-app` (port traits) and `effecthub-domain` only.

pub mod devices;

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError, RwLock};
use std::time::Duration;

use effecthub_app::ports::DeviceDriver;
use effecthub_domain::dispatch::{Ack, DriverError};
use effecthub_domain::effect::Parameters;
use effecthub_domain::id::DeviceId;
use effecthub_domain::time::{Timestamp, now};

pub use devices::{SimulatedDevice, demo_devices};

/// Scripted misbehaviour for one device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fault {
    Reject(String),
    Timeout,
}

/// One command accepted by a simulated device.
#[derive(Debug, Clone, PartialEq)]
pub struct SentCommand {
    pub device_id: DeviceId,
    pub command: String,
    pub params: Parameters,
    pub at: Timestamp,
}

#[derive(Debug, Clone)]
struct DeviceSlot {
    connected: bool,
    fault: Option<Fault>,
}

/// Driver for simulated devices.
#[derive(Debug, Default)]
pub struct SimulatedDriver {
    devices: RwLock<HashMap<DeviceId, DeviceSlot>>,
    log: Mutex<Vec<SentCommand>>,
    latency: Duration,
}

impl SimulatedDriver {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every answer by `latency`.
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Attach a connected, healthy device.
    pub fn attach(&self, device_id: DeviceId) {
        tracing::debug!(device_id = %device_id, "simulated device attached");
        self.devices.write().unwrap_or_else(PoisonError::into_inner).insert(
            device_id,
            DeviceSlot {
                connected: true,
                fault: None,
            },
        );
    }

    /// Detach a device. Returns whether it was attached.
    pub fn detach(&self, device_id: &DeviceId) -> bool {
        self.devices
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(device_id)
            .is_some()
    }

    /// Flip the connection flag of an attached device.
    pub fn set_connected(&self, device_id: &DeviceId, connected: bool) {
        if let Some(slot) = self
            .devices
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .get_mut(device_id)
        {
            slot.connected = connected;
        }
    }

    /// Script (or clear, with `None`) a fault for an attached device.
    pub fn set_fault(&self, device_id: &DeviceId, fault: Option<Fault>) {
        if let Some(slot) = self
            .devices
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .get_mut(device_id)
        {
            slot.fault = fault;
        }
    }

    /// Every accepted command, oldest first.
    #[must_use]
    pub fn commands(&self) -> Vec<SentCommand> {
        self.log().clone()
    }

    /// Accepted commands for one device, oldest first.
    #[must_use]
    pub fn commands_for(&self, device_id: &DeviceId) -> Vec<SentCommand> {
        self.log()
            .iter()
            .filter(|sent| sent.device_id == *device_id)
            .cloned()
            .collect()
    }

    pub fn clear_log(&self) {
        self.log().clear();
    }

    fn slot(&self, device_id: &DeviceId) -> Option<DeviceSlot> {
        self.devices
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(device_id)
            .cloned()
    }

    fn log(&self) -> MutexGuard<'_, Vec<SentCommand>> {
        self.log.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn outcome(
        &self,
        device_id: &DeviceId,
        command: &str,
        params: Parameters,
    ) -> Result<Ack, DriverError> {
        let slot = self
            .slot(device_id)
            .filter(|slot| slot.connected)
            .ok_or(DriverError::Unreachable)?;

        match slot.fault {
            Some(Fault::Reject(reason)) => Err(DriverError::Rejected(reason)),
            Some(Fault::Timeout) => Err(DriverError::Timeout),
            None => {
                tracing::info!(
                    device_id = %device_id,
                    command,
                    params = %serde_json::Value::Object(params.clone()),
                    "simulated command"
                );
                self.log().push(SentCommand {
                    device_id: device_id.clone(),
                    command: command.to_string(),
                    params,
                    at: now(),
                });
                Ok(Ack {
                    detail: Some(serde_json::json!({
                        "device_id": device_id.as_str(),
                        "command": command,
                    })),
                })
            }
        }
    }
}

impl DeviceDriver for SimulatedDriver {
    fn send_command(
        &self,
        device_id: &DeviceId,
        command: &str,
        params: Parameters,
    ) -> impl Future<Output = Result<Ack, DriverError>> + Send {
        let outcome = self.outcome(device_id, command, params);
        let latency = self.latency;
        async move {
            if !latency.is_zero() {
                tokio::time::sleep(latency).await;
            }
            outcome
        }
    }

    fn is_connected(&self, device_id: &DeviceId) -> bool {
        self.slot(device_id).is_some_and(|slot| slot.connected)
    }
}
