//! Driver port: the single interface every concrete transport implements.
//!
//! A driver bridges one transport (serial port, short-range radio, message
//! queue, simulation, …) to physical devices. The core only ever sees this
//! trait; which driver serves which device is decided by gateway bindings.

use std::future::Future;

use effecthub_domain::dispatch::{Ack, DriverError};
use effecthub_domain::effect::Parameters;
use effecthub_domain::id::DeviceId;

/// Performs device I/O for the devices bound to it.
///
/// Implementations own their retry and timeout policy. The core never
/// retries a failed command.
pub trait DeviceDriver: Send + Sync {
    /// Deliver one command to a device.
    ///
    /// Commands issued for the same device id must reach the device in the
    /// order of the calls. No ordering is required across device ids.
    fn send_command(
        &self,
        device_id: &DeviceId,
        command: &str,
        params: Parameters,
    ) -> impl Future<Output = Result<Ack, DriverError>> + Send;

    /// Whether the device is currently reachable through this driver.
    fn is_connected(&self, device_id: &DeviceId) -> bool;
}

impl<T: DeviceDriver> DeviceDriver for std::sync::Arc<T> {
    fn send_command(
        &self,
        device_id: &DeviceId,
        command: &str,
        params: Parameters,
    ) -> impl Future<Output = Result<Ack, DriverError>> + Send {
        (**self).send_command(device_id, command, params)
    }

    fn is_connected(&self, device_id: &DeviceId) -> bool {
        (**self).is_connected(device_id)
    }
}
