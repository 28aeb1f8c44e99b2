//! Dispatch gateway: one call surface over every bound driver.
//!
//! Drivers are bound either to an explicit device id or to a device-id
//! prefix (longest prefix wins). Explicit bindings take precedence. One
//! gateway holds drivers of any concrete type side by side, e.g. a serial
//! driver on `serial:` and a radio driver on `ble:`. The gateway neither
//! retries nor times out: both are driver concerns.
//!
//! Commands issued by one caller for one device are awaited in order, so
//! they reach the driver in issue order. Two concurrent callers targeting
//! the same device may interleave; no cross-call ordering is promised.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use futures::FutureExt;
use futures::future::BoxFuture;

use effecthub_domain::dispatch::{Ack, DriverError};
use effecthub_domain::effect::Parameters;
use effecthub_domain::id::DeviceId;

use crate::ports::DeviceDriver;

/// Object-safe view of a [`DeviceDriver`], so bindings can mix driver types.
trait BoundDriver: Send + Sync {
    fn send<'a>(
        &'a self,
        device_id: &'a DeviceId,
        command: &'a str,
        params: Parameters,
    ) -> BoxFuture<'a, Result<Ack, DriverError>>;

    fn connected(&self, device_id: &DeviceId) -> bool;
}

impl<T: DeviceDriver> BoundDriver for T {
    fn send<'a>(
        &'a self,
        device_id: &'a DeviceId,
        command: &'a str,
        params: Parameters,
    ) -> BoxFuture<'a, Result<Ack, DriverError>> {
        self.send_command(device_id, command, params).boxed()
    }

    fn connected(&self, device_id: &DeviceId) -> bool {
        self.is_connected(device_id)
    }
}

type SharedDriver = Arc<dyn BoundDriver>;

#[derive(Default)]
struct Bindings {
    explicit: HashMap<DeviceId, SharedDriver>,
    prefixes: Vec<(String, SharedDriver)>,
}

/// Routes commands to the driver bound to each device.
#[derive(Default)]
pub struct DispatchGateway {
    bindings: RwLock<Bindings>,
}

impl DispatchGateway {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `driver` to one device, replacing any previous explicit binding.
    pub fn bind<T: DeviceDriver + 'static>(&self, device_id: DeviceId, driver: Arc<T>) {
        tracing::debug!(device_id = %device_id, "driver bound");
        let driver: SharedDriver = driver;
        self.write().explicit.insert(device_id, driver);
    }

    /// Bind `driver` to every device whose id starts with `prefix`.
    pub fn bind_prefix<T: DeviceDriver + 'static>(
        &self,
        prefix: impl Into<String>,
        driver: Arc<T>,
    ) {
        let prefix = prefix.into();
        let driver: SharedDriver = driver;
        tracing::debug!(prefix = %prefix, "driver bound to prefix");
        let mut bindings = self.write();
        bindings.prefixes.retain(|(existing, _)| *existing != prefix);
        bindings.prefixes.push((prefix, driver));
    }

    /// Drop an explicit binding. Returns whether one existed.
    pub fn unbind(&self, device_id: &DeviceId) -> bool {
        self.write().explicit.remove(device_id).is_some()
    }

    /// Whether any driver serves `device_id`.
    #[must_use]
    pub fn is_bound(&self, device_id: &DeviceId) -> bool {
        self.driver_for(device_id).is_some()
    }

    fn driver_for(&self, device_id: &DeviceId) -> Option<SharedDriver> {
        let bindings = self.read();
        if let Some(driver) = bindings.explicit.get(device_id) {
            return Some(Arc::clone(driver));
        }
        bindings
            .prefixes
            .iter()
            .filter(|(prefix, _)| device_id.as_str().starts_with(prefix.as_str()))
            .max_by_key(|(prefix, _)| prefix.len())
            .map(|(_, driver)| Arc::clone(driver))
    }

    /// Send one command through the bound driver.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::Unreachable`] when no driver is bound, or
    /// whatever the driver reports.
    pub async fn send_command(
        &self,
        device_id: &DeviceId,
        command: &str,
        params: Parameters,
    ) -> Result<Ack, DriverError> {
        let Some(driver) = self.driver_for(device_id) else {
            tracing::debug!(device_id = %device_id, "no driver bound");
            return Err(DriverError::Unreachable);
        };
        driver.send(device_id, command, params).await
    }

    /// Whether a bound driver reports the device as connected.
    #[must_use]
    pub fn is_connected(&self, device_id: &DeviceId) -> bool {
        self.driver_for(device_id)
            .is_some_and(|driver| driver.connected(device_id))
    }

    fn read(&self) -> RwLockReadGuard<'_, Bindings> {
        self.bindings.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Bindings> {
        self.bindings.write().unwrap_or_else(PoisonError::into_inner)
    }
}
