//! Simulated device descriptors.
//!
//! A [`SimulatedDevice`] describes one fake effect device: what it can do,
//! where it sits, and which protocol announces it. The daemon reads them
//! from `[[simulated.devices]]`; [`demo_devices`] supplies a stable default
//! set so the stack has something to drive out of the box.

use serde::Deserialize;

use effecthub_domain::device::{ConnectionMode, DeviceRecord};
use effecthub_domain::effect::Location;
use effecthub_domain::error::EffectHubError;
use effecthub_domain::id::DeviceId;

/// Protocol name used when a descriptor does not name one.
pub const DEFAULT_PROTOCOL: &str = "simulated";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SimulatedDevice {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    pub device_type: String,
    /// Defaults to the device type alone.
    #[serde(default)]
    pub capabilities: Vec<String>,
    #[serde(default = "default_protocol")]
    pub protocol: String,
    #[serde(default)]
    pub location: Location,
    /// Register with [`ConnectionMode::Isolated`].
    #[serde(default)]
    pub isolated: bool,
}

fn default_protocol() -> String {
    DEFAULT_PROTOCOL.to_string()
}

impl SimulatedDevice {
    #[must_use]
    pub fn new(id: impl Into<String>, device_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            device_type: device_type.into(),
            capabilities: Vec::new(),
            protocol: default_protocol(),
            location: Location::default(),
            isolated: false,
        }
    }

    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn capability(mut self, capability: impl Into<String>) -> Self {
        self.capabilities.push(capability.into());
        self
    }

    #[must_use]
    pub fn located(mut self, location: Location) -> Self {
        self.location = location;
        self
    }

    #[must_use]
    pub fn announced_by(mut self, protocol: impl Into<String>) -> Self {
        self.protocol = protocol.into();
        self
    }

    /// Build the directory record for this device.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an empty id or device type.
    pub fn to_record(&self) -> Result<DeviceRecord, EffectHubError> {
        let capabilities = if self.capabilities.is_empty() {
            vec![self.device_type.clone()]
        } else {
            self.capabilities.clone()
        };
        let mode = if self.isolated {
            ConnectionMode::Isolated
        } else {
            ConnectionMode::Shared
        };

        let mut builder = DeviceRecord::builder()
            .id(DeviceId::new(self.id.as_str())?)
            .device_type(self.device_type.as_str())
            .capabilities(capabilities)
            .connection_mode(mode)
            .location(self.location);
        if let Some(name) = &self.name {
            builder = builder.name(name.as_str());
        }
        builder.build()
    }
}

/// A small 4D-seat rig: two vest actuators, a fan, a lamp and a diffuser.
#[must_use]
pub fn demo_devices() -> Vec<SimulatedDevice> {
    vec![
        SimulatedDevice::new("sim-vest-left", "vibration")
            .named("Vest (left)")
            .located(Location::Left),
        SimulatedDevice::new("sim-vest-right", "vibration")
            .named("Vest (right)")
            .located(Location::Right),
        SimulatedDevice::new("sim-fan", "wind")
            .named("Front fan")
            .located(Location::Center),
        SimulatedDevice::new("sim-lamp", "light")
            .named("Ambient lamp")
            .capability("light")
            .capability("flash"),
        SimulatedDevice::new("sim-diffuser", "scent").named("Scent diffuser"),
    ]
}
