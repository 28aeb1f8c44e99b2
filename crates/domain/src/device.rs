//! Device record: what a device can do and which protocols announced it.
//!
//! Visibility under protocol isolation is decided here, as pure logic, by
//! combining the directory-wide isolation flag with the per-device
//! [`ConnectionMode`].

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::effect::{Location, Parameters};
use crate::error::{EffectHubError, ValidationError};
use crate::id::DeviceId;
use crate::time::{Timestamp, now};

/// Metadata key holding a device's placement (`left`, `right`, …).
pub const LOCATION_KEY: &str = "location";

/// Per-device override of the directory isolation policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionMode {
    /// Follow the directory-wide isolation flag.
    #[default]
    Shared,
    /// Always isolated: one independent record per announcing protocol.
    Isolated,
}

/// A device known to the directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceRecord {
    pub id: DeviceId,
    pub name: String,
    pub device_type: String,
    pub capabilities: BTreeSet<String>,
    pub source_protocols: BTreeSet<String>,
    pub connection_mode: ConnectionMode,
    pub metadata: Parameters,
    pub registered_at: Timestamp,
    pub last_seen: Timestamp,
}

impl DeviceRecord {
    /// Create a builder for constructing a [`DeviceRecord`].
    #[must_use]
    pub fn builder() -> DeviceRecordBuilder {
        DeviceRecordBuilder::default()
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`EffectHubError::Validation`] when `device_type` is blank.
    pub fn validate(&self) -> Result<(), EffectHubError> {
        if self.device_type.trim().is_empty() {
            return Err(ValidationError::EmptyDeviceType.into());
        }
        Ok(())
    }

    /// Whether the device accepts effects of `effect_type`.
    #[must_use]
    pub fn supports(&self, effect_type: &str) -> bool {
        self.capabilities.contains(effect_type)
    }

    /// Placement read from `metadata["location"]`; anything missing or
    /// unparsable counts as [`Location::Everywhere`].
    #[must_use]
    pub fn location(&self) -> Location {
        self.metadata
            .get(LOCATION_KEY)
            .and_then(serde_json::Value::as_str)
            .and_then(|s| s.parse().ok())
            .unwrap_or_default()
    }

    /// Whether isolation applies to this record given the directory flag.
    #[must_use]
    pub fn is_isolated(&self, isolation_enabled: bool) -> bool {
        isolation_enabled || self.connection_mode == ConnectionMode::Isolated
    }

    /// Whether `requester` may see this record.
    ///
    /// `None` is the administrative view and sees everything.
    #[must_use]
    pub fn is_visible_to(&self, requester: Option<&str>, isolation_enabled: bool) -> bool {
        if !self.is_isolated(isolation_enabled) {
            return true;
        }
        requester.is_none_or(|protocol| self.source_protocols.contains(protocol))
    }

    /// Fold a re-registration of the same device into this record.
    ///
    /// Protocols and capabilities are unioned, metadata keys merged with the
    /// incoming value winning, and descriptive fields replaced. The original
    /// `registered_at` is kept.
    pub fn merge_from(&mut self, incoming: DeviceRecord) {
        self.name = incoming.name;
        self.device_type = incoming.device_type;
        self.capabilities.extend(incoming.capabilities);
        self.source_protocols.extend(incoming.source_protocols);
        self.metadata.extend(incoming.metadata);
        self.last_seen = incoming.last_seen.max(self.last_seen);
    }
}

/// Step-by-step builder for [`DeviceRecord`].
#[derive(Debug, Default)]
pub struct DeviceRecordBuilder {
    id: Option<DeviceId>,
    name: Option<String>,
    device_type: Option<String>,
    capabilities: BTreeSet<String>,
    source_protocols: BTreeSet<String>,
    connection_mode: ConnectionMode,
    metadata: Parameters,
}

impl DeviceRecordBuilder {
    #[must_use]
    pub fn id(mut self, id: DeviceId) -> Self {
        self.id = Some(id);
        self
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn device_type(mut self, device_type: impl Into<String>) -> Self {
        self.device_type = Some(device_type.into());
        self
    }

    #[must_use]
    pub fn capability(mut self, capability: impl Into<String>) -> Self {
        self.capabilities.insert(capability.into());
        self
    }

    #[must_use]
    pub fn capabilities<I, S>(mut self, capabilities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.capabilities
            .extend(capabilities.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn source_protocol(mut self, protocol: impl Into<String>) -> Self {
        self.source_protocols.insert(protocol.into());
        self
    }

    #[must_use]
    pub fn connection_mode(mut self, mode: ConnectionMode) -> Self {
        self.connection_mode = mode;
        self
    }

    #[must_use]
    pub fn location(self, location: Location) -> Self {
        self.metadata_entry(LOCATION_KEY, location.to_string())
    }

    #[must_use]
    pub fn metadata_entry(
        mut self,
        key: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Consume the builder, validate, and return a [`DeviceRecord`].
    ///
    /// A missing id is generated; a missing name defaults to the id.
    ///
    /// # Errors
    ///
    /// Returns [`EffectHubError::Validation`] if `device_type` is missing or blank.
    pub fn build(self) -> Result<DeviceRecord, EffectHubError> {
        let id = self.id.unwrap_or_else(DeviceId::generate);
        let timestamp = now();
        let record = DeviceRecord {
            name: self.name.unwrap_or_else(|| id.to_string()),
            id,
            device_type: self.device_type.unwrap_or_default(),
            capabilities: self.capabilities,
            source_protocols: self.source_protocols,
            connection_mode: self.connection_mode,
            metadata: self.metadata,
            registered_at: timestamp,
            last_seen: timestamp,
        };
        record.validate()?;
        Ok(record)
    }
}
