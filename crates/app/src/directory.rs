//! In-process device directory with optional per-protocol isolation.
//!
//! Every ingress adapter registers the devices it discovers here. Records
//! announced by several protocols are merged into one (their
//! `source_protocols` unioned) unless isolation applies, in which case each
//! protocol gets an independent shadow record keyed by `(id, protocol)`.
//!
//! Mutations take the write lock and publish their [`DirectoryEvent`] before
//! releasing it, so subscribers observe events in mutation order and never
//! see a mutation without its event.

use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::Serialize;
use tokio::sync::broadcast;

use effecthub_domain::device::DeviceRecord;
use effecthub_domain::effect::Location;
use effecthub_domain::error::{EffectHubError, NotFoundError};
use effecthub_domain::id::DeviceId;

/// Default capacity of the directory event channel.
pub const DEFAULT_EVENT_CAPACITY: usize = 256;

/// Kind of directory mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DirectoryEventKind {
    Registered,
    Unregistered,
    Updated,
}

/// A directory mutation, carrying the record as it stands afterwards (or as
/// it stood before removal).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DirectoryEvent {
    pub kind: DirectoryEventKind,
    pub record: DeviceRecord,
}

/// Predicates for [`DeviceDirectory::list`]. All set predicates must hold.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceFilter {
    pub protocol: Option<String>,
    pub device_type: Option<String>,
    pub capability: Option<String>,
    pub location: Option<Location>,
}

impl DeviceFilter {
    /// Match every device.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn protocol(mut self, protocol: impl Into<String>) -> Self {
        self.protocol = Some(protocol.into());
        self
    }

    #[must_use]
    pub fn device_type(mut self, device_type: impl Into<String>) -> Self {
        self.device_type = Some(device_type.into());
        self
    }

    #[must_use]
    pub fn capability(mut self, capability: impl Into<String>) -> Self {
        self.capability = Some(capability.into());
        self
    }

    /// Devices placed at `location`, or everywhere.
    #[must_use]
    pub fn location(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }

    #[must_use]
    pub fn matches(&self, record: &DeviceRecord) -> bool {
        self.protocol
            .as_ref()
            .is_none_or(|p| record.source_protocols.contains(p))
            && self
                .device_type
                .as_ref()
                .is_none_or(|t| &record.device_type == t)
            && self.capability.as_ref().is_none_or(|c| record.supports(c))
            && self
                .location
                .is_none_or(|l| record.location().covers(l))
    }
}

/// Counts of the devices visible to one requester.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DirectoryStats {
    pub count: usize,
    pub by_type: BTreeMap<String, usize>,
    pub by_protocol: BTreeMap<String, usize>,
}

#[derive(Default)]
struct DirectoryState {
    isolation_enabled: bool,
    merged: BTreeMap<DeviceId, DeviceRecord>,
    shadows: BTreeMap<(DeviceId, String), DeviceRecord>,
}

impl DirectoryState {
    fn shadow_keys(&self, id: &DeviceId) -> Vec<(DeviceId, String)> {
        self.shadows
            .range((id.clone(), String::new())..)
            .take_while(|((shadow_id, _), _)| shadow_id == id)
            .map(|(key, _)| key.clone())
            .collect()
    }

    /// Visible records, shadows of the requester shadowing merged records
    /// with the same id.
    fn visible<'a>(&'a self, requester: Option<&'a str>) -> Vec<&'a DeviceRecord> {
        let isolation = self.isolation_enabled;
        let own_shadows: HashSet<&DeviceId> = match requester {
            Some(protocol) => self
                .shadows
                .keys()
                .filter(|(_, p)| p == protocol)
                .map(|(id, _)| id)
                .collect(),
            None => HashSet::new(),
        };

        let mut records: Vec<&DeviceRecord> = self
            .merged
            .values()
            .filter(|r| !own_shadows.contains(&r.id))
            .chain(self.shadows.values())
            .filter(|r| r.is_visible_to(requester, isolation))
            .collect();
        records.sort_by(|a, b| a.id.cmp(&b.id));
        records
    }
}

/// Concurrency-safe registry of devices.
///
/// Reads proceed concurrently; mutations are serialised behind one writer.
pub struct DeviceDirectory {
    state: RwLock<DirectoryState>,
    events: broadcast::Sender<DirectoryEvent>,
}

impl Default for DeviceDirectory {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CAPACITY)
    }
}

impl DeviceDirectory {
    /// Create an empty directory in shared mode.
    ///
    /// # Panics
    ///
    /// Panics if `event_capacity` is zero.
    #[must_use]
    pub fn new(event_capacity: usize) -> Self {
        let (events, _) = broadcast::channel(event_capacity);
        Self {
            state: RwLock::new(DirectoryState::default()),
            events,
        }
    }

    /// Subscribe to directory mutations made *after* this call.
    ///
    /// Receivers that fall more than the channel capacity behind lose the
    /// oldest events and get [`broadcast::error::RecvError::Lagged`].
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<DirectoryEvent> {
        self.events.subscribe()
    }

    /// Register (or re-register) `record` as announced by `protocol`.
    ///
    /// Merges into an existing record with the same id, or forks a shadow
    /// record for `protocol` when isolation applies. Never fails.
    #[tracing::instrument(skip(self, record), fields(device_id = %record.id))]
    pub fn register(&self, mut record: DeviceRecord, protocol: &str) -> DeviceRecord {
        let mut state = self.write();

        let (kind, stored) = if record.is_isolated(state.isolation_enabled) {
            record.source_protocols = BTreeSet::from([protocol.to_string()]);
            let key = (record.id.clone(), protocol.to_string());
            upsert(state.shadows.entry(key), record)
        } else {
            record.source_protocols.insert(protocol.to_string());
            let key = record.id.clone();
            upsert(state.merged.entry(key), record)
        };

        tracing::info!(
            protocol,
            device_type = %stored.device_type,
            event = ?kind,
            "device registered"
        );
        self.notify(kind, &stored);
        stored
    }

    /// Remove a device, or only `protocol`'s view of it.
    ///
    /// With `protocol = None` the merged record and every shadow for `id` go.
    /// With a protocol, that protocol's shadow goes if it has one; otherwise
    /// the protocol is detached from the merged record when the record is
    /// isolated and still referenced by other protocols, and the record is
    /// removed outright in every other case.
    ///
    /// # Errors
    ///
    /// Returns [`EffectHubError::NotFound`] when nothing visible to
    /// `protocol` matched `id`.
    #[tracing::instrument(skip(self))]
    pub fn unregister(&self, id: &DeviceId, protocol: Option<&str>) -> Result<(), EffectHubError> {
        let mut state = self.write();
        let isolation = state.isolation_enabled;

        let Some(protocol) = protocol else {
            let mut removed = Vec::new();
            removed.extend(state.merged.remove(id));
            for key in state.shadow_keys(id) {
                removed.extend(state.shadows.remove(&key));
            }
            if removed.is_empty() {
                return Err(not_found(id));
            }
            for record in &removed {
                self.notify(DirectoryEventKind::Unregistered, record);
            }
            tracing::info!(count = removed.len(), "device unregistered");
            return Ok(());
        };

        if let Some(record) = state.shadows.remove(&(id.clone(), protocol.to_string())) {
            self.notify(DirectoryEventKind::Unregistered, &record);
            tracing::info!(protocol, "shadow record unregistered");
            return Ok(());
        }

        let Entry::Occupied(mut entry) = state.merged.entry(id.clone()) else {
            return Err(not_found(id));
        };
        let record = entry.get_mut();
        let isolated = record.is_isolated(isolation);
        if isolated && !record.source_protocols.contains(protocol) {
            return Err(not_found(id));
        }

        if isolated && record.source_protocols.len() > 1 {
            record.source_protocols.remove(protocol);
            let snapshot = record.clone();
            self.notify(DirectoryEventKind::Updated, &snapshot);
            tracing::info!(protocol, "protocol detached from device");
        } else {
            let record = entry.remove();
            self.notify(DirectoryEventKind::Unregistered, &record);
            tracing::info!(protocol, "device unregistered");
        }
        Ok(())
    }

    /// Look up a device as seen by `requester`.
    ///
    /// A shadow record of the requester wins over the merged record.
    ///
    /// # Errors
    ///
    /// Returns [`EffectHubError::NotFound`] when the id is unknown or hidden
    /// from `requester` by isolation.
    pub fn get(&self, id: &DeviceId, requester: Option<&str>) -> Result<DeviceRecord, EffectHubError> {
        let state = self.read();

        if let Some(protocol) = requester
            && let Some(record) = state.shadows.get(&(id.clone(), protocol.to_string()))
        {
            return Ok(record.clone());
        }
        if let Some(record) = state
            .merged
            .get(id)
            .filter(|r| r.is_visible_to(requester, state.isolation_enabled))
        {
            return Ok(record.clone());
        }
        if requester.is_none()
            && let Some(key) = state.shadow_keys(id).first()
        {
            return Ok(state.shadows[key].clone());
        }
        Err(not_found(id))
    }

    /// Devices visible to `requester` that match `filter`, ordered by id.
    #[must_use]
    pub fn list(&self, requester: Option<&str>, filter: &DeviceFilter) -> Vec<DeviceRecord> {
        let state = self.read();
        state
            .visible(requester)
            .into_iter()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect()
    }

    /// Counts of the devices visible to `requester`.
    #[must_use]
    pub fn stats(&self, requester: Option<&str>) -> DirectoryStats {
        let state = self.read();
        let mut stats = DirectoryStats::default();
        for record in state.visible(requester) {
            stats.count += 1;
            *stats.by_type.entry(record.device_type.clone()).or_default() += 1;
            for protocol in &record.source_protocols {
                *stats.by_protocol.entry(protocol.clone()).or_default() += 1;
            }
        }
        stats
    }

    /// Toggle directory-wide isolation. Existing records are not re-keyed;
    /// only visibility and future registrations change.
    pub fn set_isolation(&self, enabled: bool) {
        let mut state = self.write();
        if state.isolation_enabled != enabled {
            tracing::info!(enabled, "directory isolation changed");
        }
        state.isolation_enabled = enabled;
    }

    #[must_use]
    pub fn is_isolation_enabled(&self) -> bool {
        self.read().isolation_enabled
    }

    /// Remove every record, emitting one `Unregistered` event each.
    /// Returns how many records were removed.
    pub fn clear(&self) -> usize {
        let mut state = self.write();
        let merged = std::mem::take(&mut state.merged);
        let shadows = std::mem::take(&mut state.shadows);
        let mut count = 0;
        for record in merged.into_values().chain(shadows.into_values()) {
            self.notify(DirectoryEventKind::Unregistered, &record);
            count += 1;
        }
        tracing::info!(count, "directory cleared");
        count
    }

    fn notify(&self, kind: DirectoryEventKind, record: &DeviceRecord) {
        // send fails only when there are no receivers, which is fine.
        let _ = self.events.send(DirectoryEvent {
            kind,
            record: record.clone(),
        });
    }

    fn read(&self) -> RwLockReadGuard<'_, DirectoryState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, DirectoryState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

fn upsert<K: Ord>(
    entry: Entry<'_, K, DeviceRecord>,
    record: DeviceRecord,
) -> (DirectoryEventKind, DeviceRecord) {
    match entry {
        Entry::Occupied(mut existing) => {
            existing.get_mut().merge_from(record);
            (DirectoryEventKind::Updated, existing.get().clone())
        }
        Entry::Vacant(slot) => (DirectoryEventKind::Registered, slot.insert(record).clone()),
    }
}

fn not_found(id: &DeviceId) -> EffectHubError {
    NotFoundError {
        entity: "Device",
        id: id.to_string(),
    }
    .into()
}
