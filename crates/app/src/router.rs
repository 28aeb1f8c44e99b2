//! Effect router: turns an abstract effect and a target into device commands.
//!
//! For each dispatch the router resolves candidate devices through the
//! [`DeviceDirectory`] (isolation-aware), skips devices lacking the effect
//! capability, translates parameters, and sends one command per device
//! through the [`DispatchGateway`]. Per-device outcomes are aggregated into
//! a [`DispatchResult`]; the call itself never fails.
//!
//! Devices of one dispatch are served sequentially, so a device receives the
//! commands of a single caller in issue order. Concurrent dispatches to the
//! same device from different callers may interleave.

use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;

use effecthub_domain::device::DeviceRecord;
use effecthub_domain::dispatch::{DispatchResult, DriverError, SkipReason, Target};
use effecthub_domain::effect::Effect;
use effecthub_domain::translation::TranslationTable;

use crate::directory::{DeviceDirectory, DeviceFilter};
use crate::gateway::DispatchGateway;
use crate::ports::EffectDispatcher;

/// Resolves targets and delivers effects.
pub struct EffectRouter {
    directory: Arc<DeviceDirectory>,
    gateway: Arc<DispatchGateway>,
    translation: TranslationTable,
}

impl EffectRouter {
    /// Create a router over a shared directory and gateway.
    pub fn new(
        directory: Arc<DeviceDirectory>,
        gateway: Arc<DispatchGateway>,
        translation: TranslationTable,
    ) -> Self {
        Self {
            directory,
            gateway,
            translation,
        }
    }

    #[must_use]
    pub fn directory(&self) -> &Arc<DeviceDirectory> {
        &self.directory
    }

    /// Devices `target` resolves to for `requester`, one record per id.
    #[must_use]
    pub fn resolve(&self, target: &Target, requester: Option<&str>) -> Vec<DeviceRecord> {
        let candidates = match target {
            Target::Device(id) => self.directory.get(id, requester).ok().into_iter().collect(),
            Target::DeviceType(device_type) => self
                .directory
                .list(requester, &DeviceFilter::all().device_type(device_type.as_str())),
            Target::Location(location) => self
                .directory
                .list(requester, &DeviceFilter::all().location(*location)),
        };

        let mut seen = HashSet::new();
        candidates
            .into_iter()
            .filter(|record| seen.insert(record.id.clone()))
            .collect()
    }

    /// Deliver `effect` to every device `target` resolves to.
    ///
    /// Unsupported devices are reported in `skipped`; driver failures
    /// (unreachable, rejected, timeout) in `failed`. Nothing is retried.
    #[tracing::instrument(
        skip(self, effect),
        fields(effect_type = effect.effect_type(), target = %target)
    )]
    pub async fn dispatch(
        &self,
        effect: &Effect,
        target: &Target,
        requesting_protocol: Option<&str>,
    ) -> DispatchResult {
        let devices = self.resolve(target, requesting_protocol);
        if devices.is_empty() {
            tracing::debug!("no device matched target");
            return DispatchResult::no_target();
        }

        let params = self.translation.command_params(effect);
        let mut result = DispatchResult::default();

        for device in devices {
            if !device.supports(effect.effect_type()) {
                tracing::debug!(device_id = %device.id, "device lacks capability");
                result.push_skipped(
                    device.id,
                    SkipReason::Unsupported {
                        effect_type: effect.effect_type().to_string(),
                    },
                );
                continue;
            }

            match self
                .gateway
                .send_command(&device.id, effect.effect_type(), params.clone())
                .await
            {
                Ok(_) => {
                    tracing::debug!(device_id = %device.id, "command delivered");
                    result.push_delivered(device.id);
                }
                Err(DriverError::Unreachable) => {
                    tracing::warn!(device_id = %device.id, "device unreachable, skipping");
                    result.push_failed(device.id, DriverError::Unreachable);
                }
                Err(err) => {
                    tracing::warn!(device_id = %device.id, error = %err, "command failed");
                    result.push_failed(device.id, err);
                }
            }
        }

        result
    }
}

impl EffectDispatcher for EffectRouter {
    fn dispatch(
        &self,
        effect: &Effect,
        target: &Target,
        requesting_protocol: Option<&str>,
    ) -> impl Future<Output = DispatchResult> + Send {
        EffectRouter::dispatch(self, effect, target, requesting_protocol)
    }
}
