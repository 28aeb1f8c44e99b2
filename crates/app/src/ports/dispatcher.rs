//! Dispatcher port: where fired timeline entries go.

use std::future::Future;

use effecthub_domain::dispatch::{DispatchResult, Target};
use effecthub_domain::effect::Effect;

/// Resolves a target and delivers an effect, aggregating per-device outcomes.
///
/// [`EffectRouter`](crate::router::EffectRouter) is the production
/// implementation; the scheduler depends only on this trait.
pub trait EffectDispatcher: Send + Sync {
    fn dispatch(
        &self,
        effect: &Effect,
        target: &Target,
        requesting_protocol: Option<&str>,
    ) -> impl Future<Output = DispatchResult> + Send;
}

impl<T: EffectDispatcher> EffectDispatcher for std::sync::Arc<T> {
    fn dispatch(
        &self,
        effect: &Effect,
        target: &Target,
        requesting_protocol: Option<&str>,
    ) -> impl Future<Output = DispatchResult> + Send {
        (**self).dispatch(effect, target, requesting_protocol)
    }
}
