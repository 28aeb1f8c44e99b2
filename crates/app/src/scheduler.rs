//! Timeline scheduler: time-accurate playback of a loaded timeline.
//!
//! Two kinds of task run on the tokio runtime the scheduler was built on:
//!
//! - one **tick task** per playing stretch (`start`/`resume` spawn it,
//!   `pause`/`stop` abort it). It advances the playback position on a fixed
//!   interval and only *enqueues* due entries;
//! - one long-lived **dispatch worker** that drains the queue in order,
//!   calls the [`EffectDispatcher`] and reports to every
//!   [`PlaybackObserver`].
//!
//! Playback state sits behind a single mutex that is never held across an
//! await. Fire events are enqueued while the mutex is held, so queue order
//! is firing order. Results of a run closed by `stop` (or replaced by a new
//! `start`) are discarded.
//!
//! Each tick task is tagged with the epoch it was spawned for. Controls
//! racing from different callers only ever abort tick tasks older than the
//! epoch they produced, so a late `pause` never tears down the task of a
//! `resume` that won the lock after it.

mod playback;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

use effecthub_domain::error::EffectHubError;
use effecthub_domain::timeline::{FiredEffect, PlaybackStatus, Timeline, TimelineEntry};

use crate::ports::{EffectDispatcher, PlaybackObserver};

use self::playback::{Emit, Playback};

/// Default tick granularity.
pub const DEFAULT_TICK: Duration = Duration::from_millis(10);

type Observers = Arc<RwLock<Vec<Arc<dyn PlaybackObserver>>>>;

/// State shared with tick tasks.
#[derive(Clone)]
struct Core {
    playback: Arc<Mutex<Playback>>,
    emits: mpsc::UnboundedSender<Emit>,
}

impl Core {
    fn lock(&self) -> MutexGuard<'_, Playback> {
        lock(&self.playback)
    }

    fn enqueue(&self, emits: Vec<Emit>) {
        for emit in emits {
            if self.emits.send(emit).is_err() {
                tracing::warn!("dispatch worker gone, dropping fire event");
            }
        }
    }

    /// Returns `false` once the tick task for `epoch` should exit.
    fn tick(&self, epoch: u64) -> bool {
        let mut playback = self.lock();
        match playback.tick(epoch, Instant::now()) {
            Some(emits) => {
                self.enqueue(emits);
                true
            }
            None => false,
        }
    }
}

/// Plays a timeline through an [`EffectDispatcher`].
///
/// All controls are synchronous and may be called from any thread.
pub struct TimelineScheduler {
    core: Core,
    observers: Observers,
    runtime: Handle,
    tick: Duration,
    ticker: Mutex<Option<(u64, JoinHandle<()>)>>,
}

impl TimelineScheduler {
    /// Create a scheduler delivering to `dispatcher` and spawn its dispatch
    /// worker. A zero `tick` is raised to one millisecond.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime.
    pub fn new<S>(dispatcher: S, tick: Duration) -> Self
    where
        S: EffectDispatcher + 'static,
    {
        let runtime = Handle::current();
        let (emits, queue) = mpsc::unbounded_channel();
        let playback = Arc::new(Mutex::new(Playback::default()));
        let observers: Observers = Arc::default();

        runtime.spawn(run_worker(
            dispatcher,
            Arc::clone(&playback),
            Arc::clone(&observers),
            queue,
        ));

        Self {
            core: Core { playback, emits },
            observers,
            runtime,
            tick: tick.max(Duration::from_millis(1)),
            ticker: Mutex::new(None),
        }
    }

    /// Register an observer for every subsequent notification.
    pub fn add_observer(&self, observer: Arc<dyn PlaybackObserver>) {
        self.observers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(observer);
    }

    /// Replace the loaded timeline. Entries fired later are dispatched on
    /// behalf of `protocol`.
    ///
    /// # Errors
    ///
    /// Returns [`EffectHubError::Validation`] for negative or decreasing
    /// offsets and [`EffectHubError::InvalidTransition`] unless idle or
    /// stopped. Either way the previous timeline stays loaded.
    #[tracing::instrument(skip(self, entries), fields(entries = entries.len()))]
    pub fn load(
        &self,
        entries: Vec<TimelineEntry>,
        protocol: Option<&str>,
    ) -> Result<(), EffectHubError> {
        let timeline = Timeline::new(entries)?;
        let duration_ms = timeline.duration_ms();
        self.core
            .lock()
            .load(timeline, protocol.map(str::to_string))?;
        tracing::info!(duration_ms, "timeline loaded");
        Ok(())
    }

    /// Begin playback from the current position (0 unless seeked while
    /// stopped).
    ///
    /// # Errors
    ///
    /// Returns [`EffectHubError::InvalidTransition`] unless idle or stopped.
    pub fn start(&self) -> Result<(), EffectHubError> {
        let (epoch, run_id, entries) = {
            let mut playback = self.core.lock();
            let epoch = playback.start(Instant::now())?;
            (epoch, playback.run(), playback.len())
        };
        tracing::info!(run_id, entries, "playback started");
        self.spawn_ticker(epoch);
        Ok(())
    }

    /// # Errors
    ///
    /// Returns [`EffectHubError::InvalidTransition`] unless playing.
    pub fn pause(&self) -> Result<(), EffectHubError> {
        let (epoch, position_ms) = {
            let mut playback = self.core.lock();
            let now = Instant::now();
            let epoch = playback.pause(now)?;
            (epoch, playback.position(now))
        };
        self.retire_ticker(epoch);
        tracing::info!(position_ms, "playback paused");
        Ok(())
    }

    /// # Errors
    ///
    /// Returns [`EffectHubError::InvalidTransition`] unless paused.
    pub fn resume(&self) -> Result<(), EffectHubError> {
        let epoch = self.core.lock().resume(Instant::now())?;
        tracing::info!("playback resumed");
        self.spawn_ticker(epoch);
        Ok(())
    }

    /// Stop playback and rewind to 0. The tick task is cancelled before this
    /// returns; dispatches already in flight complete but are not reported.
    ///
    /// # Errors
    ///
    /// Returns [`EffectHubError::InvalidTransition`] when idle.
    pub fn stop(&self) -> Result<(), EffectHubError> {
        let (changed, epoch) = {
            let mut playback = self.core.lock();
            (playback.stop()?, playback.epoch())
        };
        self.retire_ticker(epoch);
        if changed {
            tracing::info!("playback stopped");
        }
        Ok(())
    }

    /// Jump to `offset_ms`. While playing or paused, entries passed over by
    /// a forward jump are reported with `skipped = true` and not dispatched;
    /// entries already due when a playing timeline jumps forward still fire.
    ///
    /// # Errors
    ///
    /// Returns [`EffectHubError::Validation`] for a negative offset and
    /// [`EffectHubError::InvalidTransition`] when idle.
    pub fn seek(&self, offset_ms: i64) -> Result<(), EffectHubError> {
        let mut playback = self.core.lock();
        let emits = playback.seek(offset_ms, Instant::now())?;
        tracing::info!(offset_ms, reported = emits.len(), "playback seeked");
        self.core.enqueue(emits);
        Ok(())
    }

    /// Current playback position in milliseconds.
    #[must_use]
    pub fn get_position(&self) -> i64 {
        self.core.lock().position(Instant::now())
    }

    #[must_use]
    pub fn status(&self) -> PlaybackStatus {
        self.core.lock().status()
    }

    fn spawn_ticker(&self, epoch: u64) {
        let core = self.core.clone();
        let period = self.tick;
        let handle = self.runtime.spawn(async move {
            let mut interval = time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if !core.tick(epoch) {
                    break;
                }
            }
        });

        let mut ticker = lock(&self.ticker);
        if ticker.as_ref().is_some_and(|(current, _)| *current > epoch) {
            // a newer control already installed its task
            handle.abort();
        } else if let Some((_, previous)) = ticker.replace((epoch, handle)) {
            previous.abort();
        }
    }

    /// Abort the tick task unless it belongs to `epoch` or a newer one.
    fn retire_ticker(&self, epoch: u64) {
        if let Some((_, handle)) = lock(&self.ticker).take_if(|(current, _)| *current < epoch) {
            handle.abort();
        }
    }
}

impl Drop for TimelineScheduler {
    fn drop(&mut self) {
        if let Some((_, handle)) = lock(&self.ticker).take() {
            handle.abort();
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn is_current(playback: &Mutex<Playback>, run_id: u64) -> bool {
    lock(playback).is_current(run_id)
}

fn snapshot(observers: &Observers) -> Vec<Arc<dyn PlaybackObserver>> {
    observers
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}

/// Drain fire events until every sender is gone.
async fn run_worker<S: EffectDispatcher>(
    dispatcher: S,
    playback: Arc<Mutex<Playback>>,
    observers: Observers,
    mut queue: mpsc::UnboundedReceiver<Emit>,
) {
    while let Some(emit) = queue.recv().await {
        match emit {
            Emit::Fire {
                run_id,
                index,
                entry,
                protocol,
                skipped,
            } => {
                if !is_current(&playback, run_id) {
                    tracing::debug!(run_id, index, "run closed, entry not dispatched");
                    continue;
                }

                let target = entry.resolved_target();
                let result = if skipped {
                    None
                } else {
                    Some(
                        dispatcher
                            .dispatch(&entry.effect, &target, protocol.as_deref())
                            .await,
                    )
                };

                if !is_current(&playback, run_id) {
                    tracing::debug!(run_id, index, "run closed, result discarded");
                    continue;
                }

                tracing::debug!(
                    run_id,
                    index,
                    offset_ms = entry.offset_ms,
                    effect_type = entry.effect.effect_type(),
                    skipped,
                    "timeline entry fired"
                );
                let fired = FiredEffect {
                    run_id,
                    index,
                    offset_ms: entry.offset_ms,
                    effect: entry.effect,
                    target,
                    skipped,
                    result,
                };
                for observer in snapshot(&observers) {
                    observer.on_effect(&fired);
                }
            }
            Emit::Complete { run_id } => {
                if !is_current(&playback, run_id) {
                    continue;
                }
                tracing::info!(run_id, "timeline complete");
                for observer in snapshot(&observers) {
                    observer.on_complete(run_id);
                }
            }
        }
    }
    tracing::debug!("dispatch worker exiting");
}

#[cfg(test)]
mod tests {
    use super::*;
    use effecthub_domain::dispatch::{DispatchResult, Target};
    use effecthub_domain::effect::Effect;
    use effecthub_domain::error::{InvalidStateTransition, ValidationError};
    use effecthub_domain::id::DeviceId;
    use std::future::Future;

    /// Dispatcher spy: records effect types and answers after `delay`.
    #[derive(Default)]
    struct SpyDispatcher {
        delay: Duration,
        dispatched: Mutex<Vec<String>>,
    }

    impl SpyDispatcher {
        fn slow(delay: Duration) -> Arc<Self> {
            Arc::new(Self {
                delay,
                ..Self::default()
            })
        }

        fn dispatched(&self) -> Vec<String> {
            self.dispatched.lock().unwrap().clone()
        }
    }

    impl EffectDispatcher for SpyDispatcher {
        fn dispatch(
            &self,
            effect: &Effect,
            _target: &Target,
            _requesting_protocol: Option<&str>,
        ) -> impl Future<Output = DispatchResult> + Send {
            self.dispatched
                .lock()
                .unwrap()
                .push(effect.effect_type().to_string());
            let delay = self.delay;
            async move {
                if !delay.is_zero() {
                    time::sleep(delay).await;
                }
                let mut result = DispatchResult::default();
                result.push_delivered(DeviceId::new("spy").unwrap());
                result
            }
        }
    }

    #[derive(Default)]
    struct RecordingObserver {
        effects: Mutex<Vec<FiredEffect>>,
        completions: Mutex<Vec<u64>>,
    }

    impl RecordingObserver {
        fn fired(&self) -> Vec<(String, bool)> {
            self.effects
                .lock()
                .unwrap()
                .iter()
                .map(|f| (f.effect.effect_type().to_string(), f.skipped))
                .collect()
        }

        fn completions(&self) -> usize {
            self.completions.lock().unwrap().len()
        }
    }

    impl PlaybackObserver for RecordingObserver {
        fn on_effect(&self, fired: &FiredEffect) {
            self.effects.lock().unwrap().push(fired.clone());
        }

        fn on_complete(&self, run_id: u64) {
            self.completions.lock().unwrap().push(run_id);
        }
    }

    fn entry(offset_ms: i64, effect_type: &str) -> TimelineEntry {
        TimelineEntry::new(
            offset_ms,
            Effect::builder().effect_type(effect_type).build().unwrap(),
        )
    }

    fn new_scheduler(
        dispatcher: Arc<SpyDispatcher>,
    ) -> (TimelineScheduler, Arc<RecordingObserver>) {
        let scheduler = TimelineScheduler::new(dispatcher, DEFAULT_TICK);
        let observer = Arc::new(RecordingObserver::default());
        scheduler.add_observer(Arc::clone(&observer) as Arc<dyn PlaybackObserver>);
        (scheduler, observer)
    }

    fn fired(names: &[&str]) -> Vec<(String, bool)> {
        names.iter().map(|n| ((*n).to_string(), false)).collect()
    }

    #[tokio::test(start_paused = true)]
    async fn should_fire_every_entry_in_order_then_complete_once() {
        let dispatcher = Arc::new(SpyDispatcher::default());
        let (scheduler, observer) = new_scheduler(Arc::clone(&dispatcher));
        scheduler
            .load(
                vec![entry(0, "light"), entry(500, "vibration"), entry(1200, "wind")],
                Some("A"),
            )
            .unwrap();

        scheduler.start().unwrap();
        time::sleep(Duration::from_millis(1300)).await;

        assert_eq!(observer.fired(), fired(&["light", "vibration", "wind"]));
        assert_eq!(dispatcher.dispatched(), vec!["light", "vibration", "wind"]);
        assert_eq!(observer.completions(), 1);
        assert_eq!(scheduler.status(), PlaybackStatus::Stopped);
        assert_eq!(scheduler.get_position(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn should_forward_dispatch_result_to_observer() {
        let (scheduler, observer) = new_scheduler(Arc::new(SpyDispatcher::default()));
        scheduler.load(vec![entry(0, "light")], None).unwrap();

        scheduler.start().unwrap();
        time::sleep(Duration::from_millis(50)).await;

        let effects = observer.effects.lock().unwrap();
        let result = effects[0].result.as_ref().unwrap();
        assert_eq!(result.delivered, vec![DeviceId::new("spy").unwrap()]);
    }

    #[tokio::test(start_paused = true)]
    async fn should_report_skipped_entries_when_seeking_forward_while_playing() {
        let dispatcher = Arc::new(SpyDispatcher::default());
        let (scheduler, observer) = new_scheduler(Arc::clone(&dispatcher));
        scheduler
            .load(
                vec![entry(1000, "light"), entry(3000, "vibration"), entry(6000, "wind")],
                None,
            )
            .unwrap();
        scheduler.start().unwrap();
        time::sleep(Duration::from_millis(20)).await;

        scheduler.seek(5000).unwrap();
        time::sleep(Duration::from_millis(1100)).await;

        assert_eq!(
            observer.fired(),
            vec![
                ("light".to_string(), true),
                ("vibration".to_string(), true),
                ("wind".to_string(), false),
            ]
        );
        assert_eq!(dispatcher.dispatched(), vec!["wind"]);
        assert_eq!(observer.completions(), 1);
        assert!(observer.effects.lock().unwrap()[0].result.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn should_keep_position_when_paused_and_resumed_immediately() {
        let (scheduler, _) = new_scheduler(Arc::new(SpyDispatcher::default()));
        scheduler.load(vec![entry(10_000, "light")], None).unwrap();
        scheduler.start().unwrap();
        time::sleep(Duration::from_millis(250)).await;

        scheduler.pause().unwrap();
        let paused_at = scheduler.get_position();
        scheduler.resume().unwrap();

        assert_eq!(scheduler.get_position(), paused_at);
        assert_eq!(scheduler.status(), PlaybackStatus::Playing);
    }

    #[tokio::test(start_paused = true)]
    async fn should_not_advance_or_fire_while_paused() {
        let dispatcher = Arc::new(SpyDispatcher::default());
        let (scheduler, observer) = new_scheduler(Arc::clone(&dispatcher));
        scheduler
            .load(vec![entry(0, "light"), entry(500, "wind")], None)
            .unwrap();
        scheduler.start().unwrap();
        time::sleep(Duration::from_millis(300)).await;
        scheduler.pause().unwrap();
        let paused_at = scheduler.get_position();

        time::sleep(Duration::from_millis(2000)).await;
        assert_eq!(scheduler.get_position(), paused_at);
        assert_eq!(observer.fired(), fired(&["light"]));

        scheduler.resume().unwrap();
        time::sleep(Duration::from_millis(250)).await;
        assert_eq!(observer.fired(), fired(&["light", "wind"]));
    }

    #[tokio::test(start_paused = true)]
    async fn should_cancel_pending_entries_when_stopped() {
        let dispatcher = Arc::new(SpyDispatcher::default());
        let (scheduler, observer) = new_scheduler(Arc::clone(&dispatcher));
        scheduler
            .load(
                vec![entry(0, "light"), entry(500, "vibration"), entry(1200, "wind")],
                None,
            )
            .unwrap();
        scheduler.start().unwrap();
        time::sleep(Duration::from_millis(600)).await;

        scheduler.stop().unwrap();
        time::sleep(Duration::from_millis(1000)).await;

        assert_eq!(observer.fired(), fired(&["light", "vibration"]));
        assert_eq!(observer.completions(), 0);
        assert_eq!(scheduler.get_position(), 0);
        assert_eq!(scheduler.status(), PlaybackStatus::Stopped);
    }

    #[tokio::test(start_paused = true)]
    async fn should_discard_in_flight_result_when_stopped() {
        let dispatcher = SpyDispatcher::slow(Duration::from_millis(200));
        let (scheduler, observer) = new_scheduler(Arc::clone(&dispatcher));
        scheduler.load(vec![entry(0, "light")], None).unwrap();
        scheduler.start().unwrap();
        time::sleep(Duration::from_millis(50)).await;

        scheduler.stop().unwrap();
        time::sleep(Duration::from_millis(500)).await;

        assert_eq!(dispatcher.dispatched(), vec!["light"]);
        assert!(observer.fired().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn should_replay_from_start_after_stop() {
        let (scheduler, observer) = new_scheduler(Arc::new(SpyDispatcher::default()));
        scheduler.load(vec![entry(0, "light")], None).unwrap();
        scheduler.start().unwrap();
        time::sleep(Duration::from_millis(50)).await;

        scheduler.start().unwrap();
        time::sleep(Duration::from_millis(50)).await;

        assert_eq!(observer.fired(), fired(&["light", "light"]));
        assert_eq!(observer.completions(), 2);
    }

    #[tokio::test]
    async fn should_reject_invalid_transitions() {
        let (scheduler, _) = new_scheduler(Arc::new(SpyDispatcher::default()));

        assert!(matches!(
            scheduler.seek(100),
            Err(EffectHubError::InvalidTransition(InvalidStateTransition {
                operation: "seek",
                status: PlaybackStatus::Idle,
            }))
        ));
        assert!(matches!(
            scheduler.seek(-1),
            Err(EffectHubError::InvalidTransition(_))
        ));
        assert!(matches!(
            scheduler.stop(),
            Err(EffectHubError::InvalidTransition(_))
        ));
        assert!(matches!(
            scheduler.pause(),
            Err(EffectHubError::InvalidTransition(_))
        ));

        scheduler.load(vec![entry(10_000, "light")], None).unwrap();
        scheduler.start().unwrap();
        assert!(matches!(
            scheduler.load(vec![entry(0, "wind")], None),
            Err(EffectHubError::InvalidTransition(_))
        ));
        assert!(matches!(
            scheduler.resume(),
            Err(EffectHubError::InvalidTransition(_))
        ));
        scheduler.stop().unwrap();
    }

    #[tokio::test]
    async fn should_keep_previous_timeline_when_load_is_invalid() {
        let (scheduler, _) = new_scheduler(Arc::new(SpyDispatcher::default()));
        scheduler.load(vec![entry(0, "light")], None).unwrap();

        let result = scheduler.load(vec![entry(800, "wind"), entry(200, "light")], None);

        assert!(matches!(
            result,
            Err(EffectHubError::Validation(
                ValidationError::NonMonotonicTimeline { index: 1, .. }
            ))
        ));
        assert_eq!(lock(&scheduler.core.playback).len(), 1);
    }

    #[tokio::test]
    async fn should_reject_negative_seek() {
        let (scheduler, _) = new_scheduler(Arc::new(SpyDispatcher::default()));
        scheduler.load(vec![entry(10_000, "light")], None).unwrap();
        scheduler.start().unwrap();

        assert!(matches!(
            scheduler.seek(-5),
            Err(EffectHubError::Validation(ValidationError::NegativeSeek(-5)))
        ));
        scheduler.stop().unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn should_keep_ticking_when_pause_teardown_lands_after_concurrent_resume() {
        let (scheduler, observer) = new_scheduler(Arc::new(SpyDispatcher::default()));
        scheduler
            .load(vec![entry(100, "light"), entry(200, "wind")], None)
            .unwrap();
        scheduler.start().unwrap();
        time::sleep(Duration::from_millis(20)).await;

        // pause takes the lock, resume runs in full, then pause retires its ticker
        let paused = scheduler.core.lock().pause(Instant::now()).unwrap();
        scheduler.resume().unwrap();
        scheduler.retire_ticker(paused);
        time::sleep(Duration::from_millis(2000)).await;

        assert_eq!(observer.fired(), fired(&["light", "wind"]));
        assert_eq!(observer.completions(), 1);
        assert_eq!(scheduler.status(), PlaybackStatus::Stopped);
    }

    #[tokio::test(start_paused = true)]
    async fn should_keep_ticking_when_stop_teardown_lands_after_concurrent_start() {
        let (scheduler, observer) = new_scheduler(Arc::new(SpyDispatcher::default()));
        scheduler
            .load(vec![entry(100, "light"), entry(200, "wind")], None)
            .unwrap();
        scheduler.start().unwrap();
        time::sleep(Duration::from_millis(20)).await;

        let stopped = {
            let mut playback = scheduler.core.lock();
            playback.stop().unwrap();
            playback.epoch()
        };
        scheduler.start().unwrap();
        scheduler.retire_ticker(stopped);
        time::sleep(Duration::from_millis(2000)).await;

        assert_eq!(observer.fired(), fired(&["light", "wind"]));
        assert_eq!(observer.completions(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn should_keep_newest_ticker_when_spawns_arrive_out_of_order() {
        let (scheduler, observer) = new_scheduler(Arc::new(SpyDispatcher::default()));
        scheduler
            .load(vec![entry(100, "light"), entry(200, "wind")], None)
            .unwrap();
        scheduler.start().unwrap();

        let (stale, fresh) = {
            let mut playback = scheduler.core.lock();
            let now = Instant::now();
            playback.pause(now).unwrap();
            let stale = playback.resume(now).unwrap();
            playback.pause(now).unwrap();
            (stale, playback.resume(now).unwrap())
        };
        scheduler.spawn_ticker(fresh);
        scheduler.spawn_ticker(stale);
        time::sleep(Duration::from_millis(2000)).await;

        assert_eq!(observer.fired(), fired(&["light", "wind"]));
        assert_eq!(observer.completions(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn should_stop_ticking_after_pause() {
        let (scheduler, observer) = new_scheduler(Arc::new(SpyDispatcher::default()));
        scheduler.load(vec![entry(100, "light")], None).unwrap();
        scheduler.start().unwrap();
        time::sleep(Duration::from_millis(20)).await;

        scheduler.pause().unwrap();
        time::sleep(Duration::from_millis(500)).await;

        assert!(lock(&scheduler.ticker).is_none());
        assert!(observer.fired().is_empty());
    }
}
