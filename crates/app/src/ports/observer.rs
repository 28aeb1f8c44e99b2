//! Playback observer port: how ingress adapters hear about playback.

use effecthub_domain::timeline::FiredEffect;

/// Receives playback notifications from a
/// [`TimelineScheduler`](crate::scheduler::TimelineScheduler).
///
/// Callbacks run on the scheduler's dispatch worker, in firing order. They
/// must not block; forward to a channel if the work is slow.
pub trait PlaybackObserver: Send + Sync {
    /// An entry was dispatched, or passed over by a forward seek
    /// (`fired.skipped == true`).
    fn on_effect(&self, fired: &FiredEffect);

    /// The last entry of run `run_id` has been reported and playback stopped.
    fn on_complete(&self, run_id: u64) {
        let _ = run_id;
    }
}
