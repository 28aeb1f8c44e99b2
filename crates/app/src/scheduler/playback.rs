//! Playback state machine.
//!
//! Pure bookkeeping: no tasks, no channels. Every mutation takes the current
//! instant from the caller and returns the fire events it produced, which the
//! scheduler forwards to its dispatch worker while still holding the lock.

use std::ops::Range;

use tokio::time::Instant;

use effecthub_domain::error::{EffectHubError, InvalidStateTransition, ValidationError};
use effecthub_domain::time::duration_to_ms;
use effecthub_domain::timeline::{PlaybackStatus, Timeline, TimelineEntry};

/// Work item for the dispatch worker.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Emit {
    Fire {
        run_id: u64,
        index: usize,
        entry: TimelineEntry,
        protocol: Option<String>,
        skipped: bool,
    },
    Complete {
        run_id: u64,
    },
}

#[derive(Debug, Default)]
pub(crate) struct Playback {
    status: PlaybackStatus,
    timeline: Timeline,
    protocol: Option<String>,
    /// Index of the next entry to fire.
    cursor: usize,
    /// Position at `resumed_at` while playing, frozen position otherwise.
    position_ms: i64,
    resumed_at: Option<Instant>,
    run: Option<u64>,
    next_run: u64,
    /// Bumped whenever running tick tasks must stand down.
    epoch: u64,
}

impl Playback {
    pub(crate) fn status(&self) -> PlaybackStatus {
        self.status
    }

    pub(crate) fn epoch(&self) -> u64 {
        self.epoch
    }

    pub(crate) fn run(&self) -> Option<u64> {
        self.run
    }

    pub(crate) fn is_current(&self, run_id: u64) -> bool {
        self.run == Some(run_id)
    }

    pub(crate) fn len(&self) -> usize {
        self.timeline.len()
    }

    pub(crate) fn position(&self, now: Instant) -> i64 {
        match self.resumed_at {
            Some(resumed_at) => {
                self.position_ms + duration_to_ms(now.saturating_duration_since(resumed_at))
            }
            None => self.position_ms,
        }
    }

    pub(crate) fn load(
        &mut self,
        timeline: Timeline,
        protocol: Option<String>,
    ) -> Result<(), EffectHubError> {
        self.require(
            "load",
            matches!(self.status, PlaybackStatus::Idle | PlaybackStatus::Stopped),
        )?;
        self.timeline = timeline;
        self.protocol = protocol;
        self.status = PlaybackStatus::Idle;
        self.cursor = 0;
        self.position_ms = 0;
        self.resumed_at = None;
        self.run = None;
        Ok(())
    }

    /// Returns the epoch the new tick task must run under.
    pub(crate) fn start(&mut self, now: Instant) -> Result<u64, EffectHubError> {
        self.require(
            "start",
            matches!(self.status, PlaybackStatus::Idle | PlaybackStatus::Stopped),
        )?;
        self.run = Some(self.next_run);
        self.next_run += 1;
        self.status = PlaybackStatus::Playing;
        self.cursor = self.timeline.first_pending_at(self.position_ms);
        self.resumed_at = Some(now);
        Ok(self.bump())
    }

    /// Returns the epoch every older tick task must stand down for.
    pub(crate) fn pause(&mut self, now: Instant) -> Result<u64, EffectHubError> {
        self.require("pause", self.status == PlaybackStatus::Playing)?;
        self.position_ms = self.position(now);
        self.resumed_at = None;
        self.status = PlaybackStatus::Paused;
        Ok(self.bump())
    }

    /// Returns the epoch the new tick task must run under.
    pub(crate) fn resume(&mut self, now: Instant) -> Result<u64, EffectHubError> {
        self.require("resume", self.status == PlaybackStatus::Paused)?;
        self.resumed_at = Some(now);
        self.status = PlaybackStatus::Playing;
        Ok(self.bump())
    }

    /// Returns whether anything changed; stopping twice is a no-op.
    pub(crate) fn stop(&mut self) -> Result<bool, EffectHubError> {
        match self.status {
            PlaybackStatus::Idle => self.require("stop", false).map(|()| false),
            PlaybackStatus::Stopped => Ok(false),
            PlaybackStatus::Playing | PlaybackStatus::Paused => {
                self.rewind();
                self.run = None;
                self.bump();
                Ok(true)
            }
        }
    }

    /// Move to `offset_ms`. Entries passed over while a run is open come
    /// back as skipped fire events; entries already due at the live
    /// position when seeking forward fire normally first.
    pub(crate) fn seek(&mut self, offset_ms: i64, now: Instant) -> Result<Vec<Emit>, EffectHubError> {
        self.require("seek", self.status != PlaybackStatus::Idle)?;
        if offset_ms < 0 {
            return Err(ValidationError::NegativeSeek(offset_ms).into());
        }

        let mut emits = Vec::new();
        let target = self.timeline.first_pending_at(offset_ms);
        if let Some(run_id) = self.run
            && matches!(self.status, PlaybackStatus::Playing | PlaybackStatus::Paused)
        {
            let live = self.position(now);
            if self.status == PlaybackStatus::Playing && offset_ms > live {
                let due = self.timeline.due_until(self.cursor, live);
                self.cursor = due.end;
                emits = self.fire_range(run_id, due, false);
            }
            if target > self.cursor {
                emits.extend(self.fire_range(run_id, self.cursor..target, true));
            }
        }

        self.cursor = target;
        self.position_ms = offset_ms;
        if self.status == PlaybackStatus::Playing {
            self.resumed_at = Some(now);
        }
        Ok(emits)
    }

    /// Advance playback to `now`. `None` tells a tick task of `epoch` to
    /// exit.
    pub(crate) fn tick(&mut self, epoch: u64, now: Instant) -> Option<Vec<Emit>> {
        if self.status != PlaybackStatus::Playing || epoch != self.epoch {
            return None;
        }
        let run_id = self.run?;

        let due = self.timeline.due_until(self.cursor, self.position(now));
        self.cursor = due.end;
        let mut emits = self.fire_range(run_id, due, false);

        if self.cursor >= self.timeline.len() {
            self.rewind();
            self.bump();
            emits.push(Emit::Complete { run_id });
        }
        Some(emits)
    }

    fn fire_range(&self, run_id: u64, range: Range<usize>, skipped: bool) -> Vec<Emit> {
        self.timeline.entries()[range.clone()]
            .iter()
            .zip(range)
            .map(|(entry, index)| Emit::Fire {
                run_id,
                index,
                entry: entry.clone(),
                protocol: self.protocol.clone(),
                skipped,
            })
            .collect()
    }

    fn rewind(&mut self) {
        self.status = PlaybackStatus::Stopped;
        self.cursor = 0;
        self.position_ms = 0;
        self.resumed_at = None;
    }

    fn bump(&mut self) -> u64 {
        self.epoch += 1;
        self.epoch
    }

    fn require(&self, operation: &'static str, allowed: bool) -> Result<(), EffectHubError> {
        if allowed {
            Ok(())
        } else {
            Err(InvalidStateTransition {
                operation,
                status: self.status,
            }
            .into())
        }
    }
}
