//! Timeline: an ordered, time-offset sequence of effects.
//!
//! A [`Timeline`] can only be built from entries whose offsets are
//! non-negative and non-decreasing, so iteration order is the firing order
//! (ties keep insertion order).

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::dispatch::{DispatchResult, Target};
use crate::effect::Effect;
use crate::error::{EffectHubError, ValidationError};

/// One effect scheduled at an offset from the start of playback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineEntry {
    pub offset_ms: i64,
    pub effect: Effect,
    /// Explicit target; when absent the effect's own location is used.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<Target>,
}

impl TimelineEntry {
    #[must_use]
    pub fn new(offset_ms: i64, effect: Effect) -> Self {
        Self {
            offset_ms,
            effect,
            target: None,
        }
    }

    #[must_use]
    pub fn with_target(mut self, target: Target) -> Self {
        self.target = Some(target);
        self
    }

    /// The target this entry dispatches to.
    #[must_use]
    pub fn resolved_target(&self) -> Target {
        self.target
            .clone()
            .unwrap_or(Target::Location(self.effect.location()))
    }
}

/// Validated, firing-ordered list of [`TimelineEntry`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Timeline {
    entries: Vec<TimelineEntry>,
}

impl Timeline {
    /// Validate and wrap `entries`.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::NegativeOffset`] or
    /// [`ValidationError::NonMonotonicTimeline`] for the first offending
    /// entry. Nothing is kept on error.
    pub fn new(entries: Vec<TimelineEntry>) -> Result<Self, EffectHubError> {
        let mut previous_ms = 0;
        for (index, entry) in entries.iter().enumerate() {
            if entry.offset_ms < 0 {
                return Err(ValidationError::NegativeOffset {
                    index,
                    offset_ms: entry.offset_ms,
                }
                .into());
            }
            if entry.offset_ms < previous_ms {
                return Err(ValidationError::NonMonotonicTimeline {
                    index,
                    offset_ms: entry.offset_ms,
                    previous_ms,
                }
                .into());
            }
            previous_ms = entry.offset_ms;
        }
        Ok(Self { entries })
    }

    #[must_use]
    pub fn entries(&self) -> &[TimelineEntry] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Index of the first entry still pending at `position_ms`, i.e. the
    /// first entry whose offset is `>= position_ms`.
    #[must_use]
    pub fn first_pending_at(&self, position_ms: i64) -> usize {
        self.entries
            .partition_point(|entry| entry.offset_ms < position_ms)
    }

    /// Indices in `from..` whose offset is due at `position_ms`.
    #[must_use]
    pub fn due_until(&self, from: usize, position_ms: i64) -> std::ops::Range<usize> {
        let from = from.min(self.entries.len());
        let end = from
            + self.entries[from..].partition_point(|entry| entry.offset_ms <= position_ms);
        from..end
    }

    /// Offset of the last entry, or 0 for an empty timeline.
    #[must_use]
    pub fn duration_ms(&self) -> i64 {
        self.entries.last().map_or(0, |entry| entry.offset_ms)
    }
}

/// Report of one timeline entry reaching its offset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FiredEffect {
    /// Playback run the entry belongs to (a new run starts on every `start`).
    pub run_id: u64,
    /// Index of the entry in its timeline.
    pub index: usize,
    pub offset_ms: i64,
    pub effect: Effect,
    pub target: Target,
    /// Passed over by a forward seek and not dispatched.
    pub skipped: bool,
    /// Router outcome; `None` when skipped.
    pub result: Option<DispatchResult>,
}

/// Playback state machine status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackStatus {
    #[default]
    Idle,
    Playing,
    Paused,
    Stopped,
}

impl fmt::Display for PlaybackStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => f.write_str("idle"),
            Self::Playing => f.write_str("playing"),
            Self::Paused => f.write_str("paused"),
            Self::Stopped => f.write_str("stopped"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effect::Location;

    fn entry(offset_ms: i64, effect_type: &str) -> TimelineEntry {
        TimelineEntry::new(
            offset_ms,
            Effect::builder().effect_type(effect_type).build().unwrap(),
        )
    }

    #[test]
    fn should_accept_non_decreasing_offsets_with_ties() {
        let timeline = Timeline::new(vec![
            entry(0, "light"),
            entry(500, "vibration"),
            entry(500, "scent"),
            entry(1200, "wind"),
        ])
        .unwrap();
        assert_eq!(timeline.len(), 4);
        assert_eq!(timeline.entries()[2].effect.effect_type(), "scent");
        assert_eq!(timeline.duration_ms(), 1200);
    }

    #[test]
    fn should_reject_negative_offset() {
        let result = Timeline::new(vec![entry(0, "light"), entry(-10, "wind")]);
        assert!(matches!(
            result,
            Err(EffectHubError::Validation(ValidationError::NegativeOffset {
                index: 1,
                offset_ms: -10
            }))
        ));
    }

    #[test]
    fn should_reject_decreasing_offsets() {
        let result = Timeline::new(vec![entry(1000, "light"), entry(400, "wind")]);
        assert!(matches!(
            result,
            Err(EffectHubError::Validation(
                ValidationError::NonMonotonicTimeline { index: 1, .. }
            ))
        ));
    }

    #[test]
    fn should_find_first_pending_entry_at_position() {
        let timeline =
            Timeline::new(vec![entry(0, "a"), entry(1000, "b"), entry(3000, "c")]).unwrap();
        assert_eq!(timeline.first_pending_at(0), 0);
        assert_eq!(timeline.first_pending_at(1000), 1);
        assert_eq!(timeline.first_pending_at(1001), 2);
        assert_eq!(timeline.first_pending_at(5000), 3);
    }

    #[test]
    fn should_report_due_range_inclusive_of_position() {
        let timeline =
            Timeline::new(vec![entry(0, "a"), entry(500, "b"), entry(1200, "c")]).unwrap();
        assert_eq!(timeline.due_until(0, 499), 0..1);
        assert_eq!(timeline.due_until(1, 500), 1..2);
        assert_eq!(timeline.due_until(2, 1199), 2..2);
        assert_eq!(timeline.due_until(3, 9999), 3..3);
    }

    #[test]
    fn should_target_effect_location_by_default() {
        let effect = Effect::builder()
            .effect_type("wind")
            .location(Location::Right)
            .build()
            .unwrap();
        let entry = TimelineEntry::new(0, effect);
        assert_eq!(entry.resolved_target(), Target::Location(Location::Right));
    }

    #[test]
    fn should_deserialize_entries_from_json() {
        let entries: Vec<TimelineEntry> = serde_json::from_str(
            r#"[
                {"offset_ms": 0, "effect": {"effect_type": "light"}},
                {"offset_ms": 500, "effect": {"effect_type": "vibration", "intensity": 80},
                 "target": {"kind": "device", "value": "vest"}}
            ]"#,
        )
        .unwrap();
        let timeline = Timeline::new(entries).unwrap();
        assert!(matches!(
            timeline.entries()[1].target,
            Some(Target::Device(_))
        ));
    }
}
