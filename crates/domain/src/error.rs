//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into
//! [`EffectHubError`] via `#[from]`. Per-device failures are *not* errors of
//! a whole call: they are aggregated into a
//! [`DispatchResult`](crate::dispatch::DispatchResult) instead.

use crate::timeline::PlaybackStatus;

/// Top-level error for operations whose preconditions fail as a whole.
#[derive(Debug, thiserror::Error)]
pub enum EffectHubError {
    #[error("validation error")]
    Validation(#[from] ValidationError),

    #[error("not found")]
    NotFound(#[from] NotFoundError),

    #[error("invalid state transition")]
    InvalidTransition(#[from] InvalidStateTransition),
}

/// Malformed input rejected at the API boundary before any side effect.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("effect type must not be empty")]
    EmptyEffectType,

    #[error("duration must be non-negative, got {0}ms")]
    NegativeDuration(i64),

    #[error("timestamp must be non-negative, got {0}ms")]
    NegativeTimestamp(i64),

    #[error("timeline entry {index} has negative offset {offset_ms}ms")]
    NegativeOffset { index: usize, offset_ms: i64 },

    #[error("timeline entry {index} at {offset_ms}ms precedes previous entry at {previous_ms}ms")]
    NonMonotonicTimeline {
        index: usize,
        offset_ms: i64,
        previous_ms: i64,
    },

    #[error("seek offset must be non-negative, got {0}ms")]
    NegativeSeek(i64),

    #[error("device id must not be empty")]
    EmptyDeviceId,

    #[error("device type must not be empty")]
    EmptyDeviceType,

    #[error("unknown location {0:?}")]
    UnknownLocation(String),
}

/// A device (or other record) is unknown, or hidden from the requester.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{entity} {id} not found")]
pub struct NotFoundError {
    pub entity: &'static str,
    pub id: String,
}

/// A playback control was invoked from a state that does not allow it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("cannot {operation} while {status}")]
pub struct InvalidStateTransition {
    pub operation: &'static str,
    pub status: PlaybackStatus,
}
