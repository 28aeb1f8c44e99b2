//! Time and timestamp helpers.

use chrono::{DateTime, Utc};

/// UTC timestamp used for device liveness (`registered_at`, `last_seen`).
pub type Timestamp = DateTime<Utc>;

/// Return the current UTC time.
#[must_use]
pub fn now() -> Timestamp {
    Utc::now()
}

/// Convert a [`std::time::Duration`] into whole milliseconds, saturating at
/// `i64::MAX`.
#[must_use]
pub fn duration_to_ms(duration: std::time::Duration) -> i64 {
    i64::try_from(duration.as_millis()).unwrap_or(i64::MAX)
}
