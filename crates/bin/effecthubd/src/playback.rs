//! Startup playback: timeline files and a logging observer.

use std::path::{Path, PathBuf};

use tokio::sync::Notify;

use effecthub_app::ports::PlaybackObserver;
use effecthub_domain::timeline::{FiredEffect, TimelineEntry};

/// Failure to read a timeline file.
#[derive(Debug, thiserror::Error)]
pub enum TimelineFileError {
    #[error("failed to read timeline file {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse timeline file {}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Read a JSON array of timeline entries.
///
/// Offsets are validated later, by the scheduler's `load`.
///
/// # Errors
///
/// Returns [`TimelineFileError`] when the file cannot be read or is not a
/// JSON array of entries.
pub fn read_timeline(path: impl AsRef<Path>) -> Result<Vec<TimelineEntry>, TimelineFileError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|source| TimelineFileError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_timeline(&content).map_err(|source| TimelineFileError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn parse_timeline(content: &str) -> Result<Vec<TimelineEntry>, serde_json::Error> {
    serde_json::from_str(content)
}

/// Logs every playback notification and wakes [`finished`](Self::finished)
/// on completion.
#[derive(Debug, Default)]
pub struct LoggingObserver {
    complete: Notify,
}

impl LoggingObserver {
    /// Resolve once a run completes. A completion that happened before the
    /// call is not lost.
    pub async fn finished(&self) {
        self.complete.notified().await;
    }
}

impl PlaybackObserver for LoggingObserver {
    fn on_effect(&self, fired: &FiredEffect) {
        let Some(result) = &fired.result else {
            tracing::info!(
                index = fired.index,
                offset_ms = fired.offset_ms,
                effect_type = fired.effect.effect_type(),
                "effect skipped by seek"
            );
            return;
        };

        if result.no_target_found {
            tracing::warn!(
                offset_ms = fired.offset_ms,
                effect_type = fired.effect.effect_type(),
                target = %fired.target,
                "no device matched target"
            );
        } else {
            tracing::info!(
                offset_ms = fired.offset_ms,
                effect_type = fired.effect.effect_type(),
                delivered = result.delivered.len(),
                skipped = result.skipped.len(),
                failed = result.failed.len(),
                "effect fired"
            );
        }
    }

    fn on_complete(&self, run_id: u64) {
        tracing::info!(run_id, "playback complete");
        self.complete.notify_one();
    }
}
