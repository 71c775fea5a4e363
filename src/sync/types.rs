//! Sync types.

use serde::Serialize;
use std::path::PathBuf;

/// Sync-specific errors.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// IO error during file operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The backing document could not be parsed.
    #[error("Corrupt board document: {0}")]
    Corrupt(String),

    /// A save did not complete.
    #[error("Write failed: {0}")]
    WriteFailed(String),
}

/// Result type for sync operations.
pub type SyncResult<T> = std::result::Result<T, SyncError>;

/// What a backend reports after a successful write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteReceipt {
    /// File that was written.
    pub path: PathBuf,
    /// Modification stamp of the written document (Unix milliseconds), if
    /// the backend can be polled.
    pub modified: Option<i64>,
}

/// A completed save.
#[derive(Debug, Clone, Serialize)]
pub struct SaveReport {
    pub path: PathBuf,
    pub hash: String,
    pub modified: Option<i64>,
}

/// Why a poll did not look at the backing document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// The backend has no live document (manual export).
    Unsupported,
    /// The board is not in the foreground.
    Hidden,
    /// A local save is in flight.
    Saving,
}

/// Outcome of one poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PollOutcome {
    Skipped { reason: SkipReason },
    /// The document is no newer than the last one seen.
    Unchanged,
    /// The document is newer but identical to local state; only its
    /// timestamp was adopted.
    Adopted,
    /// Local state was replaced wholesale from the document.
    Replaced {
        /// Whether unsaved local edits were thrown away.
        discarded_local: bool,
    },
}

/// Sync status information.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncStatus {
    /// Backend name (`file` or `export`).
    pub backend: &'static str,
    /// Document path or export directory.
    pub location: String,
    /// Save state machine state.
    pub save_state: &'static str,
    /// Whether the backend is polled for remote changes.
    pub polling: bool,
    /// Last document timestamp this client observed.
    pub last_known_modified: Option<i64>,
    /// Hash of the local board.
    pub local_hash: String,
    /// Hash of the backing document, if one could be read and parsed.
    pub remote_hash: Option<String>,
    /// Whether local and backing document hold the same content.
    pub in_sync: bool,
    pub block_start: Option<u64>,
    pub active: usize,
    pub deleted: usize,
    pub correlations: usize,
    pub history: usize,
    /// Most recent save failure, cleared by the next successful save.
    pub last_error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_poll_outcome_serialization() {
        let json = serde_json::to_value(PollOutcome::Replaced {
            discarded_local: true,
        })
        .unwrap();
        assert_eq!(json["outcome"], "replaced");
        assert_eq!(json["discarded_local"], true);

        let json = serde_json::to_value(PollOutcome::Skipped {
            reason: SkipReason::Saving,
        })
        .unwrap();
        assert_eq!(json["reason"], "saving");
    }
}
