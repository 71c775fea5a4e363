//! Change history model.
//!
//! History entries are written by the correct/update workflows (and by
//! plain edits when enabled). Each entry keeps a snapshot of the record's
//! fields as they were *before* the change.

use chrono::{TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::tacrep::TacrepFields;

/// Kind of change recorded in history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Edit,
    Correct,
    Update,
}

impl ChangeKind {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Edit => "edit",
            Self::Correct => "correct",
            Self::Update => "update",
        }
    }

    /// Past-tense verb used in the history line.
    #[must_use]
    pub const fn verb(&self) -> &'static str {
        match self {
            Self::Edit => "edited",
            Self::Correct => "corrected",
            Self::Update => "updated",
        }
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An immutable change history entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: String,
    pub code: String,
    pub kind: ChangeKind,
    #[serde(default)]
    pub by: String,
    /// Timestamp (Unix milliseconds)
    pub at: i64,
    #[serde(default)]
    pub line: String,
    /// Record fields before the change was applied.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<TacrepFields>,
}

impl HistoryEntry {
    /// Build an entry at time `at` with its summary line.
    pub fn new(
        kind: ChangeKind,
        code: &str,
        by: &str,
        at: i64,
        snapshot: Option<TacrepFields>,
    ) -> Self {
        Self {
            id: format!("hist_{}", &uuid::Uuid::new_v4().simple().to_string()[..12]),
            code: code.to_string(),
            kind,
            by: by.to_string(),
            at,
            line: history_line(kind, code, by, at),
            snapshot,
        }
    }
}

/// Human summary line: `[2025-01-20 14:05Z] I100 - corrected by TC`.
#[must_use]
pub fn history_line(kind: ChangeKind, code: &str, by: &str, at: i64) -> String {
    let stamp = Utc
        .timestamp_millis_opt(at)
        .single()
        .map_or_else(String::new, |t| t.format("%Y-%m-%d %H:%MZ").to_string());
    format!("[{stamp}] {code} - {} by {by}", kind.verb())
}
