//! Append-only change history.

use tracing::debug;

use crate::model::{ChangeKind, HistoryEntry, TacrepFields};

/// Change history, stored newest-first.
///
/// Entries are never edited or removed. Timestamps of appended entries are
/// strictly increasing, even when several land in the same millisecond.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryLog {
    entries: Vec<HistoryEntry>,
}

impl HistoryLog {
    #[must_use]
    pub fn new(entries: Vec<HistoryEntry>) -> Self {
        Self { entries }
    }

    #[must_use]
    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    #[must_use]
    pub fn into_entries(self) -> Vec<HistoryEntry> {
        self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Prepend an entry. `snapshot` is the record's fields before the change.
    pub fn append(
        &mut self,
        kind: ChangeKind,
        code: &str,
        by: &str,
        snapshot: Option<TacrepFields>,
    ) -> &HistoryEntry {
        let now = chrono::Utc::now().timestamp_millis();
        let newest = self.entries.iter().map(|e| e.at).max();
        let at = newest.map_or(now, |n| now.max(n + 1));

        let entry = HistoryEntry::new(kind, code, by, at, snapshot);
        debug!(id = %entry.id, code = %code, kind = %kind, "Appended history");
        self.entries.insert(0, entry);
        &self.entries[0]
    }

    /// Entries for `code` (case-insensitive exact match), newest first.
    #[must_use]
    pub fn query(&self, code: &str) -> Vec<&HistoryEntry> {
        let code = code.trim();
        let mut out: Vec<&HistoryEntry> = self
            .entries
            .iter()
            .filter(|e| e.code.eq_ignore_ascii_case(code))
            .collect();
        out.sort_by(|a, b| b.at.cmp(&a.at));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TacrepType;

    #[test]
    fn test_query_returns_all_appends_newest_first() {
        let mut log = HistoryLog::default();
        for _ in 0..5 {
            log.append(ChangeKind::Update, "I100", "TC", None);
        }
        log.append(ChangeKind::Correct, "I1000", "TC", None);

        let hits = log.query("i100");
        assert_eq!(hits.len(), 5);
        assert!(hits.windows(2).all(|w| w[0].at > w[1].at));
        assert_eq!(log.len(), 6);
    }

    #[test]
    fn test_append_keeps_snapshot_and_line() {
        let mut log = HistoryLog::default();
        let snapshot = TacrepFields::empty(TacrepType::Echo);
        let entry = log
            .append(ChangeKind::Correct, "E5", "MC", Some(snapshot.clone()))
            .clone();

        assert_eq!(entry.snapshot, Some(snapshot));
        assert!(entry.line.ends_with("E5 - corrected by MC"));
        assert_eq!(log.entries()[0], entry);
    }

    #[test]
    fn test_append_after_future_dated_entry_stays_ordered() {
        let future = chrono::Utc::now().timestamp_millis() + 60_000;
        let mut log = HistoryLog::new(vec![HistoryEntry::new(
            ChangeKind::Edit,
            "G1",
            "TC",
            future,
            None,
        )]);

        log.append(ChangeKind::Edit, "G1", "TC", None);
        let hits = log.query("G1");
        assert_eq!(hits[0].at, future + 1);
    }
}
