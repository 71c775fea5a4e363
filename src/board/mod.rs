//! Synchronous board core.
//!
//! [`Board`] owns the record store, correlation index, and history log for
//! one mission, plus the mission details that travel in the same document.
//! It performs no I/O: the sync engine converts it to and from
//! [`BoardState`] and decides when to persist.

pub mod codes;
pub mod correlations;
pub mod history;
pub mod records;

use tracing::{debug, info};

pub use codes::{format_code, parse_suffix, CodeAllocator, Numbering};
pub use correlations::{CorrelationIndex, Removal};
pub use history::HistoryLog;
pub use records::{Created, RecordStore};

use crate::error::{Error, Result};
use crate::model::format::preview_text;
use crate::model::{
    BoardState, ChangeKind, CrewDetails, Fault, HistoryEntry, Record, Shift, TacrepFields,
    TacrepType, TimelineEntry, TimelineEvent,
};

/// Mission details carried alongside the records.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mission {
    pub mission_number: String,
    pub callsign: String,
    pub crew_roster: Vec<String>,
    pub crew_details: CrewDetails,
    pub faults: Vec<Fault>,
    pub timeline: Vec<TimelineEntry>,
    /// Document keys this version does not model.
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Result of editing a record.
#[derive(Debug, Clone)]
pub struct EditOutcome {
    /// The record after the edit.
    pub record: Record,
    /// History entry holding the pre-edit snapshot, when one was written.
    pub history: Option<HistoryEntry>,
    /// Send preview built from the post-edit record (corrections and updates).
    pub preview: Option<String>,
}

/// Result of deleting a record.
#[derive(Debug, Clone)]
pub struct DeleteOutcome {
    pub record: Record,
    /// Number of correlation groups that referenced the record.
    pub groups_trimmed: usize,
}

/// One mission's board.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Board {
    numbering: Numbering,
    records: RecordStore,
    correlations: CorrelationIndex,
    history: HistoryLog,
    mission: Mission,
}

impl Board {
    /// Build from a parsed document.
    #[must_use]
    pub fn from_state(state: BoardState) -> Self {
        Self {
            numbering: Numbering {
                block_start: state.block_start_num,
                column_start: state.column_start,
            },
            records: RecordStore::new(state.columns, state.deleted),
            correlations: CorrelationIndex::new(state.correlations),
            history: HistoryLog::new(state.change_history),
            mission: Mission {
                mission_number: state.mission_number,
                callsign: state.callsign,
                crew_roster: state.crew_roster,
                crew_details: state.crew_details,
                faults: state.faults,
                timeline: state.mission_timeline,
                extra: state.extra,
            },
        }
    }

    /// Snapshot as a document.
    #[must_use]
    pub fn to_state(&self) -> BoardState {
        self.clone().into_state()
    }

    /// Convert into a document.
    #[must_use]
    pub fn into_state(self) -> BoardState {
        let (columns, deleted) = self.records.into_parts();
        BoardState {
            crew_roster: self.mission.crew_roster,
            block_start_num: self.numbering.block_start,
            column_start: self.numbering.column_start,
            mission_number: self.mission.mission_number,
            callsign: self.mission.callsign,
            columns,
            correlations: self.correlations.into_groups(),
            deleted,
            change_history: self.history.into_entries(),
            faults: self.mission.faults,
            mission_timeline: self.mission.timeline,
            crew_details: self.mission.crew_details,
            extra: self.mission.extra,
        }
    }

    #[must_use]
    pub const fn numbering(&self) -> &Numbering {
        &self.numbering
    }

    #[must_use]
    pub const fn records(&self) -> &RecordStore {
        &self.records
    }

    #[must_use]
    pub const fn correlations(&self) -> &CorrelationIndex {
        &self.correlations
    }

    #[must_use]
    pub const fn history(&self) -> &HistoryLog {
        &self.history
    }

    #[must_use]
    pub const fn mission(&self) -> &Mission {
        &self.mission
    }

    fn ensure_configured(&self) -> Result<()> {
        if self.numbering.is_configured() {
            Ok(())
        } else {
            Err(Error::NotConfigured)
        }
    }

    /// Add an actor to the crew roster on first sight.
    pub fn note_actor(&mut self, actor: &str) {
        let actor = actor.trim();
        if !actor.is_empty() && !self.mission.crew_roster.iter().any(|c| c == actor) {
            self.mission.crew_roster.push(actor.to_string());
        }
    }

    // ── Mission ───────────────────────────────────────────────

    /// Set the mission-wide numbering floor.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for zero.
    pub fn set_block_start(&mut self, n: u64) -> Result<()> {
        if n == 0 {
            return Err(Error::InvalidArgument(
                "block start must be a positive integer".to_string(),
            ));
        }
        info!(block_start = n, "Block start set");
        self.numbering.block_start = Some(n);
        Ok(())
    }

    /// Set or clear a per-type numbering floor.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for zero.
    pub fn set_column_start(&mut self, kind: TacrepType, n: Option<u64>) -> Result<()> {
        match n {
            Some(0) => Err(Error::InvalidArgument(
                "column start must be a positive integer".to_string(),
            )),
            Some(n) => {
                self.numbering.column_start.insert(kind, n);
                Ok(())
            }
            None => {
                self.numbering.column_start.remove(&kind);
                Ok(())
            }
        }
    }

    pub fn set_mission(&mut self, number: Option<&str>, callsign: Option<&str>) {
        if let Some(number) = number {
            self.mission.mission_number = number.trim().to_string();
        }
        if let Some(callsign) = callsign {
            self.mission.callsign = callsign.trim().to_string();
        }
    }

    /// Replace one crew shift (0-based).
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for an index past the last shift.
    pub fn set_shift(&mut self, index: usize, shift: Shift) -> Result<()> {
        let slot = self
            .mission
            .crew_details
            .shifts
            .get_mut(index)
            .ok_or_else(|| Error::InvalidArgument(format!("no shift {}", index + 1)))?;
        *slot = shift;
        Ok(())
    }

    // ── Records ───────────────────────────────────────────────

    /// Create a record.
    ///
    /// # Errors
    ///
    /// See [`RecordStore::create`].
    pub fn create_record(
        &mut self,
        fields: TacrepFields,
        reported: bool,
        reactivate: bool,
        actor: &str,
    ) -> Result<Created> {
        let created = self
            .records
            .create(fields, reported, reactivate, &self.numbering, actor)?;
        self.note_actor(actor);
        Ok(created)
    }

    /// Edit a record in place.
    ///
    /// Corrections and updates always append history with the pre-edit
    /// snapshot and return a preview built from the post-edit record.
    /// Plain edits append history only when `log_edits` is set.
    ///
    /// # Errors
    ///
    /// See [`RecordStore::edit`].
    pub fn edit_record(
        &mut self,
        code: &str,
        fields: TacrepFields,
        reported: Option<bool>,
        kind: ChangeKind,
        log_edits: bool,
        actor: &str,
    ) -> Result<EditOutcome> {
        let (before, after) = self.records.edit(code, fields, reported)?;

        let history = (kind != ChangeKind::Edit || log_edits).then(|| {
            self.history
                .append(kind, &after.code, actor, Some(before.fields))
                .clone()
        });
        let preview = preview_text(kind, &after, &self.mission.callsign);
        self.note_actor(actor);

        Ok(EditOutcome {
            record: after,
            history,
            preview,
        })
    }

    /// Delete a record and strip it from every correlation in one step.
    ///
    /// # Errors
    ///
    /// See [`RecordStore::delete`].
    pub fn delete_record(&mut self, code: &str, actor: &str) -> Result<DeleteOutcome> {
        let record = self.records.delete(code)?;
        let groups_trimmed = self.correlations.trim_code(record.effective_code());
        self.note_actor(actor);
        Ok(DeleteOutcome {
            record,
            groups_trimmed,
        })
    }

    /// Restore a deleted record by its original code.
    ///
    /// # Errors
    ///
    /// See [`RecordStore::restore`].
    pub fn restore_record(&mut self, original_code: &str, actor: &str) -> Result<Record> {
        let record = self.records.restore(original_code, &self.numbering)?;
        self.note_actor(actor);
        Ok(record)
    }

    /// Flip the reported flag without touching fields.
    ///
    /// # Errors
    ///
    /// Returns `RecordNotFound` if no active record holds `code`.
    pub fn set_reported(&mut self, code: &str, reported: bool) -> Result<Record> {
        let fields = self
            .records
            .get(code)
            .map(|r| r.fields.clone())
            .ok_or_else(|| self.records.not_found(code))?;
        let (_, after) = self.records.edit(code, fields, Some(reported))?;
        Ok(after)
    }

    // ── Correlations ──────────────────────────────────────────

    /// # Errors
    ///
    /// Returns `NotConfigured` before the block start is set, otherwise
    /// see [`CorrelationIndex::create_group`].
    pub fn create_correlation(&mut self, codes: &[String], actor: &str) -> Result<usize> {
        self.ensure_configured()?;
        let index = self.correlations.create_group(codes, &self.records, actor)?;
        self.note_actor(actor);
        Ok(index)
    }

    /// # Errors
    ///
    /// Returns `NotConfigured` before the block start is set, otherwise
    /// see [`CorrelationIndex::add_to_group`].
    pub fn add_to_correlation(&mut self, index: usize, code: &str, actor: &str) -> Result<()> {
        self.ensure_configured()?;
        self.correlations
            .add_to_group(index, code, &self.records, actor)?;
        self.note_actor(actor);
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `NotConfigured` before the block start is set, otherwise
    /// see [`CorrelationIndex::remove_from_group`].
    pub fn remove_from_correlation(
        &mut self,
        index: usize,
        code: &str,
        actor: &str,
    ) -> Result<Removal> {
        self.ensure_configured()?;
        let removal = self.correlations.remove_from_group(index, code, actor)?;
        self.note_actor(actor);
        Ok(removal)
    }

    /// # Errors
    ///
    /// Returns `GroupNotFound` for an out-of-range index.
    pub fn drop_correlation(&mut self, index: usize, actor: &str) -> Result<()> {
        let group = self.correlations.drop_group(index)?;
        info!(codes = ?group.codes, by = %actor, "Correlation dropped");
        Ok(())
    }

    // ── History ───────────────────────────────────────────────

    /// Append a history entry directly.
    pub fn append_history(
        &mut self,
        kind: ChangeKind,
        code: &str,
        by: &str,
        snapshot: Option<TacrepFields>,
    ) -> HistoryEntry {
        self.history.append(kind, code, by, snapshot).clone()
    }

    /// History for a code, newest first.
    #[must_use]
    pub fn query_history(&self, code: &str) -> Vec<&HistoryEntry> {
        self.history.query(code)
    }

    // ── Faults and timeline ───────────────────────────────────

    pub fn add_fault(&mut self, time_hhmm: &str, fault_code: &str, comments: &str, actor: &str) -> Fault {
        let fault = Fault {
            time_hhmm: time_hhmm.to_string(),
            fault_code: fault_code.to_string(),
            comments: comments.to_string(),
            created_by: actor.to_string(),
            created_at: chrono::Utc::now().timestamp_millis(),
        };
        debug!(fault = %fault.fault_code, "Fault logged");
        self.mission.faults.push(fault.clone());
        self.note_actor(actor);
        fault
    }

    pub fn add_timeline(&mut self, time_hhmm: &str, event: TimelineEvent, actor: &str) -> TimelineEntry {
        let now = chrono::Utc::now().timestamp_millis();
        let entry = TimelineEntry {
            time_hhmm: time_hhmm.to_string(),
            event,
            created_by: actor.to_string(),
            created_at: now,
            last_modified: now,
            extra: serde_json::Map::new(),
        };
        debug!(event = event.as_str(), "Timeline event logged");
        self.mission.timeline.push(entry.clone());
        self.note_actor(actor);
        entry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ContactFields;

    fn board(block_start: u64) -> Board {
        Board::from_state(BoardState::initial("TC", Some(block_start), "M-1", "RAVEN"))
    }

    #[test]
    fn test_scenario_delete_restore_numbering() {
        let mut board = board(100);
        let a = board
            .create_record(TacrepFields::empty(TacrepType::India), false, false, "TC")
            .unwrap();
        let b = board
            .create_record(TacrepFields::empty(TacrepType::India), false, false, "TC")
            .unwrap();
        assert_eq!(a.record.code, "I100");
        assert_eq!(b.record.code, "I101");

        let deleted = board.delete_record("I100", "TC").unwrap();
        assert_eq!(deleted.record.code, "IXXX");
        assert_eq!(deleted.record.original_code.as_deref(), Some("I100"));

        let restored = board.restore_record("I100", "TC").unwrap();
        assert_eq!(restored.code, "I102");
    }

    #[test]
    fn test_scenario_delete_dissolves_pair_correlation() {
        let mut board = board(5);
        board
            .create_record(TacrepFields::empty(TacrepType::India), false, false, "TC")
            .unwrap();
        board
            .create_record(TacrepFields::empty(TacrepType::Echo), false, false, "TC")
            .unwrap();
        board
            .create_correlation(&["I5".to_string(), "E5".to_string()], "TC")
            .unwrap();

        let outcome = board.delete_record("E5", "TC").unwrap();
        assert_eq!(outcome.groups_trimmed, 1);
        assert!(board.correlations().is_empty());
    }

    #[test]
    fn test_delete_trims_group_loaded_with_lowercase_code() {
        let state = BoardState::parse(
            r#"{
                "blockStartNum": 1,
                "columns": { "India": [ { "code": "I1" } ], "Echo": [ { "code": "E1" } ] },
                "correlations": [ { "codes": ["i1", "E1"] } ]
            }"#,
        )
        .unwrap();
        let mut board = Board::from_state(state);
        assert_eq!(board.correlations().groups_for("I1").len(), 1);

        let outcome = board.delete_record("I1", "TC").unwrap();
        assert_eq!(outcome.groups_trimmed, 1);
        assert!(board.correlations().is_empty());
    }

    #[test]
    fn test_correct_logs_prior_snapshot_and_previews_new_state() {
        let mut board = board(100);
        let old = TacrepFields::India(ContactFields {
            course: Some("090".into()),
            ..ContactFields::default()
        });
        board.create_record(old.clone(), false, false, "TC").unwrap();

        let new = TacrepFields::India(ContactFields {
            course: Some("270".into()),
            ..ContactFields::default()
        });
        let outcome = board
            .edit_record("I100", new, None, ChangeKind::Correct, false, "MC")
            .unwrap();

        let entry = outcome.history.unwrap();
        assert_eq!(entry.snapshot, Some(old));
        assert_eq!(entry.by, "MC");
        let preview = outcome.preview.unwrap();
        assert!(preview.starts_with("Correction to TACREP I100\nCallsign: RAVEN"));
        assert!(preview.contains("Course: 270"));
        assert_eq!(board.query_history("I100").len(), 1);
        assert!(board.mission().crew_roster.contains(&"MC".to_string()));
    }

    #[test]
    fn test_plain_edit_history_is_optional() {
        let mut board = board(1);
        board
            .create_record(TacrepFields::empty(TacrepType::Golf), false, false, "TC")
            .unwrap();

        let outcome = board
            .edit_record("G1", TacrepFields::empty(TacrepType::Golf), None, ChangeKind::Edit, false, "TC")
            .unwrap();
        assert!(outcome.history.is_none());
        assert!(outcome.preview.is_none());

        let outcome = board
            .edit_record("G1", TacrepFields::empty(TacrepType::Golf), None, ChangeKind::Edit, true, "TC")
            .unwrap();
        assert_eq!(outcome.history.unwrap().kind, ChangeKind::Edit);
    }

    #[test]
    fn test_correlation_requires_configuration() {
        let mut board = Board::default();
        let err = board
            .create_correlation(&["I1".to_string(), "E1".to_string()], "TC")
            .unwrap_err();
        assert!(matches!(err, Error::NotConfigured));
        assert!(board.set_block_start(0).is_err());
    }

    #[test]
    fn test_state_round_trip_reproduces_board() {
        let mut board = board(100);
        board
            .create_record(TacrepFields::empty(TacrepType::India), false, false, "TC")
            .unwrap();
        board
            .create_record(TacrepFields::empty(TacrepType::Ais), true, false, "TC")
            .unwrap();
        board
            .create_record(TacrepFields::empty(TacrepType::Echo), false, false, "TC")
            .unwrap();
        board
            .create_correlation(&["I100".to_string(), "AIS100".to_string()], "TC")
            .unwrap();
        board.delete_record("E100", "TC").unwrap();
        board.append_history(ChangeKind::Update, "I100", "TC", None);
        board.add_fault("0930", "RADAR", "intermittent", "TC");
        board.add_timeline("0800", TimelineEvent::Offdeck, "TC");
        board.set_column_start(TacrepType::Golf, Some(400)).unwrap();

        let json = board.to_state().to_json().unwrap();
        let reloaded = Board::from_state(BoardState::parse(&json).unwrap());

        assert_eq!(reloaded, board);
        assert_eq!(reloaded.records().deleted().len(), 1);
        assert_eq!(reloaded.query_history("I100").len(), 1);
        assert_eq!(reloaded.numbering().column_start[&TacrepType::Golf], 400);
    }

    #[test]
    fn test_set_reported_and_shift() {
        let mut board = board(1);
        board
            .create_record(TacrepFields::empty(TacrepType::November), false, false, "TC")
            .unwrap();
        assert!(board.set_reported("n1", true).unwrap().reported);

        let shift = Shift {
            mc: "Smith".into(),
            ..Shift::default()
        };
        board.set_shift(1, shift).unwrap();
        assert_eq!(board.mission().crew_details.shifts[1].mc, "Smith");
        assert!(board.set_shift(9, Shift::default()).is_err());
    }
}
