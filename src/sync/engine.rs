//! Sync engine: one board, one backend, one save scheduler.
//!
//! Every mutation goes through the engine so it can mark the document
//! dirty. Saves write the whole document. Polling compares the backing
//! document's timestamp with the last one seen and, when it is newer,
//! replaces the local board wholesale. There is no field-level merge: the
//! latest full snapshot wins, and unsaved local edits are dropped.

use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use super::backend::BoardBackend;
use super::file::parse_document;
use super::hash::{content_hash, digest};
use super::scheduler::{SaveScheduler, SaveState};
use super::types::{
    PollOutcome, SaveReport, SkipReason, SyncError, SyncResult, SyncStatus, WriteReceipt,
};
use crate::board::{Board, Created, DeleteOutcome, EditOutcome, Removal};
use crate::error::{Error, Result};
use crate::model::{
    BoardState, ChangeKind, Fault, HistoryEntry, Record, Shift, TacrepFields, TacrepType,
    TimelineEntry, TimelineEvent,
};

/// Engine tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncSettings {
    /// Debounce window for normal mutations.
    pub autosave: Duration,
    /// Interval between polls of the backing document.
    pub poll: Duration,
    /// Whether plain edits append history.
    pub log_edits: bool,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            autosave: Duration::from_millis(400),
            poll: Duration::from_millis(5000),
            log_edits: false,
        }
    }
}

/// A serialized document waiting to be written.
#[derive(Debug, Clone)]
pub struct PendingSave {
    pub content: String,
    pub hash: String,
}

/// Keeps a [`Board`] and its backing document in step.
pub struct SyncEngine<B: BoardBackend> {
    board: Board,
    backend: B,
    scheduler: SaveScheduler,
    settings: SyncSettings,
    actor: String,
    last_known_modified: Option<i64>,
    last_saved_hash: Option<String>,
    last_error: Option<String>,
    visible: bool,
}

impl<B: BoardBackend> SyncEngine<B> {
    /// Open the backend's document. A missing document yields an empty,
    /// unconfigured board.
    ///
    /// # Errors
    ///
    /// Returns `CorruptDocument` if the document cannot be parsed, or an
    /// I/O error if it cannot be read.
    pub async fn open(backend: B, settings: SyncSettings, actor: &str) -> Result<Self> {
        let modified = backend.modified().await?;
        let (state, hash) = match backend.read().await? {
            Some(text) => {
                let state = parse_document(&text)?;
                let hash = content_hash(&state)?;
                (state, Some(hash))
            }
            None => (BoardState::default(), None),
        };
        debug!(backend = backend.name(), location = %backend.location(), ?modified, "Board opened");

        let mut engine = Self::with_board(Board::from_state(state), backend, settings, actor);
        engine.last_known_modified = modified;
        engine.last_saved_hash = hash;
        Ok(engine)
    }

    /// Wrap an in-memory board. Nothing is marked dirty.
    #[must_use]
    pub fn with_board(board: Board, backend: B, settings: SyncSettings, actor: &str) -> Self {
        Self {
            board,
            backend,
            scheduler: SaveScheduler::new(settings.autosave),
            settings,
            actor: actor.to_string(),
            last_known_modified: None,
            last_saved_hash: None,
            last_error: None,
            visible: true,
        }
    }

    #[must_use]
    pub const fn board(&self) -> &Board {
        &self.board
    }

    #[must_use]
    pub const fn backend(&self) -> &B {
        &self.backend
    }

    #[must_use]
    pub fn actor(&self) -> &str {
        &self.actor
    }

    #[must_use]
    pub const fn settings(&self) -> &SyncSettings {
        &self.settings
    }

    #[must_use]
    pub const fn save_state(&self) -> SaveState {
        self.scheduler.state()
    }

    #[must_use]
    pub const fn last_known_modified(&self) -> Option<i64> {
        self.last_known_modified
    }

    /// Pause or resume polling, as when the board leaves the foreground.
    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    fn touch(&mut self, priority: bool) {
        self.scheduler.mark_dirty(Instant::now(), priority);
    }

    // ── Operations ────────────────────────────────────────────

    /// # Errors
    ///
    /// See [`Board::create_record`].
    pub fn create_record(
        &mut self,
        fields: TacrepFields,
        reported: bool,
        reactivate: bool,
    ) -> Result<Created> {
        let created = self
            .board
            .create_record(fields, reported, reactivate, &self.actor)?;
        self.touch(false);
        Ok(created)
    }

    /// Edits that write history save with priority.
    ///
    /// # Errors
    ///
    /// See [`Board::edit_record`].
    pub fn edit_record(
        &mut self,
        code: &str,
        fields: TacrepFields,
        reported: Option<bool>,
        kind: ChangeKind,
    ) -> Result<EditOutcome> {
        let outcome = self.board.edit_record(
            code,
            fields,
            reported,
            kind,
            self.settings.log_edits,
            &self.actor,
        )?;
        self.touch(outcome.history.is_some());
        Ok(outcome)
    }

    /// # Errors
    ///
    /// See [`Board::set_reported`].
    pub fn set_reported(&mut self, code: &str, reported: bool) -> Result<Record> {
        let record = self.board.set_reported(code, reported)?;
        self.touch(false);
        Ok(record)
    }

    /// # Errors
    ///
    /// See [`Board::delete_record`].
    pub fn delete_record(&mut self, code: &str) -> Result<DeleteOutcome> {
        let outcome = self.board.delete_record(code, &self.actor)?;
        self.touch(true);
        Ok(outcome)
    }

    /// # Errors
    ///
    /// See [`Board::restore_record`].
    pub fn restore_record(&mut self, original_code: &str) -> Result<Record> {
        let record = self.board.restore_record(original_code, &self.actor)?;
        self.touch(true);
        Ok(record)
    }

    /// # Errors
    ///
    /// See [`Board::set_block_start`].
    pub fn set_block_start(&mut self, n: u64) -> Result<()> {
        self.board.set_block_start(n)?;
        self.touch(true);
        Ok(())
    }

    /// # Errors
    ///
    /// See [`Board::set_column_start`].
    pub fn set_column_start(&mut self, kind: TacrepType, n: Option<u64>) -> Result<()> {
        self.board.set_column_start(kind, n)?;
        self.touch(true);
        Ok(())
    }

    pub fn set_mission(&mut self, number: Option<&str>, callsign: Option<&str>) {
        self.board.set_mission(number, callsign);
        self.touch(false);
    }

    /// # Errors
    ///
    /// See [`Board::set_shift`].
    pub fn set_shift(&mut self, index: usize, shift: Shift) -> Result<()> {
        self.board.set_shift(index, shift)?;
        self.touch(false);
        Ok(())
    }

    /// # Errors
    ///
    /// See [`Board::create_correlation`].
    pub fn create_correlation(&mut self, codes: &[String]) -> Result<usize> {
        let index = self.board.create_correlation(codes, &self.actor)?;
        self.touch(true);
        Ok(index)
    }

    /// # Errors
    ///
    /// See [`Board::add_to_correlation`].
    pub fn add_to_correlation(&mut self, index: usize, code: &str) -> Result<()> {
        self.board.add_to_correlation(index, code, &self.actor)?;
        self.touch(true);
        Ok(())
    }

    /// # Errors
    ///
    /// See [`Board::remove_from_correlation`].
    pub fn remove_from_correlation(&mut self, index: usize, code: &str) -> Result<Removal> {
        let removal = self.board.remove_from_correlation(index, code, &self.actor)?;
        self.touch(true);
        Ok(removal)
    }

    /// # Errors
    ///
    /// See [`Board::drop_correlation`].
    pub fn drop_correlation(&mut self, index: usize) -> Result<()> {
        self.board.drop_correlation(index, &self.actor)?;
        self.touch(true);
        Ok(())
    }

    pub fn append_history(
        &mut self,
        kind: ChangeKind,
        code: &str,
        snapshot: Option<TacrepFields>,
    ) -> HistoryEntry {
        let entry = self.board.append_history(kind, code, &self.actor, snapshot);
        self.touch(true);
        entry
    }

    #[must_use]
    pub fn query_history(&self, code: &str) -> Vec<&HistoryEntry> {
        self.board.query_history(code)
    }

    pub fn add_fault(&mut self, time_hhmm: &str, fault_code: &str, comments: &str) -> Fault {
        let fault = self
            .board
            .add_fault(time_hhmm, fault_code, comments, &self.actor);
        self.touch(true);
        fault
    }

    pub fn add_timeline(&mut self, time_hhmm: &str, event: TimelineEvent) -> TimelineEntry {
        let entry = self.board.add_timeline(time_hhmm, event, &self.actor);
        self.touch(true);
        entry
    }

    // ── Saving ────────────────────────────────────────────────

    /// Ask for a save; `priority` skips the debounce window.
    pub fn request_save(&mut self, priority: bool) {
        self.touch(priority);
    }

    /// When the next save falls due.
    #[must_use]
    pub const fn next_deadline(&self) -> Option<Instant> {
        self.scheduler.next_deadline()
    }

    /// Whether a save should start at `now`.
    #[must_use]
    pub fn save_due(&self, now: Instant) -> bool {
        self.scheduler.is_due(now)
    }

    /// Start a save: snapshot and serialize the board and enter `Saving`.
    ///
    /// Returns `None` when there is nothing to save or a write is already
    /// in flight.
    ///
    /// # Errors
    ///
    /// Returns an error if the board cannot be serialized.
    pub fn begin_save(&mut self) -> Result<Option<PendingSave>> {
        if self.scheduler.is_saving() || !self.scheduler.has_unsaved() {
            return Ok(None);
        }
        let state = self.board.to_state();
        let content = state.to_json()?;
        let hash = content_hash(&state)?;
        self.scheduler.begin_save();
        Ok(Some(PendingSave { content, hash }))
    }

    /// Finish a save started with [`begin_save`](Self::begin_save).
    ///
    /// # Errors
    ///
    /// Returns `PersistenceFailure` if the write failed; the save is
    /// retried after the next debounce window.
    pub fn complete_save(
        &mut self,
        pending: PendingSave,
        result: SyncResult<WriteReceipt>,
    ) -> Result<SaveReport> {
        let now = Instant::now();
        match result {
            Ok(receipt) => {
                self.scheduler.finish_save(now, true);
                if receipt.modified.is_some() {
                    self.last_known_modified = receipt.modified;
                }
                self.last_saved_hash = Some(pending.hash.clone());
                self.last_error = None;
                info!(path = %receipt.path.display(), modified = ?receipt.modified, "Board saved");
                Ok(SaveReport {
                    path: receipt.path,
                    hash: pending.hash,
                    modified: receipt.modified,
                })
            }
            Err(e) => {
                self.scheduler.finish_save(now, false);
                error!(error = %e, "Board save failed");
                self.last_error = Some(e.to_string());
                Err(Error::PersistenceFailure(e.to_string()))
            }
        }
    }

    async fn save(&mut self) -> Result<Option<SaveReport>> {
        let Some(pending) = self.begin_save()? else {
            return Ok(None);
        };
        let result = self.backend.write(pending.content.clone()).await;
        self.complete_save(pending, result).map(Some)
    }

    /// Save if one is due at `now`.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceFailure` if the write failed.
    pub async fn tick(&mut self, now: Instant) -> Result<Option<SaveReport>> {
        if self.scheduler.is_due(now) {
            self.save().await
        } else {
            Ok(None)
        }
    }

    /// Save now if anything is unsaved, ignoring the debounce window.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceFailure` if the write failed.
    pub async fn flush(&mut self) -> Result<Option<SaveReport>> {
        self.save().await
    }

    /// Write a timestamped full-document export into `dir`, independent of
    /// the live backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the export cannot be written.
    pub async fn export_to(&self, dir: &std::path::Path) -> Result<std::path::PathBuf> {
        let content = self.board.to_state().to_json()?;
        let dir = dir.to_path_buf();
        let path = tokio::task::spawn_blocking(move || {
            super::file::write_export(&dir, &content, chrono::Utc::now())
        })
        .await
        .map_err(|e| Error::Other(e.to_string()))??;
        info!(path = %path.display(), "Board exported");
        Ok(path)
    }

    // ── Polling ───────────────────────────────────────────────

    /// Check the backing document once and adopt it if it is newer.
    ///
    /// A document that fails to parse leaves local state untouched.
    ///
    /// # Errors
    ///
    /// Returns `CorruptDocument` for an unparseable document, or an I/O
    /// error if it cannot be read.
    pub async fn poll_once(&mut self) -> Result<PollOutcome> {
        if !self.backend.supports_polling() {
            return Ok(PollOutcome::Skipped {
                reason: SkipReason::Unsupported,
            });
        }
        if !self.visible {
            return Ok(PollOutcome::Skipped {
                reason: SkipReason::Hidden,
            });
        }
        if self.scheduler.is_saving() {
            return Ok(PollOutcome::Skipped {
                reason: SkipReason::Saving,
            });
        }

        let Some(modified) = self.backend.modified().await? else {
            return Ok(PollOutcome::Unchanged);
        };
        if self.last_known_modified.is_some_and(|known| modified <= known) {
            return Ok(PollOutcome::Unchanged);
        }

        let Some(text) = self.backend.read().await? else {
            return Ok(PollOutcome::Unchanged);
        };
        let state = parse_document(&text).inspect_err(|e| {
            warn!(error = %e, "Ignoring unreadable board document");
        })?;

        let remote_hash = content_hash(&state)?;
        let local_hash = content_hash(&self.board.to_state())?;
        self.last_known_modified = Some(modified);
        self.last_saved_hash = Some(remote_hash.clone());

        if remote_hash == local_hash {
            self.scheduler.clear();
            debug!(modified, "Remote board identical; timestamp adopted");
            return Ok(PollOutcome::Adopted);
        }

        let discarded_local = self.scheduler.has_unsaved();
        self.board = Board::from_state(state);
        self.scheduler.clear();
        if discarded_local {
            warn!(modified, "Newer board loaded; unsaved local edits discarded");
        } else {
            info!(modified, "Newer board loaded");
        }
        Ok(PollOutcome::Replaced { discarded_local })
    }

    /// Local board versus backing document.
    ///
    /// # Errors
    ///
    /// Returns an error if the local board cannot be serialized or the
    /// backend cannot be read.
    pub async fn status(&self) -> Result<SyncStatus> {
        let local_hash = content_hash(&self.board.to_state())?;
        let remote_hash = if self.backend.supports_polling() {
            match self.backend.read().await? {
                Some(text) => match parse_document(&text) {
                    Ok(state) => Some(content_hash(&state)?),
                    Err(SyncError::Corrupt(e)) => {
                        warn!(error = %e, "Backing document is unreadable");
                        Some(digest(text.as_bytes()))
                    }
                    Err(e) => return Err(e.into()),
                },
                None => None,
            }
        } else {
            self.last_saved_hash.clone()
        };

        let records = self.board.records();
        Ok(SyncStatus {
            backend: self.backend.name(),
            location: self.backend.location(),
            save_state: self.scheduler.state().as_str(),
            polling: self.backend.supports_polling(),
            last_known_modified: self.last_known_modified,
            in_sync: remote_hash.as_deref() == Some(local_hash.as_str()),
            local_hash,
            remote_hash,
            block_start: self.board.numbering().block_start,
            active: records.columns().len(),
            deleted: records.deleted().len(),
            correlations: self.board.correlations().len(),
            history: self.board.history().len(),
            last_error: self.last_error.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ContactFields;
    use crate::sync::backend::MemoryBackend;

    fn settings() -> SyncSettings {
        SyncSettings::default()
    }

    async fn configured(backend: MemoryBackend, actor: &str) -> SyncEngine<MemoryBackend> {
        let mut engine = SyncEngine::open(backend, settings(), actor).await.unwrap();
        if !engine.board().numbering().is_configured() {
            engine.set_block_start(100).unwrap();
            engine.flush().await.unwrap();
        }
        engine
    }

    fn india(course: &str) -> TacrepFields {
        TacrepFields::India(ContactFields {
            course: Some(course.to_string()),
            ..ContactFields::default()
        })
    }

    #[tokio::test]
    async fn test_burst_of_edits_saves_once_then_priority_saves_at_once() {
        let backend = MemoryBackend::default();
        let mut engine = configured(backend.clone(), "TC").await;
        engine.create_record(india("000"), false, false).unwrap();
        engine.flush().await.unwrap();
        let base = backend.writes();

        let start = Instant::now();
        for i in 0..5 {
            engine
                .edit_record("I100", india(&format!("{i:03}")), None, ChangeKind::Edit)
                .unwrap();
        }
        assert!(engine.tick(start).await.unwrap().is_none());
        assert_eq!(backend.writes(), base);

        let report = engine
            .tick(Instant::now() + Duration::from_millis(400))
            .await
            .unwrap();
        assert!(report.is_some());
        assert_eq!(backend.writes(), base + 1);

        engine.set_block_start(200).unwrap();
        assert!(engine.tick(Instant::now()).await.unwrap().is_some());
        assert_eq!(backend.writes(), base + 2);
    }

    #[tokio::test]
    async fn test_delete_and_restore_save_without_debounce() {
        let backend = MemoryBackend::default();
        let mut engine = configured(backend.clone(), "TC").await;
        engine.create_record(india("000"), false, false).unwrap();
        engine.flush().await.unwrap();
        let base = backend.writes();

        engine.delete_record("I100").unwrap();
        assert!(engine.tick(Instant::now()).await.unwrap().is_some());
        assert_eq!(backend.writes(), base + 1);

        engine.restore_record("I100").unwrap();
        assert!(engine.tick(Instant::now()).await.unwrap().is_some());
        assert_eq!(backend.writes(), base + 2);
    }

    #[tokio::test]
    async fn test_remote_write_replaces_local_and_discards_unsaved() {
        let shared = MemoryBackend::default();
        let mut a = configured(shared.clone(), "TC").await;
        let mut b = SyncEngine::open(shared.clone(), settings(), "MC").await.unwrap();
        assert_eq!(b.poll_once().await.unwrap(), PollOutcome::Unchanged);

        // B holds an unsaved local edit.
        b.set_mission(Some("LOCAL"), None);

        // A saves a newer document.
        a.create_record(india("090"), false, false).unwrap();
        a.flush().await.unwrap();

        let outcome = b.poll_once().await.unwrap();
        assert_eq!(
            outcome,
            PollOutcome::Replaced {
                discarded_local: true
            }
        );
        assert!(b.board().records().is_active("I100"));
        assert_eq!(b.board().mission().mission_number, "");
        assert_eq!(b.save_state(), SaveState::Idle);

        assert_eq!(b.poll_once().await.unwrap(), PollOutcome::Unchanged);
    }

    #[tokio::test]
    async fn test_own_save_is_not_reloaded() {
        let backend = MemoryBackend::default();
        let mut engine = configured(backend, "TC").await;
        engine.create_record(india("010"), false, false).unwrap();
        engine.flush().await.unwrap();
        assert_eq!(engine.poll_once().await.unwrap(), PollOutcome::Unchanged);
    }

    #[tokio::test]
    async fn test_identical_remote_is_adopted_without_replace() {
        let backend = MemoryBackend::default();
        let mut engine = configured(backend.clone(), "TC").await;
        let text = backend.content().unwrap();
        backend.put(&text);

        assert_eq!(engine.poll_once().await.unwrap(), PollOutcome::Adopted);
    }

    #[tokio::test]
    async fn test_corrupt_remote_preserves_local_state() {
        let backend = MemoryBackend::default();
        let mut engine = configured(backend.clone(), "TC").await;
        engine.create_record(india("010"), false, false).unwrap();
        engine.flush().await.unwrap();

        backend.put("{ \"columns\": [");
        let err = engine.poll_once().await.unwrap_err();
        assert!(matches!(err, Error::CorruptDocument(_)));
        assert!(engine.board().records().is_active("I100"));
    }

    #[tokio::test]
    async fn test_polling_is_skipped_while_hidden_or_saving() {
        let backend = MemoryBackend::default();
        let mut engine = configured(backend, "TC").await;

        engine.set_visible(false);
        assert_eq!(
            engine.poll_once().await.unwrap(),
            PollOutcome::Skipped {
                reason: SkipReason::Hidden
            }
        );
        engine.set_visible(true);

        engine.request_save(true);
        let pending = engine.begin_save().unwrap().unwrap();
        assert_eq!(
            engine.poll_once().await.unwrap(),
            PollOutcome::Skipped {
                reason: SkipReason::Saving
            }
        );

        // A mutation mid-write is saved right after.
        engine.set_mission(None, Some("HAWK"));
        let receipt = engine.backend().write(pending.content.clone()).await;
        engine.complete_save(pending, receipt).unwrap();
        assert!(engine.save_due(Instant::now()));
        engine.tick(Instant::now()).await.unwrap();
        assert_eq!(engine.save_state(), SaveState::Idle);
    }

    #[tokio::test]
    async fn test_failed_save_surfaces_and_retries() {
        let backend = MemoryBackend::default();
        let mut engine = configured(backend.clone(), "TC").await;

        backend.set_fail_writes(true);
        engine.request_save(true);
        let err = engine.flush().await.unwrap_err();
        assert!(matches!(err, Error::PersistenceFailure(_)));
        assert!(engine.status().await.unwrap().last_error.is_some());

        backend.set_fail_writes(false);
        assert!(engine.flush().await.unwrap().is_some());
        let status = engine.status().await.unwrap();
        assert!(status.in_sync);
        assert!(status.last_error.is_none());
    }

    #[tokio::test]
    async fn test_corrupt_document_on_open() {
        let backend = MemoryBackend::default();
        backend.put("not json");
        let result = SyncEngine::open(backend, settings(), "TC").await;
        assert!(matches!(result, Err(Error::CorruptDocument(_))));
    }
}
