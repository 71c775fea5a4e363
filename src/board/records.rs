//! Record store: active columns plus the deleted bucket.

use tracing::{debug, info};

use super::codes::{format_code, CodeAllocator, Numbering};
use crate::error::{Error, Result};
use crate::model::{Columns, Record, RecordStatus, TacrepFields, TacrepType};
use crate::validate::find_similar_codes;

/// Outcome of creating a record.
#[derive(Debug, Clone)]
pub struct Created {
    pub record: Record,
    /// The deleted record whose original code was taken over, if any.
    pub reactivated: Option<Record>,
}

/// Authoritative set of records.
///
/// Invariant: at most one active record holds a given code.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordStore {
    columns: Columns,
    deleted: Vec<Record>,
}

impl RecordStore {
    #[must_use]
    pub fn new(columns: Columns, deleted: Vec<Record>) -> Self {
        Self { columns, deleted }
    }

    #[must_use]
    pub const fn columns(&self) -> &Columns {
        &self.columns
    }

    #[must_use]
    pub fn deleted(&self) -> &[Record] {
        &self.deleted
    }

    /// Split back into document parts.
    #[must_use]
    pub fn into_parts(self) -> (Columns, Vec<Record>) {
        (self.columns, self.deleted)
    }

    /// Active record by code (case-insensitive).
    #[must_use]
    pub fn get(&self, code: &str) -> Option<&Record> {
        let code = code.trim();
        self.columns.iter().find(|r| r.code.eq_ignore_ascii_case(code))
    }

    /// Canonical spelling of an active code.
    #[must_use]
    pub fn canonical(&self, code: &str) -> Option<String> {
        self.get(code).map(|r| r.code.clone())
    }

    #[must_use]
    pub fn is_active(&self, code: &str) -> bool {
        self.get(code).is_some()
    }

    /// Error for a missing active code, with near matches when any exist.
    #[must_use]
    pub fn not_found(&self, code: &str) -> Error {
        let similar = find_similar_codes(code, self.columns.iter().map(|r| r.code.as_str()), 3);

        if similar.is_empty() {
            Error::RecordNotFound {
                code: code.to_string(),
            }
        } else {
            Error::RecordNotFoundSimilar {
                code: code.to_string(),
                similar,
            }
        }
    }

    fn position(&self, code: &str) -> Option<(TacrepType, usize)> {
        let code = code.trim();
        self.columns.columns().find_map(|(kind, records)| {
            records
                .iter()
                .position(|r| r.code.eq_ignore_ascii_case(code))
                .map(|i| (kind, i))
        })
    }

    /// The code a new record of `kind` would receive.
    ///
    /// # Errors
    ///
    /// Returns `NotConfigured` while the block start is unset.
    pub fn propose_code(&self, kind: TacrepType, numbering: &Numbering) -> Result<String> {
        let n = CodeAllocator::new(numbering, &self.columns).lowest_available(kind)?;
        Ok(format_code(kind, n))
    }

    /// Create a record with the lowest available code.
    ///
    /// If that code was held by a deleted record, creation stops with
    /// `CodeCollision` unless `reactivate` confirms taking it over; the
    /// deleted entry is then dropped from the bucket.
    ///
    /// # Errors
    ///
    /// Returns `NotConfigured` while the block start is unset, or
    /// `CodeCollision` as described above.
    pub fn create(
        &mut self,
        fields: TacrepFields,
        reported: bool,
        reactivate: bool,
        numbering: &Numbering,
        actor: &str,
    ) -> Result<Created> {
        let kind = fields.kind();
        let code = self.propose_code(kind, numbering)?;

        let collided = self
            .deleted
            .iter()
            .position(|r| r.effective_code().eq_ignore_ascii_case(&code));
        let reactivated = match collided {
            Some(_) if !reactivate => return Err(Error::CodeCollision { code }),
            Some(idx) => Some(self.deleted.remove(idx)),
            None => None,
        };

        let record = Record::new(code, fields, actor).with_reported(reported);
        self.columns.get_mut(kind).push(record.clone());

        info!(code = %record.code, kind = %kind, reactivated = reactivated.is_some(), "Created TACREP");
        Ok(Created {
            record,
            reactivated,
        })
    }

    /// Overwrite a record's fields in place, keeping its code.
    ///
    /// Returns the record as it was before and after the edit.
    ///
    /// # Errors
    ///
    /// Returns `RecordNotFound` if no active record holds `code`, or
    /// `InvalidType` if `fields` belong to another type.
    pub fn edit(
        &mut self,
        code: &str,
        fields: TacrepFields,
        reported: Option<bool>,
    ) -> Result<(Record, Record)> {
        let Some((kind, idx)) = self.position(code) else {
            return Err(self.not_found(code));
        };
        if fields.kind() != kind {
            return Err(Error::InvalidType(format!(
                "{code} is {kind}; cannot edit it as {}",
                fields.kind()
            )));
        }

        let record = &mut self.columns.get_mut(kind)[idx];
        let before = record.clone();
        record.fields = fields;
        if let Some(reported) = reported {
            record.reported = reported;
        }
        record.last_modified = chrono::Utc::now().timestamp_millis().max(before.last_modified + 1);

        debug!(code = %record.code, "Edited TACREP");
        Ok((before, record.clone()))
    }

    /// Move a record to the deleted bucket under its sentinel code.
    ///
    /// Correlation trimming is the caller's half of the same step.
    ///
    /// # Errors
    ///
    /// Returns `RecordNotFound` if no active record holds `code`.
    pub fn delete(&mut self, code: &str) -> Result<Record> {
        let Some((kind, idx)) = self.position(code) else {
            return Err(self.not_found(code));
        };
        let mut record = self.columns.get_mut(kind).remove(idx);
        let now = chrono::Utc::now().timestamp_millis();

        record.original_code = Some(record.code.clone());
        record.origin_column = Some(kind);
        record.code = TacrepType::from_code(&record.code).sentinel();
        record.status = RecordStatus::Deleted;
        record.deleted_at = Some(now);
        record.last_modified = now;

        info!(code = %record.effective_code(), sentinel = %record.code, "Deleted TACREP");
        self.deleted.push(record.clone());
        Ok(record)
    }

    /// Return a deleted record to its origin column under a fresh code.
    ///
    /// The new number comes from `next_highest`, so the record never
    /// reclaims a number freed since it was deleted.
    ///
    /// # Errors
    ///
    /// Returns `DeletedNotFound` if no deleted record has that original
    /// code, or `NotConfigured` while the block start is unset.
    pub fn restore(&mut self, original_code: &str, numbering: &Numbering) -> Result<Record> {
        let code = original_code.trim();
        let Some(idx) = self
            .deleted
            .iter()
            .rposition(|r| r.effective_code().eq_ignore_ascii_case(code))
        else {
            return Err(Error::DeletedNotFound {
                code: code.to_string(),
            });
        };

        let dest = {
            let r = &self.deleted[idx];
            r.origin_column
                .unwrap_or_else(|| TacrepType::from_code(r.effective_code()))
        };
        let n = CodeAllocator::new(numbering, &self.columns).next_highest(dest)?;

        let mut record = self.deleted.remove(idx);
        let previous = record.effective_code().to_string();
        record.fields = record.fields.retype(dest);
        record.code = format_code(dest, n);
        record.status = RecordStatus::Active;
        record.original_code = None;
        record.origin_column = None;
        record.deleted_at = None;
        record.last_modified = chrono::Utc::now().timestamp_millis();

        info!(from = %previous, code = %record.code, "Restored TACREP");
        self.columns.get_mut(dest).push(record.clone());
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> (RecordStore, Numbering) {
        (RecordStore::default(), Numbering::new(Some(100)))
    }

    fn india() -> TacrepFields {
        TacrepFields::empty(TacrepType::India)
    }

    #[test]
    fn test_create_allocates_sequential_codes() {
        let (mut store, numbering) = store();
        let a = store.create(india(), false, false, &numbering, "TC").unwrap();
        let b = store.create(india(), true, false, &numbering, "TC").unwrap();

        assert_eq!(a.record.code, "I100");
        assert_eq!(b.record.code, "I101");
        assert!(b.record.reported);
        assert_eq!(store.columns().get(TacrepType::India).len(), 2);
    }

    #[test]
    fn test_create_requires_block_start() {
        let mut store = RecordStore::default();
        let err = store
            .create(india(), false, false, &Numbering::default(), "TC")
            .unwrap_err();
        assert!(matches!(err, Error::NotConfigured));
        assert!(store.columns().is_empty());
    }

    #[test]
    fn test_delete_then_restore_takes_next_highest() {
        let (mut store, numbering) = store();
        store.create(india(), false, false, &numbering, "TC").unwrap();
        store.create(india(), false, false, &numbering, "TC").unwrap();

        let deleted = store.delete("i100").unwrap();
        assert_eq!(deleted.code, "IXXX");
        assert_eq!(deleted.original_code.as_deref(), Some("I100"));
        assert_eq!(deleted.origin_column, Some(TacrepType::India));
        assert!(deleted.deleted_at.is_some());
        assert!(!store.is_active("I100"));

        let restored = store.restore("I100", &numbering).unwrap();
        assert_eq!(restored.code, "I102");
        assert_eq!(restored.status, RecordStatus::Active);
        assert!(restored.original_code.is_none());
        assert!(restored.deleted_at.is_none());
        assert!(store.deleted().is_empty());
    }

    #[test]
    fn test_collision_with_deleted_code_needs_confirmation() {
        let (mut store, numbering) = store();
        store.create(india(), false, false, &numbering, "TC").unwrap();
        store.delete("I100").unwrap();

        let err = store.create(india(), false, false, &numbering, "MC").unwrap_err();
        assert!(matches!(err, Error::CodeCollision { ref code } if code == "I100"));
        assert!(store.columns().is_empty());
        assert_eq!(store.deleted().len(), 1);

        let created = store.create(india(), false, true, &numbering, "MC").unwrap();
        assert_eq!(created.record.code, "I100");
        assert_eq!(created.record.created_by, "MC");
        assert!(created.reactivated.is_some());
        assert!(store.deleted().is_empty());
    }

    #[test]
    fn test_edit_keeps_code_and_returns_prior_state() {
        let (mut store, numbering) = store();
        store.create(india(), false, false, &numbering, "TC").unwrap();

        let mut fields = india();
        if let TacrepFields::India(c) = &mut fields {
            c.course = Some("180".into());
        }
        let (before, after) = store.edit("I100", fields, Some(true)).unwrap();

        assert_eq!(after.code, "I100");
        assert!(after.reported);
        assert!(after.last_modified > before.last_modified);
        assert!(before.fields.contact().unwrap().course.is_none());
        assert_eq!(after.fields.contact().unwrap().course.as_deref(), Some("180"));
    }

    #[test]
    fn test_edit_rejects_type_change_and_missing_code() {
        let (mut store, numbering) = store();
        store.create(india(), false, false, &numbering, "TC").unwrap();

        let err = store
            .edit("I100", TacrepFields::empty(TacrepType::Echo), None)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidType(_)));

        let err = store.edit("I10", india(), None).unwrap_err();
        assert!(matches!(err, Error::RecordNotFoundSimilar { .. }));

        let err = store.edit("E9", india(), None).unwrap_err();
        assert!(matches!(err, Error::RecordNotFound { .. }));
    }

    #[test]
    fn test_restore_unknown_code() {
        let (mut store, numbering) = store();
        let err = store.restore("I100", &numbering).unwrap_err();
        assert!(matches!(err, Error::DeletedNotFound { .. }));
    }

    #[test]
    fn test_restore_legacy_deleted_without_origin_column() {
        let (mut store, numbering) = store();
        store
            .create(TacrepFields::empty(TacrepType::Ais), false, false, &numbering, "TC")
            .unwrap();
        let mut deleted = store.delete("AIS100").unwrap();
        deleted.origin_column = None;
        store.deleted = vec![deleted];

        let restored = store.restore("AIS100", &numbering).unwrap();
        assert_eq!(restored.kind(), TacrepType::Ais);
        assert_eq!(restored.code, "AIS100");
    }
}
