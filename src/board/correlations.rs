//! Correlation index.
//!
//! Groups are addressed by position in the document's `correlations`
//! array (0-based here, 1-based on the command line).

use std::collections::BTreeSet;
use tracing::{debug, info};

use super::records::RecordStore;
use crate::error::{Error, Result};
use crate::model::CorrelationGroup;

/// What a membership removal did to its group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Removal {
    /// The group still has two or more codes.
    Kept,
    /// The group fell below two codes and was deleted.
    Dissolved,
}

/// Groups of related TACREP codes.
///
/// Invariant: every group holds at least two codes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CorrelationIndex {
    groups: Vec<CorrelationGroup>,
}

impl CorrelationIndex {
    /// Load groups, dropping any that arrive with fewer than two codes.
    #[must_use]
    pub fn new(groups: Vec<CorrelationGroup>) -> Self {
        let groups = groups.into_iter().filter(|g| g.len() >= 2).collect();
        Self { groups }
    }

    #[must_use]
    pub fn groups(&self) -> &[CorrelationGroup] {
        &self.groups
    }

    #[must_use]
    pub fn into_groups(self) -> Vec<CorrelationGroup> {
        self.groups
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Group by position.
    ///
    /// # Errors
    ///
    /// Returns `GroupNotFound` for an out-of-range index.
    pub fn get(&self, index: usize) -> Result<&CorrelationGroup> {
        self.groups
            .get(index)
            .ok_or(Error::GroupNotFound { index: index + 1 })
    }

    fn get_mut(&mut self, index: usize) -> Result<&mut CorrelationGroup> {
        self.groups
            .get_mut(index)
            .ok_or(Error::GroupNotFound { index: index + 1 })
    }

    /// Create a group from two or more distinct active codes.
    ///
    /// Returns the new group's index.
    ///
    /// # Errors
    ///
    /// Returns `RecordNotFound` for a code that is not active, or
    /// `InvalidArgument` if fewer than two distinct codes remain.
    pub fn create_group(
        &mut self,
        codes: &[String],
        records: &RecordStore,
        actor: &str,
    ) -> Result<usize> {
        let mut members = BTreeSet::new();
        for code in codes {
            let canonical = records.canonical(code).ok_or_else(|| records.not_found(code))?;
            members.insert(canonical);
        }
        if members.len() < 2 {
            return Err(Error::InvalidArgument(
                "a correlation needs at least two distinct active TACREPs".to_string(),
            ));
        }

        info!(codes = ?members, "Created correlation");
        self.groups.push(CorrelationGroup::new(members, actor));
        Ok(self.groups.len() - 1)
    }

    /// Add an active code to a group. Adding an existing member is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `GroupNotFound` or `RecordNotFound`.
    pub fn add_to_group(
        &mut self,
        index: usize,
        code: &str,
        records: &RecordStore,
        actor: &str,
    ) -> Result<()> {
        let canonical = records.canonical(code).ok_or_else(|| records.not_found(code))?;
        let group = self.get_mut(index)?;
        if group.codes.insert(canonical) {
            group.touch(actor);
            debug!(group = index + 1, code = %code, "Added to correlation");
        }
        Ok(())
    }

    /// Remove a code from a group, deleting the group if fewer than two
    /// codes would remain.
    ///
    /// # Errors
    ///
    /// Returns `GroupNotFound`, or `RecordNotFound` if the code is not a
    /// member of the group.
    pub fn remove_from_group(&mut self, index: usize, code: &str, actor: &str) -> Result<Removal> {
        let group = self.get_mut(index)?;
        let Some(member) = group.member(code).cloned() else {
            return Err(Error::RecordNotFound {
                code: code.to_string(),
            });
        };

        if group.len() <= 2 {
            self.groups.remove(index);
            info!(group = index + 1, "Correlation dissolved");
            return Ok(Removal::Dissolved);
        }
        group.codes.remove(&member);
        group.touch(actor);
        debug!(group = index + 1, code = %member, "Removed from correlation");
        Ok(Removal::Kept)
    }

    /// Delete a group outright.
    ///
    /// # Errors
    ///
    /// Returns `GroupNotFound` for an out-of-range index.
    pub fn drop_group(&mut self, index: usize) -> Result<CorrelationGroup> {
        self.get(index)?;
        Ok(self.groups.remove(index))
    }

    /// Groups that directly contain `code`, with their indices.
    #[must_use]
    pub fn groups_for(&self, code: &str) -> Vec<(usize, &CorrelationGroup)> {
        let code = code.trim();
        self.groups
            .iter()
            .enumerate()
            .filter(|(_, g)| g.codes.iter().any(|c| c.eq_ignore_ascii_case(code)))
            .collect()
    }

    /// Strip `code` from every group, dissolving groups left with one code.
    ///
    /// Returns the number of groups touched.
    pub fn trim_code(&mut self, code: &str) -> usize {
        let mut touched = 0;
        self.groups.retain_mut(|group| {
            let Some(member) = group.member(code).cloned() else {
                return true;
            };
            touched += 1;
            if group.len() <= 2 {
                return false;
            }
            group.codes.remove(&member);
            true
        });
        if touched > 0 {
            debug!(code = %code, groups = touched, "Trimmed correlations");
        }
        touched
    }
}
