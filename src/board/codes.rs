//! TACREP code allocation.
//!
//! Codes are `<prefix><n>` with no padding. The set of used numbers is
//! always derived from the currently active records; nothing is persisted
//! as a counter, so deletions free numbers for `lowest_available` but never
//! for `next_highest`.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::error::{Error, Result};
use crate::model::{Columns, TacrepType};

/// Mission numbering floors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Numbering {
    /// Mission-wide floor; allocation is disabled until set.
    pub block_start: Option<u64>,
    /// Per-type floors overriding the block start.
    pub column_start: BTreeMap<TacrepType, u64>,
}

impl Numbering {
    #[must_use]
    pub fn new(block_start: Option<u64>) -> Self {
        Self {
            block_start,
            column_start: BTreeMap::new(),
        }
    }

    #[must_use]
    pub const fn is_configured(&self) -> bool {
        self.block_start.is_some()
    }

    /// Lowest number allocatable for `kind`.
    ///
    /// # Errors
    ///
    /// Returns `NotConfigured` while the block start is unset.
    pub fn base(&self, kind: TacrepType) -> Result<u64> {
        let block = self.block_start.ok_or(Error::NotConfigured)?;
        Ok(self.column_start.get(&kind).copied().unwrap_or(block).max(1))
    }
}

/// Build a code from a type and number.
#[must_use]
pub fn format_code(kind: TacrepType, n: u64) -> String {
    format!("{}{n}", kind.prefix())
}

/// Numeric suffix of `code` if it belongs to `kind`.
///
/// The prefix matches case-insensitively. `A12` is Alpha, never AIS, and
/// `AIS12` is never Alpha.
#[must_use]
pub fn parse_suffix(kind: TacrepType, code: &str) -> Option<u64> {
    let code = code.trim();
    if TacrepType::from_code(code) != kind {
        return None;
    }
    let prefix = kind.prefix();
    let head = code.get(..prefix.len())?;
    if !head.eq_ignore_ascii_case(prefix) {
        return None;
    }
    let digits = &code[prefix.len()..];
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

fn exhausted(kind: TacrepType) -> Error {
    Error::InvalidArgument(format!("no {kind} code numbers left above the highest in use"))
}

/// Allocates codes against a snapshot of the active columns.
pub struct CodeAllocator<'a> {
    numbering: &'a Numbering,
    columns: &'a Columns,
}

impl<'a> CodeAllocator<'a> {
    #[must_use]
    pub const fn new(numbering: &'a Numbering, columns: &'a Columns) -> Self {
        Self { numbering, columns }
    }

    /// Numbers held by active records of `kind`, across every column.
    #[must_use]
    pub fn used(&self, kind: TacrepType) -> BTreeSet<u64> {
        self.columns
            .iter()
            .filter_map(|r| parse_suffix(kind, &r.code))
            .collect()
    }

    /// Smallest number at or above the floor that no active record holds.
    ///
    /// # Errors
    ///
    /// Returns `NotConfigured` while the block start is unset, or
    /// `InvalidArgument` if every number from the floor up is taken.
    pub fn lowest_available(&self, kind: TacrepType) -> Result<u64> {
        let base = self.numbering.base(kind)?;
        let used = self.used(kind);
        let mut n = base;
        for taken in used.range(base..) {
            if *taken != n {
                break;
            }
            n = n.checked_add(1).ok_or_else(|| exhausted(kind))?;
        }
        Ok(n)
    }

    /// One past the highest active number, never below the floor.
    ///
    /// Used on restore so a returning record never takes a number that
    /// was freed by a later deletion.
    ///
    /// # Errors
    ///
    /// Returns `NotConfigured` while the block start is unset, or
    /// `InvalidArgument` if the highest active number is `u64::MAX`.
    pub fn next_highest(&self, kind: TacrepType) -> Result<u64> {
        let base = self.numbering.base(kind)?;
        let next = match self.used(kind).last() {
            Some(max) => max.checked_add(1).ok_or_else(|| exhausted(kind))?,
            None => base,
        };
        Ok(next.max(base))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Record, TacrepFields};

    fn columns_with(codes: &[&str]) -> Columns {
        let mut columns = Columns::default();
        for code in codes {
            let kind = TacrepType::from_code(code);
            columns
                .get_mut(kind)
                .push(Record::new((*code).to_string(), TacrepFields::empty(kind), "TC"));
        }
        columns
    }

    #[test]
    fn test_suffix_parsing_respects_ais_prefix() {
        assert_eq!(parse_suffix(TacrepType::Alpha, "A12"), Some(12));
        assert_eq!(parse_suffix(TacrepType::Alpha, "AIS12"), None);
        assert_eq!(parse_suffix(TacrepType::Ais, "ais7"), Some(7));
        assert_eq!(parse_suffix(TacrepType::India, "IXXX"), None);
        assert_eq!(parse_suffix(TacrepType::India, "I"), None);
        assert_eq!(parse_suffix(TacrepType::Other, "O3"), Some(3));
    }

    #[test]
    fn test_unconfigured_allocation_fails() {
        let numbering = Numbering::default();
        let columns = Columns::default();
        let alloc = CodeAllocator::new(&numbering, &columns);
        assert!(matches!(
            alloc.lowest_available(TacrepType::India),
            Err(Error::NotConfigured)
        ));
        assert!(matches!(
            alloc.next_highest(TacrepType::India),
            Err(Error::NotConfigured)
        ));
    }

    #[test]
    fn test_lowest_available_fills_gaps_above_base() {
        let numbering = Numbering::new(Some(100));
        let columns = columns_with(&["I100", "I101", "I103", "I7", "E100", "A100", "AIS101"]);
        let alloc = CodeAllocator::new(&numbering, &columns);

        assert_eq!(alloc.lowest_available(TacrepType::India).unwrap(), 102);
        assert_eq!(alloc.lowest_available(TacrepType::Echo).unwrap(), 101);
        assert_eq!(alloc.lowest_available(TacrepType::Alpha).unwrap(), 101);
        assert_eq!(alloc.lowest_available(TacrepType::Ais).unwrap(), 100);
        assert_eq!(alloc.lowest_available(TacrepType::Golf).unwrap(), 100);
    }

    #[test]
    fn test_lowest_available_matches_definition() {
        // Exhaustive over small active sets: the result is the minimum of
        // {n >= base} \ used.
        let base = 3u64;
        let numbering = Numbering::new(Some(base));
        for mask in 0u32..256 {
            let codes: Vec<String> = (0..8u64)
                .filter(|i| mask & (1 << i) != 0)
                .map(|i| format!("N{}", i + 1))
                .collect();
            let refs: Vec<&str> = codes.iter().map(String::as_str).collect();
            let columns = columns_with(&refs);
            let used: BTreeSet<u64> = (0..8u64)
                .filter(|i| mask & (1 << i) != 0)
                .map(|i| i + 1)
                .collect();
            let expected = (base..).find(|n| !used.contains(n)).unwrap();

            let alloc = CodeAllocator::new(&numbering, &columns);
            assert_eq!(alloc.lowest_available(TacrepType::November).unwrap(), expected);

            let highest = alloc.next_highest(TacrepType::November).unwrap();
            assert!(!used.contains(&highest));
            assert!(highest >= base);
        }
    }

    #[test]
    fn test_next_highest_floors_at_base() {
        let numbering = Numbering::new(Some(100));
        let columns = columns_with(&["G5", "G6"]);
        let alloc = CodeAllocator::new(&numbering, &columns);
        assert_eq!(alloc.next_highest(TacrepType::Golf).unwrap(), 100);

        let columns = columns_with(&["G100", "G104"]);
        let alloc = CodeAllocator::new(&numbering, &columns);
        assert_eq!(alloc.next_highest(TacrepType::Golf).unwrap(), 105);
        assert_eq!(alloc.lowest_available(TacrepType::Golf).unwrap(), 101);
    }

    #[test]
    fn test_allocation_at_u64_max_errors_instead_of_wrapping() {
        let numbering = Numbering::new(Some(100));
        let top = format!("G{}", u64::MAX);
        let columns = columns_with(&["G100", &top]);
        let alloc = CodeAllocator::new(&numbering, &columns);

        assert!(matches!(
            alloc.next_highest(TacrepType::Golf),
            Err(Error::InvalidArgument(_))
        ));
        assert_eq!(alloc.lowest_available(TacrepType::Golf).unwrap(), 101);

        let numbering = Numbering::new(Some(u64::MAX));
        let alloc = CodeAllocator::new(&numbering, &columns);
        assert!(matches!(
            alloc.lowest_available(TacrepType::Golf),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_column_start_overrides_block_start() {
        let mut numbering = Numbering::new(Some(100));
        numbering.column_start.insert(TacrepType::Echo, 500);
        let columns = Columns::default();
        let alloc = CodeAllocator::new(&numbering, &columns);

        assert_eq!(alloc.lowest_available(TacrepType::Echo).unwrap(), 500);
        assert_eq!(alloc.lowest_available(TacrepType::India).unwrap(), 100);
        assert_eq!(format_code(TacrepType::Ais, 7), "AIS7");
    }
}
