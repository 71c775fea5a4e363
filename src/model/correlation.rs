//! Correlation group model.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A set of two or more TACREP codes considered related.
///
/// Membership is direct only: two codes are correlated when they share a
/// group, never through a chain of groups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CorrelationGroup {
    pub codes: BTreeSet<String>,

    #[serde(default)]
    pub created_by: String,

    /// Creation timestamp (Unix milliseconds)
    #[serde(default)]
    pub created_at: i64,

    #[serde(default)]
    pub last_by: String,

    /// Last membership change (Unix milliseconds)
    #[serde(default)]
    pub last_at: i64,
}

impl CorrelationGroup {
    /// Create a group stamped with the creating actor.
    pub fn new(codes: BTreeSet<String>, actor: &str) -> Self {
        let now = chrono::Utc::now().timestamp_millis();
        Self {
            codes,
            created_by: actor.to_string(),
            created_at: now,
            last_by: actor.to_string(),
            last_at: now,
        }
    }

    /// Record a membership change by `actor`.
    pub fn touch(&mut self, actor: &str) {
        self.last_by = actor.to_string();
        self.last_at = chrono::Utc::now().timestamp_millis();
    }

    /// The stored spelling of `code`, matched case-insensitively.
    #[must_use]
    pub fn member(&self, code: &str) -> Option<&String> {
        let code = code.trim();
        self.codes.iter().find(|c| c.eq_ignore_ascii_case(code))
    }

    #[must_use]
    pub fn contains(&self, code: &str) -> bool {
        self.member(code).is_some()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.codes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_serializes_codes_as_sorted_array() {
        let codes: BTreeSet<String> = ["I101", "E5", "AIS3"].iter().map(ToString::to_string).collect();
        let group = CorrelationGroup::new(codes, "TC");
        let json = serde_json::to_value(&group).unwrap();

        assert_eq!(json["codes"], serde_json::json!(["AIS3", "E5", "I101"]));
        assert_eq!(json["createdBy"], "TC");
        assert_eq!(json["lastBy"], "TC");
    }

    #[test]
    fn test_legacy_group_without_last_fields() {
        let group: CorrelationGroup =
            serde_json::from_str(r#"{"codes":["I1","E2"],"createdBy":"MC","createdAt":5}"#).unwrap();
        assert_eq!(group.len(), 2);
        assert_eq!(group.last_by, "");
    }
}
