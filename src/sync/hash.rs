//! Content hashing for change detection.
//!
//! SHA256 over the compact JSON serialization of a value. Two board states
//! with the same hash hold the same document content.

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::sync::types::SyncResult;

/// Hex SHA256 of raw bytes.
#[must_use]
pub fn digest(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// Hex SHA256 of a value's JSON serialization.
///
/// # Errors
///
/// Returns an error if the value cannot be serialized.
pub fn content_hash<T: Serialize>(value: &T) -> SyncResult<String> {
    let json = serde_json::to_string(value)?;
    Ok(digest(json.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::BoardState;

    #[test]
    fn test_content_hash_deterministic() {
        let state = BoardState::initial("TC", Some(100), "M-1", "RAVEN");
        let a = content_hash(&state).unwrap();
        let b = content_hash(&state.clone()).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn test_content_hash_changes_with_content() {
        let mut state = BoardState::initial("TC", Some(100), "M-1", "RAVEN");
        let before = content_hash(&state).unwrap();
        state.callsign = "HAWK".into();
        assert_ne!(before, content_hash(&state).unwrap());
    }
}
