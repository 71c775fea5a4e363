//! Error types for Tacboard.
//!
//! Provides structured error handling with:
//! - Machine-readable error codes (`ErrorCode`)
//! - Category-based exit codes (2=not configured, 3=not found, 4=validation, etc.)
//! - Retryability flags for scripted callers
//! - Context-aware recovery hints
//! - Structured JSON output for piped / non-TTY consumers

use std::path::PathBuf;
use thiserror::Error;

use crate::sync::SyncError;

/// Result type alias for Tacboard operations.
pub type Result<T> = std::result::Result<T, Error>;

// ── Error Code ────────────────────────────────────────────────

/// Machine-readable error codes grouped by category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Mission setup (exit 2)
    NotConfigured,
    BoardNotFound,
    AlreadyInitialized,

    // Not Found (exit 3)
    RecordNotFound,
    GroupNotFound,

    // Validation (exit 4)
    InvalidArgument,
    InvalidType,
    InvalidField,

    // Collision (exit 5)
    CodeCollision,

    // Sync (exit 6)
    CorruptDocument,
    PersistenceFailure,

    // Config (exit 7)
    ConfigError,

    // I/O (exit 8)
    IoError,
    JsonError,

    // Internal (exit 1)
    InternalError,
}

impl ErrorCode {
    /// Machine-readable SCREAMING_SNAKE code string.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        match self {
            Self::NotConfigured => "NOT_CONFIGURED",
            Self::BoardNotFound => "BOARD_NOT_FOUND",
            Self::AlreadyInitialized => "ALREADY_INITIALIZED",
            Self::RecordNotFound => "RECORD_NOT_FOUND",
            Self::GroupNotFound => "GROUP_NOT_FOUND",
            Self::InvalidArgument => "INVALID_ARGUMENT",
            Self::InvalidType => "INVALID_TYPE",
            Self::InvalidField => "INVALID_FIELD",
            Self::CodeCollision => "CODE_COLLISION",
            Self::CorruptDocument => "CORRUPT_DOCUMENT",
            Self::PersistenceFailure => "PERSISTENCE_FAILURE",
            Self::ConfigError => "CONFIG_ERROR",
            Self::IoError => "IO_ERROR",
            Self::JsonError => "JSON_ERROR",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }

    /// Category-based exit code (1-8).
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::InternalError => 1,
            Self::NotConfigured | Self::BoardNotFound | Self::AlreadyInitialized => 2,
            Self::RecordNotFound | Self::GroupNotFound => 3,
            Self::InvalidArgument | Self::InvalidType | Self::InvalidField => 4,
            Self::CodeCollision => 5,
            Self::CorruptDocument | Self::PersistenceFailure => 6,
            Self::ConfigError => 7,
            Self::IoError | Self::JsonError => 8,
        }
    }

    /// Whether a caller should retry (with corrected input or after a pause).
    ///
    /// Persistence failures are retried by the next debounced save; a
    /// collision is retried with explicit reactivation.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::InvalidArgument
                | Self::InvalidType
                | Self::InvalidField
                | Self::CodeCollision
                | Self::PersistenceFailure
        )
    }
}

// ── Error Enum ────────────────────────────────────────────────

/// Errors that can occur in Tacboard operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Mission not configured: block start number is not set")]
    NotConfigured,

    #[error("Board document not found at {path}")]
    BoardNotFound { path: PathBuf },

    #[error("Board already initialized at {path}")]
    AlreadyInitialized { path: PathBuf },

    #[error("TACREP not found: {code}")]
    RecordNotFound { code: String },

    #[error("TACREP not found: {code} (did you mean: {}?)", similar.join(", "))]
    RecordNotFoundSimilar { code: String, similar: Vec<String> },

    #[error("Deleted TACREP not found: {code}")]
    DeletedNotFound { code: String },

    #[error("Correlation not found: #{index}")]
    GroupNotFound { index: usize },

    #[error("TACREP {code} exists in Deleted; reactivation requires confirmation")]
    CodeCollision { code: String },

    #[error("Invalid TACREP type: {0}")]
    InvalidType(String),

    #[error("Invalid {field}: {message}")]
    InvalidField { field: String, message: String },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Corrupt board document: {0}")]
    CorruptDocument(String),

    #[error("Failed to save board: {0}")]
    PersistenceFailure(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Map this error to its structured `ErrorCode`.
    #[must_use]
    pub const fn error_code(&self) -> ErrorCode {
        match self {
            Self::NotConfigured => ErrorCode::NotConfigured,
            Self::BoardNotFound { .. } => ErrorCode::BoardNotFound,
            Self::AlreadyInitialized { .. } => ErrorCode::AlreadyInitialized,
            Self::RecordNotFound { .. }
            | Self::RecordNotFoundSimilar { .. }
            | Self::DeletedNotFound { .. } => ErrorCode::RecordNotFound,
            Self::GroupNotFound { .. } => ErrorCode::GroupNotFound,
            Self::CodeCollision { .. } => ErrorCode::CodeCollision,
            Self::InvalidType(_) => ErrorCode::InvalidType,
            Self::InvalidField { .. } => ErrorCode::InvalidField,
            Self::InvalidArgument(_) => ErrorCode::InvalidArgument,
            Self::CorruptDocument(_) => ErrorCode::CorruptDocument,
            Self::PersistenceFailure(_) => ErrorCode::PersistenceFailure,
            Self::Config(_) => ErrorCode::ConfigError,
            Self::Io(_) => ErrorCode::IoError,
            Self::Json(_) => ErrorCode::JsonError,
            Self::Other(_) => ErrorCode::InternalError,
        }
    }

    /// Category-based exit code, delegating to the `ErrorCode`.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        self.error_code().exit_code()
    }

    /// Context-aware recovery hint.
    ///
    /// Returns `None` if no actionable suggestion exists.
    #[must_use]
    pub fn hint(&self) -> Option<String> {
        match self {
            Self::NotConfigured => Some(
                "Set the mission block start first: tacboard block <number>".to_string(),
            ),

            Self::BoardNotFound { path } => Some(format!(
                "No board at {}. Create one with `tacboard init --block-start <n>`.",
                path.display()
            )),

            Self::AlreadyInitialized { path } => Some(format!(
                "A board already exists at {}. Use `--force` to overwrite it.",
                path.display()
            )),

            Self::RecordNotFound { code } => Some(format!(
                "No active TACREP '{code}'. Use `tacboard list` to see active codes."
            )),
            Self::RecordNotFoundSimilar { similar, .. } => {
                Some(format!("Did you mean: {}?", similar.join(", ")))
            }

            Self::DeletedNotFound { code } => Some(format!(
                "Restore takes the original code of a deleted TACREP. \
                 Use `tacboard list --deleted` to find '{code}'."
            )),

            Self::GroupNotFound { .. } => {
                Some("Use `tacboard correlate list` to see correlation numbers.".to_string())
            }

            Self::CodeCollision { code } => Some(format!(
                "Re-run with `--reactivate` to reuse {code} for the new TACREP."
            )),

            Self::InvalidType(_) => Some(
                "Valid types: India, Echo, AIS, Alpha, November, Golf, Other. \
                 Synonyms: i, e, a, n, g, o"
                    .to_string(),
            ),

            Self::InvalidField { field, .. } => match field.as_str() {
                "time" => Some("Time must be HHMM Zulu, e.g. 0930".to_string()),
                "lat" | "lon" => Some(
                    "Position format: DD:MM:SS.ssH, e.g. 19:32:25.15N or 128:23:17.68E"
                        .to_string(),
                ),
                "course" => Some("Course must be a whole number 0-359".to_string()),
                _ => None,
            },

            Self::PersistenceFailure(_) => Some(
                "The save will be retried on the next change; run `tacboard status` to check."
                    .to_string(),
            ),

            Self::CorruptDocument(_) => Some(
                "The board file could not be parsed; local state was left untouched.".to_string(),
            ),

            Self::InvalidArgument(_)
            | Self::Io(_)
            | Self::Json(_)
            | Self::Config(_)
            | Self::Other(_) => None,
        }
    }

    /// Structured JSON representation for machine consumption.
    ///
    /// Includes error code, message, retryability, exit code, and
    /// optional recovery hint.
    #[must_use]
    pub fn to_structured_json(&self) -> serde_json::Value {
        let code = self.error_code();
        let mut obj = serde_json::json!({
            "error": {
                "code": code.as_str(),
                "message": self.to_string(),
                "retryable": code.is_retryable(),
                "exit_code": code.exit_code(),
            }
        });

        if let Some(hint) = self.hint() {
            obj["error"]["hint"] = serde_json::Value::String(hint);
        }

        obj
    }
}

impl From<SyncError> for Error {
    fn from(err: SyncError) -> Self {
        match err {
            SyncError::Corrupt(message) => Self::CorruptDocument(message),
            SyncError::WriteFailed(message) => Self::PersistenceFailure(message),
            SyncError::Io(e) => Self::Io(e),
            SyncError::Json(e) => Self::Json(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes_by_category() {
        assert_eq!(Error::NotConfigured.exit_code(), 2);
        assert_eq!(Error::RecordNotFound { code: "I1".into() }.exit_code(), 3);
        assert_eq!(Error::InvalidType("x".into()).exit_code(), 4);
        assert_eq!(Error::CodeCollision { code: "I1".into() }.exit_code(), 5);
        assert_eq!(Error::CorruptDocument("bad".into()).exit_code(), 6);
    }

    #[test]
    fn test_structured_json_includes_hint() {
        let err = Error::CodeCollision {
            code: "I100".to_string(),
        };
        let json = err.to_structured_json();
        assert_eq!(json["error"]["code"], "CODE_COLLISION");
        assert_eq!(json["error"]["retryable"], true);
        assert!(
            json["error"]["hint"]
                .as_str()
                .unwrap()
                .contains("--reactivate")
        );
    }

    #[test]
    fn test_sync_error_conversion() {
        let err: Error = SyncError::Corrupt("line 1".into()).into();
        assert!(matches!(err, Error::CorruptDocument(_)));

        let err: Error = SyncError::WriteFailed("disk full".into()).into();
        assert_eq!(err.error_code(), ErrorCode::PersistenceFailure);
    }
}
