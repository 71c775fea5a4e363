//! Atomic file operations for the board document.
//!
//! Saves never leave a half-written document behind:
//! - Atomic writes: write to temp file, sync to disk, then rename
//! - Parse failures surface as `Corrupt`, never as a partial board

use chrono::{DateTime, Utc};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::model::BoardState;
use crate::sync::types::{SyncError, SyncResult};

/// Write content to a file atomically.
///
/// This function:
/// 1. Writes content to a temporary sibling file (`<name>.tmp`)
/// 2. Calls `fsync` to ensure data is on disk
/// 3. Atomically renames the temp file to the target path
///
/// If any step fails, the original file (if any) remains untouched.
///
/// # Errors
///
/// Returns an error if any file operation fails.
pub fn atomic_write(path: &Path, content: &str) -> SyncResult<()> {
    let file_name = path
        .file_name()
        .ok_or_else(|| SyncError::WriteFailed(format!("not a file path: {}", path.display())))?;
    let mut temp_name = file_name.to_os_string();
    temp_name.push(".tmp");
    let temp_path = path.with_file_name(temp_name);

    // Ensure parent directory exists
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    {
        let file = File::create(&temp_path)?;
        let mut writer = BufWriter::new(file);
        writer.write_all(content.as_bytes())?;
        writer.flush()?;
        writer.get_ref().sync_all()?;
    }

    if let Err(e) = fs::rename(&temp_path, path) {
        let _ = fs::remove_file(&temp_path);
        return Err(e.into());
    }

    Ok(())
}

/// Parse document text, mapping parse failures to `Corrupt`.
///
/// # Errors
///
/// Returns `SyncError::Corrupt` if the text is not a board document.
pub fn parse_document(text: &str) -> SyncResult<BoardState> {
    BoardState::parse(text).map_err(|e| SyncError::Corrupt(e.to_string()))
}

/// Modification time in Unix milliseconds.
#[must_use]
pub fn modified_millis(meta: &fs::Metadata) -> Option<i64> {
    let modified: DateTime<Utc> = meta.modified().ok()?.into();
    Some(modified.timestamp_millis())
}

/// Export file name: `tacboard_YYYYMMDD_HHMM.json` (UTC).
#[must_use]
pub fn export_file_name(at: DateTime<Utc>) -> String {
    format!("tacboard_{}.json", at.format("%Y%m%d_%H%M"))
}

/// Write a full-document export into `dir`, returning the file written.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn write_export(dir: &Path, content: &str, at: DateTime<Utc>) -> SyncResult<PathBuf> {
    let path = dir.join(export_file_name(at));
    atomic_write(&path, content)?;
    Ok(path)
}

/// Whether `path` can be written as a live document: an existing file that
/// is not read-only, or a missing file whose directory exists and is
/// writable.
#[must_use]
pub fn is_writable(path: &Path) -> bool {
    match fs::metadata(path) {
        Ok(meta) => meta.is_file() && !meta.permissions().readonly(),
        Err(_) => {
            let parent = match path.parent() {
                Some(p) if !p.as_os_str().is_empty() => p,
                _ => Path::new("."),
            };
            fs::metadata(parent).is_ok_and(|m| m.is_dir() && !m.permissions().readonly())
        }
    }
}
