//! Change history command.

use colored::Colorize;

use super::to_json;
use crate::error::Result;
use crate::model::format::report_fields;
use crate::model::{HistoryEntry, Record};
use crate::sync::{BoardBackend, SyncEngine};

/// Show history entries, newest first, optionally for one code.
///
/// # Errors
///
/// Returns an error only if JSON serialization fails.
pub fn apply<B: BoardBackend>(
    code: Option<&str>,
    limit: usize,
    engine: &SyncEngine<B>,
    json: bool,
) -> Result<String> {
    let entries: Vec<&HistoryEntry> = match code {
        Some(code) => engine.query_history(code),
        None => engine.board().history().entries().iter().collect(),
    };
    let entries: Vec<&HistoryEntry> = entries.into_iter().take(limit).collect();

    if json {
        return to_json(&entries);
    }
    if entries.is_empty() {
        return Ok("No history.".to_string());
    }

    let callsign = &engine.board().mission().callsign;
    let mut lines = Vec::new();
    for entry in entries {
        lines.push(entry.line.clone());
        // For a single code, show what each change replaced.
        if code.is_some() {
            if let Some(snapshot) = &entry.snapshot {
                let before = Record::new(entry.code.clone(), snapshot.clone(), &entry.by);
                for (label, value) in report_fields(&before, callsign) {
                    if label != "Callsign" && label != "Reported" {
                        lines.push(format!("    {}", format!("{label}: {value}").dimmed()));
                    }
                }
            }
        }
    }
    Ok(lines.join("\n"))
}
