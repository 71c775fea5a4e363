//! TACREP record commands: add, edit, delete, restore, list, show.

use colored::Colorize;
use serde::Serialize;

use super::to_json;
use crate::cli::{AddArgs, EditArgs};
use crate::error::{Error, Result};
use crate::model::format::{position_display, report_text};
use crate::model::{ChangeKind, HistoryEntry, Record, TacrepFields, TacrepType};
use crate::sync::{BoardBackend, SyncEngine};
use crate::validate::{normalize_change_kind, normalize_type, validate_required, FieldInput};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AddOutput<'a> {
    code: &'a str,
    #[serde(rename = "type")]
    kind: TacrepType,
    /// Deleted entry that held the code before reactivation.
    #[serde(skip_serializing_if = "Option::is_none")]
    reactivated: Option<&'a Record>,
    record: &'a Record,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EditOutput<'a> {
    code: &'a str,
    change: ChangeKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    history: Option<&'a HistoryEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    preview: Option<&'a str>,
    record: &'a Record,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DeleteOutput<'a> {
    code: &'a str,
    sentinel: &'a str,
    groups_trimmed: usize,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RestoreOutput<'a> {
    original_code: &'a str,
    code: &'a str,
    record: &'a Record,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ShowOutput<'a> {
    record: &'a Record,
    report: String,
    /// 1-based correlation group numbers.
    groups: Vec<usize>,
    history: Vec<&'a HistoryEntry>,
}

/// Create a TACREP.
///
/// # Errors
///
/// Returns `InvalidType`/`InvalidField` for bad input, `NotConfigured`
/// before the block start is set, or `CodeCollision` when the next code is
/// held by a deleted TACREP and `--reactivate` was not given.
pub fn add<B: BoardBackend>(
    args: &AddArgs,
    engine: &mut SyncEngine<B>,
    json: bool,
) -> Result<String> {
    let kind = normalize_type(&args.kind)?;
    let fields = FieldInput::from(&args.fields).apply(TacrepFields::empty(kind))?;
    validate_required(&fields)?;

    let created = engine.create_record(fields, args.reported, args.reactivate)?;
    let code = &created.record.code;

    if crate::is_silent() {
        return Ok(code.clone());
    }
    if json {
        return to_json(&AddOutput {
            code,
            kind,
            reactivated: created.reactivated.as_ref(),
            record: &created.record,
        });
    }

    let mut out = format!("Created {} [{kind}]", code.bold());
    if created.reactivated.is_some() {
        out.push_str(&format!("\n  Reactivated {code}; the deleted entry was discarded"));
    }
    Ok(out)
}

/// Edit, correct, or update a TACREP.
///
/// With no field values and a plain edit, only the reported flag changes.
///
/// # Errors
///
/// Returns `RecordNotFound` for an unknown code, `InvalidField` for bad
/// input, or `InvalidArgument` when nothing would change.
pub fn edit<B: BoardBackend>(
    args: &EditArgs,
    engine: &mut SyncEngine<B>,
    json: bool,
) -> Result<String> {
    let change = normalize_change_kind(&args.kind)?;
    let input = FieldInput::from(&args.fields);
    let records = engine.board().records();
    let current = records
        .get(&args.code)
        .cloned()
        .ok_or_else(|| records.not_found(&args.code))?;

    if input.is_empty() && change == ChangeKind::Edit {
        let Some(reported) = args.reported_flag() else {
            return Err(Error::InvalidArgument(
                "Nothing to change: pass a field or --reported/--unreported".to_string(),
            ));
        };
        let record = engine.set_reported(&current.code, reported)?;
        if crate::is_silent() {
            return Ok(record.code);
        }
        if json {
            return to_json(&EditOutput {
                code: &record.code,
                change,
                history: None,
                preview: None,
                record: &record,
            });
        }
        let state = if reported { "REPORTED" } else { "UNREPORTED" };
        return Ok(format!("{} marked {state}", record.code.bold()));
    }

    let fields = input.apply(current.fields.clone())?;
    validate_required(&fields)?;
    let outcome = engine.edit_record(&current.code, fields, args.reported_flag(), change)?;

    if crate::is_silent() {
        return Ok(outcome.record.code);
    }
    if json {
        return to_json(&EditOutput {
            code: &outcome.record.code,
            change,
            history: outcome.history.as_ref(),
            preview: outcome.preview.as_deref(),
            record: &outcome.record,
        });
    }

    let verb = match change {
        ChangeKind::Edit => "Edited",
        ChangeKind::Correct => "Corrected",
        ChangeKind::Update => "Updated",
    };
    let mut out = format!("{verb} {}", outcome.record.code.bold());
    if let Some(entry) = &outcome.history {
        out.push_str(&format!("\n  {}", entry.line.dimmed()));
    }
    if let Some(preview) = &outcome.preview {
        out.push_str(&format!("\n\n{preview}"));
    }
    Ok(out)
}

/// Delete a TACREP.
///
/// # Errors
///
/// Returns `RecordNotFound` for an unknown code.
pub fn delete<B: BoardBackend>(
    code: &str,
    engine: &mut SyncEngine<B>,
    json: bool,
) -> Result<String> {
    let outcome = engine.delete_record(code)?;
    let original = outcome.record.effective_code();

    if crate::is_silent() {
        return Ok(original.to_string());
    }
    if json {
        return to_json(&DeleteOutput {
            code: original,
            sentinel: &outcome.record.code,
            groups_trimmed: outcome.groups_trimmed,
        });
    }

    let mut out = format!("Deleted {} (now {})", original.bold(), outcome.record.code);
    if outcome.groups_trimmed > 0 {
        out.push_str(&format!(
            "\n  Removed from {} correlation group(s)",
            outcome.groups_trimmed
        ));
    }
    Ok(out)
}

/// Restore a deleted TACREP under a fresh code.
///
/// # Errors
///
/// Returns `DeletedNotFound` if nothing was deleted under that code.
pub fn restore<B: BoardBackend>(
    original_code: &str,
    engine: &mut SyncEngine<B>,
    json: bool,
) -> Result<String> {
    let record = engine.restore_record(original_code)?;

    if crate::is_silent() {
        return Ok(record.code);
    }
    if json {
        return to_json(&RestoreOutput {
            original_code: original_code.trim(),
            code: &record.code,
            record: &record,
        });
    }
    Ok(format!(
        "Restored {} as {} [{}]",
        original_code.trim().to_uppercase(),
        record.code.bold(),
        record.kind()
    ))
}

fn summary(record: &Record) -> String {
    let (time, position, what) = match &record.fields {
        TacrepFields::Echo(e) => (&e.time_hhmm, &e.position, &e.emitter_name),
        TacrepFields::India(c)
        | TacrepFields::Ais(c)
        | TacrepFields::Alpha(c)
        | TacrepFields::November(c)
        | TacrepFields::Golf(c)
        | TacrepFields::Other(c) => (&c.time_hhmm, &c.position, &c.vessel_type),
    };
    [
        time.as_ref().map(|t| format!("{t}Z")),
        Some(position_display(position)).filter(|p| !p.is_empty()),
        what.clone(),
    ]
    .into_iter()
    .flatten()
    .collect::<Vec<_>>()
    .join("  ")
}

/// List active TACREPs by column, or the deleted bucket.
///
/// # Errors
///
/// Returns `InvalidType` for an unknown type filter.
pub fn list<B: BoardBackend>(
    kind: Option<&str>,
    deleted: bool,
    engine: &SyncEngine<B>,
    json: bool,
) -> Result<String> {
    let kind = kind.map(normalize_type).transpose()?;
    let board = engine.board();
    let records = board.records();
    let keep = |r: &&Record| kind.is_none_or(|k| r.kind() == k);

    if deleted {
        let bucket: Vec<&Record> = records.deleted().iter().filter(keep).collect();
        if crate::is_silent() {
            return Ok(bucket
                .iter()
                .map(|r| r.effective_code())
                .collect::<Vec<_>>()
                .join("\n"));
        }
        if json {
            return to_json(&bucket);
        }
        if bucket.is_empty() {
            return Ok("No deleted TACREPs.".to_string());
        }
        let mut lines = vec![format!("{} ({})", "Deleted".cyan().bold(), bucket.len())];
        for r in bucket {
            lines.push(format!(
                "  {:<8} {}  {}",
                r.effective_code(),
                format!("[{}]", r.kind()).dimmed(),
                summary(r)
            ));
        }
        return Ok(lines.join("\n"));
    }

    let active: Vec<&Record> = records.columns().iter().filter(keep).collect();
    if crate::is_silent() {
        return Ok(active
            .iter()
            .map(|r| r.code.as_str())
            .collect::<Vec<_>>()
            .join("\n"));
    }
    if json {
        return to_json(&active);
    }

    let mut lines = Vec::new();
    for (column, column_records) in records.columns().columns() {
        if kind.is_some_and(|k| k != column) || (kind.is_none() && column_records.is_empty()) {
            continue;
        }
        lines.push(format!("{} ({})", column.as_str().cyan().bold(), column_records.len()));
        for r in column_records {
            let groups: Vec<String> = board
                .correlations()
                .groups_for(&r.code)
                .into_iter()
                .map(|(i, _)| format!("#{}", i + 1))
                .collect();
            let reported = if r.reported {
                "REPORTED".green().to_string()
            } else {
                String::new()
            };
            lines.push(format!(
                "  {:<8} {}  {} {}",
                r.code.bold(),
                summary(r),
                groups.join(",").yellow(),
                reported
            ).trim_end().to_string());
        }
    }
    if lines.is_empty() {
        return Ok("No TACREPs.".to_string());
    }
    Ok(lines.join("\n"))
}

/// Show one TACREP as report text with its correlations and history.
///
/// # Errors
///
/// Returns `RecordNotFound` for an unknown code.
pub fn show<B: BoardBackend>(code: &str, engine: &SyncEngine<B>, json: bool) -> Result<String> {
    let board = engine.board();
    let record = board
        .records()
        .get(code)
        .ok_or_else(|| board.records().not_found(code))?;
    let report = report_text(record, &board.mission().callsign);
    let groups = board.correlations().groups_for(&record.code);
    let history = board.query_history(&record.code);

    if json {
        return to_json(&ShowOutput {
            record,
            report,
            groups: groups.iter().map(|(i, _)| i + 1).collect(),
            history,
        });
    }

    let mut lines = vec![format!(
        "{} {}",
        record.code.bold(),
        format!("[{}]", record.kind()).dimmed()
    )];
    lines.push(report);
    for (i, group) in &groups {
        let others: Vec<&str> = group
            .codes
            .iter()
            .map(String::as_str)
            .filter(|c| !c.eq_ignore_ascii_case(&record.code))
            .collect();
        lines.push(format!("{} #{}: {}", "Correlated".yellow(), i + 1, others.join(", ")));
    }
    for entry in history {
        lines.push(entry.line.dimmed().to_string());
    }
    Ok(lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::FieldArgs;
    use crate::sync::{FileBackend, SyncSettings};
    use tempfile::TempDir;

    async fn engine(dir: &TempDir) -> SyncEngine<FileBackend> {
        let backend = FileBackend::new(dir.path().join("board.json"));
        let mut engine = SyncEngine::open(backend, SyncSettings::default(), "TC")
            .await
            .unwrap();
        engine.set_block_start(100).unwrap();
        engine
    }

    fn add_args(kind: &str) -> AddArgs {
        AddArgs {
            kind: kind.to_string(),
            fields: FieldArgs::default(),
            reported: false,
            reactivate: false,
        }
    }

    fn edit_args(code: &str, kind: &str) -> EditArgs {
        EditArgs {
            code: code.to_string(),
            fields: FieldArgs {
                course: Some("180".to_string()),
                ..FieldArgs::default()
            },
            kind: kind.to_string(),
            reported: false,
            unreported: false,
        }
    }

    #[tokio::test]
    async fn test_add_uses_synonyms_and_json_output() {
        let dir = TempDir::new().unwrap();
        let mut engine = engine(&dir).await;

        let out = add(&add_args("g"), &mut engine, true).unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["code"], "G100");
        assert_eq!(value["type"], "Golf");

        let err = add(&add_args("india"), &mut engine, true).unwrap_err();
        assert!(matches!(err, Error::InvalidField { .. }));
    }

    #[tokio::test]
    async fn test_correct_returns_preview_and_history() {
        let dir = TempDir::new().unwrap();
        let mut engine = engine(&dir).await;
        add(&add_args("golf"), &mut engine, true).unwrap();

        let out = edit(&edit_args("g100", "corr"), &mut engine, true).unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["change"], "correct");
        assert!(value["preview"]
            .as_str()
            .unwrap()
            .starts_with("Correction to TACREP G100"));
        assert_eq!(value["history"]["code"], "G100");
        assert_eq!(engine.query_history("G100").len(), 1);
    }

    #[tokio::test]
    async fn test_plain_edit_without_fields_needs_reported_flag() {
        let dir = TempDir::new().unwrap();
        let mut engine = engine(&dir).await;
        add(&add_args("golf"), &mut engine, true).unwrap();

        let mut args = edit_args("G100", "edit");
        args.fields = FieldArgs::default();
        assert!(matches!(
            edit(&args, &mut engine, true),
            Err(Error::InvalidArgument(_))
        ));

        args.reported = true;
        edit(&args, &mut engine, true).unwrap();
        assert!(engine.board().records().get("G100").unwrap().reported);
        assert!(engine.query_history("G100").is_empty());
    }

    #[tokio::test]
    async fn test_delete_restore_and_list_deleted() {
        let dir = TempDir::new().unwrap();
        let mut engine = engine(&dir).await;
        add(&add_args("golf"), &mut engine, true).unwrap();

        delete("G100", &mut engine, true).unwrap();
        let out = list(None, true, &engine, true).unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value[0]["code"], "GXXX");
        assert_eq!(value[0]["originalCode"], "G100");

        let out = restore("g100", &mut engine, true).unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["code"], "G100");
        assert!(engine.board().records().deleted().is_empty());
    }
}
