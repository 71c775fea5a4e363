//! Correlation group commands.
//!
//! Groups are numbered from 1 on the command line, in board order.

use colored::Colorize;
use serde::Serialize;

use super::{group_index, to_json};
use crate::board::Removal;
use crate::cli::CorrelateCommands;
use crate::error::Result;
use crate::model::CorrelationGroup;
use crate::sync::{BoardBackend, SyncEngine};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GroupOutput<'a> {
    group: usize,
    #[serde(flatten)]
    detail: &'a CorrelationGroup,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ChangeOutput<'a> {
    group: usize,
    action: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<&'a str>,
    dissolved: bool,
}

/// Execute a correlation command.
///
/// # Errors
///
/// Returns `NotConfigured`, `RecordNotFound`, `GroupNotFound`, or
/// `InvalidArgument` as raised by the correlation index.
pub fn apply<B: BoardBackend>(
    command: &CorrelateCommands,
    engine: &mut SyncEngine<B>,
    json: bool,
) -> Result<String> {
    match command {
        CorrelateCommands::New { codes } => {
            let index = engine.create_correlation(codes)?;
            let group = index + 1;
            if crate::is_silent() {
                return Ok(group.to_string());
            }
            if json {
                return to_json(&GroupOutput {
                    group,
                    detail: engine.board().correlations().get(index)?,
                });
            }
            let members = engine.board().correlations().get(index)?;
            Ok(format!(
                "Correlation #{group}: {}",
                join(members).bold()
            ))
        }
        CorrelateCommands::Add { group, code } => {
            engine.add_to_correlation(group_index(*group)?, code)?;
            changed(*group, "add", Some(code), false, json)
        }
        CorrelateCommands::Remove { group, code } => {
            let removal = engine.remove_from_correlation(group_index(*group)?, code)?;
            changed(*group, "remove", Some(code), removal == Removal::Dissolved, json)
        }
        CorrelateCommands::Drop { group } => {
            engine.drop_correlation(group_index(*group)?)?;
            changed(*group, "drop", None, true, json)
        }
        CorrelateCommands::List { code } => list(code.as_deref(), engine, json),
    }
}

fn join(group: &CorrelationGroup) -> String {
    group
        .codes
        .iter()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

fn changed(group: usize, action: &str, code: Option<&str>, dissolved: bool, json: bool) -> Result<String> {
    if crate::is_silent() {
        return Ok(group.to_string());
    }
    if json {
        return to_json(&ChangeOutput {
            group,
            action,
            code,
            dissolved,
        });
    }
    let message = match (action, code) {
        ("add", Some(code)) => format!("Added {code} to correlation #{group}"),
        ("remove", Some(code)) => format!("Removed {code} from correlation #{group}"),
        _ => format!("Dropped correlation #{group}"),
    };
    if dissolved && action == "remove" {
        return Ok(format!(
            "{message}\n  Correlation #{group} dissolved; group numbers after it shift down"
        ));
    }
    Ok(message)
}

fn list<B: BoardBackend>(code: Option<&str>, engine: &SyncEngine<B>, json: bool) -> Result<String> {
    let index = engine.board().correlations();
    let groups: Vec<(usize, &CorrelationGroup)> = match code {
        Some(code) => index.groups_for(code),
        None => index.groups().iter().enumerate().collect(),
    };

    if json {
        let output: Vec<GroupOutput> = groups
            .iter()
            .map(|(i, g)| GroupOutput {
                group: i + 1,
                detail: g,
            })
            .collect();
        return to_json(&output);
    }
    if groups.is_empty() {
        return Ok("No correlations.".to_string());
    }

    Ok(groups
        .iter()
        .map(|(i, g)| {
            format!(
                "#{:<3} {}  {}",
                i + 1,
                join(g).bold(),
                format!("(by {})", g.last_by).dimmed()
            )
        })
        .collect::<Vec<_>>()
        .join("\n"))
}
