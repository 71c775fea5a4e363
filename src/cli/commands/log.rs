//! Mission log commands: equipment faults and timeline events.

use colored::Colorize;

use super::{now_hhmm, to_json};
use crate::cli::{FaultCommands, TimelineCommands};
use crate::error::{Error, Result};
use crate::model::TimelineEvent;
use crate::sync::{BoardBackend, SyncEngine};
use crate::validate::validate_time;

fn resolve_time(time: Option<&str>) -> Result<String> {
    let time = time.map_or_else(now_hhmm, |t| t.trim().to_string());
    validate_time(&time)?;
    Ok(time)
}

/// Execute a fault command.
///
/// # Errors
///
/// Returns `InvalidField` for a bad time.
pub fn fault<B: BoardBackend>(
    command: &FaultCommands,
    engine: &mut SyncEngine<B>,
    json: bool,
) -> Result<String> {
    match command {
        FaultCommands::Add {
            code,
            time,
            comments,
        } => {
            let time = resolve_time(time.as_deref())?;
            let fault = engine.add_fault(&time, code.trim(), comments.trim());
            if crate::is_silent() {
                return Ok(fault.fault_code);
            }
            if json {
                return to_json(&fault);
            }
            Ok(format!("Logged fault {} at {time}Z", fault.fault_code.bold()))
        }
        FaultCommands::List => {
            let faults = &engine.board().mission().faults;
            if json {
                return to_json(faults);
            }
            if faults.is_empty() {
                return Ok("No faults logged.".to_string());
            }
            Ok(faults
                .iter()
                .map(|f| {
                    format!(
                        "{}Z  {:<12} {} {}",
                        f.time_hhmm,
                        f.fault_code.bold(),
                        f.comments,
                        format!("({})", f.created_by).dimmed()
                    )
                })
                .collect::<Vec<_>>()
                .join("\n"))
        }
    }
}

/// Execute a timeline command.
///
/// # Errors
///
/// Returns `InvalidArgument` for an unknown event or `InvalidField` for a
/// bad time.
pub fn timeline<B: BoardBackend>(
    command: &TimelineCommands,
    engine: &mut SyncEngine<B>,
    json: bool,
) -> Result<String> {
    match command {
        TimelineCommands::Add { event, time } => {
            let event: TimelineEvent = event.parse().map_err(Error::InvalidArgument)?;
            let time = resolve_time(time.as_deref())?;
            let entry = engine.add_timeline(&time, event);
            if crate::is_silent() {
                return Ok(event.as_str().to_string());
            }
            if json {
                return to_json(&entry);
            }
            Ok(format!("Logged {} at {time}Z", event.as_str().bold()))
        }
        TimelineCommands::List => {
            let timeline = &engine.board().mission().timeline;
            if json {
                return to_json(timeline);
            }
            if timeline.is_empty() {
                return Ok("No timeline events.".to_string());
            }
            Ok(timeline
                .iter()
                .map(|e| {
                    format!(
                        "{}Z  {:<8} {}",
                        e.time_hhmm,
                        e.event.as_str().bold(),
                        format!("({})", e.created_by).dimmed()
                    )
                })
                .collect::<Vec<_>>()
                .join("\n"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::{FileBackend, SyncSettings};
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_fault_and_timeline_entries() {
        let dir = TempDir::new().unwrap();
        let backend = FileBackend::new(dir.path().join("board.json"));
        let mut engine = SyncEngine::open(backend, SyncSettings::default(), "MC")
            .await
            .unwrap();

        let add = FaultCommands::Add {
            code: "RADAR-02".into(),
            time: Some("1415".into()),
            comments: "intermittent".into(),
        };
        fault(&add, &mut engine, true).unwrap();
        let add = TimelineCommands::Add {
            event: "on-sta".into(),
            time: Some("0800".into()),
        };
        timeline(&add, &mut engine, true).unwrap();

        let mission = engine.board().mission();
        assert_eq!(mission.faults[0].fault_code, "RADAR-02");
        assert_eq!(mission.faults[0].created_by, "MC");
        assert_eq!(mission.timeline[0].event, TimelineEvent::Onsta);
        assert!(mission.crew_roster.contains(&"MC".to_string()));
    }

    #[tokio::test]
    async fn test_rejects_bad_time_and_event() {
        let dir = TempDir::new().unwrap();
        let backend = FileBackend::new(dir.path().join("board.json"));
        let mut engine = SyncEngine::open(backend, SyncSettings::default(), "MC")
            .await
            .unwrap();

        let bad_time = FaultCommands::Add {
            code: "X".into(),
            time: Some("2575".into()),
            comments: String::new(),
        };
        assert!(fault(&bad_time, &mut engine, true).is_err());

        let bad_event = TimelineCommands::Add {
            event: "landed".into(),
            time: None,
        };
        assert!(matches!(
            timeline(&bad_event, &mut engine, true),
            Err(Error::InvalidArgument(_))
        ));
        assert!(engine.board().mission().faults.is_empty());
    }
}
