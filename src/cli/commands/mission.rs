//! Mission setup commands: block start, mission details, crew shifts.

use colored::Colorize;
use serde::Serialize;

use super::to_json;
use crate::board::Mission;
use crate::cli::CrewArgs;
use crate::error::{Error, Result};
use crate::model::{CrewDetails, Shift, TacrepType};
use crate::sync::{BoardBackend, SyncEngine};
use crate::validate::normalize_type;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BlockOutput {
    block_start: Option<u64>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    kind: Option<TacrepType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    column_start: Option<u64>,
    /// Code the next new TACREP of each type would receive.
    next_codes: Vec<(TacrepType, String)>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MissionOutput<'a> {
    mission_number: &'a str,
    callsign: &'a str,
    block_start: Option<u64>,
    crew_roster: &'a [String],
    crew_details: &'a CrewDetails,
}

/// Set the mission block start, or set/clear a per-type floor.
///
/// # Errors
///
/// Returns `InvalidArgument` for zero or a missing number, or
/// `InvalidType` for an unknown type.
pub fn block<B: BoardBackend>(
    number: Option<u64>,
    kind: Option<&str>,
    clear: bool,
    engine: &mut SyncEngine<B>,
    json: bool,
) -> Result<String> {
    let kind = kind.map(normalize_type).transpose()?;
    match (kind, number, clear) {
        (Some(kind), _, true) => engine.set_column_start(kind, None)?,
        (Some(kind), Some(n), false) => engine.set_column_start(kind, Some(n))?,
        (None, Some(n), _) => engine.set_block_start(n)?,
        _ => {
            return Err(Error::InvalidArgument(
                "Pass a block start number".to_string(),
            ));
        }
    }

    let board = engine.board();
    let numbering = board.numbering();
    let kinds: Vec<TacrepType> = kind.map_or_else(|| TacrepType::ALL.to_vec(), |k| vec![k]);
    // Empty until a block start exists.
    let next_codes: Vec<(TacrepType, String)> = kinds
        .into_iter()
        .filter_map(|k| {
            board
                .records()
                .propose_code(k, numbering)
                .ok()
                .map(|code| (k, code))
        })
        .collect();

    if crate::is_silent() {
        return Ok(numbering.block_start.map(|n| n.to_string()).unwrap_or_default());
    }
    if json {
        return to_json(&BlockOutput {
            block_start: numbering.block_start,
            kind,
            column_start: kind.and_then(|k| numbering.column_start.get(&k).copied()),
            next_codes,
        });
    }

    let headline = match (kind, clear) {
        (Some(kind), true) => format!("Cleared {kind} numbering floor"),
        (Some(kind), false) => format!(
            "{kind} numbering starts at {}",
            number.map(|n| n.to_string()).unwrap_or_default()
        ),
        (None, _) => format!(
            "Block start set to {}",
            numbering.block_start.map(|n| n.to_string()).unwrap_or_default()
        ),
    };
    let next = next_codes
        .iter()
        .map(|(_, code)| code.as_str())
        .collect::<Vec<_>>()
        .join(" ");
    if next.is_empty() {
        return Ok(headline);
    }
    Ok(format!("{headline}\n  Next: {}", next.dimmed()))
}

fn render_mission(mission: &Mission, block_start: Option<u64>) -> String {
    let or_dash = |s: &str| if s.is_empty() { "-".to_string() } else { s.to_string() };
    let mut lines = vec![
        format!("{}", "Mission".cyan().bold()),
        format!("  Number:      {}", or_dash(&mission.mission_number)),
        format!("  Callsign:    {}", or_dash(&mission.callsign)),
        format!(
            "  Block start: {}",
            block_start.map_or_else(|| "not set".yellow().to_string(), |n| n.to_string())
        ),
        format!("  Crew:        {}", or_dash(&mission.crew_roster.join(", "))),
    ];
    for (i, shift) in mission.crew_details.shifts.iter().enumerate() {
        if *shift == Shift::default() {
            continue;
        }
        let seats = [
            ("MC", &shift.mc),
            ("TC", &shift.tc),
            ("UAC", &shift.uac),
            ("SC", &shift.sc),
            ("MPO1", &shift.mpo1),
            ("MPO2", &shift.mpo2),
        ]
        .into_iter()
        .filter(|(_, name)| !name.is_empty())
        .map(|(seat, name)| format!("{seat} {name}"))
        .collect::<Vec<_>>()
        .join(", ");
        let turnover = if shift.turnover.is_empty() {
            String::new()
        } else {
            format!(" (turnover {})", shift.turnover)
        };
        lines.push(format!("  Shift {}{turnover}: {seats}", i + 1));
    }
    lines.join("\n")
}

/// Show mission details, setting number and callsign first if given.
///
/// # Errors
///
/// Returns an error only if JSON serialization fails.
pub fn mission<B: BoardBackend>(
    number: Option<&str>,
    callsign: Option<&str>,
    engine: &mut SyncEngine<B>,
    json: bool,
) -> Result<String> {
    if number.is_some() || callsign.is_some() {
        engine.set_mission(number, callsign);
    }

    let board = engine.board();
    let mission = board.mission();
    if crate::is_silent() {
        return Ok(mission.mission_number.clone());
    }
    if json {
        return to_json(&MissionOutput {
            mission_number: &mission.mission_number,
            callsign: &mission.callsign,
            block_start: board.numbering().block_start,
            crew_roster: &mission.crew_roster,
            crew_details: &mission.crew_details,
        });
    }
    Ok(render_mission(mission, board.numbering().block_start))
}

/// Set crew seats for one shift (1-based). Seats not given are kept.
///
/// # Errors
///
/// Returns `InvalidArgument` for a shift outside the roster.
pub fn crew<B: BoardBackend>(
    args: &CrewArgs,
    engine: &mut SyncEngine<B>,
    json: bool,
) -> Result<String> {
    let index = args
        .shift
        .checked_sub(1)
        .ok_or_else(|| Error::InvalidArgument("shifts are numbered from 1".to_string()))?;
    let mut shift = engine
        .board()
        .mission()
        .crew_details
        .shifts
        .get(index)
        .cloned()
        .ok_or_else(|| Error::InvalidArgument(format!("no shift {}", args.shift)))?;

    let seats = [
        (&mut shift.turnover, &args.turnover),
        (&mut shift.mc, &args.mc),
        (&mut shift.tc, &args.tc),
        (&mut shift.uac, &args.uac),
        (&mut shift.sc, &args.sc),
        (&mut shift.mpo1, &args.mpo1),
        (&mut shift.mpo2, &args.mpo2),
    ];
    for (seat, value) in seats {
        if let Some(value) = value {
            *seat = value.trim().to_string();
        }
    }

    engine.set_shift(index, shift.clone())?;
    if crate::is_silent() {
        return Ok(args.shift.to_string());
    }
    if json {
        return to_json(&shift);
    }
    Ok(format!("Shift {} updated", args.shift))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::{FileBackend, SyncSettings};
    use tempfile::TempDir;

    async fn engine(dir: &TempDir) -> SyncEngine<FileBackend> {
        let backend = FileBackend::new(dir.path().join("board.json"));
        SyncEngine::open(backend, SyncSettings::default(), "TC")
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_block_start_and_type_floor() {
        let dir = TempDir::new().unwrap();
        let mut engine = engine(&dir).await;

        let out = block(Some(100), None, false, &mut engine, true).unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["blockStart"], 100);
        assert_eq!(value["nextCodes"][0], serde_json::json!(["India", "I100"]));

        let out = block(Some(500), Some("e"), false, &mut engine, true).unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["columnStart"], 500);
        assert_eq!(value["nextCodes"][0][1], "E500");

        block(None, Some("echo"), true, &mut engine, true).unwrap();
        assert!(engine.board().numbering().column_start.is_empty());

        assert!(block(Some(0), None, false, &mut engine, true).is_err());
    }

    #[tokio::test]
    async fn test_mission_and_crew() {
        let dir = TempDir::new().unwrap();
        let mut engine = engine(&dir).await;

        mission(Some("M-7"), Some("TRIDENT 21"), &mut engine, true).unwrap();
        assert_eq!(engine.board().mission().callsign, "TRIDENT 21");

        let args = CrewArgs {
            shift: 2,
            turnover: Some("1200".into()),
            mc: None,
            tc: Some("Smith".into()),
            uac: None,
            sc: None,
            mpo1: None,
            mpo2: None,
        };
        crew(&args, &mut engine, true).unwrap();
        let shift = &engine.board().mission().crew_details.shifts[1];
        assert_eq!(shift.tc, "Smith");
        assert_eq!(shift.turnover, "1200");

        let text = mission(None, None, &mut engine, false).unwrap();
        assert!(text.contains("TC Smith"));

        let bad = CrewArgs { shift: 9, ..args };
        assert!(crew(&bad, &mut engine, true).is_err());
    }
}
