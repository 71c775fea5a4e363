//! Status command implementation.

use colored::Colorize;
use serde::Serialize;
use std::path::PathBuf;

use super::{runtime, Target};
use crate::error::Result;
use crate::sync::SyncStatus;

/// Output for status command.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StatusOutput {
    board: PathBuf,
    actor: String,
    mission_number: String,
    callsign: String,
    #[serde(flatten)]
    sync: SyncStatus,
}

fn short(hash: &str) -> &str {
    hash.get(..12).unwrap_or(hash)
}

/// Execute status command.
///
/// # Errors
///
/// Returns `BoardNotFound` if there is no board, or `CorruptDocument` if it
/// cannot be parsed.
pub fn execute(board: Option<&PathBuf>, actor: Option<&str>, json: bool) -> Result<()> {
    let target = Target::resolve(board, actor)?;

    let (sync, mission_number, callsign) = runtime()?.block_on(async {
        let engine = target.open().await?;
        let mission = engine.board().mission();
        let status = engine.status().await?;
        Ok::<_, crate::error::Error>((
            status,
            mission.mission_number.clone(),
            mission.callsign.clone(),
        ))
    })?;

    if json {
        let output = StatusOutput {
            board: target.path,
            actor: target.actor,
            mission_number,
            callsign,
            sync,
        };
        println!("{}", serde_json::to_string(&output)?);
        return Ok(());
    }

    println!("Tacboard Status");
    println!("===============");
    println!();
    println!("Board:    {}", target.path.display());
    println!("Backend:  {} ({})", sync.backend, sync.location);
    println!("Actor:    {}", target.actor);
    if !mission_number.is_empty() || !callsign.is_empty() {
        println!("Mission:  {mission_number} {callsign}");
    }
    match sync.block_start {
        Some(n) => println!("Block:    {n}"),
        None => println!("Block:    {}", "not set".yellow()),
    }
    println!();
    println!("TACREPs:       {} active, {} deleted", sync.active, sync.deleted);
    println!("Correlations:  {}", sync.correlations);
    println!("History:       {}", sync.history);
    println!();

    let state = if sync.in_sync {
        "in sync".green()
    } else {
        "differs from local view".red()
    };
    println!("Document: {state}");
    println!("  Local:  {}", short(&sync.local_hash));
    if let Some(remote) = &sync.remote_hash {
        println!("  Remote: {}", short(remote));
    }
    if !sync.polling {
        println!("  {}", "Manual export only; changes from other clients are not seen".dimmed());
    }
    if let Some(err) = &sync.last_error {
        println!("  Last save error: {}", err.red());
    }

    Ok(())
}
