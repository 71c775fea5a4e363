//! Initialize a board document.
//!
//! Writes an empty board for a new mission at the resolved board path
//! (`--board`, `TACBOARD_BOARD`, or `~/.tacboard/board.json`). The crew
//! then points every client at the same file.

use serde::Serialize;
use std::fs;
use std::path::PathBuf;

use super::{runtime, Target};
use crate::board::Board;
use crate::error::{Error, Result};
use crate::model::BoardState;
use crate::sync::{FileBackend, SyncEngine};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InitOutput {
    path: PathBuf,
    block_start: Option<u64>,
    mission_number: String,
    callsign: String,
}

/// Execute the init command.
///
/// # Errors
///
/// Returns `AlreadyInitialized` if a board exists and `force` is not set,
/// `InvalidArgument` for a zero block start, or an I/O error if the file
/// cannot be written.
pub fn execute(
    board: Option<&PathBuf>,
    actor: Option<&str>,
    block_start: Option<u64>,
    mission_number: &str,
    callsign: &str,
    force: bool,
    json: bool,
) -> Result<()> {
    let target = Target::resolve(board, actor)?;
    let path = target.path.clone();

    if path.exists() && !force {
        return Err(Error::AlreadyInitialized { path });
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let mut board = Board::from_state(BoardState::initial(
        target.actor.trim(),
        None,
        mission_number.trim(),
        callsign.trim(),
    ));
    if let Some(n) = block_start {
        board.set_block_start(n)?;
    }

    let mut engine = SyncEngine::with_board(
        board,
        FileBackend::new(&path),
        target.settings.sync_settings(),
        &target.actor,
    );
    engine.request_save(true);
    runtime()?.block_on(engine.flush())?;

    if crate::is_silent() {
        println!("{}", path.display());
        return Ok(());
    }

    if json {
        let output = InitOutput {
            path,
            block_start,
            mission_number: mission_number.trim().to_string(),
            callsign: callsign.trim().to_string(),
        };
        println!("{}", serde_json::to_string(&output)?);
    } else {
        println!("Initialized board at {}", path.display());
        match block_start {
            Some(n) => println!("  Block start: {n}"),
            None => {
                println!();
                println!("Next: Run 'tacboard block <number>' before creating TACREPs.");
            }
        }
    }

    Ok(())
}
