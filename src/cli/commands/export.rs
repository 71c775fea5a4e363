//! Manual export command.

use serde::Serialize;
use std::path::PathBuf;

use super::{runtime, Target};
use crate::error::Result;

#[derive(Serialize)]
struct ExportOutput {
    path: PathBuf,
}

/// Write `tacboard_YYYYMMDD_HHMM.json` into `dir` (or the configured
/// export directory).
///
/// # Errors
///
/// Returns `BoardNotFound` if there is no board, or an I/O error if the
/// export cannot be written.
pub fn execute(
    dir: Option<&PathBuf>,
    board: Option<&PathBuf>,
    actor: Option<&str>,
    json: bool,
) -> Result<()> {
    let target = Target::resolve(board, actor)?;
    let dir = dir.cloned().unwrap_or_else(|| target.settings.export_dir());

    let path = runtime()?.block_on(async {
        let engine = target.open().await?;
        engine.export_to(&dir).await
    })?;

    if crate::is_silent() {
        println!("{}", path.display());
    } else if json {
        println!("{}", serde_json::to_string(&ExportOutput { path })?);
    } else {
        println!("Exported board to {}", path.display());
    }
    Ok(())
}
