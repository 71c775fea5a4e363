//! Command implementations.
//!
//! Board commands share one shape: `apply(.., engine, json) -> Result<String>`
//! runs against an open [`SyncEngine`] and returns what to print. A one-shot
//! invocation opens the board, applies, and flushes with a priority save;
//! `live` queues the same calls onto its event loop.

pub mod completions;
pub mod correlate;
pub mod export;
pub mod history;
pub mod init;
pub mod live;
pub mod log;
pub mod mission;
pub mod record;
pub mod status;
pub mod version;

use serde::Serialize;
use std::path::PathBuf;

use crate::cli::Commands;
use crate::config::{load_settings, resolve_actor, resolve_board_path, Settings};
use crate::error::{Error, Result};
use crate::sync::{AnyBackend, BoardBackend, SyncEngine};

/// Where a command reads and writes, and as whom.
#[derive(Debug, Clone)]
pub struct Target {
    pub path: PathBuf,
    pub actor: String,
    pub settings: Settings,
}

impl Target {
    /// Resolve board path, actor, and settings from flags and environment.
    ///
    /// # Errors
    ///
    /// Returns `Config` if no board location can be determined or the
    /// settings file is malformed.
    pub fn resolve(board: Option<&PathBuf>, actor: Option<&str>) -> Result<Self> {
        let path = resolve_board_path(board.map(PathBuf::as_path)).ok_or_else(|| {
            Error::Config("Could not determine board location; pass --board".to_string())
        })?;
        Ok(Self {
            path,
            actor: resolve_actor(actor),
            settings: load_settings(None)?,
        })
    }

    /// Backend for this board: the live file if writable, else export.
    #[must_use]
    pub fn backend(&self) -> AnyBackend {
        AnyBackend::probe(&self.path, &self.settings.export_dir())
    }

    /// Open the board document.
    ///
    /// # Errors
    ///
    /// Returns `BoardNotFound` if the document does not exist, or
    /// `CorruptDocument` if it cannot be parsed.
    pub async fn open(&self) -> Result<SyncEngine<AnyBackend>> {
        if !self.path.exists() {
            return Err(Error::BoardNotFound {
                path: self.path.clone(),
            });
        }
        SyncEngine::open(self.backend(), self.settings.sync_settings(), &self.actor).await
    }
}

/// Create the multi-threaded runtime one-shot commands block on.
///
/// # Errors
///
/// Returns `Other` if the runtime cannot be built.
pub fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Runtime::new()
        .map_err(|e| Error::Other(format!("Failed to create async runtime: {e}")))
}

/// Run one board command: open, apply, save, print.
///
/// # Errors
///
/// Returns the command's error, or `PersistenceFailure` if the save fails.
pub fn run_on_board(
    command: &Commands,
    board: Option<&PathBuf>,
    actor: Option<&str>,
    json: bool,
) -> Result<()> {
    let target = Target::resolve(board, actor)?;
    let rt = runtime()?;

    rt.block_on(async {
        let mut engine = target.open().await?;
        let output = apply(command, &mut engine, json)?;
        engine.flush().await?;
        if !output.is_empty() {
            println!("{output}");
        }
        Ok(())
    })
}

/// Apply a board command to an open engine.
///
/// # Errors
///
/// Returns the command's error. Commands that manage the board file
/// itself are rejected with `InvalidArgument`.
pub fn apply<B: BoardBackend>(
    command: &Commands,
    engine: &mut SyncEngine<B>,
    json: bool,
) -> Result<String> {
    match command {
        Commands::Block {
            number,
            kind,
            clear,
        } => mission::block(*number, kind.as_deref(), *clear, engine, json),
        Commands::Mission { number, callsign } => {
            mission::mission(number.as_deref(), callsign.as_deref(), engine, json)
        }
        Commands::Crew(args) => mission::crew(args, engine, json),
        Commands::Add(args) => record::add(args, engine, json),
        Commands::Edit(args) => record::edit(args, engine, json),
        Commands::Delete { code } => record::delete(code, engine, json),
        Commands::Restore { code } => record::restore(code, engine, json),
        Commands::List { kind, deleted } => record::list(kind.as_deref(), *deleted, engine, json),
        Commands::Show { code } => record::show(code, engine, json),
        Commands::Correlate { command } => correlate::apply(command, engine, json),
        Commands::History { code, limit } => history::apply(code.as_deref(), *limit, engine, json),
        Commands::Fault { command } => log::fault(command, engine, json),
        Commands::Timeline { command } => log::timeline(command, engine, json),
        Commands::Init { .. }
        | Commands::Export { .. }
        | Commands::Status
        | Commands::Live
        | Commands::Completions { .. }
        | Commands::Version => Err(Error::InvalidArgument(
            "This command manages the board file; run it outside live mode".to_string(),
        )),
    }
}

/// Serialize command output.
pub(crate) fn to_json<T: Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string(value)?)
}

/// Convert a 1-based group number from the command line.
pub(crate) fn group_index(group: usize) -> Result<usize> {
    group
        .checked_sub(1)
        .ok_or(Error::GroupNotFound { index: group })
}

/// Current UTC time as HHMM.
pub(crate) fn now_hhmm() -> String {
    chrono::Utc::now().format("%H%M").to_string()
}
