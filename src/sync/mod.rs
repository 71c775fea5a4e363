//! Document synchronization.
//!
//! The whole board is one JSON document. This module persists it and keeps
//! concurrent editors roughly in step:
//!
//! - **Backends**: a live file written atomically, or manual export
//! - **Scheduler**: `Idle → Dirty → Saving → Idle`, with debounce and
//!   a pending-resave state for mutations that land mid-write
//! - **Engine**: owns the board, applies mutations, saves, polls
//! - **Runner**: the live event loop (commands, deadlines, polling)
//! - **Hashing**: SHA256 content hashes for status and reload checks
//!
//! # Consistency
//!
//! Last writer wins at document granularity. A client that polls and sees
//! a newer document replaces its board wholesale, dropping any unsaved
//! local edits.
//!
//! # Example
//!
//! ```ignore
//! use tacboard::sync::{FileBackend, SyncEngine, SyncSettings};
//!
//! let mut engine = SyncEngine::open(FileBackend::new(path), SyncSettings::default(), "TC").await?;
//! engine.set_block_start(100)?;
//! engine.flush().await?;
//! ```

mod backend;
mod engine;
mod file;
mod hash;
mod runner;
mod scheduler;
mod types;

pub use backend::{AnyBackend, BoardBackend, ExportBackend, FileBackend};
pub use engine::{PendingSave, SyncEngine, SyncSettings};
pub use file::{atomic_write, export_file_name, is_writable, parse_document, write_export};
pub use hash::{content_hash, digest};
pub use runner::{run_live, Job, LiveEvent, LiveNotice};
pub use scheduler::{SaveScheduler, SaveState};
pub use types::{
    PollOutcome, SaveReport, SkipReason, SyncError, SyncResult, SyncStatus, WriteReceipt,
};
