//! Data models for Tacboard.
//!
//! This module contains the persisted document types:
//! - Record (TACREP envelope + per-type fields)
//! - CorrelationGroup
//! - HistoryEntry
//! - BoardState (document root, faults, timeline, crew details)

pub mod board;
pub mod correlation;
pub mod format;
pub mod history;
pub mod tacrep;

pub use board::{BoardState, Columns, CrewDetails, Fault, Shift, TimelineEntry, TimelineEvent};
pub use correlation::CorrelationGroup;
pub use history::{history_line, ChangeKind, HistoryEntry};
pub use tacrep::{
    ContactFields, EchoFields, Position, Record, RecordStatus, TacrepFields, TacrepType,
    SENTINEL_SUFFIX,
};
