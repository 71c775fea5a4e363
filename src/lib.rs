//! Tacboard - a shared TACREP board for maritime patrol crews
//!
//! This crate provides the core functionality for the `tacboard` CLI tool.
//!
//! # Architecture
//!
//! - [`cli`] - Command-line interface using clap
//! - [`model`] - Board document types (TACREPs, correlations, history, mission)
//! - [`board`] - Domain operations: code assignment, records, correlations
//! - [`sync`] - Persistence backends, debounced saves, and change polling
//! - [`config`] - Board location, actor, and settings
//! - [`validate`] - Field validation and type synonyms
//! - [`error`] - Error types and handling

#![forbid(unsafe_code)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod board;
pub mod cli;
pub mod config;
pub mod error;
pub mod model;
pub mod sync;
pub mod validate;

pub use error::{Error, Result};

/// Global silent mode flag for `--silent` output.
///
/// When set, create/mutate commands print only the TACREP code or group
/// number instead of full output. Avoids threading a `silent` bool
/// through every handler signature.
pub static SILENT: std::sync::atomic::AtomicBool = std::sync::atomic::AtomicBool::new(false);

/// Check if silent mode is active.
#[inline]
pub fn is_silent() -> bool {
    SILENT.load(std::sync::atomic::Ordering::Relaxed)
}
