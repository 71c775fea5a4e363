//! Configuration management.
//!
//! Resolves where the board document lives, who the acting crew position
//! is, and loads optional settings.
//!
//! # Layout
//!
//! Everything defaults to `~/.tacboard/`:
//! - **Board**: `~/.tacboard/board.json`, the shared document
//! - **Settings**: `~/.tacboard/config.json`, per-user tuning
//!
//! A shared board on a network path is selected with `--board` or
//! `TACBOARD_BOARD`.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

use crate::error::{Error, Result};
use crate::sync::SyncSettings;

/// Get the global Tacboard directory location (`~/.tacboard/`).
#[must_use]
pub fn global_tacboard_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(".tacboard"))
}

/// Resolve the board document path.
///
/// Priority:
/// 1. If `explicit_path` is provided, use it directly
/// 2. `TACBOARD_BOARD` environment variable
/// 3. Global location: `~/.tacboard/board.json`
#[must_use]
pub fn resolve_board_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return Some(path.to_path_buf());
    }

    if let Ok(path) = std::env::var("TACBOARD_BOARD") {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    global_tacboard_dir().map(|dir| dir.join("board.json"))
}

/// Get the default actor name.
///
/// Priority:
/// 1. `TACBOARD_ACTOR` environment variable
/// 2. System username
/// 3. "unknown"
#[must_use]
pub fn default_actor() -> String {
    if let Ok(actor) = std::env::var("TACBOARD_ACTOR") {
        if !actor.trim().is_empty() {
            return actor.trim().to_string();
        }
    }

    if let Ok(user) = std::env::var("USER") {
        if !user.is_empty() {
            return user;
        }
    }

    "unknown".to_string()
}

/// Resolve the actor for a command: explicit flag, then [`default_actor`].
#[must_use]
pub fn resolve_actor(explicit: Option<&str>) -> String {
    explicit
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .map_or_else(default_actor, ToString::to_string)
}

/// User settings from `~/.tacboard/config.json`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    /// Debounce window for saves (milliseconds).
    pub auto_save_ms: u64,
    /// Poll interval (milliseconds).
    pub poll_ms: u64,
    /// Whether plain edits append history.
    pub log_edits: bool,
    /// Where manual exports go. Defaults to the current directory.
    pub export_dir: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            auto_save_ms: 400,
            poll_ms: 5000,
            log_edits: false,
            export_dir: None,
        }
    }
}

impl Settings {
    /// Parse settings JSON.
    ///
    /// # Errors
    ///
    /// Returns `Config` if the JSON is malformed.
    pub fn parse(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| Error::Config(format!("config.json: {e}")))
    }

    /// Apply `TACBOARD_AUTOSAVE_MS` / `TACBOARD_POLL_MS`.
    ///
    /// # Errors
    ///
    /// Returns `Config` if an override is not a number.
    pub fn apply_env(mut self) -> Result<Self> {
        if let Some(ms) = env_millis("TACBOARD_AUTOSAVE_MS")? {
            self.auto_save_ms = ms;
        }
        if let Some(ms) = env_millis("TACBOARD_POLL_MS")? {
            self.poll_ms = ms;
        }
        Ok(self)
    }

    /// Export directory, falling back to the current directory.
    #[must_use]
    pub fn export_dir(&self) -> PathBuf {
        self.export_dir
            .clone()
            .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
    }

    /// Engine tuning derived from these settings.
    #[must_use]
    pub const fn sync_settings(&self) -> SyncSettings {
        SyncSettings {
            autosave: Duration::from_millis(self.auto_save_ms),
            poll: Duration::from_millis(self.poll_ms),
            log_edits: self.log_edits,
        }
    }
}

fn env_millis(name: &str) -> Result<Option<u64>> {
    match std::env::var(name) {
        Ok(v) if !v.trim().is_empty() => v
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| Error::Config(format!("{name} must be milliseconds, got '{v}'"))),
        _ => Ok(None),
    }
}

/// Load settings from `path`, or from `~/.tacboard/config.json`.
///
/// A missing file yields defaults. Environment overrides are applied last.
///
/// # Errors
///
/// Returns `Config` for a malformed file or override.
pub fn load_settings(path: Option<&Path>) -> Result<Settings> {
    let path = path
        .map(Path::to_path_buf)
        .or_else(|| global_tacboard_dir().map(|d| d.join("config.json")));

    let settings = match path {
        Some(path) if path.exists() => {
            debug!(path = %path.display(), "Loading settings");
            Settings::parse(&std::fs::read_to_string(&path)?)?
        }
        _ => Settings::default(),
    };
    settings.apply_env()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_resolve_board_path_with_explicit() {
        let explicit = PathBuf::from("/mnt/share/mission.json");
        assert_eq!(resolve_board_path(Some(&explicit)), Some(explicit));
    }

    #[test]
    fn test_resolve_actor_prefers_flag() {
        assert_eq!(resolve_actor(Some(" TC ")), "TC");
        assert!(!resolve_actor(None).is_empty());
        assert!(!resolve_actor(Some("  ")).is_empty());
    }

    #[test]
    fn test_settings_defaults_and_partial_file() {
        let settings = Settings::parse(r#"{ "pollMs": 2000, "logEdits": true }"#).unwrap();
        assert_eq!(settings.auto_save_ms, 400);
        assert_eq!(settings.poll_ms, 2000);
        assert!(settings.log_edits);

        let sync = settings.sync_settings();
        assert_eq!(sync.poll, Duration::from_secs(2));
        assert!(sync.log_edits);
    }

    #[test]
    fn test_malformed_settings_is_config_error() {
        let err = Settings::parse("{ pollMs: }").unwrap_err();
        assert_eq!(err.exit_code(), 7);
    }

    #[test]
    fn test_load_settings_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.json");
        std::fs::write(&path, r#"{ "autoSaveMs": 250, "exportDir": "/tmp/out" }"#).unwrap();

        let settings = load_settings(Some(&path)).unwrap();
        assert_eq!(settings.export_dir(), PathBuf::from("/tmp/out"));
        assert!(load_settings(Some(&temp_dir.path().join("absent.json"))).is_ok());
    }
}
