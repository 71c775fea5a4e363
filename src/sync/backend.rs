//! Persistence backends for the board document.
//!
//! A backend is either a live, writable document that other clients also
//! read and write ([`FileBackend`]), or a manual export target with no live
//! sync ([`ExportBackend`]). Which one to use is decided outside the engine
//! by probing the environment.

use std::future::Future;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::file::{atomic_write, is_writable, modified_millis, write_export};
use super::types::{SyncError, SyncResult, WriteReceipt};

/// Storage for the board document.
///
/// Async methods use `impl Future + Send` so the engine can drive writes
/// from a spawned task.
pub trait BoardBackend: Clone + Send + Sync + 'static {
    /// Short backend name for status output.
    fn name(&self) -> &'static str;

    /// Where documents go, for display.
    fn location(&self) -> String;

    /// Whether other writers can change the document underneath us.
    fn supports_polling(&self) -> bool;

    /// Modification stamp of the backing document (Unix milliseconds), or
    /// `None` if there is no document.
    fn modified(&self) -> impl Future<Output = SyncResult<Option<i64>>> + Send;

    /// Full document text, or `None` if there is no document.
    fn read(&self) -> impl Future<Output = SyncResult<Option<String>>> + Send;

    /// Replace the document with `content`.
    fn write(&self, content: String) -> impl Future<Output = SyncResult<WriteReceipt>> + Send;
}

// ── File ──────────────────────────────────────────────────────

/// A shared document on disk, written atomically and polled by mtime.
#[derive(Debug, Clone)]
pub struct FileBackend {
    path: PathBuf,
}

impl FileBackend {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl BoardBackend for FileBackend {
    fn name(&self) -> &'static str {
        "file"
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }

    fn supports_polling(&self) -> bool {
        true
    }

    fn modified(&self) -> impl Future<Output = SyncResult<Option<i64>>> + Send {
        async move {
            match tokio::fs::metadata(&self.path).await {
                Ok(meta) => Ok(modified_millis(&meta)),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
                Err(e) => Err(e.into()),
            }
        }
    }

    fn read(&self) -> impl Future<Output = SyncResult<Option<String>>> + Send {
        async move {
            match tokio::fs::read_to_string(&self.path).await {
                Ok(text) => Ok(Some(text)),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
                Err(e) => Err(e.into()),
            }
        }
    }

    fn write(&self, content: String) -> impl Future<Output = SyncResult<WriteReceipt>> + Send {
        let path = self.path.clone();
        async move {
            let target = path.clone();
            tokio::task::spawn_blocking(move || atomic_write(&target, &content))
                .await
                .map_err(|e| SyncError::WriteFailed(e.to_string()))?
                .map_err(|e| SyncError::WriteFailed(format!("{}: {e}", path.display())))?;

            let modified = tokio::fs::metadata(&path)
                .await
                .ok()
                .and_then(|m| modified_millis(&m));
            debug!(path = %path.display(), ?modified, "Board written");
            Ok(WriteReceipt { path, modified })
        }
    }
}

// ── Export ────────────────────────────────────────────────────

/// Single-user fallback: each save is a timestamped full-document export.
///
/// An optional read-only source seeds the board on open; it is never
/// polled.
#[derive(Debug, Clone)]
pub struct ExportBackend {
    dir: PathBuf,
    source: Option<PathBuf>,
}

impl ExportBackend {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>, source: Option<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            source,
        }
    }
}

impl BoardBackend for ExportBackend {
    fn name(&self) -> &'static str {
        "export"
    }

    fn location(&self) -> String {
        self.dir.display().to_string()
    }

    fn supports_polling(&self) -> bool {
        false
    }

    fn modified(&self) -> impl Future<Output = SyncResult<Option<i64>>> + Send {
        async { Ok(None) }
    }

    fn read(&self) -> impl Future<Output = SyncResult<Option<String>>> + Send {
        async move {
            let Some(source) = &self.source else {
                return Ok(None);
            };
            match tokio::fs::read_to_string(source).await {
                Ok(text) => Ok(Some(text)),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
                Err(e) => Err(e.into()),
            }
        }
    }

    fn write(&self, content: String) -> impl Future<Output = SyncResult<WriteReceipt>> + Send {
        let dir = self.dir.clone();
        async move {
            let path = tokio::task::spawn_blocking(move || {
                write_export(&dir, &content, chrono::Utc::now())
            })
            .await
            .map_err(|e| SyncError::WriteFailed(e.to_string()))?
            .map_err(|e| SyncError::WriteFailed(e.to_string()))?;
            debug!(path = %path.display(), "Board exported");
            Ok(WriteReceipt {
                path,
                modified: None,
            })
        }
    }
}

// ── Selection ─────────────────────────────────────────────────

/// Backend chosen at runtime.
#[derive(Debug, Clone)]
pub enum AnyBackend {
    File(FileBackend),
    Export(ExportBackend),
}

impl AnyBackend {
    /// Probe the environment: a writable board path gets the live file
    /// backend, anything else falls back to manual export into
    /// `export_dir`, seeded from the board path if it can be read.
    #[must_use]
    pub fn probe(board_path: &Path, export_dir: &Path) -> Self {
        if is_writable(board_path) {
            Self::File(FileBackend::new(board_path))
        } else {
            debug!(path = %board_path.display(), "Board path not writable; using export backend");
            Self::Export(ExportBackend::new(export_dir, Some(board_path.to_path_buf())))
        }
    }
}

impl BoardBackend for AnyBackend {
    fn name(&self) -> &'static str {
        match self {
            Self::File(b) => b.name(),
            Self::Export(b) => b.name(),
        }
    }

    fn location(&self) -> String {
        match self {
            Self::File(b) => b.location(),
            Self::Export(b) => b.location(),
        }
    }

    fn supports_polling(&self) -> bool {
        match self {
            Self::File(b) => b.supports_polling(),
            Self::Export(b) => b.supports_polling(),
        }
    }

    fn modified(&self) -> impl Future<Output = SyncResult<Option<i64>>> + Send {
        async move {
            match self {
                Self::File(b) => b.modified().await,
                Self::Export(b) => b.modified().await,
            }
        }
    }

    fn read(&self) -> impl Future<Output = SyncResult<Option<String>>> + Send {
        async move {
            match self {
                Self::File(b) => b.read().await,
                Self::Export(b) => b.read().await,
            }
        }
    }

    fn write(&self, content: String) -> impl Future<Output = SyncResult<WriteReceipt>> + Send {
        async move {
            match self {
                Self::File(b) => b.write(content).await,
                Self::Export(b) => b.write(content).await,
            }
        }
    }
}

// ── Memory (tests) ────────────────────────────────────────────

#[cfg(test)]
pub use memory::MemoryBackend;

#[cfg(test)]
mod memory {
    use super::{BoardBackend, SyncError, SyncResult, WriteReceipt};
    use std::future::Future;
    use std::path::PathBuf;
    use std::sync::{Arc, Mutex};

    #[derive(Debug, Default)]
    struct Shared {
        content: Option<String>,
        modified: i64,
        writes: usize,
        fail_writes: bool,
    }

    /// In-memory shared document. Clones share the same document, so two
    /// engines on clones behave like two clients on one file. Every write
    /// bumps a logical clock.
    #[derive(Debug, Clone, Default)]
    pub struct MemoryBackend {
        shared: Arc<Mutex<Shared>>,
    }

    impl MemoryBackend {
        pub fn writes(&self) -> usize {
            self.shared.lock().unwrap().writes
        }

        pub fn content(&self) -> Option<String> {
            self.shared.lock().unwrap().content.clone()
        }

        pub fn set_fail_writes(&self, fail: bool) {
            self.shared.lock().unwrap().fail_writes = fail;
        }

        /// Replace the document as an outside writer would.
        pub fn put(&self, content: &str) {
            let mut shared = self.shared.lock().unwrap();
            shared.content = Some(content.to_string());
            shared.modified += 1;
        }
    }

    impl BoardBackend for MemoryBackend {
        fn name(&self) -> &'static str {
            "memory"
        }

        fn location(&self) -> String {
            "memory".to_string()
        }

        fn supports_polling(&self) -> bool {
            true
        }

        fn modified(&self) -> impl Future<Output = SyncResult<Option<i64>>> + Send {
            let shared = self.shared.lock().unwrap();
            let modified = shared.content.as_ref().map(|_| shared.modified);
            async move { Ok(modified) }
        }

        fn read(&self) -> impl Future<Output = SyncResult<Option<String>>> + Send {
            let content = self.content();
            async move { Ok(content) }
        }

        fn write(&self, content: String) -> impl Future<Output = SyncResult<WriteReceipt>> + Send {
            let result = {
                let mut shared = self.shared.lock().unwrap();
                if shared.fail_writes {
                    Err(SyncError::WriteFailed("disk full".into()))
                } else {
                    shared.content = Some(content);
                    shared.modified += 1;
                    shared.writes += 1;
                    Ok(WriteReceipt {
                        path: PathBuf::from("memory"),
                        modified: Some(shared.modified),
                    })
                }
            };
            async move { result }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_file_backend_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let backend = FileBackend::new(temp_dir.path().join("board.json"));

        assert_eq!(backend.modified().await.unwrap(), None);
        assert_eq!(backend.read().await.unwrap(), None);

        let receipt = backend.write("{\"callsign\":\"RAVEN\"}".to_string()).await.unwrap();
        assert!(receipt.modified.is_some());
        assert_eq!(
            backend.read().await.unwrap().as_deref(),
            Some("{\"callsign\":\"RAVEN\"}")
        );
    }

    #[tokio::test]
    async fn test_export_backend_writes_timestamped_files() {
        let temp_dir = TempDir::new().unwrap();
        let backend = ExportBackend::new(temp_dir.path(), None);

        assert!(!backend.supports_polling());
        let receipt = backend.write("{}".to_string()).await.unwrap();
        let name = receipt.path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("tacboard_") && name.ends_with(".json"));
        assert!(receipt.modified.is_none());
    }

    #[test]
    fn test_probe_prefers_writable_file() {
        let temp_dir = TempDir::new().unwrap();
        let board = temp_dir.path().join("board.json");
        assert!(matches!(AnyBackend::probe(&board, temp_dir.path()), AnyBackend::File(_)));

        let unreachable = temp_dir.path().join("no-such-dir").join("board.json");
        let backend = AnyBackend::probe(&unreachable, temp_dir.path());
        assert!(matches!(backend, AnyBackend::Export(_)));
        assert_eq!(backend.name(), "export");
    }
}
