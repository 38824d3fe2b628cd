//! Durable storage for the favorites set
//!
//! Layout: one JSON document holding a single well-known entry,
//!
//! ```text
//! <data dir>/favorites/favorite_keys.json
//! {"favorite_keys": ["Toyota|Supra", "BMW|E30"]}
//! ```
//!
//! No schema version is recorded.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use thiserror::Error;

use super::FavoriteKey;

/// Directory name of the favorites store
pub const FAVORITES_STORE_NAME: &str = "favorites";

/// File holding the favorites document
pub const FAVORITES_FILE: &str = "favorite_keys.json";

/// Favorites storage errors
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Failed to read favorites from {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write favorites to {path}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse favorites in {path} (corrupted or invalid format)")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to serialize favorites")]
    Serialize(#[source] serde_json::Error),

    #[error("Favorites save task failed")]
    Task(#[source] tokio::task::JoinError),

    #[error("Favorites store is closed")]
    Closed,
}

/// The persisted document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FavoritesDocument {
    #[serde(default)]
    pub favorite_keys: BTreeSet<FavoriteKey>,
}

/// Storage behind the favorites store
///
/// Implementations only need whole-set load and save; the store
/// serializes all calls.
pub trait FavoritesBackend: Send + Sync + 'static {
    /// Load the persisted set; absent storage is an empty set
    fn load(&self) -> Result<BTreeSet<FavoriteKey>, StorageError>;

    /// Replace the persisted set
    fn save(&self, keys: &BTreeSet<FavoriteKey>) -> Result<(), StorageError>;

    /// Backend identifier for logging
    fn describe(&self) -> String;
}

/// JSON file storage with atomic replace
#[derive(Debug, Clone)]
pub struct FileBackend {
    path: PathBuf,
}

impl FileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<data_dir>/favorites/favorite_keys.json`
    pub fn in_dir(data_dir: &Path) -> Self {
        Self::new(data_dir.join(FAVORITES_STORE_NAME).join(FAVORITES_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_error(&self, source: std::io::Error) -> StorageError {
        StorageError::Write {
            path: self.path.clone(),
            source,
        }
    }
}

impl FavoritesBackend for FileBackend {
    fn load(&self) -> Result<BTreeSet<FavoriteKey>, StorageError> {
        if !self.path.exists() {
            return Ok(BTreeSet::new());
        }

        let content = std::fs::read_to_string(&self.path).map_err(|source| StorageError::Read {
            path: self.path.clone(),
            source,
        })?;

        let document: FavoritesDocument =
            serde_json::from_str(&content).map_err(|source| StorageError::Parse {
                path: self.path.clone(),
                source,
            })?;

        Ok(document.favorite_keys)
    }

    fn save(&self, keys: &BTreeSet<FavoriteKey>) -> Result<(), StorageError> {
        let parent = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&parent).map_err(|e| self.write_error(e))?;

        let document = FavoritesDocument {
            favorite_keys: keys.clone(),
        };
        let content =
            serde_json::to_string_pretty(&document).map_err(StorageError::Serialize)?;

        // Write next to the target, then rename over it
        let mut temp = tempfile::NamedTempFile::new_in(&parent).map_err(|e| self.write_error(e))?;
        temp.write_all(content.as_bytes())
            .map_err(|e| self.write_error(e))?;
        temp.as_file().sync_all().map_err(|e| self.write_error(e))?;
        temp.persist(&self.path)
            .map_err(|e| self.write_error(e.error))?;

        Ok(())
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    keys: Mutex<BTreeSet<FavoriteKey>>,
    fail_saves: AtomicBool,
    saves: AtomicUsize,
}

/// In-memory storage with failure injection
///
/// Clones share state, so a test can keep a handle after moving one
/// into a store.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    state: Arc<MemoryState>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_keys<I: IntoIterator<Item = FavoriteKey>>(keys: I) -> Self {
        let backend = Self::new();
        *backend.lock_keys() = keys.into_iter().collect();
        backend
    }

    /// Make subsequent saves fail (or succeed again)
    pub fn fail_saves(&self, fail: bool) {
        self.state.fail_saves.store(fail, Ordering::SeqCst);
    }

    /// Number of successful saves
    pub fn save_count(&self) -> usize {
        self.state.saves.load(Ordering::SeqCst)
    }

    /// What storage currently holds
    pub fn stored(&self) -> BTreeSet<FavoriteKey> {
        self.lock_keys().clone()
    }

    fn lock_keys(&self) -> std::sync::MutexGuard<'_, BTreeSet<FavoriteKey>> {
        self.state
            .keys
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl FavoritesBackend for MemoryBackend {
    fn load(&self) -> Result<BTreeSet<FavoriteKey>, StorageError> {
        Ok(self.stored())
    }

    fn save(&self, keys: &BTreeSet<FavoriteKey>) -> Result<(), StorageError> {
        if self.state.fail_saves.load(Ordering::SeqCst) {
            return Err(StorageError::Write {
                path: PathBuf::from("memory"),
                source: std::io::Error::other("injected save failure"),
            });
        }

        *self.lock_keys() = keys.clone();
        self.state.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}
