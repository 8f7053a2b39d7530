//! Persistent key-value storage.
//!
//! Mirrors the extension's local storage contract: a single JSON object with
//! well-known keys, each holding an independently serialized value. Backed by
//! a file on disk, or by memory alone for tests. All access goes through
//! typed `get`/`set` so persisted shapes stay serde-defined.

use std::path::PathBuf;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use tokio::sync::Mutex;

use crate::error::TrainerError;

/// Storage key for the cached puzzle corpus.
pub const KEY_PUZZLES: &str = "puzzles";
/// Storage key for the recorded corpus length.
pub const KEY_TOTAL_PUZZLES: &str = "totalPuzzles";
/// Storage key for the persisted user rating.
pub const KEY_USER_RATING: &str = "userRating";
/// Storage key for the attempt ledger.
pub const KEY_PUZZLE_ATTEMPTS: &str = "puzzleAttempts";
/// Storage key for user settings.
pub const KEY_SETTINGS: &str = "settings";
/// Storage key for the one-time help warning acknowledgement.
pub const KEY_HELP_WARNING_SHOWN: &str = "helpWarningShown";

/// A cheaply cloneable handle to the shared key-value store.
#[derive(Clone)]
pub struct Storage {
    inner: Arc<Mutex<Map<String, Value>>>,
    path: Option<PathBuf>,
}

impl Storage {
    /// Memory-only storage. Nothing survives the process; used by tests and
    /// by callers that opt out of persistence.
    pub fn in_memory() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Map::new())),
            path: None,
        }
    }

    /// Open (or create) file-backed storage at `path`.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, TrainerError> {
        let path = path.into();
        let map = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Map::new(),
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            inner: Arc::new(Mutex::new(map)),
            path: Some(path),
        })
    }

    /// Read and deserialize a value. Returns `None` when the key is absent
    /// or its stored shape no longer matches `T` (treated as not present,
    /// so stale schemas trigger a rebuild rather than an error).
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let map = self.inner.lock().await;
        let value = map.get(key)?;
        serde_json::from_value(value.clone()).ok()
    }

    /// Serialize and write a value, then flush to disk if file-backed.
    pub async fn set<T: Serialize>(&self, key: &str, value: &T) -> Result<(), TrainerError> {
        let mut map = self.inner.lock().await;
        map.insert(key.to_string(), serde_json::to_value(value)?);
        self.flush(&map).await
    }

    /// Remove a key entirely.
    pub async fn remove(&self, key: &str) -> Result<(), TrainerError> {
        let mut map = self.inner.lock().await;
        map.remove(key);
        self.flush(&map).await
    }

    /// Like `set`, but logs and swallows failures. Session correctness never
    /// depends on a write landing; only durability across sessions does.
    pub async fn set_logged<T: Serialize>(&self, key: &str, value: &T) {
        if let Err(e) = self.set(key, value).await {
            tracing::warn!("Failed to persist {key}: {e}");
        }
    }

    async fn flush(&self, map: &Map<String, Value>) -> Result<(), TrainerError> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let bytes = serde_json::to_vec_pretty(&Value::Object(map.clone()))?;
        tokio::fs::write(path, bytes).await?;
        Ok(())
    }
}
