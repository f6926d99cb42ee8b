//! Durable key-value persistence for wallpaper state
//!
//! Every piece of persisted state is a whole JSON document stored under a
//! fixed key. Documents are always read and written whole; callers that
//! read-modify-write a document serialize through their own lock.
//!
//! Two backends implement [`KvStore`]:
//! - [`MemoryStore`] - process-local map, used by tests and ephemeral runs
//! - [`FileStore`] - one JSON file per key inside a data directory

pub mod file;
pub mod memory;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::sync::Arc;

use crate::models::ControlsPosition;

pub use file::FileStore;
pub use memory::MemoryStore;

/// Persisted document keys
pub mod keys {
    pub const CACHE_LOADED: &str = "cacheLoaded";
    pub const CACHE: &str = "pinterestCache";
    pub const CURRENT_ITEM: &str = "currentItem";
    pub const CURRENT_INDEX: &str = "currentIndex";
    pub const LAST_UPDATED: &str = "lastUpdated";
    pub const FAVORITES: &str = "favorites";
    pub const ROTATION_INTERVAL: &str = "rotationInterval";
    pub const AUTO_CHANGE_ENABLED: &str = "autoChangeEnabled";
    pub const CONTROLS_POSITION: &str = "controlsPosition";
    pub const DARK_MODE: &str = "darkMode";
    pub const EXTENSION_VERSION: &str = "extensionVersion";

    /// All keys the crate ever writes
    pub const ALL: [&str; 11] = [
        CACHE_LOADED,
        CACHE,
        CURRENT_ITEM,
        CURRENT_INDEX,
        LAST_UPDATED,
        FAVORITES,
        ROTATION_INTERVAL,
        AUTO_CHANGE_ENABLED,
        CONTROLS_POSITION,
        DARK_MODE,
        EXTENSION_VERSION,
    ];
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors from the persistence layer
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Filesystem failure
    #[error("I/O error during '{operation}' on '{key}': {source}")]
    Io {
        operation: &'static str,
        key: String,
        #[source]
        source: std::io::Error,
    },

    /// Document could not be encoded or decoded
    #[error("Malformed document '{key}': {source}")]
    Json {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// Key contains characters that cannot name a document
    #[error("Invalid storage key: {0}")]
    InvalidKey(String),
}

/// Whole-document key-value backend
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Backend name for logging
    fn name(&self) -> &str;

    /// Read one document
    async fn get(&self, key: &str) -> StorageResult<Option<Value>>;

    /// Write several documents, in order
    async fn set_many(&self, entries: Vec<(String, Value)>) -> StorageResult<()>;

    /// Delete documents; missing keys are ignored
    async fn remove(&self, keys: &[&str]) -> StorageResult<()>;
}

/// Typed access to a [`KvStore`]
#[derive(Clone)]
pub struct Storage {
    backend: Arc<dyn KvStore>,
}

impl Storage {
    pub fn new(backend: Arc<dyn KvStore>) -> Self {
        Self { backend }
    }

    /// In-memory storage
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    /// Read and decode one document
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> StorageResult<Option<T>> {
        match self.backend.get(key).await? {
            Some(value) => serde_json::from_value(value)
                .map(Some)
                .map_err(|source| StorageError::Json {
                    key: key.to_string(),
                    source,
                }),
            None => Ok(None),
        }
    }

    /// Encode and write one document
    pub async fn set<T: Serialize>(&self, key: &str, value: &T) -> StorageResult<()> {
        let value = encode(key, value)?;
        self.backend.set_many(vec![(key.to_string(), value)]).await
    }

    /// Write pre-encoded documents in order
    pub async fn set_values(&self, entries: Vec<(&str, Value)>) -> StorageResult<()> {
        let entries = entries
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();
        self.backend.set_many(entries).await
    }

    pub async fn remove(&self, keys: &[&str]) -> StorageResult<()> {
        self.backend.remove(keys).await
    }
}

/// Encode a value for [`Storage::set_values`]
pub fn encode<T: Serialize>(key: &str, value: &T) -> StorageResult<Value> {
    serde_json::to_value(value).map_err(|source| StorageError::Json {
        key: key.to_string(),
        source,
    })
}

/// Display preferences persisted for rendering surfaces
///
/// The core stores these but does not interpret them.
pub struct Preferences {
    storage: Storage,
}

impl Preferences {
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }

    pub async fn dark_mode(&self) -> StorageResult<bool> {
        Ok(self.storage.get(keys::DARK_MODE).await?.unwrap_or(false))
    }

    pub async fn set_dark_mode(&self, enabled: bool) -> StorageResult<()> {
        self.storage.set(keys::DARK_MODE, &enabled).await
    }

    pub async fn controls_position(&self) -> StorageResult<Option<ControlsPosition>> {
        self.storage.get(keys::CONTROLS_POSITION).await
    }

    pub async fn set_controls_position(&self, position: ControlsPosition) -> StorageResult<()> {
        self.storage.set(keys::CONTROLS_POSITION, &position).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_typed_roundtrip() {
        let storage = Storage::in_memory();

        storage.set(keys::CURRENT_INDEX, &7usize).await.unwrap();
        let index: Option<usize> = storage.get(keys::CURRENT_INDEX).await.unwrap();
        assert_eq!(index, Some(7));

        let missing: Option<bool> = storage.get(keys::CACHE_LOADED).await.unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_type_mismatch_is_json_error() {
        let storage = Storage::in_memory();
        storage.set(keys::CURRENT_INDEX, &"seven").await.unwrap();

        let result: StorageResult<Option<usize>> = storage.get(keys::CURRENT_INDEX).await;
        assert!(matches!(result, Err(StorageError::Json { .. })));
    }

    #[tokio::test]
    async fn test_preferences_defaults() {
        let prefs = Preferences::new(Storage::in_memory());

        assert!(!prefs.dark_mode().await.unwrap());
        assert!(prefs.controls_position().await.unwrap().is_none());

        prefs.set_dark_mode(true).await.unwrap();
        prefs
            .set_controls_position(ControlsPosition { x: 12.0, y: 40.5 })
            .await
            .unwrap();

        assert!(prefs.dark_mode().await.unwrap());
        assert_eq!(
            prefs.controls_position().await.unwrap(),
            Some(ControlsPosition { x: 12.0, y: 40.5 })
        );
    }
}
