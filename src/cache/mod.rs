//! Wallpaper record cache
//!
//! The cache holds the ordered collection of validated records that the
//! selector draws from. It is populated once from a bundled bootstrap
//! document, persisted under `pinterestCache` with a `cacheLoaded` flag, and
//! replaced only as a whole.
//!
//! # Example
//!
//! ```rust,ignore
//! use pinwall::cache::CacheStore;
//!
//! let cache = CacheStore::open(storage, UrlValidator::default(), bus).await?;
//! if let Some(report) = cache.ensure_loaded("data/pinterest_cache.json").await? {
//!     println!("admitted {} records", report.admitted);
//! }
//! ```

pub mod analysis;
pub mod reachability;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

use crate::models::Record;
use crate::normalizer::{normalize_batch, UrlValidator};
use crate::notifications::{Event, EventBus};
use crate::storage::{encode, keys, Storage, StorageError};

/// Result type for cache operations
pub type CacheResult<T> = Result<T, CacheError>;

/// Errors from the cache store
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// No entry of the bootstrap document survived normalization and filtering
    #[error("Bootstrap admitted no records ({missing_resource} missing resource, {rejected} rejected)")]
    EmptyCache {
        missing_resource: usize,
        rejected: usize,
    },

    /// Bootstrap document is not a JSON array
    #[error("Bootstrap document must be a JSON array, got {0}")]
    NotAnArray(&'static str),

    /// Bootstrap file could not be read
    #[error("Failed to read bootstrap document {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Bootstrap file is not valid JSON
    #[error("Invalid JSON in bootstrap document: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Counts from one bootstrap run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BootstrapReport {
    /// Records stored
    pub admitted: usize,
    /// Entries with no resource
    pub missing_resource: usize,
    /// Entries whose URL failed validation
    pub rejected: usize,
}

impl BootstrapReport {
    pub fn total(&self) -> usize {
        self.admitted + self.missing_resource + self.rejected
    }
}

/// Persisted collection of validated records
pub struct CacheStore {
    storage: Storage,
    validator: UrlValidator,
    bus: EventBus,
    records: RwLock<Arc<Vec<Record>>>,
    write_lock: Mutex<()>,
}

impl CacheStore {
    /// Open the store, restoring the persisted collection if it is flagged loaded
    pub async fn open(storage: Storage, validator: UrlValidator, bus: EventBus) -> CacheResult<Self> {
        let loaded: bool = storage.get(keys::CACHE_LOADED).await?.unwrap_or(false);
        let persisted: Vec<Record> = if loaded {
            storage.get(keys::CACHE).await?.unwrap_or_default()
        } else {
            Vec::new()
        };

        tracing::debug!(
            backend = storage.backend_name(),
            records = persisted.len(),
            "Opened cache store"
        );

        Ok(Self {
            storage,
            validator,
            bus,
            records: RwLock::new(Arc::new(persisted)),
            write_lock: Mutex::new(()),
        })
    }

    pub fn validator(&self) -> &UrlValidator {
        &self.validator
    }

    /// Normalize, filter and persist a bootstrap document
    ///
    /// Skipped, returning `None`, when the cache is already loaded; call
    /// [`CacheStore::invalidate`] or [`CacheStore::reload`] to replace it.
    /// When no record survives, nothing is written and
    /// [`CacheError::EmptyCache`] is returned.
    pub async fn bootstrap(&self, document: &Value) -> CacheResult<Option<BootstrapReport>> {
        let entries = as_entries(document)?;
        let _guard = self.write_lock.lock().await;

        if self.is_loaded().await? {
            tracing::debug!("Cache already loaded, skipping bootstrap");
            return Ok(None);
        }
        self.store_batch(entries).await.map(Some)
    }

    /// Replace a loaded collection with a new document
    ///
    /// The previous collection is kept until the new one has produced at
    /// least one record, so a failed reload leaves the cache usable.
    pub async fn reload(&self, document: &Value) -> CacheResult<BootstrapReport> {
        let entries = as_entries(document)?;
        let _guard = self.write_lock.lock().await;

        let report = self.store_batch(entries).await?;
        self.bus.publish(Event::CacheInvalidated);
        Ok(report)
    }

    async fn store_batch(&self, entries: &[Value]) -> CacheResult<BootstrapReport> {
        let batch = normalize_batch(entries, &self.validator);
        let report = BootstrapReport {
            admitted: batch.records.len(),
            missing_resource: batch.missing_resource,
            rejected: batch.rejected,
        };

        if batch.records.is_empty() {
            tracing::error!(
                entries = entries.len(),
                missing_resource = report.missing_resource,
                rejected = report.rejected,
                "Bootstrap produced an empty cache"
            );
            return Err(CacheError::EmptyCache {
                missing_resource: report.missing_resource,
                rejected: report.rejected,
            });
        }

        // Collection before flag, so a set flag always has data behind it
        self.storage
            .set_values(vec![
                (keys::CACHE, encode(keys::CACHE, &batch.records)?),
                (keys::CACHE_LOADED, Value::Bool(true)),
            ])
            .await?;

        *self.records.write().await = Arc::new(batch.records);

        tracing::info!(
            admitted = report.admitted,
            missing_resource = report.missing_resource,
            rejected = report.rejected,
            "Cache bootstrapped"
        );

        Ok(report)
    }

    /// Read and bootstrap from a JSON file
    pub async fn bootstrap_from_path(&self, path: impl AsRef<Path>) -> CacheResult<Option<BootstrapReport>> {
        let document = read_document(path.as_ref()).await?;
        self.bootstrap(&document).await
    }

    /// Read and reload from a JSON file
    pub async fn reload_from_path(&self, path: impl AsRef<Path>) -> CacheResult<BootstrapReport> {
        let document = read_document(path.as_ref()).await?;
        self.reload(&document).await
    }

    /// Bootstrap from `path` unless the cache is already loaded
    ///
    /// Returns `None` when loading was skipped. The file is not read in that case.
    pub async fn ensure_loaded(&self, path: impl AsRef<Path>) -> CacheResult<Option<BootstrapReport>> {
        if self.is_loaded().await? {
            tracing::debug!("Cache already loaded, skipping bootstrap");
            return Ok(None);
        }
        self.bootstrap_from_path(path).await
    }

    /// Whether the persisted flag is set and the persisted collection is non-empty
    pub async fn is_loaded(&self) -> CacheResult<bool> {
        let flag: bool = self.storage.get(keys::CACHE_LOADED).await?.unwrap_or(false);
        if !flag {
            return Ok(false);
        }
        let persisted: Option<Vec<Value>> = self.storage.get(keys::CACHE).await?;
        Ok(persisted.is_some_and(|records| !records.is_empty()))
    }

    /// Discard the persisted collection and flag
    pub async fn invalidate(&self) -> CacheResult<()> {
        let _guard = self.write_lock.lock().await;

        self.storage
            .remove(&[keys::CACHE_LOADED, keys::CACHE])
            .await?;
        *self.records.write().await = Arc::new(Vec::new());

        tracing::info!("Cache invalidated");
        self.bus.publish(Event::CacheInvalidated);
        Ok(())
    }

    /// Invalidate when the stored version differs from `version`
    ///
    /// Records `version` afterwards. Returns whether the cache was invalidated.
    pub async fn invalidate_if_version_changed(&self, version: &str) -> CacheResult<bool> {
        let stored: Option<String> = self.storage.get(keys::EXTENSION_VERSION).await?;
        if stored.as_deref() == Some(version) {
            return Ok(false);
        }

        tracing::info!(
            previous = stored.as_deref().unwrap_or("none"),
            current = version,
            "Version changed, invalidating cache"
        );
        self.invalidate().await?;
        self.storage.set(keys::EXTENSION_VERSION, &version).await?;
        Ok(true)
    }

    /// Snapshot of the current collection
    pub async fn records(&self) -> Arc<Vec<Record>> {
        Arc::clone(&*self.records.read().await)
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

/// Read a JSON document from disk
pub async fn read_document(path: &Path) -> CacheResult<Value> {
    let bytes = tokio::fs::read(path).await.map_err(|source| CacheError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(serde_json::from_slice(&bytes)?)
}

fn as_entries(document: &Value) -> CacheResult<&[Value]> {
    document
        .as_array()
        .map(Vec::as_slice)
        .ok_or_else(|| CacheError::NotAnArray(json_kind(document)))
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    async fn store() -> (CacheStore, Storage) {
        let storage = Storage::in_memory();
        let cache = CacheStore::open(storage.clone(), UrlValidator::default(), EventBus::default())
            .await
            .unwrap();
        (cache, storage)
    }

    #[tokio::test]
    async fn test_bootstrap_persists_collection_and_flag() {
        let (cache, storage) = store().await;

        let report = cache
            .bootstrap(&json!([
                {"url": "https://i.pinimg.com/originals/a.jpg", "title": "A"},
                {"media": "https://i.pinimg.com/originals/b.mp4"},
            ]))
            .await
            .unwrap();

        assert_eq!(report, Some(BootstrapReport { admitted: 2, missing_resource: 0, rejected: 0 }));
        assert!(cache.is_loaded().await.unwrap());
        assert_eq!(cache.len().await, 2);

        let persisted: Vec<Record> = storage.get(keys::CACHE).await.unwrap().unwrap();
        assert_eq!(persisted.len(), 2);
        assert_eq!(persisted[0].title, "A");
        assert!(persisted[1].is_video());
    }

    #[tokio::test]
    async fn test_all_invalid_bootstrap_leaves_state_untouched() {
        let (cache, storage) = store().await;

        let result = cache
            .bootstrap(&json!([{"url": "blob:https://x/1"}, {"title": "none"}]))
            .await;

        assert!(matches!(
            result,
            Err(CacheError::EmptyCache { missing_resource: 1, rejected: 1 })
        ));
        assert!(!cache.is_loaded().await.unwrap());
        let flag: Option<bool> = storage.get(keys::CACHE_LOADED).await.unwrap();
        assert!(flag.is_none());
    }

    #[tokio::test]
    async fn test_failed_rebootstrap_keeps_previous_collection() {
        let (cache, _) = store().await;
        cache
            .bootstrap(&json!([{"url": "https://i.pinimg.com/originals/a.jpg"}]))
            .await
            .unwrap();

        assert!(cache.reload(&json!([])).await.is_err());
        assert!(cache.is_loaded().await.unwrap());
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn test_bootstrap_skipped_when_loaded() {
        let (cache, _) = store().await;
        cache
            .bootstrap(&json!([{"url": "https://i.pinimg.com/originals/a.jpg"}]))
            .await
            .unwrap();

        let second = cache
            .bootstrap(&json!([
                {"url": "https://i.pinimg.com/originals/b.jpg"},
                {"url": "https://i.pinimg.com/originals/c.jpg"},
            ]))
            .await
            .unwrap();

        assert!(second.is_none());
        assert_eq!(cache.len().await, 1);
        assert_eq!(cache.records().await[0].url, "https://i.pinimg.com/originals/a.jpg");
    }

    #[tokio::test]
    async fn test_reload_replaces_loaded_collection() {
        let (cache, _) = store().await;
        let mut rx = cache.bus.subscribe();
        cache
            .bootstrap(&json!([{"url": "https://i.pinimg.com/originals/a.jpg"}]))
            .await
            .unwrap();

        let report = cache
            .reload(&json!([
                {"url": "https://i.pinimg.com/originals/b.jpg"},
                {"url": "https://i.pinimg.com/originals/c.jpg"},
            ]))
            .await
            .unwrap();

        assert_eq!(report.admitted, 2);
        assert_eq!(cache.len().await, 2);
        assert!(cache.is_loaded().await.unwrap());
        assert_eq!(rx.recv().await.unwrap(), Event::CacheInvalidated);
    }

    #[tokio::test]
    async fn test_reload_from_missing_file_keeps_collection() {
        let (cache, _) = store().await;
        cache
            .bootstrap(&json!([{"url": "https://i.pinimg.com/originals/a.jpg"}]))
            .await
            .unwrap();

        let result = cache.reload_from_path("/nonexistent/pinwall/cache.json").await;

        assert!(matches!(result, Err(CacheError::Read { .. })));
        assert!(cache.is_loaded().await.unwrap());
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn test_open_ignores_unflagged_collection() {
        let storage = Storage::in_memory();
        storage
            .set(keys::CACHE, &vec![Record::new("https://i.pinimg.com/originals/a.jpg")])
            .await
            .unwrap();

        let cache = CacheStore::open(storage, UrlValidator::default(), EventBus::default())
            .await
            .unwrap();

        assert!(!cache.is_loaded().await.unwrap());
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_non_array_document() {
        let (cache, _) = store().await;
        let result = cache.bootstrap(&json!({"url": "x"})).await;
        assert!(matches!(result, Err(CacheError::NotAnArray("object"))));
    }

    #[tokio::test]
    async fn test_flag_without_collection_is_not_loaded() {
        let (cache, storage) = store().await;
        storage.set(keys::CACHE_LOADED, &true).await.unwrap();
        assert!(!cache.is_loaded().await.unwrap());

        storage.set(keys::CACHE, &Vec::<Record>::new()).await.unwrap();
        assert!(!cache.is_loaded().await.unwrap());
    }

    #[tokio::test]
    async fn test_invalidate_publishes_event() {
        let (cache, storage) = store().await;
        let mut rx = cache.bus.subscribe();
        cache
            .bootstrap(&json!([{"url": "https://i.pinimg.com/originals/a.jpg"}]))
            .await
            .unwrap();

        cache.invalidate().await.unwrap();

        assert!(!cache.is_loaded().await.unwrap());
        assert!(cache.is_empty().await);
        let persisted: Option<Vec<Record>> = storage.get(keys::CACHE).await.unwrap();
        assert!(persisted.is_none());
        assert_eq!(rx.recv().await.unwrap(), Event::CacheInvalidated);
    }

    #[tokio::test]
    async fn test_version_change_invalidates_once() {
        let (cache, _) = store().await;
        cache
            .bootstrap(&json!([{"url": "https://i.pinimg.com/originals/a.jpg"}]))
            .await
            .unwrap();

        assert!(cache.invalidate_if_version_changed("1.2.0").await.unwrap());
        assert!(!cache.is_loaded().await.unwrap());

        cache
            .bootstrap(&json!([{"url": "https://i.pinimg.com/originals/a.jpg"}]))
            .await
            .unwrap();
        assert!(!cache.invalidate_if_version_changed("1.2.0").await.unwrap());
        assert!(cache.is_loaded().await.unwrap());
    }

    #[tokio::test]
    async fn test_ensure_loaded_is_idempotent() {
        let (cache, _) = store().await;
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("cache.json");
        std::fs::write(
            &path,
            r#"[{"media": "https://i.pinimg.com/originals/a.jpg", "title": "A"}]"#,
        )
        .unwrap();

        let first = cache.ensure_loaded(&path).await.unwrap();
        assert_eq!(first.map(|r| r.admitted), Some(1));

        let second = cache.ensure_loaded(&path).await.unwrap();
        assert!(second.is_none());
    }

    #[tokio::test]
    async fn test_open_restores_persisted_records() {
        let storage = Storage::in_memory();
        {
            let cache = CacheStore::open(storage.clone(), UrlValidator::default(), EventBus::default())
                .await
                .unwrap();
            cache
                .bootstrap(&json!([{"url": "https://i.pinimg.com/originals/a.jpg"}]))
                .await
                .unwrap();
        }

        let reopened = CacheStore::open(storage, UrlValidator::default(), EventBus::default())
            .await
            .unwrap();
        assert_eq!(reopened.len().await, 1);
    }

    #[tokio::test]
    async fn test_missing_bootstrap_file() {
        let (cache, _) = store().await;
        let result = cache.bootstrap_from_path("/nonexistent/pinwall/cache.json").await;
        assert!(matches!(result, Err(CacheError::Read { .. })));
    }
}
