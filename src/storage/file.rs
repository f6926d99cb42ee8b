//! File-backed key-value store
//!
//! Each document lives in `<dir>/<key>.json`. Writes go to a temporary
//! sibling first and are renamed into place, so a reader never observes a
//! half-written document.

use async_trait::async_trait;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

use super::{KvStore, StorageError, StorageResult};

/// Directory of JSON documents
#[derive(Debug)]
pub struct FileStore {
    dir: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStore {
    /// Open (and create if needed) a store rooted at `dir`
    pub async fn open(dir: impl Into<PathBuf>) -> StorageResult<Self> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|source| StorageError::Io {
                operation: "create_dir",
                key: dir.display().to_string(),
                source,
            })?;

        tracing::debug!(dir = %dir.display(), "Opened file store");

        Ok(Self {
            dir,
            write_lock: Mutex::new(()),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn document_path(&self, key: &str) -> StorageResult<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }

    async fn write_document(&self, key: &str, value: &Value) -> StorageResult<()> {
        let path = self.document_path(key)?;
        let tmp = path.with_extension("json.tmp");

        let bytes = serde_json::to_vec_pretty(value).map_err(|source| StorageError::Json {
            key: key.to_string(),
            source,
        })?;

        tokio::fs::write(&tmp, bytes)
            .await
            .map_err(|source| StorageError::Io {
                operation: "write",
                key: key.to_string(),
                source,
            })?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|source| StorageError::Io {
                operation: "rename",
                key: key.to_string(),
                source,
            })?;

        Ok(())
    }
}

#[async_trait]
impl KvStore for FileStore {
    fn name(&self) -> &str {
        "file"
    }

    async fn get(&self, key: &str) -> StorageResult<Option<Value>> {
        let path = self.document_path(key)?;

        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(StorageError::Io {
                    operation: "read",
                    key: key.to_string(),
                    source,
                })
            }
        };

        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|source| StorageError::Json {
                key: key.to_string(),
                source,
            })
    }

    async fn set_many(&self, entries: Vec<(String, Value)>) -> StorageResult<()> {
        let _guard = self.write_lock.lock().await;
        for (key, value) in &entries {
            self.write_document(key, value).await?;
        }
        Ok(())
    }

    async fn remove(&self, keys: &[&str]) -> StorageResult<()> {
        let _guard = self.write_lock.lock().await;
        for key in keys {
            let path = self.document_path(key)?;
            match tokio::fs::remove_file(&path).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(source) => {
                    return Err(StorageError::Io {
                        operation: "remove",
                        key: key.to_string(),
                        source,
                    })
                }
            }
        }
        Ok(())
    }
}
