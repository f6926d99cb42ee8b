//! User-curated favorites
//!
//! An ordered list of records persisted under `favorites`. Membership is by
//! resource URL only. Every read-modify-write of the list happens under one
//! lock, so concurrent toggles never lose an update or double-add a record.

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::models::Record;
use crate::storage::{keys, Storage, StorageError};

/// Result type for favorites operations
pub type FavoritesResult<T> = Result<T, FavoritesError>;

/// Errors from the favorites set
#[derive(Debug, thiserror::Error)]
pub enum FavoritesError {
    #[error("Favorite index {index} out of range (have {len})")]
    IndexOutOfRange { index: usize, len: usize },

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Result of a toggle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToggleOutcome {
    /// True when the record was added, false when it was removed
    pub added: bool,
}

/// Persisted favorites list
pub struct FavoritesSet {
    storage: Storage,
    lock: Mutex<()>,
}

impl FavoritesSet {
    pub fn new(storage: Storage) -> Self {
        Self {
            storage,
            lock: Mutex::new(()),
        }
    }

    async fn load(&self) -> FavoritesResult<Vec<Record>> {
        Ok(self.storage.get(keys::FAVORITES).await?.unwrap_or_default())
    }

    async fn save(&self, favorites: &[Record]) -> FavoritesResult<()> {
        self.storage.set(keys::FAVORITES, &favorites).await?;
        Ok(())
    }

    /// Remove the record if a favorite shares its URL, otherwise append it
    pub async fn toggle(&self, record: Record) -> FavoritesResult<ToggleOutcome> {
        let _guard = self.lock.lock().await;
        let mut favorites = self.load().await?;

        let added = match favorites.iter().position(|f| f.same_resource(&record)) {
            Some(pos) => {
                favorites.remove(pos);
                false
            }
            None => {
                favorites.push(record);
                true
            }
        };

        self.save(&favorites).await?;
        tracing::info!(added, count = favorites.len(), "Favorite toggled");

        Ok(ToggleOutcome { added })
    }

    /// All favorites in insertion order
    pub async fn list(&self) -> FavoritesResult<Vec<Record>> {
        self.load().await
    }

    /// Remove and return the favorite at `index`
    pub async fn remove(&self, index: usize) -> FavoritesResult<Record> {
        let _guard = self.lock.lock().await;
        let mut favorites = self.load().await?;

        if index >= favorites.len() {
            return Err(FavoritesError::IndexOutOfRange {
                index,
                len: favorites.len(),
            });
        }

        let removed = favorites.remove(index);
        self.save(&favorites).await?;
        tracing::info!(index, url = %removed.url, "Favorite removed");

        Ok(removed)
    }

    pub async fn contains(&self, url: &str) -> FavoritesResult<bool> {
        Ok(self.load().await?.iter().any(|f| f.url == url))
    }
}
