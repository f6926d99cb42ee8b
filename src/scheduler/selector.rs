//! Random wallpaper selection
//!
//! Draws a uniformly random record from the cache, persists it as the
//! current selection and announces it on the bus. Draw, persist and publish
//! happen under one lock, so observers always hear about selections in the
//! order they were persisted.

use chrono::{DateTime, Utc};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::Mutex;

use super::error::{SelectorError, SelectorResult};
use crate::cache::CacheStore;
use crate::models::{Record, Selection};
use crate::notifications::{Event, EventBus};
use crate::storage::{encode, keys, Storage};

/// Picks and persists the current wallpaper
pub struct Selector {
    cache: Arc<CacheStore>,
    storage: Storage,
    bus: EventBus,
    rng: Mutex<ChaCha8Rng>,
}

impl Selector {
    /// Create a selector seeded from OS entropy
    pub fn new(cache: Arc<CacheStore>, storage: Storage, bus: EventBus) -> Self {
        Self::with_rng(cache, storage, bus, ChaCha8Rng::from_entropy())
    }

    /// Create a selector with a fixed seed for reproducible draws
    pub fn with_seed(cache: Arc<CacheStore>, storage: Storage, bus: EventBus, seed: u64) -> Self {
        Self::with_rng(cache, storage, bus, ChaCha8Rng::seed_from_u64(seed))
    }

    fn with_rng(cache: Arc<CacheStore>, storage: Storage, bus: EventBus, rng: ChaCha8Rng) -> Self {
        Self {
            cache,
            storage,
            bus,
            rng: Mutex::new(rng),
        }
    }

    /// Draw a random record and make it the current selection
    pub async fn pick_random(&self) -> SelectorResult<Selection> {
        let mut rng = self.rng.lock().await;

        let records = self.cache.records().await;
        if records.is_empty() {
            return Err(SelectorError::NoRecords);
        }

        let index = rng.gen_range(0..records.len());
        let selection = Selection::new(records[index].clone(), index);

        self.storage
            .set_values(vec![
                (keys::CURRENT_ITEM, encode(keys::CURRENT_ITEM, &selection.record)?),
                (keys::CURRENT_INDEX, Value::from(selection.index)),
                (
                    keys::LAST_UPDATED,
                    Value::from(selection.selected_at.timestamp_millis()),
                ),
            ])
            .await?;

        tracing::info!(
            index,
            total = records.len(),
            kind = %selection.record.media_kind,
            url = %selection.record.url,
            "Wallpaper selected"
        );

        self.bus.publish(Event::WallpaperChanged(selection.record.clone()));

        Ok(selection)
    }

    /// Read the persisted selection without changing it
    pub async fn current(&self) -> SelectorResult<Option<Selection>> {
        let Some(record) = self.storage.get::<Record>(keys::CURRENT_ITEM).await? else {
            return Ok(None);
        };
        let index: usize = self.storage.get(keys::CURRENT_INDEX).await?.unwrap_or(0);
        let millis: Option<i64> = self.storage.get(keys::LAST_UPDATED).await?;
        let selected_at = millis
            .and_then(DateTime::<Utc>::from_timestamp_millis)
            .unwrap_or_default();

        Ok(Some(Selection {
            record,
            index,
            selected_at,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalizer::UrlValidator;
    use serde_json::json;

    async fn selector_with(urls: &[&str], seed: u64) -> (Selector, Storage, EventBus) {
        let storage = Storage::in_memory();
        let bus = EventBus::default();
        let cache = CacheStore::open(storage.clone(), UrlValidator::default(), bus.clone())
            .await
            .unwrap();
        if !urls.is_empty() {
            let doc: Vec<Value> = urls.iter().map(|u| json!({ "url": u })).collect();
            cache.bootstrap(&Value::Array(doc)).await.unwrap();
        }
        let selector = Selector::with_seed(Arc::new(cache), storage.clone(), bus.clone(), seed);
        (selector, storage, bus)
    }

    #[tokio::test]
    async fn test_empty_cache_yields_no_records() {
        let (selector, storage, _) = selector_with(&[], 1).await;

        assert!(matches!(selector.pick_random().await, Err(SelectorError::NoRecords)));
        assert!(selector.current().await.unwrap().is_none());
        let item: Option<Record> = storage.get(keys::CURRENT_ITEM).await.unwrap();
        assert!(item.is_none());
    }

    #[tokio::test]
    async fn test_unloaded_cache_is_not_served() {
        let storage = Storage::in_memory();
        storage
            .set(keys::CACHE, &vec![Record::new("https://i.pinimg.com/originals/stale.jpg")])
            .await
            .unwrap();
        let cache = CacheStore::open(storage.clone(), UrlValidator::default(), EventBus::default())
            .await
            .unwrap();
        assert!(!cache.is_loaded().await.unwrap());

        let selector = Selector::with_seed(Arc::new(cache), storage, EventBus::default(), 1);

        assert!(matches!(selector.pick_random().await, Err(SelectorError::NoRecords)));
    }

    #[tokio::test]
    async fn test_single_record_always_selected() {
        let (selector, _, _) = selector_with(&["https://i.pinimg.com/originals/only.jpg"], 7).await;

        for _ in 0..5 {
            let selection = selector.pick_random().await.unwrap();
            assert_eq!(selection.index, 0);
            assert_eq!(selection.record.url, "https://i.pinimg.com/originals/only.jpg");
        }
    }

    #[tokio::test]
    async fn test_index_in_bounds_and_persisted() {
        let urls = [
            "https://i.pinimg.com/originals/0.jpg",
            "https://i.pinimg.com/originals/1.jpg",
            "https://i.pinimg.com/originals/2.jpg",
        ];
        let (selector, storage, _) = selector_with(&urls, 42).await;

        for _ in 0..20 {
            let selection = selector.pick_random().await.unwrap();
            assert!(selection.index < urls.len());
            assert_eq!(selection.record.url, urls[selection.index]);

            let index: Option<usize> = storage.get(keys::CURRENT_INDEX).await.unwrap();
            assert_eq!(index, Some(selection.index));
        }
    }

    #[tokio::test]
    async fn test_same_seed_same_sequence() {
        let urls = [
            "https://i.pinimg.com/originals/0.jpg",
            "https://i.pinimg.com/originals/1.jpg",
            "https://i.pinimg.com/originals/2.jpg",
            "https://i.pinimg.com/originals/3.jpg",
        ];
        let (a, _, _) = selector_with(&urls, 99).await;
        let (b, _, _) = selector_with(&urls, 99).await;

        for _ in 0..10 {
            assert_eq!(
                a.pick_random().await.unwrap().index,
                b.pick_random().await.unwrap().index
            );
        }
    }

    #[tokio::test]
    async fn test_current_reads_back_selection() {
        let (selector, _, _) = selector_with(&["https://i.pinimg.com/originals/a.mp4"], 3).await;

        let picked = selector.pick_random().await.unwrap();
        let current = selector.current().await.unwrap().unwrap();

        assert_eq!(current.record, picked.record);
        assert_eq!(current.index, picked.index);
        assert_eq!(
            current.selected_at.timestamp_millis(),
            picked.selected_at.timestamp_millis()
        );
    }

    #[tokio::test]
    async fn test_notification_follows_persisted_selection() {
        let (selector, _, bus) = selector_with(
            &[
                "https://i.pinimg.com/originals/0.jpg",
                "https://i.pinimg.com/originals/1.jpg",
            ],
            5,
        )
        .await;
        let mut rx = bus.subscribe();

        let selection = selector.pick_random().await.unwrap();

        assert_eq!(rx.recv().await.unwrap(), Event::WallpaperChanged(selection.record));
    }
}
