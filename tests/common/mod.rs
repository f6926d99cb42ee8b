//! Common test utilities

use std::sync::Arc;

use pinwall::cache::CacheStore;
use pinwall::favorites::FavoritesSet;
use pinwall::normalizer::UrlValidator;
use pinwall::notifications::EventBus;
use pinwall::scheduler::{RotationScheduler, Selector};
use pinwall::storage::Storage;
use serde_json::{json, Value};

/// Original-quality CDN URL for a short name
pub fn cdn_url(name: &str) -> String {
    format!("https://i.pinimg.com/originals/{name}.jpg")
}

/// Canonical-shape raw entries for the given names
pub fn canonical_entries(names: &[&str]) -> Value {
    Value::Array(names.iter().map(|n| json!({"url": cdn_url(n)})).collect())
}

/// Components sharing one in-memory storage
pub struct Fixture {
    pub storage: Storage,
    pub bus: EventBus,
    pub cache: Arc<CacheStore>,
    pub selector: Arc<Selector>,
    pub scheduler: Arc<RotationScheduler>,
    pub favorites: Arc<FavoritesSet>,
}

impl Fixture {
    pub async fn new() -> Self {
        Self::with_storage(Storage::in_memory()).await
    }

    pub async fn with_storage(storage: Storage) -> Self {
        let bus = EventBus::default();
        let cache = Arc::new(
            CacheStore::open(storage.clone(), UrlValidator::default(), bus.clone())
                .await
                .unwrap(),
        );
        let selector = Arc::new(Selector::with_seed(
            Arc::clone(&cache),
            storage.clone(),
            bus.clone(),
            42,
        ));
        let scheduler = Arc::new(
            RotationScheduler::open(Arc::clone(&selector), storage.clone(), bus.clone())
                .await
                .unwrap(),
        );
        let favorites = Arc::new(FavoritesSet::new(storage.clone()));

        Self {
            storage,
            bus,
            cache,
            selector,
            scheduler,
            favorites,
        }
    }
}
