//! Application context
//!
//! Every shared component is built once here and handed out by `Arc`, so
//! nothing in the crate needs process-wide state.

use std::sync::Arc;
use tokio::task::JoinHandle;

use crate::cache::{BootstrapReport, CacheStore};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::favorites::FavoritesSet;
use crate::messages::{Dispatcher, DispatcherHandle};
use crate::normalizer::UrlValidator;
use crate::notifications::{EventBus, StaticTheme, ThemePublisher};
use crate::scheduler::{RotationScheduler, Selector};
use crate::storage::{FileStore, Preferences, Storage};

/// Accent color published when no sampler is wired in
pub const DEFAULT_ACCENT_COLOR: &str = "#2d2a32";

/// Wired-up core components
pub struct App {
    pub config: Config,
    pub storage: Storage,
    pub bus: EventBus,
    pub cache: Arc<CacheStore>,
    pub selector: Arc<Selector>,
    pub scheduler: Arc<RotationScheduler>,
    pub favorites: Arc<FavoritesSet>,
    pub preferences: Preferences,
    pub theme: ThemePublisher,
}

impl App {
    /// Open the configured storage backend and build every component
    pub async fn open(config: Config) -> Result<Self> {
        let storage = if config.storage.in_memory {
            Storage::in_memory()
        } else {
            Storage::new(Arc::new(FileStore::open(&config.storage.data_dir).await?))
        };
        Self::with_storage(config, storage).await
    }

    /// Build every component on top of an existing storage handle
    pub async fn with_storage(config: Config, storage: Storage) -> Result<Self> {
        let validator = UrlValidator::new(&config.cache.media_host_pattern)
            .map_err(|e| Error::with_source("Invalid media host pattern", e))?;
        let bus = EventBus::default();

        let cache = Arc::new(CacheStore::open(storage.clone(), validator, bus.clone()).await?);
        let selector = Arc::new(Selector::new(Arc::clone(&cache), storage.clone(), bus.clone()));
        let scheduler = Arc::new(
            RotationScheduler::open_with_defaults(
                Arc::clone(&selector),
                storage.clone(),
                bus.clone(),
                config.rotation.settings(),
            )
            .await?,
        );
        let favorites = Arc::new(FavoritesSet::new(storage.clone()));
        let preferences = Preferences::new(storage.clone());
        let theme = ThemePublisher::new(Arc::new(StaticTheme::new(DEFAULT_ACCENT_COLOR)), bus.clone());

        tracing::debug!(backend = storage.backend_name(), "Application context ready");

        Ok(Self {
            config,
            storage,
            bus,
            cache,
            selector,
            scheduler,
            favorites,
            preferences,
            theme,
        })
    }

    /// Drop a cache written by another version, then load the bootstrap
    /// document if nothing usable is persisted
    ///
    /// Returns `None` when the persisted cache was reused.
    pub async fn prepare(&self) -> Result<Option<BootstrapReport>> {
        self.cache
            .invalidate_if_version_changed(&self.config.cache.extension_version)
            .await?;
        Ok(self.cache.ensure_loaded(&self.config.cache.bootstrap_path).await?)
    }

    /// Start the command dispatcher over this context's components
    pub fn dispatcher(&self) -> (DispatcherHandle, JoinHandle<()>) {
        Dispatcher::spawn(
            Arc::clone(&self.selector),
            Arc::clone(&self.scheduler),
            Arc::clone(&self.favorites),
            self.theme.clone(),
        )
    }

    /// Stop background work owned by the context
    pub async fn shutdown(&self) {
        self.scheduler.stop().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheError;
    use crate::notifications::Event;
    use serde_json::json;
    use tempfile::TempDir;

    fn config_with_bootstrap(dir: &TempDir, document: serde_json::Value) -> Config {
        let path = dir.path().join("bootstrap.json");
        std::fs::write(&path, serde_json::to_vec(&document).unwrap()).unwrap();

        let mut config = Config::default();
        config.storage.in_memory = true;
        config.cache.bootstrap_path = path;
        config
    }

    #[tokio::test]
    async fn test_prepare_bootstraps_once() {
        let dir = TempDir::new().unwrap();
        let config = config_with_bootstrap(
            &dir,
            json!([{"url": "https://i.pinimg.com/originals/a.jpg"}]),
        );
        let app = App::open(config).await.unwrap();

        let report = app.prepare().await.unwrap().unwrap();
        assert_eq!(report.admitted, 1);
        assert!(app.prepare().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_prepare_reloads_after_version_change() {
        let dir = TempDir::new().unwrap();
        let config = config_with_bootstrap(
            &dir,
            json!([{"url": "https://i.pinimg.com/originals/a.jpg"}]),
        );
        let storage = Storage::in_memory();

        let first = App::with_storage(config.clone(), storage.clone()).await.unwrap();
        first.prepare().await.unwrap();

        let mut upgraded = config;
        upgraded.cache.extension_version = "99.0.0".to_string();
        let second = App::with_storage(upgraded, storage).await.unwrap();
        let mut rx = second.bus.subscribe();

        assert!(second.prepare().await.unwrap().is_some());
        assert_eq!(rx.recv().await.unwrap(), Event::CacheInvalidated);
    }

    #[tokio::test]
    async fn test_prepare_empty_bootstrap() {
        let dir = TempDir::new().unwrap();
        let config = config_with_bootstrap(&dir, json!([{"url": "blob:https://x/1"}]));
        let app = App::open(config).await.unwrap();

        let err = app.prepare().await.unwrap_err();
        assert!(matches!(err, Error::Cache(CacheError::EmptyCache { .. })));
        assert!(!app.cache.is_loaded().await.unwrap());
    }

    #[tokio::test]
    async fn test_dispatcher_round_trip() {
        let dir = TempDir::new().unwrap();
        let config = config_with_bootstrap(
            &dir,
            json!([{"media": "https://i.pinimg.com/originals/a.jpg", "title": "A"}]),
        );
        let app = App::open(config).await.unwrap();
        app.prepare().await.unwrap();

        let (handle, _task) = app.dispatcher();
        let selection = handle.next_image().await.unwrap();

        assert_eq!(selection.record.title, "A");
        app.shutdown().await;
    }

    #[tokio::test]
    async fn test_invalid_host_pattern() {
        let mut config = Config::default();
        config.storage.in_memory = true;
        config.cache.media_host_pattern = "(".to_string();

        assert!(App::open(config).await.is_err());
    }
}
