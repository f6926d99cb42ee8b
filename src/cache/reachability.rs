//! Reachability pruning for bootstrap documents
//!
//! Scraped CDN links expire. Before a document is shipped as the bootstrap
//! collection, every entry's resource is fetched and entries that no longer
//! load are dropped. Surviving entries keep their original JSON shape and
//! document order.

use futures::stream::{self, StreamExt};
use serde_json::Value;
use std::path::{Path, PathBuf};

use crate::normalizer::normalize;
use crate::render::{LoadError, MediaLoader};

/// Default number of resources checked at once
pub const DEFAULT_CONCURRENCY: usize = 10;

/// Outcome of pruning one document
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Pruned {
    /// Entries whose resource loaded, in document order
    pub entries: Vec<Value>,
    /// Entries whose resource failed to load
    pub unreachable: usize,
    /// Entries with no resource to check
    pub missing_resource: usize,
}

impl Pruned {
    pub fn removed(&self) -> usize {
        self.unreachable + self.missing_resource
    }
}

/// Check every entry with `loader` and keep those that load
///
/// At most `concurrency` requests are in flight.
pub async fn prune_unreachable<L>(entries: &[Value], loader: &L, concurrency: usize) -> Pruned
where
    L: MediaLoader + ?Sized,
{
    let mut pruned = Pruned::default();
    let mut checks = Vec::with_capacity(entries.len());

    for (position, entry) in entries.iter().enumerate() {
        match normalize(entry, position) {
            Ok(record) => checks.push((position, record)),
            Err(e) => {
                tracing::debug!(error = %e, "Dropping entry without resource");
                pruned.missing_resource += 1;
            }
        }
    }

    let mut results: Vec<(usize, Result<(), LoadError>)> = stream::iter(checks)
        .map(|(position, record)| async move { (position, loader.load(&record).await) })
        .buffer_unordered(concurrency.max(1))
        .collect()
        .await;
    results.sort_by_key(|(position, _)| *position);

    for (position, result) in results {
        match result {
            Ok(()) => pruned.entries.push(entries[position].clone()),
            Err(e) => {
                tracing::info!(position, error = %e, "Unreachable entry");
                pruned.unreachable += 1;
            }
        }
    }

    tracing::info!(
        kept = pruned.entries.len(),
        unreachable = pruned.unreachable,
        missing_resource = pruned.missing_resource,
        "Reachability check complete"
    );

    pruned
}

/// Sibling path an original document is copied to before it is rewritten
///
/// `data/pinterest_cache.json` becomes `data/pinterest_cache_backup.json`.
pub fn backup_path(path: &Path) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match path.extension() {
        Some(ext) => format!("{stem}_backup.{}", ext.to_string_lossy()),
        None => format!("{stem}_backup"),
    };
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Record;
    use crate::render::HttpMediaLoader;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Tracks the peak number of overlapping loads
    struct SlowLoader {
        active: AtomicUsize,
        peak: AtomicUsize,
    }

    #[async_trait]
    impl MediaLoader for SlowLoader {
        async fn load(&self, _record: &Record) -> Result<(), LoadError> {
            let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(10)).await;
            self.active.fetch_sub(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_live_entries_kept_dead_entries_dropped() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/live.jpg"))
            .respond_with(ResponseTemplate::new(200).insert_header("content-type", "image/jpeg"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/dead.jpg"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let live = json!({"media": format!("{}/live.jpg", server.uri()), "title": "Live"});
        let entries = vec![
            json!({"url": format!("{}/dead.jpg", server.uri())}),
            json!({"title": "no resource"}),
            live.clone(),
        ];
        let loader = HttpMediaLoader::new(Duration::from_secs(5))
            .unwrap()
            .require_media_type();

        let pruned = prune_unreachable(&entries, &loader, DEFAULT_CONCURRENCY).await;

        assert_eq!(pruned.entries, vec![live]);
        assert_eq!(pruned.unreachable, 1);
        assert_eq!(pruned.missing_resource, 1);
        assert_eq!(pruned.removed(), 2);
    }

    #[test]
    fn test_backup_path() {
        assert_eq!(
            backup_path(Path::new("extension/data/pinterest_cache.json")),
            PathBuf::from("extension/data/pinterest_cache_backup.json")
        );
        assert_eq!(backup_path(Path::new("cache")), PathBuf::from("cache_backup"));
    }

    #[tokio::test]
    async fn test_order_kept_and_concurrency_bounded() {
        let entries: Vec<Value> = (0..12)
            .map(|i| json!({"url": format!("https://i.pinimg.com/originals/{i}.jpg")}))
            .collect();
        let loader = SlowLoader {
            active: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        };

        let pruned = prune_unreachable(&entries, &loader, 3).await;

        assert_eq!(pruned.entries, entries);
        assert!(loader.peak.load(Ordering::SeqCst) <= 3);
    }
}
