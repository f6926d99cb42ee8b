//! Integration tests for bootstrap, selection and favorites
//!
//! These tests verify the complete workflow of:
//! - Bootstrapping the cache from raw documents
//! - Random selection and current-selection persistence
//! - Favorites toggling across reopened stores
//! - Persistence through the file backend

mod common;

use std::collections::HashSet;
use std::sync::Arc;

use common::{canonical_entries, cdn_url, Fixture};
use pinwall::cache::{BootstrapReport, CacheError};
use pinwall::models::Record;
use pinwall::notifications::Event;
use pinwall::scheduler::SelectorError;
use pinwall::storage::{keys, FileStore, Storage};
use serde_json::json;
use tempfile::TempDir;

// ============================================================================
// Bootstrap
// ============================================================================

#[tokio::test]
async fn test_all_invalid_bootstrap_is_empty_cache() {
    let fixture = Fixture::new().await;

    let result = fixture.cache.bootstrap(&json!([{"url": "blob:abc"}])).await;

    assert!(matches!(
        result,
        Err(CacheError::EmptyCache {
            missing_resource: 0,
            rejected: 1
        })
    ));
    assert!(!fixture.cache.is_loaded().await.unwrap());
    assert!(fixture.cache.is_empty().await);
}

#[tokio::test]
async fn test_valid_and_invalid_keeps_valid_in_order() {
    let fixture = Fixture::new().await;
    let document = json!([
        {"url": cdn_url("n1")},
        {"url": "blob:https://www.pinterest.com/x"},
        {"media": cdn_url("n2"), "title": "second"},
        {"title": "no resource at all"},
        {"url": "https://i.pinimg.com/236x/thumb.txt"},
        {"url": cdn_url("n3")},
    ]);

    let report = fixture.cache.bootstrap(&document).await.unwrap();

    assert_eq!(
        report,
        Some(BootstrapReport {
            admitted: 3,
            missing_resource: 1,
            rejected: 2
        })
    );
    let urls: Vec<_> = fixture.cache.records().await.iter().map(|r| r.url.clone()).collect();
    assert_eq!(urls, vec![cdn_url("n1"), cdn_url("n2"), cdn_url("n3")]);
    assert!(fixture.cache.is_loaded().await.unwrap());
}

#[tokio::test]
async fn test_failed_bootstrap_keeps_previous_collection() {
    let fixture = Fixture::new().await;
    fixture.cache.bootstrap(&canonical_entries(&["keep"])).await.unwrap();

    let result = fixture.cache.reload(&json!([{"url": "data:image/png;base64,AAAA"}])).await;

    assert!(matches!(result, Err(CacheError::EmptyCache { .. })));
    assert_eq!(fixture.cache.len().await, 1);
    assert!(fixture.cache.is_loaded().await.unwrap());
}

#[tokio::test]
async fn test_second_bootstrap_is_skipped() {
    let fixture = Fixture::new().await;
    fixture.cache.bootstrap(&canonical_entries(&["a"])).await.unwrap();

    let skipped = fixture.cache.bootstrap(&canonical_entries(&["b", "c"])).await.unwrap();

    assert!(skipped.is_none());
    assert_eq!(fixture.cache.len().await, 1);
}

#[tokio::test]
async fn test_invalidate_then_bootstrap_replaces_whole_collection() {
    let fixture = Fixture::new().await;
    fixture.cache.bootstrap(&canonical_entries(&["a", "b", "c"])).await.unwrap();

    fixture.cache.invalidate().await.unwrap();
    assert!(!fixture.cache.is_loaded().await.unwrap());

    let report = fixture.cache.bootstrap(&canonical_entries(&["z"])).await.unwrap();
    assert_eq!(report.map(|r| r.admitted), Some(1));
    let records = fixture.cache.records().await;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].url, cdn_url("z"));
}

#[tokio::test]
async fn test_reload_replaces_loaded_collection() {
    let fixture = Fixture::new().await;
    fixture.cache.bootstrap(&canonical_entries(&["a", "b", "c"])).await.unwrap();

    fixture.cache.reload(&canonical_entries(&["z"])).await.unwrap();

    let records = fixture.cache.records().await;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].url, cdn_url("z"));
}

#[tokio::test]
async fn test_unflagged_collection_not_restored_on_reopen() {
    let storage = Storage::in_memory();
    storage.set(keys::CACHE, &vec![Record::new(cdn_url("stale"))]).await.unwrap();

    let fixture = Fixture::with_storage(storage).await;

    assert!(!fixture.cache.is_loaded().await.unwrap());
    assert!(matches!(fixture.selector.pick_random().await, Err(SelectorError::NoRecords)));
}

// ============================================================================
// Selection
// ============================================================================

#[tokio::test]
async fn test_pick_random_index_in_bounds() {
    let fixture = Fixture::new().await;
    let names: Vec<String> = (0..7).map(|i| format!("img{i}")).collect();
    let names: Vec<&str> = names.iter().map(String::as_str).collect();
    fixture.cache.bootstrap(&canonical_entries(&names)).await.unwrap();
    let records = fixture.cache.records().await;

    let mut seen = HashSet::new();
    for _ in 0..200 {
        let selection = fixture.selector.pick_random().await.unwrap();
        assert!(selection.index < records.len());
        assert_eq!(selection.record, records[selection.index]);
        seen.insert(selection.index);
    }

    // Uniform draws over 200 picks reach every one of 7 slots
    assert_eq!(seen.len(), 7);
}

#[tokio::test]
async fn test_pick_random_on_empty_store() {
    let fixture = Fixture::new().await;

    let result = fixture.selector.pick_random().await;

    assert!(matches!(result, Err(SelectorError::NoRecords)));
    assert!(fixture.selector.current().await.unwrap().is_none());
}

#[tokio::test]
async fn test_selection_persisted_and_announced() {
    let fixture = Fixture::new().await;
    fixture.cache.bootstrap(&canonical_entries(&["only"])).await.unwrap();
    let mut rx = fixture.bus.subscribe();

    let selection = fixture.selector.pick_random().await.unwrap();

    assert_eq!(rx.recv().await.unwrap(), Event::WallpaperChanged(selection.record.clone()));
    let stored: Record = fixture.storage.get(keys::CURRENT_ITEM).await.unwrap().unwrap();
    assert_eq!(stored, selection.record);
    assert_eq!(fixture.storage.get::<usize>(keys::CURRENT_INDEX).await.unwrap(), Some(0));

    let current = fixture.selector.current().await.unwrap().unwrap();
    assert_eq!(current.record, selection.record);
    assert_eq!(current.selected_at.timestamp_millis(), selection.selected_at.timestamp_millis());
}

// ============================================================================
// Favorites
// ============================================================================

#[tokio::test]
async fn test_double_toggle_leaves_set_empty() {
    let fixture = Fixture::new().await;
    let record = Record::new(cdn_url("fav"));

    assert!(fixture.favorites.toggle(record.clone()).await.unwrap().added);
    assert!(!fixture.favorites.toggle(record).await.unwrap().added);
    assert!(fixture.favorites.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_favorites_independent_of_cache() {
    let fixture = Fixture::new().await;
    fixture.cache.bootstrap(&canonical_entries(&["a"])).await.unwrap();
    fixture.favorites.toggle(Record::new(cdn_url("a"))).await.unwrap();

    fixture.cache.invalidate().await.unwrap();

    assert_eq!(fixture.favorites.list().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_padded_url_matches_favorite() {
    let fixture = Fixture::new().await;
    let padded = format!("  {} ", cdn_url("padded"));
    fixture.cache.bootstrap(&json!([{"url": padded}])).await.unwrap();

    let selection = fixture.selector.pick_random().await.unwrap();
    assert_eq!(selection.record.url, cdn_url("padded"));

    fixture.favorites.toggle(Record::new(cdn_url("padded"))).await.unwrap();
    assert!(fixture.favorites.contains(&selection.record.url).await.unwrap());
}

#[tokio::test]
async fn test_concurrent_toggles_of_same_record() {
    let fixture = Fixture::new().await;
    let record = Record::new(cdn_url("same"));

    let handles: Vec<_> = (0..10)
        .map(|_| {
            let favorites = Arc::clone(&fixture.favorites);
            let record = record.clone();
            tokio::spawn(async move { favorites.toggle(record).await })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    // Ten serialized toggles alternate add/remove and end removed
    assert!(fixture.favorites.list().await.unwrap().is_empty());
}

// ============================================================================
// File Backend
// ============================================================================

#[tokio::test]
async fn test_state_survives_reopen_on_disk() {
    let dir = TempDir::new().unwrap();

    {
        let storage = Storage::new(Arc::new(FileStore::open(dir.path()).await.unwrap()));
        let fixture = Fixture::with_storage(storage).await;
        fixture.cache.bootstrap(&canonical_entries(&["a", "b"])).await.unwrap();
        fixture.selector.pick_random().await.unwrap();
        fixture.favorites.toggle(Record::new(cdn_url("a"))).await.unwrap();
        fixture.scheduler.reconfigure(30, false).await.unwrap();
        fixture.scheduler.stop().await;
    }

    let storage = Storage::new(Arc::new(FileStore::open(dir.path()).await.unwrap()));
    let reopened = Fixture::with_storage(storage).await;

    assert!(reopened.cache.is_loaded().await.unwrap());
    assert_eq!(reopened.cache.len().await, 2);
    assert!(reopened.selector.current().await.unwrap().is_some());
    assert_eq!(reopened.favorites.list().await.unwrap().len(), 1);
    let settings = reopened.scheduler.settings().await;
    assert_eq!((settings.interval_minutes, settings.enabled), (30, false));
    assert!(dir.path().join("pinterestCache.json").exists());
}
