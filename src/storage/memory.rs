//! In-memory key-value backend

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::{KvStore, StorageResult};

/// Process-local document map
#[derive(Debug, Default)]
pub struct MemoryStore {
    documents: RwLock<HashMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored documents
    pub async fn len(&self) -> usize {
        self.documents.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.documents.read().await.is_empty()
    }
}

#[async_trait]
impl KvStore for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn get(&self, key: &str) -> StorageResult<Option<Value>> {
        Ok(self.documents.read().await.get(key).cloned())
    }

    async fn set_many(&self, entries: Vec<(String, Value)>) -> StorageResult<()> {
        let mut documents = self.documents.write().await;
        for (key, value) in entries {
            documents.insert(key, value);
        }
        Ok(())
    }

    async fn remove(&self, keys: &[&str]) -> StorageResult<()> {
        let mut documents = self.documents.write().await;
        for key in keys {
            documents.remove(*key);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_set_get_remove() {
        let store = MemoryStore::new();
        assert!(store.is_empty().await);

        store
            .set_many(vec![
                ("a".to_string(), json!(1)),
                ("b".to_string(), json!([1, 2])),
            ])
            .await
            .unwrap();

        assert_eq!(store.len().await, 2);
        assert_eq!(store.get("b").await.unwrap(), Some(json!([1, 2])));

        store.remove(&["a", "missing"]).await.unwrap();
        assert!(store.get("a").await.unwrap().is_none());
        assert_eq!(store.len().await, 1);
    }
}
