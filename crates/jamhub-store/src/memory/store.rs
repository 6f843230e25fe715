//! In-memory document store backed by a concurrent hash map.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use serde_json::Value;
use tracing::debug;

use jamhub_core::result::AppResult;
use jamhub_core::traits::store::{DocumentStore, merge_fields};

/// Single-process document store. Documents live as long as the process.
#[derive(Debug, Clone, Default)]
pub struct MemoryDocumentStore {
    /// Documents by key.
    documents: Arc<DashMap<String, Value>>,
}

impl MemoryDocumentStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored documents.
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Whether the store holds no documents.
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn get(&self, key: &str) -> AppResult<Option<Value>> {
        Ok(self.documents.get(key).map(|doc| doc.value().clone()))
    }

    async fn set(&self, key: &str, document: &Value) -> AppResult<()> {
        self.documents.insert(key.to_string(), document.clone());
        Ok(())
    }

    async fn create(&self, key: &str, document: &Value) -> AppResult<bool> {
        // The entry API holds the shard lock, so check-and-insert is atomic.
        match self.documents.entry(key.to_string()) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(slot) => {
                slot.insert(document.clone());
                Ok(true)
            }
        }
    }

    async fn merge(&self, key: &str, patch: &Value) -> AppResult<bool> {
        match self.documents.get_mut(key) {
            Some(mut doc) => {
                merge_fields(doc.value_mut(), patch);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        self.documents.remove(key);
        Ok(())
    }

    async fn exists(&self, key: &str) -> AppResult<bool> {
        Ok(self.documents.contains_key(key))
    }

    async fn keys(&self, prefix: &str) -> AppResult<Vec<String>> {
        let keys: Vec<String> = self
            .documents
            .iter()
            .filter(|entry| entry.key().starts_with(prefix))
            .map(|entry| entry.key().clone())
            .collect();

        debug!(prefix, count = keys.len(), "Listed keys matching prefix");
        Ok(keys)
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(true)
    }
}
