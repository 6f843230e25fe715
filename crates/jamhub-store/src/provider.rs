//! Store manager that dispatches to the configured provider.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::info;

use jamhub_core::config::StoreConfig;
use jamhub_core::error::AppError;
use jamhub_core::result::AppResult;
use jamhub_core::traits::store::DocumentStore;

use crate::watch::{ChangeKind, DocumentChange};

/// Buffered change notifications per watcher before it starts lagging.
const WATCH_BUFFER: usize = 256;

/// Store manager that wraps the configured document store.
///
/// The provider is selected at construction time based on configuration.
/// Every successful write is also announced to [`watch`](Self::watch)ers.
#[derive(Debug, Clone)]
pub struct StoreManager {
    /// The inner document store.
    inner: Arc<dyn DocumentStore>,
    /// Change feed.
    changes: broadcast::Sender<DocumentChange>,
}

impl StoreManager {
    /// Create a new store manager from configuration.
    pub async fn new(config: &StoreConfig) -> AppResult<Self> {
        let inner: Arc<dyn DocumentStore> = match config.provider.as_str() {
            #[cfg(feature = "redis-backend")]
            "redis" => {
                info!("Initializing Redis document store");
                let client = crate::redis::RedisClient::connect(&config.redis).await?;
                Arc::new(crate::redis::RedisDocumentStore::new(client))
            }
            #[cfg(feature = "memory")]
            "memory" => {
                info!("Initializing in-memory document store");
                Arc::new(crate::memory::MemoryDocumentStore::new())
            }
            other => {
                return Err(AppError::configuration(format!(
                    "Unknown store provider: '{other}'. Supported: memory, redis"
                )));
            }
        };

        Ok(Self::from_provider(inner))
    }

    /// Create a store manager from an existing provider (for testing).
    pub fn from_provider(provider: Arc<dyn DocumentStore>) -> Self {
        let (changes, _) = broadcast::channel(WATCH_BUFFER);
        Self {
            inner: provider,
            changes,
        }
    }

    /// Subscribe to writes made through this manager from now on.
    ///
    /// Writes by other processes sharing a Redis backend are not seen.
    pub fn watch(&self) -> broadcast::Receiver<DocumentChange> {
        self.changes.subscribe()
    }

    fn announce(&self, key: &str, kind: ChangeKind) {
        // No receivers is fine.
        let _ = self.changes.send(DocumentChange::new(key, kind));
    }

    /// In-memory store manager.
    #[cfg(feature = "memory")]
    pub fn in_memory() -> Self {
        Self::from_provider(Arc::new(crate::memory::MemoryDocumentStore::new()))
    }
}

#[async_trait]
impl DocumentStore for StoreManager {
    async fn get(&self, key: &str) -> AppResult<Option<Value>> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, document: &Value) -> AppResult<()> {
        self.inner.set(key, document).await?;
        self.announce(key, ChangeKind::Updated);
        Ok(())
    }

    async fn create(&self, key: &str, document: &Value) -> AppResult<bool> {
        let created = self.inner.create(key, document).await?;
        if created {
            self.announce(key, ChangeKind::Created);
        }
        Ok(created)
    }

    async fn merge(&self, key: &str, patch: &Value) -> AppResult<bool> {
        let merged = self.inner.merge(key, patch).await?;
        if merged {
            self.announce(key, ChangeKind::Updated);
        }
        Ok(merged)
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        self.inner.delete(key).await?;
        self.announce(key, ChangeKind::Deleted);
        Ok(())
    }

    async fn exists(&self, key: &str) -> AppResult<bool> {
        self.inner.exists(key).await
    }

    async fn keys(&self, prefix: &str) -> AppResult<Vec<String>> {
        self.inner.keys(prefix).await
    }

    async fn health_check(&self) -> AppResult<bool> {
        self.inner.health_check().await
    }
}
