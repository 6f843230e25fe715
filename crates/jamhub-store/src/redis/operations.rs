//! Redis document store implementation.
//!
//! Documents are stored as JSON strings. `merge` is a read-modify-write;
//! callers serialize writers to the same key (the jam registry holds a
//! per-session lock for every mutation).

use async_trait::async_trait;
use redis::AsyncCommands;
use serde_json::Value;
use tracing::debug;

use jamhub_core::error::{AppError, ErrorKind};
use jamhub_core::result::AppResult;
use jamhub_core::traits::store::{DocumentStore, merge_fields};

use super::client::RedisClient;

/// Redis-backed document store.
#[derive(Debug, Clone)]
pub struct RedisDocumentStore {
    /// Redis client.
    client: RedisClient,
}

impl RedisDocumentStore {
    /// Create a new Redis document store.
    pub fn new(client: RedisClient) -> Self {
        Self { client }
    }

    /// Map a Redis error to an AppError.
    fn map_err(e: redis::RedisError) -> AppError {
        AppError::with_source(ErrorKind::Unavailable, format!("Redis error: {e}"), e)
    }
}

#[async_trait]
impl DocumentStore for RedisDocumentStore {
    async fn get(&self, key: &str) -> AppResult<Option<Value>> {
        let full_key = self.client.prefixed_key(key);
        let mut conn = self.client.conn_mut();
        let raw: Option<String> = conn.get(&full_key).await.map_err(Self::map_err)?;
        match raw {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, document: &Value) -> AppResult<()> {
        let full_key = self.client.prefixed_key(key);
        let json = serde_json::to_string(document)?;
        let mut conn = self.client.conn_mut();
        let _: () = conn.set(&full_key, json).await.map_err(Self::map_err)?;
        Ok(())
    }

    async fn create(&self, key: &str, document: &Value) -> AppResult<bool> {
        let full_key = self.client.prefixed_key(key);
        let json = serde_json::to_string(document)?;
        let mut conn = self.client.conn_mut();

        // SET key value NX
        let result: Option<String> = redis::cmd("SET")
            .arg(&full_key)
            .arg(json)
            .arg("NX")
            .query_async(&mut conn)
            .await
            .map_err(Self::map_err)?;

        Ok(result.is_some())
    }

    async fn merge(&self, key: &str, patch: &Value) -> AppResult<bool> {
        let Some(mut document) = self.get(key).await? else {
            return Ok(false);
        };
        merge_fields(&mut document, patch);

        let full_key = self.client.prefixed_key(key);
        let json = serde_json::to_string(&document)?;
        let mut conn = self.client.conn_mut();

        // SET key value XX, so a concurrent delete is not resurrected
        let result: Option<String> = redis::cmd("SET")
            .arg(&full_key)
            .arg(json)
            .arg("XX")
            .query_async(&mut conn)
            .await
            .map_err(Self::map_err)?;

        Ok(result.is_some())
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        let full_key = self.client.prefixed_key(key);
        let mut conn = self.client.conn_mut();
        let _: () = conn.del(&full_key).await.map_err(Self::map_err)?;
        Ok(())
    }

    async fn exists(&self, key: &str) -> AppResult<bool> {
        let full_key = self.client.prefixed_key(key);
        let mut conn = self.client.conn_mut();
        let result: bool = conn.exists(&full_key).await.map_err(Self::map_err)?;
        Ok(result)
    }

    async fn keys(&self, prefix: &str) -> AppResult<Vec<String>> {
        let pattern = format!("{}*", self.client.prefixed_key(prefix));
        let mut conn = self.client.conn_mut();

        let full_keys: Vec<String> = redis::cmd("KEYS")
            .arg(&pattern)
            .query_async(&mut conn)
            .await
            .map_err(Self::map_err)?;

        let keys: Vec<String> = full_keys
            .iter()
            .map(|k| self.client.unprefixed_key(k).to_string())
            .collect();

        debug!(prefix, count = keys.len(), "Listed keys matching prefix");
        Ok(keys)
    }

    async fn health_check(&self) -> AppResult<bool> {
        let mut conn = self.client.conn_mut();
        let pong: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(Self::map_err)?;
        Ok(pong == "PONG")
    }
}
