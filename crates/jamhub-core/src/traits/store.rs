//! Document store trait for pluggable session persistence backends.

use async_trait::async_trait;
use serde_json::Value;

use crate::result::AppResult;

/// Keyed JSON document storage (in-memory or Redis).
///
/// Documents are JSON objects. `merge` performs a shallow update: each
/// top-level field of the patch replaces the stored field, all other fields
/// are left as they were. The provider is responsible for key prefixing.
#[async_trait]
pub trait DocumentStore: Send + Sync + std::fmt::Debug + 'static {
    /// Get a document by key. Returns `None` if it does not exist.
    async fn get(&self, key: &str) -> AppResult<Option<Value>>;

    /// Store a document, replacing any existing one.
    async fn set(&self, key: &str, document: &Value) -> AppResult<()>;

    /// Store a document only if the key is free.
    /// Returns `true` if it was stored, `false` if the key already existed.
    async fn create(&self, key: &str, document: &Value) -> AppResult<bool>;

    /// Merge top-level fields of `patch` into an existing document.
    /// Returns `false` if there was no document to update.
    async fn merge(&self, key: &str, patch: &Value) -> AppResult<bool>;

    /// Delete a document.
    async fn delete(&self, key: &str) -> AppResult<()>;

    /// Check whether a document exists.
    async fn exists(&self, key: &str) -> AppResult<bool>;

    /// List every key starting with `prefix`.
    async fn keys(&self, prefix: &str) -> AppResult<Vec<String>>;

    /// Check that the backend is reachable.
    async fn health_check(&self) -> AppResult<bool>;

    /// Get a typed document by deserializing from JSON.
    async fn get_json<T: serde::de::DeserializeOwned + Send>(
        &self,
        key: &str,
    ) -> AppResult<Option<T>>
    where
        Self: Sized,
    {
        match self.get(key).await? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }
}

/// Shallow-merge `patch` into `target`. Non-object values replace `target` wholesale.
pub fn merge_fields(target: &mut Value, patch: &Value) {
    match (target.as_object_mut(), patch.as_object()) {
        (Some(doc), Some(fields)) => {
            for (field, value) in fields {
                doc.insert(field.clone(), value.clone());
            }
        }
        _ => *target = patch.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_merge_fields_replaces_only_patched_keys() {
        let mut doc = json!({"name": "Friday Mix", "playlist": [1, 2], "is_active": true});
        merge_fields(&mut doc, &json!({"playlist": [], "is_active": false}));
        assert_eq!(
            doc,
            json!({"name": "Friday Mix", "playlist": [], "is_active": false})
        );
    }
}
