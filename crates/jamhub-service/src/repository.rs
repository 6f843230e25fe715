//! Typed access to jam documents in the document store.

use std::sync::Arc;

use tracing::{error, warn};

use jamhub_core::error::AppError;
use jamhub_core::result::AppResult;
use jamhub_core::traits::store::DocumentStore;
use jamhub_core::types::JamCode;
use jamhub_entity::{Jam, JamPatch};
use jamhub_store::keys;

/// Reads and writes [`Jam`] documents.
#[derive(Debug, Clone)]
pub struct JamRepository {
    /// Backing store.
    store: Arc<dyn DocumentStore>,
}

impl JamRepository {
    /// Create a repository over `store`.
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Load a jam, active or not.
    pub async fn find(&self, code: &JamCode) -> AppResult<Option<Jam>> {
        let key = keys::jam_document(code);
        match self.store.get(&key).await.map_err(log_store_error)? {
            Some(document) => Ok(Some(serde_json::from_value(document)?)),
            None => Ok(None),
        }
    }

    /// Load an active jam. Missing and ended jams are both `NotFound`.
    pub async fn get_active(&self, code: &JamCode) -> AppResult<Jam> {
        match self.find(code).await? {
            Some(jam) if jam.is_active => Ok(jam),
            _ => Err(AppError::not_found(format!("Jam {code} not found"))),
        }
    }

    /// Store a new jam unless its code is taken. Returns `false` on collision.
    pub async fn insert_new(&self, jam: &Jam) -> AppResult<bool> {
        let key = keys::jam_document(&jam.code);
        let document = serde_json::to_value(jam)?;
        self.store
            .create(&key, &document)
            .await
            .map_err(log_store_error)
    }

    /// Apply a partial update to a stored jam.
    pub async fn update(&self, code: &JamCode, patch: &JamPatch) -> AppResult<()> {
        let key = keys::jam_document(code);
        let fields = serde_json::to_value(patch)?;
        let updated = self
            .store
            .merge(&key, &fields)
            .await
            .map_err(log_store_error)?;

        if !updated {
            return Err(AppError::not_found(format!("Jam {code} not found")));
        }
        Ok(())
    }

    /// All active jams. Unreadable documents are skipped.
    pub async fn list_active(&self) -> AppResult<Vec<Jam>> {
        let keys = self
            .store
            .keys(keys::JAM_PREFIX)
            .await
            .map_err(log_store_error)?;

        let mut jams = Vec::with_capacity(keys.len());
        for key in keys {
            let Some(code) = keys::code_from_key(&key) else {
                continue;
            };
            match self.find(&code).await {
                Ok(Some(jam)) if jam.is_active => jams.push(jam),
                Ok(_) => {}
                Err(e) if e.is(jamhub_core::error::ErrorKind::Serialization) => {
                    warn!(jam = %code, error = %e, "Skipping unreadable jam document");
                }
                Err(e) => return Err(e),
            }
        }
        Ok(jams)
    }

    /// Whether the store answers.
    pub async fn health_check(&self) -> AppResult<bool> {
        self.store.health_check().await
    }
}

fn log_store_error(e: AppError) -> AppError {
    error!(error = %e, "Jam store operation failed");
    e
}
