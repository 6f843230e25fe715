//! Public jam discovery.

use std::sync::Arc;

use jamhub_core::error::AppError;
use jamhub_core::result::AppResult;
use jamhub_core::types::{Identity, JamCode};
use jamhub_entity::JamSummary;

use crate::repository::JamRepository;

/// Lists and describes jams to non-members.
#[derive(Debug, Clone)]
pub struct JamDirectory {
    /// Jam documents.
    repository: Arc<JamRepository>,
}

impl JamDirectory {
    /// Creates a new directory.
    pub fn new(repository: Arc<JamRepository>) -> Self {
        Self { repository }
    }

    /// Active public jams, newest first, excluding those `viewer` is already in.
    pub async fn list_public(&self, viewer: Option<&Identity>) -> AppResult<Vec<JamSummary>> {
        let mut jams: Vec<JamSummary> = self
            .repository
            .list_active()
            .await?
            .into_iter()
            .filter(|jam| !jam.is_private)
            .filter(|jam| viewer.is_none_or(|id| !jam.is_member(id)))
            .map(|jam| jam.summary())
            .collect();

        jams.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(jams)
    }

    /// Public summary of one jam, ended or not.
    pub async fn summary(&self, code: &JamCode) -> AppResult<JamSummary> {
        self.repository
            .find(code)
            .await?
            .map(|jam| jam.summary())
            .ok_or_else(|| AppError::not_found(format!("Jam {code} not found")))
    }
}
