//! Builders shared by the unit tests of this crate.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use jamhub_core::config::JamConfig;
use jamhub_core::error::AppError;
use jamhub_core::result::AppResult;
use jamhub_core::traits::store::DocumentStore;
use jamhub_core::types::{Identity, JamCode};
use jamhub_entity::jam::{NewTrack, Track, TrackSource};
use jamhub_store::memory::MemoryDocumentStore;

use crate::events::RecordingPublisher;
use crate::lifecycle::{CreateJam, JoinJam};
use crate::services::JamServices;

pub(crate) fn host() -> Identity {
    Identity::new("host")
}

pub(crate) fn guest() -> Identity {
    Identity::new("guest")
}

pub(crate) fn make_services() -> (JamServices, Arc<RecordingPublisher>) {
    make_services_with(JamConfig::default(), None)
}

pub(crate) fn make_services_with(
    config: JamConfig,
    store: Option<Arc<dyn DocumentStore>>,
) -> (JamServices, Arc<RecordingPublisher>) {
    let store = store.unwrap_or_else(|| Arc::new(MemoryDocumentStore::new()));
    let events = Arc::new(RecordingPublisher::new());
    let services = JamServices::new(store, &config, events.clone());
    (services, events)
}

pub(crate) fn create_request(name: &str, nickname: &str) -> CreateJam {
    CreateJam {
        name: name.to_string(),
        nickname: nickname.to_string(),
        is_private: false,
        password: None,
    }
}

pub(crate) fn join_request(code: &JamCode, nickname: &str) -> JoinJam {
    JoinJam {
        jam_code: code.clone(),
        nickname: nickname.to_string(),
        password: None,
    }
}

pub(crate) fn new_track(title: &str) -> NewTrack {
    NewTrack {
        id: None,
        title: title.to_string(),
        artist: None,
        source: TrackSource::Youtube {
            video_id: format!("vid-{title}"),
        },
    }
}

/// Create a public jam hosted by `host` with nickname "Host".
pub(crate) async fn start_jam(services: &JamServices, host: &Identity) -> JamCode {
    services
        .lifecycle
        .create(host, create_request("Friday Mix", "Host"))
        .await
        .unwrap()
        .jam
        .code
}

/// Queue `titles` as the host, in order.
pub(crate) async fn add_titles(services: &JamServices, code: &JamCode, titles: &[&str]) -> Vec<Track> {
    let mut added = Vec::new();
    for title in titles {
        added.push(
            services
                .playlist
                .add_track(&host(), code, new_track(title))
                .await
                .unwrap(),
        );
    }
    added
}

/// Store where every code is already taken.
#[derive(Debug, Default)]
pub(crate) struct TakenStore {
    inner: MemoryDocumentStore,
}

#[async_trait]
impl DocumentStore for TakenStore {
    async fn get(&self, key: &str) -> AppResult<Option<Value>> {
        self.inner.get(key).await
    }
    async fn set(&self, key: &str, document: &Value) -> AppResult<()> {
        self.inner.set(key, document).await
    }
    async fn create(&self, _key: &str, _document: &Value) -> AppResult<bool> {
        Ok(false)
    }
    async fn merge(&self, key: &str, patch: &Value) -> AppResult<bool> {
        self.inner.merge(key, patch).await
    }
    async fn delete(&self, key: &str) -> AppResult<()> {
        self.inner.delete(key).await
    }
    async fn exists(&self, key: &str) -> AppResult<bool> {
        self.inner.exists(key).await
    }
    async fn keys(&self, prefix: &str) -> AppResult<Vec<String>> {
        self.inner.keys(prefix).await
    }
    async fn health_check(&self) -> AppResult<bool> {
        Ok(true)
    }
}

/// Store that is never reachable.
#[derive(Debug)]
pub(crate) struct FailingStore;

fn down() -> AppError {
    AppError::unavailable("store is down")
}

#[async_trait]
impl DocumentStore for FailingStore {
    async fn get(&self, _key: &str) -> AppResult<Option<Value>> {
        Err(down())
    }
    async fn set(&self, _key: &str, _document: &Value) -> AppResult<()> {
        Err(down())
    }
    async fn create(&self, _key: &str, _document: &Value) -> AppResult<bool> {
        Err(down())
    }
    async fn merge(&self, _key: &str, _patch: &Value) -> AppResult<bool> {
        Err(down())
    }
    async fn delete(&self, _key: &str) -> AppResult<()> {
        Err(down())
    }
    async fn exists(&self, _key: &str) -> AppResult<bool> {
        Err(down())
    }
    async fn keys(&self, _prefix: &str) -> AppResult<Vec<String>> {
        Err(down())
    }
    async fn health_check(&self) -> AppResult<bool> {
        Err(down())
    }
}
