//! Shared test helpers for integration tests.
#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::Value;
use tower::ServiceExt;

use jamhub_api::{AppState, build_app};
use jamhub_core::config::{AppConfig, JamConfig};
use jamhub_core::types::{Identity, JamCode};
use jamhub_entity::jam::{NewTrack, TrackSource};
use jamhub_service::{CreateJam, JamServices, JoinJam, RecordingPublisher};
use jamhub_store::memory::MemoryDocumentStore;

/// Secret used by tests that enable authentication.
pub const TEST_JWT_SECRET: &str = "integration-test-secret";

/// Test application context
pub struct TestApp {
    /// The Axum router for making test requests
    pub router: Router,
    /// Shared state behind the router
    pub state: AppState,
}

impl TestApp {
    /// Create a test application over an in-memory store
    pub fn new() -> Self {
        Self::with_config(AppConfig::default())
    }

    /// Create a test application with authentication turned on
    pub fn with_auth() -> Self {
        let mut config = AppConfig::default();
        config.auth.enabled = true;
        config.auth.jwt_secret = TEST_JWT_SECRET.to_string();
        Self::with_config(config)
    }

    /// Create a test application from `config`
    pub fn with_config(config: AppConfig) -> Self {
        let cors = config.server.cors.clone();
        let state = AppState::new(config, Arc::new(MemoryDocumentStore::new()));
        let router = build_app(state.clone(), &cors);
        Self { router, state }
    }

    /// Jam services wired to the WebSocket engine
    pub fn services(&self) -> &JamServices {
        &self.state.realtime.services
    }

    /// Send a request through the router
    pub async fn request(&self, method: &str, path: &str) -> TestResponse {
        let req = Request::builder()
            .method(method)
            .uri(path)
            .body(Body::empty())
            .expect("Failed to build request");

        let response = self
            .router
            .clone()
            .oneshot(req)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("Failed to read body");

        let body: Value = serde_json::from_slice(&body_bytes).unwrap_or(Value::Null);

        TestResponse { status, body }
    }

    /// Serve the app on an ephemeral local port
    pub async fn spawn(self) -> SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("Failed to read local addr");
        tokio::spawn(async move {
            axum::serve(listener, self.router)
                .await
                .expect("Test server failed");
        });
        addr
    }
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    /// HTTP status code
    pub status: StatusCode,
    /// Parsed JSON body
    pub body: Value,
}

/// Services over an in-memory store with a recording publisher
pub fn recorded_services() -> (JamServices, Arc<RecordingPublisher>) {
    let events = Arc::new(RecordingPublisher::new());
    let services = JamServices::new(
        Arc::new(MemoryDocumentStore::new()),
        &JamConfig::default(),
        events.clone(),
    );
    (services, events)
}

/// Identity shorthand
pub fn id(name: &str) -> Identity {
    Identity::new(name)
}

/// Public jam creation request
pub fn public_jam(name: &str, nickname: &str) -> CreateJam {
    CreateJam {
        name: name.to_string(),
        nickname: nickname.to_string(),
        is_private: false,
        password: None,
    }
}

/// Join request without a password
pub fn join(code: &JamCode, nickname: &str) -> JoinJam {
    JoinJam {
        jam_code: code.clone(),
        nickname: nickname.to_string(),
        password: None,
    }
}

/// A YouTube track
pub fn track(title: &str) -> NewTrack {
    NewTrack {
        id: None,
        title: title.to_string(),
        artist: None,
        source: TrackSource::Youtube {
            video_id: format!("yt-{title}"),
        },
    }
}

/// Create a public jam hosted by `host` and return its code
pub async fn start_jam(services: &JamServices, host: &Identity) -> JamCode {
    services
        .lifecycle
        .create(host, public_jam("Friday Mix", "Host"))
        .await
        .expect("Failed to create jam")
        .jam
        .code
}
