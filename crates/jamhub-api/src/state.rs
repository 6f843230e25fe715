//! Application state shared across all handlers.

use std::sync::Arc;
use std::time::Instant;

use jamhub_core::config::AppConfig;
use jamhub_core::traits::store::DocumentStore;
use jamhub_realtime::server::RealtimeEngine;

/// Application state containing all shared dependencies.
///
/// Passed to every Axum handler via `State<AppState>`.
/// All fields are `Arc`-wrapped for cheap cloning across tasks.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<AppConfig>,
    /// WebSocket realtime engine, owning the jam services
    pub realtime: Arc<RealtimeEngine>,
    /// When the process started serving
    pub started_at: Instant,
}

impl AppState {
    /// Build the engine over `store` and wrap it in state.
    pub fn new(config: AppConfig, store: Arc<dyn DocumentStore>) -> Self {
        let realtime = Arc::new(RealtimeEngine::new(
            &config.realtime,
            &config.auth,
            &config.jam,
            store,
        ));
        Self {
            config: Arc::new(config),
            realtime,
            started_at: Instant::now(),
        }
    }
}
