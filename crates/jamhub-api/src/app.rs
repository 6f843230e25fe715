//! Application builder: wires router, middleware and state into an Axum app.

use std::future::IntoFuture;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tokio::sync::{broadcast, watch};
use tower_http::trace::TraceLayer;

use jamhub_core::config::{AppConfig, CorsConfig};
use jamhub_core::error::AppError;
use jamhub_core::traits::store::DocumentStore;
use jamhub_store::{DocumentChange, StoreManager};

use crate::middleware::cors::build_cors_layer;
use crate::router::build_router;
use crate::state::AppState;

/// Builds the complete Axum application with all routes and middleware.
pub fn build_app(state: AppState, cors_config: &CorsConfig) -> Router {
    build_router(state)
        .layer(build_cors_layer(cors_config))
        .layer(TraceLayer::new_for_http())
}

/// Runs the JamHub server with the given configuration.
pub async fn run_server(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting JamHub server...");

    // ── Step 1: Initialize session store ─────────────────────────
    tracing::info!(
        "Initializing session store (provider: {})...",
        config.store.provider
    );
    let manager = StoreManager::new(&config.store).await?;
    if !manager.health_check().await? {
        tracing::warn!("Session store did not answer the startup health check");
    }
    tokio::spawn(log_store_changes(manager.watch()));
    let store: Arc<dyn DocumentStore> = Arc::new(manager);

    // ── Step 2: Build realtime engine and state ──────────────────
    let cors = config.server.cors.clone();
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let grace = Duration::from_secs(config.server.shutdown_grace_seconds);
    let state = AppState::new(config, store);
    let engine = Arc::clone(&state.realtime);

    // ── Step 3: Bind and serve ───────────────────────────────────
    let app = build_app(state, &cors);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {addr}: {e}")))?;

    tracing::info!("JamHub server listening on {}", addr);

    let (stop_tx, mut stop_rx) = watch::channel(false);
    let server = axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            engine.shutdown();
            let _ = stop_tx.send(true);
        })
        .into_future();
    tokio::pin!(server);

    // ── Step 4: Drain connections within the grace period ───────
    tokio::select! {
        result = &mut server => {
            result.map_err(|e| AppError::internal(format!("Server error: {e}")))?;
        }
        () = async {
            let _ = stop_rx.changed().await;
            tokio::time::sleep(grace).await;
        } => {
            tracing::warn!(grace_seconds = grace.as_secs(), "Connections still open after grace period");
        }
    }

    tracing::info!("JamHub server stopped");
    Ok(())
}

async fn log_store_changes(mut changes: broadcast::Receiver<DocumentChange>) {
    loop {
        match changes.recv().await {
            Ok(change) => tracing::trace!(key = %change.key, kind = ?change.kind, "Session document written"),
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::debug!(skipped, "Store change log lagging");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
