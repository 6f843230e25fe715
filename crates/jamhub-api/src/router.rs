//! Route definitions for the JamHub HTTP API.
//!
//! REST routes are mounted under `/api`; the jam protocol itself runs over
//! `/ws`.

use axum::Router;
use axum::routing::get;

use crate::handlers;
use crate::state::AppState;

/// Build the Axum router with all routes.
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new().merge(health_routes()).merge(jam_routes());

    Router::new()
        .nest("/api", api_routes)
        .route("/ws", get(handlers::ws::ws_upgrade))
        .with_state(state)
}

/// Health endpoints
fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/health/detailed", get(handlers::health::detailed_health))
}

/// Jam discovery endpoints
fn jam_routes() -> Router<AppState> {
    Router::new()
        .route("/jams/public", get(handlers::jam::list_public))
        .route("/jams/{code}", get(handlers::jam::get_jam))
}
