//! Read-only jam discovery handlers.

use axum::Json;
use axum::extract::{Path, State};

use jamhub_core::types::JamCode;
use jamhub_entity::JamSummary;

use crate::dto::response::ApiResponse;
use crate::error::ApiError;
use crate::state::AppState;

/// GET /api/jams/public
pub async fn list_public(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<JamSummary>>>, ApiError> {
    let jams = state.realtime.services.directory.list_public(None).await?;
    Ok(Json(ApiResponse::ok(jams)))
}

/// GET /api/jams/{code}
pub async fn get_jam(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<ApiResponse<JamSummary>>, ApiError> {
    let code = JamCode::parse(&code)?;
    let summary = state.realtime.services.directory.summary(&code).await?;
    Ok(Json(ApiResponse::ok(summary)))
}
