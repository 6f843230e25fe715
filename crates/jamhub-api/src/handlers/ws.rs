//! WebSocket upgrade handler.

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Query, State, WebSocketUpgrade};
use axum::response::Response;
use futures::{SinkExt, StreamExt};
use tracing::{info, warn};

use jamhub_core::types::Identity;
use jamhub_realtime::connection::heartbeat::run_heartbeat;

use crate::error::ApiError;
use crate::state::AppState;

/// Query parameters for the WebSocket upgrade.
#[derive(Debug, serde::Deserialize)]
pub struct WsQuery {
    /// Bearer token, required when authentication is enabled.
    pub token: Option<String>,
}

/// GET /ws?token={jwt}
pub async fn ws_upgrade(
    State(state): State<AppState>,
    ws: WebSocketUpgrade,
    Query(query): Query<WsQuery>,
) -> Result<Response, ApiError> {
    // Authenticate before upgrade
    let identity = state
        .realtime
        .authenticator
        .authenticate(query.token.as_deref())?;

    let max_frame = state.config.realtime.max_message_bytes;
    Ok(ws
        .max_message_size(max_frame)
        .on_upgrade(move |socket| handle_ws_connection(state, identity, socket)))
}

/// Handles an established WebSocket connection.
async fn handle_ws_connection(state: AppState, identity: Identity, socket: WebSocket) {
    let (mut ws_tx, mut ws_rx) = socket.split();
    let connections = &state.realtime.connections;

    let (handle, mut outbound_rx) = connections.register(identity.clone());
    let conn_id = handle.id;

    info!(conn_id = %conn_id, identity = %identity, "WebSocket connection established");

    // Outbound forwarder
    let outbound_task = tokio::spawn(async move {
        while let Some(frame) = outbound_rx.recv().await {
            if ws_tx.send(Message::Text(frame.into())).await.is_err() {
                break;
            }
        }
        let _ = ws_tx.close().await;
    });

    let heartbeat_task = tokio::spawn(run_heartbeat(
        handle.clone(),
        connections.heartbeat_config(),
    ));

    loop {
        tokio::select! {
            () = handle.closed() => break,
            next = ws_rx.next() => match next {
                Some(Ok(Message::Text(text))) => {
                    connections.handle_inbound(&conn_id, text.as_str()).await;
                }
                Some(Ok(Message::Pong(_))) => connections.record_pong(&conn_id).await,
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    warn!(conn_id = %conn_id, error = %e, "WebSocket error");
                    break;
                }
            },
        }
    }

    heartbeat_task.abort();
    outbound_task.abort();
    connections.unregister(&conn_id).await;

    info!(conn_id = %conn_id, identity = %identity, "WebSocket connection closed");
}
