//! Connection manager: handles connection lifecycle and routes inbound frames.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use jamhub_core::config::RealtimeConfig;
use jamhub_core::error::{AppError, ErrorKind};
use jamhub_core::types::Identity;
use jamhub_service::SessionLifecycle;

use crate::dispatcher::CommandDispatcher;
use crate::message::types::{InboundMessage, OutboundMessage};
use crate::message::{builder, validator};
use crate::metrics::RealtimeMetrics;

use super::handle::{ConnectionHandle, ConnectionId};
use super::heartbeat::HeartbeatConfig;
use super::pool::ConnectionPool;

/// Manages all active WebSocket connections.
#[derive(Debug)]
pub struct ConnectionManager {
    /// Connection pool.
    pool: Arc<ConnectionPool>,
    /// Command routing.
    dispatcher: CommandDispatcher,
    /// Session lifecycle, for implicit disconnects.
    lifecycle: Arc<SessionLifecycle>,
    /// Metrics.
    metrics: Arc<RealtimeMetrics>,
    /// Configuration.
    config: RealtimeConfig,
}

impl ConnectionManager {
    /// Creates a new connection manager.
    pub fn new(
        config: RealtimeConfig,
        pool: Arc<ConnectionPool>,
        dispatcher: CommandDispatcher,
        lifecycle: Arc<SessionLifecycle>,
        metrics: Arc<RealtimeMetrics>,
    ) -> Self {
        Self {
            pool,
            dispatcher,
            lifecycle,
            metrics,
            config,
        }
    }

    /// Registers a new authenticated connection.
    ///
    /// Returns the connection handle and a receiver for outbound frames. The
    /// first frame queued is `connected`.
    pub fn register(&self, identity: Identity) -> (Arc<ConnectionHandle>, mpsc::Receiver<String>) {
        let (tx, rx) = mpsc::channel(self.config.channel_buffer_size.max(1));
        let handle = Arc::new(ConnectionHandle::new(identity.clone(), tx));

        let existing = self.pool.connections_of(&identity);
        let max = self.config.max_connections_per_identity.max(1);
        if existing.len() >= max {
            warn!(
                identity = %identity,
                count = existing.len(),
                max,
                "Identity at max connections, evicting oldest"
            );
            for oldest in existing.iter().take(existing.len() + 1 - max) {
                if self.pool.remove(&oldest.id).is_some() {
                    oldest.mark_dead();
                    self.metrics.connection_closed();
                }
            }
        }

        self.pool.add(Arc::clone(&handle));
        self.metrics.connection_opened();

        self.send_to(
            &handle,
            &OutboundMessage::Connected {
                identity: identity.clone(),
            },
        );

        info!(conn_id = %handle.id, identity = %identity, "WebSocket connection registered");
        (handle, rx)
    }

    /// Unregisters a connection.
    ///
    /// When it was the identity's last connection the identity is
    /// disconnected from its jam.
    pub async fn unregister(&self, conn_id: &ConnectionId) {
        let Some(handle) = self.pool.remove(conn_id) else {
            return;
        };
        handle.mark_dead();
        self.metrics.connection_closed();

        info!(conn_id = %conn_id, identity = %handle.identity, "WebSocket connection unregistered");

        if self.pool.is_connected(&handle.identity) {
            return;
        }
        if let Err(e) = self.lifecycle.handle_disconnect(&handle.identity).await {
            warn!(
                identity = %handle.identity,
                error = %e,
                "Failed to detach disconnected identity from its jam"
            );
        }
    }

    /// Processes an inbound text frame from a client.
    pub async fn handle_inbound(&self, conn_id: &ConnectionId, raw_message: &str) {
        let Some(handle) = self.pool.get(conn_id) else {
            warn!(conn_id = %conn_id, "Message from unknown connection");
            return;
        };

        handle.touch().await;
        self.metrics.message_received();

        let message = match validator::parse_inbound(raw_message, self.config.max_message_bytes) {
            Ok(m) => m,
            Err(e) => {
                debug!(conn_id = %conn_id, error = %e, "Rejected inbound frame");
                self.send_error(&handle, &e);
                return;
            }
        };

        if let InboundMessage::Pong { .. } = message {
            handle.record_pong().await;
            return;
        }

        let command = message.name();
        match self.dispatcher.dispatch(&handle.identity, message).await {
            Ok(Some(reply)) => self.send_to(&handle, &reply),
            Ok(None) => {}
            Err(e) => {
                match e.kind {
                    ErrorKind::Unavailable | ErrorKind::Timeout | ErrorKind::Internal => warn!(
                        conn_id = %conn_id,
                        identity = %handle.identity,
                        command,
                        error = %e,
                        "Command failed"
                    ),
                    _ => debug!(
                        conn_id = %conn_id,
                        identity = %handle.identity,
                        command,
                        error = %e,
                        "Command rejected"
                    ),
                }
                self.send_error(&handle, &e);
            }
        }
    }

    /// Record a transport-level pong.
    pub async fn record_pong(&self, conn_id: &ConnectionId) {
        if let Some(handle) = self.pool.get(conn_id) {
            handle.record_pong().await;
        }
    }

    fn send_error(&self, handle: &ConnectionHandle, err: &AppError) {
        self.metrics.error_sent();
        self.send_to(handle, &builder::build_error(err));
    }

    fn send_to(&self, handle: &ConnectionHandle, message: &OutboundMessage) {
        if let Some(frame) = builder::encode(message) {
            let sent = handle.send(frame);
            self.metrics
                .record_delivery(u64::from(sent), u64::from(!sent));
        }
    }

    /// Marks every connection dead so their socket loops exit.
    pub fn close_all(&self) {
        let all = self.pool.all_connections();
        for conn in &all {
            conn.mark_dead();
        }
        info!(count = all.len(), "All connections closed");
    }

    /// Returns the total connection count.
    pub fn connection_count(&self) -> usize {
        self.pool.connection_count()
    }

    /// Returns the number of connected identities.
    pub fn identity_count(&self) -> usize {
        self.pool.identity_count()
    }

    /// Heartbeat settings for new connections.
    pub fn heartbeat_config(&self) -> HeartbeatConfig {
        HeartbeatConfig::from(&self.config)
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &Arc<ConnectionPool> {
        &self.pool
    }
}
