//! Ping/pong heartbeat for WebSocket keepalive.

use std::sync::Arc;
use std::time::Duration;

use tokio::time;

use jamhub_core::config::RealtimeConfig;

use super::handle::ConnectionHandle;
use crate::message::builder;

/// Heartbeat configuration
#[derive(Debug, Clone, Copy)]
pub struct HeartbeatConfig {
    /// Interval between pings
    pub ping_interval: Duration,
    /// Timeout before considering connection dead
    pub ping_timeout: Duration,
}

impl From<&RealtimeConfig> for HeartbeatConfig {
    fn from(config: &RealtimeConfig) -> Self {
        Self {
            ping_interval: Duration::from_secs(config.ping_interval_seconds.max(1)),
            ping_timeout: Duration::from_secs(config.ping_timeout_seconds.max(1)),
        }
    }
}

/// Run heartbeat loop for a connection.
///
/// Sends periodic pings and marks the connection dead once no pong has
/// arrived within the timeout.
pub async fn run_heartbeat(handle: Arc<ConnectionHandle>, config: HeartbeatConfig) {
    let mut interval = time::interval(config.ping_interval);

    loop {
        interval.tick().await;

        if !handle.is_alive() {
            break;
        }

        let silent_for = handle.last_pong().await.elapsed();
        if silent_for > config.ping_timeout {
            tracing::warn!(
                conn_id = %handle.id,
                identity = %handle.identity,
                silent_for = ?silent_for,
                "Heartbeat timeout, closing connection"
            );
            handle.mark_dead();
            break;
        }

        if let Some(ping) = builder::encode(&builder::build_ping()) {
            if !handle.send(ping) && !handle.is_alive() {
                tracing::debug!(conn_id = %handle.id, "Ping send failed, connection gone");
                break;
            }
        }
    }

    tracing::debug!(conn_id = %handle.id, "Heartbeat loop ended");
}
