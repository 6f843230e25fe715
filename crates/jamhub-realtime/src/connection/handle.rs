//! Individual WebSocket connection handle.

use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{Notify, RwLock, mpsc};
use tokio::time::Instant;
use uuid::Uuid;

use jamhub_core::types::Identity;

/// Unique connection identifier
pub type ConnectionId = Uuid;

/// A handle to a single WebSocket connection.
///
/// Holds the bounded queue of serialized frames waiting to be written to the
/// socket, plus the identity the connection speaks for.
#[derive(Debug)]
pub struct ConnectionHandle {
    /// Unique connection ID
    pub id: ConnectionId,
    /// Identity this connection acts as
    pub identity: Identity,
    /// Sender for serialized outbound frames
    sender: mpsc::Sender<String>,
    /// When the connection was established
    pub connected_at: DateTime<Utc>,
    /// Last inbound frame
    last_activity: RwLock<DateTime<Utc>>,
    /// Last pong received
    last_pong: RwLock<Instant>,
    /// Whether the connection is still alive
    alive: AtomicBool,
    /// Wakes the socket loop once the connection is marked dead
    close_signal: Notify,
}

impl ConnectionHandle {
    /// Create a new connection handle
    pub fn new(identity: Identity, sender: mpsc::Sender<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            identity,
            sender,
            connected_at: now,
            last_activity: RwLock::new(now),
            last_pong: RwLock::new(Instant::now()),
            alive: AtomicBool::new(true),
            close_signal: Notify::new(),
        }
    }

    /// Queue a frame without waiting.
    ///
    /// A full queue drops the frame. A closed queue marks the connection dead.
    pub fn send(&self, frame: String) -> bool {
        if !self.is_alive() {
            return false;
        }
        match self.sender.try_send(frame) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!(conn_id = %self.id, "Send buffer full, dropping frame");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                self.mark_dead();
                false
            }
        }
    }

    /// Check if connection is alive
    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    /// Mark connection as dead and wake its socket loop
    pub fn mark_dead(&self) {
        if self.alive.swap(false, Ordering::SeqCst) {
            self.close_signal.notify_one();
        }
    }

    /// Resolves once the connection has been marked dead.
    pub async fn closed(&self) {
        if !self.is_alive() {
            return;
        }
        self.close_signal.notified().await;
    }

    /// Update last activity timestamp
    pub async fn touch(&self) {
        *self.last_activity.write().await = Utc::now();
    }

    /// Record a pong response
    pub async fn record_pong(&self) {
        *self.last_pong.write().await = Instant::now();
    }

    /// When the last pong arrived
    pub async fn last_pong(&self) -> Instant {
        *self.last_pong.read().await
    }

    /// Get a snapshot of connection info
    pub async fn info(&self) -> ConnectionInfo {
        ConnectionInfo {
            id: self.id,
            identity: self.identity.clone(),
            connected_at: self.connected_at,
            last_activity: *self.last_activity.read().await,
            alive: self.is_alive(),
        }
    }
}

/// Snapshot of connection info (serializable)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionInfo {
    /// Connection ID
    pub id: ConnectionId,
    /// Identity
    pub identity: Identity,
    /// Connected at
    pub connected_at: DateTime<Utc>,
    /// Last activity
    pub last_activity: DateTime<Utc>,
    /// Is alive
    pub alive: bool,
}
