//! Realtime engine metrics.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Engine-level counters.
#[derive(Debug, Default)]
pub struct RealtimeMetrics {
    /// Connections ever accepted
    connections_total: AtomicU64,
    /// Connections currently open
    connections_active: AtomicU64,
    /// Frames received from clients
    messages_received: AtomicU64,
    /// Frames queued for clients
    messages_sent: AtomicU64,
    /// Frames dropped on full or closed queues
    messages_dropped: AtomicU64,
    /// Error frames sent back to clients
    errors_sent: AtomicU64,
}

impl RealtimeMetrics {
    /// Create zeroed metrics
    pub fn new() -> Self {
        Self::default()
    }

    /// A connection was accepted
    pub fn connection_opened(&self) {
        self.connections_total.fetch_add(1, Ordering::Relaxed);
        self.connections_active.fetch_add(1, Ordering::Relaxed);
    }

    /// A connection went away
    pub fn connection_closed(&self) {
        let _ = self
            .connections_active
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| n.checked_sub(1));
    }

    /// A client frame arrived
    pub fn message_received(&self) {
        self.messages_received.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a fan-out result
    pub fn record_delivery(&self, sent: u64, dropped: u64) {
        self.messages_sent.fetch_add(sent, Ordering::Relaxed);
        self.messages_dropped.fetch_add(dropped, Ordering::Relaxed);
    }

    /// An error frame was returned
    pub fn error_sent(&self) {
        self.errors_sent.fetch_add(1, Ordering::Relaxed);
    }

    /// Get a snapshot of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            connections_total: self.connections_total.load(Ordering::Relaxed),
            connections_active: self.connections_active.load(Ordering::Relaxed),
            messages_received: self.messages_received.load(Ordering::Relaxed),
            messages_sent: self.messages_sent.load(Ordering::Relaxed),
            messages_dropped: self.messages_dropped.load(Ordering::Relaxed),
            errors_sent: self.errors_sent.load(Ordering::Relaxed),
        }
    }
}

/// Serializable metrics snapshot
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    /// Connections ever accepted
    pub connections_total: u64,
    /// Connections currently open
    pub connections_active: u64,
    /// Frames received from clients
    pub messages_received: u64,
    /// Frames queued for clients
    pub messages_sent: u64,
    /// Frames dropped on full or closed queues
    pub messages_dropped: u64,
    /// Error frames sent back to clients
    pub errors_sent: u64,
}
