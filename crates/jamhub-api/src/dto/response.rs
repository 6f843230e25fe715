//! Response DTOs.

use serde::{Deserialize, Serialize};

use jamhub_realtime::metrics::MetricsSnapshot;

/// Standard success response wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T: Serialize> {
    /// Whether the request was successful.
    pub success: bool,
    /// Response data.
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Creates a successful response.
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Status.
    pub status: String,
    /// Version.
    pub version: String,
    /// Uptime.
    pub uptime_seconds: u64,
}

/// Detailed health response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetailedHealthResponse {
    /// Overall status: `"ok"` or `"degraded"`.
    pub status: String,
    /// Store status.
    pub store: String,
    /// Open WebSocket connections.
    pub ws_connections: usize,
    /// Connected identities.
    pub identities: usize,
    /// Jam rooms with at least one subscriber.
    pub open_rooms: usize,
    /// Engine counters.
    pub metrics: MetricsSnapshot,
}
