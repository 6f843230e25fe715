//! Connection pool: tracks all active connections indexed by identity.

use std::sync::Arc;

use dashmap::DashMap;

use jamhub_core::types::Identity;

use super::handle::{ConnectionHandle, ConnectionId};

/// Thread-safe pool of all active WebSocket connections.
#[derive(Debug, Default)]
pub struct ConnectionPool {
    /// Identity → its connections, oldest first.
    by_identity: DashMap<Identity, Vec<Arc<ConnectionHandle>>>,
    /// Connection ID → connection handle for direct lookup.
    by_id: DashMap<ConnectionId, Arc<ConnectionHandle>>,
}

impl ConnectionPool {
    /// Creates a new empty connection pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a connection to the pool.
    pub fn add(&self, handle: Arc<ConnectionHandle>) {
        self.by_id.insert(handle.id, Arc::clone(&handle));
        self.by_identity
            .entry(handle.identity.clone())
            .or_default()
            .push(handle);
    }

    /// Removes a connection from the pool.
    pub fn remove(&self, conn_id: &ConnectionId) -> Option<Arc<ConnectionHandle>> {
        let (_, handle) = self.by_id.remove(conn_id)?;
        self.by_identity.remove_if_mut(&handle.identity, |_, connections| {
            connections.retain(|c| c.id != *conn_id);
            connections.is_empty()
        });
        Some(handle)
    }

    /// Gets all connections of an identity, oldest first.
    pub fn connections_of(&self, identity: &Identity) -> Vec<Arc<ConnectionHandle>> {
        self.by_identity
            .get(identity)
            .map(|entry| entry.value().clone())
            .unwrap_or_default()
    }

    /// Whether the identity still has an open connection.
    pub fn is_connected(&self, identity: &Identity) -> bool {
        self.by_identity.contains_key(identity)
    }

    /// Gets a specific connection by ID.
    pub fn get(&self, conn_id: &ConnectionId) -> Option<Arc<ConnectionHandle>> {
        self.by_id.get(conn_id).map(|entry| Arc::clone(entry.value()))
    }

    /// Returns total number of active connections.
    pub fn connection_count(&self) -> usize {
        self.by_id.len()
    }

    /// Returns number of connected identities.
    pub fn identity_count(&self) -> usize {
        self.by_identity.len()
    }

    /// Returns all connection handles.
    pub fn all_connections(&self) -> Vec<Arc<ConnectionHandle>> {
        self.by_id
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect()
    }
}
