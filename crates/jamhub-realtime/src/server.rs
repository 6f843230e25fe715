//! Top-level real-time engine that ties together all subsystems.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tracing::info;

use jamhub_core::config::{AuthConfig, JamConfig, RealtimeConfig};
use jamhub_core::traits::store::DocumentStore;
use jamhub_service::JamServices;

use crate::bridge::RoomBus;
use crate::channel::ChannelRegistry;
use crate::connection::{ConnectionManager, ConnectionPool, WsAuthenticator};
use crate::dispatcher::CommandDispatcher;
use crate::metrics::RealtimeMetrics;

/// Central real-time engine that coordinates all WebSocket subsystems.
#[derive(Clone)]
pub struct RealtimeEngine {
    /// Connection manager.
    pub connections: Arc<ConnectionManager>,
    /// Jam rooms.
    pub channels: Arc<ChannelRegistry>,
    /// Event fan-out used by the services.
    pub bus: Arc<RoomBus>,
    /// Jam services publishing through `bus`.
    pub services: Arc<JamServices>,
    /// Connection authenticator.
    pub authenticator: Arc<WsAuthenticator>,
    /// Metrics collector.
    pub metrics: Arc<RealtimeMetrics>,
    /// Shutdown signal sender.
    shutdown_tx: broadcast::Sender<()>,
}

impl std::fmt::Debug for RealtimeEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RealtimeEngine").finish()
    }
}

impl RealtimeEngine {
    /// Creates a new real-time engine with all subsystems over `store`.
    pub fn new(
        config: &RealtimeConfig,
        auth: &AuthConfig,
        jam: &JamConfig,
        store: Arc<dyn DocumentStore>,
    ) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);

        let metrics = Arc::new(RealtimeMetrics::new());
        let channels = Arc::new(ChannelRegistry::new());
        let pool = Arc::new(ConnectionPool::new());
        let bus = Arc::new(RoomBus::new(
            Arc::clone(&channels),
            Arc::clone(&pool),
            Arc::clone(&metrics),
            Duration::from_secs(config.ended_room_retention_seconds),
        ));

        let services = Arc::new(JamServices::new(store, jam, bus.clone()));
        let connections = Arc::new(ConnectionManager::new(
            config.clone(),
            pool,
            CommandDispatcher::new(Arc::clone(&services)),
            Arc::clone(&services.lifecycle),
            Arc::clone(&metrics),
        ));
        let authenticator = Arc::new(WsAuthenticator::new(auth));

        info!(auth_enabled = auth.enabled, "Real-time engine initialized");

        Self {
            connections,
            channels,
            bus,
            services,
            authenticator,
            metrics,
            shutdown_tx,
        }
    }

    /// Returns a shutdown receiver for graceful shutdown coordination.
    pub fn shutdown_receiver(&self) -> broadcast::Receiver<()> {
        self.shutdown_tx.subscribe()
    }

    /// Initiates a graceful shutdown of the real-time engine.
    pub fn shutdown(&self) {
        info!("Shutting down real-time engine");
        let _ = self.shutdown_tx.send(());
        self.connections.close_all();
    }
}
