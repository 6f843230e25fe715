//! Room fan-out: the transport side of the jam event publisher.

use std::sync::Arc;
use std::time::Duration;

use moka::sync::Cache;
use tracing::debug;

use jamhub_core::types::{Identity, JamCode};
use jamhub_service::{Audience, EventPublisher, JamEvent};

use crate::channel::{ChannelRegistry, ChannelType};
use crate::connection::ConnectionPool;
use crate::message::builder;
use crate::metrics::RealtimeMetrics;

/// Delivers jam events to the connections of their audience.
///
/// Each event is serialized once and queued on every recipient connection.
/// Closed rooms are remembered for a while so stragglers are dropped.
#[derive(Clone)]
pub struct RoomBus {
    /// Room membership.
    channels: Arc<ChannelRegistry>,
    /// Open connections.
    pool: Arc<ConnectionPool>,
    /// Recently closed rooms.
    tombstones: Cache<JamCode, ()>,
    /// Delivery counters.
    metrics: Arc<RealtimeMetrics>,
}

impl std::fmt::Debug for RoomBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoomBus")
            .field("rooms", &self.channels.channel_count())
            .field("tombstones", &self.tombstones.entry_count())
            .finish()
    }
}

impl RoomBus {
    /// Creates a bus over the given rooms and connections.
    pub fn new(
        channels: Arc<ChannelRegistry>,
        pool: Arc<ConnectionPool>,
        metrics: Arc<RealtimeMetrics>,
        ended_room_retention: Duration,
    ) -> Self {
        Self {
            channels,
            pool,
            tombstones: Cache::builder()
                .time_to_live(ended_room_retention)
                .build(),
            metrics,
        }
    }

    fn room_name(jam_code: &JamCode) -> String {
        ChannelType::Jam(jam_code.clone()).to_channel_string()
    }

    /// Whether the room was closed recently.
    pub fn is_closed(&self, jam_code: &JamCode) -> bool {
        self.tombstones.contains_key(jam_code)
    }

    /// Identities subscribed to a room.
    pub fn room_members(&self, jam_code: &JamCode) -> Vec<Identity> {
        self.channels.get_subscribers(&Self::room_name(jam_code))
    }

    fn recipients(&self, event: &JamEvent) -> Vec<Identity> {
        match &event.audience {
            Audience::Room => self.room_members(&event.jam_code),
            Audience::RoomExcept(excluded) => self
                .room_members(&event.jam_code)
                .into_iter()
                .filter(|identity| identity != excluded)
                .collect(),
            Audience::Only(recipient) => vec![recipient.clone()],
        }
    }
}

impl EventPublisher for RoomBus {
    fn subscribe(&self, jam_code: &JamCode, identity: &Identity) {
        if self.is_closed(jam_code) {
            return;
        }
        self.channels
            .subscribe(Self::room_name(jam_code), identity.clone());
    }

    fn unsubscribe(&self, jam_code: &JamCode, identity: &Identity) {
        self.channels.unsubscribe(&Self::room_name(jam_code), identity);
    }

    fn publish(&self, event: JamEvent) {
        if self.is_closed(&event.jam_code) {
            debug!(jam = %event.jam_code, event = event.kind.name(), "Dropping event for closed room");
            return;
        }

        let Some(frame) = builder::encode(&builder::from_event(&event)) else {
            return;
        };

        let recipients = self.recipients(&event);
        let (mut sent, mut dropped) = (0u64, 0u64);
        for identity in &recipients {
            for conn in self.pool.connections_of(identity) {
                if conn.send(frame.clone()) {
                    sent += 1;
                } else {
                    dropped += 1;
                }
            }
        }
        self.metrics.record_delivery(sent, dropped);

        debug!(
            jam = %event.jam_code,
            event = event.kind.name(),
            recipients = recipients.len(),
            sent,
            dropped,
            "Event delivered"
        );
    }

    fn close_room(&self, jam_code: &JamCode) {
        let dropped = self.channels.close(&Self::room_name(jam_code));
        self.tombstones.insert(jam_code.clone(), ());
        debug!(jam = %jam_code, subscribers = dropped.len(), "Room closed");
    }
}
