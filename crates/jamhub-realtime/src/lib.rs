//! # jamhub-realtime
//!
//! WebSocket engine for JamHub. Every connection belongs to one
//! [`Identity`](jamhub_core::types::Identity); identities are subscribed to
//! jam rooms by the session services through [`RoomBus`], which is the
//! transport's [`EventPublisher`](jamhub_service::EventPublisher).
//!
//! Inbound frames are validated, parsed into
//! [`InboundMessage`](message::InboundMessage), and routed by the
//! [`CommandDispatcher`]. Failures go back to the sender as one `error` frame.

pub mod bridge;
pub mod channel;
pub mod connection;
pub mod dispatcher;
pub mod message;
pub mod metrics;
pub mod server;

pub use bridge::RoomBus;
pub use channel::ChannelRegistry;
pub use connection::{ConnectionHandle, ConnectionManager};
pub use dispatcher::CommandDispatcher;
pub use server::RealtimeEngine;
