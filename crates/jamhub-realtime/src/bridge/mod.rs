//! Bridge between jam service events and WebSocket connections.

pub mod room_bus;

pub use room_bus::RoomBus;
