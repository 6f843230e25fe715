//! WebSocket wire messages: types, frame checks, and builders.

pub mod builder;
pub mod types;
pub mod validator;

pub use types::{InboundMessage, OutboundMessage};
