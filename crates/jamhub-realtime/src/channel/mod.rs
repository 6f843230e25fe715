//! Jam room channels.

pub mod channel;
pub mod registry;
pub mod types;

pub use registry::ChannelRegistry;
pub use types::ChannelType;
