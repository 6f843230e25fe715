//! # jamhub-store
//!
//! Document store implementations for JamHub jam sessions. Supports two modes:
//!
//! - **memory**: In-process store backed by [dashmap](https://crates.io/crates/dashmap)
//! - **redis**: Redis-backed store using the [redis](https://crates.io/crates/redis) crate
//!
//! The provider is selected at runtime based on configuration. Writes made
//! through [`StoreManager`] are announced on its [`watch`](StoreManager::watch) feed.

pub mod keys;
#[cfg(feature = "memory")]
pub mod memory;
pub mod provider;
#[cfg(feature = "redis-backend")]
pub mod redis;
pub mod watch;

pub use provider::StoreManager;
pub use watch::{ChangeKind, DocumentChange};
