//! # jamhub-service
//!
//! Business logic for JamHub jam sessions. Each manager owns one slice of the
//! session document (members, playback, playlist) and every mutation follows
//! the same shape: take the session lock, load, validate, write once, then
//! publish the resulting events.
//!
//! Services follow constructor injection: the store, the registry, and the
//! event publisher are provided at construction time via `Arc` references.
//! [`JamServices`] wires a complete set.

mod access;
pub mod code;
pub mod directory;
pub mod events;
pub mod input;
pub mod join_request;
pub mod lifecycle;
pub mod membership;
pub mod password;
pub mod playback;
pub mod playlist;
pub mod registry;
pub mod repository;
pub mod services;
#[cfg(test)]
mod test_support;

pub use directory::JamDirectory;
pub use events::{Audience, EndReason, EventPublisher, JamEvent, JamEventKind, RecordingPublisher};
pub use join_request::{JoinRequestService, PendingJoinRequest};
pub use lifecycle::{CreateJam, CreatedJam, JoinJam, SessionLifecycle};
pub use membership::MembershipManager;
pub use playback::{HostSync, PlaybackCommand, PlaybackStateMachine};
pub use playlist::PlaylistManager;
pub use registry::JamRegistry;
pub use repository::JamRepository;
pub use services::JamServices;
