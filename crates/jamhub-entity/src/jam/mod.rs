//! Jam session domain entities.

pub mod join_request;
pub mod member;
pub mod model;
pub mod playback;
pub mod track;

pub use join_request::JoinRequest;
pub use member::{MemberRecord, PermissionPatch, Permissions};
pub use model::{Jam, JamPatch, JamSnapshot, JamSummary};
pub use playback::PlaybackState;
pub use track::{NewTrack, Track, TrackSource};
