//! Typed jam events and the publisher seam the transport implements.
//!
//! Managers publish only after a successful store write. The transport
//! decides how an event reaches the connections of its audience.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use jamhub_core::types::{Identity, JamCode};
use jamhub_entity::jam::{MemberRecord, PlaybackState, Track};
use jamhub_entity::JamSnapshot;

/// Who receives an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Audience {
    /// Every identity subscribed to the jam's room.
    Room,
    /// Every room subscriber except one.
    RoomExcept(Identity),
    /// A single identity, whether subscribed or not.
    Only(Identity),
}

/// Why a jam ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    /// The host sent `leave_session`.
    HostLeft,
    /// The host's last connection dropped.
    HostDisconnected,
    /// The host sent `end_session`.
    EndedByHost,
}

/// What happened.
#[derive(Debug, Clone, PartialEq)]
pub enum JamEventKind {
    /// A jam was created by the recipient.
    SessionCreated {
        /// Display name.
        name: String,
        /// Link guests can open to join.
        shareable_link: String,
    },
    /// The recipient is now a member; carries the full state.
    JoinSucceeded {
        /// Member-visible state after the join.
        jam: JamSnapshot,
    },
    /// The member map or the host changed.
    MembersChanged {
        /// Current host.
        host: Identity,
        /// Current members.
        members: BTreeMap<Identity, MemberRecord>,
    },
    /// Shared playback changed.
    PlaybackStateUpdated {
        /// New playback state.
        playback: PlaybackState,
        /// Replacement playlist when the change carried one.
        playlist: Option<Vec<Track>>,
        /// Who caused the change.
        updated_by: Identity,
    },
    /// The queue changed.
    PlaylistUpdated {
        /// Current queue.
        playlist: Vec<Track>,
    },
    /// The jam ended. No event for this jam follows.
    SessionEnded {
        /// Why it ended.
        reason: EndReason,
    },
    /// Someone asked to join a private jam (sent to the host).
    JoinRequested {
        /// Requesting identity.
        requester: Identity,
        /// Nickname they asked for.
        nickname: String,
    },
    /// The host turned the recipient's join request down.
    JoinRequestDenied,
}

impl JamEventKind {
    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::SessionCreated { .. } => "session_created",
            Self::JoinSucceeded { .. } => "session_join_success",
            Self::MembersChanged { .. } => "members_changed",
            Self::PlaybackStateUpdated { .. } => "playback_state_updated",
            Self::PlaylistUpdated { .. } => "playlist_updated",
            Self::SessionEnded { .. } => "session_ended",
            Self::JoinRequested { .. } => "join_requested",
            Self::JoinRequestDenied => "join_request_denied",
        }
    }
}

/// One committed change of one jam.
#[derive(Debug, Clone, PartialEq)]
pub struct JamEvent {
    /// Jam the event belongs to.
    pub jam_code: JamCode,
    /// Recipients.
    pub audience: Audience,
    /// Payload.
    pub kind: JamEventKind,
    /// Server time of the commit.
    pub occurred_at: DateTime<Utc>,
}

impl JamEvent {
    /// Event for the whole room.
    pub fn to_room(jam_code: &JamCode, kind: JamEventKind) -> Self {
        Self::new(jam_code, Audience::Room, kind)
    }

    /// Event for the room minus `excluded`.
    pub fn to_room_except(jam_code: &JamCode, excluded: &Identity, kind: JamEventKind) -> Self {
        Self::new(jam_code, Audience::RoomExcept(excluded.clone()), kind)
    }

    /// Event for `recipient` alone.
    pub fn to_only(jam_code: &JamCode, recipient: &Identity, kind: JamEventKind) -> Self {
        Self::new(jam_code, Audience::Only(recipient.clone()), kind)
    }

    fn new(jam_code: &JamCode, audience: Audience, kind: JamEventKind) -> Self {
        Self {
            jam_code: jam_code.clone(),
            audience,
            kind,
            occurred_at: Utc::now(),
        }
    }
}

/// Topic-per-jam publish/subscribe used by the managers.
///
/// Implementations must never block; a slow recipient may lose events but
/// must not stall the jam's lock holder.
pub trait EventPublisher: Send + Sync + std::fmt::Debug + 'static {
    /// Add `identity` to the jam's room.
    fn subscribe(&self, jam_code: &JamCode, identity: &Identity);

    /// Remove `identity` from the jam's room.
    fn unsubscribe(&self, jam_code: &JamCode, identity: &Identity);

    /// Deliver an event to its audience.
    fn publish(&self, event: JamEvent);

    /// Drop the room. Later events for the jam are discarded.
    fn close_room(&self, jam_code: &JamCode);
}

/// Publisher that resolves audiences in memory and records every delivery.
///
/// Used by tests and by embedders that poll instead of holding connections.
#[derive(Debug, Default)]
pub struct RecordingPublisher {
    state: Mutex<RecordingState>,
}

#[derive(Debug, Default)]
struct RecordingState {
    rooms: BTreeMap<JamCode, BTreeSet<Identity>>,
    closed: HashSet<JamCode>,
    deliveries: Vec<(Identity, JamEvent)>,
}

impl RecordingPublisher {
    /// Create an empty publisher.
    pub fn new() -> Self {
        Self::default()
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut RecordingState) -> R) -> R {
        let mut state = self
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut state)
    }

    /// Event kinds delivered to `identity`, oldest first.
    pub fn delivered_to(&self, identity: &Identity) -> Vec<JamEventKind> {
        self.with_state(|state| {
            state
                .deliveries
                .iter()
                .filter(|(recipient, _)| recipient == identity)
                .map(|(_, event)| event.kind.clone())
                .collect()
        })
    }

    /// Every delivery, oldest first.
    pub fn deliveries(&self) -> Vec<(Identity, JamEvent)> {
        self.with_state(|state| state.deliveries.clone())
    }

    /// Current subscribers of a room.
    pub fn room(&self, jam_code: &JamCode) -> BTreeSet<Identity> {
        self.with_state(|state| state.rooms.get(jam_code).cloned().unwrap_or_default())
    }

    /// Forget recorded deliveries.
    pub fn clear(&self) {
        self.with_state(|state| state.deliveries.clear());
    }
}

impl EventPublisher for RecordingPublisher {
    fn subscribe(&self, jam_code: &JamCode, identity: &Identity) {
        self.with_state(|state| {
            if !state.closed.contains(jam_code) {
                state
                    .rooms
                    .entry(jam_code.clone())
                    .or_default()
                    .insert(identity.clone());
            }
        });
    }

    fn unsubscribe(&self, jam_code: &JamCode, identity: &Identity) {
        self.with_state(|state| {
            if let Some(room) = state.rooms.get_mut(jam_code) {
                room.remove(identity);
            }
        });
    }

    fn publish(&self, event: JamEvent) {
        self.with_state(|state| {
            if state.closed.contains(&event.jam_code) {
                return;
            }
            let room = state.rooms.get(&event.jam_code).cloned().unwrap_or_default();
            let recipients: Vec<Identity> = match &event.audience {
                Audience::Room => room.into_iter().collect(),
                Audience::RoomExcept(excluded) => {
                    room.into_iter().filter(|id| id != excluded).collect()
                }
                Audience::Only(recipient) => vec![recipient.clone()],
            };
            for recipient in recipients {
                state.deliveries.push((recipient, event.clone()));
            }
        });
    }

    fn close_room(&self, jam_code: &JamCode) {
        self.with_state(|state| {
            state.rooms.remove(jam_code);
            state.closed.insert(jam_code.clone());
        });
    }
}
