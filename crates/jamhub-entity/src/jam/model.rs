//! Jam session document model.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use jamhub_core::types::{Identity, JamCode, TrackId};

use super::join_request::JoinRequest;
use super::member::{MemberRecord, Permissions};
use super::playback::PlaybackState;
use super::track::Track;

/// One listening party, as stored in the document store.
///
/// While `is_active`, `host` is always a key of `members` and the playback
/// index is consistent with the playlist length.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Jam {
    /// Shareable session code.
    pub code: JamCode,
    /// Display name.
    pub name: String,
    /// Current host.
    pub host: Identity,
    /// Members keyed by identity.
    pub members: BTreeMap<Identity, MemberRecord>,
    /// Queue, in play order.
    pub playlist: Vec<Track>,
    /// Shared playback state.
    pub playback: PlaybackState,
    /// `false` once the host has left or ended the jam.
    pub is_active: bool,
    /// Whether joining requires a password or host approval.
    #[serde(default)]
    pub is_private: bool,
    /// Argon2 hash of the join password for private jams.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_hash: Option<String>,
    /// Pending join requests keyed by requester.
    #[serde(default)]
    pub join_requests: BTreeMap<Identity, JoinRequest>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// End time, once ended.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,
}

impl Jam {
    /// A fresh active jam with `host` as its only member.
    pub fn new(
        code: JamCode,
        name: impl Into<String>,
        host: Identity,
        host_nickname: impl Into<String>,
        password_hash: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        let mut members = BTreeMap::new();
        members.insert(host.clone(), MemberRecord::host(host_nickname, now));

        Self {
            code,
            name: name.into(),
            host,
            members,
            playlist: Vec::new(),
            playback: PlaybackState::at_rest(now),
            is_active: true,
            is_private: password_hash.is_some(),
            password_hash,
            join_requests: BTreeMap::new(),
            created_at: now,
            ended_at: None,
        }
    }

    /// Whether `identity` is the current host.
    pub fn is_host(&self, identity: &Identity) -> bool {
        &self.host == identity
    }

    /// Whether `identity` is a member.
    pub fn is_member(&self, identity: &Identity) -> bool {
        self.members.contains_key(identity)
    }

    /// Effective permissions of `identity`, or `None` if not a member.
    pub fn permissions_of(&self, identity: &Identity) -> Option<Permissions> {
        if self.is_host(identity) {
            return Some(Permissions::all());
        }
        self.members.get(identity).map(|m| m.permissions)
    }

    /// Whether `identity` may queue tracks.
    pub fn can_add(&self, identity: &Identity) -> bool {
        self.permissions_of(identity).is_some_and(|p| p.can_add)
    }

    /// Whether `identity` may remove queued tracks.
    pub fn can_remove(&self, identity: &Identity) -> bool {
        self.permissions_of(identity).is_some_and(|p| p.can_remove)
    }

    /// Position of the track with `id` in the playlist.
    pub fn track_position(&self, id: &TrackId) -> Option<usize> {
        self.playlist.iter().position(|t| &t.id == id)
    }

    /// Nickname of the host, if still a member.
    pub fn host_nickname(&self) -> Option<&str> {
        self.members.get(&self.host).map(|m| m.nickname.as_str())
    }

    /// Check the structural invariants of an active jam.
    pub fn invariants_hold(&self) -> bool {
        let host_ok = !self.is_active || self.members.contains_key(&self.host);
        host_ok && self.playback.is_consistent_with(self.playlist.len())
    }

    /// Full state as seen by members. Never includes the password hash.
    pub fn snapshot(&self) -> JamSnapshot {
        JamSnapshot {
            code: self.code.clone(),
            name: self.name.clone(),
            host: self.host.clone(),
            members: self.members.clone(),
            playlist: self.playlist.clone(),
            playback: self.playback.clone(),
            is_active: self.is_active,
            is_private: self.is_private,
            created_at: self.created_at,
            ended_at: self.ended_at,
        }
    }

    /// Public listing entry.
    pub fn summary(&self) -> JamSummary {
        JamSummary {
            code: self.code.clone(),
            name: self.name.clone(),
            host_nickname: self.host_nickname().map(str::to_string),
            member_count: self.members.len(),
            track_count: self.playlist.len(),
            is_private: self.is_private,
            is_active: self.is_active,
            created_at: self.created_at,
        }
    }
}

/// Partial update of a stored [`Jam`]. Only the `Some` fields are written.
#[derive(Debug, Clone, Default, Serialize)]
pub struct JamPatch {
    /// New host.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<Identity>,
    /// Replacement member map.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub members: Option<BTreeMap<Identity, MemberRecord>>,
    /// Replacement playlist.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub playlist: Option<Vec<Track>>,
    /// Replacement playback state.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub playback: Option<PlaybackState>,
    /// New activity flag.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    /// Replacement join request map.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub join_requests: Option<BTreeMap<Identity, JoinRequest>>,
    /// End time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,
}

impl JamPatch {
    /// Patch carrying the member map of `jam`.
    pub fn members_of(jam: &Jam) -> Self {
        Self {
            members: Some(jam.members.clone()),
            ..Default::default()
        }
    }

    /// Patch carrying the playback state of `jam`.
    pub fn playback_of(jam: &Jam) -> Self {
        Self {
            playback: Some(jam.playback.clone()),
            ..Default::default()
        }
    }

    /// Patch carrying both the playlist and playback state of `jam`.
    pub fn queue_of(jam: &Jam) -> Self {
        Self {
            playlist: Some(jam.playlist.clone()),
            playback: Some(jam.playback.clone()),
            ..Default::default()
        }
    }

    /// Add the join request map of `jam`.
    pub fn with_join_requests(mut self, jam: &Jam) -> Self {
        self.join_requests = Some(jam.join_requests.clone());
        self
    }

    /// Add the host of `jam`.
    pub fn with_host(mut self, jam: &Jam) -> Self {
        self.host = Some(jam.host.clone());
        self
    }

    /// Add the ended flags of `jam`.
    pub fn with_end(mut self, jam: &Jam) -> Self {
        self.is_active = Some(jam.is_active);
        self.ended_at = jam.ended_at;
        self
    }
}

/// Member-visible jam state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JamSnapshot {
    /// Session code.
    pub code: JamCode,
    /// Display name.
    pub name: String,
    /// Current host.
    pub host: Identity,
    /// Members keyed by identity.
    pub members: BTreeMap<Identity, MemberRecord>,
    /// Queue.
    pub playlist: Vec<Track>,
    /// Playback state.
    pub playback: PlaybackState,
    /// Activity flag.
    pub is_active: bool,
    /// Privacy flag.
    pub is_private: bool,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// End time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,
}

/// Public information about a jam, safe to show to non-members.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JamSummary {
    /// Session code.
    pub code: JamCode,
    /// Display name.
    pub name: String,
    /// Host nickname.
    pub host_nickname: Option<String>,
    /// Number of members, host included.
    pub member_count: usize,
    /// Number of queued tracks.
    pub track_count: usize,
    /// Privacy flag.
    pub is_private: bool,
    /// Activity flag.
    pub is_active: bool,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}
