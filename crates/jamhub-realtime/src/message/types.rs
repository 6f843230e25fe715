//! Inbound and outbound WebSocket message type definitions.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use jamhub_core::types::{Identity, JamCode, TrackId};
use jamhub_entity::jam::{MemberRecord, NewTrack, PermissionPatch, PlaybackState, Track};
use jamhub_entity::{JamSnapshot, JamSummary};
use jamhub_service::{EndReason, PendingJoinRequest};

/// Messages sent by the client to the server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundMessage {
    /// Start a new jam and become its host.
    CreateSession {
        /// Display name.
        name: String,
        /// Host nickname.
        nickname: String,
        /// Whether a password is needed to join.
        #[serde(default)]
        is_private: bool,
        /// Password for private jams.
        #[serde(default)]
        password: Option<String>,
    },
    /// Join an existing jam as a guest.
    JoinSession {
        /// Jam to join.
        jam_code: JamCode,
        /// Guest nickname.
        nickname: String,
        /// Password for private jams.
        #[serde(default)]
        password: Option<String>,
    },
    /// Leave a jam. The host leaving ends it.
    LeaveSession {
        /// Jam to leave.
        jam_code: JamCode,
    },
    /// End a jam. Host only.
    EndSession {
        /// Jam to end.
        jam_code: JamCode,
    },
    /// Host pushes its full playback state.
    SyncPlaybackState {
        /// Jam being synced.
        jam_code: JamCode,
        /// Index into the playlist.
        track_index: usize,
        /// Position in seconds.
        position: f64,
        /// Whether playback runs.
        is_playing: bool,
        /// Replacement playlist.
        #[serde(default)]
        playlist: Option<Vec<NewTrack>>,
    },
    /// Play a queued track from the start.
    PlayTrack {
        /// Target jam.
        jam_code: JamCode,
        /// Track to play.
        track_id: TrackId,
    },
    /// Pause at a position.
    PausePlayback {
        /// Target jam.
        jam_code: JamCode,
        /// Position in seconds.
        position: f64,
    },
    /// Resume from the stored position.
    ResumePlayback {
        /// Target jam.
        jam_code: JamCode,
    },
    /// Seek within the current track.
    SeekPlayback {
        /// Target jam.
        jam_code: JamCode,
        /// Position in seconds.
        position: f64,
    },
    /// Advance to the next track.
    NextTrack {
        /// Target jam.
        jam_code: JamCode,
    },
    /// Append a track.
    AddTrack {
        /// Target jam.
        jam_code: JamCode,
        /// Track to append.
        track: NewTrack,
    },
    /// Remove a track.
    RemoveTrack {
        /// Target jam.
        jam_code: JamCode,
        /// Track to remove.
        track_id: TrackId,
    },
    /// Change a guest's permissions. Host only.
    SetPermissions {
        /// Target jam.
        jam_code: JamCode,
        /// Guest to change.
        target: Identity,
        /// Flags to change.
        permissions: PermissionPatch,
    },
    /// Give every member every permission. Host only.
    GrantAllPermissions {
        /// Target jam.
        jam_code: JamCode,
    },
    /// Hand the host role to another member. Host only.
    TransferHost {
        /// Target jam.
        jam_code: JamCode,
        /// New host.
        target: Identity,
    },
    /// Ask to be let into a private jam.
    RequestJoin {
        /// Target jam.
        jam_code: JamCode,
        /// Nickname to use.
        nickname: String,
    },
    /// Let a requester in. Host only.
    ApproveJoinRequest {
        /// Target jam.
        jam_code: JamCode,
        /// Who asked.
        requester: Identity,
    },
    /// Turn a requester down. Host only.
    DenyJoinRequest {
        /// Target jam.
        jam_code: JamCode,
        /// Who asked.
        requester: Identity,
    },
    /// Pending requests. Host only.
    ListJoinRequests {
        /// Target jam.
        jam_code: JamCode,
    },
    /// Current state of a jam the caller is in.
    GetState {
        /// Target jam.
        jam_code: JamCode,
    },
    /// Public jams the caller could join.
    ListPublicJams,
    /// Pong response to server ping.
    Pong {
        /// Echoed timestamp.
        #[serde(default)]
        timestamp: i64,
    },
}

impl InboundMessage {
    /// Wire name, for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::CreateSession { .. } => "create_session",
            Self::JoinSession { .. } => "join_session",
            Self::LeaveSession { .. } => "leave_session",
            Self::EndSession { .. } => "end_session",
            Self::SyncPlaybackState { .. } => "sync_playback_state",
            Self::PlayTrack { .. } => "play_track",
            Self::PausePlayback { .. } => "pause_playback",
            Self::ResumePlayback { .. } => "resume_playback",
            Self::SeekPlayback { .. } => "seek_playback",
            Self::NextTrack { .. } => "next_track",
            Self::AddTrack { .. } => "add_track",
            Self::RemoveTrack { .. } => "remove_track",
            Self::SetPermissions { .. } => "set_permissions",
            Self::GrantAllPermissions { .. } => "grant_all_permissions",
            Self::TransferHost { .. } => "transfer_host",
            Self::RequestJoin { .. } => "request_join",
            Self::ApproveJoinRequest { .. } => "approve_join_request",
            Self::DenyJoinRequest { .. } => "deny_join_request",
            Self::ListJoinRequests { .. } => "list_join_requests",
            Self::GetState { .. } => "get_state",
            Self::ListPublicJams => "list_public_jams",
            Self::Pong { .. } => "pong",
        }
    }
}

/// Messages sent by the server to the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundMessage {
    /// First frame on every connection.
    Connected {
        /// Identity the connection acts as.
        identity: Identity,
    },
    /// The recipient created a jam.
    SessionCreated {
        /// New jam code.
        jam_code: JamCode,
        /// Display name.
        name: String,
        /// Link guests can open.
        shareable_link: String,
    },
    /// The recipient joined a jam.
    SessionJoinSuccess {
        /// Full jam state.
        jam: JamSnapshot,
    },
    /// Members or host changed.
    MembersChanged {
        /// Jam code.
        jam_code: JamCode,
        /// Current host.
        host: Identity,
        /// Current members.
        members: BTreeMap<Identity, MemberRecord>,
    },
    /// Playback changed.
    PlaybackStateUpdated {
        /// Jam code.
        jam_code: JamCode,
        /// New playback state.
        playback: PlaybackState,
        /// Replacement playlist, when one was sent.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        playlist: Option<Vec<Track>>,
        /// Who changed it.
        updated_by: Identity,
    },
    /// Queue changed.
    PlaylistUpdated {
        /// Jam code.
        jam_code: JamCode,
        /// Current queue.
        playlist: Vec<Track>,
    },
    /// The jam ended.
    SessionEnded {
        /// Jam code.
        jam_code: JamCode,
        /// Why.
        reason: EndReason,
    },
    /// Someone asked to join (host only).
    JoinRequested {
        /// Jam code.
        jam_code: JamCode,
        /// Who asked.
        requester: Identity,
        /// Requested nickname.
        nickname: String,
    },
    /// The recipient's join request was turned down.
    JoinRequestDenied {
        /// Jam code.
        jam_code: JamCode,
    },
    /// Reply to `list_join_requests`.
    JoinRequests {
        /// Jam code.
        jam_code: JamCode,
        /// Pending requests, oldest first.
        requests: Vec<PendingJoinRequest>,
    },
    /// Reply to `get_state`.
    JamState {
        /// Full jam state.
        jam: JamSnapshot,
    },
    /// Reply to `list_public_jams`.
    PublicJams {
        /// Joinable jams, newest first.
        jams: Vec<JamSummary>,
    },
    /// Ping (server keepalive).
    Ping {
        /// Server timestamp in milliseconds.
        timestamp: i64,
    },
    /// A command failed.
    Error {
        /// Error code.
        code: String,
        /// Error description.
        message: String,
    },
}
