//! Builders for outbound frames.

use chrono::Utc;
use tracing::error;

use jamhub_core::error::AppError;
use jamhub_service::{JamEvent, JamEventKind};

use super::types::OutboundMessage;

/// Wire form of a committed jam event.
pub fn from_event(event: &JamEvent) -> OutboundMessage {
    let jam_code = event.jam_code.clone();
    match &event.kind {
        JamEventKind::SessionCreated {
            name,
            shareable_link,
        } => OutboundMessage::SessionCreated {
            jam_code,
            name: name.clone(),
            shareable_link: shareable_link.clone(),
        },
        JamEventKind::JoinSucceeded { jam } => OutboundMessage::SessionJoinSuccess { jam: jam.clone() },
        JamEventKind::MembersChanged { host, members } => OutboundMessage::MembersChanged {
            jam_code,
            host: host.clone(),
            members: members.clone(),
        },
        JamEventKind::PlaybackStateUpdated {
            playback,
            playlist,
            updated_by,
        } => OutboundMessage::PlaybackStateUpdated {
            jam_code,
            playback: playback.clone(),
            playlist: playlist.clone(),
            updated_by: updated_by.clone(),
        },
        JamEventKind::PlaylistUpdated { playlist } => OutboundMessage::PlaylistUpdated {
            jam_code,
            playlist: playlist.clone(),
        },
        JamEventKind::SessionEnded { reason } => OutboundMessage::SessionEnded {
            jam_code,
            reason: *reason,
        },
        JamEventKind::JoinRequested {
            requester,
            nickname,
        } => OutboundMessage::JoinRequested {
            jam_code,
            requester: requester.clone(),
            nickname: nickname.clone(),
        },
        JamEventKind::JoinRequestDenied => OutboundMessage::JoinRequestDenied { jam_code },
    }
}

/// Error frame for a failed command.
pub fn build_error(err: &AppError) -> OutboundMessage {
    OutboundMessage::Error {
        code: err.kind.to_string(),
        message: err.message.clone(),
    }
}

/// Keepalive ping.
pub fn build_ping() -> OutboundMessage {
    OutboundMessage::Ping {
        timestamp: Utc::now().timestamp_millis(),
    }
}

/// Serialize a frame, logging instead of failing.
pub fn encode(message: &OutboundMessage) -> Option<String> {
    match serde_json::to_string(message) {
        Ok(frame) => Some(frame),
        Err(e) => {
            error!(error = %e, "Failed to serialize outbound message");
            None
        }
    }
}
