//! Host-authoritative playback state.
//!
//! Every write stamps `last_updated` with server time; client clocks are
//! never trusted.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use jamhub_core::error::AppError;
use jamhub_core::result::AppResult;
use jamhub_core::types::{Identity, JamCode, TrackId};
use jamhub_entity::jam::{NewTrack, PlaybackState, Track};
use jamhub_entity::{Jam, JamPatch, JamSnapshot};

use crate::access::{require_host, require_member};
use crate::events::{EventPublisher, JamEvent, JamEventKind};
use crate::input;
use crate::registry::JamRegistry;
use crate::repository::JamRepository;

/// Full playback state pushed by the host.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HostSync {
    /// Index into the playlist.
    pub track_index: usize,
    /// Position within the track, in seconds.
    pub position: f64,
    /// Whether playback runs.
    pub is_playing: bool,
}

/// Single-step playback commands.
#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackCommand {
    /// Start the given track from the beginning.
    PlayTrack(TrackId),
    /// Pause at `position`.
    Pause {
        /// Position the host paused at.
        position: f64,
    },
    /// Resume from the stored position.
    Resume,
    /// Jump to `position` in the current track.
    Seek {
        /// Target position.
        position: f64,
    },
    /// Advance to the next track; past the end wraps to 0 and pauses.
    Next,
}

impl PlaybackCommand {
    fn action(&self) -> &'static str {
        match self {
            Self::PlayTrack(_) => "play tracks",
            Self::Pause { .. } => "pause playback",
            Self::Resume => "resume playback",
            Self::Seek { .. } => "seek",
            Self::Next => "skip tracks",
        }
    }

    /// Compute the state that follows the jam's current one.
    fn apply(&self, jam: &Jam, now: DateTime<Utc>) -> AppResult<PlaybackState> {
        let len = jam.playlist.len();
        if len == 0 {
            return Err(AppError::invalid_argument("The playlist is empty"));
        }

        let mut state = jam.playback.clone();
        match self {
            Self::PlayTrack(track_id) => {
                let index = jam.track_position(track_id).ok_or_else(|| {
                    AppError::not_found(format!("Track {track_id} is not in the playlist"))
                })?;
                state.current_track_index = index;
                state.current_position_seconds = 0.0;
                state.is_playing = true;
            }
            Self::Pause { position } => {
                state.current_position_seconds = input::position(*position)?;
                state.is_playing = false;
            }
            Self::Resume => {
                if state.is_playing {
                    return Err(AppError::invalid_argument("Playback is already running"));
                }
                state.is_playing = true;
            }
            Self::Seek { position } => {
                state.current_position_seconds = input::position(*position)?;
            }
            Self::Next => {
                let next = state.current_track_index + 1;
                if next >= len {
                    state.current_track_index = 0;
                    state.is_playing = false;
                } else {
                    state.current_track_index = next;
                }
                state.current_position_seconds = 0.0;
            }
        }

        state.clamp_to(len);
        state.last_updated = now;
        Ok(state)
    }
}

/// Owns the playback tuple of every jam.
#[derive(Debug, Clone)]
pub struct PlaybackStateMachine {
    /// Jam documents.
    repository: Arc<JamRepository>,
    /// Locks.
    registry: Arc<JamRegistry>,
    /// Room fan-out.
    publisher: Arc<dyn EventPublisher>,
    /// Queue cap applied to host-supplied playlists.
    max_playlist_length: usize,
}

impl PlaybackStateMachine {
    /// Creates a new playback state machine.
    pub fn new(
        repository: Arc<JamRepository>,
        registry: Arc<JamRegistry>,
        publisher: Arc<dyn EventPublisher>,
        max_playlist_length: usize,
    ) -> Self {
        Self {
            repository,
            registry,
            publisher,
            max_playlist_length,
        }
    }

    /// Replace the playback state, and optionally the playlist, in one write.
    ///
    /// Host only. The index is clamped into the (new) playlist rather than
    /// rejected. Observers other than the host receive the update.
    pub async fn apply_host_sync(
        &self,
        requester: &Identity,
        code: &JamCode,
        sync: HostSync,
        playlist: Option<Vec<NewTrack>>,
    ) -> AppResult<PlaybackState> {
        let position = input::position(sync.position)?;

        let _guard = self.registry.lock(code).await?;
        let mut jam = self.repository.get_active(code).await?;
        require_host(&jam, requester, "sync playback")?;

        let now = Utc::now();
        let replaced = match playlist {
            Some(tracks) => Some(self.adopt_playlist(&jam, tracks, requester, now)?),
            None => None,
        };
        if let Some(tracks) = &replaced {
            jam.playlist = tracks.clone();
        }

        jam.playback = PlaybackState {
            current_track_index: sync.track_index,
            current_position_seconds: position,
            is_playing: sync.is_playing,
            last_updated: now,
        };
        jam.playback.clamp_to(jam.playlist.len());

        let patch = if replaced.is_some() {
            JamPatch::queue_of(&jam)
        } else {
            JamPatch::playback_of(&jam)
        };
        self.repository.update(code, &patch).await?;

        self.publisher.publish(JamEvent::to_room_except(
            code,
            requester,
            JamEventKind::PlaybackStateUpdated {
                playback: jam.playback.clone(),
                playlist: replaced,
                updated_by: requester.clone(),
            },
        ));

        debug!(
            jam = %code,
            index = jam.playback.current_track_index,
            position = jam.playback.current_position_seconds,
            playing = jam.playback.is_playing,
            "Host sync applied"
        );
        Ok(jam.playback)
    }

    /// Apply a single playback command. Host only; the whole room is told.
    pub async fn apply_command(
        &self,
        requester: &Identity,
        code: &JamCode,
        command: PlaybackCommand,
    ) -> AppResult<PlaybackState> {
        let _guard = self.registry.lock(code).await?;
        let mut jam = self.repository.get_active(code).await?;
        require_host(&jam, requester, command.action())?;

        jam.playback = command.apply(&jam, Utc::now())?;
        self.repository
            .update(code, &JamPatch::playback_of(&jam))
            .await?;

        self.publisher.publish(JamEvent::to_room(
            code,
            JamEventKind::PlaybackStateUpdated {
                playback: jam.playback.clone(),
                playlist: None,
                updated_by: requester.clone(),
            },
        ));

        info!(jam = %code, command = ?command, index = jam.playback.current_track_index, "Playback command applied");
        Ok(jam.playback)
    }

    /// Current state of a jam, for members only.
    pub async fn read_state(&self, requester: &Identity, code: &JamCode) -> AppResult<JamSnapshot> {
        let jam = self.repository.get_active(code).await?;
        require_member(&jam, requester)?;
        Ok(jam.snapshot())
    }

    /// Finalize a host-supplied playlist, keeping provenance of known tracks.
    fn adopt_playlist(
        &self,
        jam: &Jam,
        tracks: Vec<NewTrack>,
        requester: &Identity,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<Track>> {
        if tracks.len() > self.max_playlist_length {
            return Err(AppError::resource_exhausted(format!(
                "Playlists are limited to {} tracks",
                self.max_playlist_length
            )));
        }

        let known: HashMap<&TrackId, &Track> = jam.playlist.iter().map(|t| (&t.id, t)).collect();
        let mut seen = HashSet::with_capacity(tracks.len());
        let mut adopted = Vec::with_capacity(tracks.len());

        for new_track in tracks {
            let mut track = new_track.finalize(Some(requester.clone()), now)?;
            if !seen.insert(track.id.clone()) {
                return Err(AppError::invalid_argument(format!(
                    "Track id {} appears more than once",
                    track.id
                )));
            }
            if let Some(existing) = known.get(&track.id) {
                track.added_by = existing.added_by.clone();
                track.added_at = existing.added_at;
            }
            adopted.push(track);
        }
        Ok(adopted)
    }
}
