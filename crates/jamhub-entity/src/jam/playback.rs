//! Shared playback state and the rules that keep it consistent with the playlist.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Authoritative playback tuple of a jam.
///
/// `last_updated` is always a server timestamp. While `is_playing`, clients
/// derive the live position as `current_position_seconds + (now - last_updated)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackState {
    /// Index into the playlist (0 when the playlist is empty).
    pub current_track_index: usize,
    /// Position within the current track, in seconds.
    pub current_position_seconds: f64,
    /// Whether playback is running.
    pub is_playing: bool,
    /// Server time of the last change.
    pub last_updated: DateTime<Utc>,
}

impl PlaybackState {
    /// Index 0, position 0, paused.
    pub fn at_rest(now: DateTime<Utc>) -> Self {
        Self {
            current_track_index: 0,
            current_position_seconds: 0.0,
            is_playing: false,
            last_updated: now,
        }
    }

    /// Force the index into `0..max(1, len)`; an empty playlist also pauses.
    pub fn clamp_to(&mut self, playlist_len: usize) {
        if playlist_len == 0 {
            self.current_track_index = 0;
            self.is_playing = false;
        } else if self.current_track_index >= playlist_len {
            self.current_track_index = playlist_len - 1;
        }
    }

    /// Shift the pointer after the track at `removed` was taken out of the playlist.
    ///
    /// `remaining` is the playlist length after removal. Returns `true` when
    /// the track being pointed at changed, in which case the position is reset
    /// and `last_updated` bumped to `now`.
    pub fn shift_after_removal(
        &mut self,
        removed: usize,
        remaining: usize,
        now: DateTime<Utc>,
    ) -> bool {
        let current = self.current_track_index;

        if removed == current {
            if remaining == 0 {
                self.current_track_index = 0;
                self.is_playing = false;
            } else if removed == remaining {
                // the last track was removed
                self.current_track_index = 0;
            }
            self.current_position_seconds = 0.0;
            self.last_updated = now;
            true
        } else if removed < current {
            self.current_track_index = current - 1;
            false
        } else {
            false
        }
    }

    /// Whether the index points inside a playlist of `playlist_len` tracks.
    pub fn is_consistent_with(&self, playlist_len: usize) -> bool {
        self.current_track_index < playlist_len.max(1)
            && (playlist_len > 0 || !self.is_playing)
    }
}
