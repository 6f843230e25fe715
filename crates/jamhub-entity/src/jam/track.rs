//! Queued tracks and their media source references.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use jamhub_core::error::AppError;
use jamhub_core::types::{Identity, TrackId};

/// Where the audio for a track comes from. Opaque to the sync logic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TrackSource {
    /// A YouTube video.
    Youtube {
        /// YouTube video id.
        video_id: String,
    },
    /// A file served over HTTP.
    HostedFile {
        /// Direct URL.
        url: String,
    },
    /// A Google Drive file.
    DriveFile {
        /// Drive file id.
        file_id: String,
    },
}

impl TrackSource {
    /// Reject empty references.
    pub fn validate(&self) -> Result<(), AppError> {
        let reference = match self {
            Self::Youtube { video_id } => video_id,
            Self::HostedFile { url } => url,
            Self::DriveFile { file_id } => file_id,
        };
        if reference.trim().is_empty() {
            return Err(AppError::invalid_argument(
                "Track source reference must not be empty",
            ));
        }
        Ok(())
    }
}

/// One entry of a jam playlist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    /// Unique id within the playlist.
    pub id: TrackId,
    /// Display title.
    pub title: String,
    /// Display artist.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artist: Option<String>,
    /// Media reference.
    pub source: TrackSource,
    /// Who queued it, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub added_by: Option<Identity>,
    /// When it was queued.
    pub added_at: DateTime<Utc>,
}

/// Client-supplied track, before the server finalizes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct NewTrack {
    /// Optional client-chosen id; a fresh one is assigned when absent.
    #[serde(default)]
    pub id: Option<TrackId>,
    /// Display title.
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    /// Display artist.
    #[serde(default)]
    #[validate(length(max = 200))]
    pub artist: Option<String>,
    /// Media reference.
    pub source: TrackSource,
}

impl NewTrack {
    /// Validate and turn into a stored [`Track`].
    pub fn finalize(self, added_by: Option<Identity>, now: DateTime<Utc>) -> Result<Track, AppError> {
        self.validate()?;
        self.source.validate()?;
        if self.title.trim().is_empty() {
            return Err(AppError::invalid_argument("Track title must not be blank"));
        }

        Ok(Track {
            id: self.id.unwrap_or_default(),
            title: self.title.trim().to_string(),
            artist: self.artist,
            source: self.source,
            added_by,
            added_at: now,
        })
    }
}
