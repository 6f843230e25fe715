//! Queue edits and the index shift that keeps playback pointing at the right track.

use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use jamhub_core::error::AppError;
use jamhub_core::result::AppResult;
use jamhub_core::types::{Identity, JamCode, TrackId};
use jamhub_entity::jam::{NewTrack, Track};
use jamhub_entity::JamPatch;

use crate::access::require_member;
use crate::events::{EventPublisher, JamEvent, JamEventKind};
use crate::registry::JamRegistry;
use crate::repository::JamRepository;

/// Adds and removes queued tracks.
#[derive(Debug, Clone)]
pub struct PlaylistManager {
    /// Jam documents.
    repository: Arc<JamRepository>,
    /// Locks.
    registry: Arc<JamRegistry>,
    /// Room fan-out.
    publisher: Arc<dyn EventPublisher>,
    /// Queue cap.
    max_playlist_length: usize,
}

impl PlaylistManager {
    /// Creates a new playlist manager.
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

    /// Append a track. Requires the host or `can_add`.
    pub async fn add_track(
        &self,
        requester: &Identity,
        code: &JamCode,
        track: NewTrack,
    ) -> AppResult<Track> {
        let _guard = self.registry.lock(code).await?;
        let mut jam = self.repository.get_active(code).await?;
        require_member(&jam, requester)?;
        if !jam.can_add(requester) {
            return Err(AppError::forbidden("You are not allowed to add tracks"));
        }
        if jam.playlist.len() >= self.max_playlist_length {
            return Err(AppError::resource_exhausted(format!(
                "Playlists are limited to {} tracks",
                self.max_playlist_length
            )));
        }

        let track = track.finalize(Some(requester.clone()), Utc::now())?;
        if jam.track_position(&track.id).is_some() {
            return Err(AppError::invalid_argument(format!(
                "Track id {} is already in the playlist",
                track.id
            )));
        }
        jam.playlist.push(track.clone());

        self.repository
            .update(
                code,
                &JamPatch {
                    playlist: Some(jam.playlist.clone()),
                    ..Default::default()
                },
            )
            .await?;

        self.publisher.publish(JamEvent::to_room(
            code,
            JamEventKind::PlaylistUpdated {
                playlist: jam.playlist,
            },
        ));

        info!(jam = %code, track = %track.id, by = %requester, "Track added");
        Ok(track)
    }

    /// Remove a track and shift the playback pointer. Requires the host or `can_remove`.
    ///
    /// Returns the removed track.
    pub async fn remove_track(
        &self,
        requester: &Identity,
        code: &JamCode,
        track_id: &TrackId,
    ) -> AppResult<Track> {
        let _guard = self.registry.lock(code).await?;
        let mut jam = self.repository.get_active(code).await?;
        require_member(&jam, requester)?;
        if !jam.can_remove(requester) {
            return Err(AppError::forbidden("You are not allowed to remove tracks"));
        }

        let index = jam.track_position(track_id).ok_or_else(|| {
            AppError::not_found(format!("Track {track_id} is not in the playlist"))
        })?;
        let removed = jam.playlist.remove(index);
        let retargeted =
            jam.playback
                .shift_after_removal(index, jam.playlist.len(), Utc::now());

        self.repository
            .update(code, &JamPatch::queue_of(&jam))
            .await?;

        self.publisher.publish(JamEvent::to_room(
            code,
            JamEventKind::PlaylistUpdated {
                playlist: jam.playlist.clone(),
            },
        ));
        self.publisher.publish(JamEvent::to_room(
            code,
            JamEventKind::PlaybackStateUpdated {
                playback: jam.playback.clone(),
                playlist: None,
                updated_by: requester.clone(),
            },
        ));

        info!(
            jam = %code,
            track = %track_id,
            by = %requester,
            retargeted,
            index = jam.playback.current_track_index,
            "Track removed"
        );
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use jamhub_core::error::ErrorKind;
    use jamhub_entity::jam::PermissionPatch;

    use super::*;
    use crate::test_support::{
        add_titles, guest, host, join_request, make_services, new_track, start_jam,
    };

    #[tokio::test]
    async fn test_add_appends_in_order() {
        let (services, _events) = make_services();
        let code = start_jam(&services, &host()).await;
        let added = add_titles(&services, &code, &["Song A", "Song B"]).await;

        let jam = services.repository.get_active(&code).await.unwrap();
        let titles: Vec<&str> = jam.playlist.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["Song A", "Song B"]);
        assert_eq!(jam.playlist[0].id, added[0].id);
        assert_eq!(jam.playlist[0].added_by, Some(host()));
    }

    #[tokio::test]
    async fn test_guest_without_can_add_is_forbidden() {
        let (services, events) = make_services();
        let code = start_jam(&services, &host()).await;
        services
            .lifecycle
            .join(&guest(), join_request(&code, "Guest1"))
            .await
            .unwrap();
        events.clear();

        let err = services
            .playlist
            .add_track(&guest(), &code, new_track("Sneaky"))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Forbidden);

        let jam = services.repository.get_active(&code).await.unwrap();
        assert!(jam.playlist.is_empty());
        assert!(events.deliveries().is_empty());
    }

    #[tokio::test]
    async fn test_guest_with_can_add_may_add() {
        let (services, _events) = make_services();
        let code = start_jam(&services, &host()).await;
        services
            .lifecycle
            .join(&guest(), join_request(&code, "Guest1"))
            .await
            .unwrap();
        services
            .membership
            .set_permissions(
                &host(),
                &code,
                &guest(),
                &PermissionPatch {
                    can_add: Some(true),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let track = services
            .playlist
            .add_track(&guest(), &code, new_track("Guest Pick"))
            .await
            .unwrap();
        assert_eq!(track.added_by, Some(guest()));

        let err = services
            .playlist
            .remove_track(&guest(), &code, &track.id)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Forbidden);
    }

    #[tokio::test]
    async fn test_add_then_remove_restores_playlist() {
        let (services, _events) = make_services();
        let code = start_jam(&services, &host()).await;
        add_titles(&services, &code, &["Song A", "Song B"]).await;
        let before = services.repository.get_active(&code).await.unwrap().playlist;

        let track = services
            .playlist
            .add_track(&host(), &code, new_track("Song C"))
            .await
            .unwrap();
        services
            .playlist
            .remove_track(&host(), &code, &track.id)
            .await
            .unwrap();

        let after = services.repository.get_active(&code).await.unwrap().playlist;
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn test_remove_current_track_resets_position() {
        let (services, events) = make_services();
        let code = start_jam(&services, &host()).await;
        let tracks = add_titles(&services, &code, &["Song A", "Song B"]).await;
        services
            .playback
            .apply_host_sync(
                &host(),
                &code,
                crate::playback::HostSync {
                    track_index: 0,
                    position: 48.0,
                    is_playing: true,
                },
                None,
            )
            .await
            .unwrap();
        events.clear();

        services
            .playlist
            .remove_track(&host(), &code, &tracks[0].id)
            .await
            .unwrap();

        let jam = services.repository.get_active(&code).await.unwrap();
        assert_eq!(jam.playlist.len(), 1);
        assert_eq!(jam.playlist[0].title, "Song B");
        assert_eq!(jam.playback.current_track_index, 0);
        assert_eq!(jam.playback.current_position_seconds, 0.0);

        let seen = events.delivered_to(&host());
        assert!(matches!(
            seen.as_slice(),
            [
                JamEventKind::PlaylistUpdated { .. },
                JamEventKind::PlaybackStateUpdated { .. }
            ]
        ));
    }

    #[tokio::test]
    async fn test_remove_unknown_track_is_not_found() {
        let (services, _events) = make_services();
        let code = start_jam(&services, &host()).await;
        let err = services
            .playlist
            .remove_track(&host(), &code, &TrackId::from("missing"))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_duplicate_track_id_is_rejected() {
        let (services, _events) = make_services();
        let code = start_jam(&services, &host()).await;
        let mut first = new_track("Song A");
        first.id = Some(TrackId::from("fixed"));
        services
            .playlist
            .add_track(&host(), &code, first.clone())
            .await
            .unwrap();

        let err = services
            .playlist
            .add_track(&host(), &code, first)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidArgument);
    }

    #[tokio::test]
    async fn test_concurrent_removals_do_not_lose_updates() {
        let (services, _events) = make_services();
        let code = start_jam(&services, &host()).await;
        let tracks = add_titles(&services, &code, &["A", "B", "C", "D"]).await;

        let host = host();
        let (a, b) = futures::join!(
            services.playlist.remove_track(&host, &code, &tracks[0].id),
            services.playlist.remove_track(&host, &code, &tracks[2].id),
        );
        a.unwrap();
        b.unwrap();

        let jam = services.repository.get_active(&code).await.unwrap();
        let titles: Vec<&str> = jam.playlist.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["B", "D"]);
        assert!(jam.invariants_hold());
    }
}
