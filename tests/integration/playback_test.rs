//! Integration tests for playlist edits and shared playback.

mod helpers;

use jamhub_core::error::ErrorKind;
use jamhub_entity::jam::PermissionPatch;
use jamhub_service::{HostSync, JamEventKind, PlaybackCommand};

use helpers::{id, join, recorded_services, start_jam, track};

#[tokio::test]
async fn test_removing_earlier_track_keeps_current_song() {
    let (services, _events) = recorded_services();
    let host = id("host");
    let code = start_jam(&services, &host).await;

    let mut added = Vec::new();
    for title in ["one", "two", "three", "four"] {
        added.push(
            services
                .playlist
                .add_track(&host, &code, track(title))
                .await
                .unwrap(),
        );
    }
    services
        .playback
        .apply_host_sync(
            &host,
            &code,
            HostSync {
                track_index: 2,
                position: 42.0,
                is_playing: true,
            },
            None,
        )
        .await
        .unwrap();

    services
        .playlist
        .remove_track(&host, &code, &added[0].id)
        .await
        .unwrap();

    let state = services.playback.read_state(&host, &code).await.unwrap();
    assert_eq!(state.playlist.len(), 3);
    assert_eq!(state.playback.current_track_index, 1);
    assert_eq!(state.playlist[1].title, "three");
    assert_eq!(state.playback.current_position_seconds, 42.0);
    assert!(state.playback.is_playing);
}

#[tokio::test]
async fn test_removing_current_last_track_wraps_to_start() {
    let (services, _events) = recorded_services();
    let host = id("host");
    let code = start_jam(&services, &host).await;

    let mut added = Vec::new();
    for title in ["one", "two"] {
        added.push(
            services
                .playlist
                .add_track(&host, &code, track(title))
                .await
                .unwrap(),
        );
    }
    services
        .playback
        .apply_command(&host, &code, PlaybackCommand::PlayTrack(added[1].id.clone()))
        .await
        .unwrap();

    services
        .playlist
        .remove_track(&host, &code, &added[1].id)
        .await
        .unwrap();

    let state = services.playback.read_state(&host, &code).await.unwrap();
    assert_eq!(state.playback.current_track_index, 0);
    assert_eq!(state.playback.current_position_seconds, 0.0);
}

#[tokio::test]
async fn test_guest_needs_permission_to_edit_queue() {
    let (services, events) = recorded_services();
    let (host, guest) = (id("host"), id("guest"));
    let code = start_jam(&services, &host).await;
    services.lifecycle.join(&guest, join(&code, "Guest")).await.unwrap();

    let err = services
        .playlist
        .add_track(&guest, &code, track("denied"))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Forbidden);

    services
        .membership
        .set_permissions(
            &host,
            &code,
            &guest,
            &PermissionPatch {
                can_add: Some(true),
                ..PermissionPatch::default()
            },
        )
        .await
        .unwrap();
    events.clear();

    let added = services
        .playlist
        .add_track(&guest, &code, track("allowed"))
        .await
        .unwrap();
    assert_eq!(added.added_by.as_ref(), Some(&guest));
    assert!(events.delivered_to(&host).iter().any(|kind| matches!(
        kind,
        JamEventKind::PlaylistUpdated { playlist } if playlist.len() == 1
    )));

    let err = services
        .playlist
        .remove_track(&guest, &code, &added.id)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Forbidden);
}

#[tokio::test]
async fn test_host_sync_reaches_everyone_but_host() {
    let (services, events) = recorded_services();
    let (host, guest) = (id("host"), id("guest"));
    let code = start_jam(&services, &host).await;
    services.lifecycle.join(&guest, join(&code, "Guest")).await.unwrap();
    events.clear();

    let playback = services
        .playback
        .apply_host_sync(
            &host,
            &code,
            HostSync {
                track_index: 0,
                position: 10.0,
                is_playing: true,
            },
            Some(vec![track("one"), track("two")]),
        )
        .await
        .unwrap();
    assert!(playback.is_playing);

    assert!(events.delivered_to(&host).is_empty());
    assert!(matches!(
        events.delivered_to(&guest).as_slice(),
        [JamEventKind::PlaybackStateUpdated { playlist: Some(list), updated_by, .. }]
            if list.len() == 2 && updated_by == &host
    ));

    let err = services
        .playback
        .apply_host_sync(
            &guest,
            &code,
            HostSync {
                track_index: 1,
                position: 0.0,
                is_playing: false,
            },
            None,
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Forbidden);
}

#[tokio::test]
async fn test_next_past_end_wraps_and_pauses() {
    let (services, _events) = recorded_services();
    let host = id("host");
    let code = start_jam(&services, &host).await;
    for title in ["one", "two"] {
        services
            .playlist
            .add_track(&host, &code, track(title))
            .await
            .unwrap();
    }

    let state = services
        .playback
        .apply_command(&host, &code, PlaybackCommand::Next)
        .await
        .unwrap();
    assert_eq!(state.current_track_index, 1);

    let state = services
        .playback
        .apply_command(&host, &code, PlaybackCommand::Next)
        .await
        .unwrap();
    assert_eq!(state.current_track_index, 0);
    assert!(!state.is_playing);
}

#[tokio::test]
async fn test_transfer_host_moves_control() {
    let (services, _events) = recorded_services();
    let (host, guest) = (id("host"), id("guest"));
    let code = start_jam(&services, &host).await;
    services.lifecycle.join(&guest, join(&code, "Guest")).await.unwrap();

    services
        .membership
        .transfer_host(&host, &code, &guest)
        .await
        .unwrap();

    let paused = HostSync {
        track_index: 0,
        position: 0.0,
        is_playing: false,
    };
    let err = services
        .playback
        .apply_host_sync(&host, &code, paused, None)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Forbidden);

    services
        .playback
        .apply_host_sync(&guest, &code, paused, None)
        .await
        .unwrap();

    // The old host is now an ordinary member; leaving does not end the jam.
    services.lifecycle.leave(&host, &code).await.unwrap();
    assert!(services.repository.get_active(&code).await.is_ok());
}
