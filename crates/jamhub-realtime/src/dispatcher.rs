//! Routes parsed client commands to the jam services.

use std::sync::Arc;

use jamhub_core::result::AppResult;
use jamhub_core::types::Identity;
use jamhub_service::{CreateJam, HostSync, JamServices, JoinJam, PlaybackCommand};

use crate::message::{InboundMessage, OutboundMessage};

/// Executes inbound commands on behalf of an identity.
///
/// State changes reach clients through room events. The returned message, if
/// any, is a direct reply for the calling connection.
#[derive(Debug, Clone)]
pub struct CommandDispatcher {
    /// Jam services.
    services: Arc<JamServices>,
}

impl CommandDispatcher {
    /// Creates a new dispatcher.
    pub fn new(services: Arc<JamServices>) -> Self {
        Self { services }
    }

    /// Run one command.
    pub async fn dispatch(
        &self,
        identity: &Identity,
        message: InboundMessage,
    ) -> AppResult<Option<OutboundMessage>> {
        let s = &self.services;
        match message {
            InboundMessage::CreateSession {
                name,
                nickname,
                is_private,
                password,
            } => {
                s.lifecycle
                    .create(
                        identity,
                        CreateJam {
                            name,
                            nickname,
                            is_private,
                            password,
                        },
                    )
                    .await?;
            }
            InboundMessage::JoinSession {
                jam_code,
                nickname,
                password,
            } => {
                s.lifecycle
                    .join(
                        identity,
                        JoinJam {
                            jam_code,
                            nickname,
                            password,
                        },
                    )
                    .await?;
            }
            InboundMessage::LeaveSession { jam_code } => {
                s.lifecycle.leave(identity, &jam_code).await?;
            }
            InboundMessage::EndSession { jam_code } => {
                s.lifecycle.end(identity, &jam_code).await?;
            }
            InboundMessage::SyncPlaybackState {
                jam_code,
                track_index,
                position,
                is_playing,
                playlist,
            } => {
                s.playback
                    .apply_host_sync(
                        identity,
                        &jam_code,
                        HostSync {
                            track_index,
                            position,
                            is_playing,
                        },
                        playlist,
                    )
                    .await?;
            }
            InboundMessage::PlayTrack { jam_code, track_id } => {
                s.playback
                    .apply_command(identity, &jam_code, PlaybackCommand::PlayTrack(track_id))
                    .await?;
            }
            InboundMessage::PausePlayback { jam_code, position } => {
                s.playback
                    .apply_command(identity, &jam_code, PlaybackCommand::Pause { position })
                    .await?;
            }
            InboundMessage::ResumePlayback { jam_code } => {
                s.playback
                    .apply_command(identity, &jam_code, PlaybackCommand::Resume)
                    .await?;
            }
            InboundMessage::SeekPlayback { jam_code, position } => {
                s.playback
                    .apply_command(identity, &jam_code, PlaybackCommand::Seek { position })
                    .await?;
            }
            InboundMessage::NextTrack { jam_code } => {
                s.playback
                    .apply_command(identity, &jam_code, PlaybackCommand::Next)
                    .await?;
            }
            InboundMessage::AddTrack { jam_code, track } => {
                s.playlist.add_track(identity, &jam_code, track).await?;
            }
            InboundMessage::RemoveTrack { jam_code, track_id } => {
                s.playlist
                    .remove_track(identity, &jam_code, &track_id)
                    .await?;
            }
            InboundMessage::SetPermissions {
                jam_code,
                target,
                permissions,
            } => {
                s.membership
                    .set_permissions(identity, &jam_code, &target, &permissions)
                    .await?;
            }
            InboundMessage::GrantAllPermissions { jam_code } => {
                s.membership
                    .grant_all_permissions(identity, &jam_code)
                    .await?;
            }
            InboundMessage::TransferHost { jam_code, target } => {
                s.membership
                    .transfer_host(identity, &jam_code, &target)
                    .await?;
            }
            InboundMessage::RequestJoin { jam_code, nickname } => {
                s.join_requests
                    .request_join(identity, &jam_code, &nickname)
                    .await?;
            }
            InboundMessage::ApproveJoinRequest {
                jam_code,
                requester,
            } => {
                s.join_requests
                    .approve(identity, &jam_code, &requester)
                    .await?;
            }
            InboundMessage::DenyJoinRequest {
                jam_code,
                requester,
            } => {
                s.join_requests
                    .deny(identity, &jam_code, &requester)
                    .await?;
            }
            InboundMessage::ListJoinRequests { jam_code } => {
                let requests = s.join_requests.list(identity, &jam_code).await?;
                return Ok(Some(OutboundMessage::JoinRequests { jam_code, requests }));
            }
            InboundMessage::GetState { jam_code } => {
                let jam = s.playback.read_state(identity, &jam_code).await?;
                return Ok(Some(OutboundMessage::JamState { jam }));
            }
            InboundMessage::ListPublicJams => {
                let jams = s.directory.list_public(Some(identity)).await?;
                return Ok(Some(OutboundMessage::PublicJams { jams }));
            }
            InboundMessage::Pong { .. } => {}
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use jamhub_core::config::JamConfig;
    use jamhub_core::error::ErrorKind;
    use jamhub_core::types::JamCode;
    use jamhub_service::{JamEventKind, RecordingPublisher};
    use jamhub_store::memory::MemoryDocumentStore;

    use super::*;

    fn make_dispatcher() -> (CommandDispatcher, Arc<JamServices>, Arc<RecordingPublisher>) {
        let events = Arc::new(RecordingPublisher::new());
        let services = Arc::new(JamServices::new(
            Arc::new(MemoryDocumentStore::new()),
            &JamConfig::default(),
            events.clone(),
        ));
        (
            CommandDispatcher::new(Arc::clone(&services)),
            services,
            events,
        )
    }

    fn parse(raw: &str) -> InboundMessage {
        serde_json::from_str(raw).unwrap()
    }

    async fn create(dispatcher: &CommandDispatcher, events: &RecordingPublisher, host: &Identity) -> JamCode {
        dispatcher
            .dispatch(
                host,
                parse(r#"{"type":"create_session","name":"Friday Mix","nickname":"Host"}"#),
            )
            .await
            .unwrap();
        events
            .deliveries()
            .into_iter()
            .find(|(_, e)| matches!(e.kind, JamEventKind::SessionCreated { .. }))
            .map(|(_, e)| e.jam_code)
            .unwrap()
    }

    #[tokio::test]
    async fn test_create_join_and_read_state() {
        let (dispatcher, _services, events) = make_dispatcher();
        let host = Identity::new("host");
        let guest = Identity::new("guest");
        let code = create(&dispatcher, &events, &host).await;

        let join = format!(r#"{{"type":"join_session","jam_code":"{code}","nickname":"Guest1"}}"#);
        assert!(dispatcher.dispatch(&guest, parse(&join)).await.unwrap().is_none());

        let get = format!(r#"{{"type":"get_state","jam_code":"{code}"}}"#);
        match dispatcher.dispatch(&guest, parse(&get)).await.unwrap() {
            Some(OutboundMessage::JamState { jam }) => {
                assert_eq!(jam.members.len(), 2);
                assert_eq!(jam.host, host);
            }
            other => panic!("unexpected reply: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_guest_playback_command_is_forbidden() {
        let (dispatcher, _services, events) = make_dispatcher();
        let host = Identity::new("host");
        let guest = Identity::new("guest");
        let code = create(&dispatcher, &events, &host).await;
        let join = format!(r#"{{"type":"join_session","jam_code":"{code}","nickname":"Guest1"}}"#);
        dispatcher.dispatch(&guest, parse(&join)).await.unwrap();

        let seek = format!(r#"{{"type":"seek_playback","jam_code":"{code}","position":12.5}}"#);
        let err = dispatcher.dispatch(&guest, parse(&seek)).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Forbidden);
    }

    #[tokio::test]
    async fn test_list_public_jams_excludes_own() {
        let (dispatcher, _services, events) = make_dispatcher();
        let host = Identity::new("host");
        create(&dispatcher, &events, &host).await;

        let list = parse(r#"{"type":"list_public_jams"}"#);
        match dispatcher.dispatch(&host, list.clone()).await.unwrap() {
            Some(OutboundMessage::PublicJams { jams }) => assert!(jams.is_empty()),
            other => panic!("unexpected reply: {other:?}"),
        }
        match dispatcher
            .dispatch(&Identity::new("stranger"), list)
            .await
            .unwrap()
        {
            Some(OutboundMessage::PublicJams { jams }) => assert_eq!(jams.len(), 1),
            other => panic!("unexpected reply: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_add_track_then_sync_playlist() {
        let (dispatcher, services, events) = make_dispatcher();
        let host = Identity::new("host");
        let code = create(&dispatcher, &events, &host).await;

        let add = format!(
            r#"{{"type":"add_track","jam_code":"{code}","track":{{"title":"Song A","source":{{"kind":"youtube","video_id":"abc"}}}}}}"#
        );
        dispatcher.dispatch(&host, parse(&add)).await.unwrap();

        let sync = format!(
            r#"{{"type":"sync_playback_state","jam_code":"{code}","track_index":3,"position":5,"is_playing":true}}"#
        );
        dispatcher.dispatch(&host, parse(&sync)).await.unwrap();

        let jam = services.repository.get_active(&code).await.unwrap();
        assert_eq!(jam.playback.current_track_index, 0);
        assert!(jam.playback.is_playing);
    }
}
