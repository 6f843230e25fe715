//! One wired set of jam services sharing a store, registry, and publisher.

use std::sync::Arc;

use jamhub_core::config::JamConfig;
use jamhub_core::traits::store::DocumentStore;

use crate::directory::JamDirectory;
use crate::events::EventPublisher;
use crate::join_request::JoinRequestService;
use crate::lifecycle::SessionLifecycle;
use crate::membership::MembershipManager;
use crate::playback::PlaybackStateMachine;
use crate::playlist::PlaylistManager;
use crate::registry::JamRegistry;
use crate::repository::JamRepository;

/// Every jam service, built once at startup.
#[derive(Debug, Clone)]
pub struct JamServices {
    /// Jam documents.
    pub repository: Arc<JamRepository>,
    /// Session locks and identity indexes.
    pub registry: Arc<JamRegistry>,
    /// Members and permissions.
    pub membership: Arc<MembershipManager>,
    /// Playback state.
    pub playback: Arc<PlaybackStateMachine>,
    /// Queue edits.
    pub playlist: Arc<PlaylistManager>,
    /// Create, join, leave, end.
    pub lifecycle: Arc<SessionLifecycle>,
    /// Private jam entry.
    pub join_requests: Arc<JoinRequestService>,
    /// Public listing.
    pub directory: Arc<JamDirectory>,
}

impl JamServices {
    /// Wire the services over `store`, publishing through `publisher`.
    pub fn new(
        store: Arc<dyn DocumentStore>,
        config: &JamConfig,
        publisher: Arc<dyn EventPublisher>,
    ) -> Self {
        let repository = Arc::new(JamRepository::new(store));
        let registry = Arc::new(JamRegistry::new(config.lock_timeout()));

        let membership = Arc::new(MembershipManager::new(
            Arc::clone(&repository),
            Arc::clone(&registry),
            Arc::clone(&publisher),
            config.max_members,
        ));
        let playback = Arc::new(PlaybackStateMachine::new(
            Arc::clone(&repository),
            Arc::clone(&registry),
            Arc::clone(&publisher),
            config.max_playlist_length,
        ));
        let playlist = Arc::new(PlaylistManager::new(
            Arc::clone(&repository),
            Arc::clone(&registry),
            Arc::clone(&publisher),
            config.max_playlist_length,
        ));
        let lifecycle = Arc::new(SessionLifecycle::new(
            Arc::clone(&repository),
            Arc::clone(&registry),
            Arc::clone(&publisher),
            Arc::clone(&membership),
            config.clone(),
        ));
        let join_requests = Arc::new(JoinRequestService::new(
            Arc::clone(&repository),
            Arc::clone(&registry),
            publisher,
            Arc::clone(&membership),
            Arc::clone(&lifecycle),
        ));
        let directory = Arc::new(JamDirectory::new(Arc::clone(&repository)));

        Self {
            repository,
            registry,
            membership,
            playback,
            playlist,
            lifecycle,
            join_requests,
            directory,
        }
    }
}
