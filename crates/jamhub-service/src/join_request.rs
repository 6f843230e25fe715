//! Host-approved entry into private jams.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use jamhub_core::error::AppError;
use jamhub_core::result::AppResult;
use jamhub_core::types::{Identity, JamCode};
use jamhub_entity::jam::JoinRequest;
use jamhub_entity::{Jam, JamPatch, JamSnapshot};

use crate::access::require_host;
use crate::events::{EventPublisher, JamEvent, JamEventKind};
use crate::input::required_text;
use crate::lifecycle::SessionLifecycle;
use crate::membership::MembershipManager;
use crate::registry::JamRegistry;
use crate::repository::JamRepository;

/// A pending request as shown to the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingJoinRequest {
    /// Who is asking.
    pub requester: Identity,
    /// Nickname they will use.
    pub nickname: String,
    /// When they asked.
    pub requested_at: DateTime<Utc>,
}

/// Request, approve, and deny entry into private jams.
#[derive(Debug, Clone)]
pub struct JoinRequestService {
    /// Jam documents.
    repository: Arc<JamRepository>,
    /// Locks and identity indexes.
    registry: Arc<JamRegistry>,
    /// Room fan-out.
    publisher: Arc<dyn EventPublisher>,
    /// Member bookkeeping.
    membership: Arc<MembershipManager>,
    /// Leaving the previous jam and announcing the join.
    lifecycle: Arc<SessionLifecycle>,
}

impl JoinRequestService {
    /// Creates a new join request service.
    pub fn new(
        repository: Arc<JamRepository>,
        registry: Arc<JamRegistry>,
        publisher: Arc<dyn EventPublisher>,
        membership: Arc<MembershipManager>,
        lifecycle: Arc<SessionLifecycle>,
    ) -> Self {
        Self {
            repository,
            registry,
            publisher,
            membership,
            lifecycle,
        }
    }

    /// Ask the host of a private jam to be let in. Repeating it just refreshes the request.
    pub async fn request_join(
        &self,
        requester: &Identity,
        code: &JamCode,
        nickname: &str,
    ) -> AppResult<()> {
        let nickname = required_text(nickname, "Nickname")?;
        if nickname.chars().count() > 40 {
            return Err(AppError::invalid_argument(
                "Nickname must be at most 40 characters",
            ));
        }

        if self.registry.pending_request_of(requester).as_ref() != Some(code) {
            self.lifecycle.withdraw_join_request(requester).await?;
        }

        let _guard = self.registry.lock(code).await?;
        let mut jam = self.repository.get_active(code).await?;
        if !jam.is_private {
            return Err(AppError::invalid_argument(
                "This jam is public, join it directly",
            ));
        }
        if jam.is_member(requester) {
            return Err(AppError::conflict("You are already a member of this jam"));
        }

        jam.join_requests.insert(
            requester.clone(),
            JoinRequest {
                nickname: nickname.clone(),
                requested_at: Utc::now(),
            },
        );
        self.repository
            .update(code, &JamPatch::default().with_join_requests(&jam))
            .await?;
        self.registry.set_pending_request(requester, code);

        self.publisher.publish(JamEvent::to_only(
            code,
            &jam.host,
            JamEventKind::JoinRequested {
                requester: requester.clone(),
                nickname,
            },
        ));

        info!(jam = %code, requester = %requester, "Join requested");
        Ok(())
    }

    /// Let a requester in. Host only.
    pub async fn approve(
        &self,
        host: &Identity,
        code: &JamCode,
        requester: &Identity,
    ) -> AppResult<JamSnapshot> {
        {
            let _guard = self.registry.lock(code).await?;
            let jam = self.repository.get_active(code).await?;
            require_host(&jam, host, "approve join requests")?;
            pending_request(&jam, requester)?;
        }

        // Leaving may end another jam, so it only happens once the approval is known to be valid.
        self.lifecycle.leave_current(requester, Some(code)).await?;

        let _guard = self.registry.lock(code).await?;
        let mut jam = self.repository.get_active(code).await?;
        require_host(&jam, host, "approve join requests")?;

        let Some(request) = jam.join_requests.remove(requester) else {
            return Err(no_pending_request(requester));
        };
        self.membership
            .admit(&mut jam, requester, &request.nickname, Utc::now())?;

        self.repository
            .update(code, &JamPatch::members_of(&jam).with_join_requests(&jam))
            .await?;

        let snapshot = self.lifecycle.announce_join(&jam, requester);
        info!(jam = %code, requester = %requester, "Join request approved");
        Ok(snapshot)
    }

    /// Turn a requester down. Host only.
    pub async fn deny(&self, host: &Identity, code: &JamCode, requester: &Identity) -> AppResult<()> {
        let _guard = self.registry.lock(code).await?;
        let mut jam = self.repository.get_active(code).await?;
        require_host(&jam, host, "deny join requests")?;

        if jam.join_requests.remove(requester).is_none() {
            return Err(no_pending_request(requester));
        }
        self.repository
            .update(code, &JamPatch::default().with_join_requests(&jam))
            .await?;
        self.registry.clear_pending_request(requester, code);

        self.publisher.publish(JamEvent::to_only(
            code,
            requester,
            JamEventKind::JoinRequestDenied,
        ));

        info!(jam = %code, requester = %requester, "Join request denied");
        Ok(())
    }

    /// Pending requests, oldest first. Host only.
    pub async fn list(&self, host: &Identity, code: &JamCode) -> AppResult<Vec<PendingJoinRequest>> {
        let jam = self.repository.get_active(code).await?;
        require_host(&jam, host, "view join requests")?;

        let mut pending: Vec<PendingJoinRequest> = jam
            .join_requests
            .into_iter()
            .map(|(requester, request)| PendingJoinRequest {
                requester,
                nickname: request.nickname,
                requested_at: request.requested_at,
            })
            .collect();
        pending.sort_by_key(|p| p.requested_at);
        Ok(pending)
    }
}

fn pending_request(jam: &Jam, requester: &Identity) -> AppResult<()> {
    if jam.join_requests.contains_key(requester) {
        Ok(())
    } else {
        Err(no_pending_request(requester))
    }
}

fn no_pending_request(requester: &Identity) -> AppError {
    AppError::not_found(format!("No pending join request from {requester}"))
}
