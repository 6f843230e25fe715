//! Member bookkeeping and host-granted permissions.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::info;

use jamhub_core::error::AppError;
use jamhub_core::result::AppResult;
use jamhub_core::types::{Identity, JamCode};
use jamhub_entity::jam::{MemberRecord, PermissionPatch, Permissions};
use jamhub_entity::{Jam, JamPatch};

use crate::access::require_host;
use crate::events::{EventPublisher, JamEvent, JamEventKind};
use crate::registry::JamRegistry;
use crate::repository::JamRepository;

/// Adds and removes members and manages their capability flags.
#[derive(Debug, Clone)]
pub struct MembershipManager {
    /// Jam documents.
    repository: Arc<JamRepository>,
    /// Locks and identity index.
    registry: Arc<JamRegistry>,
    /// Room fan-out.
    publisher: Arc<dyn EventPublisher>,
    /// Member cap, host included.
    max_members: usize,
}

impl MembershipManager {
    /// Creates a new membership manager.
    pub fn new(
        repository: Arc<JamRepository>,
        registry: Arc<JamRegistry>,
        publisher: Arc<dyn EventPublisher>,
        max_members: usize,
    ) -> Self {
        Self {
            repository,
            registry,
            publisher,
            max_members,
        }
    }

    /// Add `identity` to the jam, or just update its nickname if already present.
    ///
    /// Publishes nothing; [`crate::SessionLifecycle::join`] is the announcing variant.
    pub async fn register(
        &self,
        identity: &Identity,
        code: &JamCode,
        nickname: &str,
    ) -> AppResult<MemberRecord> {
        let _guard = self.registry.lock(code).await?;
        let mut jam = self.repository.get_active(code).await?;

        let record = self.admit(&mut jam, identity, nickname, Utc::now())?;
        self.repository
            .update(code, &JamPatch::members_of(&jam))
            .await?;
        self.registry.set_membership(identity, code);

        Ok(record)
    }

    /// Remove `identity` from whichever jam it belongs to.
    ///
    /// Returns the jam and whether the identity was its host, or `None` when
    /// it was not a member anywhere. Removing the host ends the jam. Publishes
    /// nothing; [`crate::SessionLifecycle::leave`] is the announcing variant.
    pub async fn unregister(&self, identity: &Identity) -> AppResult<Option<(JamCode, bool)>> {
        let Some(code) = self.registry.membership_of(identity) else {
            return Ok(None);
        };

        let _guard = self.registry.lock(&code).await?;
        let mut jam = match self.repository.find(&code).await? {
            Some(jam) if jam.is_active => jam,
            _ => {
                self.registry.clear_membership(identity, &code);
                return Ok(None);
            }
        };

        let was_host = self
            .unregister_locked(&mut jam, identity, Utc::now())
            .await?;
        Ok(was_host.map(|was_host| (code, was_host)))
    }

    /// Merge `patch` into the permissions of `target`. Host only.
    pub async fn set_permissions(
        &self,
        requester: &Identity,
        code: &JamCode,
        target: &Identity,
        patch: &PermissionPatch,
    ) -> AppResult<MemberRecord> {
        if patch.is_empty() {
            return Err(AppError::invalid_argument(
                "At least one permission must be given",
            ));
        }

        let _guard = self.registry.lock(code).await?;
        let mut jam = self.repository.get_active(code).await?;
        require_host(&jam, requester, "change permissions")?;
        if jam.is_host(target) {
            return Err(AppError::invalid_argument(
                "The host always holds every permission",
            ));
        }

        let record = {
            let member = jam.members.get_mut(target).ok_or_else(|| {
                AppError::not_found(format!("{target} is not a member of jam {code}"))
            })?;
            member.permissions.apply(patch);
            member.clone()
        };

        self.repository
            .update(code, &JamPatch::members_of(&jam))
            .await?;
        self.announce_members(&jam);

        info!(jam = %code, target = %target, permissions = ?record.permissions, "Member permissions changed");
        Ok(record)
    }

    /// Give every guest every permission. Host only.
    pub async fn grant_all_permissions(&self, requester: &Identity, code: &JamCode) -> AppResult<()> {
        let _guard = self.registry.lock(code).await?;
        let mut jam = self.repository.get_active(code).await?;
        require_host(&jam, requester, "grant permissions")?;

        for member in jam.members.values_mut() {
            member.permissions = Permissions::all();
        }

        self.repository
            .update(code, &JamPatch::members_of(&jam))
            .await?;
        self.announce_members(&jam);

        info!(jam = %code, members = jam.members.len(), "All permissions granted");
        Ok(())
    }

    /// Hand the host role to another member. Host only.
    ///
    /// The new host gains every permission; the old host stays a member
    /// with the flags it had.
    pub async fn transfer_host(
        &self,
        requester: &Identity,
        code: &JamCode,
        target: &Identity,
    ) -> AppResult<()> {
        let _guard = self.registry.lock(code).await?;
        let mut jam = self.repository.get_active(code).await?;
        require_host(&jam, requester, "transfer the host role")?;
        if jam.is_host(target) {
            return Err(AppError::invalid_argument("You are already the host"));
        }

        let member = jam.members.get_mut(target).ok_or_else(|| {
            AppError::not_found(format!("{target} is not a member of jam {code}"))
        })?;
        member.permissions = Permissions::all();
        jam.host = target.clone();

        self.repository
            .update(code, &JamPatch::members_of(&jam).with_host(&jam))
            .await?;
        self.announce_members(&jam);

        info!(jam = %code, from = %requester, to = %target, "Host role transferred");
        Ok(())
    }

    /// Insert or refresh a member record in memory. The caller writes it.
    pub(crate) fn admit(
        &self,
        jam: &mut Jam,
        identity: &Identity,
        nickname: &str,
        now: DateTime<Utc>,
    ) -> AppResult<MemberRecord> {
        if let Some(existing) = jam.members.get_mut(identity) {
            existing.nickname = nickname.to_string();
            return Ok(existing.clone());
        }

        if jam.members.len() >= self.max_members {
            return Err(AppError::resource_exhausted(format!(
                "Jam {} is full ({} members)",
                jam.code, self.max_members
            )));
        }

        let record = if jam.is_host(identity) {
            MemberRecord::host(nickname, now)
        } else {
            MemberRecord::guest(nickname, now)
        };
        jam.members.insert(identity.clone(), record.clone());
        Ok(record)
    }

    /// Remove `identity` from a loaded jam and write the result.
    ///
    /// The caller must hold the jam's lock. Returns `None` if the identity
    /// was not a member, else whether it was the host. Removing the host
    /// marks the jam ended and drops its pending join requests.
    pub(crate) async fn unregister_locked(
        &self,
        jam: &mut Jam,
        identity: &Identity,
        now: DateTime<Utc>,
    ) -> AppResult<Option<bool>> {
        if jam.members.remove(identity).is_none() {
            self.registry.clear_membership(identity, &jam.code);
            return Ok(None);
        }

        let was_host = jam.is_host(identity);
        let waiting: Vec<Identity> = jam.join_requests.keys().cloned().collect();
        let patch = if was_host {
            jam.is_active = false;
            jam.ended_at = Some(now);
            jam.join_requests.clear();
            JamPatch::members_of(jam)
                .with_end(jam)
                .with_join_requests(jam)
        } else {
            JamPatch::members_of(jam)
        };

        self.repository.update(&jam.code, &patch).await?;
        self.registry.clear_membership(identity, &jam.code);
        if was_host {
            for member in jam.members.keys() {
                self.registry.clear_membership(member, &jam.code);
            }
            for requester in &waiting {
                self.registry.clear_pending_request(requester, &jam.code);
            }
        }
        Ok(Some(was_host))
    }

    /// Fan the current member map out to the room.
    pub(crate) fn announce_members(&self, jam: &Jam) {
        self.publisher.publish(JamEvent::to_room(
            &jam.code,
            JamEventKind::MembersChanged {
                host: jam.host.clone(),
                members: jam.members.clone(),
            },
        ));
    }
}
