//! Create, join, leave, and end orchestration.
//!
//! An identity is in at most one jam. Creating or joining another jam first
//! leaves the current one with the usual effects.

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use validator::Validate;

use jamhub_core::config::JamConfig;
use jamhub_core::error::{AppError, ErrorKind};
use jamhub_core::result::AppResult;
use jamhub_core::types::{Identity, JamCode};
use jamhub_entity::{Jam, JamPatch, JamSnapshot};

use crate::access::require_host;
use crate::code::CodeGenerator;
use crate::events::{EndReason, EventPublisher, JamEvent, JamEventKind};
use crate::input::required_text;
use crate::membership::MembershipManager;
use crate::password::PasswordHasher;
use crate::registry::JamRegistry;
use crate::repository::JamRepository;

/// Request to open a new jam.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateJam {
    /// Display name.
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    /// Nickname of the creating host.
    #[validate(length(min = 1, max = 40))]
    pub nickname: String,
    /// Require a password (or host approval) to join.
    #[serde(default)]
    pub is_private: bool,
    /// Join password; required for private jams.
    #[serde(default)]
    #[validate(length(min = 1, max = 128))]
    pub password: Option<String>,
}

/// Request to enter an existing jam.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct JoinJam {
    /// Code of the jam.
    pub jam_code: JamCode,
    /// Nickname to show to the room.
    #[validate(length(min = 1, max = 40))]
    pub nickname: String,
    /// Password of a private jam.
    #[serde(default)]
    pub password: Option<String>,
}

/// A freshly created jam.
#[derive(Debug, Clone, PartialEq)]
pub struct CreatedJam {
    /// State right after creation.
    pub jam: JamSnapshot,
    /// Link guests can open to join.
    pub shareable_link: String,
}

/// Session lifecycle orchestration.
#[derive(Debug, Clone)]
pub struct SessionLifecycle {
    /// Jam documents.
    repository: Arc<JamRepository>,
    /// Locks and identity indexes.
    registry: Arc<JamRegistry>,
    /// Room fan-out.
    publisher: Arc<dyn EventPublisher>,
    /// Member bookkeeping.
    membership: Arc<MembershipManager>,
    /// Jam code source.
    codes: CodeGenerator,
    /// Private jam passwords.
    hasher: PasswordHasher,
    /// Code attempts and link base.
    config: JamConfig,
}

impl SessionLifecycle {
    /// Creates a new lifecycle service.
    pub fn new(
        repository: Arc<JamRepository>,
        registry: Arc<JamRegistry>,
        publisher: Arc<dyn EventPublisher>,
        membership: Arc<MembershipManager>,
        config: JamConfig,
    ) -> Self {
        Self {
            repository,
            registry,
            publisher,
            membership,
            codes: CodeGenerator::new(config.code_length),
            hasher: PasswordHasher::new(),
            config,
        }
    }

    /// Link that opens the join page of `code`.
    pub fn shareable_link(&self, code: &JamCode) -> String {
        format!("{}?code={code}", self.config.share_base_url)
    }

    /// Open a new jam hosted by `requester`.
    pub async fn create(&self, requester: &Identity, request: CreateJam) -> AppResult<CreatedJam> {
        request.validate()?;
        let name = required_text(&request.name, "Jam name")?;
        let nickname = required_text(&request.nickname, "Nickname")?;

        let password_hash = if request.is_private {
            let password = request
                .password
                .as_deref()
                .filter(|p| !p.is_empty())
                .ok_or_else(|| AppError::invalid_argument("Private jams need a password"))?;
            Some(self.hasher.hash_password(password)?)
        } else {
            None
        };

        self.leave_current(requester, None).await?;
        self.withdraw_join_request(requester).await?;

        for attempt in 1..=self.config.max_code_attempts {
            let code = self.codes.generate();
            let _guard = self.registry.lock(&code).await?;
            let jam = Jam::new(
                code.clone(),
                name.clone(),
                requester.clone(),
                nickname.clone(),
                password_hash.clone(),
                Utc::now(),
            );

            match self.insert(&jam).await {
                Ok(()) => {}
                Err(e) if e.is(ErrorKind::Conflict) => {
                    debug!(jam = %code, attempt, "Jam code collision, retrying");
                    continue;
                }
                Err(e) => return Err(e),
            }

            let shareable_link = self.shareable_link(&code);
            self.registry.set_membership(requester, &code);
            self.publisher.subscribe(&code, requester);
            self.publisher.publish(JamEvent::to_only(
                &code,
                requester,
                JamEventKind::SessionCreated {
                    name: jam.name.clone(),
                    shareable_link: shareable_link.clone(),
                },
            ));

            info!(jam = %code, host = %requester, private = jam.is_private, "Jam created");
            return Ok(CreatedJam {
                jam: jam.snapshot(),
                shareable_link,
            });
        }

        warn!(attempts = self.config.max_code_attempts, "Gave up generating a free jam code");
        Err(AppError::resource_exhausted(
            "Could not allocate a jam code, try again",
        ))
    }

    /// Enter a jam, or refresh the nickname if already a member.
    pub async fn join(&self, requester: &Identity, request: JoinJam) -> AppResult<JamSnapshot> {
        request.validate()?;
        let nickname = required_text(&request.nickname, "Nickname")?;
        let code = request.jam_code;

        // Hashing is slow; check the password before taking the lock.
        let preview = self.repository.get_active(&code).await?;
        if !preview.is_member(requester) {
            self.check_password(&preview, request.password.as_deref())?;
        }

        self.leave_current(requester, Some(&code)).await?;
        if self.registry.pending_request_of(requester).as_ref() != Some(&code) {
            self.withdraw_join_request(requester).await?;
        }

        let _guard = self.registry.lock(&code).await?;
        let mut jam = self.repository.get_active(&code).await?;
        self.membership
            .admit(&mut jam, requester, &nickname, Utc::now())?;

        let mut patch = JamPatch::members_of(&jam);
        if jam.join_requests.remove(requester).is_some() {
            patch = patch.with_join_requests(&jam);
        }
        self.repository.update(&code, &patch).await?;

        let snapshot = self.announce_join(&jam, requester);
        info!(jam = %code, identity = %requester, members = jam.members.len(), "Member joined");
        Ok(snapshot)
    }

    /// Leave a jam. The host leaving ends it.
    pub async fn leave(&self, requester: &Identity, code: &JamCode) -> AppResult<()> {
        self.depart(requester, code, EndReason::HostLeft).await
    }

    /// End a jam for everyone. Host only.
    pub async fn end(&self, requester: &Identity, code: &JamCode) -> AppResult<()> {
        let _guard = self.registry.lock(code).await?;
        let mut jam = self.repository.get_active(code).await?;
        require_host(&jam, requester, "end the jam")?;
        self.depart_locked(&mut jam, requester, EndReason::EndedByHost)
            .await
    }

    /// The identity's last connection dropped: leave its jam and withdraw its request.
    pub async fn handle_disconnect(&self, identity: &Identity) -> AppResult<()> {
        self.withdraw_join_request(identity).await?;

        let Some(code) = self.registry.membership_of(identity) else {
            return Ok(());
        };
        match self.depart(identity, &code, EndReason::HostDisconnected).await {
            Ok(()) => Ok(()),
            Err(e) if e.is(ErrorKind::NotFound) => {
                self.registry.clear_membership(identity, &code);
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Drop the pending join request of `identity`, if any.
    pub async fn withdraw_join_request(&self, identity: &Identity) -> AppResult<()> {
        let Some(code) = self.registry.pending_request_of(identity) else {
            return Ok(());
        };

        let _guard = self.registry.lock(&code).await?;
        let mut jam = match self.repository.find(&code).await? {
            Some(jam) if jam.is_active => jam,
            _ => {
                self.registry.clear_pending_request(identity, &code);
                return Ok(());
            }
        };

        if jam.join_requests.remove(identity).is_some() {
            self.repository
                .update(&code, &JamPatch::default().with_join_requests(&jam))
                .await?;
            debug!(jam = %code, identity = %identity, "Join request withdrawn");
        }
        self.registry.clear_pending_request(identity, &code);
        Ok(())
    }

    /// Leave whatever jam `identity` is in, unless it is `keep`.
    pub(crate) async fn leave_current(
        &self,
        identity: &Identity,
        keep: Option<&JamCode>,
    ) -> AppResult<()> {
        let Some(current) = self.registry.membership_of(identity) else {
            return Ok(());
        };
        if Some(&current) == keep {
            return Ok(());
        }

        match self.leave(identity, &current).await {
            Ok(()) => Ok(()),
            Err(e) if e.is(ErrorKind::NotFound) => {
                self.registry.clear_membership(identity, &current);
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Index, subscribe, and announce a member that was just written.
    ///
    /// The caller must hold the jam's lock.
    pub(crate) fn announce_join(&self, jam: &Jam, identity: &Identity) -> JamSnapshot {
        self.registry.set_membership(identity, &jam.code);
        self.registry.clear_pending_request(identity, &jam.code);
        self.publisher.subscribe(&jam.code, identity);

        let snapshot = jam.snapshot();
        self.publisher.publish(JamEvent::to_only(
            &jam.code,
            identity,
            JamEventKind::JoinSucceeded {
                jam: snapshot.clone(),
            },
        ));
        self.publisher.publish(JamEvent::to_room_except(
            &jam.code,
            identity,
            JamEventKind::MembersChanged {
                host: jam.host.clone(),
                members: jam.members.clone(),
            },
        ));
        snapshot
    }

    async fn depart(&self, requester: &Identity, code: &JamCode, reason: EndReason) -> AppResult<()> {
        let _guard = self.registry.lock(code).await?;
        let mut jam = self.repository.get_active(code).await?;
        self.depart_locked(&mut jam, requester, reason).await
    }

    async fn depart_locked(
        &self,
        jam: &mut Jam,
        requester: &Identity,
        reason: EndReason,
    ) -> AppResult<()> {
        let waiting: Vec<Identity> = jam.join_requests.keys().cloned().collect();
        let Some(was_host) = self
            .membership
            .unregister_locked(jam, requester, Utc::now())
            .await?
        else {
            return Ok(());
        };

        if !was_host {
            self.publisher.unsubscribe(&jam.code, requester);
            self.membership.announce_members(jam);
            info!(jam = %jam.code, identity = %requester, members = jam.members.len(), "Member left");
            return Ok(());
        }

        self.publisher.publish(JamEvent::to_room(
            &jam.code,
            JamEventKind::SessionEnded { reason },
        ));
        for requester in &waiting {
            self.publisher.publish(JamEvent::to_only(
                &jam.code,
                requester,
                JamEventKind::JoinRequestDenied,
            ));
        }
        self.publisher.close_room(&jam.code);
        self.registry.forget(&jam.code);

        info!(jam = %jam.code, host = %requester, reason = ?reason, "Jam ended");
        Ok(())
    }

    async fn insert(&self, jam: &Jam) -> AppResult<()> {
        if self.repository.insert_new(jam).await? {
            Ok(())
        } else {
            Err(AppError::conflict(format!("Jam code {} is taken", jam.code)))
        }
    }

    fn check_password(&self, jam: &Jam, password: Option<&str>) -> AppResult<()> {
        let Some(hash) = jam.password_hash.as_deref() else {
            return Ok(());
        };
        let Some(password) = password.filter(|p| !p.is_empty()) else {
            return Err(AppError::forbidden("This jam is private, a password is required"));
        };
        if !self.hasher.verify_password(password, hash)? {
            return Err(AppError::forbidden("Incorrect jam password"));
        }
        Ok(())
    }
}
