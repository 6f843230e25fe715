//! Membership records and capability flags.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What a member may do besides listening.
///
/// The default is deny-all; the host holds every capability.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permissions {
    /// May control playback.
    pub can_play: bool,
    /// May queue tracks.
    pub can_add: bool,
    /// May remove queued tracks.
    pub can_remove: bool,
}

impl Permissions {
    /// Every capability granted.
    pub fn all() -> Self {
        Self {
            can_play: true,
            can_add: true,
            can_remove: true,
        }
    }

    /// No capability granted.
    pub fn none() -> Self {
        Self::default()
    }

    /// Merge the fields present in `patch`, leaving the others unchanged.
    pub fn apply(&mut self, patch: &PermissionPatch) {
        if let Some(can_play) = patch.can_play {
            self.can_play = can_play;
        }
        if let Some(can_add) = patch.can_add {
            self.can_add = can_add;
        }
        if let Some(can_remove) = patch.can_remove {
            self.can_remove = can_remove;
        }
    }
}

/// Partial permission update sent by the host.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionPatch {
    /// New `can_play`, if changing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub can_play: Option<bool>,
    /// New `can_add`, if changing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub can_add: Option<bool>,
    /// New `can_remove`, if changing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub can_remove: Option<bool>,
}

impl PermissionPatch {
    /// Whether the patch changes nothing.
    pub fn is_empty(&self) -> bool {
        self.can_play.is_none() && self.can_add.is_none() && self.can_remove.is_none()
    }
}

/// One member of a jam.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberRecord {
    /// Display nickname.
    pub nickname: String,
    /// Capability flags.
    pub permissions: Permissions,
    /// When the member first joined.
    pub joined_at: DateTime<Utc>,
}

impl MemberRecord {
    /// A guest with default (deny-all) permissions.
    pub fn guest(nickname: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            nickname: nickname.into(),
            permissions: Permissions::none(),
            joined_at: now,
        }
    }

    /// A host with every permission.
    pub fn host(nickname: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            nickname: nickname.into(),
            permissions: Permissions::all(),
            joined_at: now,
        }
    }
}
