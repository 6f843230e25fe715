//! Role checks shared by the managers.

use jamhub_core::error::AppError;
use jamhub_core::result::AppResult;
use jamhub_core::types::Identity;
use jamhub_entity::Jam;

/// Fail with `Forbidden` unless `identity` is a member of `jam`.
pub(crate) fn require_member(jam: &Jam, identity: &Identity) -> AppResult<()> {
    if jam.is_member(identity) {
        Ok(())
    } else {
        Err(AppError::forbidden(format!(
            "You are not a member of jam {}",
            jam.code
        )))
    }
}

/// Fail with `Forbidden` unless `identity` is the host of `jam`.
pub(crate) fn require_host(jam: &Jam, identity: &Identity, action: &str) -> AppResult<()> {
    if jam.is_host(identity) {
        Ok(())
    } else {
        Err(AppError::forbidden(format!("Only the host can {action}")))
    }
}
