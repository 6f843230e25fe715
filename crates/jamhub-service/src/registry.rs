//! Per-process jam registry: session locks and the identity indexes.
//!
//! Constructed once at startup and shared by every manager. Nothing in here
//! is persisted; after a restart identities simply have no session.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::warn;

use jamhub_core::error::AppError;
use jamhub_core::result::AppResult;
use jamhub_core::types::{Identity, JamCode};

type LockTable = DashMap<JamCode, Arc<Mutex<()>>>;

/// Held lock of one jam. Dropping it releases the jam and removes the
/// table entry once nobody else holds or waits on it.
#[derive(Debug)]
pub struct JamGuard {
    guard: Option<OwnedMutexGuard<()>>,
    locks: Arc<LockTable>,
    code: JamCode,
}

impl Drop for JamGuard {
    fn drop(&mut self) {
        self.guard.take();
        evict_idle(&self.locks, &self.code);
    }
}

/// Remove the entry of `code` when the table holds the only reference.
fn evict_idle(locks: &LockTable, code: &JamCode) {
    locks.remove_if(code, |_, mutex| Arc::strong_count(mutex) == 1);
}

/// Lock table plus identity -> jam indexes.
#[derive(Debug)]
pub struct JamRegistry {
    /// One mutex per jam with a mutation in flight; mutations of a jam run one at a time.
    locks: Arc<LockTable>,
    /// Jam each identity is a member of.
    memberships: DashMap<Identity, JamCode>,
    /// Private jam each identity is waiting to enter.
    pending: DashMap<Identity, JamCode>,
    /// How long to wait for a jam lock.
    lock_timeout: Duration,
}

impl JamRegistry {
    /// Create an empty registry.
    pub fn new(lock_timeout: Duration) -> Self {
        Self {
            locks: Arc::new(DashMap::new()),
            memberships: DashMap::new(),
            pending: DashMap::new(),
            lock_timeout,
        }
    }

    /// Acquire the lock of `code`, failing with `Timeout` after the configured wait.
    pub async fn lock(&self, code: &JamCode) -> AppResult<JamGuard> {
        let mutex = self
            .locks
            .entry(code.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();

        match tokio::time::timeout(self.lock_timeout, mutex.lock_owned()).await {
            Ok(guard) => Ok(JamGuard {
                guard: Some(guard),
                locks: Arc::clone(&self.locks),
                code: code.clone(),
            }),
            Err(_) => {
                evict_idle(&self.locks, code);
                warn!(jam = %code, timeout_ms = self.lock_timeout.as_millis() as u64, "Jam lock not acquired in time");
                Err(AppError::timeout(format!(
                    "Jam {code} is busy, try again"
                )))
            }
        }
    }

    /// Drop the lock entry of an ended jam.
    pub fn forget(&self, code: &JamCode) {
        self.locks.remove(code);
    }

    // ── Membership index ───────────────────────────────────

    /// Jam `identity` currently belongs to.
    pub fn membership_of(&self, identity: &Identity) -> Option<JamCode> {
        self.memberships.get(identity).map(|code| code.clone())
    }

    /// Record that `identity` belongs to `code`.
    pub fn set_membership(&self, identity: &Identity, code: &JamCode) {
        self.memberships.insert(identity.clone(), code.clone());
    }

    /// Forget the membership of `identity` if it still points at `code`.
    pub fn clear_membership(&self, identity: &Identity, code: &JamCode) {
        self.memberships.remove_if(identity, |_, current| current == code);
    }

    // ── Pending join request index ─────────────────────────

    /// Jam `identity` has a pending join request for.
    pub fn pending_request_of(&self, identity: &Identity) -> Option<JamCode> {
        self.pending.get(identity).map(|code| code.clone())
    }

    /// Record a pending request of `identity` for `code`.
    pub fn set_pending_request(&self, identity: &Identity, code: &JamCode) {
        self.pending.insert(identity.clone(), code.clone());
    }

    /// Forget the pending request of `identity` if it still points at `code`.
    pub fn clear_pending_request(&self, identity: &Identity, code: &JamCode) {
        self.pending.remove_if(identity, |_, current| current == code);
    }

    /// Number of jams with a lock entry.
    #[cfg(test)]
    pub(crate) fn lock_count(&self) -> usize {
        self.locks.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jamhub_core::error::ErrorKind;
    use jamhub_core::types::id::JAM_CODE_ALPHABET;

    fn make_registry(timeout_ms: u64) -> JamRegistry {
        JamRegistry::new(Duration::from_millis(timeout_ms))
    }

    #[tokio::test]
    async fn test_lock_times_out_while_held() {
        let registry = make_registry(20);
        let code = JamCode::parse("LCKEDZ").unwrap();

        let _held = registry.lock(&code).await.unwrap();
        let err = registry.lock(&code).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Timeout);
    }

    #[tokio::test]
    async fn test_different_jams_do_not_contend() {
        let registry = make_registry(20);
        let _a = registry.lock(&JamCode::parse("AAAAAA").unwrap()).await.unwrap();
        assert!(registry.lock(&JamCode::parse("BBBBBB").unwrap()).await.is_ok());
    }

    #[tokio::test]
    async fn test_released_lock_leaves_no_entry() {
        let registry = make_registry(20);
        for &c in JAM_CODE_ALPHABET {
            let code = JamCode::parse(&format!("JAM{}", c as char)).unwrap();
            let _guard = registry.lock(&code).await.unwrap();
        }
        assert_eq!(registry.lock_count(), 0);
    }

    #[tokio::test]
    async fn test_entry_kept_while_a_waiter_is_queued() {
        let registry = Arc::new(make_registry(200));
        let code = JamCode::parse("WATERS").unwrap();

        let held = registry.lock(&code).await.unwrap();
        let waiter = {
            let registry = Arc::clone(&registry);
            let code = code.clone();
            tokio::spawn(async move { registry.lock(&code).await.map(|_| ()) })
        };
        tokio::task::yield_now().await;
        drop(held);

        waiter.await.unwrap().unwrap();
        assert_eq!(registry.lock_count(), 0);
    }

    #[test]
    fn test_clear_membership_ignores_other_jam() {
        let registry = make_registry(20);
        let id = Identity::new("guest");
        let first = JamCode::parse("AAAAAA").unwrap();
        let second = JamCode::parse("BBBBBB").unwrap();

        registry.set_membership(&id, &second);
        registry.clear_membership(&id, &first);
        assert_eq!(registry.membership_of(&id), Some(second.clone()));

        registry.clear_membership(&id, &second);
        assert_eq!(registry.membership_of(&id), None);
    }
}
