//! Per-user async mutexes.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

use gcm_core::types::UserId;

/// One mutex per user id.
///
/// Every read-modify-write of a user's security state holds that user's
/// guard, so logins and unblocks for one account never interleave while
/// different accounts proceed in parallel. An entry is dropped once its last
/// guard is released and nobody is waiting for it.
#[derive(Debug, Default)]
pub struct UserLocks {
    locks: Arc<DashMap<UserId, Arc<Mutex<()>>>>,
}

impl UserLocks {
    /// Creates an empty lock map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for and take the guard of `user_id`.
    pub async fn lock(&self, user_id: UserId) -> UserGuard {
        // The shard guard must be released before awaiting.
        let mutex = Arc::clone(self.locks.entry(user_id).or_default().value());
        UserGuard {
            guard: Some(mutex.lock_owned().await),
            user_id,
            locks: Arc::clone(&self.locks),
        }
    }

    /// Number of users with a lock entry.
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    /// Whether no user currently has a lock entry.
    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

/// Holds one user's lock until dropped.
#[derive(Debug)]
pub struct UserGuard {
    guard: Option<OwnedMutexGuard<()>>,
    user_id: UserId,
    locks: Arc<DashMap<UserId, Arc<Mutex<()>>>>,
}

impl Drop for UserGuard {
    fn drop(&mut self) {
        drop(self.guard.take());
        // Only the map's own reference left: no holder and no waiter.
        self.locks
            .remove_if(&self.user_id, |_, mutex| Arc::strong_count(mutex) == 1);
    }
}
