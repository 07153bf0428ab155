//! Per-account single-writer lock.
//!
//! Scheduler cycles and human applies for one account must never
//! interleave, or the cooldown and daily-cap checks could miss a write made
//! by the other writer. The lock is taken through
//! [`AutomationStore::lock_account`](crate::store::AutomationStore::lock_account):
//! Postgres uses an advisory lock shared by every process, the in-memory
//! store uses [`AccountLocks`].

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};

/// Proof that the caller holds an account's lock. Dropping it releases
/// the lock.
pub struct AccountLease {
    _held: Box<dyn Send>,
}

impl AccountLease {
    pub fn new(held: impl Send + 'static) -> Self {
        Self {
            _held: Box::new(held),
        }
    }
}

/// Lazily created async mutex per account id.
#[derive(Default)]
pub struct AccountLocks {
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl AccountLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `account_id`. Released on drop.
    pub async fn acquire(&self, account_id: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            // Entries nobody holds or waits on only have the map's reference.
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            Arc::clone(locks.entry(account_id.to_string()).or_default())
        };
        lock.lock_owned().await
    }

    /// Number of accounts currently tracked.
    pub async fn tracked(&self) -> usize {
        self.locks.lock().await.len()
    }
}
