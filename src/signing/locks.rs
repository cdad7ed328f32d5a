//! Per-account serialization of build → sign → broadcast.
//!
//! Two requests spending from the same account would otherwise race on
//! node-side account state. Requests for different accounts never wait on
//! each other.

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::blockchain::address::TronAddress;
use crate::observability::metrics;

type LockMap = DashMap<String, Arc<Mutex<()>>>;

/// Registry of per-account locks.
#[derive(Debug, Clone, Default)]
pub struct AccountLocks {
    inner: Arc<LockMap>,
}

impl AccountLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Canonical key for an account id: base58 when it parses, the trimmed
    /// input otherwise, so `T...` and `41...` spellings share one lock.
    pub fn key_for(account: &str) -> String {
        let trimmed = account.trim();
        trimmed
            .parse::<TronAddress>()
            .map(|a| a.to_base58())
            .unwrap_or_else(|_| trimmed.to_string())
    }

    /// Wait for exclusive use of `account`.
    pub async fn acquire(&self, account: &str) -> AccountGuard {
        let key = Self::key_for(account);
        let lock = self
            .inner
            .entry(key.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        metrics::set_account_locks(self.inner.len());

        let guard = lock.lock_owned().await;
        AccountGuard {
            key,
            guard: Some(guard),
            map: self.inner.clone(),
        }
    }

    /// Number of accounts with a live lock entry.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

/// Exclusive hold on one account. Released on drop.
pub struct AccountGuard {
    key: String,
    guard: Option<OwnedMutexGuard<()>>,
    map: Arc<LockMap>,
}

impl AccountGuard {
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl Drop for AccountGuard {
    fn drop(&mut self) {
        // Guard first, so the map's Arc is the only one left when idle.
        self.guard.take();
        self.map.remove_if(&self.key, |_, lock| Arc::strong_count(lock) == 1);
        metrics::set_account_locks(self.map.len());
    }
}

impl std::fmt::Debug for AccountGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountGuard").field("key", &self.key).finish()
    }
}
