//! Per-account exclusive locks.
//!
//! Every read-modify-write of a balance runs while holding the account's
//! lock. Compound operations take both locks in [`AccountKey`] order
//! (the wallet always before any savings goal), so two transfers touching
//! the same pair can never deadlock. Waiting is bounded; a timeout is
//! reported as [`LedgerError::Busy`].

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::Duration,
};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use uuid::Uuid;

use crate::{error::LedgerError, models::account::UserId};

/// Lock identity. The derived ordering is the global acquisition order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AccountKey {
    /// Keyed by owner so the lock exists before the wallet does
    Wallet(UserId),
    Goal(Uuid),
}

/// Held lock; released on drop, including on every error path.
#[derive(Debug)]
pub struct AccountGuard {
    key: AccountKey,
    _guard: OwnedMutexGuard<()>,
}

impl AccountGuard {
    pub fn key(&self) -> AccountKey {
        self.key
    }
}

#[derive(Debug)]
pub struct AccountLocks {
    table: Mutex<HashMap<AccountKey, Arc<AsyncMutex<()>>>>,
    timeout: Duration,
}

impl AccountLocks {
    pub fn new(timeout: Duration) -> Self {
        Self {
            table: Mutex::new(HashMap::new()),
            timeout,
        }
    }

    /// Acquire one account lock, waiting at most the configured timeout.
    pub async fn acquire(&self, key: AccountKey) -> Result<AccountGuard, LedgerError> {
        let guards = self.acquire_all(&[key]).await?;
        guards.into_iter().next().ok_or(LedgerError::Busy)
    }

    /// Acquire a wallet lock and a goal lock for one compound operation.
    pub async fn acquire_pair(
        &self,
        first: AccountKey,
        second: AccountKey,
    ) -> Result<Vec<AccountGuard>, LedgerError> {
        self.acquire_all(&[first, second]).await
    }

    /// Forget the lock of an account that no longer exists.
    pub fn forget(&self, key: AccountKey) {
        if let Ok(mut table) = self.table.lock() {
            table.remove(&key);
        }
    }

    async fn acquire_all(&self, keys: &[AccountKey]) -> Result<Vec<AccountGuard>, LedgerError> {
        let mut ordered = keys.to_vec();
        ordered.sort();
        ordered.dedup();

        // One deadline for the whole set so a pair never waits twice the timeout.
        let deadline = tokio::time::Instant::now() + self.timeout;
        let mut guards = Vec::with_capacity(ordered.len());
        for key in ordered {
            let mutex = self.mutex_for(key)?;
            match tokio::time::timeout_at(deadline, mutex.lock_owned()).await {
                Ok(guard) => {
                    tracing::debug!(?key, "account lock acquired");
                    guards.push(AccountGuard { key, _guard: guard });
                }
                Err(_) => {
                    tracing::warn!(?key, timeout_ms = self.timeout.as_millis() as u64, "account lock wait timed out");
                    return Err(LedgerError::Busy);
                }
            }
        }
        Ok(guards)
    }

    fn mutex_for(&self, key: AccountKey) -> Result<Arc<AsyncMutex<()>>, LedgerError> {
        let mut table = self.table.lock().map_err(|_| LedgerError::Busy)?;
        Ok(table
            .entry(key)
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone())
    }
}
