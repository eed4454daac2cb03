//! Ledger service - the entry point for every balance-changing operation.
//!
//! A `Ledger` owns the store, the clock and the account locks, and is
//! created once at startup and shared (behind an `Arc`) by all callers.
//! This module holds the wallet primitives; the transfer coordinator and
//! the savings registry are further `impl` blocks in
//! [`crate::services::transfer`] and [`crate::services::savings`].
//!
//! # Concurrency
//!
//! Every read-modify-write runs under the account's lock (see
//! [`crate::services::locks`]), and the store additionally rejects stale
//! writes by version. Two concurrent withdrawals can therefore never both
//! pass the balance check against the same balance.

use std::{sync::Arc, time::Duration};

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::{
    clock::{Clock, SystemClock},
    error::LedgerError,
    models::{
        account::{SortOrder, TransactionRecord, UserId},
        money::Amount,
        savings::SavingsGoal,
        wallet::Wallet,
    },
    services::locks::{AccountKey, AccountLocks},
    store::LedgerStore,
};

/// Runtime settings for the ledger.
#[derive(Debug, Clone)]
pub struct LedgerSettings {
    /// Upper bound on waiting for an account lock
    pub lock_timeout: Duration,

    /// Currency given to newly opened wallets
    pub default_currency: String,
}

impl Default for LedgerSettings {
    fn default() -> Self {
        Self {
            lock_timeout: Duration::from_secs(2),
            default_currency: "INR".to_string(),
        }
    }
}

pub struct Ledger<S> {
    pub(crate) store: S,
    pub(crate) locks: AccountLocks,
    clock: Arc<dyn Clock>,
    settings: LedgerSettings,
}

impl<S: LedgerStore> Ledger<S> {
    pub fn new(store: S, settings: LedgerSettings) -> Self {
        Self::with_clock(store, settings, Arc::new(SystemClock))
    }

    pub fn with_clock(store: S, settings: LedgerSettings, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            locks: AccountLocks::new(settings.lock_timeout),
            clock,
            settings,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn settings(&self) -> &LedgerSettings {
        &self.settings
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    pub(crate) fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Open the user's wallet, or return the existing one.
    ///
    /// The boolean is true when the wallet was created by this call.
    pub async fn open_wallet(&self, owner_id: UserId) -> Result<(Wallet, bool), LedgerError> {
        let _guard = self.locks.acquire(AccountKey::Wallet(owner_id)).await?;

        if let Some(wallet) = self.store.load_wallet(owner_id).await? {
            return Ok((wallet, false));
        }

        let mut wallet = Wallet::open(owner_id, &self.settings.default_currency, self.now());
        self.store.save_wallet(&mut wallet).await?;
        tracing::info!(%owner_id, currency = %wallet.account.currency, "wallet opened");
        Ok((wallet, true))
    }

    /// Current wallet state.
    pub async fn wallet(&self, owner_id: UserId) -> Result<Wallet, LedgerError> {
        self.require_wallet(owner_id).await
    }

    /// Wallet history in the requested order.
    pub async fn wallet_history(
        &self,
        owner_id: UserId,
        order: SortOrder,
    ) -> Result<(Wallet, Vec<TransactionRecord>), LedgerError> {
        let wallet = self.require_wallet(owner_id).await?;
        let history = wallet.account.history(order);
        Ok((wallet, history))
    }

    /// Credit the wallet, opening it first if the user has none.
    ///
    /// # Errors
    ///
    /// - `InvalidAmount`: amount is zero or negative
    /// - `Busy`: the wallet lock could not be acquired in time
    /// - `Conflict` / `Storage`: the save failed; nothing was applied
    pub async fn deposit(
        &self,
        owner_id: UserId,
        amount: Amount,
        description: Option<String>,
    ) -> Result<(Wallet, TransactionRecord), LedgerError> {
        let amount = amount.ensure_positive()?;
        let _guard = self.locks.acquire(AccountKey::Wallet(owner_id)).await?;

        let now = self.now();
        let mut wallet = match self.store.load_wallet(owner_id).await? {
            Some(wallet) => wallet,
            None => Wallet::open(owner_id, &self.settings.default_currency, now),
        };

        let record = wallet.account.deposit(amount, description, now)?;
        self.store.save_wallet(&mut wallet).await?;

        tracing::info!(%owner_id, amount = %amount, balance = %wallet.balance(), "wallet deposit");
        Ok((wallet, record))
    }

    /// Debit the wallet.
    ///
    /// # Errors
    ///
    /// - `InvalidAmount`: amount is zero or negative
    /// - `WalletNotFound`: the user has no wallet
    /// - `InsufficientFunds`: amount exceeds the balance
    /// - `Busy` / `Conflict` / `Storage`: nothing was applied
    pub async fn withdraw(
        &self,
        owner_id: UserId,
        amount: Amount,
        description: Option<String>,
    ) -> Result<(Wallet, TransactionRecord), LedgerError> {
        let amount = amount.ensure_positive()?;
        let _guard = self.locks.acquire(AccountKey::Wallet(owner_id)).await?;

        let mut wallet = self.require_wallet(owner_id).await?;
        let record = wallet.account.withdraw(amount, description, self.now())?;
        self.store.save_wallet(&mut wallet).await?;

        tracing::info!(%owner_id, amount = %amount, balance = %wallet.balance(), "wallet withdrawal");
        Ok((wallet, record))
    }

    /// Probe the store.
    pub async fn ping(&self) -> Result<(), LedgerError> {
        Ok(self.store.ping().await?)
    }

    pub(crate) async fn require_wallet(&self, owner_id: UserId) -> Result<Wallet, LedgerError> {
        self.store
            .load_wallet(owner_id)
            .await?
            .ok_or(LedgerError::WalletNotFound)
    }

    pub(crate) async fn require_goal(
        &self,
        owner_id: UserId,
        goal_id: Uuid,
    ) -> Result<SavingsGoal, LedgerError> {
        self.store
            .load_goal(owner_id, goal_id)
            .await?
            .ok_or(LedgerError::SavingsNotFound(goal_id))
    }
}
