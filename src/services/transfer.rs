//! Transfer coordinator - moves money between a wallet and a savings goal.
//!
//! The wallet and the goal are independent documents with no shared
//! database transaction, so each operation is made all-or-nothing by hand:
//!
//! 1. Take both account locks (wallet first, then goal)
//! 2. Apply and persist the debit side
//! 3. Apply and persist the credit side
//! 4. If step 3 fails, persist a compensating entry that undoes step 2
//!
//! Debiting first means a failure can at worst leave money "in hand" to be
//! put back; it can never create money that was not taken from somewhere.
//! Compensations are ordinary history entries prefixed with `Reversal:`,
//! since history is append-only. A compensation that loses a version race
//! is re-applied to a freshly loaded copy of the account.
//!
//! Deleting a goal is the one exception to debit-first: its balance is
//! credited to the wallet before the goal row is removed, and the credit is
//! reversed if the removal fails.

use uuid::Uuid;

use crate::{
    error::LedgerError,
    models::{
        account::UserId,
        money::Amount,
        savings::{NewSavingsGoal, SavingsGoal},
        wallet::Wallet,
    },
    services::{
        ledger::Ledger,
        locks::AccountKey,
        time_lock,
    },
    store::{LedgerStore, StoreError},
};

/// How many times a compensating save is attempted before giving up.
const COMPENSATION_ATTEMPTS: usize = 3;

/// Outcome of [`Ledger::withdraw_from_savings`].
#[derive(Debug, Clone)]
pub struct SavingsWithdrawal {
    pub goal: SavingsGoal,

    /// The credited wallet, when the money was sent there
    pub wallet: Option<Wallet>,
}

#[derive(Debug, Clone, Copy)]
enum Direction {
    /// Put back money that was taken out
    Credit,
    /// Take back money that was put in
    Debit,
}

impl<S: LedgerStore> Ledger<S> {
    /// Create a savings goal funded from the wallet.
    ///
    /// The wallet is debited first; the goal is then created with `amount`
    /// as its opening deposit. If the goal cannot be stored the wallet debit
    /// is reversed before the error is returned.
    ///
    /// # Errors
    ///
    /// - `InvalidAmount` / `InvalidRequest`: bad amount or goal parameters
    /// - `WalletNotFound`: the user has no wallet
    /// - `InsufficientFunds`: the wallet cannot cover `amount`
    /// - `Busy` / `Conflict` / `Storage`
    pub async fn fund_savings_from_wallet(
        &self,
        owner_id: UserId,
        amount: Amount,
        params: NewSavingsGoal,
    ) -> Result<SavingsGoal, LedgerError> {
        let amount = amount.ensure_positive()?;
        params.validate()?;

        // The goal does not exist yet, so only the wallet needs locking.
        let _guard = self.locks.acquire(AccountKey::Wallet(owner_id)).await?;

        let mut wallet = self.require_wallet(owner_id).await?;
        let now = self.now();
        let transfer = format!("Transfer to savings: {}", params.name);

        wallet
            .account
            .withdraw(amount, Some(transfer.clone()), now)?;
        self.store.save_wallet(&mut wallet).await?;

        let mut goal = SavingsGoal::new(owner_id, params, wallet.account.currency.clone(), now);
        let credited = match goal.add_funds(amount, Some("Initial deposit".to_string()), now) {
            Ok(_) => self.store.save_goal(&mut goal).await.map_err(LedgerError::from),
            Err(err) => Err(err),
        };

        if let Err(err) = credited {
            self.compensate_wallet(wallet, amount, Direction::Credit, &transfer)
                .await;
            return Err(err);
        }

        tracing::info!(
            %owner_id,
            goal_id = %goal.id(),
            amount = %amount,
            lock_date = %goal.lock_date,
            "savings goal created"
        );
        Ok(goal)
    }

    /// Move money from the wallet into an existing goal.
    ///
    /// Adding funds is allowed whatever the goal's lock state.
    pub async fn add_to_savings(
        &self,
        owner_id: UserId,
        goal_id: Uuid,
        amount: Amount,
    ) -> Result<(SavingsGoal, Wallet), LedgerError> {
        let amount = amount.ensure_positive()?;
        let _guards = self
            .locks
            .acquire_pair(AccountKey::Wallet(owner_id), AccountKey::Goal(goal_id))
            .await?;

        let mut goal = self.require_goal(owner_id, goal_id).await?;
        let mut wallet = self.require_wallet(owner_id).await?;
        let now = self.now();
        let transfer = format!("Transfer to savings: {}", goal.name);

        wallet
            .account
            .withdraw(amount, Some(transfer.clone()), now)?;
        self.store.save_wallet(&mut wallet).await?;

        time_lock::apply_expiry(&mut goal, self.today());
        let credited = match goal.add_funds(amount, Some("Transfer from wallet".to_string()), now) {
            Ok(_) => self.store.save_goal(&mut goal).await.map_err(LedgerError::from),
            Err(err) => Err(err),
        };

        if let Err(err) = credited {
            self.compensate_wallet(wallet, amount, Direction::Credit, &transfer)
                .await;
            return Err(err);
        }

        tracing::info!(%owner_id, %goal_id, amount = %amount, "funds added to savings");
        Ok((goal, wallet))
    }

    /// Withdraw from a goal, optionally crediting the wallet.
    ///
    /// With `credit_wallet = false` the money leaves the ledger (cash-out).
    /// Otherwise a failed wallet credit puts the money back into the goal.
    ///
    /// # Errors
    ///
    /// - `Locked`: the goal is locked today
    /// - `InsufficientFunds`: amount exceeds the goal balance
    /// - `WalletNotFound`: crediting was requested but the user has no wallet
    /// - `InvalidAmount` / `SavingsNotFound` / `Busy` / `Conflict` / `Storage`
    pub async fn withdraw_from_savings(
        &self,
        owner_id: UserId,
        goal_id: Uuid,
        amount: Amount,
        credit_wallet: bool,
    ) -> Result<SavingsWithdrawal, LedgerError> {
        let amount = amount.ensure_positive()?;
        let _guards = self
            .locks
            .acquire_pair(AccountKey::Wallet(owner_id), AccountKey::Goal(goal_id))
            .await?;

        let mut goal = self.require_goal(owner_id, goal_id).await?;
        let today = self.today();
        let now = self.now();
        time_lock::ensure_unlocked(&goal, today)?;
        time_lock::apply_expiry(&mut goal, today);

        // Resolve the wallet before touching the goal so a missing wallet writes nothing.
        let wallet = if credit_wallet {
            Some(self.require_wallet(owner_id).await?)
        } else {
            None
        };

        let goal_entry = if credit_wallet {
            "Transfer to wallet"
        } else {
            "Withdrawal"
        };
        goal.withdraw_funds(amount, Some(goal_entry.to_string()), today, now)?;
        self.store.save_goal(&mut goal).await?;

        let Some(wallet) = wallet else {
            tracing::info!(%owner_id, %goal_id, amount = %amount, "savings withdrawn without wallet credit");
            return Ok(SavingsWithdrawal { goal, wallet: None });
        };

        let transfer = format!("Transfer from savings: {}", goal.name);
        match self.credit_wallet(wallet, amount, &transfer).await {
            Ok(wallet) => {
                tracing::info!(%owner_id, %goal_id, amount = %amount, "savings moved to wallet");
                Ok(SavingsWithdrawal {
                    goal,
                    wallet: Some(wallet),
                })
            }
            Err(err) => {
                self.compensate_goal(goal, amount, &transfer).await;
                Err(err)
            }
        }
    }

    /// Delete a goal, refunding its balance to the wallet first.
    ///
    /// The goal is only removed after the refund is stored. If the refund
    /// fails the goal stays untouched; if the removal fails the refund is
    /// reversed. Returns the refunded amount.
    ///
    /// # Errors
    ///
    /// - `Locked`: the goal is locked today
    /// - `WalletNotFound`: the goal holds money but the user has no wallet
    /// - `SavingsNotFound` / `Busy` / `Conflict` / `Storage`
    pub async fn delete_savings(
        &self,
        owner_id: UserId,
        goal_id: Uuid,
    ) -> Result<Amount, LedgerError> {
        let _guards = self
            .locks
            .acquire_pair(AccountKey::Wallet(owner_id), AccountKey::Goal(goal_id))
            .await?;

        let goal = self.require_goal(owner_id, goal_id).await?;
        time_lock::ensure_unlocked(&goal, self.today())?;

        let refund = goal.balance();
        let refund_entry = format!("Refund from deleted savings: {}", goal.name);
        let mut refunded_wallet = None;
        if refund.is_positive() {
            let wallet = self.require_wallet(owner_id).await?;
            refunded_wallet = Some(self.credit_wallet(wallet, refund, &refund_entry).await?);
        }

        if let Err(err) = self.store.delete_goal(&goal).await {
            if let Some(wallet) = refunded_wallet {
                self.compensate_wallet(wallet, refund, Direction::Debit, &refund_entry)
                    .await;
            }
            return Err(err.into());
        }

        self.locks.forget(AccountKey::Goal(goal_id));
        tracing::info!(%owner_id, %goal_id, refund = %refund, "savings goal deleted");
        Ok(refund)
    }

    /// Lock an unlocked goal until a future date.
    ///
    /// # Errors
    ///
    /// - `InvalidLockDate`: the date is today or earlier
    /// - `AlreadyLocked`: the goal is still locked
    /// - `SavingsNotFound` / `Busy` / `Conflict` / `Storage`
    pub async fn lock_savings(
        &self,
        owner_id: UserId,
        goal_id: Uuid,
        lock_date: chrono::NaiveDate,
    ) -> Result<SavingsGoal, LedgerError> {
        let _guard = self.locks.acquire(AccountKey::Goal(goal_id)).await?;

        let mut goal = self.require_goal(owner_id, goal_id).await?;
        time_lock::validate_relock(&goal, lock_date, self.today())?;

        goal.is_locked = true;
        goal.lock_date = lock_date;
        goal.account.updated_at = self.now();
        self.store.save_goal(&mut goal).await?;

        tracing::info!(%owner_id, %goal_id, %lock_date, "savings goal locked");
        Ok(goal)
    }

    /// Credit and store the wallet. Caller holds the wallet lock.
    async fn credit_wallet(
        &self,
        mut wallet: Wallet,
        amount: Amount,
        description: &str,
    ) -> Result<Wallet, LedgerError> {
        wallet
            .account
            .deposit(amount, Some(description.to_string()), self.now())?;
        self.store.save_wallet(&mut wallet).await?;
        Ok(wallet)
    }

    /// Undo an already stored wallet movement.
    ///
    /// Each attempt applies the reversal to a clean copy. When the stored
    /// wallet moved on in the meantime, the copy is reloaded first.
    async fn compensate_wallet(
        &self,
        wallet: Wallet,
        amount: Amount,
        direction: Direction,
        what: &str,
    ) {
        let owner_id = wallet.owner_id();
        let description = format!("Reversal: {what}");
        let mut base = wallet;
        let mut last_error: Option<LedgerError> = None;

        for attempt in 1..=COMPENSATION_ATTEMPTS {
            let mut reversed = base.clone();
            let applied = match direction {
                Direction::Credit => {
                    reversed
                        .account
                        .deposit(amount, Some(description.clone()), self.now())
                }
                Direction::Debit => {
                    reversed
                        .account
                        .withdraw(amount, Some(description.clone()), self.now())
                }
            };
            if let Err(err) = applied {
                tracing::error!(%owner_id, amount = %amount, error = %err,
                    "wallet compensation rejected; manual reconciliation required");
                return;
            }

            match self.store.save_wallet(&mut reversed).await {
                Ok(()) => {
                    tracing::warn!(%owner_id, amount = %amount, ?direction, attempt,
                        "wallet movement reversed");
                    return;
                }
                Err(StoreError::VersionConflict(conflict)) => {
                    tracing::debug!(%owner_id, attempt, "wallet changed during compensation, reloading");
                    last_error = Some(LedgerError::Conflict(conflict));
                    match self.require_wallet(owner_id).await {
                        Ok(fresh) => base = fresh,
                        Err(err) => last_error = Some(err),
                    }
                }
                Err(err) => last_error = Some(err.into()),
            }
        }
        if let Some(err) = last_error {
            tracing::error!(%owner_id, amount = %amount, error = %err,
                "wallet compensation failed; manual reconciliation required");
        }
    }

    /// Put money back into a goal after a failed wallet credit.
    async fn compensate_goal(&self, goal: SavingsGoal, amount: Amount, what: &str) {
        let (owner_id, goal_id) = (goal.owner_id(), goal.id());
        let description = format!("Reversal: {what}");
        let mut base = goal;
        let mut last_error: Option<LedgerError> = None;

        for attempt in 1..=COMPENSATION_ATTEMPTS {
            let mut reversed = base.clone();
            if let Err(err) = reversed.add_funds(amount, Some(description.clone()), self.now()) {
                tracing::error!(%goal_id, amount = %amount, error = %err,
                    "savings compensation rejected; manual reconciliation required");
                return;
            }

            match self.store.save_goal(&mut reversed).await {
                Ok(()) => {
                    tracing::warn!(%goal_id, amount = %amount, attempt,
                        "savings withdrawal reversed");
                    return;
                }
                Err(StoreError::VersionConflict(conflict)) => {
                    tracing::debug!(%goal_id, attempt, "savings goal changed during compensation, reloading");
                    last_error = Some(LedgerError::Conflict(conflict));
                    match self.require_goal(owner_id, goal_id).await {
                        Ok(fresh) => base = fresh,
                        Err(err) => last_error = Some(err),
                    }
                }
                Err(err) => last_error = Some(err.into()),
            }
        }
        if let Some(err) = last_error {
            tracing::error!(%goal_id, amount = %amount, error = %err,
                "savings compensation failed; manual reconciliation required");
        }
    }
}
