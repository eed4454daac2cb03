//! Savings goal registry - per-user queries over savings goals.
//!
//! The registry holds no money logic of its own: creation and deletion
//! delegate to the transfer coordinator. Goals returned from reads have the
//! time-lock expiry applied to the returned copy only; nothing is written.

use uuid::Uuid;

use crate::{
    error::LedgerError,
    models::{
        account::{SortOrder, TransactionRecord, UserId},
        money::Amount,
        savings::{NewSavingsGoal, SavingsGoal},
    },
    services::{ledger::Ledger, time_lock},
    store::LedgerStore,
};

/// Balances of one user at a glance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Overview {
    /// Zero when the user has no wallet yet
    pub wallet_balance: Amount,
    pub currency: Option<String>,
    pub total_saved: Amount,
    pub goal_count: usize,
    pub locked_goal_count: usize,
}

impl<S: LedgerStore> Ledger<S> {
    /// All goals of the user, oldest first, with expired locks shown unlocked.
    pub async fn list_for_user(&self, owner_id: UserId) -> Result<Vec<SavingsGoal>, LedgerError> {
        let today = self.today();
        let mut goals = self.store.list_goals(owner_id).await?;
        for goal in &mut goals {
            time_lock::apply_expiry(goal, today);
        }
        Ok(goals)
    }

    /// One goal of the user.
    pub async fn savings_goal(
        &self,
        owner_id: UserId,
        goal_id: Uuid,
    ) -> Result<SavingsGoal, LedgerError> {
        let mut goal = self.require_goal(owner_id, goal_id).await?;
        time_lock::apply_expiry(&mut goal, self.today());
        Ok(goal)
    }

    /// History of one goal in the requested order.
    pub async fn savings_history(
        &self,
        owner_id: UserId,
        goal_id: Uuid,
        order: SortOrder,
    ) -> Result<Vec<TransactionRecord>, LedgerError> {
        let goal = self.require_goal(owner_id, goal_id).await?;
        Ok(goal.account.history(order))
    }

    /// Sum of all goal balances; zero when the user has no goals.
    pub async fn total_saved(&self, owner_id: UserId) -> Result<Amount, LedgerError> {
        let goals = self.store.list_goals(owner_id).await?;
        total_balance(&goals)
    }

    pub async fn overview(&self, owner_id: UserId) -> Result<Overview, LedgerError> {
        let wallet = self.store.load_wallet(owner_id).await?;
        let goals = self.list_for_user(owner_id).await?;
        let today = self.today();

        Ok(Overview {
            wallet_balance: wallet.as_ref().map_or(Amount::ZERO, |w| w.balance()),
            currency: wallet.map(|w| w.account.currency),
            total_saved: total_balance(&goals)?,
            goal_count: goals.len(),
            locked_goal_count: goals
                .iter()
                .filter(|goal| goal.lock_state(today).is_locked())
                .count(),
        })
    }

    /// Create a goal funded from the wallet.
    pub async fn create_goal(
        &self,
        owner_id: UserId,
        amount: Amount,
        params: NewSavingsGoal,
    ) -> Result<SavingsGoal, LedgerError> {
        self.fund_savings_from_wallet(owner_id, amount, params)
            .await
    }

    /// Delete a goal, refunding its balance to the wallet.
    pub async fn delete_goal(&self, owner_id: UserId, goal_id: Uuid) -> Result<Amount, LedgerError> {
        self.delete_savings(owner_id, goal_id).await
    }
}

/// Sum of goal balances, failing on overflow.
pub fn total_balance(goals: &[SavingsGoal]) -> Result<Amount, LedgerError> {
    goals.iter().try_fold(Amount::ZERO, |total, goal| {
        total
            .checked_add(goal.balance())
            .ok_or_else(|| LedgerError::InvalidAmount("Total saved overflows".to_string()))
    })
}
