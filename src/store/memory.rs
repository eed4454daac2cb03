//! In-process store.
//!
//! Holds documents in hash maps behind a mutex. Used by the test suite and
//! by embedders that do not need durability. It honours the same version
//! contract as the PostgreSQL store.

use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard},
};

use uuid::Uuid;

use crate::{
    models::{account::UserId, savings::SavingsGoal, wallet::Wallet},
    store::{LedgerStore, StoreError},
};

#[derive(Debug, Default)]
struct Documents {
    wallets: HashMap<UserId, Wallet>,
    goals: HashMap<Uuid, SavingsGoal>,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    docs: Mutex<Documents>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn docs(&self) -> Result<MutexGuard<'_, Documents>, StoreError> {
        self.docs
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store poisoned".to_string()))
    }
}

/// Shared compare-and-swap rule for both document kinds.
fn check_version(stored: Option<i64>, expected: i64, what: &str) -> Result<(), StoreError> {
    match (stored, expected) {
        (None, 0) => Ok(()),
        (Some(current), expected) if current == expected && expected > 0 => Ok(()),
        _ => Err(StoreError::VersionConflict(what.to_string())),
    }
}

impl LedgerStore for MemoryStore {
    async fn load_wallet(&self, owner_id: UserId) -> Result<Option<Wallet>, StoreError> {
        Ok(self.docs()?.wallets.get(&owner_id).cloned())
    }

    async fn save_wallet(&self, wallet: &mut Wallet) -> Result<(), StoreError> {
        let mut docs = self.docs()?;
        let stored = docs
            .wallets
            .get(&wallet.owner_id())
            .map(|w| w.account.version);
        check_version(stored, wallet.account.version, "wallet")?;

        wallet.account.version += 1;
        docs.wallets.insert(wallet.owner_id(), wallet.clone());
        Ok(())
    }

    async fn load_goal(
        &self,
        owner_id: UserId,
        goal_id: Uuid,
    ) -> Result<Option<SavingsGoal>, StoreError> {
        Ok(self
            .docs()?
            .goals
            .get(&goal_id)
            .filter(|goal| goal.owner_id() == owner_id)
            .cloned())
    }

    async fn list_goals(&self, owner_id: UserId) -> Result<Vec<SavingsGoal>, StoreError> {
        let mut goals: Vec<SavingsGoal> = self
            .docs()?
            .goals
            .values()
            .filter(|goal| goal.owner_id() == owner_id)
            .cloned()
            .collect();
        goals.sort_by(|a, b| {
            a.account
                .created_at
                .cmp(&b.account.created_at)
                .then_with(|| a.id().cmp(&b.id()))
        });
        Ok(goals)
    }

    async fn save_goal(&self, goal: &mut SavingsGoal) -> Result<(), StoreError> {
        let mut docs = self.docs()?;
        let stored = docs.goals.get(&goal.id()).map(|g| g.account.version);
        check_version(stored, goal.account.version, "savings goal")?;

        goal.account.version += 1;
        docs.goals.insert(goal.id(), goal.clone());
        Ok(())
    }

    async fn delete_goal(&self, goal: &SavingsGoal) -> Result<(), StoreError> {
        let mut docs = self.docs()?;
        let stored = docs.goals.get(&goal.id()).map(|g| g.account.version);
        if stored != Some(goal.account.version) {
            return Err(StoreError::VersionConflict("savings goal".to_string()));
        }
        docs.goals.remove(&goal.id());
        Ok(())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.docs().map(|_| ())
    }
}
