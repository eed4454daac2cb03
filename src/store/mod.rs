//! Persistence contract for ledger accounts.
//!
//! The ledger needs very little from storage:
//! - load one account document by owner or id
//! - save it with an optimistic version check (compare-and-swap)
//! - grow its transaction history append-only
//!
//! Multi-document transactions are not required. Compound operations keep
//! the books balanced by compensating writes instead (see
//! [`crate::services::transfer`]).
//!
//! # Versioning
//!
//! Every account carries `version`. A value of 0 means "never persisted" and
//! asks the store to insert. Otherwise the save only succeeds if the stored
//! version still equals the in-memory one; on success the in-memory version
//! is bumped. A mismatch is reported as [`StoreError::VersionConflict`].

use std::future::Future;

use uuid::Uuid;

use crate::models::{account::UserId, savings::SavingsGoal, wallet::Wallet};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Errors raised by a storage backend.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// The document changed (or disappeared) since it was loaded.
    #[error("{0} was modified concurrently")]
    VersionConflict(String),

    /// Stored data could not be mapped back into a ledger type.
    #[error("Corrupt record: {0}")]
    Corrupt(String),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// Account storage used by the ledger service.
pub trait LedgerStore: Send + Sync + 'static {
    fn load_wallet(
        &self,
        owner_id: UserId,
    ) -> impl Future<Output = Result<Option<Wallet>, StoreError>> + Send;

    /// Insert (version 0) or compare-and-swap the wallet, appending new history.
    fn save_wallet(
        &self,
        wallet: &mut Wallet,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Load a goal only if it belongs to `owner_id`.
    fn load_goal(
        &self,
        owner_id: UserId,
        goal_id: Uuid,
    ) -> impl Future<Output = Result<Option<SavingsGoal>, StoreError>> + Send;

    /// All goals of a user, oldest first.
    fn list_goals(
        &self,
        owner_id: UserId,
    ) -> impl Future<Output = Result<Vec<SavingsGoal>, StoreError>> + Send;

    /// Insert (version 0) or compare-and-swap the goal, appending new history.
    fn save_goal(
        &self,
        goal: &mut SavingsGoal,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Remove a goal, provided it has not changed since it was loaded.
    fn delete_goal(
        &self,
        goal: &SavingsGoal,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Cheap liveness probe for health checks.
    fn ping(&self) -> impl Future<Output = Result<(), StoreError>> + Send;
}
