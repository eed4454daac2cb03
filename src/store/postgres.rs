//! PostgreSQL store.
//!
//! # Tables
//!
//! - `wallets`: one row per user (`owner_id` is unique)
//! - `savings_goals`: one row per goal
//! - `ledger_entries`: append-only history for both, keyed by `(account_id, seq)`
//!
//! Each save runs in its own database transaction: the account row is
//! updated with `WHERE version = $expected` and history entries newer than
//! the highest stored `seq` are inserted. Entries of deleted goals are kept
//! for audit.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{Postgres, Transaction};
use uuid::Uuid;

use crate::{
    db::DbPool,
    models::{
        account::{Account, TransactionKind, TransactionRecord, UserId},
        money::Amount,
        savings::SavingsGoal,
        wallet::Wallet,
    },
    store::{LedgerStore, StoreError},
};

#[derive(Debug, Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

#[derive(Debug, sqlx::FromRow)]
struct WalletRow {
    id: Uuid,
    owner_id: Uuid,
    balance_minor: i64,
    currency: String,
    version: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
struct GoalRow {
    id: Uuid,
    owner_id: Uuid,
    name: String,
    description: Option<String>,
    balance_minor: i64,
    currency: String,
    lock_date: NaiveDate,
    is_locked: bool,
    version: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
struct EntryRow {
    account_id: Uuid,
    seq: i64,
    kind: String,
    amount_minor: i64,
    description: Option<String>,
    balance_after_minor: i64,
    recorded_at: DateTime<Utc>,
}

impl TryFrom<EntryRow> for TransactionRecord {
    type Error = StoreError;

    fn try_from(row: EntryRow) -> Result<Self, Self::Error> {
        let kind = TransactionKind::parse(&row.kind).ok_or_else(|| {
            StoreError::Corrupt(format!(
                "entry {}/{} has unknown kind {:?}",
                row.account_id, row.seq, row.kind
            ))
        })?;
        Ok(TransactionRecord {
            seq: row.seq,
            amount: Amount::from_minor(row.amount_minor),
            kind,
            description: row.description,
            balance_after: Amount::from_minor(row.balance_after_minor),
            timestamp: row.recorded_at,
        })
    }
}

const ENTRY_COLUMNS: &str =
    "account_id, seq, kind, amount_minor, description, balance_after_minor, recorded_at";

const GOAL_COLUMNS: &str = "id, owner_id, name, description, balance_minor, currency, \
     lock_date, is_locked, version, created_at, updated_at";

impl PgStore {
    async fn load_history(
        &self,
        account_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, Vec<TransactionRecord>>, StoreError> {
        let rows = sqlx::query_as::<_, EntryRow>(&format!(
            "SELECT {ENTRY_COLUMNS} FROM ledger_entries WHERE account_id = ANY($1) ORDER BY account_id, seq"
        ))
        .bind(account_ids)
        .fetch_all(&self.pool)
        .await?;

        let mut history: HashMap<Uuid, Vec<TransactionRecord>> = HashMap::new();
        for row in rows {
            let account_id = row.account_id;
            history
                .entry(account_id)
                .or_default()
                .push(TransactionRecord::try_from(row)?);
        }
        Ok(history)
    }

    fn goal_from_row(row: GoalRow, history: Vec<TransactionRecord>) -> SavingsGoal {
        SavingsGoal {
            account: Account {
                id: row.id,
                owner_id: row.owner_id,
                balance: Amount::from_minor(row.balance_minor),
                currency: row.currency,
                history,
                version: row.version,
                created_at: row.created_at,
                updated_at: row.updated_at,
            },
            name: row.name,
            description: row.description,
            lock_date: row.lock_date,
            is_locked: row.is_locked,
        }
    }
}

/// Insert history entries that are not stored yet.
async fn append_entries(
    tx: &mut Transaction<'_, Postgres>,
    account: &Account,
) -> Result<(), StoreError> {
    let persisted: i64 = sqlx::query_scalar(
        "SELECT COALESCE(MAX(seq), 0)::BIGINT FROM ledger_entries WHERE account_id = $1",
    )
    .bind(account.id)
    .fetch_one(&mut **tx)
    .await?;

    for record in account.history.iter().filter(|r| r.seq > persisted) {
        sqlx::query(&format!(
            "INSERT INTO ledger_entries ({ENTRY_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7)"
        ))
        .bind(account.id)
        .bind(record.seq)
        .bind(record.kind.as_str())
        .bind(record.amount.minor())
        .bind(&record.description)
        .bind(record.balance_after.minor())
        .bind(record.timestamp)
        .execute(&mut **tx)
        .await?;
    }
    Ok(())
}

impl LedgerStore for PgStore {
    async fn load_wallet(&self, owner_id: UserId) -> Result<Option<Wallet>, StoreError> {
        let Some(row) = sqlx::query_as::<_, WalletRow>(
            r#"
            SELECT id, owner_id, balance_minor, currency, version, created_at, updated_at
            FROM wallets
            WHERE owner_id = $1
            "#,
        )
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await?
        else {
            return Ok(None);
        };

        let history = self
            .load_history(&[row.id])
            .await?
            .remove(&row.id)
            .unwrap_or_default();

        Ok(Some(Wallet {
            account: Account {
                id: row.id,
                owner_id: row.owner_id,
                balance: Amount::from_minor(row.balance_minor),
                currency: row.currency,
                history,
                version: row.version,
                created_at: row.created_at,
                updated_at: row.updated_at,
            },
        }))
    }

    async fn save_wallet(&self, wallet: &mut Wallet) -> Result<(), StoreError> {
        let account = &wallet.account;
        let mut tx = self.pool.begin().await?;

        let affected = if account.version == 0 {
            sqlx::query(
                r#"
                INSERT INTO wallets (id, owner_id, balance_minor, currency, version, created_at, updated_at)
                VALUES ($1, $2, $3, $4, 1, $5, $6)
                ON CONFLICT (owner_id) DO NOTHING
                "#,
            )
            .bind(account.id)
            .bind(account.owner_id)
            .bind(account.balance.minor())
            .bind(&account.currency)
            .bind(account.created_at)
            .bind(account.updated_at)
            .execute(&mut *tx)
            .await?
            .rows_affected()
        } else {
            sqlx::query(
                r#"
                UPDATE wallets
                SET balance_minor = $1,
                    version = version + 1,
                    updated_at = $2
                WHERE id = $3 AND version = $4
                "#,
            )
            .bind(account.balance.minor())
            .bind(account.updated_at)
            .bind(account.id)
            .bind(account.version)
            .execute(&mut *tx)
            .await?
            .rows_affected()
        };

        if affected == 0 {
            tx.rollback().await?;
            return Err(StoreError::VersionConflict("wallet".to_string()));
        }

        append_entries(&mut tx, account).await?;
        tx.commit().await?;

        wallet.account.version += 1;
        Ok(())
    }

    async fn load_goal(
        &self,
        owner_id: UserId,
        goal_id: Uuid,
    ) -> Result<Option<SavingsGoal>, StoreError> {
        // Filter by owner as well so foreign goals look absent
        let Some(row) = sqlx::query_as::<_, GoalRow>(&format!(
            "SELECT {GOAL_COLUMNS} FROM savings_goals WHERE id = $1 AND owner_id = $2"
        ))
        .bind(goal_id)
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await?
        else {
            return Ok(None);
        };

        let history = self
            .load_history(&[row.id])
            .await?
            .remove(&row.id)
            .unwrap_or_default();
        Ok(Some(Self::goal_from_row(row, history)))
    }

    async fn list_goals(&self, owner_id: UserId) -> Result<Vec<SavingsGoal>, StoreError> {
        let rows = sqlx::query_as::<_, GoalRow>(&format!(
            "SELECT {GOAL_COLUMNS} FROM savings_goals WHERE owner_id = $1 ORDER BY created_at, id"
        ))
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        let ids: Vec<Uuid> = rows.iter().map(|row| row.id).collect();
        let mut history = self.load_history(&ids).await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let entries = history.remove(&row.id).unwrap_or_default();
                Self::goal_from_row(row, entries)
            })
            .collect())
    }

    async fn save_goal(&self, goal: &mut SavingsGoal) -> Result<(), StoreError> {
        let account = &goal.account;
        let mut tx = self.pool.begin().await?;

        let affected = if account.version == 0 {
            sqlx::query(
                r#"
                INSERT INTO savings_goals (
                    id, owner_id, name, description, balance_minor, currency,
                    lock_date, is_locked, version, created_at, updated_at
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 1, $9, $10)
                ON CONFLICT (id) DO NOTHING
                "#,
            )
            .bind(account.id)
            .bind(account.owner_id)
            .bind(&goal.name)
            .bind(&goal.description)
            .bind(account.balance.minor())
            .bind(&account.currency)
            .bind(goal.lock_date)
            .bind(goal.is_locked)
            .bind(account.created_at)
            .bind(account.updated_at)
            .execute(&mut *tx)
            .await?
            .rows_affected()
        } else {
            sqlx::query(
                r#"
                UPDATE savings_goals
                SET balance_minor = $1,
                    lock_date = $2,
                    is_locked = $3,
                    version = version + 1,
                    updated_at = $4
                WHERE id = $5 AND version = $6
                "#,
            )
            .bind(account.balance.minor())
            .bind(goal.lock_date)
            .bind(goal.is_locked)
            .bind(account.updated_at)
            .bind(account.id)
            .bind(account.version)
            .execute(&mut *tx)
            .await?
            .rows_affected()
        };

        if affected == 0 {
            tx.rollback().await?;
            return Err(StoreError::VersionConflict("savings goal".to_string()));
        }

        append_entries(&mut tx, account).await?;
        tx.commit().await?;

        goal.account.version += 1;
        Ok(())
    }

    async fn delete_goal(&self, goal: &SavingsGoal) -> Result<(), StoreError> {
        let affected = sqlx::query(
            "DELETE FROM savings_goals WHERE id = $1 AND owner_id = $2 AND version = $3",
        )
        .bind(goal.id())
        .bind(goal.owner_id())
        .bind(goal.account.version)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if affected == 0 {
            return Err(StoreError::VersionConflict("savings goal".to_string()));
        }
        Ok(())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
