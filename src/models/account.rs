//! Ledger account: the balance-holding record shared by wallets and savings goals.
//!
//! This module defines:
//! - `Account`: balance, currency and append-only transaction history
//! - `TransactionRecord`: one immutable history entry
//! - `TransactionKind` and `SortOrder`
//!
//! # Invariants
//!
//! - `balance == sum(deposits) - sum(withdrawals)` at all times
//! - `balance >= 0` always
//! - history is append-only and timestamps never decrease
//!
//! `deposit` and `withdraw` are the only mutators of `balance`; every
//! higher-level operation composes them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{error::LedgerError, models::money::Amount};

/// Opaque identifier supplied by the identity provider.
pub type UserId = Uuid;

/// Direction of a transaction relative to the account it is recorded on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Deposit,
    Withdrawal,
}

impl TransactionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TransactionKind::Deposit => "deposit",
            TransactionKind::Withdrawal => "withdrawal",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "deposit" => Some(TransactionKind::Deposit),
            "withdrawal" => Some(TransactionKind::Withdrawal),
            _ => None,
        }
    }
}

/// Immutable log entry of one deposit or withdrawal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    /// Position in the owning account's history, starting at 1
    pub seq: i64,

    /// Always positive
    pub amount: Amount,

    pub kind: TransactionKind,

    pub description: Option<String>,

    /// Account balance right after this entry was applied
    pub balance_after: Amount,

    pub timestamp: DateTime<Utc>,
}

/// History ordering for reads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    NewestFirst,
    OldestFirst,
}

/// A balance-holding ledger account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Account {
    pub id: Uuid,

    pub owner_id: UserId,

    pub balance: Amount,

    /// Fixed for the lifetime of the account
    pub currency: String,

    pub history: Vec<TransactionRecord>,

    /// Optimistic concurrency version; 0 means never persisted
    #[serde(skip)]
    pub version: i64,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl Account {
    pub fn new(owner_id: UserId, currency: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner_id,
            balance: Amount::ZERO,
            currency: currency.into(),
            history: Vec::new(),
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Credit the account and append a deposit record.
    ///
    /// # Errors
    ///
    /// - `InvalidAmount`: amount is zero or negative, or the balance would overflow
    ///
    /// The account is untouched on error.
    pub fn deposit(
        &mut self,
        amount: Amount,
        description: Option<String>,
        at: DateTime<Utc>,
    ) -> Result<TransactionRecord, LedgerError> {
        let amount = amount.ensure_positive()?;
        let balance = self.balance.checked_add(amount).ok_or_else(|| {
            LedgerError::InvalidAmount("Deposit would overflow the balance".to_string())
        })?;

        Ok(self.append(amount, TransactionKind::Deposit, description, balance, at))
    }

    /// Debit the account and append a withdrawal record.
    ///
    /// # Errors
    ///
    /// - `InvalidAmount`: amount is zero or negative
    /// - `InsufficientFunds`: amount exceeds the balance
    ///
    /// The account is untouched on error.
    pub fn withdraw(
        &mut self,
        amount: Amount,
        description: Option<String>,
        at: DateTime<Utc>,
    ) -> Result<TransactionRecord, LedgerError> {
        let amount = amount.ensure_positive()?;
        if amount > self.balance {
            return Err(LedgerError::InsufficientFunds {
                available: self.balance,
                requested: amount,
            });
        }
        let balance = self
            .balance
            .checked_sub(amount)
            .ok_or(LedgerError::InsufficientFunds {
                available: self.balance,
                requested: amount,
            })?;

        Ok(self.append(amount, TransactionKind::Withdrawal, description, balance, at))
    }

    /// Fails with `InsufficientFunds` unless `amount` can be withdrawn.
    pub fn ensure_covers(&self, amount: Amount) -> Result<(), LedgerError> {
        if amount > self.balance {
            Err(LedgerError::InsufficientFunds {
                available: self.balance,
                requested: amount,
            })
        } else {
            Ok(())
        }
    }

    /// The transaction history in the requested order.
    ///
    /// Newest-first sorts by timestamp descending; entries sharing a
    /// timestamp keep their insertion order.
    pub fn history(&self, order: SortOrder) -> Vec<TransactionRecord> {
        let mut records = self.history.clone();
        if order == SortOrder::NewestFirst {
            records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        }
        records
    }

    /// Sum of all deposits minus sum of all withdrawals in the history.
    pub fn net_flow(&self) -> i128 {
        self.history
            .iter()
            .map(|record| match record.kind {
                TransactionKind::Deposit => i128::from(record.amount.minor()),
                TransactionKind::Withdrawal => -i128::from(record.amount.minor()),
            })
            .sum()
    }

    fn append(
        &mut self,
        amount: Amount,
        kind: TransactionKind,
        description: Option<String>,
        balance_after: Amount,
        at: DateTime<Utc>,
    ) -> TransactionRecord {
        // Clock skew must not reorder history.
        let timestamp = match self.history.last() {
            Some(last) if last.timestamp > at => last.timestamp,
            _ => at,
        };

        let record = TransactionRecord {
            seq: self.history.len() as i64 + 1,
            amount,
            kind,
            description: description.filter(|d| !d.is_empty()),
            balance_after,
            timestamp,
        };

        self.balance = balance_after;
        self.updated_at = timestamp;
        self.history.push(record.clone());
        record
    }
}
