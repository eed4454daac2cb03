//! Transaction API request/response types.
//!
//! This module defines:
//! - `AmountRequest`: request body for wallet deposits and withdrawals
//! - `TransactionResponse`: one history entry as returned to clients
//! - `HistoryQuery`: ordering parameter for history endpoints

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    error::LedgerError,
    models::{
        account::{SortOrder, TransactionKind, TransactionRecord},
        money::Amount,
    },
};

/// Request to move money in or out of the wallet.
///
/// # JSON Example
///
/// ```json
/// {
///   "amount": "250.00",
///   "description": "Salary"
/// }
/// ```
///
/// `amount` may be a JSON number or a decimal string. It is converted to
/// minor units before it reaches the ledger.
#[derive(Debug, Deserialize)]
pub struct AmountRequest {
    #[serde(default)]
    pub amount: serde_json::Value,

    /// Optional description
    pub description: Option<String>,
}

impl AmountRequest {
    pub fn amount(&self) -> Result<Amount, LedgerError> {
        Amount::from_json(&self.amount)?.ensure_positive()
    }
}

/// Query string for history endpoints: `?order=newest_first|oldest_first`.
#[derive(Debug, Default, Deserialize)]
pub struct HistoryQuery {
    #[serde(default)]
    pub order: SortOrder,
}

/// One transaction record as returned to clients.
///
/// # JSON Example
///
/// ```json
/// {
///   "seq": 3,
///   "kind": "withdrawal",
///   "amount_minor": 20000,
///   "amount": "200.00",
///   "description": "Transfer to savings: Holiday",
///   "balance_after_minor": 30000,
///   "timestamp": "2026-10-18T10:00:00Z"
/// }
/// ```
#[derive(Debug, Serialize)]
pub struct TransactionResponse {
    pub seq: i64,
    pub kind: TransactionKind,
    pub amount_minor: i64,
    pub amount: String,
    pub description: Option<String>,
    pub balance_after_minor: i64,
    pub timestamp: DateTime<Utc>,
}

impl From<TransactionRecord> for TransactionResponse {
    fn from(record: TransactionRecord) -> Self {
        Self {
            seq: record.seq,
            kind: record.kind,
            amount_minor: record.amount.minor(),
            amount: record.amount.to_string(),
            description: record.description,
            balance_after_minor: record.balance_after.minor(),
            timestamp: record.timestamp,
        }
    }
}
