//! Wallet data model and API response types.
//!
//! Every user has at most one wallet. It is opened lazily by the first
//! deposit (or explicitly) and starts with a zero balance.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::models::{
    account::{Account, TransactionRecord, UserId},
    money::Amount,
    transaction::TransactionResponse,
};

/// A user's primary liquid account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Wallet {
    #[serde(flatten)]
    pub account: Account,
}

impl Wallet {
    pub fn open(owner_id: UserId, currency: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            account: Account::new(owner_id, currency, now),
        }
    }

    pub fn owner_id(&self) -> UserId {
        self.account.owner_id
    }

    pub fn balance(&self) -> Amount {
        self.account.balance
    }
}

/// Response body for wallet endpoints.
///
/// # JSON Example
///
/// ```json
/// {
///   "id": "550e8400-e29b-41d4-a716-446655440000",
///   "owner_id": "660e8400-e29b-41d4-a716-446655440001",
///   "balance_minor": 30000,
///   "balance": "300.00",
///   "currency": "INR",
///   "created_at": "2026-10-18T10:00:00Z",
///   "updated_at": "2026-10-18T10:05:00Z"
/// }
/// ```
#[derive(Debug, Serialize)]
pub struct WalletResponse {
    pub id: Uuid,
    pub owner_id: UserId,
    pub balance_minor: i64,
    pub balance: String,
    pub currency: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Wallet> for WalletResponse {
    fn from(wallet: &Wallet) -> Self {
        let account = &wallet.account;
        Self {
            id: account.id,
            owner_id: account.owner_id,
            balance_minor: account.balance.minor(),
            balance: account.balance.to_string(),
            currency: account.currency.clone(),
            created_at: account.created_at,
            updated_at: account.updated_at,
        }
    }
}

/// Response for opening a wallet; `created` is false when it already existed.
#[derive(Debug, Serialize)]
pub struct OpenWalletResponse {
    pub created: bool,
    pub wallet: WalletResponse,
}

/// Balance after a wallet deposit or withdrawal plus the appended record.
#[derive(Debug, Serialize)]
pub struct ReceiptResponse {
    pub balance_minor: i64,
    pub balance: String,
    pub currency: String,
    pub transaction: TransactionResponse,
}

impl ReceiptResponse {
    pub fn new(wallet: &Wallet, record: TransactionRecord) -> Self {
        Self {
            balance_minor: wallet.balance().minor(),
            balance: wallet.balance().to_string(),
            currency: wallet.account.currency.clone(),
            transaction: record.into(),
        }
    }
}

/// Wallet history response.
#[derive(Debug, Serialize)]
pub struct WalletHistoryResponse {
    pub owner_id: UserId,
    pub balance_minor: i64,
    pub currency: String,
    pub transactions: Vec<TransactionResponse>,
}
