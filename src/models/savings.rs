//! Savings goal data model and API request/response types.
//!
//! This module defines:
//! - `SavingsGoal`: a named, optionally time-locked ledger account
//! - `NewSavingsGoal`: validated creation parameters
//! - Request bodies for create, add, withdraw and lock
//! - `SavingsResponse` / `SavingsListResponse`: response bodies
//!
//! # Lifecycle
//!
//! A goal is created by moving money out of the owner's wallet, mutated by
//! add-funds, withdraw-funds and lock operations, and destroyed by deletion,
//! which first refunds any remaining balance to the wallet.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    error::LedgerError,
    models::{
        account::{Account, TransactionRecord, UserId},
        money::Amount,
    },
    services::time_lock::{self, LockState},
};

/// A named secondary account tied to one wallet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SavingsGoal {
    #[serde(flatten)]
    pub account: Account,

    /// User-chosen label, not required to be unique
    pub name: String,

    pub description: Option<String>,

    /// Calendar date from which withdrawal and deletion are allowed
    pub lock_date: NaiveDate,

    /// Stored lock flag; see [`time_lock::lock_state`] for the effective state
    pub is_locked: bool,
}

impl SavingsGoal {
    /// Build an empty goal in the given currency.
    ///
    /// The opening balance is added by the caller through [`SavingsGoal::add_funds`]
    /// so that it appears in the history like any other deposit.
    pub fn new(
        owner_id: UserId,
        params: NewSavingsGoal,
        currency: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            account: Account::new(owner_id, currency, now),
            name: params.name,
            description: params.description,
            lock_date: params.lock_date,
            is_locked: params.locked,
        }
    }

    pub fn id(&self) -> Uuid {
        self.account.id
    }

    pub fn owner_id(&self) -> UserId {
        self.account.owner_id
    }

    pub fn balance(&self) -> Amount {
        self.account.balance
    }

    pub fn lock_state(&self, today: NaiveDate) -> LockState {
        time_lock::lock_state(self.is_locked, self.lock_date, today)
    }

    /// Deposit into the goal. Never gated by the time lock.
    pub fn add_funds(
        &mut self,
        amount: Amount,
        description: Option<String>,
        at: DateTime<Utc>,
    ) -> Result<TransactionRecord, LedgerError> {
        self.account.deposit(amount, description, at)
    }

    /// Withdraw from the goal.
    ///
    /// # Errors
    ///
    /// - `Locked`: the goal is locked on `today`
    /// - `InvalidAmount` / `InsufficientFunds`: as for any account
    pub fn withdraw_funds(
        &mut self,
        amount: Amount,
        description: Option<String>,
        today: NaiveDate,
        at: DateTime<Utc>,
    ) -> Result<TransactionRecord, LedgerError> {
        time_lock::ensure_unlocked(self, today)?;
        self.account.withdraw(amount, description, at)
    }
}

/// Validated parameters for a new savings goal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSavingsGoal {
    pub name: String,
    pub description: Option<String>,
    pub lock_date: NaiveDate,
    pub locked: bool,
}

impl NewSavingsGoal {
    pub fn new(name: impl Into<String>, lock_date: NaiveDate) -> Self {
        Self {
            name: name.into(),
            description: None,
            lock_date,
            locked: true,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn unlocked(mut self) -> Self {
        self.locked = false;
        self
    }

    pub fn validate(&self) -> Result<(), LedgerError> {
        if self.name.trim().is_empty() {
            return Err(LedgerError::InvalidRequest(
                "Savings name is required".to_string(),
            ));
        }
        Ok(())
    }
}

/// Parse a lock date given either as `YYYY-MM-DD` or as an RFC 3339 timestamp.
///
/// Timestamps are reduced to their UTC calendar date; time of day never
/// matters for lock comparisons.
pub fn parse_lock_date(input: &str) -> Result<NaiveDate, LedgerError> {
    let text = input.trim();
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return Ok(date);
    }
    DateTime::parse_from_rfc3339(text)
        .map(|ts| ts.with_timezone(&Utc).date_naive())
        .map_err(|_| LedgerError::InvalidLockDate(format!("\"{input}\" is not a date")))
}

fn required_lock_date(input: Option<&str>) -> Result<NaiveDate, LedgerError> {
    match input {
        Some(text) if !text.trim().is_empty() => parse_lock_date(text),
        _ => Err(LedgerError::InvalidLockDate(
            "Lock date is required".to_string(),
        )),
    }
}

/// Request to create a savings goal funded from the wallet.
///
/// # JSON Example
///
/// ```json
/// {
///   "name": "Holiday",
///   "amount": 200,
///   "description": "Goa in December",
///   "lock_date": "2026-12-01",
///   "locked": true
/// }
/// ```
///
/// `locked` defaults to true.
#[derive(Debug, Deserialize)]
pub struct CreateSavingsRequest {
    pub name: Option<String>,

    #[serde(default)]
    pub amount: serde_json::Value,

    pub description: Option<String>,

    pub lock_date: Option<String>,

    pub locked: Option<bool>,
}

impl CreateSavingsRequest {
    pub fn into_parts(self) -> Result<(Amount, NewSavingsGoal), LedgerError> {
        let amount = Amount::from_json(&self.amount)?.ensure_positive()?;
        let lock_date = required_lock_date(self.lock_date.as_deref())?;
        let params = NewSavingsGoal {
            name: self.name.unwrap_or_default().trim().to_string(),
            description: self.description.filter(|d| !d.trim().is_empty()),
            lock_date,
            locked: self.locked.unwrap_or(true),
        };
        params.validate()?;
        Ok((amount, params))
    }
}

/// Request to withdraw from a savings goal.
///
/// `send_to_wallet` defaults to true; when false the money leaves the ledger.
#[derive(Debug, Deserialize)]
pub struct WithdrawSavingsRequest {
    #[serde(default)]
    pub amount: serde_json::Value,

    #[serde(default = "default_send_to_wallet")]
    pub send_to_wallet: bool,
}

fn default_send_to_wallet() -> bool {
    true
}

impl WithdrawSavingsRequest {
    pub fn amount(&self) -> Result<Amount, LedgerError> {
        Amount::from_json(&self.amount)?.ensure_positive()
    }
}

/// Request to (re-)lock a savings goal until a future date.
#[derive(Debug, Deserialize)]
pub struct LockSavingsRequest {
    pub lock_date: Option<String>,
}

impl LockSavingsRequest {
    pub fn lock_date(&self) -> Result<NaiveDate, LedgerError> {
        required_lock_date(self.lock_date.as_deref())
    }
}

/// Response body for a single savings goal.
///
/// `is_locked` reports the effective state on the day of the request, so a
/// goal whose lock date has arrived is shown unlocked.
#[derive(Debug, Serialize)]
pub struct SavingsResponse {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub balance_minor: i64,
    pub balance: String,
    pub currency: String,
    pub lock_date: NaiveDate,
    pub is_locked: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SavingsResponse {
    pub fn new(goal: &SavingsGoal, today: NaiveDate) -> Self {
        Self {
            id: goal.id(),
            name: goal.name.clone(),
            description: goal.description.clone(),
            balance_minor: goal.balance().minor(),
            balance: goal.balance().to_string(),
            currency: goal.account.currency.clone(),
            lock_date: goal.lock_date,
            is_locked: goal.lock_state(today).is_locked(),
            created_at: goal.account.created_at,
            updated_at: goal.account.updated_at,
        }
    }
}

/// All goals of a user with the aggregate saved amount.
#[derive(Debug, Serialize)]
pub struct SavingsListResponse {
    pub total_saved_minor: i64,
    pub total_saved: String,
    pub savings: Vec<SavingsResponse>,
}

/// Result of a savings withdrawal.
#[derive(Debug, Serialize)]
pub struct SavingsWithdrawalResponse {
    pub savings: SavingsResponse,
    pub sent_to_wallet: bool,
    pub wallet_balance_minor: Option<i64>,
    pub message: String,
}

/// Result of deleting a savings goal.
#[derive(Debug, Serialize)]
pub struct DeleteSavingsResponse {
    pub deleted: Uuid,
    pub refunded_minor: i64,
    pub refunded: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn lock_dates_accept_dates_and_timestamps() {
        let expected = NaiveDate::from_ymd_opt(2026, 12, 1).unwrap();
        assert_eq!(parse_lock_date("2026-12-01").unwrap(), expected);
        assert_eq!(parse_lock_date("2026-12-01T18:30:00Z").unwrap(), expected);
        assert_eq!(parse_lock_date("2026-12-02T01:00:00+05:30").unwrap(), expected);
        assert!(matches!(
            parse_lock_date("next week"),
            Err(LedgerError::InvalidLockDate(_))
        ));
    }

    #[test]
    fn create_request_requires_name_amount_and_lock_date() {
        let ok: CreateSavingsRequest = serde_json::from_value(json!({
            "name": " Holiday ",
            "amount": "200",
            "lock_date": "2026-12-01"
        }))
        .unwrap();
        let (amount, params) = ok.into_parts().unwrap();
        assert_eq!(amount.minor(), 20000);
        assert_eq!(params.name, "Holiday");
        assert!(params.locked);

        let no_name: CreateSavingsRequest = serde_json::from_value(json!({
            "amount": 10,
            "lock_date": "2026-12-01"
        }))
        .unwrap();
        assert!(matches!(
            no_name.into_parts(),
            Err(LedgerError::InvalidRequest(_))
        ));

        let no_date: CreateSavingsRequest =
            serde_json::from_value(json!({ "name": "x", "amount": 10 })).unwrap();
        assert!(matches!(
            no_date.into_parts(),
            Err(LedgerError::InvalidLockDate(_))
        ));

        let zero: CreateSavingsRequest = serde_json::from_value(json!({
            "name": "x",
            "amount": 0,
            "lock_date": "2026-12-01"
        }))
        .unwrap();
        assert!(matches!(
            zero.into_parts(),
            Err(LedgerError::InvalidAmount(_))
        ));
    }

    #[test]
    fn withdraw_request_sends_to_wallet_by_default() {
        let req: WithdrawSavingsRequest = serde_json::from_value(json!({ "amount": 5 })).unwrap();
        assert!(req.send_to_wallet);
    }
}
