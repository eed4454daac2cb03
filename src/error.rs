//! Error types and HTTP error response handling.
//!
//! This module defines every error the ledger can report and how each one
//! is converted into an HTTP response with an appropriate status code and
//! JSON body. All of them are recoverable, caller-facing conditions; none
//! aborts the process.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::NaiveDate;
use serde_json::json;
use uuid::Uuid;

use crate::{models::money::Amount, store::StoreError};

/// Ledger-wide error type.
///
/// # Error Categories
///
/// - **Amount Errors**: non-positive or non-numeric amounts, overdrafts
/// - **Time-Lock Errors**: withdrawals blocked by a lock, lock misuse
/// - **Resource Errors**: wallet or savings goal not found
/// - **Concurrency Errors**: optimistic version conflicts, lock wait timeouts
/// - **Storage Errors**: anything unexpected from the persistence layer
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// Amount is zero, negative, malformed or would overflow a balance.
    ///
    /// Returns HTTP 400 Bad Request.
    #[error("{0}")]
    InvalidAmount(String),

    /// Withdrawal or transfer exceeds the available balance.
    ///
    /// Returns HTTP 422 Unprocessable Entity.
    #[error("Insufficient funds: requested {requested}, available {available}")]
    InsufficientFunds { available: Amount, requested: Amount },

    /// The savings goal is time-locked.
    ///
    /// Returns HTTP 423 Locked.
    #[error("Savings is locked until {until}")]
    Locked { until: NaiveDate },

    /// A lock was requested on a goal that is still locked.
    ///
    /// Returns HTTP 409 Conflict.
    #[error("Savings is already locked until {until}")]
    AlreadyLocked { until: NaiveDate },

    /// The requested lock date is missing, malformed or not in the future.
    ///
    /// Returns HTTP 400 Bad Request.
    #[error("Invalid lock date: {0}")]
    InvalidLockDate(String),

    /// The user has no wallet yet.
    ///
    /// Returns HTTP 404 Not Found.
    #[error("Wallet not found")]
    WalletNotFound,

    /// The savings goal does not exist or belongs to another user.
    ///
    /// Returns HTTP 404 Not Found.
    #[error("Savings goal {0} not found")]
    SavingsNotFound(Uuid),

    /// Another writer changed the account between load and save.
    ///
    /// Returns HTTP 409 Conflict.
    #[error("Concurrent modification: {0}")]
    Conflict(String),

    /// The account lock could not be acquired within the configured wait.
    ///
    /// Returns HTTP 503 Service Unavailable.
    #[error("Account is busy, retry later")]
    Busy,

    /// Request body or parameters are invalid.
    ///
    /// Returns HTTP 400 Bad Request.
    #[error("{0}")]
    InvalidRequest(String),

    /// API key is missing, invalid, or inactive.
    ///
    /// Returns HTTP 401 Unauthorized.
    #[error("Invalid API key")]
    InvalidApiKey,

    /// Persistence failed unexpectedly.
    ///
    /// Returns HTTP 500 Internal Server Error (hides details from client).
    #[error("Storage error: {0}")]
    Storage(StoreError),
}

impl LedgerError {
    /// Stable machine-readable code for the presentation layer.
    pub fn code(&self) -> &'static str {
        match self {
            LedgerError::InvalidAmount(_) => "invalid_amount",
            LedgerError::InsufficientFunds { .. } => "insufficient_funds",
            LedgerError::Locked { .. } => "locked",
            LedgerError::AlreadyLocked { .. } => "already_locked",
            LedgerError::InvalidLockDate(_) => "invalid_lock_date",
            LedgerError::WalletNotFound => "wallet_not_found",
            LedgerError::SavingsNotFound(_) => "savings_not_found",
            LedgerError::Conflict(_) => "conflict",
            LedgerError::Busy => "busy",
            LedgerError::InvalidRequest(_) => "invalid_request",
            LedgerError::InvalidApiKey => "invalid_api_key",
            LedgerError::Storage(_) => "internal_error",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            LedgerError::InvalidAmount(_)
            | LedgerError::InvalidLockDate(_)
            | LedgerError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            LedgerError::InsufficientFunds { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            LedgerError::Locked { .. } => StatusCode::LOCKED,
            LedgerError::AlreadyLocked { .. } | LedgerError::Conflict(_) => StatusCode::CONFLICT,
            LedgerError::WalletNotFound | LedgerError::SavingsNotFound(_) => StatusCode::NOT_FOUND,
            LedgerError::Busy => StatusCode::SERVICE_UNAVAILABLE,
            LedgerError::InvalidApiKey => StatusCode::UNAUTHORIZED,
            LedgerError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Version conflicts are a concurrency outcome, not a storage fault.
impl From<StoreError> for LedgerError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::VersionConflict(what) => LedgerError::Conflict(what),
            other => LedgerError::Storage(other),
        }
    }
}

impl From<sqlx::Error> for LedgerError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::from(err).into()
    }
}

/// Convert LedgerError into an HTTP response.
///
/// # Response Format
///
/// ```json
/// {
///   "error": {
///     "code": "locked",
///     "message": "Savings is locked until 2026-10-25",
///     "lock_date": "2026-10-25"
///   }
/// }
/// ```
///
/// `lock_date` is only present for time-lock errors.
impl IntoResponse for LedgerError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code();

        let message = match &self {
            LedgerError::Storage(err) => {
                tracing::error!(error = %err, "storage failure");
                "An internal error occurred".to_string()
            }
            other => other.to_string(),
        };

        let mut error = json!({
            "code": code,
            "message": message,
        });
        if let LedgerError::Locked { until } | LedgerError::AlreadyLocked { until } = &self {
            error["lock_date"] = json!(until);
        }

        (status, Json(json!({ "error": error }))).into_response()
    }
}
