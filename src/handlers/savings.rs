//! Savings goal HTTP handlers.
//!
//! This module implements the savings endpoints:
//! - GET /api/v1/savings - All goals plus the total saved
//! - POST /api/v1/savings - Create a goal funded from the wallet
//! - GET /api/v1/savings/:id - One goal
//! - DELETE /api/v1/savings/:id - Delete a goal, refunding the wallet
//! - PUT /api/v1/savings/:id/add - Move money from the wallet into the goal
//! - PUT /api/v1/savings/:id/withdraw - Take money out of the goal
//! - PUT /api/v1/savings/:id/lock - Lock the goal until a future date
//! - GET /api/v1/savings/:id/transactions - Goal history

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use uuid::Uuid;

use crate::{
    error::LedgerError,
    middleware::auth::AuthContext,
    models::{
        savings::{
            CreateSavingsRequest, DeleteSavingsResponse, LockSavingsRequest, SavingsListResponse,
            SavingsResponse, SavingsWithdrawalResponse, WithdrawSavingsRequest,
        },
        transaction::{AmountRequest, HistoryQuery, TransactionResponse},
    },
    routes::AppState,
    services::savings,
    store::LedgerStore,
};

/// List the user's goals with the aggregate saved amount.
///
/// # Response (200)
///
/// ```json
/// {
///   "total_saved_minor": 20000,
///   "total_saved": "200.00",
///   "savings": [ { "id": "...", "name": "Holiday", "is_locked": true, ... } ]
/// }
/// ```
pub async fn list_savings<S: LedgerStore>(
    State(state): State<AppState<S>>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<SavingsListResponse>, LedgerError> {
    let goals = state.ledger.list_for_user(auth.user_id).await?;
    let today = state.ledger.today();
    let total = savings::total_balance(&goals)?;

    Ok(Json(SavingsListResponse {
        total_saved_minor: total.minor(),
        total_saved: total.to_string(),
        savings: goals
            .iter()
            .map(|goal| SavingsResponse::new(goal, today))
            .collect(),
    }))
}

/// Get one goal.
pub async fn get_savings<S: LedgerStore>(
    State(state): State<AppState<S>>,
    Extension(auth): Extension<AuthContext>,
    Path(goal_id): Path<Uuid>,
) -> Result<Json<SavingsResponse>, LedgerError> {
    let goal = state.ledger.savings_goal(auth.user_id, goal_id).await?;
    Ok(Json(SavingsResponse::new(&goal, state.ledger.today())))
}

/// Create a goal, moving `amount` out of the wallet.
///
/// # Request Body
///
/// ```json
/// {
///   "name": "Holiday",
///   "amount": 200,
///   "description": "Goa in December",
///   "lock_date": "2026-12-01"
/// }
/// ```
///
/// # Response
///
/// - **201 Created**: the new goal
/// - **422**: the wallet cannot cover the amount
/// - **404**: the user has no wallet
pub async fn create_savings<S: LedgerStore>(
    State(state): State<AppState<S>>,
    Extension(auth): Extension<AuthContext>,
    Json(request): Json<CreateSavingsRequest>,
) -> Result<(StatusCode, Json<SavingsResponse>), LedgerError> {
    let (amount, params) = request.into_parts()?;
    let goal = state
        .ledger
        .create_goal(auth.user_id, amount, params)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(SavingsResponse::new(&goal, state.ledger.today())),
    ))
}

/// Move money from the wallet into a goal. Allowed even while locked.
pub async fn add_to_savings<S: LedgerStore>(
    State(state): State<AppState<S>>,
    Extension(auth): Extension<AuthContext>,
    Path(goal_id): Path<Uuid>,
    Json(request): Json<AmountRequest>,
) -> Result<Json<SavingsResponse>, LedgerError> {
    let amount = request.amount()?;
    let (goal, _wallet) = state
        .ledger
        .add_to_savings(auth.user_id, goal_id, amount)
        .await?;

    Ok(Json(SavingsResponse::new(&goal, state.ledger.today())))
}

/// Withdraw from a goal.
///
/// # Request Body
///
/// ```json
/// { "amount": 50, "send_to_wallet": true }
/// ```
///
/// # Response
///
/// - **200 OK**: updated goal and, when credited, the new wallet balance
/// - **423 Locked**: the goal is locked; the body carries `lock_date`
/// - **422**: insufficient savings
pub async fn withdraw_from_savings<S: LedgerStore>(
    State(state): State<AppState<S>>,
    Extension(auth): Extension<AuthContext>,
    Path(goal_id): Path<Uuid>,
    Json(request): Json<WithdrawSavingsRequest>,
) -> Result<Json<SavingsWithdrawalResponse>, LedgerError> {
    let amount = request.amount()?;
    let outcome = state
        .ledger
        .withdraw_from_savings(auth.user_id, goal_id, amount, request.send_to_wallet)
        .await?;

    let message = if request.send_to_wallet {
        format!("Successfully withdrew {amount} and added to wallet")
    } else {
        format!("Successfully withdrew {amount} from savings")
    };

    Ok(Json(SavingsWithdrawalResponse {
        savings: SavingsResponse::new(&outcome.goal, state.ledger.today()),
        sent_to_wallet: outcome.wallet.is_some(),
        wallet_balance_minor: outcome.wallet.map(|w| w.balance().minor()),
        message,
    }))
}

/// Lock a goal until a future date.
///
/// # Response
///
/// - **200 OK**: the locked goal
/// - **409**: the goal is already locked
/// - **400**: the lock date is missing or not in the future
pub async fn lock_savings<S: LedgerStore>(
    State(state): State<AppState<S>>,
    Extension(auth): Extension<AuthContext>,
    Path(goal_id): Path<Uuid>,
    Json(request): Json<LockSavingsRequest>,
) -> Result<Json<SavingsResponse>, LedgerError> {
    let lock_date = request.lock_date()?;
    let goal = state
        .ledger
        .lock_savings(auth.user_id, goal_id, lock_date)
        .await?;

    Ok(Json(SavingsResponse::new(&goal, state.ledger.today())))
}

/// Delete a goal; any remaining balance goes back to the wallet first.
pub async fn delete_savings<S: LedgerStore>(
    State(state): State<AppState<S>>,
    Extension(auth): Extension<AuthContext>,
    Path(goal_id): Path<Uuid>,
) -> Result<Json<DeleteSavingsResponse>, LedgerError> {
    let refunded = state.ledger.delete_goal(auth.user_id, goal_id).await?;

    Ok(Json(DeleteSavingsResponse {
        deleted: goal_id,
        refunded_minor: refunded.minor(),
        refunded: refunded.to_string(),
    }))
}

/// Goal transaction history.
pub async fn savings_transactions<S: LedgerStore>(
    State(state): State<AppState<S>>,
    Extension(auth): Extension<AuthContext>,
    Path(goal_id): Path<Uuid>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<TransactionResponse>>, LedgerError> {
    let history = state
        .ledger
        .savings_history(auth.user_id, goal_id, query.order)
        .await?;

    Ok(Json(history.into_iter().map(Into::into).collect()))
}
