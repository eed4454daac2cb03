//! Wallet HTTP handlers.
//!
//! This module implements the wallet endpoints:
//! - POST /api/v1/wallet - Open the wallet (idempotent)
//! - GET /api/v1/wallet - Balance and currency
//! - POST /api/v1/wallet/deposit - Add money
//! - POST /api/v1/wallet/withdraw - Remove money
//! - GET /api/v1/wallet/transactions - History, newest first by default

use axum::{
    Extension, Json,
    extract::{Query, State},
    http::StatusCode,
};

use crate::{
    error::LedgerError,
    middleware::auth::AuthContext,
    models::{
        transaction::{AmountRequest, HistoryQuery},
        wallet::{OpenWalletResponse, ReceiptResponse, WalletHistoryResponse, WalletResponse},
    },
    routes::AppState,
    store::LedgerStore,
};

/// Open the authenticated user's wallet.
///
/// # Response
///
/// - **201 Created**: a new wallet was opened
/// - **200 OK**: the wallet already existed (`created` is false)
pub async fn open_wallet<S: LedgerStore>(
    State(state): State<AppState<S>>,
    Extension(auth): Extension<AuthContext>,
) -> Result<(StatusCode, Json<OpenWalletResponse>), LedgerError> {
    let (wallet, created) = state.ledger.open_wallet(auth.user_id).await?;
    let status = if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };

    Ok((
        status,
        Json(OpenWalletResponse {
            created,
            wallet: (&wallet).into(),
        }),
    ))
}

/// Get the wallet.
///
/// # Response
///
/// - **200 OK**: wallet details
/// - **404**: the user has no wallet yet
pub async fn get_wallet<S: LedgerStore>(
    State(state): State<AppState<S>>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<WalletResponse>, LedgerError> {
    let wallet = state.ledger.wallet(auth.user_id).await?;
    Ok(Json((&wallet).into()))
}

/// Deposit into the wallet, opening it on first use.
///
/// # Request Body
///
/// ```json
/// { "amount": "500.00", "description": "Salary" }
/// ```
pub async fn deposit<S: LedgerStore>(
    State(state): State<AppState<S>>,
    Extension(auth): Extension<AuthContext>,
    Json(request): Json<AmountRequest>,
) -> Result<Json<ReceiptResponse>, LedgerError> {
    let amount = request.amount()?;
    let (wallet, record) = state
        .ledger
        .deposit(auth.user_id, amount, request.description)
        .await?;

    Ok(Json(ReceiptResponse::new(&wallet, record)))
}

/// Withdraw from the wallet.
///
/// # Response
///
/// - **200 OK**: new balance and the withdrawal record
/// - **422**: insufficient funds
/// - **404**: the user has no wallet yet
pub async fn withdraw<S: LedgerStore>(
    State(state): State<AppState<S>>,
    Extension(auth): Extension<AuthContext>,
    Json(request): Json<AmountRequest>,
) -> Result<Json<ReceiptResponse>, LedgerError> {
    let amount = request.amount()?;
    let (wallet, record) = state
        .ledger
        .withdraw(auth.user_id, amount, request.description)
        .await?;

    Ok(Json(ReceiptResponse::new(&wallet, record)))
}

/// Wallet transaction history.
///
/// `?order=oldest_first` reverses the default newest-first ordering.
pub async fn transactions<S: LedgerStore>(
    State(state): State<AppState<S>>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<WalletHistoryResponse>, LedgerError> {
    let (wallet, history) = state
        .ledger
        .wallet_history(auth.user_id, query.order)
        .await?;

    Ok(Json(WalletHistoryResponse {
        owner_id: wallet.owner_id(),
        balance_minor: wallet.balance().minor(),
        currency: wallet.account.currency,
        transactions: history.into_iter().map(Into::into).collect(),
    }))
}
