//! Balance overview: wallet plus savings at a glance.

use axum::{Extension, Json, extract::State};
use serde::Serialize;

use crate::{
    error::LedgerError, middleware::auth::AuthContext, routes::AppState, store::LedgerStore,
};

#[derive(Debug, Serialize)]
pub struct OverviewResponse {
    pub wallet_balance_minor: i64,
    pub wallet_balance: String,
    pub currency: Option<String>,
    pub total_saved_minor: i64,
    pub total_saved: String,
    pub goal_count: usize,
    pub locked_goal_count: usize,
}

/// `GET /api/v1/overview`
pub async fn overview<S: LedgerStore>(
    State(state): State<AppState<S>>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<OverviewResponse>, LedgerError> {
    let overview = state.ledger.overview(auth.user_id).await?;

    Ok(Json(OverviewResponse {
        wallet_balance_minor: overview.wallet_balance.minor(),
        wallet_balance: overview.wallet_balance.to_string(),
        currency: overview.currency,
        total_saved_minor: overview.total_saved.minor(),
        total_saved: overview.total_saved.to_string(),
        goal_count: overview.goal_count,
        locked_goal_count: overview.locked_goal_count,
    }))
}
