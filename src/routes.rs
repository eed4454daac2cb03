//! Router construction and shared handler state.
//!
//! The API router carries no authentication of its own; the binary wraps
//! it with the API-key middleware, tests inject an `AuthContext` directly.

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::{
    handlers::{health, overview, savings, wallet},
    services::Ledger,
    store::LedgerStore,
};

/// State shared by every handler.
pub struct AppState<S> {
    pub ledger: Arc<Ledger<S>>,
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            ledger: Arc::clone(&self.ledger),
        }
    }
}

impl<S: LedgerStore> AppState<S> {
    pub fn new(ledger: Ledger<S>) -> Self {
        Self {
            ledger: Arc::new(ledger),
        }
    }
}

/// Authenticated ledger endpoints.
pub fn api_router<S: LedgerStore>(state: AppState<S>) -> Router {
    Router::new()
        // Wallet routes
        .route(
            "/api/v1/wallet",
            post(wallet::open_wallet::<S>).get(wallet::get_wallet::<S>),
        )
        .route("/api/v1/wallet/deposit", post(wallet::deposit::<S>))
        .route("/api/v1/wallet/withdraw", post(wallet::withdraw::<S>))
        .route(
            "/api/v1/wallet/transactions",
            get(wallet::transactions::<S>),
        )
        // Savings routes
        .route(
            "/api/v1/savings",
            get(savings::list_savings::<S>).post(savings::create_savings::<S>),
        )
        .route(
            "/api/v1/savings/{id}",
            get(savings::get_savings::<S>).delete(savings::delete_savings::<S>),
        )
        .route("/api/v1/savings/{id}/add", put(savings::add_to_savings::<S>))
        .route(
            "/api/v1/savings/{id}/withdraw",
            put(savings::withdraw_from_savings::<S>),
        )
        .route("/api/v1/savings/{id}/lock", put(savings::lock_savings::<S>))
        .route(
            "/api/v1/savings/{id}/transactions",
            get(savings::savings_transactions::<S>),
        )
        .route("/api/v1/overview", get(overview::overview::<S>))
        .with_state(state)
}

/// Unauthenticated endpoints.
pub fn public_router<S: LedgerStore>(state: AppState<S>) -> Router {
    Router::new()
        .route("/health", get(health::health_check::<S>))
        .with_state(state)
}
