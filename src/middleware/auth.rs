//! API key authentication middleware.
//!
//! This is the identity provider for the ledger. It intercepts every
//! protected request to:
//! 1. Extract the API key from the Authorization header
//! 2. Hash it and verify it exists in the database
//! 3. Inject the resolved user into the request
//! 4. Reject unauthorized requests with HTTP 401

use crate::{
    db::DbPool,
    error::LedgerError,
    models::{
        account::UserId,
        api_key::{ApiKey, hash_key},
    },
};
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

/// Authentication context attached to authenticated requests.
///
/// Handlers extract it with `Extension<AuthContext>` and pass `user_id`
/// to the ledger, which trusts it as already authenticated.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user_id: UserId,

    /// Label of the API key used
    pub key_label: String,
}

/// API key authentication middleware function.
///
/// # Headers
///
/// ```text
/// Authorization: Bearer abc123xyz
/// ```
///
/// # Returns
///
/// - `Ok(Response)` if authenticated successfully (calls next handler)
/// - `Err(LedgerError::InvalidApiKey)` if authentication fails (returns 401)
pub async fn auth_middleware(
    State(pool): State<DbPool>,
    mut request: Request,
    next: Next,
) -> Result<Response, LedgerError> {
    let auth_header = request
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .ok_or(LedgerError::InvalidApiKey)?;

    let api_key = auth_header
        .strip_prefix("Bearer ")
        .ok_or(LedgerError::InvalidApiKey)?;

    let key_hash = hash_key(api_key);

    let api_key_record = sqlx::query_as::<_, ApiKey>(
        "SELECT id, key_hash, user_id, label, created_at, is_active
         FROM api_keys
         WHERE key_hash = $1 AND is_active = true",
    )
    .bind(&key_hash)
    .fetch_optional(&pool)
    .await?
    .ok_or(LedgerError::InvalidApiKey)?;

    request.extensions_mut().insert(AuthContext {
        user_id: api_key_record.user_id,
        key_label: api_key_record.label,
    });

    Ok(next.run(request).await)
}
