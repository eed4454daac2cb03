//! API Key model for authentication.
//!
//! API keys identify the user behind a request. They are stored in the
//! database as SHA-256 hashes; the ledger only ever sees the resolved
//! `user_id`.

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Represents an API key record from the database.
///
/// # Database Table
///
/// Maps to the `api_keys` table with columns:
/// - `id`: Unique identifier (UUID)
/// - `key_hash`: SHA-256 hash of the actual API key
/// - `user_id`: opaque user identifier the key authenticates
/// - `label`: human-readable name for the key
/// - `created_at`: When the key was created
/// - `is_active`: Whether the key is currently valid
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ApiKey {
    pub id: Uuid,

    /// SHA-256 hash of the actual API key (64 hex characters)
    pub key_hash: String,

    pub user_id: Uuid,

    pub label: String,

    pub created_at: DateTime<Utc>,

    /// Inactive keys are rejected during authentication
    pub is_active: bool,
}

/// Hex-encoded SHA-256 of a presented key, as stored in `key_hash`.
pub fn hash_key(api_key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(api_key.as_bytes());
    hex::encode(hasher.finalize())
}
