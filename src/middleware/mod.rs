//! HTTP middleware components.
//!
//! Middleware run before route handlers. Here they only authenticate:
//! the ledger itself never sees credentials, just a resolved user id.

/// API key authentication middleware
pub mod auth;
