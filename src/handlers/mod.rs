//! HTTP request handlers (route handlers).
//!
//! Each handler is a thin async adapter that:
//! 1. Receives HTTP request data (JSON body, URL params, etc.)
//! 2. Converts amounts and dates at the boundary and calls the ledger
//! 3. Returns HTTP response (JSON, status code)

/// Health check endpoint
pub mod health;
/// Wallet plus savings summary
pub mod overview;
/// Savings goal endpoints
pub mod savings;
/// Wallet endpoints
pub mod wallet;
