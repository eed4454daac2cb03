//! Data models representing ledger entities and API payloads.

/// Balance-holding account and transaction records
pub mod account;
/// API key authentication model
pub mod api_key;
/// Fixed-point money
pub mod money;
/// Savings goal model
pub mod savings;
/// Transaction API payloads
pub mod transaction;
/// Wallet model
pub mod wallet;
