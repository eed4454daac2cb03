//! Personal finance ledger: a wallet plus named, optionally time-locked
//! savings goals, with transfers between them that never create or lose
//! money and a complete, append-only audit trail.
//!
//! # Layers
//!
//! - [`models`]: accounts, transaction records, fixed-point amounts
//! - [`services`]: the [`Ledger`](services::Ledger) service - wallet
//!   primitives, time-lock policy, transfer coordinator, savings registry
//! - [`store`]: persistence contract with in-memory and PostgreSQL backends
//! - [`handlers`], [`middleware`], [`routes`]: thin REST adapter

pub mod clock;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod store;

pub use error::LedgerError;
pub use models::money::Amount;
pub use services::{Ledger, LedgerSettings};
