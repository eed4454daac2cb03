//! Business logic services.
//!
//! Services contain the ledger logic separated from HTTP handlers:
//! balance primitives, the time-lock policy, the transfer coordinator and
//! the savings registry.

pub mod ledger;
pub mod locks;
pub mod savings;
pub mod time_lock;
pub mod transfer;

pub use ledger::{Ledger, LedgerSettings};
pub use savings::Overview;
pub use transfer::SavingsWithdrawal;
