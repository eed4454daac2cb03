//! Time-lock policy for savings goals.
//!
//! A goal is either **Unlocked** (withdraw and delete allowed) or **Locked**
//! (both blocked). Adding funds is never gated.
//!
//! The comparison is made on calendar days: a goal locked until `D` becomes
//! withdrawable on `D` itself, not on `D + 1`. Keep the comparison
//! `today >= lock_date`; a strict inequality would silently hold money one
//! extra day.
//!
//! Expiry is a derived view. Reads report the effective state without
//! writing; [`apply_expiry`] normalises the stored flag when the goal is
//! next saved for some other reason.

use chrono::NaiveDate;

use crate::{error::LedgerError, models::savings::SavingsGoal};

/// Effective lock state of a goal on a given day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockState {
    Unlocked,
    Locked { until: NaiveDate },
}

impl LockState {
    pub fn is_locked(self) -> bool {
        matches!(self, LockState::Locked { .. })
    }
}

/// Decide the effective state from the stored flag and lock date.
pub fn lock_state(is_locked: bool, lock_date: NaiveDate, today: NaiveDate) -> LockState {
    if is_locked && today < lock_date {
        LockState::Locked { until: lock_date }
    } else {
        LockState::Unlocked
    }
}

/// Fails with `Locked` if the goal cannot be withdrawn from or deleted today.
pub fn ensure_unlocked(goal: &SavingsGoal, today: NaiveDate) -> Result<(), LedgerError> {
    match goal.lock_state(today) {
        LockState::Unlocked => Ok(()),
        LockState::Locked { until } => Err(LedgerError::Locked { until }),
    }
}

/// Validate a request to lock `goal` until `new_lock_date`.
///
/// # Errors
///
/// - `InvalidLockDate`: the new date is today or earlier
/// - `AlreadyLocked`: the goal is still locked
pub fn validate_relock(
    goal: &SavingsGoal,
    new_lock_date: NaiveDate,
    today: NaiveDate,
) -> Result<(), LedgerError> {
    if new_lock_date <= today {
        return Err(LedgerError::InvalidLockDate(format!(
            "{new_lock_date} is not in the future"
        )));
    }
    if let LockState::Locked { until } = goal.lock_state(today) {
        return Err(LedgerError::AlreadyLocked { until });
    }
    Ok(())
}

/// Clear the stored lock flag once the lock date has been reached.
///
/// Returns true when the flag changed. Applying it twice is the same as once.
pub fn apply_expiry(goal: &mut SavingsGoal, today: NaiveDate) -> bool {
    if goal.is_locked && !goal.lock_state(today).is_locked() {
        goal.is_locked = false;
        true
    } else {
        false
    }
}
