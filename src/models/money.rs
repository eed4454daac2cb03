//! Fixed-point money amounts.
//!
//! All balances and transaction amounts are held as integer minor units
//! (e.g. paise or cents). Decimal text is only parsed or produced at the
//! API boundary, so repeated small transfers never accumulate rounding drift.
//!
//! For example:
//! - `10.50` is stored as 1050 minor units
//! - `100` is stored as 10000 minor units

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::LedgerError;

/// Number of decimal places carried by every currency in the ledger.
pub const DECIMAL_PLACES: u32 = 2;

const MINOR_PER_MAJOR: i64 = 10_i64.pow(DECIMAL_PLACES);

/// A monetary amount in minor units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Amount(i64);

impl Amount {
    pub const ZERO: Amount = Amount(0);

    pub const fn from_minor(minor: i64) -> Self {
        Self(minor)
    }

    pub const fn minor(self) -> i64 {
        self.0
    }

    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    /// Rejects zero and negative amounts.
    pub fn ensure_positive(self) -> Result<Self, LedgerError> {
        if self.is_positive() {
            Ok(self)
        } else {
            Err(LedgerError::InvalidAmount(
                "Amount must be positive".to_string(),
            ))
        }
    }

    pub fn checked_add(self, other: Amount) -> Option<Amount> {
        self.0.checked_add(other.0).map(Amount)
    }

    pub fn checked_sub(self, other: Amount) -> Option<Amount> {
        self.0.checked_sub(other.0).map(Amount)
    }

    /// Parse a decimal string such as `"12"`, `"12.5"` or `"12.50"`.
    ///
    /// At most [`DECIMAL_PLACES`] fractional digits are accepted; anything
    /// else (signs, exponents, separators, extra precision) is rejected as
    /// `InvalidAmount` instead of being silently rounded.
    pub fn parse_decimal(input: &str) -> Result<Self, LedgerError> {
        let invalid = || LedgerError::InvalidAmount(format!("\"{input}\" is not a valid amount"));

        let text = input.trim();
        let (whole, fraction) = match text.split_once('.') {
            Some((whole, fraction)) => (whole, fraction),
            None => (text, ""),
        };

        if whole.is_empty() && fraction.is_empty() {
            return Err(invalid());
        }
        if !whole.bytes().all(|b| b.is_ascii_digit())
            || !fraction.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(invalid());
        }
        if fraction.len() > DECIMAL_PLACES as usize {
            return Err(LedgerError::InvalidAmount(format!(
                "\"{input}\" has more than {DECIMAL_PLACES} decimal places"
            )));
        }

        let whole: i64 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| invalid())?
        };
        let mut fraction_minor: i64 = if fraction.is_empty() {
            0
        } else {
            fraction.parse().map_err(|_| invalid())?
        };
        for _ in fraction.len()..DECIMAL_PLACES as usize {
            fraction_minor *= 10;
        }

        whole
            .checked_mul(MINOR_PER_MAJOR)
            .and_then(|minor| minor.checked_add(fraction_minor))
            .map(Amount)
            .ok_or_else(invalid)
    }

    /// Convert an amount received in a JSON body.
    ///
    /// Numbers and numeric strings are both accepted; any other JSON value
    /// is reported as `InvalidAmount`.
    pub fn from_json(value: &serde_json::Value) -> Result<Self, LedgerError> {
        match value {
            serde_json::Value::Number(number) => Self::parse_decimal(&number.to_string()),
            serde_json::Value::String(text) => Self::parse_decimal(text),
            serde_json::Value::Null => Err(LedgerError::InvalidAmount(
                "Amount is required".to_string(),
            )),
            _ => Err(LedgerError::InvalidAmount(
                "Amount must be a number".to_string(),
            )),
        }
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let per_major = MINOR_PER_MAJOR.unsigned_abs();
        write!(
            f,
            "{sign}{}.{:0width$}",
            abs / per_major,
            abs % per_major,
            width = DECIMAL_PLACES as usize
        )
    }
}
