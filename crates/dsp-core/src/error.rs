//! # Core Error Types
//!
//! Validation errors for the foundational types. Domain-specific errors
//! (lifecycle, arbitration, quota, payments) live in their owning crates;
//! this enum covers only what `dsp-core` itself can reject.

use thiserror::Error;

/// Errors raised by foundational type constructors.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Timestamp string was malformed or not UTC.
    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),

    /// Monetary amount was negative, overflowed, or had a malformed
    /// currency code.
    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    /// Arithmetic across two different currencies.
    #[error("currency mismatch: {left} vs {right}")]
    CurrencyMismatch {
        /// Currency of the left operand.
        left: String,
        /// Currency of the right operand.
        right: String,
    },
}
