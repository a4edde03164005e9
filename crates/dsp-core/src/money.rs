//! # Monetary Amounts — Integer Minor Units
//!
//! `Money` carries an amount in the smallest unit of its currency (cents
//! for EUR/USD). Day rates, agreed prices, refunds, and transfers all use
//! this type.
//!
//! # Security Invariant
//!
//! Financial amounts must never be represented as floating-point numbers.
//! Integer minor units make equality exact and arithmetic checked.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// A monetary amount in minor currency units with its ISO 4217 currency code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    /// Amount in the smallest currency unit (e.g., cents).
    pub minor: i64,
    /// ISO 4217 currency code (e.g., "EUR", "USD").
    pub currency: String,
}

impl Money {
    /// Create a new monetary amount.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidAmount`] if the amount is negative or
    /// the currency code is not three ASCII uppercase letters.
    pub fn new(minor: i64, currency: impl Into<String>) -> Result<Self, CoreError> {
        let currency = currency.into();
        if minor < 0 {
            return Err(CoreError::InvalidAmount(format!(
                "amount must be non-negative, got {minor}"
            )));
        }
        if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_uppercase()) {
            return Err(CoreError::InvalidAmount(format!(
                "invalid ISO 4217 currency code: {currency:?}"
            )));
        }
        Ok(Self { minor, currency })
    }

    /// A zero amount in the given currency.
    pub fn zero(currency: impl Into<String>) -> Result<Self, CoreError> {
        Self::new(0, currency)
    }

    /// Whether the amount is zero.
    pub fn is_zero(&self) -> bool {
        self.minor == 0
    }

    /// Checked subtraction of a same-currency amount.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::CurrencyMismatch`] for cross-currency
    /// subtraction and [`CoreError::InvalidAmount`] if the result would
    /// be negative.
    pub fn checked_sub(&self, other: &Money) -> Result<Money, CoreError> {
        if self.currency != other.currency {
            return Err(CoreError::CurrencyMismatch {
                left: self.currency.clone(),
                right: other.currency.clone(),
            });
        }
        if other.minor > self.minor {
            return Err(CoreError::InvalidAmount(format!(
                "cannot subtract {} from {}: result would be negative",
                other, self
            )));
        }
        Ok(Money {
            minor: self.minor - other.minor,
            currency: self.currency.clone(),
        })
    }

    /// Checked addition of a same-currency amount.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::CurrencyMismatch`] for cross-currency addition
    /// and [`CoreError::InvalidAmount`] on overflow.
    pub fn checked_add(&self, other: &Money) -> Result<Money, CoreError> {
        if self.currency != other.currency {
            return Err(CoreError::CurrencyMismatch {
                left: self.currency.clone(),
                right: other.currency.clone(),
            });
        }
        let minor = self.minor.checked_add(other.minor).ok_or_else(|| {
            CoreError::InvalidAmount(format!("amount overflow adding {} to {}", other, self))
        })?;
        Ok(Money {
            minor,
            currency: self.currency.clone(),
        })
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.minor, self.currency)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_valid() {
        let m = Money::new(35_000, "EUR").unwrap();
        assert_eq!(m.minor, 35_000);
        assert_eq!(m.currency, "EUR");
    }

    #[test]
    fn test_negative_rejected() {
        assert!(Money::new(-1, "EUR").is_err());
    }

    #[test]
    fn test_bad_currency_rejected() {
        assert!(Money::new(100, "eur").is_err());
        assert!(Money::new(100, "EURO").is_err());
        assert!(Money::new(100, "").is_err());
    }

    #[test]
    fn test_checked_sub() {
        let price = Money::new(35_000, "EUR").unwrap();
        let refund = Money::new(10_000, "EUR").unwrap();
        let rest = price.checked_sub(&refund).unwrap();
        assert_eq!(rest.minor, 25_000);
    }

    #[test]
    fn test_checked_sub_underflow_rejected() {
        let price = Money::new(100, "EUR").unwrap();
        let refund = Money::new(200, "EUR").unwrap();
        assert!(price.checked_sub(&refund).is_err());
    }

    #[test]
    fn test_currency_mismatch_rejected() {
        let eur = Money::new(100, "EUR").unwrap();
        let usd = Money::new(100, "USD").unwrap();
        assert!(eur.checked_sub(&usd).is_err());
        assert!(eur.checked_add(&usd).is_err());
    }

    #[test]
    fn test_display() {
        let m = Money::new(35_000, "EUR").unwrap();
        assert_eq!(m.to_string(), "35000 EUR");
    }
}
