//! Monetary value objects.
//!
//! Amounts are held in integer euro cents so discount arithmetic never
//! accumulates floating point error. The HTTP layer converts to and from
//! decimal euros at the boundary.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::ValidationError;

/// An amount of money in euro cents. Never negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    /// Creates a money value from euro cents. Negative input clamps to zero.
    pub const fn from_cents(cents: i64) -> Self {
        Self(if cents < 0 { 0 } else { cents })
    }

    /// Creates a money value from a decimal euro amount, rounding to the cent.
    pub fn from_eur(eur: f64) -> Result<Self, ValidationError> {
        if !eur.is_finite() || eur < 0.0 {
            return Err(ValidationError::invalid_format(
                "amount",
                "must be a non-negative number",
            ));
        }
        Ok(Self((eur * 100.0).round() as i64))
    }

    /// Amount in euro cents.
    pub fn cents(&self) -> i64 {
        self.0
    }

    /// Amount as decimal euros, for API payloads.
    pub fn as_eur(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Subtracts, flooring the result at zero.
    pub fn saturating_sub(&self, other: Money) -> Money {
        Money((self.0 - other.0).max(0))
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

/// A percentage between 0 and 100 inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Percent(f64);

impl Percent {
    /// Creates a percentage, rejecting values outside 0..=100.
    pub fn new(value: f64) -> Result<Self, ValidationError> {
        if !value.is_finite() || !(0.0..=100.0).contains(&value) {
            return Err(ValidationError::out_of_range("percentage", 0.0, 100.0, value));
        }
        Ok(Self(value))
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    /// This percentage of an amount, rounded to the cent.
    pub fn of(&self, amount: Money) -> Money {
        Money::from_cents(((amount.cents() as f64) * self.0 / 100.0).round() as i64)
    }
}

impl fmt::Display for Percent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}
