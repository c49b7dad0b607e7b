//! Discount rules and their application to an amount.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::{Money, Percent, ValidationError};

/// A coupon's discount rule: a percentage of the amount, or a fixed cut.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum Discount {
    /// Percentage of the purchase amount, 0–100.
    Percentage(Percent),
    /// Fixed amount off, must be positive.
    Fixed(Money),
}

impl Discount {
    /// Builds a discount from its wire representation (`"percentage"` /
    /// `"fixed"` plus a numeric value in percent or euros).
    pub fn from_parts(kind: &str, value: f64) -> Result<Self, ValidationError> {
        match kind {
            "percentage" => Ok(Discount::Percentage(Percent::new(value)?)),
            "fixed" => {
                let amount = Money::from_eur(value)?;
                if amount.is_zero() {
                    return Err(ValidationError::invalid_format(
                        "value",
                        "fixed discount must be greater than 0",
                    ));
                }
                Ok(Discount::Fixed(amount))
            }
            other => Err(ValidationError::invalid_format(
                "type",
                format!("must be 'percentage' or 'fixed', got '{}'", other),
            )),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Discount::Percentage(_) => "percentage",
            Discount::Fixed(_) => "fixed",
        }
    }

    /// Numeric value as exposed on the wire: percent, or euros.
    pub fn value(&self) -> f64 {
        match self {
            Discount::Percentage(p) => p.value(),
            Discount::Fixed(m) => m.as_eur(),
        }
    }

    /// Applies this discount to an amount, flooring the result at zero.
    pub fn apply(&self, amount: Money) -> Money {
        match self {
            Discount::Percentage(p) => amount.saturating_sub(p.of(amount)),
            Discount::Fixed(cut) => amount.saturating_sub(*cut),
        }
    }
}

impl fmt::Display for Discount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Discount::Percentage(p) => write!(f, "{}", p),
            Discount::Fixed(m) => write!(f, "{} EUR off", m),
        }
    }
}

/// Snapshot of the discount applied at checkout time, kept on the payment
/// transaction so later confirmation sees the terms that were agreed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscountSnapshot {
    pub coupon_code: String,
    pub discount: Discount,
    pub amount_off: Money,
}

impl DiscountSnapshot {
    pub fn capture(coupon_code: impl Into<String>, discount: Discount, requested: Money) -> Self {
        let final_amount = discount.apply(requested);
        Self {
            coupon_code: coupon_code.into(),
            discount,
            amount_off: requested.saturating_sub(final_amount),
        }
    }
}
