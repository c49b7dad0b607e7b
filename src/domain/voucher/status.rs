//! Voucher lifecycle status.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::{DomainError, ErrorCode};

/// Lifecycle state of a gift card voucher.
///
/// A voucher is created `Pending` when a checkout session is opened, becomes
/// `Active` exactly once when the first payment confirmation is observed, and
/// later `Expired` (lazily, on verification) or `Redeemed` (admin action).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoucherStatus {
    Pending,
    Active,
    Redeemed,
    Expired,
    Failed,
    Canceled,
}

impl VoucherStatus {
    /// States in which the voucher carries a code.
    pub fn has_code(&self) -> bool {
        matches!(
            self,
            VoucherStatus::Active | VoucherStatus::Redeemed | VoucherStatus::Expired
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            VoucherStatus::Pending => "pending",
            VoucherStatus::Active => "active",
            VoucherStatus::Redeemed => "redeemed",
            VoucherStatus::Expired => "expired",
            VoucherStatus::Failed => "failed",
            VoucherStatus::Canceled => "canceled",
        }
    }

    pub fn parse(s: &str) -> Result<Self, DomainError> {
        match s {
            "pending" => Ok(VoucherStatus::Pending),
            "active" => Ok(VoucherStatus::Active),
            "redeemed" => Ok(VoucherStatus::Redeemed),
            "expired" => Ok(VoucherStatus::Expired),
            "failed" => Ok(VoucherStatus::Failed),
            "canceled" => Ok(VoucherStatus::Canceled),
            other => Err(DomainError::new(
                ErrorCode::InvalidFormat,
                format!("Unknown voucher status: {}", other),
            )),
        }
    }
}

impl fmt::Display for VoucherStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_bearing_states() {
        assert!(VoucherStatus::Active.has_code());
        assert!(VoucherStatus::Redeemed.has_code());
        assert!(VoucherStatus::Expired.has_code());

        assert!(!VoucherStatus::Pending.has_code());
        assert!(!VoucherStatus::Failed.has_code());
        assert!(!VoucherStatus::Canceled.has_code());
    }

    #[test]
    fn parse_round_trips() {
        for status in [
            VoucherStatus::Pending,
            VoucherStatus::Active,
            VoucherStatus::Redeemed,
            VoucherStatus::Expired,
            VoucherStatus::Failed,
            VoucherStatus::Canceled,
        ] {
            assert_eq!(VoucherStatus::parse(status.as_str()).unwrap(), status);
        }
        assert!(VoucherStatus::parse("bogus").is_err());
    }
}
