//! Coupon reservations: the single-use claim on a coupon's discount.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::{DomainError, ErrorCode, ReservationId, Timestamp, VoucherId};

/// State of a coupon reservation.
///
/// Legal transitions, each performed as a compare-and-set against the
/// current state:
///
/// - `Pending -> AppliedPending` (token presented at checkout)
/// - `AppliedPending -> Pending` (checkout session creation failed; released)
/// - `Pending -> Canceled` (client abandoned before checkout)
/// - `Pending | AppliedPending -> Applied` (payment confirmed)
///
/// `Applied` and `Canceled` are terminal. A reservation never re-enters
/// `Pending` from `Applied`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReservationStatus {
    Pending,
    AppliedPending,
    Applied,
    Canceled,
}

impl ReservationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReservationStatus::Pending => "pending",
            ReservationStatus::AppliedPending => "applied-pending",
            ReservationStatus::Applied => "applied",
            ReservationStatus::Canceled => "canceled",
        }
    }

    pub fn parse(s: &str) -> Result<Self, DomainError> {
        match s {
            "pending" => Ok(ReservationStatus::Pending),
            "applied-pending" => Ok(ReservationStatus::AppliedPending),
            "applied" => Ok(ReservationStatus::Applied),
            "canceled" => Ok(ReservationStatus::Canceled),
            other => Err(DomainError::new(
                ErrorCode::InvalidFormat,
                format!("Unknown reservation status: {}", other),
            )),
        }
    }

    /// Whether moving from `self` to `to` is a legal lifecycle transition.
    pub fn can_transition_to(&self, to: ReservationStatus) -> bool {
        use ReservationStatus::*;
        matches!(
            (self, to),
            (Pending, AppliedPending)
                | (Pending, Canceled)
                | (Pending, Applied)
                | (AppliedPending, Pending)
                | (AppliedPending, Applied)
        )
    }
}

impl fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single-use claim on a coupon, created per validation call and identified
/// by a cryptographically random validation token.
///
/// Reservations are never deleted; terminal records remain as an audit trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CouponReservation {
    pub id: ReservationId,
    pub coupon_code: String,
    pub validation_token: String,
    pub status: ReservationStatus,
    pub session_id: Option<String>,
    pub voucher_id: Option<VoucherId>,
    pub created_at: Timestamp,
    pub applied_at: Option<Timestamp>,
}

impl CouponReservation {
    /// Opens a pending reservation for a freshly minted token.
    pub fn open(coupon_code: impl Into<String>, validation_token: impl Into<String>) -> Self {
        Self {
            id: ReservationId::new(),
            coupon_code: coupon_code.into(),
            validation_token: validation_token.into(),
            status: ReservationStatus::Pending,
            session_id: None,
            voucher_id: None,
            created_at: Timestamp::now(),
            applied_at: None,
        }
    }
}
