//! Payment transaction records mirroring the gateway's checkout session.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::coupon::DiscountSnapshot;
use crate::domain::foundation::{DomainError, ErrorCode, Money, Timestamp, TransactionId, VoucherId};

/// Payment state of a checkout session as we track it locally.
///
/// The `Paid` transition triggers side effects at most once: the storage
/// layer flips it with a compare-and-set, and only the winning caller runs
/// finalize/activate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Unpaid,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Unpaid => "unpaid",
        }
    }

    pub fn parse(s: &str) -> Result<Self, DomainError> {
        match s {
            "pending" => Ok(PaymentStatus::Pending),
            "paid" => Ok(PaymentStatus::Paid),
            "unpaid" => Ok(PaymentStatus::Unpaid),
            other => Err(DomainError::new(
                ErrorCode::InvalidFormat,
                format!("Unknown payment status: {}", other),
            )),
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One row per checkout session, keyed by the gateway's session id.
///
/// Carries the discount snapshot and the reservation token so confirmation
/// can finalize the coupon usage without re-deriving the terms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentTransaction {
    pub id: TransactionId,
    pub session_id: String,
    pub voucher_id: VoucherId,
    pub amount: Money,
    pub original_amount: Money,
    pub discount: Option<DiscountSnapshot>,
    pub reservation_token: Option<String>,
    pub payment_status: PaymentStatus,
    /// Gateway-reported session status, mirrored verbatim ("open",
    /// "complete", "expired", ...).
    pub status: String,
    pub created_at: Timestamp,
}

impl PaymentTransaction {
    pub fn open(
        session_id: impl Into<String>,
        voucher_id: VoucherId,
        amount: Money,
        original_amount: Money,
        discount: Option<DiscountSnapshot>,
        reservation_token: Option<String>,
    ) -> Self {
        Self {
            id: TransactionId::new(),
            session_id: session_id.into(),
            voucher_id,
            amount,
            original_amount,
            discount,
            reservation_token,
            payment_status: PaymentStatus::Pending,
            status: "open".to_string(),
            created_at: Timestamp::now(),
        }
    }

    pub fn is_paid(&self) -> bool {
        self.payment_status == PaymentStatus::Paid
    }
}
