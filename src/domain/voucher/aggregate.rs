//! The Voucher aggregate: a prepaid gift card.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{Money, Timestamp, ValidationError, VoucherId};

use super::VoucherStatus;

/// How long an activated voucher stays valid (two years).
pub const VALIDITY_DAYS: i64 = 730;

/// Contact details of the buyer, collected at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuyerInfo {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
}

impl BuyerInfo {
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        email: impl Into<String>,
        phone: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let info = Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            email: email.into(),
            phone: phone.into(),
        };
        if info.first_name.trim().is_empty() {
            return Err(ValidationError::empty_field("buyer_firstname"));
        }
        if info.last_name.trim().is_empty() {
            return Err(ValidationError::empty_field("buyer_lastname"));
        }
        if !info.email.contains('@') {
            return Err(ValidationError::invalid_format("buyer_email", "missing @"));
        }
        Ok(info)
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// A prepaid gift card.
///
/// `amount` is the amount actually charged (post-discount); `original_amount`
/// is what the buyer asked for. `code` is assigned only at activation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Voucher {
    pub id: VoucherId,
    pub code: Option<String>,
    pub amount: Money,
    pub original_amount: Money,
    pub status: VoucherStatus,
    pub buyer: BuyerInfo,
    pub recipient_name: Option<String>,
    pub personal_message: Option<String>,
    pub session_id: Option<String>,
    pub created_at: Timestamp,
    pub expires_at: Option<Timestamp>,
    pub redeemed_at: Option<Timestamp>,
}

impl Voucher {
    /// Opens a pending voucher at checkout time. No code is assigned yet.
    pub fn open_pending(
        buyer: BuyerInfo,
        amount: Money,
        original_amount: Money,
        recipient_name: Option<String>,
        personal_message: Option<String>,
    ) -> Self {
        Self {
            id: VoucherId::new(),
            code: None,
            amount,
            original_amount,
            status: VoucherStatus::Pending,
            buyer,
            recipient_name,
            personal_message,
            session_id: None,
            created_at: Timestamp::now(),
            expires_at: None,
            redeemed_at: None,
        }
    }

    /// The expiry horizon computed at activation time.
    pub fn expiry_from(activated_at: Timestamp) -> Timestamp {
        activated_at.add_days(VALIDITY_DAYS)
    }

    /// Whether a stored `active` voucher has outlived its expiry.
    pub fn is_past_expiry(&self) -> bool {
        matches!(
            (self.status, self.expires_at),
            (VoucherStatus::Active, Some(expires)) if expires.is_past()
        )
    }

    /// Name the voucher is addressed to: the recipient, or the buyer.
    pub fn addressee(&self) -> String {
        self.recipient_name
            .clone()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| self.buyer.full_name())
    }

    /// Code presence matches the lifecycle state.
    pub fn code_invariant_holds(&self) -> bool {
        self.code.is_some() == self.status.has_code()
    }
}
