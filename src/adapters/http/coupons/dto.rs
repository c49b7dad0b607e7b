//! HTTP DTOs for coupon endpoints.
//!
//! The JSON field names mirror the admin console's wire format, which uses
//! camelCase for coupon fields.

use serde::{Deserialize, Deserializer, Serialize};

use crate::application::ledger::ValidationOutcome;
use crate::domain::coupon::Coupon;

// ════════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Request to validate a coupon code before checkout.
#[derive(Debug, Clone, Deserialize)]
pub struct ValidateCouponRequest {
    pub code: String,
}

/// Request to create a coupon (admin).
#[derive(Debug, Clone, Deserialize)]
pub struct CreateCouponRequest {
    pub code: String,
    /// "percentage" or "fixed".
    #[serde(rename = "type")]
    pub kind: String,
    pub value: f64,
    /// Expiry date, RFC 3339.
    #[serde(rename = "validTo")]
    pub valid_to: String,
    #[serde(rename = "isActive", default = "default_true")]
    pub is_active: bool,
    #[serde(rename = "maxUses", default)]
    pub max_uses: Option<i64>,
}

fn default_true() -> bool {
    true
}

/// Partial coupon update (admin). Absent fields keep their stored value;
/// `maxUses: null` removes the cap.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateCouponRequest {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub value: Option<f64>,
    #[serde(rename = "validTo", default)]
    pub valid_to: Option<String>,
    #[serde(rename = "isActive", default)]
    pub is_active: Option<bool>,
    #[serde(rename = "maxUses", default, deserialize_with = "double_option")]
    pub max_uses: Option<Option<i64>>,
}

/// Distinguishes an absent field from an explicit `null`.
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

// ════════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Validation result. Business rejections (unknown, inactive, expired,
/// exhausted) come back as `valid: false` with HTTP 200.
#[derive(Debug, Clone, Serialize)]
pub struct ValidateCouponResponse {
    pub valid: bool,
    pub token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(rename = "currentUses", skip_serializing_if = "Option::is_none")]
    pub current_uses: Option<i64>,
    #[serde(rename = "maxUses", skip_serializing_if = "Option::is_none")]
    pub max_uses: Option<i64>,
}

impl ValidateCouponResponse {
    pub fn valid(outcome: ValidationOutcome) -> Self {
        Self {
            valid: true,
            token: Some(outcome.token),
            error: None,
            kind: Some(outcome.discount.kind().to_string()),
            value: Some(outcome.discount.value()),
            currency: Some("EUR".to_string()),
            current_uses: Some(outcome.current_uses),
            max_uses: outcome.max_uses,
        }
    }

    pub fn rejected(reason: impl Into<String>) -> Self {
        Self {
            valid: false,
            token: None,
            error: Some(reason.into()),
            kind: None,
            value: None,
            currency: None,
            current_uses: None,
            max_uses: None,
        }
    }
}

/// Cancellation result; business rejections come back as `success: false`.
#[derive(Debug, Clone, Serialize)]
pub struct CancelCouponResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Full coupon view for the admin console.
#[derive(Debug, Clone, Serialize)]
pub struct CouponResponse {
    pub id: String,
    pub code: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub value: f64,
    pub currency: String,
    #[serde(rename = "validFrom")]
    pub valid_from: String,
    #[serde(rename = "validTo")]
    pub valid_to: String,
    #[serde(rename = "isActive")]
    pub is_active: bool,
    #[serde(rename = "maxUses")]
    pub max_uses: Option<i64>,
    #[serde(rename = "currentUses")]
    pub current_uses: i64,
    #[serde(rename = "createdAt")]
    pub created_at: String,
}

impl From<Coupon> for CouponResponse {
    fn from(coupon: Coupon) -> Self {
        Self {
            id: coupon.id.to_string(),
            code: coupon.code,
            kind: coupon.discount.kind().to_string(),
            value: coupon.discount.value(),
            currency: "EUR".to_string(),
            valid_from: coupon.valid_from.as_datetime().to_rfc3339(),
            valid_to: coupon.valid_to.as_datetime().to_rfc3339(),
            is_active: coupon.is_active,
            max_uses: coupon.max_uses,
            current_uses: coupon.current_uses,
            created_at: coupon.created_at.as_datetime().to_rfc3339(),
        }
    }
}

/// Generic acknowledgement.
#[derive(Debug, Clone, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}
