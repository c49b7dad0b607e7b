//! HTTP DTOs for gift card endpoints.
//!
//! Monetary amounts cross the wire as EUR floats (`amountEur`), matching
//! the storefront; internally everything is integer cents.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::Timestamp;
use crate::domain::voucher::Voucher;

// ════════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Request to open a gift card checkout.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateCheckoutRequest {
    /// Gift card amount in EUR.
    pub amount: f64,
    pub buyer_firstname: String,
    pub buyer_lastname: String,
    pub buyer_email: String,
    pub buyer_phone: String,
    #[serde(default)]
    pub recipient_name: Option<String>,
    #[serde(default)]
    pub personal_message: Option<String>,
    /// Single-use token from a prior coupon validation.
    #[serde(default)]
    pub coupon_token: Option<String>,
}

/// Request to search gift cards by code or by recipient/buyer name.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchGiftCardsRequest {
    pub query: String,
    #[serde(default = "default_search_type")]
    pub search_type: String,
}

fn default_search_type() -> String {
    "code".to_string()
}

/// Request to push a gift card's expiry out (admin).
#[derive(Debug, Clone, Deserialize)]
pub struct ExtendExpiryRequest {
    pub new_expiry_date: String,
}

/// Request to correct the recipient name (admin).
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateRecipientRequest {
    pub recipient_name: String,
}

/// Request to force a lifecycle status (admin).
#[derive(Debug, Clone, Deserialize)]
pub struct ForceStatusRequest {
    pub status: String,
}

// ════════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Checkout session handoff.
#[derive(Debug, Clone, Serialize)]
pub struct CreateCheckoutResponse {
    /// Hosted checkout URL to redirect the buyer to.
    pub url: String,
    pub session_id: String,
}

/// Full gift card view.
#[derive(Debug, Clone, Serialize)]
pub struct GiftCardResponse {
    pub id: String,
    pub code: Option<String>,
    #[serde(rename = "amountEur")]
    pub amount_eur: f64,
    #[serde(rename = "originalAmountEur")]
    pub original_amount_eur: f64,
    pub status: String,
    #[serde(rename = "createdAt")]
    pub created_at: String,
    #[serde(rename = "expiresAt")]
    pub expires_at: Option<String>,
    #[serde(rename = "redeemedAt")]
    pub redeemed_at: Option<String>,
    #[serde(rename = "stripeSessionId")]
    pub session_id: Option<String>,
    pub buyer_firstname: String,
    pub buyer_lastname: String,
    pub buyer_email: String,
    pub buyer_phone: String,
    pub recipient_name: Option<String>,
    pub personal_message: Option<String>,
}

fn rfc3339(ts: &Timestamp) -> String {
    ts.as_datetime().to_rfc3339()
}

impl From<Voucher> for GiftCardResponse {
    fn from(voucher: Voucher) -> Self {
        Self {
            id: voucher.id.to_string(),
            code: voucher.code,
            amount_eur: voucher.amount.as_eur(),
            original_amount_eur: voucher.original_amount.as_eur(),
            status: voucher.status.as_str().to_string(),
            created_at: rfc3339(&voucher.created_at),
            expires_at: voucher.expires_at.as_ref().map(rfc3339),
            redeemed_at: voucher.redeemed_at.as_ref().map(rfc3339),
            session_id: voucher.session_id,
            buyer_firstname: voucher.buyer.first_name,
            buyer_lastname: voucher.buyer.last_name,
            buyer_email: voucher.buyer.email,
            buyer_phone: voucher.buyer.phone,
            recipient_name: voucher.recipient_name,
            personal_message: voucher.personal_message,
        }
    }
}

/// Payment status snapshot for the polling storefront.
#[derive(Debug, Clone, Serialize)]
pub struct CheckoutStatusResponse {
    pub payment_status: String,
    pub status: String,
    pub gift_card: GiftCardResponse,
}

/// Public verification result. Unknown codes come back as `found: false`
/// with HTTP 200 so the storefront can render its own message.
#[derive(Debug, Clone, Serialize)]
pub struct VerifyGiftCardResponse {
    pub found: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(rename = "amountEur", skip_serializing_if = "Option::is_none")]
    pub amount_eur: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(rename = "expiresAt", skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<String>,
}

impl VerifyGiftCardResponse {
    pub fn not_found() -> Self {
        Self {
            found: false,
            code: None,
            amount_eur: None,
            status: None,
            expires_at: None,
        }
    }

    pub fn found(voucher: Voucher) -> Self {
        Self {
            found: true,
            code: voucher.code.clone(),
            amount_eur: Some(voucher.amount.as_eur()),
            status: Some(voucher.status.as_str().to_string()),
            expires_at: voucher.expires_at.as_ref().map(rfc3339),
        }
    }
}

/// A single search hit: the card fields the counter terminal displays,
/// without the buyer's contact details.
#[derive(Debug, Clone, Serialize)]
pub struct GiftCardSearchResult {
    pub id: String,
    pub code: Option<String>,
    #[serde(rename = "amountEur")]
    pub amount_eur: f64,
    pub status: String,
    pub buyer_firstname: String,
    pub buyer_lastname: String,
    pub recipient_name: String,
    #[serde(rename = "expiresAt")]
    pub expires_at: Option<String>,
    #[serde(rename = "createdAt")]
    pub created_at: String,
}

impl From<Voucher> for GiftCardSearchResult {
    fn from(voucher: Voucher) -> Self {
        Self {
            id: voucher.id.to_string(),
            code: voucher.code,
            amount_eur: voucher.amount.as_eur(),
            status: voucher.status.as_str().to_string(),
            buyer_firstname: voucher.buyer.first_name,
            buyer_lastname: voucher.buyer.last_name,
            recipient_name: voucher.recipient_name.unwrap_or_default(),
            expires_at: voucher.expires_at.as_ref().map(rfc3339),
            created_at: rfc3339(&voucher.created_at),
        }
    }
}

/// Search envelope. Empty result sets and unknown search types come back
/// as `found: false` with HTTP 200.
#[derive(Debug, Clone, Serialize)]
pub struct SearchGiftCardsResponse {
    pub found: bool,
    pub results: Vec<GiftCardSearchResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SearchGiftCardsResponse {
    pub fn hits(vouchers: Vec<Voucher>) -> Self {
        Self {
            found: !vouchers.is_empty(),
            results: vouchers.into_iter().map(GiftCardSearchResult::from).collect(),
            error: None,
        }
    }

    pub fn invalid_type() -> Self {
        Self {
            found: false,
            results: Vec::new(),
            error: Some("Invalid search type".to_string()),
        }
    }
}

/// Expiry extension acknowledgement.
#[derive(Debug, Clone, Serialize)]
pub struct ExtendExpiryResponse {
    pub success: bool,
    pub new_expiry_date: String,
}

/// Recipient update acknowledgement.
#[derive(Debug, Clone, Serialize)]
pub struct UpdateRecipientResponse {
    pub success: bool,
    pub recipient_name: String,
}

/// Generic acknowledgement.
#[derive(Debug, Clone, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}
