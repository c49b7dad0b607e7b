//! Payment gateway port for the external hosted checkout.
//!
//! Defines the contract for payment processor integrations (e.g. Stripe).
//! The gateway is an opaque external service reached through a
//! request/response API plus an asynchronous webhook channel; callers retry
//! transient failures themselves, the gateway adapter never blocks
//! unboundedly.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::foundation::{DomainError, ErrorCode, Money, VoucherId};
use crate::domain::payment::PaymentStatus;

/// Port for the hosted-checkout payment gateway.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Opens a hosted checkout session for the discounted amount.
    ///
    /// The voucher id and both amounts travel as opaque metadata for later
    /// reconciliation.
    async fn create_checkout_session(
        &self,
        request: CreateSessionRequest,
    ) -> Result<GatewaySession, GatewayError>;

    /// Queries the authoritative session status.
    async fn fetch_session(&self, session_id: &str) -> Result<SessionStatus, GatewayError>;

    /// Verifies a webhook signature and parses the event.
    fn verify_webhook(
        &self,
        payload: &[u8],
        signature: &str,
    ) -> Result<GatewayWebhookEvent, GatewayError>;
}

/// Request to open a hosted checkout session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSessionRequest {
    pub voucher_id: VoucherId,

    /// Amount to charge (post-discount).
    pub amount: Money,

    /// Amount originally requested (pre-discount), for reconciliation.
    pub original_amount: Money,

    /// Coupon code applied, if any (metadata only).
    pub coupon_code: Option<String>,

    /// URL to redirect to after successful payment.
    pub success_url: String,

    /// URL to redirect to after abandoned checkout.
    pub cancel_url: String,
}

/// An open hosted checkout session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewaySession {
    /// Gateway's session id.
    pub id: String,

    /// URL the buyer is redirected to.
    pub url: String,
}

/// Authoritative session status as reported by the gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStatus {
    pub payment_status: PaymentStatus,

    /// Gateway's own session state ("open", "complete", "expired", ...).
    pub status: String,
}

/// Webhook event types we act on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayEventType {
    /// Hosted checkout completed; payment captured.
    CheckoutSessionCompleted,

    /// Anything else; acknowledged and ignored.
    Unknown(String),
}

/// A verified webhook event.
#[derive(Debug, Clone)]
pub struct GatewayWebhookEvent {
    /// Event id from the gateway.
    pub id: String,

    pub event_type: GatewayEventType,

    /// Session the event refers to, when the event carries one.
    pub session_id: Option<String>,

    /// When the event occurred (Unix timestamp).
    pub created_at: i64,
}

/// Errors from gateway operations.
#[derive(Debug, Clone)]
pub struct GatewayError {
    pub code: GatewayErrorCode,
    pub message: String,
    pub retryable: bool,
}

/// Gateway error categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayErrorCode {
    /// Network connectivity issue; safe to retry.
    NetworkError,

    /// Gateway returned an API error.
    ProviderError,

    /// Session id unknown to the gateway.
    NotFound,

    /// Webhook signature verification failed.
    InvalidSignature,

    /// Webhook payload could not be parsed.
    InvalidPayload,
}

impl GatewayError {
    pub fn new(code: GatewayErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            retryable: matches!(code, GatewayErrorCode::NetworkError),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(GatewayErrorCode::NetworkError, message)
    }

    pub fn provider(message: impl Into<String>) -> Self {
        Self::new(GatewayErrorCode::ProviderError, message)
    }

    pub fn not_found(session_id: &str) -> Self {
        Self::new(
            GatewayErrorCode::NotFound,
            format!("Session {} not found", session_id),
        )
    }

    pub fn invalid_signature(message: impl Into<String>) -> Self {
        Self::new(GatewayErrorCode::InvalidSignature, message)
    }

    pub fn invalid_payload(message: impl Into<String>) -> Self {
        Self::new(GatewayErrorCode::InvalidPayload, message)
    }
}

impl std::fmt::Display for GatewayError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.code, self.message)
    }
}

impl std::error::Error for GatewayError {}

impl From<GatewayError> for DomainError {
    fn from(err: GatewayError) -> Self {
        let code = match err.code {
            GatewayErrorCode::NotFound => ErrorCode::TransactionNotFound,
            GatewayErrorCode::InvalidSignature | GatewayErrorCode::InvalidPayload => {
                ErrorCode::ValidationFailed
            }
            _ => ErrorCode::UpstreamUnavailable,
        };
        DomainError::new(code, err.message)
    }
}
