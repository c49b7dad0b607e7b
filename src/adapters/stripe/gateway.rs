//! Stripe payment gateway adapter.
//!
//! Talks to the Stripe hosted-checkout API and verifies incoming webhooks.
//!
//! # Security
//!
//! - HMAC-SHA256 signature verification with constant-time comparison
//! - Timestamp validation (5-minute window) for replay attack prevention
//! - Secrets handled via `secrecy::SecretString`

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::domain::payment::PaymentStatus;
use crate::ports::{
    CreateSessionRequest, GatewayError, GatewayEventType, GatewaySession, GatewayWebhookEvent,
    PaymentGateway, SessionStatus,
};

use super::webhook_types::{
    hex_encode, SignatureHeader, StripeCheckoutSession, StripeWebhookEvent,
};

type HmacSha256 = Hmac<Sha256>;

/// Maximum age for webhook events (5 minutes).
const MAX_TIMESTAMP_AGE_SECS: i64 = 300;

/// Clock skew tolerance for future timestamps (60 seconds).
const MAX_FUTURE_TOLERANCE_SECS: i64 = 60;

/// Stripe API configuration.
#[derive(Clone)]
pub struct StripeConfig {
    /// Stripe secret API key (sk_live_... or sk_test_...).
    api_key: SecretString,

    /// Webhook signing secret (whsec_...).
    webhook_secret: SecretString,

    /// Base URL for the Stripe API (default: https://api.stripe.com).
    api_base_url: String,
}

impl StripeConfig {
    pub fn new(api_key: impl Into<String>, webhook_secret: impl Into<String>) -> Self {
        Self {
            api_key: SecretString::new(api_key.into()),
            webhook_secret: SecretString::new(webhook_secret.into()),
            api_base_url: "https://api.stripe.com".to_string(),
        }
    }

    /// Set a custom API base URL (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }
}

/// Stripe implementation of the payment gateway port.
pub struct StripeGateway {
    config: StripeConfig,
    http_client: reqwest::Client,
}

impl StripeGateway {
    pub fn new(config: StripeConfig) -> Self {
        Self {
            config,
            http_client: reqwest::Client::new(),
        }
    }

    fn verify_signature(
        &self,
        payload: &[u8],
        header: &SignatureHeader,
    ) -> Result<(), GatewayError> {
        // 1. Validate timestamp (prevent replay attacks)
        let now = chrono::Utc::now().timestamp();
        let age = now - header.timestamp;

        if age > MAX_TIMESTAMP_AGE_SECS {
            tracing::warn!(
                event_timestamp = header.timestamp,
                age_secs = age,
                "Webhook event too old - possible replay attack"
            );
            return Err(GatewayError::invalid_signature(format!(
                "Event too old ({} seconds)",
                age
            )));
        }

        if age < -MAX_FUTURE_TOLERANCE_SECS {
            tracing::warn!(
                event_timestamp = header.timestamp,
                current_time = now,
                "Webhook event from future - clock skew or manipulation"
            );
            return Err(GatewayError::invalid_signature("Event timestamp in future"));
        }

        // 2. Compute expected signature over "timestamp.payload"
        let signed_payload = format!("{}.{}", header.timestamp, String::from_utf8_lossy(payload));

        let mut mac =
            HmacSha256::new_from_slice(self.config.webhook_secret.expose_secret().as_bytes())
                .expect("HMAC can take key of any size");
        mac.update(signed_payload.as_bytes());
        let expected = mac.finalize().into_bytes();

        // 3. Constant-time comparison
        let expected_bytes: &[u8] = expected.as_slice();
        let provided_bytes: &[u8] = &header.v1_signature;

        if expected_bytes.ct_eq(provided_bytes).unwrap_u8() != 1 {
            tracing::warn!(
                expected_signature = hex_encode(expected_bytes),
                "Invalid webhook signature"
            );
            return Err(GatewayError::invalid_signature("Invalid signature"));
        }

        Ok(())
    }
}

/// Maps a Stripe session's `payment_status`/`status` pair to our local view.
fn map_session_status(payment_status: &str, status: &str) -> PaymentStatus {
    match payment_status {
        "paid" | "no_payment_required" => PaymentStatus::Paid,
        _ if status == "expired" => PaymentStatus::Unpaid,
        _ => PaymentStatus::Pending,
    }
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    async fn create_checkout_session(
        &self,
        request: CreateSessionRequest,
    ) -> Result<GatewaySession, GatewayError> {
        let url = format!("{}/v1/checkout/sessions", self.config.api_base_url);

        let voucher_id = request.voucher_id.to_string();
        let mut params = vec![
            ("mode", "payment".to_string()),
            ("success_url", request.success_url.clone()),
            ("cancel_url", request.cancel_url.clone()),
            ("line_items[0][quantity]", "1".to_string()),
            ("line_items[0][price_data][currency]", "eur".to_string()),
            (
                "line_items[0][price_data][unit_amount]",
                request.amount.cents().to_string(),
            ),
            (
                "line_items[0][price_data][product_data][name]",
                format!("Gift card {} EUR", request.original_amount),
            ),
            ("metadata[voucher_id]", voucher_id),
            (
                "metadata[original_amount_cents]",
                request.original_amount.cents().to_string(),
            ),
        ];
        if let Some(coupon_code) = &request.coupon_code {
            params.push(("metadata[coupon_code]", coupon_code.clone()));
        }

        let response = self
            .http_client
            .post(&url)
            .basic_auth(self.config.api_key.expose_secret(), Option::<&str>::None)
            .form(&params)
            .send()
            .await
            .map_err(|e| GatewayError::network(e.to_string()))?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            tracing::error!(error = %error_text, "Stripe create_checkout_session failed");
            return Err(GatewayError::provider(format!(
                "Stripe API error: {}",
                error_text
            )));
        }

        let session: StripeCheckoutSession = response.json().await.map_err(|e| {
            GatewayError::provider(format!("Failed to parse Stripe response: {}", e))
        })?;

        let checkout_url = session.url.ok_or_else(|| {
            GatewayError::provider("Stripe session is missing a checkout URL")
        })?;

        Ok(GatewaySession {
            id: session.id,
            url: checkout_url,
        })
    }

    async fn fetch_session(&self, session_id: &str) -> Result<SessionStatus, GatewayError> {
        let url = format!(
            "{}/v1/checkout/sessions/{}",
            self.config.api_base_url, session_id
        );

        let response = self
            .http_client
            .get(&url)
            .basic_auth(self.config.api_key.expose_secret(), Option::<&str>::None)
            .send()
            .await
            .map_err(|e| GatewayError::network(e.to_string()))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(GatewayError::not_found(session_id));
        }

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(GatewayError::provider(format!(
                "Stripe API error: {}",
                error_text
            )));
        }

        let session: StripeCheckoutSession = response.json().await.map_err(|e| {
            GatewayError::provider(format!("Failed to parse Stripe response: {}", e))
        })?;

        Ok(SessionStatus {
            payment_status: map_session_status(&session.payment_status, &session.status),
            status: session.status,
        })
    }

    fn verify_webhook(
        &self,
        payload: &[u8],
        signature: &str,
    ) -> Result<GatewayWebhookEvent, GatewayError> {
        let header = SignatureHeader::parse(signature)
            .map_err(|e| GatewayError::invalid_signature(e.to_string()))?;
        self.verify_signature(payload, &header)?;

        let event: StripeWebhookEvent = serde_json::from_slice(payload).map_err(|e| {
            tracing::warn!(error = %e, "Failed to parse webhook payload");
            GatewayError::invalid_payload(format!("Invalid JSON: {}", e))
        })?;

        let event_type = match event.event_type.as_str() {
            "checkout.session.completed" => GatewayEventType::CheckoutSessionCompleted,
            other => GatewayEventType::Unknown(other.to_string()),
        };

        let session_id = event
            .data
            .object
            .get("id")
            .and_then(|v| v.as_str())
            .map(String::from);

        Ok(GatewayWebhookEvent {
            id: event.id,
            event_type,
            session_id,
            created_at: event.created,
        })
    }
}
