//! Resend email notifier.
//!
//! Delivers the issued gift card to the buyer through the Resend HTTP API.

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use serde::Serialize;
use std::time::Duration;

use crate::domain::voucher::Voucher;
use crate::ports::{NotifyError, VoucherNotifier};

/// Configuration for the Resend notifier.
#[derive(Clone)]
pub struct ResendConfig {
    /// API key for authentication (re_...).
    api_key: Secret<String>,
    /// Sender address, must belong to a verified domain.
    pub from_address: String,
    /// Base URL for the API (default: https://api.resend.com).
    pub base_url: String,
    /// Request timeout.
    pub timeout: Duration,
}

impl ResendConfig {
    pub fn new(api_key: impl Into<String>, from_address: impl Into<String>) -> Self {
        Self {
            api_key: Secret::new(api_key.into()),
            from_address: from_address.into(),
            base_url: "https://api.resend.com".to_string(),
            timeout: Duration::from_secs(15),
        }
    }

    /// Sets the base URL (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }
}

/// Sends gift card issuance emails through Resend.
pub struct ResendNotifier {
    config: ResendConfig,
    client: Client,
}

#[derive(Serialize)]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: String,
    html: String,
}

impl ResendNotifier {
    pub fn new(config: ResendConfig) -> Self {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self { config, client }
    }

    fn render_body(voucher: &Voucher) -> String {
        let code = voucher.code.as_deref().unwrap_or_default();
        let expires = voucher
            .expires_at
            .map(|t| t.as_datetime().format("%d/%m/%Y").to_string())
            .unwrap_or_default();
        let mut body = format!(
            "<h1>Your gift card</h1>\
             <p>Hello {},</p>\
             <p>Here is the gift card for {}.</p>\
             <p>Code: <strong>{}</strong></p>\
             <p>Value: {} EUR</p>\
             <p>Valid until {}.</p>",
            voucher.buyer.first_name,
            voucher.addressee(),
            code,
            voucher.amount,
            expires,
        );
        if let Some(message) = voucher
            .personal_message
            .as_deref()
            .filter(|m| !m.trim().is_empty())
        {
            body.push_str(&format!("<p><em>{}</em></p>", message));
        }
        body
    }
}

#[async_trait]
impl VoucherNotifier for ResendNotifier {
    async fn send_issued(&self, voucher: &Voucher) -> Result<(), NotifyError> {
        let url = format!("{}/emails", self.config.base_url);
        let request = SendEmailRequest {
            from: &self.config.from_address,
            to: [voucher.buyer.email.as_str()],
            subject: format!("Your {} EUR gift card", voucher.amount),
            html: Self::render_body(voucher),
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(self.config.api_key.expose_secret())
            .json(&request)
            .send()
            .await
            .map_err(|e| NotifyError(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, error = %error_text, "Resend send failed");
            return Err(NotifyError(format!(
                "Resend API error ({}): {}",
                status, error_text
            )));
        }

        Ok(())
    }
}
