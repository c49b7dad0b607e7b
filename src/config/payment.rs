//! Payment configuration

use serde::Deserialize;

use super::error::ValidationError;

/// Payment configuration (Stripe)
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentConfig {
    /// Stripe API key
    #[serde(default)]
    pub stripe_api_key: String,

    /// Stripe webhook signing secret
    #[serde(default)]
    pub stripe_webhook_secret: String,

    /// URL the buyer lands on after a successful payment
    #[serde(default)]
    pub success_url: String,

    /// URL the buyer lands on after abandoning checkout
    #[serde(default)]
    pub cancel_url: String,

    /// Smallest purchasable gift card amount, in cents
    #[serde(default = "default_min_amount_cents")]
    pub min_amount_cents: i64,

    /// Largest purchasable gift card amount, in cents
    #[serde(default = "default_max_amount_cents")]
    pub max_amount_cents: i64,
}

impl PaymentConfig {
    /// Check if using Stripe test mode
    pub fn is_test_mode(&self) -> bool {
        self.stripe_api_key.starts_with("sk_test_")
    }

    /// Validate payment configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.stripe_api_key.is_empty() {
            return Err(ValidationError::MissingRequired("STRIPE_API_KEY"));
        }
        if !self.stripe_api_key.starts_with("sk_") {
            return Err(ValidationError::InvalidStripeKey);
        }
        if self.stripe_webhook_secret.is_empty() {
            return Err(ValidationError::MissingRequired("STRIPE_WEBHOOK_SECRET"));
        }
        if !self.stripe_webhook_secret.starts_with("whsec_") {
            return Err(ValidationError::InvalidStripeWebhookSecret);
        }
        for url in [&self.success_url, &self.cancel_url] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(ValidationError::InvalidCheckoutUrl);
            }
        }
        if self.min_amount_cents <= 0 || self.max_amount_cents < self.min_amount_cents {
            return Err(ValidationError::InvalidAmountBounds);
        }
        Ok(())
    }
}

impl Default for PaymentConfig {
    fn default() -> Self {
        Self {
            stripe_api_key: String::new(),
            stripe_webhook_secret: String::new(),
            success_url: String::new(),
            cancel_url: String::new(),
            min_amount_cents: default_min_amount_cents(),
            max_amount_cents: default_max_amount_cents(),
        }
    }
}

fn default_min_amount_cents() -> i64 {
    1_000
}

fn default_max_amount_cents() -> i64 {
    50_000
}
