//! Application configuration module
//!
//! Type-safe configuration loading from environment variables using the
//! `config` and `dotenvy` crates. Configuration is loaded with the
//! `GIFT_CARD` prefix and nested values use double underscores as
//! separators.
//!
//! # Example
//!
//! ```no_run
//! use gift_card_service::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//! ```

mod admin;
mod database;
mod email;
mod error;
mod payment;
mod server;

pub use admin::AdminConfig;
pub use database::DatabaseConfig;
pub use email::EmailConfig;
pub use error::{ConfigError, ValidationError};
pub use payment::PaymentConfig;
pub use server::ServerConfig;

use serde::Deserialize;

/// Root application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration (host, port, log filter)
    #[serde(default)]
    pub server: ServerConfig,

    /// Database configuration (PostgreSQL connection)
    pub database: DatabaseConfig,

    /// Payment configuration (Stripe keys, checkout redirect URLs)
    pub payment: PaymentConfig,

    /// Email configuration (Resend)
    #[serde(default)]
    pub email: EmailConfig,

    /// Admin console configuration (bearer secret)
    pub admin: AdminConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// Reads a `.env` file if present, then environment variables with the
    /// `GIFT_CARD` prefix and `__` as the section separator:
    ///
    /// - `GIFT_CARD__SERVER__PORT=8080` -> `server.port = 8080`
    /// - `GIFT_CARD__DATABASE__URL=...` -> `database.url = ...`
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("GIFT_CARD")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.database.validate()?;
        self.payment.validate()?;
        self.email.validate()?;
        self.admin.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> AppConfig {
        AppConfig {
            server: ServerConfig::default(),
            database: DatabaseConfig {
                url: "postgresql://localhost/giftcards".to_string(),
                ..Default::default()
            },
            payment: PaymentConfig {
                stripe_api_key: "sk_test_xxx".to_string(),
                stripe_webhook_secret: "whsec_xxx".to_string(),
                success_url: "https://example.com/merci".to_string(),
                cancel_url: "https://example.com/cartes-cadeaux".to_string(),
                ..Default::default()
            },
            email: EmailConfig::default(),
            admin: AdminConfig {
                secret: "correct-horse-battery".to_string(),
            },
        }
    }

    #[test]
    fn full_config_validates() {
        assert!(valid().validate().is_ok());
    }

    #[test]
    fn validation_checks_every_section() {
        let mut config = valid();
        config.admin.secret = String::new();
        assert!(config.validate().is_err());

        let mut config = valid();
        config.payment.stripe_api_key = String::new();
        assert!(config.validate().is_err());
    }
}
