//! Admin console configuration

use serde::Deserialize;

use super::error::ValidationError;

/// Admin configuration: the shared bearer secret protecting admin routes.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdminConfig {
    /// Admin secret presented as a bearer token
    pub secret: String,
}

impl AdminConfig {
    /// Validate admin configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.secret.is_empty() {
            return Err(ValidationError::MissingRequired("ADMIN_SECRET"));
        }
        if self.secret.len() < 8 {
            return Err(ValidationError::AdminSecretTooShort);
        }
        Ok(())
    }
}
