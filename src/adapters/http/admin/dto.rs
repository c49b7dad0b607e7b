//! HTTP DTOs for admin authentication.

use serde::{Deserialize, Serialize};

/// Admin console login request.
#[derive(Debug, Clone, Deserialize)]
pub struct AdminLoginRequest {
    pub password: String,
}

/// Login response; `token` is presented as the bearer secret on admin calls.
#[derive(Debug, Clone, Serialize)]
pub struct AdminLoginResponse {
    pub success: bool,
    pub token: Option<String>,
}
