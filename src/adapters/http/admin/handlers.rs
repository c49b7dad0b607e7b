//! HTTP handlers for admin authentication.

use axum::extract::{Json, State};
use axum::response::IntoResponse;

use crate::adapters::http::error::ApiError;
use crate::adapters::http::middleware::AdminAuthState;
use crate::domain::foundation::{DomainError, ErrorCode};

use super::dto::{AdminLoginRequest, AdminLoginResponse};

/// POST /api/admin/login - Exchange the admin password for a bearer token.
///
/// The token is the secret itself; the endpoint exists so the console can
/// verify credentials once instead of discovering a bad password on the
/// first protected call.
pub async fn admin_login(
    State(auth): State<AdminAuthState>,
    Json(request): Json<AdminLoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if !auth.token_matches(&request.password) {
        return Err(DomainError::new(ErrorCode::Unauthorized, "Invalid password").into());
    }

    Ok(Json(AdminLoginResponse {
        success: true,
        token: Some(request.password),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use secrecy::SecretString;

    fn auth() -> AdminAuthState {
        AdminAuthState::new(SecretString::new("s3cret".to_string()))
    }

    #[tokio::test]
    async fn correct_password_returns_token() {
        let result = admin_login(
            State(auth()),
            Json(AdminLoginRequest {
                password: "s3cret".to_string(),
            }),
        )
        .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn wrong_password_returns_401() {
        let err = admin_login(
            State(auth()),
            Json(AdminLoginRequest {
                password: "nope".to_string(),
            }),
        )
        .await
        .err()
        .unwrap();
        assert_eq!(err.into_response().status(), StatusCode::UNAUTHORIZED);
    }
}
