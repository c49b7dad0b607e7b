//! Admin authorization middleware.
//!
//! Admin routes are protected by a single shared secret presented as a
//! bearer token. The comparison is constant-time so the secret cannot be
//! probed byte by byte through response timing.

use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use secrecy::{ExposeSecret, SecretString};
use subtle::ConstantTimeEq;

use super::super::error::ErrorResponse;

/// Shared state for the admin auth layer.
#[derive(Clone)]
pub struct AdminAuthState {
    secret: SecretString,
}

impl AdminAuthState {
    pub fn new(secret: SecretString) -> Self {
        Self { secret }
    }

    /// Constant-time comparison of a presented token against the secret.
    pub fn token_matches(&self, presented: &str) -> bool {
        let expected = self.secret.expose_secret().as_bytes();
        presented.as_bytes().ct_eq(expected).into()
    }
}

/// Rejects requests that do not carry the admin secret.
///
/// Accepts `Authorization: Bearer <secret>` as well as the bare secret in
/// the Authorization header, which is what the legacy admin console sends.
pub async fn require_admin(
    State(auth): State<AdminAuthState>,
    request: Request,
    next: Next,
) -> Response {
    let presented = request
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .map(|h| h.strip_prefix("Bearer ").unwrap_or(h));

    match presented {
        Some(token) if auth.token_matches(token) => next.run(request).await,
        _ => {
            let body = ErrorResponse::new("UNAUTHORIZED", "Unauthorized");
            (StatusCode::UNAUTHORIZED, Json(body)).into_response()
        }
    }
}
