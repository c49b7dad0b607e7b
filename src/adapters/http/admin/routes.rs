//! Axum router for admin authentication.

use axum::routing::post;
use axum::Router;

use crate::adapters::http::middleware::AdminAuthState;

use super::handlers::admin_login;

/// Create the admin auth router, mounted at `/api/admin`.
///
/// # Routes
/// - `POST /login` - Exchange the admin password for a bearer token
pub fn admin_routes() -> Router<AdminAuthState> {
    Router::new().route("/login", post(admin_login))
}
