//! Axum router for coupon endpoints.

use axum::middleware;
use axum::routing::{post, put};
use axum::Router;

use crate::adapters::http::middleware::{require_admin, AdminAuthState};
use crate::adapters::http::AppState;

use super::handlers::{
    cancel_coupon, create_coupon, delete_coupon, list_coupons, update_coupon, validate_coupon,
};

/// Create the coupon API router, mounted at `/api/coupons`.
///
/// # Routes
///
/// ## Public
/// - `POST /validate` - Validate a code, mint a single-use token
/// - `POST /cancel/{token}` - Cancel a pending reservation
///
/// ## Admin (bearer secret)
/// - `POST /` - Create a coupon
/// - `GET /` - List all coupons
/// - `PUT /{id}` - Update a coupon
/// - `DELETE /{id}` - Delete a coupon
pub fn coupon_routes(auth: AdminAuthState) -> Router<AppState> {
    let admin = Router::new()
        .route("/", post(create_coupon).get(list_coupons))
        .route("/:id", put(update_coupon).delete(delete_coupon))
        .layer(middleware::from_fn_with_state(auth, require_admin));

    Router::new()
        .route("/validate", post(validate_coupon))
        .route("/cancel/:token", post(cancel_coupon))
        .merge(admin)
}
