//! Axum routers for gift card endpoints.

use axum::middleware;
use axum::routing::{get, patch, post};
use axum::Router;

use crate::adapters::http::middleware::{require_admin, AdminAuthState};
use crate::adapters::http::AppState;

use super::handlers::{
    activate_gift_card, create_checkout, delete_gift_card, extend_expiry, force_status,
    get_gift_card, get_status, handle_stripe_webhook, list_gift_cards, redeem_gift_card,
    resend_email, search_gift_cards, update_recipient, verify_gift_card,
};

/// Create the gift card API router, mounted at `/api/gift-cards`.
///
/// # Routes
///
/// ## Public
/// - `POST /create-checkout` - Open a purchase, get the checkout URL
/// - `GET /status/{session_id}` - Poll payment status
/// - `GET /verify/{code}` - Verify a gift card code
/// - `POST /search` - Search by code or recipient/buyer name
///
/// ## Admin (bearer secret)
/// - `GET /list` - All gift cards, newest first
/// - `GET /{id}` - Single gift card
/// - `PATCH /{id}` - Force a lifecycle status
/// - `DELETE /{id}` - Delete a pending gift card
/// - `POST /{id}/activate` - Issue a code
/// - `POST /{id}/redeem` - Mark as spent
/// - `PATCH /{id}/extend-expiry` - Push the expiry out
/// - `PATCH /{id}/update-recipient` - Correct the recipient name
/// - `POST /{id}/resend-email` - Re-send the issuance email
pub fn gift_card_routes(auth: AdminAuthState) -> Router<AppState> {
    let admin = Router::new()
        .route("/list", get(list_gift_cards))
        .route(
            "/:id",
            get(get_gift_card).patch(force_status).delete(delete_gift_card),
        )
        .route("/:id/activate", post(activate_gift_card))
        .route("/:id/redeem", post(redeem_gift_card))
        .route("/:id/extend-expiry", patch(extend_expiry))
        .route("/:id/update-recipient", patch(update_recipient))
        .route("/:id/resend-email", post(resend_email))
        .layer(middleware::from_fn_with_state(auth, require_admin));

    Router::new()
        .route("/create-checkout", post(create_checkout))
        .route("/status/:session_id", get(get_status))
        .route("/verify/:code", get(verify_gift_card))
        .route("/search", post(search_gift_cards))
        .merge(admin)
}

/// Create the webhook router, mounted at `/api/webhooks`.
///
/// Separate from the gift card routes because webhooks carry no user
/// authentication; the payload signature is verified instead.
///
/// # Routes
/// - `POST /stripe` - Gateway webhook receiver
pub fn webhook_routes() -> Router<AppState> {
    Router::new().route("/stripe", post(handle_stripe_webhook))
}
