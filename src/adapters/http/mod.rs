//! HTTP adapters - REST API implementations.
//!
//! Each feature has its own router; `api_router` assembles them under
//! `/api` with tracing and CORS layers.

use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::application::checkout::{ConfirmCheckout, OpenCheckout, ProcessWebhook};
use crate::application::coupon_admin::CouponAdmin;
use crate::application::ledger::DiscountLedger;
use crate::application::voucher::{
    ActivateVoucher, RedeemVoucher, SearchVouchers, VerifyVoucher, VoucherAdmin,
};

pub mod admin;
pub mod coupons;
pub mod error;
pub mod gift_cards;
pub mod middleware;

pub use admin::admin_routes;
pub use coupons::coupon_routes;
pub use error::{ApiError, ErrorResponse};
pub use gift_cards::{gift_card_routes, webhook_routes};
pub use middleware::AdminAuthState;

/// Shared application state containing all dependencies.
///
/// Cloned per request; everything inside is Arc-wrapped.
#[derive(Clone)]
pub struct AppState {
    pub open_checkout: Arc<OpenCheckout>,
    pub confirm_checkout: Arc<ConfirmCheckout>,
    pub process_webhook: Arc<ProcessWebhook>,
    pub verify_voucher: Arc<VerifyVoucher>,
    pub search_vouchers: Arc<SearchVouchers>,
    pub redeem_voucher: Arc<RedeemVoucher>,
    pub activate_voucher: Arc<ActivateVoucher>,
    pub voucher_admin: Arc<VoucherAdmin>,
    pub coupon_admin: Arc<CouponAdmin>,
    pub ledger: Arc<DiscountLedger>,
}

/// Build the full `/api` router.
pub fn api_router(state: AppState, auth: AdminAuthState) -> Router {
    let api = Router::new()
        .route("/", get(health))
        .nest("/gift-cards", gift_card_routes(auth.clone()))
        .nest("/webhooks", webhook_routes())
        .nest("/coupons", coupon_routes(auth.clone()))
        .with_state(state)
        .nest("/admin", admin_routes().with_state(auth));

    Router::new()
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

async fn health() -> &'static str {
    "ok"
}
