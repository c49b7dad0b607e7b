//! Service entrypoint: configuration, database pool, adapter wiring, axum
//! server.

use std::sync::Arc;

use secrecy::SecretString;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::EnvFilter;

use gift_card_service::adapters::email::{NoopNotifier, ResendConfig, ResendNotifier};
use gift_card_service::adapters::http::{api_router, AdminAuthState, AppState};
use gift_card_service::adapters::postgres::{
    PostgresCouponRepository, PostgresReservationRepository, PostgresTransactionRepository,
    PostgresVoucherRepository,
};
use gift_card_service::adapters::stripe::{StripeConfig, StripeGateway};
use gift_card_service::application::checkout::{
    AmountBounds, CheckoutUrls, ConfirmCheckout, OpenCheckout, ProcessWebhook,
};
use gift_card_service::application::coupon_admin::CouponAdmin;
use gift_card_service::application::ledger::DiscountLedger;
use gift_card_service::application::voucher::{
    ActivateVoucher, RedeemVoucher, SearchVouchers, VerifyVoucher, VoucherAdmin,
};
use gift_card_service::config::AppConfig;
use gift_card_service::domain::foundation::Money;
use gift_card_service::ports::VoucherNotifier;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.server.log_level.clone())),
        )
        .init();

    config.validate()?;

    let pool = PgPoolOptions::new()
        .min_connections(config.database.min_connections)
        .max_connections(config.database.max_connections)
        .acquire_timeout(config.database.acquire_timeout())
        .connect(&config.database.url)
        .await?;

    if config.database.run_migrations {
        tracing::info!("Running database migrations");
        sqlx::migrate!("./migrations").run(&pool).await?;
    }

    let vouchers = Arc::new(PostgresVoucherRepository::new(pool.clone()));
    let coupons = Arc::new(PostgresCouponRepository::new(pool.clone()));
    let reservations = Arc::new(PostgresReservationRepository::new(pool.clone()));
    let transactions = Arc::new(PostgresTransactionRepository::new(pool.clone()));

    let gateway = Arc::new(StripeGateway::new(StripeConfig::new(
        config.payment.stripe_api_key.clone(),
        config.payment.stripe_webhook_secret.clone(),
    )));

    let notifier: Arc<dyn VoucherNotifier> = if config.email.is_enabled() {
        Arc::new(ResendNotifier::new(ResendConfig::new(
            config.email.resend_api_key.clone(),
            config.email.from_header(),
        )))
    } else {
        tracing::warn!("No email API key configured; issuance emails are disabled");
        Arc::new(NoopNotifier)
    };

    let ledger = Arc::new(DiscountLedger::new(coupons.clone(), reservations.clone()));
    let activate_voucher = Arc::new(ActivateVoucher::new(vouchers.clone(), notifier.clone()));

    let state = AppState {
        open_checkout: Arc::new(OpenCheckout::new(
            vouchers.clone(),
            transactions.clone(),
            ledger.clone(),
            gateway.clone(),
            CheckoutUrls {
                success_url: config.payment.success_url.clone(),
                cancel_url: config.payment.cancel_url.clone(),
            },
            AmountBounds {
                min: Money::from_cents(config.payment.min_amount_cents),
                max: Money::from_cents(config.payment.max_amount_cents),
            },
        )),
        confirm_checkout: Arc::new(ConfirmCheckout::new(
            vouchers.clone(),
            transactions.clone(),
            ledger.clone(),
            gateway.clone(),
            activate_voucher.clone(),
        )),
        process_webhook: Arc::new(ProcessWebhook::new(transactions.clone(), gateway.clone())),
        verify_voucher: Arc::new(VerifyVoucher::new(vouchers.clone())),
        search_vouchers: Arc::new(SearchVouchers::new(vouchers.clone())),
        redeem_voucher: Arc::new(RedeemVoucher::new(vouchers.clone())),
        activate_voucher,
        voucher_admin: Arc::new(VoucherAdmin::new(vouchers.clone(), notifier.clone())),
        coupon_admin: Arc::new(CouponAdmin::new(coupons.clone())),
        ledger,
    };
    let auth = AdminAuthState::new(SecretString::new(config.admin.secret.clone()));

    let app = api_router(state, auth);

    let addr = config.server.socket_addr()?;
    tracing::info!(%addr, test_mode = config.payment.is_test_mode(), "Gift card service listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
