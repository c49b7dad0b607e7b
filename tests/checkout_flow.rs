//! End-to-end purchase flows over the in-memory adapters and the mock
//! payment gateway.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;

use gift_card_service::adapters::memory::{
    InMemoryCouponRepository, InMemoryReservationRepository, InMemoryTransactionRepository,
    InMemoryVoucherRepository,
};
use gift_card_service::adapters::stripe::{MockGateway, MOCK_WEBHOOK_SIGNATURE};
use gift_card_service::application::checkout::{
    AmountBounds, CheckoutUrls, ConfirmCheckout, OpenCheckout, OpenCheckoutCommand,
    OpenCheckoutOutcome, ProcessWebhook,
};
use gift_card_service::application::ledger::DiscountLedger;
use gift_card_service::application::voucher::{ActivateVoucher, VerifyVoucher};
use gift_card_service::ports::{
    CouponRepository, ReservationRepository, TransactionRepository, VoucherRepository,
};
use gift_card_service::domain::coupon::{Coupon, Discount, ReservationStatus};
use gift_card_service::domain::foundation::{DomainError, ErrorCode, Money, Timestamp};
use gift_card_service::domain::payment::PaymentStatus;
use gift_card_service::domain::voucher::{BuyerInfo, Voucher, VoucherStatus};
use gift_card_service::ports::{NotifyError, VoucherNotifier};

struct CountingNotifier {
    sent: AtomicUsize,
}

#[async_trait]
impl VoucherNotifier for CountingNotifier {
    async fn send_issued(&self, _voucher: &Voucher) -> Result<(), NotifyError> {
        self.sent.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

struct App {
    vouchers: Arc<InMemoryVoucherRepository>,
    coupons: Arc<InMemoryCouponRepository>,
    reservations: Arc<InMemoryReservationRepository>,
    transactions: Arc<InMemoryTransactionRepository>,
    gateway: Arc<MockGateway>,
    notifier: Arc<CountingNotifier>,
    ledger: Arc<DiscountLedger>,
    open: OpenCheckout,
    confirm: Arc<ConfirmCheckout>,
    webhook: ProcessWebhook,
    verify: VerifyVoucher,
}

fn app() -> App {
    let vouchers = Arc::new(InMemoryVoucherRepository::new());
    let coupons = Arc::new(InMemoryCouponRepository::new());
    let reservations = Arc::new(InMemoryReservationRepository::new());
    let transactions = Arc::new(InMemoryTransactionRepository::new());
    let gateway = Arc::new(MockGateway::new());
    let notifier = Arc::new(CountingNotifier {
        sent: AtomicUsize::new(0),
    });

    let ledger = Arc::new(DiscountLedger::new(coupons.clone(), reservations.clone()));
    let activation = Arc::new(ActivateVoucher::new(vouchers.clone(), notifier.clone()));

    let open = OpenCheckout::new(
        vouchers.clone(),
        transactions.clone(),
        ledger.clone(),
        gateway.clone(),
        CheckoutUrls {
            success_url: "https://shop.example/merci".to_string(),
            cancel_url: "https://shop.example/cartes-cadeaux".to_string(),
        },
        AmountBounds::default(),
    );
    let confirm = Arc::new(ConfirmCheckout::new(
        vouchers.clone(),
        transactions.clone(),
        ledger.clone(),
        gateway.clone(),
        activation,
    ));
    let webhook = ProcessWebhook::new(transactions.clone(), gateway.clone());
    let verify = VerifyVoucher::new(vouchers.clone());

    App {
        vouchers,
        coupons,
        reservations,
        transactions,
        gateway,
        notifier,
        ledger,
        open,
        confirm,
        webhook,
        verify,
    }
}

fn buyer() -> BuyerInfo {
    BuyerInfo::new("Marie", "Dupont", "marie@example.com", "0601020304").unwrap()
}

fn purchase(amount_cents: i64, coupon_token: Option<String>) -> OpenCheckoutCommand {
    OpenCheckoutCommand {
        amount: Money::from_cents(amount_cents),
        buyer: buyer(),
        recipient_name: Some("Claire".to_string()),
        personal_message: None,
        coupon_token,
    }
}

async fn seed_coupon(app: &App, code: &str, discount: Discount, max_uses: Option<i64>) {
    let coupon = Coupon::new(
        code,
        discount,
        Timestamp::now().add_days(30),
        true,
        max_uses,
    )
    .unwrap();
    app.coupons.insert(&coupon).await.unwrap();
}

async fn open_paid_session(app: &App, command: OpenCheckoutCommand) -> OpenCheckoutOutcome {
    let outcome = app.open.execute(command).await.unwrap();
    app.gateway.complete_session(&outcome.session_id).await;
    outcome
}

#[tokio::test]
async fn full_purchase_without_coupon_issues_an_active_gift_card() {
    let app = app();
    let outcome = open_paid_session(&app, purchase(5_000, None)).await;

    let status = app.confirm.execute(&outcome.session_id).await.unwrap();
    assert_eq!(status.payment_status, PaymentStatus::Paid);
    assert_eq!(status.voucher.status, VoucherStatus::Active);

    let code = status.voucher.code.clone().unwrap();
    assert!(code.starts_with("LB-"));
    assert!(status.voucher.expires_at.is_some());
    assert_eq!(app.notifier.sent.load(Ordering::SeqCst), 1);

    let found = app.verify.execute(&code).await.unwrap();
    assert_eq!(found.id, status.voucher.id);
    assert_eq!(found.status, VoucherStatus::Active);
}

#[tokio::test]
async fn amounts_outside_the_bounds_are_rejected() {
    let app = app();

    for cents in [999, 50_001] {
        let err = app.open.execute(purchase(cents, None)).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidAmount);
    }
    assert!(app.vouchers.list().await.unwrap().is_empty());

    for cents in [1_000, 50_000] {
        app.open.execute(purchase(cents, None)).await.unwrap();
    }
}

#[tokio::test]
async fn percentage_coupon_discounts_the_charge_and_finalizes_once() {
    let app = app();
    seed_coupon(
        &app,
        "WELCOME15",
        Discount::from_parts("percentage", 15.0).unwrap(),
        Some(5),
    )
    .await;

    let validation = app.ledger.validate("welcome15").await.unwrap();
    let outcome = open_paid_session(&app, purchase(5_000, Some(validation.token.clone()))).await;
    assert_eq!(outcome.amount, Money::from_cents(4_250));
    assert_eq!(outcome.original_amount, Money::from_cents(5_000));

    let requests = app.gateway.create_requests().await;
    assert_eq!(requests[0].amount, Money::from_cents(4_250));
    assert_eq!(requests[0].coupon_code.as_deref(), Some("WELCOME15"));

    // Confirming twice only counts the coupon once.
    app.confirm.execute(&outcome.session_id).await.unwrap();
    app.confirm.execute(&outcome.session_id).await.unwrap();

    let coupon = app.coupons.find_by_code("WELCOME15").await.unwrap().unwrap();
    assert_eq!(coupon.current_uses, 1);

    let reservation = app
        .reservations
        .find_by_token(&validation.token)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(reservation.status, ReservationStatus::Applied);
}

#[tokio::test]
async fn fixed_coupon_floors_at_zero() {
    let app = app();
    seed_coupon(
        &app,
        "TENOFF",
        Discount::from_parts("fixed", 10.0).unwrap(),
        None,
    )
    .await;

    let validation = app.ledger.validate("TENOFF").await.unwrap();
    let outcome = app
        .open
        .execute(purchase(3_000, Some(validation.token)))
        .await
        .unwrap();
    assert_eq!(outcome.amount, Money::from_cents(2_000));
}

#[tokio::test]
async fn a_reserved_token_cannot_be_spent_twice() {
    let app = app();
    seed_coupon(
        &app,
        "WELCOME15",
        Discount::from_parts("percentage", 15.0).unwrap(),
        None,
    )
    .await;

    let validation = app.ledger.validate("WELCOME15").await.unwrap();
    app.open
        .execute(purchase(5_000, Some(validation.token.clone())))
        .await
        .unwrap();

    let err = app
        .open
        .execute(purchase(5_000, Some(validation.token)))
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::TokenInvalid);

    // Only the first purchase left a voucher behind.
    assert_eq!(app.vouchers.list().await.unwrap().len(), 1);
}

#[tokio::test]
async fn gateway_failure_rolls_back_the_voucher_and_releases_the_token() {
    let app = app();
    seed_coupon(
        &app,
        "WELCOME15",
        Discount::from_parts("percentage", 15.0).unwrap(),
        None,
    )
    .await;

    let validation = app.ledger.validate("WELCOME15").await.unwrap();
    app.gateway.fail_next_creates(true);
    let err = app
        .open
        .execute(purchase(5_000, Some(validation.token.clone())))
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::UpstreamUnavailable);

    assert!(app.vouchers.list().await.unwrap().is_empty());
    let reservation = app
        .reservations
        .find_by_token(&validation.token)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(reservation.status, ReservationStatus::Pending);

    // The released token is usable on the retry.
    app.gateway.fail_next_creates(false);
    let outcome = app
        .open
        .execute(purchase(5_000, Some(validation.token)))
        .await
        .unwrap();
    assert_eq!(outcome.amount, Money::from_cents(4_250));
}

#[tokio::test]
async fn concurrent_confirmations_issue_exactly_one_code() {
    let app = app();
    let outcome = open_paid_session(&app, purchase(5_000, None)).await;

    let confirms = (0..8).map(|_| {
        let confirm = app.confirm.clone();
        let session_id = outcome.session_id.clone();
        tokio::spawn(async move { confirm.execute(&session_id).await })
    });
    let results: Vec<Result<_, DomainError>> = join_all(confirms)
        .await
        .into_iter()
        .map(|joined| joined.unwrap())
        .collect();

    let mut codes: Vec<String> = results
        .into_iter()
        .map(|result| result.unwrap().voucher.code.unwrap())
        .collect();
    codes.sort();
    codes.dedup();
    assert_eq!(codes.len(), 1);
    assert_eq!(app.notifier.sent.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn webhook_marks_paid_and_the_next_poll_activates() {
    let app = app();
    let outcome = open_paid_session(&app, purchase(5_000, None)).await;

    let payload = format!(
        r#"{{"id":"evt_1","type":"checkout.session.completed","session_id":"{}"}}"#,
        outcome.session_id
    );
    app.webhook
        .execute(payload.as_bytes(), MOCK_WEBHOOK_SIGNATURE)
        .await
        .unwrap();

    // The webhook only flips the payment; activation happens on read.
    let tx = app
        .transactions
        .find_by_session(&outcome.session_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(tx.payment_status, PaymentStatus::Paid);
    let voucher = app
        .vouchers
        .find_by_id(&outcome.voucher_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(voucher.status, VoucherStatus::Pending);

    let status = app.confirm.execute(&outcome.session_id).await.unwrap();
    assert_eq!(status.voucher.status, VoucherStatus::Active);
    assert_eq!(app.notifier.sent.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn webhook_with_a_bad_signature_changes_nothing() {
    let app = app();
    let outcome = open_paid_session(&app, purchase(5_000, None)).await;

    let payload = format!(
        r#"{{"id":"evt_1","type":"checkout.session.completed","session_id":"{}"}}"#,
        outcome.session_id
    );
    let err = app
        .webhook
        .execute(payload.as_bytes(), "forged")
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ValidationFailed);

    let tx = app
        .transactions
        .find_by_session(&outcome.session_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(tx.payment_status, PaymentStatus::Pending);
}

#[tokio::test]
async fn expired_sessions_are_mirrored_without_activation() {
    let app = app();
    let outcome = app.open.execute(purchase(5_000, None)).await.unwrap();
    app.gateway.expire_session(&outcome.session_id).await;

    let status = app.confirm.execute(&outcome.session_id).await.unwrap();
    assert_eq!(status.payment_status, PaymentStatus::Unpaid);
    assert_eq!(status.session_status, "expired");
    assert_eq!(status.voucher.status, VoucherStatus::Pending);
    assert_eq!(app.notifier.sent.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn verify_persists_the_lazy_expiry_flip() {
    let app = app();
    let outcome = open_paid_session(&app, purchase(5_000, None)).await;
    let status = app.confirm.execute(&outcome.session_id).await.unwrap();
    let code = status.voucher.code.unwrap();

    app.vouchers
        .set_expires_at(&outcome.voucher_id, Timestamp::now().add_days(-1))
        .await
        .unwrap();

    let flipped = app.verify.execute(&code).await.unwrap();
    assert_eq!(flipped.status, VoucherStatus::Expired);

    let stored = app
        .vouchers
        .find_by_id(&outcome.voucher_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.status, VoucherStatus::Expired);
}

#[tokio::test]
async fn each_validation_mints_an_independent_token() {
    let app = app();
    seed_coupon(
        &app,
        "WELCOME15",
        Discount::from_parts("percentage", 15.0).unwrap(),
        None,
    )
    .await;

    let first = app.ledger.validate("WELCOME15").await.unwrap();
    let second = app.ledger.validate("WELCOME15").await.unwrap();
    assert_ne!(first.token, second.token);

    // Spending one leaves the other usable.
    open_paid_session(&app, purchase(5_000, Some(first.token))).await;
    app.open
        .execute(purchase(5_000, Some(second.token)))
        .await
        .unwrap();
}

#[tokio::test]
async fn usage_cap_is_never_exceeded_across_purchases() {
    let app = app();
    seed_coupon(
        &app,
        "LIMITED",
        Discount::from_parts("percentage", 10.0).unwrap(),
        Some(1),
    )
    .await;

    let first = app.ledger.validate("LIMITED").await.unwrap();
    let second = app.ledger.validate("LIMITED").await.unwrap();

    let a = open_paid_session(&app, purchase(5_000, Some(first.token))).await;
    let b = open_paid_session(&app, purchase(5_000, Some(second.token))).await;
    app.confirm.execute(&a.session_id).await.unwrap();
    app.confirm.execute(&b.session_id).await.unwrap();

    let coupon = app.coupons.find_by_code("LIMITED").await.unwrap().unwrap();
    assert_eq!(coupon.current_uses, 1);

    // A third validation is refused outright.
    let err = app.ledger.validate("LIMITED").await.unwrap_err();
    assert_eq!(err.code, ErrorCode::UsageLimitReached);
}
