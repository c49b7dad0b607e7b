//! Confirms a checkout session and settles its side effects.
//!
//! The polling endpoint and the webhook both converge here: whichever path
//! first observes a paid session wins the `mark_paid` compare-and-set, and
//! settlement itself (coupon finalize, voucher activation, notification) is
//! idempotent so late or concurrent confirmations are harmless.

use std::sync::Arc;

use crate::application::ledger::DiscountLedger;
use crate::application::voucher::ActivateVoucher;
use crate::domain::foundation::{DomainError, ErrorCode};
use crate::domain::payment::{PaymentStatus, PaymentTransaction};
use crate::domain::voucher::{Voucher, VoucherStatus};
use crate::ports::{PaymentGateway, TransactionRepository, VoucherRepository};

/// Snapshot returned to the client polling for its purchase.
#[derive(Debug, Clone)]
pub struct CheckoutStatus {
    pub payment_status: PaymentStatus,
    pub session_status: String,
    pub voucher: Voucher,
}

pub struct ConfirmCheckout {
    vouchers: Arc<dyn VoucherRepository>,
    transactions: Arc<dyn TransactionRepository>,
    ledger: Arc<DiscountLedger>,
    gateway: Arc<dyn PaymentGateway>,
    activation: Arc<ActivateVoucher>,
}

impl ConfirmCheckout {
    pub fn new(
        vouchers: Arc<dyn VoucherRepository>,
        transactions: Arc<dyn TransactionRepository>,
        ledger: Arc<DiscountLedger>,
        gateway: Arc<dyn PaymentGateway>,
        activation: Arc<ActivateVoucher>,
    ) -> Self {
        Self {
            vouchers,
            transactions,
            ledger,
            gateway,
            activation,
        }
    }

    pub async fn execute(&self, session_id: &str) -> Result<CheckoutStatus, DomainError> {
        let tx = self.require_transaction(session_id).await?;
        let voucher = self.require_voucher(&tx).await?;

        // Fully settled: no gateway round trip needed.
        if tx.is_paid() && voucher.status != VoucherStatus::Pending {
            return Ok(CheckoutStatus {
                payment_status: tx.payment_status,
                session_status: tx.status,
                voucher,
            });
        }

        // The webhook already recorded the payment; only settlement is left.
        if tx.is_paid() {
            let voucher = self.settle(&tx).await?;
            let tx = self.require_transaction(session_id).await?;
            return Ok(CheckoutStatus {
                payment_status: tx.payment_status,
                session_status: tx.status,
                voucher,
            });
        }

        let session = self.gateway.fetch_session(session_id).await?;
        if session.payment_status == PaymentStatus::Paid {
            let won = self
                .transactions
                .mark_paid(session_id, &session.status)
                .await?;
            if won {
                tracing::info!(session_id, "Payment confirmed by polling");
            }
            let voucher = self.settle(&tx).await?;
            let tx = self.require_transaction(session_id).await?;
            Ok(CheckoutStatus {
                payment_status: tx.payment_status,
                session_status: tx.status,
                voucher,
            })
        } else {
            self.transactions
                .record_gateway_status(session_id, session.payment_status, &session.status)
                .await?;
            Ok(CheckoutStatus {
                payment_status: session.payment_status,
                session_status: session.status,
                voucher,
            })
        }
    }

    async fn require_transaction(
        &self,
        session_id: &str,
    ) -> Result<PaymentTransaction, DomainError> {
        self.transactions
            .find_by_session(session_id)
            .await?
            .ok_or_else(|| {
                DomainError::new(ErrorCode::TransactionNotFound, "Unknown checkout session")
            })
    }

    async fn require_voucher(&self, tx: &PaymentTransaction) -> Result<Voucher, DomainError> {
        self.vouchers.find_by_id(&tx.voucher_id).await?.ok_or_else(|| {
            DomainError::new(
                ErrorCode::InternalError,
                "Transaction references a missing voucher",
            )
        })
    }

    /// Runs the paid-side effects for a session: coupon usage finalization,
    /// then voucher activation. Safe to call any number of times.
    async fn settle(&self, tx: &PaymentTransaction) -> Result<Voucher, DomainError> {
        if let Some(token) = &tx.reservation_token {
            self.ledger
                .finalize(token, &tx.voucher_id, &tx.session_id)
                .await?;
        }
        self.activation.execute(&tx.voucher_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{
        InMemoryCouponRepository, InMemoryReservationRepository, InMemoryTransactionRepository,
        InMemoryVoucherRepository,
    };
    use crate::adapters::stripe::MockGateway;
    use crate::domain::coupon::{Coupon, Discount};
    use crate::domain::foundation::{Money, Timestamp};
    use crate::ports::CouponRepository;
    use crate::domain::voucher::BuyerInfo;
    use crate::ports::{CreateSessionRequest, NotifyError, VoucherNotifier};
    use futures::future::join_all;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tokio::sync::Mutex;

    struct RecordingNotifier {
        sent: Mutex<Vec<String>>,
        fail: AtomicBool,
    }

    impl RecordingNotifier {
        fn new() -> Self {
            Self {
                sent: Mutex::new(Vec::new()),
                fail: AtomicBool::new(false),
            }
        }

        async fn sent_codes(&self) -> Vec<String> {
            self.sent.lock().await.clone()
        }
    }

    #[async_trait::async_trait]
    impl VoucherNotifier for RecordingNotifier {
        async fn send_issued(&self, voucher: &Voucher) -> Result<(), NotifyError> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(NotifyError("smtp down".to_string()));
            }
            self.sent
                .lock()
                .await
                .push(voucher.code.clone().unwrap_or_default());
            Ok(())
        }
    }

    struct Fixture {
        handler: Arc<ConfirmCheckout>,
        vouchers: Arc<InMemoryVoucherRepository>,
        transactions: Arc<InMemoryTransactionRepository>,
        coupons: Arc<InMemoryCouponRepository>,
        ledger: Arc<DiscountLedger>,
        gateway: Arc<MockGateway>,
        notifier: Arc<RecordingNotifier>,
    }

    fn fixture() -> Fixture {
        let vouchers = Arc::new(InMemoryVoucherRepository::new());
        let transactions = Arc::new(InMemoryTransactionRepository::new());
        let coupons = Arc::new(InMemoryCouponRepository::new());
        let reservations = Arc::new(InMemoryReservationRepository::new());
        let ledger = Arc::new(DiscountLedger::new(coupons.clone(), reservations));
        let gateway = Arc::new(MockGateway::new());
        let notifier = Arc::new(RecordingNotifier::new());
        let activation = Arc::new(ActivateVoucher::new(vouchers.clone(), notifier.clone()));
        let handler = Arc::new(ConfirmCheckout::new(
            vouchers.clone(),
            transactions.clone(),
            ledger.clone(),
            gateway.clone(),
            activation,
        ));
        Fixture {
            handler,
            vouchers,
            transactions,
            coupons,
            ledger,
            gateway,
            notifier,
        }
    }

    fn buyer() -> BuyerInfo {
        BuyerInfo::new("Marie", "Dupont", "marie@example.com", "0601020304").unwrap()
    }

    /// Seeds a pending voucher with an open gateway session and matching
    /// transaction, optionally carrying a coupon reservation token.
    async fn seed_purchase(fixture: &Fixture, token: Option<String>) -> (Voucher, String) {
        let amount = Money::from_cents(5000);
        let voucher = Voucher::open_pending(buyer(), amount, amount, None, None);
        fixture.vouchers.insert(&voucher).await.unwrap();

        let session = fixture
            .gateway
            .create_checkout_session(CreateSessionRequest {
                voucher_id: voucher.id,
                amount,
                original_amount: amount,
                coupon_code: None,
                success_url: "https://shop.example/success".to_string(),
                cancel_url: "https://shop.example/cancel".to_string(),
            })
            .await
            .unwrap();
        fixture
            .vouchers
            .attach_session(&voucher.id, &session.id)
            .await
            .unwrap();
        fixture
            .transactions
            .insert(&PaymentTransaction::open(
                &session.id,
                voucher.id,
                amount,
                amount,
                None,
                token,
            ))
            .await
            .unwrap();
        (voucher, session.id)
    }

    #[tokio::test]
    async fn unpaid_session_stays_pending() {
        let fixture = fixture();
        let (voucher, session_id) = seed_purchase(&fixture, None).await;

        let status = fixture.handler.execute(&session_id).await.unwrap();
        assert_eq!(status.payment_status, PaymentStatus::Pending);
        assert_eq!(status.voucher.status, VoucherStatus::Pending);
        assert!(status.voucher.code.is_none());

        let stored = fixture.vouchers.find_by_id(&voucher.id).await.unwrap().unwrap();
        assert_eq!(stored.status, VoucherStatus::Pending);
        assert!(fixture.notifier.sent_codes().await.is_empty());
    }

    #[tokio::test]
    async fn paid_session_activates_the_voucher_and_notifies_once() {
        let fixture = fixture();
        let (voucher, session_id) = seed_purchase(&fixture, None).await;
        fixture.gateway.complete_session(&session_id).await;

        let status = fixture.handler.execute(&session_id).await.unwrap();
        assert_eq!(status.payment_status, PaymentStatus::Paid);
        assert_eq!(status.voucher.status, VoucherStatus::Active);
        let code = status.voucher.code.clone().unwrap();
        assert!(code.starts_with("LB-"));
        assert!(status.voucher.expires_at.is_some());

        // A second confirmation short-circuits without re-notifying.
        let again = fixture.handler.execute(&session_id).await.unwrap();
        assert_eq!(again.voucher.code.as_deref(), Some(code.as_str()));
        assert_eq!(fixture.notifier.sent_codes().await, vec![code]);

        let stored = fixture.vouchers.find_by_id(&voucher.id).await.unwrap().unwrap();
        assert!(stored.code_invariant_holds());
    }

    #[tokio::test]
    async fn paid_session_finalizes_the_coupon_reservation() {
        let fixture = fixture();
        fixture
            .coupons
            .insert(
                &Coupon::new(
                    "WELCOME15",
                    Discount::from_parts("percentage", 15.0).unwrap(),
                    Timestamp::now().add_days(30),
                    true,
                    Some(10),
                )
                .unwrap(),
            )
            .await
            .unwrap();
        let token = fixture.ledger.validate("WELCOME15").await.unwrap().token;
        fixture
            .ledger
            .reserve(&token, Money::from_cents(5000))
            .await
            .unwrap();

        let (_, session_id) = seed_purchase(&fixture, Some(token)).await;
        fixture.gateway.complete_session(&session_id).await;

        fixture.handler.execute(&session_id).await.unwrap();
        fixture.handler.execute(&session_id).await.unwrap();

        let coupon = fixture
            .coupons
            .find_by_code("WELCOME15")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(coupon.current_uses, 1);
    }

    #[tokio::test]
    async fn concurrent_confirmations_issue_one_voucher_and_one_notification() {
        let fixture = fixture();
        let (voucher, session_id) = seed_purchase(&fixture, None).await;
        fixture.gateway.complete_session(&session_id).await;

        let tasks = (0..8).map(|_| {
            let handler = fixture.handler.clone();
            let session_id = session_id.clone();
            tokio::spawn(async move { handler.execute(&session_id).await })
        });
        let results: Vec<_> = join_all(tasks).await;

        let mut codes = Vec::new();
        for result in results {
            let status = result.unwrap().unwrap();
            assert_eq!(status.payment_status, PaymentStatus::Paid);
            codes.push(status.voucher.code.unwrap());
        }
        codes.sort();
        codes.dedup();
        assert_eq!(codes.len(), 1);

        assert_eq!(fixture.notifier.sent_codes().await.len(), 1);
        let stored = fixture.vouchers.find_by_id(&voucher.id).await.unwrap().unwrap();
        assert_eq!(stored.status, VoucherStatus::Active);
    }

    #[tokio::test]
    async fn webhook_first_settlement_happens_on_next_read() {
        let fixture = fixture();
        let (voucher, session_id) = seed_purchase(&fixture, None).await;
        fixture.gateway.complete_session(&session_id).await;

        // Webhook recorded the payment but did not settle.
        assert!(fixture
            .transactions
            .mark_paid(&session_id, "complete")
            .await
            .unwrap());
        let stored = fixture.vouchers.find_by_id(&voucher.id).await.unwrap().unwrap();
        assert_eq!(stored.status, VoucherStatus::Pending);

        // The next poll performs the settlement exactly once.
        let status = fixture.handler.execute(&session_id).await.unwrap();
        assert_eq!(status.voucher.status, VoucherStatus::Active);
        assert_eq!(fixture.notifier.sent_codes().await.len(), 1);
    }

    #[tokio::test]
    async fn expired_session_is_mirrored_without_activation() {
        let fixture = fixture();
        let (voucher, session_id) = seed_purchase(&fixture, None).await;
        fixture.gateway.expire_session(&session_id).await;

        let status = fixture.handler.execute(&session_id).await.unwrap();
        assert_eq!(status.payment_status, PaymentStatus::Unpaid);
        assert_eq!(status.session_status, "expired");

        let stored = fixture.vouchers.find_by_id(&voucher.id).await.unwrap().unwrap();
        assert_eq!(stored.status, VoucherStatus::Pending);
    }

    #[tokio::test]
    async fn notification_failure_leaves_the_voucher_active() {
        let fixture = fixture();
        let (voucher, session_id) = seed_purchase(&fixture, None).await;
        fixture.gateway.complete_session(&session_id).await;
        fixture.notifier.fail.store(true, Ordering::SeqCst);

        let status = fixture.handler.execute(&session_id).await.unwrap();
        assert_eq!(status.voucher.status, VoucherStatus::Active);
        assert!(status.voucher.code.is_some());

        let stored = fixture.vouchers.find_by_id(&voucher.id).await.unwrap().unwrap();
        assert_eq!(stored.status, VoucherStatus::Active);
        assert!(fixture.notifier.sent_codes().await.is_empty());
    }

    #[tokio::test]
    async fn unknown_session_is_rejected() {
        let fixture = fixture();
        let err = fixture.handler.execute("cs_nope").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::TransactionNotFound);
    }
}
