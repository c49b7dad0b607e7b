//! Opens a gift card purchase: validates the request, claims any coupon
//! reservation, creates the pending voucher and the hosted checkout session.

use std::sync::Arc;

use crate::application::ledger::DiscountLedger;
use crate::domain::coupon::DiscountSnapshot;
use crate::domain::foundation::{DomainError, ErrorCode, Money, VoucherId};
use crate::domain::payment::PaymentTransaction;
use crate::domain::voucher::{BuyerInfo, Voucher};
use crate::ports::{CreateSessionRequest, PaymentGateway, TransactionRepository, VoucherRepository};

/// Purchasable amount bounds, from configuration.
#[derive(Debug, Clone, Copy)]
pub struct AmountBounds {
    pub min: Money,
    pub max: Money,
}

impl Default for AmountBounds {
    fn default() -> Self {
        Self {
            min: Money::from_cents(1_000),
            max: Money::from_cents(50_000),
        }
    }
}

/// A checkout purchase request, already shaped by the transport layer.
#[derive(Debug, Clone)]
pub struct OpenCheckoutCommand {
    pub amount: Money,
    pub buyer: BuyerInfo,
    pub recipient_name: Option<String>,
    pub personal_message: Option<String>,
    /// Single-use token from a prior coupon validation.
    pub coupon_token: Option<String>,
}

/// Everything the client needs to hand the buyer over to the gateway.
#[derive(Debug, Clone)]
pub struct OpenCheckoutOutcome {
    pub voucher_id: VoucherId,
    pub session_id: String,
    pub checkout_url: String,
    pub amount: Money,
    pub original_amount: Money,
    pub discount: Option<DiscountSnapshot>,
}

/// Redirect targets for the hosted checkout, from configuration.
#[derive(Debug, Clone)]
pub struct CheckoutUrls {
    pub success_url: String,
    pub cancel_url: String,
}

pub struct OpenCheckout {
    vouchers: Arc<dyn VoucherRepository>,
    transactions: Arc<dyn TransactionRepository>,
    ledger: Arc<DiscountLedger>,
    gateway: Arc<dyn PaymentGateway>,
    urls: CheckoutUrls,
    bounds: AmountBounds,
}

impl OpenCheckout {
    pub fn new(
        vouchers: Arc<dyn VoucherRepository>,
        transactions: Arc<dyn TransactionRepository>,
        ledger: Arc<DiscountLedger>,
        gateway: Arc<dyn PaymentGateway>,
        urls: CheckoutUrls,
        bounds: AmountBounds,
    ) -> Self {
        Self {
            vouchers,
            transactions,
            ledger,
            gateway,
            urls,
            bounds,
        }
    }

    pub async fn execute(
        &self,
        command: OpenCheckoutCommand,
    ) -> Result<OpenCheckoutOutcome, DomainError> {
        if command.amount < self.bounds.min || command.amount > self.bounds.max {
            return Err(DomainError::new(
                ErrorCode::InvalidAmount,
                format!(
                    "Amount must be between {} and {} EUR",
                    self.bounds.min, self.bounds.max
                ),
            ));
        }

        let requested = command.amount;
        let (charged, snapshot) = match command.coupon_token.as_deref() {
            Some(token) => {
                let reserved = self.ledger.reserve(token, requested).await?;
                (reserved.final_amount, Some(reserved.snapshot))
            }
            None => (requested, None),
        };

        let voucher = Voucher::open_pending(
            command.buyer,
            charged,
            requested,
            command.recipient_name,
            command.personal_message,
        );
        self.vouchers.insert(&voucher).await?;

        let session = match self
            .gateway
            .create_checkout_session(CreateSessionRequest {
                voucher_id: voucher.id,
                amount: charged,
                original_amount: requested,
                coupon_code: snapshot.as_ref().map(|s| s.coupon_code.clone()),
                success_url: self.urls.success_url.clone(),
                cancel_url: self.urls.cancel_url.clone(),
            })
            .await
        {
            Ok(session) => session,
            Err(err) => {
                self.compensate(&voucher.id, command.coupon_token.as_deref())
                    .await;
                tracing::error!(voucher_id = %voucher.id, error = %err, "Checkout session creation failed");
                return Err(err.into());
            }
        };

        self.vouchers.attach_session(&voucher.id, &session.id).await?;
        self.transactions
            .insert(&PaymentTransaction::open(
                &session.id,
                voucher.id,
                charged,
                requested,
                snapshot.clone(),
                command.coupon_token.clone(),
            ))
            .await?;

        tracing::info!(
            voucher_id = %voucher.id,
            session_id = %session.id,
            amount_cents = charged.cents(),
            "Opened checkout session"
        );

        Ok(OpenCheckoutOutcome {
            voucher_id: voucher.id,
            session_id: session.id,
            checkout_url: session.url,
            amount: charged,
            original_amount: requested,
            discount: snapshot,
        })
    }

    /// Rolls back the local side effects after a gateway failure so the
    /// buyer can retry from scratch: the pending voucher is removed and the
    /// coupon reservation handed back.
    async fn compensate(&self, voucher_id: &VoucherId, coupon_token: Option<&str>) {
        if let Err(err) = self.vouchers.delete_if_pending(voucher_id).await {
            tracing::error!(voucher_id = %voucher_id, error = %err, "Compensation failed to delete pending voucher");
        }
        if let Some(token) = coupon_token {
            if let Err(err) = self.ledger.release(token).await {
                tracing::error!(voucher_id = %voucher_id, error = %err, "Compensation failed to release reservation");
            }
        }
    }
}
