//! The discount ledger: coupon validation and single-use reservation
//! bookkeeping.
//!
//! Owns the reservation state machine end to end. Every transition funnels
//! through the repository's compare-and-set operations; the ledger itself
//! never reads a status and writes it back blindly.

use std::sync::Arc;

use crate::domain::codegen;
use crate::domain::coupon::{Coupon, CouponReservation, Discount, DiscountSnapshot, ReservationStatus};
use crate::domain::foundation::{DomainError, ErrorCode, Money, Timestamp, VoucherId};
use crate::ports::{ApplyOutcome, CouponRepository, ReservationRepository};

/// Successful coupon validation: a fresh single-use token plus the discount
/// terms for client display.
#[derive(Debug, Clone)]
pub struct ValidationOutcome {
    pub token: String,
    pub coupon_code: String,
    pub discount: Discount,
    pub current_uses: i64,
    pub max_uses: Option<i64>,
}

/// Successful reservation at checkout time.
#[derive(Debug, Clone)]
pub struct ReserveOutcome {
    pub final_amount: Money,
    pub snapshot: DiscountSnapshot,
}

/// Coupon validation and reservation service.
pub struct DiscountLedger {
    coupons: Arc<dyn CouponRepository>,
    reservations: Arc<dyn ReservationRepository>,
}

impl DiscountLedger {
    pub fn new(
        coupons: Arc<dyn CouponRepository>,
        reservations: Arc<dyn ReservationRepository>,
    ) -> Self {
        Self {
            coupons,
            reservations,
        }
    }

    /// Validates a coupon code and opens a pending reservation for it.
    ///
    /// Each call mints an independent token; `current_uses` is untouched
    /// until a reservation is finalized.
    pub async fn validate(&self, code: &str) -> Result<ValidationOutcome, DomainError> {
        let normalized = Coupon::normalize_code(code);
        let coupon = self
            .coupons
            .find_by_code(&normalized)
            .await?
            .ok_or_else(|| DomainError::new(ErrorCode::CouponNotFound, "Coupon not found"))?;

        coupon.check_available(Timestamp::now())?;

        let token = codegen::mint_validation_token();
        let reservation = CouponReservation::open(&coupon.code, &token);
        self.reservations.insert(&reservation).await?;

        tracing::debug!(coupon = %coupon.code, "Opened coupon reservation");

        Ok(ValidationOutcome {
            token,
            coupon_code: coupon.code,
            discount: coupon.discount,
            current_uses: coupon.current_uses,
            max_uses: coupon.max_uses,
        })
    }

    /// Claims a pending reservation for a checkout attempt.
    ///
    /// The `pending -> applied-pending` compare-and-set is the primary
    /// double-spend guard: a token in any other state is rejected, never
    /// silently reused.
    pub async fn reserve(
        &self,
        token: &str,
        requested_amount: Money,
    ) -> Result<ReserveOutcome, DomainError> {
        let moved = self
            .reservations
            .transition(token, ReservationStatus::Pending, ReservationStatus::AppliedPending)
            .await?;

        if !moved {
            let reason = match self.reservations.find_by_token(token).await? {
                None => "Invalid coupon token",
                Some(_) => "Coupon already used or invalid",
            };
            return Err(DomainError::new(ErrorCode::TokenInvalid, reason));
        }

        let reservation = self
            .reservations
            .find_by_token(token)
            .await?
            .ok_or_else(|| DomainError::new(ErrorCode::InternalError, "Reservation vanished"))?;

        let coupon = match self.coupons.find_by_code(&reservation.coupon_code).await? {
            Some(coupon) => coupon,
            None => {
                // Definition deleted since validation; hand the claim back.
                self.release(token).await?;
                return Err(DomainError::new(
                    ErrorCode::CouponNotFound,
                    "Coupon no longer exists",
                ));
            }
        };

        let snapshot =
            DiscountSnapshot::capture(&coupon.code, coupon.discount, requested_amount);
        Ok(ReserveOutcome {
            final_amount: coupon.discount.apply(requested_amount),
            snapshot,
        })
    }

    /// Compensating action: returns an `applied-pending` reservation to
    /// `pending` after checkout session creation failed downstream.
    ///
    /// Best-effort idempotent-safe: if the reservation has already moved on
    /// the compare-and-set simply does not match, and that is fine.
    pub async fn release(&self, token: &str) -> Result<(), DomainError> {
        let moved = self
            .reservations
            .transition(token, ReservationStatus::AppliedPending, ReservationStatus::Pending)
            .await?;
        if !moved {
            tracing::warn!(token_suffix = token_suffix(token), "Release found no applied-pending reservation");
        }
        Ok(())
    }

    /// Durably credits the coupon usage exactly once per reservation.
    ///
    /// Idempotent: an already-applied reservation is a success no-op, so
    /// the polling and webhook confirmation paths can both call this for
    /// the same payment.
    pub async fn finalize(
        &self,
        token: &str,
        voucher_id: &VoucherId,
        session_id: &str,
    ) -> Result<(), DomainError> {
        let outcome = self
            .reservations
            .apply(token, voucher_id, session_id, Timestamp::now())
            .await?;

        match outcome {
            ApplyOutcome::Applied => {
                let reservation = self
                    .reservations
                    .find_by_token(token)
                    .await?
                    .ok_or_else(|| {
                        DomainError::new(ErrorCode::InternalError, "Reservation vanished")
                    })?;
                let incremented = self
                    .coupons
                    .increment_uses(&reservation.coupon_code)
                    .await?;
                if !incremented {
                    // Cap already reached by concurrent finalizations of
                    // other reservations; the counter must not overrun it.
                    tracing::warn!(
                        coupon = %reservation.coupon_code,
                        "Usage cap reached before finalize could credit this use"
                    );
                }
                Ok(())
            }
            ApplyOutcome::AlreadyApplied => Ok(()),
            ApplyOutcome::Rejected => {
                tracing::warn!(
                    token_suffix = token_suffix(token),
                    "Finalize called for a missing or canceled reservation"
                );
                Ok(())
            }
        }
    }

    /// Client-abandon path: only a `pending` reservation can be canceled.
    pub async fn cancel_pending(&self, token: &str) -> Result<(), DomainError> {
        let moved = self
            .reservations
            .transition(token, ReservationStatus::Pending, ReservationStatus::Canceled)
            .await?;
        if moved {
            return Ok(());
        }
        match self.reservations.find_by_token(token).await? {
            None => Err(DomainError::new(
                ErrorCode::TokenInvalid,
                "Usage record not found",
            )),
            Some(_) => Err(DomainError::state_conflict(
                "Can only cancel pending coupons",
            )),
        }
    }
}

/// Last few characters of a token, enough to correlate log lines without
/// leaking the capability.
fn token_suffix(token: &str) -> &str {
    let len = token.len();
    &token[len.saturating_sub(6)..]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{InMemoryCouponRepository, InMemoryReservationRepository};
    use crate::domain::foundation::Timestamp;
    use futures::future::join_all;

    async fn ledger_with(coupon: Coupon) -> (DiscountLedger, Arc<InMemoryCouponRepository>) {
        let coupons = Arc::new(InMemoryCouponRepository::new());
        coupons.insert(&coupon).await.unwrap();
        let ledger = DiscountLedger::new(
            coupons.clone(),
            Arc::new(InMemoryReservationRepository::new()),
        );
        (ledger, coupons)
    }

    fn percentage_coupon(code: &str, pct: f64, max_uses: Option<i64>) -> Coupon {
        Coupon::new(
            code,
            Discount::from_parts("percentage", pct).unwrap(),
            Timestamp::now().add_days(30),
            true,
            max_uses,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn validate_issues_independent_tokens() {
        let (ledger, _) = ledger_with(percentage_coupon("WELCOME15", 15.0, None)).await;

        let first = ledger.validate("welcome15").await.unwrap();
        let second = ledger.validate("WELCOME15").await.unwrap();
        assert_ne!(first.token, second.token);
        assert_eq!(first.coupon_code, "WELCOME15");
        assert_eq!(first.current_uses, 0);
    }

    #[tokio::test]
    async fn validate_rejects_unknown_inactive_expired_and_exhausted() {
        let (ledger, coupons) = ledger_with(percentage_coupon("WELCOME15", 15.0, Some(1))).await;

        assert_eq!(
            ledger.validate("NOPE").await.unwrap_err().code,
            ErrorCode::CouponNotFound
        );

        let mut coupon = coupons.find_by_code("WELCOME15").await.unwrap().unwrap();
        coupon.current_uses = 1;
        coupons.update(&coupon).await.unwrap();
        assert_eq!(
            ledger.validate("WELCOME15").await.unwrap_err().code,
            ErrorCode::UsageLimitReached
        );

        coupon.current_uses = 0;
        coupon.is_active = false;
        coupons.update(&coupon).await.unwrap();
        assert_eq!(
            ledger.validate("WELCOME15").await.unwrap_err().code,
            ErrorCode::CouponInactive
        );

        coupon.is_active = true;
        coupon.valid_to = Timestamp::now().add_days(-1);
        coupons.update(&coupon).await.unwrap();
        assert_eq!(
            ledger.validate("WELCOME15").await.unwrap_err().code,
            ErrorCode::CouponExpired
        );
    }

    #[tokio::test]
    async fn reserve_computes_discount_and_spends_the_token() {
        let (ledger, _) = ledger_with(percentage_coupon("WELCOME15", 15.0, None)).await;
        let validation = ledger.validate("WELCOME15").await.unwrap();

        let outcome = ledger
            .reserve(&validation.token, Money::from_cents(5000))
            .await
            .unwrap();
        assert_eq!(outcome.final_amount.cents(), 4250);
        assert_eq!(outcome.snapshot.amount_off.cents(), 750);

        // The same token is rejected by a second checkout attempt.
        let err = ledger
            .reserve(&validation.token, Money::from_cents(5000))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::TokenInvalid);
    }

    #[tokio::test]
    async fn reserve_rejects_unknown_tokens() {
        let (ledger, _) = ledger_with(percentage_coupon("WELCOME15", 15.0, None)).await;
        let err = ledger
            .reserve("made-up-token", Money::from_cents(5000))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::TokenInvalid);
    }

    #[tokio::test]
    async fn released_token_is_usable_again() {
        let (ledger, _) = ledger_with(percentage_coupon("WELCOME15", 15.0, None)).await;
        let validation = ledger.validate("WELCOME15").await.unwrap();

        ledger
            .reserve(&validation.token, Money::from_cents(5000))
            .await
            .unwrap();
        ledger.release(&validation.token).await.unwrap();

        // Retry after the compensating release succeeds.
        let outcome = ledger
            .reserve(&validation.token, Money::from_cents(5000))
            .await
            .unwrap();
        assert_eq!(outcome.final_amount.cents(), 4250);
    }

    #[tokio::test]
    async fn finalize_is_idempotent_and_increments_once() {
        let (ledger, coupons) = ledger_with(percentage_coupon("WELCOME15", 15.0, None)).await;
        let validation = ledger.validate("WELCOME15").await.unwrap();
        ledger
            .reserve(&validation.token, Money::from_cents(5000))
            .await
            .unwrap();

        let voucher_id = VoucherId::new();
        ledger
            .finalize(&validation.token, &voucher_id, "cs_1")
            .await
            .unwrap();
        ledger
            .finalize(&validation.token, &voucher_id, "cs_1")
            .await
            .unwrap();

        let coupon = coupons.find_by_code("WELCOME15").await.unwrap().unwrap();
        assert_eq!(coupon.current_uses, 1);
    }

    #[tokio::test]
    async fn finalize_from_pending_also_applies() {
        // Reachable when the gateway confirmed a payment whose checkout
        // construction released the reservation; the transition stays legal.
        let (ledger, coupons) = ledger_with(percentage_coupon("WELCOME15", 15.0, None)).await;
        let validation = ledger.validate("WELCOME15").await.unwrap();

        ledger
            .finalize(&validation.token, &VoucherId::new(), "cs_1")
            .await
            .unwrap();
        let coupon = coupons.find_by_code("WELCOME15").await.unwrap().unwrap();
        assert_eq!(coupon.current_uses, 1);
    }

    #[tokio::test]
    async fn second_token_works_after_first_applied() {
        let (ledger, _) = ledger_with(percentage_coupon("WELCOME15", 15.0, None)).await;
        let first = ledger.validate("WELCOME15").await.unwrap();
        let second = ledger.validate("WELCOME15").await.unwrap();

        ledger.reserve(&first.token, Money::from_cents(5000)).await.unwrap();
        ledger
            .finalize(&first.token, &VoucherId::new(), "cs_1")
            .await
            .unwrap();

        let outcome = ledger
            .reserve(&second.token, Money::from_cents(3000))
            .await
            .unwrap();
        assert_eq!(outcome.final_amount.cents(), 2550);
    }

    #[tokio::test]
    async fn cancel_only_from_pending() {
        let (ledger, _) = ledger_with(percentage_coupon("WELCOME15", 15.0, None)).await;
        let validation = ledger.validate("WELCOME15").await.unwrap();

        ledger
            .reserve(&validation.token, Money::from_cents(5000))
            .await
            .unwrap();
        let err = ledger.cancel_pending(&validation.token).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::StateConflict);

        assert_eq!(
            ledger.cancel_pending("missing").await.unwrap_err().code,
            ErrorCode::TokenInvalid
        );

        let fresh = ledger.validate("WELCOME15").await.unwrap();
        ledger.cancel_pending(&fresh.token).await.unwrap();
        let err = ledger
            .reserve(&fresh.token, Money::from_cents(5000))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::TokenInvalid);
    }

    #[tokio::test]
    async fn concurrent_finalizes_never_exceed_the_cap() {
        let (ledger, coupons) = ledger_with(percentage_coupon("CAPPED", 10.0, Some(3))).await;
        let ledger = Arc::new(ledger);

        // Five independent reservations all validated while uses were below
        // the cap, racing to finalize.
        let mut tokens = Vec::new();
        for _ in 0..5 {
            tokens.push(ledger.validate("CAPPED").await.unwrap().token);
        }

        let tasks = tokens.into_iter().enumerate().map(|(i, token)| {
            let ledger = ledger.clone();
            tokio::spawn(async move {
                ledger
                    .finalize(&token, &VoucherId::new(), &format!("cs_{}", i))
                    .await
            })
        });
        for result in join_all(tasks).await {
            result.unwrap().unwrap();
        }

        let coupon = coupons.find_by_code("CAPPED").await.unwrap().unwrap();
        assert_eq!(coupon.current_uses, 3);
    }
}
