//! Coupon reservation repository port.

use async_trait::async_trait;

use crate::domain::coupon::{CouponReservation, ReservationStatus};
use crate::domain::foundation::{DomainError, Timestamp, VoucherId};

/// Outcome of the idempotent `apply` operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// This call moved the reservation to `applied`; the caller owns the
    /// one-time side effects (usage counter increment).
    Applied,
    /// The reservation was already `applied`; success, no side effects.
    AlreadyApplied,
    /// The reservation is missing or canceled; nothing to apply.
    Rejected,
}

/// Persistent storage for coupon reservations.
///
/// Every state change is a compare-and-set against the current status;
/// implementations must never perform a blind read-modify-write, because
/// the reservation state machine is the double-spend guard.
#[async_trait]
pub trait ReservationRepository: Send + Sync {
    /// Inserts a freshly opened (pending) reservation.
    async fn insert(&self, reservation: &CouponReservation) -> Result<(), DomainError>;

    async fn find_by_token(&self, token: &str) -> Result<Option<CouponReservation>, DomainError>;

    /// Compare-and-set `from -> to`. Returns true if the row transitioned,
    /// false if it was not in `from` (or does not exist).
    async fn transition(
        &self,
        token: &str,
        from: ReservationStatus,
        to: ReservationStatus,
    ) -> Result<bool, DomainError>;

    /// Idempotent apply: compare-and-set from `pending` or `applied-pending`
    /// to `applied`, stamping `applied_at` and the voucher/session linkage.
    async fn apply(
        &self,
        token: &str,
        voucher_id: &VoucherId,
        session_id: &str,
        applied_at: Timestamp,
    ) -> Result<ApplyOutcome, DomainError>;
}
