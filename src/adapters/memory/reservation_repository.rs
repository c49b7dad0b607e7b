//! In-memory coupon reservation repository.
//!
//! Transitions run under a single lock hold, giving the same
//! compare-and-set semantics the Postgres adapter expresses with guarded
//! UPDATEs.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::coupon::{CouponReservation, ReservationStatus};
use crate::domain::foundation::{DomainError, ErrorCode, Timestamp, VoucherId};
use crate::ports::{ApplyOutcome, ReservationRepository};

/// In-memory storage for reservations, keyed by validation token.
#[derive(Debug, Clone, Default)]
pub struct InMemoryReservationRepository {
    reservations: Arc<RwLock<HashMap<String, CouponReservation>>>,
}

impl InMemoryReservationRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ReservationRepository for InMemoryReservationRepository {
    async fn insert(&self, reservation: &CouponReservation) -> Result<(), DomainError> {
        let mut reservations = self.reservations.write().await;
        if reservations.contains_key(&reservation.validation_token) {
            return Err(DomainError::new(
                ErrorCode::InternalError,
                "Validation token collision",
            ));
        }
        reservations.insert(reservation.validation_token.clone(), reservation.clone());
        Ok(())
    }

    async fn find_by_token(&self, token: &str) -> Result<Option<CouponReservation>, DomainError> {
        let reservations = self.reservations.read().await;
        Ok(reservations.get(token).cloned())
    }

    async fn transition(
        &self,
        token: &str,
        from: ReservationStatus,
        to: ReservationStatus,
    ) -> Result<bool, DomainError> {
        let mut reservations = self.reservations.write().await;
        match reservations.get_mut(token) {
            Some(reservation) if reservation.status == from => {
                reservation.status = to;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn apply(
        &self,
        token: &str,
        voucher_id: &VoucherId,
        session_id: &str,
        applied_at: Timestamp,
    ) -> Result<ApplyOutcome, DomainError> {
        let mut reservations = self.reservations.write().await;
        match reservations.get_mut(token) {
            Some(reservation) => match reservation.status {
                ReservationStatus::Pending | ReservationStatus::AppliedPending => {
                    reservation.status = ReservationStatus::Applied;
                    reservation.voucher_id = Some(*voucher_id);
                    reservation.session_id = Some(session_id.to_string());
                    reservation.applied_at = Some(applied_at);
                    Ok(ApplyOutcome::Applied)
                }
                ReservationStatus::Applied => Ok(ApplyOutcome::AlreadyApplied),
                ReservationStatus::Canceled => Ok(ApplyOutcome::Rejected),
            },
            None => Ok(ApplyOutcome::Rejected),
        }
    }
}
