//! PostgreSQL implementation of ReservationRepository.
//!
//! The reservation state machine is enforced here by guarded UPDATEs; a lost
//! compare-and-set shows up as zero affected rows, never as a late
//! overwrite.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::coupon::{CouponReservation, ReservationStatus};
use crate::domain::foundation::{DomainError, ReservationId, Timestamp, VoucherId};
use crate::ports::{ApplyOutcome, ReservationRepository};

pub struct PostgresReservationRepository {
    pool: PgPool,
}

impl PostgresReservationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const RESERVATION_COLUMNS: &str = "id, coupon_code, validation_token, status, session_id, \
     voucher_id, created_at, applied_at";

#[derive(Debug, sqlx::FromRow)]
struct ReservationRow {
    id: Uuid,
    coupon_code: String,
    validation_token: String,
    status: String,
    session_id: Option<String>,
    voucher_id: Option<Uuid>,
    created_at: DateTime<Utc>,
    applied_at: Option<DateTime<Utc>>,
}

impl TryFrom<ReservationRow> for CouponReservation {
    type Error = DomainError;

    fn try_from(row: ReservationRow) -> Result<Self, Self::Error> {
        let status = ReservationStatus::parse(&row.status)?;
        Ok(CouponReservation {
            id: ReservationId::from_uuid(row.id),
            coupon_code: row.coupon_code,
            validation_token: row.validation_token,
            status,
            session_id: row.session_id,
            voucher_id: row.voucher_id.map(VoucherId::from_uuid),
            created_at: Timestamp::from_datetime(row.created_at),
            applied_at: row.applied_at.map(Timestamp::from_datetime),
        })
    }
}

fn db_error(context: &str, e: sqlx::Error) -> DomainError {
    DomainError::database(format!("{}: {}", context, e))
}

#[async_trait]
impl ReservationRepository for PostgresReservationRepository {
    async fn insert(&self, reservation: &CouponReservation) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO coupon_reservations (
                id, coupon_code, validation_token, status, session_id,
                voucher_id, created_at, applied_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(reservation.id.as_uuid())
        .bind(&reservation.coupon_code)
        .bind(&reservation.validation_token)
        .bind(reservation.status.as_str())
        .bind(&reservation.session_id)
        .bind(reservation.voucher_id.map(|id| *id.as_uuid()))
        .bind(reservation.created_at.as_datetime())
        .bind(reservation.applied_at.map(|t| *t.as_datetime()))
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("Failed to insert reservation", e))?;

        Ok(())
    }

    async fn find_by_token(&self, token: &str) -> Result<Option<CouponReservation>, DomainError> {
        let row: Option<ReservationRow> = sqlx::query_as(&format!(
            "SELECT {} FROM coupon_reservations WHERE validation_token = $1",
            RESERVATION_COLUMNS
        ))
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("Failed to find reservation", e))?;

        row.map(CouponReservation::try_from).transpose()
    }

    async fn transition(
        &self,
        token: &str,
        from: ReservationStatus,
        to: ReservationStatus,
    ) -> Result<bool, DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE coupon_reservations
            SET status = $3
            WHERE validation_token = $1 AND status = $2
            "#,
        )
        .bind(token)
        .bind(from.as_str())
        .bind(to.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("Failed to transition reservation", e))?;

        Ok(result.rows_affected() == 1)
    }

    async fn apply(
        &self,
        token: &str,
        voucher_id: &VoucherId,
        session_id: &str,
        applied_at: Timestamp,
    ) -> Result<ApplyOutcome, DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE coupon_reservations
            SET status = 'applied', voucher_id = $2, session_id = $3, applied_at = $4
            WHERE validation_token = $1 AND status IN ('pending', 'applied-pending')
            "#,
        )
        .bind(token)
        .bind(voucher_id.as_uuid())
        .bind(session_id)
        .bind(applied_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("Failed to apply reservation", e))?;

        if result.rows_affected() == 1 {
            return Ok(ApplyOutcome::Applied);
        }

        match self.find_by_token(token).await? {
            Some(reservation) if reservation.status == ReservationStatus::Applied => {
                Ok(ApplyOutcome::AlreadyApplied)
            }
            _ => Ok(ApplyOutcome::Rejected),
        }
    }
}
