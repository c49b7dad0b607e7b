//! PostgreSQL implementation of CouponRepository.
//!
//! The usage counter is only ever touched by a single guarded UPDATE, so the
//! cap holds under concurrent finalizations without any application-side
//! locking.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::coupon::{Coupon, Discount};
use crate::domain::foundation::{CouponId, DomainError, ErrorCode, Timestamp};
use crate::ports::CouponRepository;

pub struct PostgresCouponRepository {
    pool: PgPool,
}

impl PostgresCouponRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const COUPON_COLUMNS: &str = "id, code, discount_kind, discount_value, valid_from, valid_to, \
     is_active, max_uses, current_uses, created_at";

#[derive(Debug, sqlx::FromRow)]
struct CouponRow {
    id: Uuid,
    code: String,
    discount_kind: String,
    discount_value: f64,
    valid_from: DateTime<Utc>,
    valid_to: DateTime<Utc>,
    is_active: bool,
    max_uses: Option<i64>,
    current_uses: i64,
    created_at: DateTime<Utc>,
}

impl TryFrom<CouponRow> for Coupon {
    type Error = DomainError;

    fn try_from(row: CouponRow) -> Result<Self, Self::Error> {
        let discount = Discount::from_parts(&row.discount_kind, row.discount_value)
            .map_err(|e| DomainError::database(format!("Invalid stored discount: {}", e)))?;
        Ok(Coupon {
            id: CouponId::from_uuid(row.id),
            code: row.code,
            discount,
            valid_from: Timestamp::from_datetime(row.valid_from),
            valid_to: Timestamp::from_datetime(row.valid_to),
            is_active: row.is_active,
            max_uses: row.max_uses,
            current_uses: row.current_uses,
            created_at: Timestamp::from_datetime(row.created_at),
        })
    }
}

fn db_error(context: &str, e: sqlx::Error) -> DomainError {
    DomainError::database(format!("{}: {}", context, e))
}

fn duplicate_code(e: sqlx::Error) -> DomainError {
    if let sqlx::Error::Database(db) = &e {
        if db.constraint() == Some("coupons_code_key") {
            return DomainError::new(ErrorCode::ValidationFailed, "Coupon code already exists");
        }
    }
    db_error("Failed to write coupon", e)
}

#[async_trait]
impl CouponRepository for PostgresCouponRepository {
    async fn insert(&self, coupon: &Coupon) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO coupons (
                id, code, discount_kind, discount_value, valid_from, valid_to,
                is_active, max_uses, current_uses, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(coupon.id.as_uuid())
        .bind(&coupon.code)
        .bind(coupon.discount.kind())
        .bind(coupon.discount.value())
        .bind(coupon.valid_from.as_datetime())
        .bind(coupon.valid_to.as_datetime())
        .bind(coupon.is_active)
        .bind(coupon.max_uses)
        .bind(coupon.current_uses)
        .bind(coupon.created_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(duplicate_code)?;

        Ok(())
    }

    async fn update(&self, coupon: &Coupon) -> Result<(), DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE coupons SET
                code = $2, discount_kind = $3, discount_value = $4,
                valid_from = $5, valid_to = $6, is_active = $7, max_uses = $8
            WHERE id = $1
            "#,
        )
        .bind(coupon.id.as_uuid())
        .bind(&coupon.code)
        .bind(coupon.discount.kind())
        .bind(coupon.discount.value())
        .bind(coupon.valid_from.as_datetime())
        .bind(coupon.valid_to.as_datetime())
        .bind(coupon.is_active)
        .bind(coupon.max_uses)
        .execute(&self.pool)
        .await
        .map_err(duplicate_code)?;

        if result.rows_affected() == 0 {
            return Err(DomainError::new(
                ErrorCode::CouponNotFound,
                "Coupon not found",
            ));
        }
        Ok(())
    }

    async fn delete(&self, id: &CouponId) -> Result<(), DomainError> {
        let result = sqlx::query("DELETE FROM coupons WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("Failed to delete coupon", e))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::new(
                ErrorCode::CouponNotFound,
                "Coupon not found",
            ));
        }
        Ok(())
    }

    async fn find_by_id(&self, id: &CouponId) -> Result<Option<Coupon>, DomainError> {
        let row: Option<CouponRow> = sqlx::query_as(&format!(
            "SELECT {} FROM coupons WHERE id = $1",
            COUPON_COLUMNS
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("Failed to find coupon", e))?;

        row.map(Coupon::try_from).transpose()
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<Coupon>, DomainError> {
        let row: Option<CouponRow> = sqlx::query_as(&format!(
            "SELECT {} FROM coupons WHERE code = $1",
            COUPON_COLUMNS
        ))
        .bind(code)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("Failed to find coupon by code", e))?;

        row.map(Coupon::try_from).transpose()
    }

    async fn list(&self) -> Result<Vec<Coupon>, DomainError> {
        let rows: Vec<CouponRow> = sqlx::query_as(&format!(
            "SELECT {} FROM coupons ORDER BY created_at DESC",
            COUPON_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("Failed to list coupons", e))?;

        rows.into_iter().map(Coupon::try_from).collect()
    }

    async fn increment_uses(&self, code: &str) -> Result<bool, DomainError> {
        // Atomic capped increment; the WHERE clause is the guard.
        let result = sqlx::query(
            r#"
            UPDATE coupons
            SET current_uses = current_uses + 1
            WHERE code = $1
              AND (max_uses IS NULL OR current_uses < max_uses)
            "#,
        )
        .bind(code)
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("Failed to increment coupon uses", e))?;

        Ok(result.rows_affected() == 1)
    }
}
