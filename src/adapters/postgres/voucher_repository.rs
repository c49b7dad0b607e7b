//! PostgreSQL implementation of VoucherRepository.
//!
//! Every lifecycle transition is a conditional UPDATE guarded by the current
//! status; callers learn from `rows_affected` whether their compare-and-set
//! won. The unique index on `code` backs activation collision detection.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::foundation::{DomainError, ErrorCode, Money, Timestamp, VoucherId};
use crate::domain::voucher::{BuyerInfo, Voucher, VoucherStatus};
use crate::ports::{ActivationOutcome, VoucherRepository};

pub struct PostgresVoucherRepository {
    pool: PgPool,
}

impl PostgresVoucherRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const VOUCHER_COLUMNS: &str = "id, code, amount_cents, original_amount_cents, status, \
     buyer_first_name, buyer_last_name, buyer_email, buyer_phone, \
     recipient_name, personal_message, session_id, created_at, expires_at, redeemed_at";

/// Database row representation of a voucher.
#[derive(Debug, sqlx::FromRow)]
struct VoucherRow {
    id: Uuid,
    code: Option<String>,
    amount_cents: i64,
    original_amount_cents: i64,
    status: String,
    buyer_first_name: String,
    buyer_last_name: String,
    buyer_email: String,
    buyer_phone: String,
    recipient_name: Option<String>,
    personal_message: Option<String>,
    session_id: Option<String>,
    created_at: DateTime<Utc>,
    expires_at: Option<DateTime<Utc>>,
    redeemed_at: Option<DateTime<Utc>>,
}

impl TryFrom<VoucherRow> for Voucher {
    type Error = DomainError;

    fn try_from(row: VoucherRow) -> Result<Self, Self::Error> {
        let status = VoucherStatus::parse(&row.status)?;
        Ok(Voucher {
            id: VoucherId::from_uuid(row.id),
            code: row.code,
            amount: Money::from_cents(row.amount_cents),
            original_amount: Money::from_cents(row.original_amount_cents),
            status,
            buyer: BuyerInfo {
                first_name: row.buyer_first_name,
                last_name: row.buyer_last_name,
                email: row.buyer_email,
                phone: row.buyer_phone,
            },
            recipient_name: row.recipient_name,
            personal_message: row.personal_message,
            session_id: row.session_id,
            created_at: Timestamp::from_datetime(row.created_at),
            expires_at: row.expires_at.map(Timestamp::from_datetime),
            redeemed_at: row.redeemed_at.map(Timestamp::from_datetime),
        })
    }
}

fn db_error(context: &str, e: sqlx::Error) -> DomainError {
    DomainError::database(format!("{}: {}", context, e))
}

fn is_unique_violation(e: &sqlx::Error, constraint: &str) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.constraint() == Some(constraint))
}

#[async_trait]
impl VoucherRepository for PostgresVoucherRepository {
    async fn insert(&self, voucher: &Voucher) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO vouchers (
                id, code, amount_cents, original_amount_cents, status,
                buyer_first_name, buyer_last_name, buyer_email, buyer_phone,
                recipient_name, personal_message, session_id,
                created_at, expires_at, redeemed_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            "#,
        )
        .bind(voucher.id.as_uuid())
        .bind(&voucher.code)
        .bind(voucher.amount.cents())
        .bind(voucher.original_amount.cents())
        .bind(voucher.status.as_str())
        .bind(&voucher.buyer.first_name)
        .bind(&voucher.buyer.last_name)
        .bind(&voucher.buyer.email)
        .bind(&voucher.buyer.phone)
        .bind(&voucher.recipient_name)
        .bind(&voucher.personal_message)
        .bind(&voucher.session_id)
        .bind(voucher.created_at.as_datetime())
        .bind(voucher.expires_at.map(|t| *t.as_datetime()))
        .bind(voucher.redeemed_at.map(|t| *t.as_datetime()))
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("Failed to insert voucher", e))?;

        Ok(())
    }

    async fn find_by_id(&self, id: &VoucherId) -> Result<Option<Voucher>, DomainError> {
        let row: Option<VoucherRow> = sqlx::query_as(&format!(
            "SELECT {} FROM vouchers WHERE id = $1",
            VOUCHER_COLUMNS
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("Failed to find voucher", e))?;

        row.map(Voucher::try_from).transpose()
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<Voucher>, DomainError> {
        let row: Option<VoucherRow> = sqlx::query_as(&format!(
            "SELECT {} FROM vouchers WHERE code = $1",
            VOUCHER_COLUMNS
        ))
        .bind(code)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("Failed to find voucher by code", e))?;

        row.map(Voucher::try_from).transpose()
    }

    async fn list(&self) -> Result<Vec<Voucher>, DomainError> {
        let rows: Vec<VoucherRow> = sqlx::query_as(&format!(
            "SELECT {} FROM vouchers ORDER BY created_at DESC",
            VOUCHER_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("Failed to list vouchers", e))?;

        rows.into_iter().map(Voucher::try_from).collect()
    }

    async fn search_by_name(&self, query: &str) -> Result<Vec<Voucher>, DomainError> {
        let pattern = format!("%{}%", query);
        let rows: Vec<VoucherRow> = sqlx::query_as(&format!(
            "SELECT {} FROM vouchers \
             WHERE recipient_name ILIKE $1 \
                OR buyer_first_name ILIKE $1 \
                OR buyer_last_name ILIKE $1 \
             ORDER BY created_at DESC LIMIT 100",
            VOUCHER_COLUMNS
        ))
        .bind(pattern)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("Failed to search vouchers by name", e))?;

        rows.into_iter().map(Voucher::try_from).collect()
    }

    async fn attach_session(&self, id: &VoucherId, session_id: &str) -> Result<(), DomainError> {
        let result = sqlx::query("UPDATE vouchers SET session_id = $2 WHERE id = $1")
            .bind(id.as_uuid())
            .bind(session_id)
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("Failed to attach session", e))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::new(
                ErrorCode::VoucherNotFound,
                "Gift card not found",
            ));
        }
        Ok(())
    }

    async fn activate_if_pending(
        &self,
        id: &VoucherId,
        code: &str,
        expires_at: Timestamp,
    ) -> Result<ActivationOutcome, DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE vouchers
            SET code = $2, expires_at = $3, status = 'active'
            WHERE id = $1 AND status = 'pending'
            "#,
        )
        .bind(id.as_uuid())
        .bind(code)
        .bind(expires_at.as_datetime())
        .execute(&self.pool)
        .await;

        match result {
            Ok(done) if done.rows_affected() == 1 => Ok(ActivationOutcome::Activated),
            Ok(_) => {
                // Distinguish "not pending" from "no such voucher".
                let exists: Option<(Uuid,)> =
                    sqlx::query_as("SELECT id FROM vouchers WHERE id = $1")
                        .bind(id.as_uuid())
                        .fetch_optional(&self.pool)
                        .await
                        .map_err(|e| db_error("Failed to check voucher", e))?;
                if exists.is_some() {
                    Ok(ActivationOutcome::NotPending)
                } else {
                    Err(DomainError::new(
                        ErrorCode::VoucherNotFound,
                        "Gift card not found",
                    ))
                }
            }
            Err(e) if is_unique_violation(&e, "vouchers_code_key") => {
                Ok(ActivationOutcome::CodeTaken)
            }
            Err(e) => Err(db_error("Failed to activate voucher", e)),
        }
    }

    async fn redeem_if_active(
        &self,
        id: &VoucherId,
        redeemed_at: Timestamp,
    ) -> Result<bool, DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE vouchers
            SET status = 'redeemed', redeemed_at = $2
            WHERE id = $1 AND status = 'active'
            "#,
        )
        .bind(id.as_uuid())
        .bind(redeemed_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("Failed to redeem voucher", e))?;

        Ok(result.rows_affected() == 1)
    }

    async fn expire_if_active(&self, id: &VoucherId) -> Result<bool, DomainError> {
        let result = sqlx::query(
            "UPDATE vouchers SET status = 'expired' WHERE id = $1 AND status = 'active'",
        )
        .bind(id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("Failed to expire voucher", e))?;

        Ok(result.rows_affected() == 1)
    }

    async fn delete_if_pending(&self, id: &VoucherId) -> Result<bool, DomainError> {
        let result =
            sqlx::query("DELETE FROM vouchers WHERE id = $1 AND status = 'pending'")
                .bind(id.as_uuid())
                .execute(&self.pool)
                .await
                .map_err(|e| db_error("Failed to delete voucher", e))?;

        Ok(result.rows_affected() == 1)
    }

    async fn set_status(&self, id: &VoucherId, status: VoucherStatus) -> Result<(), DomainError> {
        let result = sqlx::query("UPDATE vouchers SET status = $2 WHERE id = $1")
            .bind(id.as_uuid())
            .bind(status.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("Failed to set voucher status", e))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::new(
                ErrorCode::VoucherNotFound,
                "Gift card not found",
            ));
        }
        Ok(())
    }

    async fn set_expires_at(
        &self,
        id: &VoucherId,
        expires_at: Timestamp,
    ) -> Result<(), DomainError> {
        let result = sqlx::query("UPDATE vouchers SET expires_at = $2 WHERE id = $1")
            .bind(id.as_uuid())
            .bind(expires_at.as_datetime())
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("Failed to set voucher expiry", e))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::new(
                ErrorCode::VoucherNotFound,
                "Gift card not found",
            ));
        }
        Ok(())
    }

    async fn set_recipient(
        &self,
        id: &VoucherId,
        recipient_name: &str,
    ) -> Result<(), DomainError> {
        let result = sqlx::query("UPDATE vouchers SET recipient_name = $2 WHERE id = $1")
            .bind(id.as_uuid())
            .bind(recipient_name)
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("Failed to set voucher recipient", e))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::new(
                ErrorCode::VoucherNotFound,
                "Gift card not found",
            ));
        }
        Ok(())
    }
}
