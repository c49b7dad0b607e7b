//! PostgreSQL implementation of TransactionRepository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::coupon::{Discount, DiscountSnapshot};
use crate::domain::foundation::{DomainError, Money, Timestamp, TransactionId, VoucherId};
use crate::domain::payment::{PaymentStatus, PaymentTransaction};
use crate::ports::TransactionRepository;

pub struct PostgresTransactionRepository {
    pool: PgPool,
}

impl PostgresTransactionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const TRANSACTION_COLUMNS: &str = "id, session_id, voucher_id, amount_cents, \
     original_amount_cents, discount_coupon_code, discount_kind, discount_value, \
     discount_amount_off_cents, reservation_token, payment_status, status, created_at";

#[derive(Debug, sqlx::FromRow)]
struct TransactionRow {
    id: Uuid,
    session_id: String,
    voucher_id: Uuid,
    amount_cents: i64,
    original_amount_cents: i64,
    discount_coupon_code: Option<String>,
    discount_kind: Option<String>,
    discount_value: Option<f64>,
    discount_amount_off_cents: Option<i64>,
    reservation_token: Option<String>,
    payment_status: String,
    status: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<TransactionRow> for PaymentTransaction {
    type Error = DomainError;

    fn try_from(row: TransactionRow) -> Result<Self, Self::Error> {
        let discount = match (row.discount_coupon_code, row.discount_kind, row.discount_value) {
            (Some(coupon_code), Some(kind), Some(value)) => {
                let discount = Discount::from_parts(&kind, value)
                    .map_err(|e| DomainError::database(format!("Invalid stored discount: {}", e)))?;
                Some(DiscountSnapshot {
                    coupon_code,
                    discount,
                    amount_off: Money::from_cents(row.discount_amount_off_cents.unwrap_or(0)),
                })
            }
            _ => None,
        };

        Ok(PaymentTransaction {
            id: TransactionId::from_uuid(row.id),
            session_id: row.session_id,
            voucher_id: VoucherId::from_uuid(row.voucher_id),
            amount: Money::from_cents(row.amount_cents),
            original_amount: Money::from_cents(row.original_amount_cents),
            discount,
            reservation_token: row.reservation_token,
            payment_status: PaymentStatus::parse(&row.payment_status)?,
            status: row.status,
            created_at: Timestamp::from_datetime(row.created_at),
        })
    }
}

fn db_error(context: &str, e: sqlx::Error) -> DomainError {
    DomainError::database(format!("{}: {}", context, e))
}

#[async_trait]
impl TransactionRepository for PostgresTransactionRepository {
    async fn insert(&self, transaction: &PaymentTransaction) -> Result<(), DomainError> {
        let snapshot = transaction.discount.as_ref();
        sqlx::query(
            r#"
            INSERT INTO payment_transactions (
                id, session_id, voucher_id, amount_cents, original_amount_cents,
                discount_coupon_code, discount_kind, discount_value,
                discount_amount_off_cents, reservation_token,
                payment_status, status, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(transaction.id.as_uuid())
        .bind(&transaction.session_id)
        .bind(transaction.voucher_id.as_uuid())
        .bind(transaction.amount.cents())
        .bind(transaction.original_amount.cents())
        .bind(snapshot.map(|s| s.coupon_code.clone()))
        .bind(snapshot.map(|s| s.discount.kind()))
        .bind(snapshot.map(|s| s.discount.value()))
        .bind(snapshot.map(|s| s.amount_off.cents()))
        .bind(&transaction.reservation_token)
        .bind(transaction.payment_status.as_str())
        .bind(&transaction.status)
        .bind(transaction.created_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("Failed to insert transaction", e))?;

        Ok(())
    }

    async fn find_by_session(
        &self,
        session_id: &str,
    ) -> Result<Option<PaymentTransaction>, DomainError> {
        let row: Option<TransactionRow> = sqlx::query_as(&format!(
            "SELECT {} FROM payment_transactions WHERE session_id = $1",
            TRANSACTION_COLUMNS
        ))
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("Failed to find transaction", e))?;

        row.map(PaymentTransaction::try_from).transpose()
    }

    async fn record_gateway_status(
        &self,
        session_id: &str,
        payment_status: PaymentStatus,
        status: &str,
    ) -> Result<(), DomainError> {
        if payment_status == PaymentStatus::Paid {
            // Paid is only reachable through mark_paid.
            return Ok(());
        }
        sqlx::query(
            r#"
            UPDATE payment_transactions
            SET payment_status = $2, status = $3
            WHERE session_id = $1 AND payment_status != 'paid'
            "#,
        )
        .bind(session_id)
        .bind(payment_status.as_str())
        .bind(status)
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("Failed to record gateway status", e))?;

        Ok(())
    }

    async fn mark_paid(&self, session_id: &str, status: &str) -> Result<bool, DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE payment_transactions
            SET payment_status = 'paid', status = $2
            WHERE session_id = $1 AND payment_status != 'paid'
            "#,
        )
        .bind(session_id)
        .bind(status)
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("Failed to mark transaction paid", e))?;

        Ok(result.rows_affected() == 1)
    }
}
