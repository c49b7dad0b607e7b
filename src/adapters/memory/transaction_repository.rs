//! In-memory payment transaction repository.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::foundation::{DomainError, ErrorCode};
use crate::domain::payment::{PaymentStatus, PaymentTransaction};
use crate::ports::TransactionRepository;

/// In-memory storage for payment transactions, keyed by session id.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTransactionRepository {
    transactions: Arc<RwLock<HashMap<String, PaymentTransaction>>>,
}

impl InMemoryTransactionRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TransactionRepository for InMemoryTransactionRepository {
    async fn insert(&self, transaction: &PaymentTransaction) -> Result<(), DomainError> {
        let mut transactions = self.transactions.write().await;
        if transactions.contains_key(&transaction.session_id) {
            return Err(DomainError::new(
                ErrorCode::InternalError,
                "Session id already recorded",
            ));
        }
        transactions.insert(transaction.session_id.clone(), transaction.clone());
        Ok(())
    }

    async fn find_by_session(
        &self,
        session_id: &str,
    ) -> Result<Option<PaymentTransaction>, DomainError> {
        let transactions = self.transactions.read().await;
        Ok(transactions.get(session_id).cloned())
    }

    async fn record_gateway_status(
        &self,
        session_id: &str,
        payment_status: PaymentStatus,
        status: &str,
    ) -> Result<(), DomainError> {
        let mut transactions = self.transactions.write().await;
        if let Some(tx) = transactions.get_mut(session_id) {
            // Paid is only reachable through mark_paid.
            if tx.payment_status != PaymentStatus::Paid && payment_status != PaymentStatus::Paid {
                tx.payment_status = payment_status;
                tx.status = status.to_string();
            }
        }
        Ok(())
    }

    async fn mark_paid(&self, session_id: &str, status: &str) -> Result<bool, DomainError> {
        let mut transactions = self.transactions.write().await;
        match transactions.get_mut(session_id) {
            Some(tx) if tx.payment_status != PaymentStatus::Paid => {
                tx.payment_status = PaymentStatus::Paid;
                tx.status = status.to_string();
                Ok(true)
            }
            Some(_) => Ok(false),
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{Money, VoucherId};

    fn transaction(session_id: &str) -> PaymentTransaction {
        PaymentTransaction::open(
            session_id,
            VoucherId::new(),
            Money::from_cents(4250),
            Money::from_cents(5000),
            None,
            None,
        )
    }

    #[tokio::test]
    async fn mark_paid_is_first_writer_wins() {
        let repo = InMemoryTransactionRepository::new();
        repo.insert(&transaction("cs_1")).await.unwrap();

        assert!(repo.mark_paid("cs_1", "complete").await.unwrap());
        assert!(!repo.mark_paid("cs_1", "complete").await.unwrap());

        let stored = repo.find_by_session("cs_1").await.unwrap().unwrap();
        assert!(stored.is_paid());
    }

    #[tokio::test]
    async fn record_gateway_status_never_downgrades_paid() {
        let repo = InMemoryTransactionRepository::new();
        repo.insert(&transaction("cs_1")).await.unwrap();
        repo.mark_paid("cs_1", "complete").await.unwrap();

        repo.record_gateway_status("cs_1", PaymentStatus::Unpaid, "expired")
            .await
            .unwrap();

        let stored = repo.find_by_session("cs_1").await.unwrap().unwrap();
        assert_eq!(stored.payment_status, PaymentStatus::Paid);
        assert_eq!(stored.status, "complete");
    }

    #[tokio::test]
    async fn duplicate_session_insert_is_rejected() {
        let repo = InMemoryTransactionRepository::new();
        repo.insert(&transaction("cs_1")).await.unwrap();
        assert!(repo.insert(&transaction("cs_1")).await.is_err());
    }
}
