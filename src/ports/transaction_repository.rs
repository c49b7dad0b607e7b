//! Payment transaction repository port.

use async_trait::async_trait;

use crate::domain::foundation::DomainError;
use crate::domain::payment::{PaymentStatus, PaymentTransaction};

/// Persistent storage for payment transactions, keyed by the gateway's
/// session id.
#[async_trait]
pub trait TransactionRepository: Send + Sync {
    async fn insert(&self, transaction: &PaymentTransaction) -> Result<(), DomainError>;

    async fn find_by_session(
        &self,
        session_id: &str,
    ) -> Result<Option<PaymentTransaction>, DomainError>;

    /// Mirrors a non-paid gateway status (`pending` / `unpaid`) onto the
    /// local row. The `paid` transition must go through `mark_paid`.
    async fn record_gateway_status(
        &self,
        session_id: &str,
        payment_status: PaymentStatus,
        status: &str,
    ) -> Result<(), DomainError>;

    /// Compare-and-set `payment_status -> paid` (from any non-paid state),
    /// mirroring the gateway session status in the same update. Returns
    /// true only for the caller whose update performed the transition; the
    /// first observer of a paid session wins.
    async fn mark_paid(&self, session_id: &str, status: &str) -> Result<bool, DomainError>;
}
