//! Voucher repository port.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, Timestamp, VoucherId};
use crate::domain::voucher::{Voucher, VoucherStatus};

/// Outcome of the activation compare-and-set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivationOutcome {
    /// This call activated the voucher and assigned the code.
    Activated,
    /// The voucher is not `pending`; the caller should re-read and treat
    /// the existing record as the activation result.
    NotPending,
    /// The proposed code collided with the unique index; retry with a
    /// freshly minted code.
    CodeTaken,
}

/// Persistent storage for vouchers.
///
/// Lifecycle transitions are compare-and-set against the current status.
/// The `code` column carries a unique index; `activate_if_pending` surfaces
/// collisions so the caller can retry with a new code.
#[async_trait]
pub trait VoucherRepository: Send + Sync {
    async fn insert(&self, voucher: &Voucher) -> Result<(), DomainError>;

    async fn find_by_id(&self, id: &VoucherId) -> Result<Option<Voucher>, DomainError>;

    async fn find_by_code(&self, code: &str) -> Result<Option<Voucher>, DomainError>;

    /// All vouchers, newest first.
    async fn list(&self) -> Result<Vec<Voucher>, DomainError>;

    /// Case-insensitive substring match over recipient and buyer names,
    /// newest first, capped at 100 rows.
    async fn search_by_name(&self, query: &str) -> Result<Vec<Voucher>, DomainError>;

    /// Stores the gateway session id on the voucher.
    async fn attach_session(&self, id: &VoucherId, session_id: &str) -> Result<(), DomainError>;

    /// Compare-and-set `pending -> active`, assigning the code and expiry in
    /// the same conditional update.
    async fn activate_if_pending(
        &self,
        id: &VoucherId,
        code: &str,
        expires_at: Timestamp,
    ) -> Result<ActivationOutcome, DomainError>;

    /// Compare-and-set `active -> redeemed`, stamping the redemption time.
    /// Returns false if the voucher was not active.
    async fn redeem_if_active(
        &self,
        id: &VoucherId,
        redeemed_at: Timestamp,
    ) -> Result<bool, DomainError>;

    /// Compare-and-set `active -> expired` (the lazy flip on verification).
    async fn expire_if_active(&self, id: &VoucherId) -> Result<bool, DomainError>;

    /// Deletes the voucher only while still `pending`. Returns whether a
    /// row was deleted.
    async fn delete_if_pending(&self, id: &VoucherId) -> Result<bool, DomainError>;

    /// Administrative blind status write (gated upstream by authorization).
    async fn set_status(&self, id: &VoucherId, status: VoucherStatus) -> Result<(), DomainError>;

    /// Administrative expiry extension.
    async fn set_expires_at(&self, id: &VoucherId, expires_at: Timestamp)
        -> Result<(), DomainError>;

    /// Administrative recipient update.
    async fn set_recipient(&self, id: &VoucherId, recipient_name: &str)
        -> Result<(), DomainError>;
}
