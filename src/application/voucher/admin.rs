//! Administrative gift card operations.
//!
//! Authorization happens at the transport layer; once a call lands here it
//! is trusted.

use std::sync::Arc;

use crate::domain::foundation::{DomainError, ErrorCode, Timestamp, VoucherId};
use crate::domain::voucher::{Voucher, VoucherStatus};
use crate::ports::{VoucherNotifier, VoucherRepository};

pub struct VoucherAdmin {
    vouchers: Arc<dyn VoucherRepository>,
    notifier: Arc<dyn VoucherNotifier>,
}

impl VoucherAdmin {
    pub fn new(vouchers: Arc<dyn VoucherRepository>, notifier: Arc<dyn VoucherNotifier>) -> Self {
        Self { vouchers, notifier }
    }

    pub async fn list(&self) -> Result<Vec<Voucher>, DomainError> {
        self.vouchers.list().await
    }

    pub async fn get(&self, voucher_id: &VoucherId) -> Result<Voucher, DomainError> {
        self.require(voucher_id).await
    }

    /// Removes an abandoned purchase. Only `pending` vouchers are deletable;
    /// anything later in the lifecycle is part of the financial record.
    pub async fn delete(&self, voucher_id: &VoucherId) -> Result<(), DomainError> {
        let deleted = self.vouchers.delete_if_pending(voucher_id).await?;
        if !deleted {
            return Err(DomainError::state_conflict(
                "Can only delete pending gift cards",
            ));
        }
        tracing::info!(%voucher_id, "Pending gift card deleted");
        Ok(())
    }

    /// Pushes the expiry horizon out to a new date.
    pub async fn extend_expiry(
        &self,
        voucher_id: &VoucherId,
        new_expiry: Timestamp,
    ) -> Result<Voucher, DomainError> {
        let voucher = self.require(voucher_id).await?;
        if voucher.expires_at.is_none() {
            return Err(DomainError::state_conflict(
                "Gift card has no expiry to extend",
            ));
        }
        if new_expiry.is_past() {
            return Err(DomainError::new(
                ErrorCode::ValidationFailed,
                "New expiry must be in the future",
            ));
        }
        self.vouchers.set_expires_at(voucher_id, new_expiry).await?;
        tracing::info!(%voucher_id, new_expiry = %new_expiry, "Gift card expiry extended");
        self.require(voucher_id).await
    }

    pub async fn update_recipient(
        &self,
        voucher_id: &VoucherId,
        recipient_name: &str,
    ) -> Result<Voucher, DomainError> {
        let trimmed = recipient_name.trim();
        if trimmed.is_empty() {
            return Err(DomainError::new(
                ErrorCode::ValidationFailed,
                "Recipient name must not be empty",
            ));
        }
        self.require(voucher_id).await?;
        self.vouchers.set_recipient(voucher_id, trimmed).await?;
        self.require(voucher_id).await
    }

    /// Blind status override for support interventions.
    ///
    /// Transitions that would leave a codeless voucher in a code-bearing
    /// state are refused; activation mints codes, this does not.
    pub async fn force_status(
        &self,
        voucher_id: &VoucherId,
        status: VoucherStatus,
    ) -> Result<Voucher, DomainError> {
        let voucher = self.require(voucher_id).await?;
        if status.has_code() && voucher.code.is_none() {
            return Err(DomainError::state_conflict(
                "Gift card has no code; use activation instead",
            ));
        }
        self.vouchers.set_status(voucher_id, status).await?;
        tracing::warn!(%voucher_id, from = %voucher.status, to = %status, "Gift card status forced");
        self.require(voucher_id).await
    }

    /// Re-sends the issuance notification for an already issued gift card.
    pub async fn resend_notification(&self, voucher_id: &VoucherId) -> Result<(), DomainError> {
        let voucher = self.require(voucher_id).await?;
        if voucher.code.is_none() {
            return Err(DomainError::state_conflict(
                "Gift card has not been issued yet",
            ));
        }
        self.notifier.send_issued(&voucher).await.map_err(|err| {
            DomainError::new(ErrorCode::UpstreamUnavailable, err.to_string())
        })?;
        tracing::info!(%voucher_id, "Gift card notification re-sent");
        Ok(())
    }

    async fn require(&self, voucher_id: &VoucherId) -> Result<Voucher, DomainError> {
        self.vouchers
            .find_by_id(voucher_id)
            .await?
            .ok_or_else(|| DomainError::new(ErrorCode::VoucherNotFound, "Gift card not found"))
    }
}
