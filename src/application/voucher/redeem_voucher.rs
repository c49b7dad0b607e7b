//! Gift card redemption.

use std::sync::Arc;

use crate::domain::foundation::{DomainError, ErrorCode, Timestamp, VoucherId};
use crate::domain::voucher::{Voucher, VoucherStatus};
use crate::ports::VoucherRepository;

/// Marks an active gift card as redeemed, exactly once.
pub struct RedeemVoucher {
    vouchers: Arc<dyn VoucherRepository>,
}

impl RedeemVoucher {
    pub fn new(vouchers: Arc<dyn VoucherRepository>) -> Self {
        Self { vouchers }
    }

    pub async fn execute(&self, voucher_id: &VoucherId) -> Result<Voucher, DomainError> {
        let redeemed = self
            .vouchers
            .redeem_if_active(voucher_id, Timestamp::now())
            .await?;

        let voucher = self
            .vouchers
            .find_by_id(voucher_id)
            .await?
            .ok_or_else(|| DomainError::new(ErrorCode::VoucherNotFound, "Gift card not found"))?;

        if !redeemed {
            return Err(DomainError::state_conflict(format!(
                "Can only redeem active gift cards (current status: {})",
                voucher.status
            )));
        }

        tracing::info!(%voucher_id, "Gift card redeemed");
        Ok(voucher)
    }
}
