//! Voucher activation: the pending -> active transition that assigns the
//! printable code.

use std::sync::Arc;

use crate::domain::codegen;
use crate::domain::foundation::{DomainError, ErrorCode, Timestamp, VoucherId};
use crate::domain::voucher::Voucher;
use crate::ports::{ActivationOutcome, VoucherNotifier, VoucherRepository};

/// Attempts to mint a unique voucher code before giving up.
const MAX_CODE_ATTEMPTS: usize = 5;

/// Activates a pending voucher, assigning a freshly minted code and the
/// expiry horizon. Idempotent: a voucher that is already past pending is
/// returned as-is and nothing is sent.
///
/// Used by payment confirmation and by the manual admin operation.
pub struct ActivateVoucher {
    vouchers: Arc<dyn VoucherRepository>,
    notifier: Arc<dyn VoucherNotifier>,
}

impl ActivateVoucher {
    pub fn new(vouchers: Arc<dyn VoucherRepository>, notifier: Arc<dyn VoucherNotifier>) -> Self {
        Self { vouchers, notifier }
    }

    pub async fn execute(&self, voucher_id: &VoucherId) -> Result<Voucher, DomainError> {
        for _ in 0..MAX_CODE_ATTEMPTS {
            let code = codegen::mint_voucher_code();
            let expires_at = Voucher::expiry_from(Timestamp::now());
            match self
                .vouchers
                .activate_if_pending(voucher_id, &code, expires_at)
                .await?
            {
                ActivationOutcome::Activated => {
                    let voucher = self.reload(voucher_id).await?;
                    // Delivery failure never rolls the activation back.
                    match self.notifier.send_issued(&voucher).await {
                        Ok(()) => {
                            tracing::info!(%voucher_id, "Voucher issued and notification sent");
                        }
                        Err(err) => {
                            tracing::error!(%voucher_id, error = %err, "Voucher notification failed");
                        }
                    }
                    return Ok(voucher);
                }
                ActivationOutcome::NotPending => {
                    // Another caller won the activation, or the voucher was
                    // never activatable; either way the stored record is the
                    // answer.
                    return self.reload(voucher_id).await;
                }
                ActivationOutcome::CodeTaken => continue,
            }
        }

        Err(DomainError::new(
            ErrorCode::InternalError,
            "Could not assign a unique voucher code",
        ))
    }

    async fn reload(&self, voucher_id: &VoucherId) -> Result<Voucher, DomainError> {
        self.vouchers
            .find_by_id(voucher_id)
            .await?
            .ok_or_else(|| DomainError::new(ErrorCode::VoucherNotFound, "Gift card not found"))
    }
}
