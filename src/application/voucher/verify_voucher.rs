//! Public gift card verification by code.

use std::sync::Arc;

use crate::domain::foundation::{DomainError, ErrorCode};
use crate::domain::voucher::Voucher;
use crate::ports::VoucherRepository;

/// Looks up a gift card by its printed code.
///
/// Expiry is lazy: an `active` voucher whose horizon has passed is flipped
/// to `expired` here, durably, before being returned.
pub struct VerifyVoucher {
    vouchers: Arc<dyn VoucherRepository>,
}

impl VerifyVoucher {
    pub fn new(vouchers: Arc<dyn VoucherRepository>) -> Self {
        Self { vouchers }
    }

    pub async fn execute(&self, code: &str) -> Result<Voucher, DomainError> {
        let normalized = code.trim().to_uppercase();
        let voucher = self
            .vouchers
            .find_by_code(&normalized)
            .await?
            .ok_or_else(|| DomainError::new(ErrorCode::VoucherNotFound, "Gift card not found"))?;

        if voucher.is_past_expiry() {
            let flipped = self.vouchers.expire_if_active(&voucher.id).await?;
            if flipped {
                tracing::info!(voucher_id = %voucher.id, "Gift card expired on verification");
            }
            return self
                .vouchers
                .find_by_id(&voucher.id)
                .await?
                .ok_or_else(|| DomainError::new(ErrorCode::VoucherNotFound, "Gift card not found"));
        }

        Ok(voucher)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryVoucherRepository;
    use crate::domain::foundation::{Money, Timestamp};
    use crate::domain::voucher::{BuyerInfo, VoucherStatus};

    async fn seed_active(
        vouchers: &InMemoryVoucherRepository,
        code: &str,
        expires_at: Timestamp,
    ) -> Voucher {
        let mut voucher = Voucher::open_pending(
            BuyerInfo::new("Marie", "Dupont", "marie@example.com", "0601020304").unwrap(),
            Money::from_cents(5000),
            Money::from_cents(5000),
            None,
            None,
        );
        voucher.status = VoucherStatus::Active;
        voucher.code = Some(code.to_string());
        voucher.expires_at = Some(expires_at);
        vouchers.insert(&voucher).await.unwrap();
        voucher
    }

    #[tokio::test]
    async fn finds_active_vouchers_case_insensitively() {
        let vouchers = Arc::new(InMemoryVoucherRepository::new());
        seed_active(&vouchers, "LB-A2C4-E6G8", Timestamp::now().add_days(30)).await;

        let handler = VerifyVoucher::new(vouchers);
        let found = handler.execute("  lb-a2c4-e6g8 ").await.unwrap();
        assert_eq!(found.status, VoucherStatus::Active);
    }

    #[tokio::test]
    async fn expired_flip_is_persisted() {
        let vouchers = Arc::new(InMemoryVoucherRepository::new());
        let voucher = seed_active(&vouchers, "LB-A2C4-E6G8", Timestamp::now().add_days(-1)).await;

        let handler = VerifyVoucher::new(vouchers.clone());
        let found = handler.execute("LB-A2C4-E6G8").await.unwrap();
        assert_eq!(found.status, VoucherStatus::Expired);

        let stored = vouchers.find_by_id(&voucher.id).await.unwrap().unwrap();
        assert_eq!(stored.status, VoucherStatus::Expired);
    }

    #[tokio::test]
    async fn unknown_code_is_not_found() {
        let handler = VerifyVoucher::new(Arc::new(InMemoryVoucherRepository::new()));
        let err = handler.execute("LB-NOPE-NOPE").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::VoucherNotFound);
    }
}
