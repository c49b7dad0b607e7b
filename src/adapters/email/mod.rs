//! Outbound email adapters.

mod resend_notifier;

pub use resend_notifier::{ResendConfig, ResendNotifier};

use async_trait::async_trait;

use crate::domain::voucher::Voucher;
use crate::ports::{NotifyError, VoucherNotifier};

/// Notifier that logs instead of sending. Used when no email provider is
/// configured.
pub struct NoopNotifier;

#[async_trait]
impl VoucherNotifier for NoopNotifier {
    async fn send_issued(&self, voucher: &Voucher) -> Result<(), NotifyError> {
        tracing::info!(
            voucher_id = %voucher.id,
            email = %voucher.buyer.email,
            "Email delivery disabled; skipping gift card notification"
        );
        Ok(())
    }
}
