//! Outbound notification port.
//!
//! Delivery failures are soft: the orchestrator logs them and leaves the
//! financial state untouched; resend is a separate administrative action.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::voucher::Voucher;

/// Error from a notification delivery attempt.
#[derive(Debug, Clone, Error)]
#[error("Notification delivery failed: {0}")]
pub struct NotifyError(pub String);

/// Port for delivering the voucher to the buyer once it is issued.
#[async_trait]
pub trait VoucherNotifier: Send + Sync {
    /// Sends the issued voucher (code, amount, expiry) to the buyer.
    ///
    /// Callers must only invoke this with an activated voucher that carries
    /// a code.
    async fn send_issued(&self, voucher: &Voucher) -> Result<(), NotifyError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn voucher_notifier_is_object_safe() {
        fn _accepts_dyn(_notifier: &dyn VoucherNotifier) {}
    }
}
