//! Webhook intake: verify, record, acknowledge.
//!
//! The webhook path deliberately does the minimum durable work. It flips the
//! transaction to paid and stops; the settlement side effects happen on the
//! next status read so that polling and webhook delivery share one
//! idempotent code path.

use std::sync::Arc;

use crate::domain::foundation::DomainError;
use crate::ports::{GatewayEventType, PaymentGateway, TransactionRepository};

pub struct ProcessWebhook {
    transactions: Arc<dyn TransactionRepository>,
    gateway: Arc<dyn PaymentGateway>,
}

impl ProcessWebhook {
    pub fn new(
        transactions: Arc<dyn TransactionRepository>,
        gateway: Arc<dyn PaymentGateway>,
    ) -> Self {
        Self {
            transactions,
            gateway,
        }
    }

    /// Verifies the signed payload and records the event.
    ///
    /// Signature or payload failures are returned so the transport layer can
    /// answer 400 and have the gateway retry. An event for an unknown
    /// session is acknowledged anyway; redelivery would not help.
    pub async fn execute(&self, payload: &[u8], signature: &str) -> Result<(), DomainError> {
        let event = self.gateway.verify_webhook(payload, signature)?;

        match event.event_type {
            GatewayEventType::CheckoutSessionCompleted => {
                let Some(session_id) = event.session_id else {
                    tracing::warn!(event_id = %event.id, "Completed-checkout event without a session id");
                    return Ok(());
                };
                let flipped = self
                    .transactions
                    .mark_paid(&session_id, "complete")
                    .await?;
                if flipped {
                    tracing::info!(%session_id, event_id = %event.id, "Payment confirmed by webhook");
                } else {
                    tracing::debug!(%session_id, event_id = %event.id, "Webhook event was redundant");
                }
            }
            GatewayEventType::Unknown(kind) => {
                tracing::debug!(event_id = %event.id, kind, "Ignoring webhook event type");
            }
        }
        Ok(())
    }
}
