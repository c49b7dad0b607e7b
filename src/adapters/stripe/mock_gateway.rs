//! Mock payment gateway for tests and local development.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::{Mutex, RwLock};

use crate::domain::payment::PaymentStatus;
use crate::ports::{
    CreateSessionRequest, GatewayError, GatewayEventType, GatewaySession, GatewayWebhookEvent,
    PaymentGateway, SessionStatus,
};

/// Signature every mock webhook call must carry.
pub const MOCK_WEBHOOK_SIGNATURE: &str = "mock-signature";

/// In-memory gateway that mints deterministic session ids and lets tests
/// drive the session lifecycle by hand.
pub struct MockGateway {
    sessions: Arc<RwLock<HashMap<String, SessionStatus>>>,
    requests: Mutex<Vec<CreateSessionRequest>>,
    counter: AtomicU64,
    fail_create: AtomicBool,
}

#[derive(Deserialize)]
struct MockEventPayload {
    id: String,
    #[serde(rename = "type")]
    event_type: String,
    session_id: Option<String>,
    #[serde(default)]
    created: i64,
}

impl MockGateway {
    pub fn new() -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            requests: Mutex::new(Vec::new()),
            counter: AtomicU64::new(0),
            fail_create: AtomicBool::new(false),
        }
    }

    /// Makes the next `create_checkout_session` calls fail.
    pub fn fail_next_creates(&self, fail: bool) {
        self.fail_create.store(fail, Ordering::SeqCst);
    }

    /// Marks a session as paid and complete, as Stripe would after a
    /// successful hosted checkout.
    pub async fn complete_session(&self, session_id: &str) {
        let mut sessions = self.sessions.write().await;
        if let Some(status) = sessions.get_mut(session_id) {
            status.payment_status = PaymentStatus::Paid;
            status.status = "complete".to_string();
        }
    }

    /// Marks a session as expired without payment.
    pub async fn expire_session(&self, session_id: &str) {
        let mut sessions = self.sessions.write().await;
        if let Some(status) = sessions.get_mut(session_id) {
            status.payment_status = PaymentStatus::Unpaid;
            status.status = "expired".to_string();
        }
    }

    /// All create requests seen so far, in order.
    pub async fn create_requests(&self) -> Vec<CreateSessionRequest> {
        self.requests.lock().await.clone()
    }
}

impl Default for MockGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PaymentGateway for MockGateway {
    async fn create_checkout_session(
        &self,
        request: CreateSessionRequest,
    ) -> Result<GatewaySession, GatewayError> {
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(GatewayError::provider("mock gateway configured to fail"));
        }

        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        let id = format!("cs_mock_{}", n);
        self.sessions.write().await.insert(
            id.clone(),
            SessionStatus {
                payment_status: PaymentStatus::Pending,
                status: "open".to_string(),
            },
        );
        self.requests.lock().await.push(request);

        Ok(GatewaySession {
            url: format!("https://checkout.mock.invalid/pay/{}", id),
            id,
        })
    }

    async fn fetch_session(&self, session_id: &str) -> Result<SessionStatus, GatewayError> {
        self.sessions
            .read()
            .await
            .get(session_id)
            .cloned()
            .ok_or_else(|| GatewayError::not_found(session_id))
    }

    fn verify_webhook(
        &self,
        payload: &[u8],
        signature: &str,
    ) -> Result<GatewayWebhookEvent, GatewayError> {
        if signature != MOCK_WEBHOOK_SIGNATURE {
            return Err(GatewayError::invalid_signature("bad mock signature"));
        }
        let parsed: MockEventPayload = serde_json::from_slice(payload)
            .map_err(|err| GatewayError::invalid_payload(err.to_string()))?;

        let event_type = match parsed.event_type.as_str() {
            "checkout.session.completed" => GatewayEventType::CheckoutSessionCompleted,
            other => GatewayEventType::Unknown(other.to_string()),
        };
        Ok(GatewayWebhookEvent {
            id: parsed.id,
            event_type,
            session_id: parsed.session_id,
            created_at: parsed.created,
        })
    }
}
