//! In-memory voucher repository.
//!
//! Activation assigns code, expiry, and status in one lock hold, so any
//! reader after a lost activation race observes the fully activated record.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::foundation::{DomainError, ErrorCode, Timestamp, VoucherId};
use crate::domain::voucher::{Voucher, VoucherStatus};
use crate::ports::{ActivationOutcome, VoucherRepository};

/// In-memory storage for vouchers.
#[derive(Debug, Clone, Default)]
pub struct InMemoryVoucherRepository {
    vouchers: Arc<RwLock<HashMap<VoucherId, Voucher>>>,
}

impl InMemoryVoucherRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn not_found() -> DomainError {
    DomainError::new(ErrorCode::VoucherNotFound, "Gift card not found")
}

#[async_trait]
impl VoucherRepository for InMemoryVoucherRepository {
    async fn insert(&self, voucher: &Voucher) -> Result<(), DomainError> {
        let mut vouchers = self.vouchers.write().await;
        vouchers.insert(voucher.id, voucher.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &VoucherId) -> Result<Option<Voucher>, DomainError> {
        let vouchers = self.vouchers.read().await;
        Ok(vouchers.get(id).cloned())
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<Voucher>, DomainError> {
        let vouchers = self.vouchers.read().await;
        Ok(vouchers
            .values()
            .find(|v| v.code.as_deref() == Some(code))
            .cloned())
    }

    async fn list(&self) -> Result<Vec<Voucher>, DomainError> {
        let vouchers = self.vouchers.read().await;
        let mut all: Vec<Voucher> = vouchers.values().cloned().collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(all)
    }

    async fn search_by_name(&self, query: &str) -> Result<Vec<Voucher>, DomainError> {
        let needle = query.to_lowercase();
        let vouchers = self.vouchers.read().await;
        let mut matches: Vec<Voucher> = vouchers
            .values()
            .filter(|v| {
                v.recipient_name
                    .as_deref()
                    .map_or(false, |name| name.to_lowercase().contains(&needle))
                    || v.buyer.first_name.to_lowercase().contains(&needle)
                    || v.buyer.last_name.to_lowercase().contains(&needle)
            })
            .cloned()
            .collect();
        matches.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        matches.truncate(100);
        Ok(matches)
    }

    async fn attach_session(&self, id: &VoucherId, session_id: &str) -> Result<(), DomainError> {
        let mut vouchers = self.vouchers.write().await;
        let voucher = vouchers.get_mut(id).ok_or_else(not_found)?;
        voucher.session_id = Some(session_id.to_string());
        Ok(())
    }

    async fn activate_if_pending(
        &self,
        id: &VoucherId,
        code: &str,
        expires_at: Timestamp,
    ) -> Result<ActivationOutcome, DomainError> {
        let mut vouchers = self.vouchers.write().await;
        if vouchers
            .values()
            .any(|v| v.code.as_deref() == Some(code))
        {
            return Ok(ActivationOutcome::CodeTaken);
        }
        match vouchers.get_mut(id) {
            Some(voucher) if voucher.status == VoucherStatus::Pending => {
                voucher.code = Some(code.to_string());
                voucher.expires_at = Some(expires_at);
                voucher.status = VoucherStatus::Active;
                Ok(ActivationOutcome::Activated)
            }
            Some(_) => Ok(ActivationOutcome::NotPending),
            None => Err(not_found()),
        }
    }

    async fn redeem_if_active(
        &self,
        id: &VoucherId,
        redeemed_at: Timestamp,
    ) -> Result<bool, DomainError> {
        let mut vouchers = self.vouchers.write().await;
        match vouchers.get_mut(id) {
            Some(voucher) if voucher.status == VoucherStatus::Active => {
                voucher.status = VoucherStatus::Redeemed;
                voucher.redeemed_at = Some(redeemed_at);
                Ok(true)
            }
            Some(_) => Ok(false),
            None => Err(not_found()),
        }
    }

    async fn expire_if_active(&self, id: &VoucherId) -> Result<bool, DomainError> {
        let mut vouchers = self.vouchers.write().await;
        match vouchers.get_mut(id) {
            Some(voucher) if voucher.status == VoucherStatus::Active => {
                voucher.status = VoucherStatus::Expired;
                Ok(true)
            }
            Some(_) => Ok(false),
            None => Err(not_found()),
        }
    }

    async fn delete_if_pending(&self, id: &VoucherId) -> Result<bool, DomainError> {
        let mut vouchers = self.vouchers.write().await;
        match vouchers.get(id) {
            Some(voucher) if voucher.status == VoucherStatus::Pending => {
                vouchers.remove(id);
                Ok(true)
            }
            Some(_) => Ok(false),
            None => Err(not_found()),
        }
    }

    async fn set_status(&self, id: &VoucherId, status: VoucherStatus) -> Result<(), DomainError> {
        let mut vouchers = self.vouchers.write().await;
        let voucher = vouchers.get_mut(id).ok_or_else(not_found)?;
        voucher.status = status;
        Ok(())
    }

    async fn set_expires_at(
        &self,
        id: &VoucherId,
        expires_at: Timestamp,
    ) -> Result<(), DomainError> {
        let mut vouchers = self.vouchers.write().await;
        let voucher = vouchers.get_mut(id).ok_or_else(not_found)?;
        voucher.expires_at = Some(expires_at);
        Ok(())
    }

    async fn set_recipient(
        &self,
        id: &VoucherId,
        recipient_name: &str,
    ) -> Result<(), DomainError> {
        let mut vouchers = self.vouchers.write().await;
        let voucher = vouchers.get_mut(id).ok_or_else(not_found)?;
        voucher.recipient_name = Some(recipient_name.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::Money;
    use crate::domain::voucher::BuyerInfo;

    fn pending_voucher() -> Voucher {
        Voucher::open_pending(
            BuyerInfo::new("Marie", "Dupont", "marie@example.com", "06").unwrap(),
            Money::from_cents(5000),
            Money::from_cents(5000),
            None,
            None,
        )
    }

    #[tokio::test]
    async fn activation_is_a_single_transition() {
        let repo = InMemoryVoucherRepository::new();
        let voucher = pending_voucher();
        repo.insert(&voucher).await.unwrap();

        let expires = Timestamp::now().add_days(730);
        assert_eq!(
            repo.activate_if_pending(&voucher.id, "LB-AAAA-0001", expires)
                .await
                .unwrap(),
            ActivationOutcome::Activated
        );
        assert_eq!(
            repo.activate_if_pending(&voucher.id, "LB-BBBB-0002", expires)
                .await
                .unwrap(),
            ActivationOutcome::NotPending
        );

        let stored = repo.find_by_id(&voucher.id).await.unwrap().unwrap();
        assert_eq!(stored.code.as_deref(), Some("LB-AAAA-0001"));
        assert_eq!(stored.status, VoucherStatus::Active);
        assert!(stored.code_invariant_holds());
    }

    #[tokio::test]
    async fn duplicate_code_is_reported_as_collision() {
        let repo = InMemoryVoucherRepository::new();
        let first = pending_voucher();
        let second = pending_voucher();
        repo.insert(&first).await.unwrap();
        repo.insert(&second).await.unwrap();

        let expires = Timestamp::now().add_days(730);
        repo.activate_if_pending(&first.id, "LB-SAME-CODE", expires)
            .await
            .unwrap();
        assert_eq!(
            repo.activate_if_pending(&second.id, "LB-SAME-CODE", expires)
                .await
                .unwrap(),
            ActivationOutcome::CodeTaken
        );
    }

    #[tokio::test]
    async fn delete_only_removes_pending() {
        let repo = InMemoryVoucherRepository::new();
        let voucher = pending_voucher();
        repo.insert(&voucher).await.unwrap();

        repo.activate_if_pending(&voucher.id, "LB-AAAA-0001", Timestamp::now().add_days(1))
            .await
            .unwrap();
        assert!(!repo.delete_if_pending(&voucher.id).await.unwrap());

        let still_there = repo.find_by_id(&voucher.id).await.unwrap();
        assert!(still_there.is_some());
    }

    #[tokio::test]
    async fn name_search_matches_recipient_and_buyer_case_insensitively() {
        let repo = InMemoryVoucherRepository::new();
        let mut for_claire = pending_voucher();
        for_claire.recipient_name = Some("Claire Martin".to_string());
        repo.insert(&for_claire).await.unwrap();
        repo.insert(&pending_voucher()).await.unwrap();

        let by_recipient = repo.search_by_name("claire").await.unwrap();
        assert_eq!(by_recipient.len(), 1);
        assert_eq!(by_recipient[0].id, for_claire.id);

        // Buyer last name matches both seeded vouchers.
        let by_buyer = repo.search_by_name("DUPONT").await.unwrap();
        assert_eq!(by_buyer.len(), 2);

        assert!(repo.search_by_name("nobody").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn redeem_requires_active() {
        let repo = InMemoryVoucherRepository::new();
        let voucher = pending_voucher();
        repo.insert(&voucher).await.unwrap();

        assert!(!repo
            .redeem_if_active(&voucher.id, Timestamp::now())
            .await
            .unwrap());

        repo.activate_if_pending(&voucher.id, "LB-AAAA-0001", Timestamp::now().add_days(1))
            .await
            .unwrap();
        assert!(repo
            .redeem_if_active(&voucher.id, Timestamp::now())
            .await
            .unwrap());
    }
}
