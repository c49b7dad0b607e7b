//! In-memory coupon repository.
//!
//! Backs tests and local development. The capped usage increment happens
//! under a single lock hold, matching the atomicity the Postgres adapter
//! gets from its guarded UPDATE.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::coupon::Coupon;
use crate::domain::foundation::{CouponId, DomainError, ErrorCode};
use crate::ports::CouponRepository;

/// In-memory storage for coupon definitions, keyed by normalized code.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCouponRepository {
    coupons: Arc<RwLock<HashMap<String, Coupon>>>,
}

impl InMemoryCouponRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CouponRepository for InMemoryCouponRepository {
    async fn insert(&self, coupon: &Coupon) -> Result<(), DomainError> {
        let mut coupons = self.coupons.write().await;
        if coupons.contains_key(&coupon.code) {
            return Err(DomainError::new(
                ErrorCode::ValidationFailed,
                "Coupon code already exists",
            ));
        }
        coupons.insert(coupon.code.clone(), coupon.clone());
        Ok(())
    }

    async fn update(&self, coupon: &Coupon) -> Result<(), DomainError> {
        let mut coupons = self.coupons.write().await;
        // The code may have been renamed; drop any entry carrying this id.
        coupons.retain(|_, c| c.id != coupon.id);
        if coupons.contains_key(&coupon.code) {
            return Err(DomainError::new(
                ErrorCode::ValidationFailed,
                "Coupon code already exists",
            ));
        }
        coupons.insert(coupon.code.clone(), coupon.clone());
        Ok(())
    }

    async fn delete(&self, id: &CouponId) -> Result<(), DomainError> {
        let mut coupons = self.coupons.write().await;
        let before = coupons.len();
        coupons.retain(|_, c| c.id != *id);
        if coupons.len() == before {
            return Err(DomainError::new(
                ErrorCode::CouponNotFound,
                "Coupon not found",
            ));
        }
        Ok(())
    }

    async fn find_by_id(&self, id: &CouponId) -> Result<Option<Coupon>, DomainError> {
        let coupons = self.coupons.read().await;
        Ok(coupons.values().find(|c| c.id == *id).cloned())
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<Coupon>, DomainError> {
        let coupons = self.coupons.read().await;
        Ok(coupons.get(code).cloned())
    }

    async fn list(&self) -> Result<Vec<Coupon>, DomainError> {
        let coupons = self.coupons.read().await;
        let mut all: Vec<Coupon> = coupons.values().cloned().collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(all)
    }

    async fn increment_uses(&self, code: &str) -> Result<bool, DomainError> {
        let mut coupons = self.coupons.write().await;
        match coupons.get_mut(code) {
            Some(coupon) if !coupon.usage_exhausted() => {
                coupon.current_uses += 1;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}
