//! Coupon repository port.

use async_trait::async_trait;

use crate::domain::coupon::Coupon;
use crate::domain::foundation::{CouponId, DomainError};

/// Persistent storage for coupon definitions.
///
/// `increment_uses` is the load-bearing operation: it must be a single
/// atomic increment at the storage layer, guarded by the usage cap, so
/// concurrent finalizations of different reservations never lose updates
/// and never push `current_uses` past `max_uses`.
#[async_trait]
pub trait CouponRepository: Send + Sync {
    /// Inserts a new coupon. Fails if the normalized code already exists.
    async fn insert(&self, coupon: &Coupon) -> Result<(), DomainError>;

    /// Replaces the stored definition (admin update).
    async fn update(&self, coupon: &Coupon) -> Result<(), DomainError>;

    /// Deletes a coupon definition.
    async fn delete(&self, id: &CouponId) -> Result<(), DomainError>;

    async fn find_by_id(&self, id: &CouponId) -> Result<Option<Coupon>, DomainError>;

    /// Lookup by normalized (uppercase) code.
    async fn find_by_code(&self, code: &str) -> Result<Option<Coupon>, DomainError>;

    /// All coupons, newest first.
    async fn list(&self) -> Result<Vec<Coupon>, DomainError>;

    /// Atomically increments `current_uses` by one, unless the cap is
    /// already reached. Returns whether a row was incremented.
    async fn increment_uses(&self, code: &str) -> Result<bool, DomainError>;
}
