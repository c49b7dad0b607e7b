//! Administrative coupon management.

use std::sync::Arc;

use crate::domain::coupon::{Coupon, Discount};
use crate::domain::foundation::{CouponId, DomainError, ErrorCode, Timestamp};
use crate::ports::CouponRepository;

#[derive(Debug, Clone)]
pub struct CreateCouponCommand {
    pub code: String,
    pub discount: Discount,
    pub valid_to: Timestamp,
    pub is_active: bool,
    pub max_uses: Option<i64>,
}

/// Partial update; absent fields keep their stored value. `max_uses` is
/// doubly optional so a cap can be removed.
#[derive(Debug, Clone, Default)]
pub struct UpdateCouponCommand {
    pub discount: Option<Discount>,
    pub valid_to: Option<Timestamp>,
    pub is_active: Option<bool>,
    pub max_uses: Option<Option<i64>>,
}

pub struct CouponAdmin {
    coupons: Arc<dyn CouponRepository>,
}

impl CouponAdmin {
    pub fn new(coupons: Arc<dyn CouponRepository>) -> Self {
        Self { coupons }
    }

    pub async fn create(&self, command: CreateCouponCommand) -> Result<Coupon, DomainError> {
        let coupon = Coupon::new(
            &command.code,
            command.discount,
            command.valid_to,
            command.is_active,
            command.max_uses,
        )?;
        self.coupons.insert(&coupon).await?;
        tracing::info!(code = %coupon.code, "Coupon created");
        Ok(coupon)
    }

    pub async fn list(&self) -> Result<Vec<Coupon>, DomainError> {
        self.coupons.list().await
    }

    pub async fn update(
        &self,
        id: &CouponId,
        command: UpdateCouponCommand,
    ) -> Result<Coupon, DomainError> {
        let mut coupon = self.require(id).await?;

        if let Some(discount) = command.discount {
            coupon.discount = discount;
        }
        if let Some(valid_to) = command.valid_to {
            coupon.valid_to = valid_to;
        }
        if let Some(is_active) = command.is_active {
            coupon.is_active = is_active;
        }
        if let Some(max_uses) = command.max_uses {
            if let Some(cap) = max_uses {
                if cap <= 0 {
                    return Err(DomainError::new(
                        ErrorCode::ValidationFailed,
                        "max_uses must be positive when set",
                    ));
                }
                if cap < coupon.current_uses {
                    return Err(DomainError::new(
                        ErrorCode::ValidationFailed,
                        "max_uses cannot be lower than recorded uses",
                    ));
                }
            }
            coupon.max_uses = max_uses;
        }

        self.coupons.update(&coupon).await?;
        tracing::info!(code = %coupon.code, "Coupon updated");
        Ok(coupon)
    }

    pub async fn delete(&self, id: &CouponId) -> Result<(), DomainError> {
        self.coupons.delete(id).await?;
        tracing::info!(coupon_id = %id, "Coupon deleted");
        Ok(())
    }

    async fn require(&self, id: &CouponId) -> Result<Coupon, DomainError> {
        self.coupons
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::new(ErrorCode::CouponNotFound, "Coupon not found"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryCouponRepository;

    fn admin() -> (CouponAdmin, Arc<InMemoryCouponRepository>) {
        let coupons = Arc::new(InMemoryCouponRepository::new());
        (CouponAdmin::new(coupons.clone()), coupons)
    }

    fn create_command(code: &str) -> CreateCouponCommand {
        CreateCouponCommand {
            code: code.to_string(),
            discount: Discount::from_parts("percentage", 15.0).unwrap(),
            valid_to: Timestamp::now().add_days(30),
            is_active: true,
            max_uses: Some(100),
        }
    }

    #[tokio::test]
    async fn create_normalizes_and_rejects_duplicates() {
        let (admin, _) = admin();
        let created = admin.create(create_command("welcome15")).await.unwrap();
        assert_eq!(created.code, "WELCOME15");
        assert_eq!(created.current_uses, 0);

        let err = admin.create(create_command("WELCOME15")).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationFailed);
    }

    #[tokio::test]
    async fn update_applies_only_the_given_fields() {
        let (admin, _) = admin();
        let created = admin.create(create_command("WELCOME15")).await.unwrap();

        let updated = admin
            .update(
                &created.id,
                UpdateCouponCommand {
                    is_active: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(!updated.is_active);
        assert_eq!(updated.discount, created.discount);
        assert_eq!(updated.max_uses, Some(100));

        let uncapped = admin
            .update(
                &created.id,
                UpdateCouponCommand {
                    max_uses: Some(None),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(uncapped.max_uses, None);
    }

    #[tokio::test]
    async fn update_rejects_caps_below_recorded_uses() {
        let (admin, coupons) = admin();
        let created = admin.create(create_command("WELCOME15")).await.unwrap();
        for _ in 0..3 {
            assert!(coupons.increment_uses("WELCOME15").await.unwrap());
        }

        let err = admin
            .update(
                &created.id,
                UpdateCouponCommand {
                    max_uses: Some(Some(2)),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationFailed);
    }

    #[tokio::test]
    async fn delete_and_missing_lookups_report_not_found() {
        let (admin, _) = admin();
        let created = admin.create(create_command("WELCOME15")).await.unwrap();

        admin.delete(&created.id).await.unwrap();
        let err = admin.delete(&created.id).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::CouponNotFound);

        let err = admin
            .update(&created.id, UpdateCouponCommand::default())
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::CouponNotFound);
    }
}
