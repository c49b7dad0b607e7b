//! The Coupon aggregate: a promotional discount rule.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{CouponId, DomainError, ErrorCode, Timestamp, ValidationError};

use super::Discount;

/// A promotional coupon giving a discount on gift card purchases.
///
/// `current_uses` counts completed purchases only; it is incremented exactly
/// once per finalized reservation, by an atomic increment at the storage
/// layer, and never exceeds `max_uses` when the cap is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coupon {
    pub id: CouponId,
    pub code: String,
    pub discount: Discount,
    pub valid_from: Timestamp,
    pub valid_to: Timestamp,
    pub is_active: bool,
    pub max_uses: Option<i64>,
    pub current_uses: i64,
    pub created_at: Timestamp,
}

impl Coupon {
    /// Creates a coupon with a normalized code.
    pub fn new(
        code: &str,
        discount: Discount,
        valid_to: Timestamp,
        is_active: bool,
        max_uses: Option<i64>,
    ) -> Result<Self, ValidationError> {
        let code = Self::normalize_code(code);
        if code.len() < 3 {
            return Err(ValidationError::invalid_format(
                "code",
                "must be at least 3 characters",
            ));
        }
        if let Some(cap) = max_uses {
            if cap <= 0 {
                return Err(ValidationError::invalid_format(
                    "max_uses",
                    "must be positive when set",
                ));
            }
        }
        Ok(Self {
            id: CouponId::new(),
            code,
            discount,
            valid_from: Timestamp::now(),
            valid_to,
            is_active,
            max_uses,
            current_uses: 0,
            created_at: Timestamp::now(),
        })
    }

    /// Coupon codes are case-insensitive; the uppercase form is canonical.
    pub fn normalize_code(code: &str) -> String {
        code.trim().to_uppercase()
    }

    /// Whether the usage cap has been reached.
    pub fn usage_exhausted(&self) -> bool {
        matches!(self.max_uses, Some(cap) if self.current_uses >= cap)
    }

    /// Checks whether the coupon can be offered for a new purchase right now.
    pub fn check_available(&self, now: Timestamp) -> Result<(), DomainError> {
        if !self.is_active {
            return Err(DomainError::new(
                ErrorCode::CouponInactive,
                "Coupon is inactive",
            ));
        }
        if now.is_after(&self.valid_to) {
            return Err(DomainError::new(
                ErrorCode::CouponExpired,
                "Coupon has expired",
            ));
        }
        if self.usage_exhausted() {
            return Err(DomainError::new(
                ErrorCode::UsageLimitReached,
                "Coupon usage limit reached",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::ErrorCode;

    fn coupon(is_active: bool, max_uses: Option<i64>) -> Coupon {
        Coupon::new(
            "welcome15",
            Discount::from_parts("percentage", 15.0).unwrap(),
            Timestamp::now().add_days(30),
            is_active,
            max_uses,
        )
        .unwrap()
    }

    #[test]
    fn code_is_normalized_to_uppercase() {
        assert_eq!(coupon(true, None).code, "WELCOME15");
        assert_eq!(Coupon::normalize_code("  noel24 "), "NOEL24");
    }

    #[test]
    fn short_codes_are_rejected() {
        let result = Coupon::new(
            "ab",
            Discount::from_parts("fixed", 5.0).unwrap(),
            Timestamp::now().add_days(1),
            true,
            None,
        );
        assert!(result.is_err());
    }

    #[test]
    fn availability_rules() {
        assert!(coupon(true, None).check_available(Timestamp::now()).is_ok());

        let inactive = coupon(false, None);
        assert_eq!(
            inactive.check_available(Timestamp::now()).unwrap_err().code,
            ErrorCode::CouponInactive
        );

        let mut expired = coupon(true, None);
        expired.valid_to = Timestamp::now().add_days(-1);
        assert_eq!(
            expired.check_available(Timestamp::now()).unwrap_err().code,
            ErrorCode::CouponExpired
        );

        let mut used_up = coupon(true, Some(2));
        used_up.current_uses = 2;
        assert_eq!(
            used_up.check_available(Timestamp::now()).unwrap_err().code,
            ErrorCode::UsageLimitReached
        );
    }

    #[test]
    fn cap_must_be_positive() {
        let result = Coupon::new(
            "NOEL24",
            Discount::from_parts("fixed", 5.0).unwrap(),
            Timestamp::now().add_days(1),
            true,
            Some(0),
        );
        assert!(result.is_err());
    }
}
