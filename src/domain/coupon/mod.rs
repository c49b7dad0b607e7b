//! Coupon aggregate, discount rules, and single-use reservations.

mod coupon;
mod discount;
mod reservation;

pub use coupon::Coupon;
pub use discount::{Discount, DiscountSnapshot};
pub use reservation::{CouponReservation, ReservationStatus};
