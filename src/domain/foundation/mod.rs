//! Foundation value objects shared by every aggregate.

mod errors;
mod ids;
mod money;
mod timestamp;

pub use errors::{DomainError, ErrorCode, ValidationError};
pub use ids::{CouponId, ReservationId, TransactionId, VoucherId};
pub use money::{Money, Percent};
pub use timestamp::Timestamp;
