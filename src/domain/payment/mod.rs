//! Payment transaction tracking for hosted checkout sessions.

mod transaction;

pub use transaction::{PaymentStatus, PaymentTransaction};
