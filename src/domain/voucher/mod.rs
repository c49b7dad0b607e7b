//! Voucher aggregate and lifecycle.

mod aggregate;
mod status;

pub use aggregate::{BuyerInfo, Voucher, VALIDITY_DAYS};
pub use status::VoucherStatus;
