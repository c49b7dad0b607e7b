//! Application layer: command handlers orchestrating domain objects through
//! the ports. No transport or storage concerns live here.

pub mod checkout;
pub mod coupon_admin;
pub mod ledger;
pub mod voucher;
