//! Domain layer: aggregates and value objects, free of I/O.

pub mod codegen;
pub mod coupon;
pub mod foundation;
pub mod payment;
pub mod voucher;
