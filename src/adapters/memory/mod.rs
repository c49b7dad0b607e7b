//! In-memory adapters with the same compare-and-set semantics as the
//! Postgres adapters. Used by tests and local development runs.

mod coupon_repository;
mod reservation_repository;
mod transaction_repository;
mod voucher_repository;

pub use coupon_repository::InMemoryCouponRepository;
pub use reservation_repository::InMemoryReservationRepository;
pub use transaction_repository::InMemoryTransactionRepository;
pub use voucher_repository::InMemoryVoucherRepository;
