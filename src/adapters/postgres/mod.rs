//! PostgreSQL adapters backed by sqlx connection pooling.

mod coupon_repository;
mod reservation_repository;
mod transaction_repository;
mod voucher_repository;

pub use coupon_repository::PostgresCouponRepository;
pub use reservation_repository::PostgresReservationRepository;
pub use transaction_repository::PostgresTransactionRepository;
pub use voucher_repository::PostgresVoucherRepository;
