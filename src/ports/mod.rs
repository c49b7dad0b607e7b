//! Ports: async traits at every seam between the application core and the
//! outside world.

mod coupon_repository;
mod payment_gateway;
mod reservation_repository;
mod transaction_repository;
mod voucher_notifier;
mod voucher_repository;

pub use coupon_repository::CouponRepository;
pub use payment_gateway::{
    CreateSessionRequest, GatewayError, GatewayErrorCode, GatewayEventType, GatewaySession,
    GatewayWebhookEvent, PaymentGateway, SessionStatus,
};
pub use reservation_repository::{ApplyOutcome, ReservationRepository};
pub use transaction_repository::TransactionRepository;
pub use voucher_notifier::{NotifyError, VoucherNotifier};
pub use voucher_repository::{ActivationOutcome, VoucherRepository};
