//! Gift card operations: activation, verification, search, redemption,
//! admin.

mod activate_voucher;
mod admin;
mod redeem_voucher;
mod search_vouchers;
mod verify_voucher;

pub use activate_voucher::ActivateVoucher;
pub use admin::VoucherAdmin;
pub use redeem_voucher::RedeemVoucher;
pub use search_vouchers::{SearchKind, SearchVouchers};
pub use verify_voucher::VerifyVoucher;
