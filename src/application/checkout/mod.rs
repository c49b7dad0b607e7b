//! Checkout orchestration: purchase opening, payment confirmation, webhook
//! intake.

mod confirm_checkout;
mod open_checkout;
mod process_webhook;

pub use confirm_checkout::{CheckoutStatus, ConfirmCheckout};
pub use open_checkout::{
    AmountBounds, CheckoutUrls, OpenCheckout, OpenCheckoutCommand, OpenCheckoutOutcome,
};
pub use process_webhook::ProcessWebhook;
