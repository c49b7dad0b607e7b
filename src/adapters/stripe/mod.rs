//! Stripe hosted-checkout adapter, plus a mock gateway for tests and local
//! development.

mod gateway;
mod mock_gateway;
pub mod webhook_types;

pub use gateway::{StripeConfig, StripeGateway};
pub use mock_gateway::{MockGateway, MOCK_WEBHOOK_SIGNATURE};
