//! Gift card HTTP adapter.

pub mod dto;
pub mod handlers;
pub mod routes;

pub use routes::{gift_card_routes, webhook_routes};
