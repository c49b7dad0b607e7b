//! Gift card sales backend.
//!
//! Sells prepaid gift cards through a hosted Stripe checkout, with
//! single-use discount coupons reserved at validation time and finalized
//! exactly once when payment lands.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
