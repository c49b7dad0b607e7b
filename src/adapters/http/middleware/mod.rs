//! HTTP middleware layers.

pub mod admin_auth;

pub use admin_auth::{require_admin, AdminAuthState};
