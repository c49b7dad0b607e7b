//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `email` - Issuance notifications (Resend HTTP API, no-op)
//! - `http` - REST API (axum routers, DTOs, admin auth)
//! - `memory` - In-memory repositories for tests and local runs
//! - `postgres` - PostgreSQL repositories (sqlx)
//! - `stripe` - Hosted checkout gateway and webhook verification

pub mod email;
pub mod http;
pub mod memory;
pub mod postgres;
pub mod stripe;
