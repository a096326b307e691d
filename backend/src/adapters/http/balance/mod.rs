//! HTTP adapter for the balance ledger.
//!
//! User endpoints under `/api/me`, admin review and adjustment under
//! `/api/admin`.

pub mod dto;
pub mod handlers;
pub mod routes;

pub use routes::{admin_routes, balance_routes};
