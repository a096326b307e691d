//! HTTP middleware for axum.
//!
//! - `auth` - User and admin identity extractors

pub mod auth;

pub use auth::{AdminToken, AuthRejection, AuthenticatedAdmin, AuthenticatedUser, IdentityProvider};
