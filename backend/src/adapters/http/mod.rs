//! HTTP adapters - REST API implementations.
//!
//! Each module has its own routes, DTOs, and API error type. `app_router`
//! assembles them behind the shared middleware stack.

pub mod balance;
pub mod error;
pub mod middleware;
pub mod payment;
pub mod router;
pub mod state;

pub use error::ErrorResponse;
pub use middleware::{AdminToken, AuthenticatedAdmin, AuthenticatedUser, IdentityProvider};
pub use router::app_router;
pub use state::AppState;
