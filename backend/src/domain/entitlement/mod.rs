//! Entitlements - named capabilities granted to users.
//!
//! Grants are idempotent: the `(user_id, code)` pair is unique in storage
//! and a repeated grant is a successful no-op.

mod granter;

pub use granter::{grant, Entitlement, EntitlementCode, GrantOutcome};
