//! In-memory adapters for tests and local runs without Postgres.

mod ipn_log;
mod store;

pub use ipn_log::InMemoryIpnEventLog;
pub use store::{InMemoryStore, InMemoryUnitOfWork};
