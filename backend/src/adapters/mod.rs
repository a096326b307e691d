//! Adapters - Implementations of port interfaces.
//!
//! - `postgres` - Transactional stores, IPN log, and read models on sqlx
//! - `memory` - In-process stores for tests and local runs
//! - `nowpayments` - Gateway client and its test double
//! - `identity` - End user identity validators
//! - `http` - axum routes, extractors, and error mapping

pub mod http;
pub mod identity;
pub mod memory;
pub mod nowpayments;
pub mod postgres;

pub use identity::{TelegramInitDataValidator, TrustedHeaderValidator};
pub use memory::{InMemoryIpnEventLog, InMemoryStore};
pub use nowpayments::{MockPaymentGateway, NowPaymentsClient, NowPaymentsConfig};
pub use postgres::{PgUnitOfWorkFactory, PostgresBalanceReader, PostgresIpnEventLog};
