//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! ## Transactional Ports
//!
//! - `UnitOfWork` - One transaction spanning the stores below
//! - `BalanceStore` - Balances, ledger rows, deposit requests
//! - `PaymentStore` - Purchases, bookings, gateway payment mirrors
//! - `EntitlementStore` - Idempotent capability grants
//!
//! ## Standalone Ports
//!
//! - `IpnEventLog` - Append-only IPN audit log, committed independently
//! - `BalanceReader` - Lock-free read models
//! - `PaymentGateway` - Outbound gateway client
//! - `UserIdentityValidator` - Resolves the calling end user

mod balance_reader;
mod balance_store;
mod entitlement_store;
mod identity_validator;
mod ipn_event_log;
mod payment_gateway;
mod payment_store;
mod unit_of_work;

pub use balance_reader::{BalanceReader, Page};
pub use balance_store::BalanceStore;
pub use entitlement_store::EntitlementStore;
pub use identity_validator::{IdentityError, UserIdentityValidator};
pub use ipn_event_log::IpnEventLog;
pub use payment_gateway::{GatewayError, PaymentGateway};
pub use payment_store::PaymentStore;
pub use unit_of_work::{UnitOfWork, UnitOfWorkFactory};
