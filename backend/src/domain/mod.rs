//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared primitives (IDs, money, timestamps, errors)
//! - `balance` - Append-only ledger and materialized user balances
//! - `payment` - Gateway payments, IPN verification, reconciliation
//! - `entitlement` - Idempotent capability grants

pub mod balance;
pub mod entitlement;
pub mod foundation;
pub mod payment;
