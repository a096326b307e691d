//! Payledger - crypto payment reconciliation and balance ledger.
//!
//! Creates NOWPayments invoices for bookings and product purchases,
//! reconciles signed IPN callbacks into local state, and keeps an
//! append-only balance ledger with admin-reviewed deposit requests.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
