//! Foundation module - Shared domain primitives.
//!
//! Identifiers, timestamps, money helpers, and the error vocabulary used by
//! the balance, payment, and entitlement modules.

mod errors;
mod ids;
mod money;
mod state_machine;
mod timestamp;

pub use errors::{DomainError, ErrorCode, ValidationError};
pub use ids::{
    AdminId, BalanceRequestId, BookingId, GatewayPaymentId, IpnEventId, LedgerEntryId,
    PurchaseId, UserId,
};
pub use money::{format_money, parse_money};
pub use state_machine::StateMachine;
pub use timestamp::Timestamp;
