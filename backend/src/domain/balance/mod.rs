//! Balance ledger - append-only ledger backing a materialized balance.
//!
//! # Invariants
//!
//! - `UserBalance.balance_cents` equals the sum of the user's ledger deltas
//! - Every balance change and its ledger row commit together
//! - A deposit request leaves `pending` at most once

mod balance_request;
mod deposit_address;
mod errors;
mod ledger;
mod ledger_entry;
mod user_balance;

pub use balance_request::{BalanceRequest, BalanceRequestStatus, MAX_TX_REF_LEN};
pub use deposit_address::{DepositAddress, DEFAULT_DEPOSIT_NETWORK, UNSET_DEPOSIT_ADDRESS};
pub use errors::BalanceError;
pub use ledger::{
    admin_adjust_balance, append_ledger_entry, approve_deposit_request, create_deposit_request,
    get_or_create_balance, reject_deposit_request, AdjustBalance, BalanceAdjustment,
    DepositRequestCreated, DepositResolution,
};
pub use ledger_entry::{BalanceLedgerEntry, LedgerEntryType, NewLedgerEntry};
pub use user_balance::UserBalance;
