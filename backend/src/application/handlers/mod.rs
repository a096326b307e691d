//! Application handlers.
//!
//! Command and query handlers that orchestrate domain operations. Each
//! write opens its own unit of work, commits on success, and rolls back
//! on any error.

pub mod balance;
pub mod payment;

mod unit_of_work;

pub use balance::{
    AdjustBalanceCommand, AdjustBalanceHandler, AdjustBalanceResult, ApproveDepositRequestCommand,
    BalanceView, CreateDepositRequestCommand, CreateDepositRequestHandler,
    CreateDepositRequestResult, GetBalanceHandler, GetBalanceQuery, GetUserLedgerHandler,
    GetUserLedgerQuery, ListBalanceRequestsHandler, ListBalanceRequestsQuery,
    RejectDepositRequestCommand, ReviewDepositRequestHandler, ReviewDepositRequestResult,
    UserLedgerView,
};
pub use payment::{
    CreateInvoiceCommand, CreateInvoiceHandler, CreateInvoiceResult, CreateProductPaymentCommand,
    CreateProductPaymentHandler, CreateProductPaymentResult, HandleIpnCommand, HandleIpnHandler,
    HandleIpnResult, PollPaymentStatusHandler, PollPaymentStatusQuery, PollPaymentStatusResult,
};
