//! Balance command and query handlers.

mod adjust_balance;
mod create_deposit_request;
mod get_balance;
mod get_user_ledger;
mod list_balance_requests;
mod review_deposit_request;

pub use adjust_balance::{AdjustBalanceCommand, AdjustBalanceHandler, AdjustBalanceResult};
pub use create_deposit_request::{
    CreateDepositRequestCommand, CreateDepositRequestHandler, CreateDepositRequestResult,
};
pub use get_balance::{BalanceView, GetBalanceHandler, GetBalanceQuery};
pub use get_user_ledger::{GetUserLedgerHandler, GetUserLedgerQuery, UserLedgerView};
pub use list_balance_requests::{ListBalanceRequestsHandler, ListBalanceRequestsQuery, MAX_PAGE_SIZE};
pub use review_deposit_request::{
    ApproveDepositRequestCommand, RejectDepositRequestCommand, ReviewDepositRequestHandler,
    ReviewDepositRequestResult,
};
