//! BalanceStore port - transactional access to balances, ledger, and
//! deposit requests.
//!
//! Every method runs inside the unit of work that owns the store. `lock_*`
//! reads take a row lock held until commit or rollback, so a
//! guard-then-mutate sequence cannot interleave with another one on the
//! same row.

use async_trait::async_trait;

use crate::domain::balance::{
    BalanceLedgerEntry, BalanceRequest, NewLedgerEntry, UserBalance,
};
use crate::domain::foundation::{BalanceRequestId, DomainError, Timestamp, UserId};

#[async_trait]
pub trait BalanceStore: Send {
    /// Inserts a zero balance row unless one exists.
    async fn ensure_balance(&mut self, user: UserId) -> Result<(), DomainError>;

    /// Reads the balance row with a lock.
    async fn lock_balance(&mut self, user: UserId) -> Result<Option<UserBalance>, DomainError>;

    /// Writes back a balance row.
    async fn save_balance(&mut self, balance: &UserBalance) -> Result<(), DomainError>;

    /// Appends a ledger row, returning it with its assigned id.
    async fn insert_ledger_entry(
        &mut self,
        entry: NewLedgerEntry,
    ) -> Result<BalanceLedgerEntry, DomainError>;

    /// Creates a pending deposit request.
    async fn insert_balance_request(
        &mut self,
        user: UserId,
        tx_ref: &str,
        created_at: Timestamp,
    ) -> Result<BalanceRequest, DomainError>;

    /// Reads a deposit request with a lock.
    async fn lock_balance_request(
        &mut self,
        id: BalanceRequestId,
    ) -> Result<Option<BalanceRequest>, DomainError>;

    /// Writes back a deposit request.
    async fn save_balance_request(&mut self, request: &BalanceRequest) -> Result<(), DomainError>;
}
