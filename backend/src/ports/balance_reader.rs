//! BalanceReader port - read-only queries for balance views.
//!
//! Reads run outside any unit of work and take no locks.

use async_trait::async_trait;

use crate::domain::balance::{BalanceLedgerEntry, BalanceRequest};
use crate::domain::foundation::{DomainError, UserId};

/// One page of results plus the unpaged total.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub limit: u32,
}

#[async_trait]
pub trait BalanceReader: Send + Sync {
    /// Current balance in cents; zero if the user has no row yet.
    async fn balance_cents(&self, user: UserId) -> Result<i64, DomainError>;

    /// A user's deposit requests, newest first. `page` is 1-based.
    async fn list_requests(
        &self,
        user: UserId,
        page: u32,
        limit: u32,
    ) -> Result<Page<BalanceRequest>, DomainError>;

    /// A user's ledger rows, newest first.
    async fn list_ledger(&self, user: UserId, limit: u32) -> Result<Vec<BalanceLedgerEntry>, DomainError>;

    /// Sum of every ledger delta for a user.
    async fn ledger_sum(&self, user: UserId) -> Result<i64, DomainError>;
}
