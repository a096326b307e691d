//! PostgreSQL implementation of BalanceReader.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::balance::{BalanceLedgerEntry, BalanceRequest};
use crate::domain::foundation::{DomainError, UserId};
use crate::ports::{BalanceReader, Page};

use super::rows::{db_error, LedgerRow, RequestRow};

/// Lock-free balance queries on the pool.
pub struct PostgresBalanceReader {
    pool: PgPool,
}

impl PostgresBalanceReader {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BalanceReader for PostgresBalanceReader {
    async fn balance_cents(&self, user: UserId) -> Result<i64, DomainError> {
        let balance: Option<i64> =
            sqlx::query_scalar("SELECT balance_cents FROM user_balances WHERE user_id = $1")
                .bind(user.value())
                .fetch_optional(&self.pool)
                .await
                .map_err(db_error("Failed to read balance"))?;
        Ok(balance.unwrap_or(0))
    }

    async fn list_requests(
        &self,
        user: UserId,
        page: u32,
        limit: u32,
    ) -> Result<Page<BalanceRequest>, DomainError> {
        let page = page.max(1);
        let offset = i64::from(page - 1) * i64::from(limit);

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM balance_requests WHERE user_id = $1")
            .bind(user.value())
            .fetch_one(&self.pool)
            .await
            .map_err(db_error("Failed to count balance requests"))?;

        let rows: Vec<RequestRow> = sqlx::query_as(
            r#"
            SELECT id, user_id, tx_ref, status, admin_comment, created_at,
                   reviewed_at, reviewed_by_admin_id
            FROM balance_requests
            WHERE user_id = $1
            ORDER BY id DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(user.value())
        .bind(i64::from(limit))
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to list balance requests"))?;

        Ok(Page {
            items: rows
                .into_iter()
                .map(BalanceRequest::try_from)
                .collect::<Result<_, _>>()?,
            total: total.max(0) as u64,
            page,
            limit,
        })
    }

    async fn list_ledger(&self, user: UserId, limit: u32) -> Result<Vec<BalanceLedgerEntry>, DomainError> {
        let rows: Vec<LedgerRow> = sqlx::query_as(
            r#"
            SELECT id, user_id, entry_type, delta_cents, balance_after_cents, comment,
                   ref_request_id, admin_id, created_at
            FROM balance_ledger
            WHERE user_id = $1
            ORDER BY id DESC
            LIMIT $2
            "#,
        )
        .bind(user.value())
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to list ledger"))?;

        rows.into_iter().map(BalanceLedgerEntry::try_from).collect()
    }

    async fn ledger_sum(&self, user: UserId) -> Result<i64, DomainError> {
        let sum: Option<i64> = sqlx::query_scalar(
            "SELECT SUM(delta_cents)::BIGINT FROM balance_ledger WHERE user_id = $1",
        )
        .bind(user.value())
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("Failed to sum ledger"))?;
        Ok(sum.unwrap_or(0))
    }
}
