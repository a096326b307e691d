//! PostgreSQL adapters.
//!
//! - `PgUnitOfWorkFactory` / `PgUnitOfWork` - Transactional stores
//! - `PostgresIpnEventLog` - Autocommitted IPN audit log
//! - `PostgresBalanceReader` - Read-only balance queries

mod balance_reader;
mod ipn_event_log;
mod rows;
mod unit_of_work;

pub use balance_reader::PostgresBalanceReader;
pub use ipn_event_log::PostgresIpnEventLog;
pub use unit_of_work::{PgUnitOfWork, PgUnitOfWorkFactory};

use sqlx::PgPool;

use crate::domain::foundation::{DomainError, ErrorCode};

/// Applies the bundled SQL migrations.
pub async fn run_migrations(pool: &PgPool) -> Result<(), DomainError> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| DomainError::new(ErrorCode::DatabaseError, format!("Migration failed: {}", e)))
}

#[cfg(test)]
mod tests {
    const INIT_SQL: &str = include_str!("../../../migrations/0001_init.sql");

    fn table(name: &str) -> &'static str {
        let start = INIT_SQL
            .find(&format!("CREATE TABLE IF NOT EXISTS {} (", name))
            .unwrap();
        let end = start + INIT_SQL[start..].find(");").unwrap();
        &INIT_SQL[start..end]
    }

    fn column<'a>(table: &'a str, name: &str) -> &'a str {
        table
            .lines()
            .map(str::trim)
            .find(|line| line.split_whitespace().next() == Some(name))
            .unwrap()
    }

    #[test]
    fn ipn_log_columns_are_unbounded() {
        let ipn_events = table("ipn_events");
        for name in ["payment_id", "payment_status", "order_id", "signature_header", "payload"] {
            assert!(
                column(ipn_events, name).contains(" TEXT"),
                "ipn_events.{} must accept any length",
                name
            );
        }
    }

    #[test]
    fn gateway_supplied_columns_are_unbounded() {
        let mirror = table("gateway_payments");
        for name in ["payment_id", "order_id", "price_currency", "pay_currency", "gateway_status"] {
            assert!(column(mirror, name).contains(" TEXT"), "gateway_payments.{}", name);
        }
        let purchases = table("product_purchases");
        assert!(column(purchases, "gateway_status").contains(" TEXT"));
        assert!(column(purchases, "gateway_payment_id").contains(" TEXT"));
    }
}
