//! PostgreSQL implementation of IpnEventLog.
//!
//! Appends run on the pool in autocommit mode, outside any unit of work.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::foundation::DomainError;
use crate::domain::payment::{IpnEvent, NewIpnEvent};
use crate::ports::IpnEventLog;

use super::rows::{db_error, IpnEventRow};

pub struct PostgresIpnEventLog {
    pool: PgPool,
}

impl PostgresIpnEventLog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl IpnEventLog for PostgresIpnEventLog {
    async fn append(&self, event: NewIpnEvent) -> Result<IpnEvent, DomainError> {
        let row: IpnEventRow = sqlx::query_as(
            r#"
            INSERT INTO ipn_events (
                received_at, payment_id, payment_status, order_id,
                signature_valid, signature_header, payload
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, received_at, payment_id, payment_status, order_id,
                      signature_valid, signature_header, payload
            "#,
        )
        .bind(event.received_at.as_datetime())
        .bind(&event.payment_id)
        .bind(&event.payment_status)
        .bind(&event.order_id)
        .bind(event.signature_valid)
        .bind(&event.signature_header)
        .bind(&event.payload)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("Failed to log IPN event"))?;

        Ok(row.into())
    }

    async fn recent(&self, limit: u32) -> Result<Vec<IpnEvent>, DomainError> {
        let rows: Vec<IpnEventRow> = sqlx::query_as(
            r#"
            SELECT id, received_at, payment_id, payment_status, order_id,
                   signature_valid, signature_header, payload
            FROM ipn_events
            ORDER BY id DESC
            LIMIT $1
            "#,
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to read IPN events"))?;

        Ok(rows.into_iter().map(IpnEvent::from).collect())
    }
}
