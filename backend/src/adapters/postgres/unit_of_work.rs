//! PostgreSQL unit of work.
//!
//! One `PgUnitOfWork` wraps one transaction at READ COMMITTED. Every
//! `lock_*` read is a `SELECT ... FOR UPDATE`, so a concurrent
//! guard-then-mutate on the same row blocks until this transaction ends
//! and then sees the committed status. Dropping the transaction without
//! commit rolls it back.

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};

use crate::domain::balance::{BalanceLedgerEntry, BalanceRequest, NewLedgerEntry, UserBalance};
use crate::domain::entitlement::Entitlement;
use crate::domain::foundation::{
    BalanceRequestId, BookingId, DomainError, ErrorCode, GatewayPaymentId, PurchaseId, Timestamp,
    UserId,
};
use crate::domain::payment::{Booking, NewPurchase, PaymentRecord, Purchase};
use crate::ports::{
    BalanceStore, EntitlementStore, PaymentStore, UnitOfWork, UnitOfWorkFactory,
};

use super::rows::{
    db_error, BalanceRow, BookingRow, EntitlementRow, LedgerRow, PaymentRecordRow, PurchaseRow,
    RequestRow,
};

const PURCHASE_COLUMNS: &str = r#"
    id, user_id, order_id, amount, price_currency, pay_currency, status, gateway_status,
    gateway_payment_id, pay_address, pay_amount, raw_create_response, raw_last_ipn,
    created_at, updated_at, finished_at
"#;

const BOOKING_COLUMNS: &str = r#"
    id, user_id, kind, status, payment_status, gateway_payment_id, amount, payment_date,
    created_at, updated_at
"#;

/// Opens Postgres units of work from a pool.
#[derive(Clone)]
pub struct PgUnitOfWorkFactory {
    pool: PgPool,
}

impl PgUnitOfWorkFactory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UnitOfWorkFactory for PgUnitOfWorkFactory {
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, DomainError> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(db_error("Failed to start transaction"))?;
        Ok(Box::new(PgUnitOfWork { tx }))
    }
}

/// A single Postgres transaction.
pub struct PgUnitOfWork {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl UnitOfWork for PgUnitOfWork {
    async fn commit(self: Box<Self>) -> Result<(), DomainError> {
        self.tx
            .commit()
            .await
            .map_err(db_error("Failed to commit transaction"))
    }

    async fn rollback(self: Box<Self>) -> Result<(), DomainError> {
        self.tx
            .rollback()
            .await
            .map_err(db_error("Failed to roll back transaction"))
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Balances
// ════════════════════════════════════════════════════════════════════════════

#[async_trait]
impl BalanceStore for PgUnitOfWork {
    async fn ensure_balance(&mut self, user: UserId) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO user_balances (user_id, balance_cents, updated_at)
            VALUES ($1, 0, NOW())
            ON CONFLICT (user_id) DO NOTHING
            "#,
        )
        .bind(user.value())
        .execute(&mut *self.tx)
        .await
        .map_err(db_error("Failed to create balance"))?;
        Ok(())
    }

    async fn lock_balance(&mut self, user: UserId) -> Result<Option<UserBalance>, DomainError> {
        let row: Option<BalanceRow> = sqlx::query_as(
            r#"
            SELECT user_id, balance_cents, updated_at
            FROM user_balances
            WHERE user_id = $1
            FOR UPDATE
            "#,
        )
        .bind(user.value())
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(db_error("Failed to lock balance"))?;

        Ok(row.map(UserBalance::from))
    }

    async fn save_balance(&mut self, balance: &UserBalance) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            UPDATE user_balances
            SET balance_cents = $2, updated_at = $3
            WHERE user_id = $1
            "#,
        )
        .bind(balance.user_id.value())
        .bind(balance.balance_cents)
        .bind(balance.updated_at.as_datetime())
        .execute(&mut *self.tx)
        .await
        .map_err(db_error("Failed to save balance"))?;
        Ok(())
    }

    async fn insert_ledger_entry(
        &mut self,
        entry: NewLedgerEntry,
    ) -> Result<BalanceLedgerEntry, DomainError> {
        let row: LedgerRow = sqlx::query_as(
            r#"
            INSERT INTO balance_ledger (
                user_id, entry_type, delta_cents, balance_after_cents, comment,
                ref_request_id, admin_id, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, user_id, entry_type, delta_cents, balance_after_cents, comment,
                      ref_request_id, admin_id, created_at
            "#,
        )
        .bind(entry.user_id.value())
        .bind(entry.entry_type.as_str())
        .bind(entry.delta_cents)
        .bind(entry.balance_after_cents)
        .bind(&entry.comment)
        .bind(entry.ref_request_id.map(|id| id.value()))
        .bind(entry.admin_id.map(|id| id.value()))
        .bind(entry.created_at.as_datetime())
        .fetch_one(&mut *self.tx)
        .await
        .map_err(db_error("Failed to append ledger entry"))?;

        row.try_into()
    }

    async fn insert_balance_request(
        &mut self,
        user: UserId,
        tx_ref: &str,
        created_at: Timestamp,
    ) -> Result<BalanceRequest, DomainError> {
        let row: RequestRow = sqlx::query_as(
            r#"
            INSERT INTO balance_requests (user_id, tx_ref, status, created_at)
            VALUES ($1, $2, 'pending', $3)
            RETURNING id, user_id, tx_ref, status, admin_comment, created_at,
                      reviewed_at, reviewed_by_admin_id
            "#,
        )
        .bind(user.value())
        .bind(tx_ref)
        .bind(created_at.as_datetime())
        .fetch_one(&mut *self.tx)
        .await
        .map_err(db_error("Failed to create balance request"))?;

        row.try_into()
    }

    async fn lock_balance_request(
        &mut self,
        id: BalanceRequestId,
    ) -> Result<Option<BalanceRequest>, DomainError> {
        let row: Option<RequestRow> = sqlx::query_as(
            r#"
            SELECT id, user_id, tx_ref, status, admin_comment, created_at,
                   reviewed_at, reviewed_by_admin_id
            FROM balance_requests
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(id.value())
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(db_error("Failed to lock balance request"))?;

        row.map(BalanceRequest::try_from).transpose()
    }

    async fn save_balance_request(&mut self, request: &BalanceRequest) -> Result<(), DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE balance_requests SET
                status = $2,
                admin_comment = $3,
                reviewed_at = $4,
                reviewed_by_admin_id = $5
            WHERE id = $1
            "#,
        )
        .bind(request.id.value())
        .bind(request.status.as_str())
        .bind(&request.admin_comment)
        .bind(request.reviewed_at.map(Timestamp::into_inner))
        .bind(request.reviewed_by_admin_id.map(|id| id.value()))
        .execute(&mut *self.tx)
        .await
        .map_err(db_error("Failed to save balance request"))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::new(ErrorCode::NotFound, "Balance request not found"));
        }
        Ok(())
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Payments
// ════════════════════════════════════════════════════════════════════════════

#[async_trait]
impl PaymentStore for PgUnitOfWork {
    async fn insert_purchase(&mut self, purchase: NewPurchase) -> Result<Purchase, DomainError> {
        let (id,): (i64,) = sqlx::query_as(
            r#"
            INSERT INTO product_purchases (user_id, amount, price_currency, pay_currency, status)
            VALUES ($1, $2, $3, $4, 'pending')
            RETURNING id
            "#,
        )
        .bind(purchase.user_id.value())
        .bind(purchase.amount)
        .bind(&purchase.price_currency)
        .bind(&purchase.pay_currency)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(db_error("Failed to create purchase"))?;

        let purchase = purchase.into_purchase(PurchaseId::new(id));
        self.save_purchase(&purchase).await?;
        Ok(purchase)
    }

    async fn lock_purchase(&mut self, id: PurchaseId) -> Result<Option<Purchase>, DomainError> {
        let row: Option<PurchaseRow> = sqlx::query_as(&format!(
            "SELECT {} FROM product_purchases WHERE id = $1 FOR UPDATE",
            PURCHASE_COLUMNS
        ))
        .bind(id.value())
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(db_error("Failed to lock purchase"))?;

        row.map(Purchase::try_from).transpose()
    }

    async fn lock_purchase_by_payment_id(
        &mut self,
        payment_id: &GatewayPaymentId,
    ) -> Result<Option<Purchase>, DomainError> {
        let row: Option<PurchaseRow> = sqlx::query_as(&format!(
            "SELECT {} FROM product_purchases WHERE gateway_payment_id = $1 FOR UPDATE",
            PURCHASE_COLUMNS
        ))
        .bind(payment_id.as_str())
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(db_error("Failed to lock purchase"))?;

        row.map(Purchase::try_from).transpose()
    }

    async fn save_purchase(&mut self, purchase: &Purchase) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            UPDATE product_purchases SET
                order_id = $2,
                status = $3,
                gateway_status = $4,
                gateway_payment_id = $5,
                pay_address = $6,
                pay_amount = $7,
                raw_create_response = $8,
                raw_last_ipn = $9,
                updated_at = $10,
                finished_at = $11
            WHERE id = $1
            "#,
        )
        .bind(purchase.id.value())
        .bind(&purchase.order_id)
        .bind(purchase.status.as_str())
        .bind(&purchase.gateway_status)
        .bind(purchase.gateway_payment_id.as_ref().map(|p| p.as_str()))
        .bind(&purchase.pay_address)
        .bind(purchase.pay_amount)
        .bind(&purchase.raw_create_response)
        .bind(&purchase.raw_last_ipn)
        .bind(purchase.updated_at.as_datetime())
        .bind(purchase.finished_at.map(Timestamp::into_inner))
        .execute(&mut *self.tx)
        .await
        .map_err(db_error("Failed to save purchase"))?;
        Ok(())
    }

    async fn lock_booking(&mut self, id: BookingId) -> Result<Option<Booking>, DomainError> {
        let row: Option<BookingRow> = sqlx::query_as(&format!(
            "SELECT {} FROM bookings WHERE id = $1 FOR UPDATE",
            BOOKING_COLUMNS
        ))
        .bind(id.value())
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(db_error("Failed to lock booking"))?;

        row.map(Booking::try_from).transpose()
    }

    async fn lock_booking_by_payment_id(
        &mut self,
        payment_id: &GatewayPaymentId,
    ) -> Result<Option<Booking>, DomainError> {
        let row: Option<BookingRow> = sqlx::query_as(&format!(
            "SELECT {} FROM bookings WHERE gateway_payment_id = $1 ORDER BY id LIMIT 1 FOR UPDATE",
            BOOKING_COLUMNS
        ))
        .bind(payment_id.as_str())
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(db_error("Failed to lock booking"))?;

        row.map(Booking::try_from).transpose()
    }

    async fn save_booking(&mut self, booking: &Booking) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            UPDATE bookings SET
                status = $2,
                payment_status = $3,
                gateway_payment_id = $4,
                amount = $5,
                payment_date = $6,
                updated_at = $7
            WHERE id = $1
            "#,
        )
        .bind(booking.id.value())
        .bind(booking.status.as_str())
        .bind(booking.payment_status.as_str())
        .bind(booking.gateway_payment_id.as_ref().map(|p| p.as_str()))
        .bind(booking.amount)
        .bind(booking.payment_date.map(Timestamp::into_inner))
        .bind(booking.updated_at.as_datetime())
        .execute(&mut *self.tx)
        .await
        .map_err(db_error("Failed to save booking"))?;
        Ok(())
    }

    async fn lock_payment_record(
        &mut self,
        payment_id: &GatewayPaymentId,
    ) -> Result<Option<PaymentRecord>, DomainError> {
        let row: Option<PaymentRecordRow> = sqlx::query_as(
            r#"
            SELECT payment_id, order_id, price_amount, price_currency, pay_amount, pay_currency,
                   pay_address, gateway_status, settlement, booking_id, purchase_id, expires_at,
                   completed_at, raw_create_response, raw_last_status, raw_last_ipn,
                   created_at, updated_at
            FROM gateway_payments
            WHERE payment_id = $1
            FOR UPDATE
            "#,
        )
        .bind(payment_id.as_str())
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(db_error("Failed to lock payment record"))?;

        row.map(PaymentRecord::try_from).transpose()
    }

    async fn upsert_payment_record(&mut self, record: &PaymentRecord) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO gateway_payments (
                payment_id, order_id, price_amount, price_currency, pay_amount, pay_currency,
                pay_address, gateway_status, settlement, booking_id, purchase_id, expires_at,
                completed_at, raw_create_response, raw_last_status, raw_last_ipn,
                created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)
            ON CONFLICT (payment_id) DO UPDATE SET
                order_id = EXCLUDED.order_id,
                price_amount = EXCLUDED.price_amount,
                price_currency = EXCLUDED.price_currency,
                pay_amount = EXCLUDED.pay_amount,
                pay_currency = EXCLUDED.pay_currency,
                pay_address = EXCLUDED.pay_address,
                gateway_status = EXCLUDED.gateway_status,
                settlement = EXCLUDED.settlement,
                booking_id = EXCLUDED.booking_id,
                purchase_id = EXCLUDED.purchase_id,
                expires_at = EXCLUDED.expires_at,
                completed_at = EXCLUDED.completed_at,
                raw_create_response = EXCLUDED.raw_create_response,
                raw_last_status = EXCLUDED.raw_last_status,
                raw_last_ipn = EXCLUDED.raw_last_ipn,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(record.payment_id.as_str())
        .bind(&record.order_id)
        .bind(record.price_amount)
        .bind(&record.price_currency)
        .bind(record.pay_amount)
        .bind(&record.pay_currency)
        .bind(&record.pay_address)
        .bind(&record.gateway_status)
        .bind(record.settlement.as_str())
        .bind(record.booking_id.map(|id| id.value()))
        .bind(record.purchase_id.map(|id| id.value()))
        .bind(record.expires_at.map(Timestamp::into_inner))
        .bind(record.completed_at.map(Timestamp::into_inner))
        .bind(&record.raw_create_response)
        .bind(&record.raw_last_status)
        .bind(&record.raw_last_ipn)
        .bind(record.created_at.as_datetime())
        .bind(record.updated_at.as_datetime())
        .execute(&mut *self.tx)
        .await
        .map_err(db_error("Failed to upsert payment record"))?;
        Ok(())
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Entitlements
// ════════════════════════════════════════════════════════════════════════════

#[async_trait]
impl EntitlementStore for PgUnitOfWork {
    async fn insert_entitlement_if_absent(
        &mut self,
        entitlement: &Entitlement,
    ) -> Result<bool, DomainError> {
        let result = sqlx::query(
            r#"
            INSERT INTO user_entitlements (user_id, code, granted_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id, code) DO NOTHING
            "#,
        )
        .bind(entitlement.user_id.value())
        .bind(entitlement.code.as_str())
        .bind(entitlement.granted_at.as_datetime())
        .execute(&mut *self.tx)
        .await
        .map_err(db_error("Failed to grant entitlement"))?;

        Ok(result.rows_affected() == 1)
    }

    async fn list_entitlements(&mut self, user: UserId) -> Result<Vec<Entitlement>, DomainError> {
        let rows: Vec<EntitlementRow> = sqlx::query_as(
            r#"
            SELECT user_id, code, granted_at
            FROM user_entitlements
            WHERE user_id = $1
            ORDER BY granted_at
            "#,
        )
        .bind(user.value())
        .fetch_all(&mut *self.tx)
        .await
        .map_err(db_error("Failed to list entitlements"))?;

        rows.into_iter().map(Entitlement::try_from).collect()
    }
}
