//! Database row representations and their domain conversions.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde_json::Value;
use std::str::FromStr;

use crate::domain::balance::{BalanceLedgerEntry, BalanceRequest, UserBalance};
use crate::domain::entitlement::{Entitlement, EntitlementCode};
use crate::domain::foundation::{
    AdminId, BalanceRequestId, BookingId, DomainError, ErrorCode, GatewayPaymentId, IpnEventId,
    LedgerEntryId, PurchaseId, Timestamp, UserId,
};
use crate::domain::payment::{Booking, IpnEvent, PaymentRecord, Purchase};

/// Maps a sqlx failure into a `DatabaseError` with context.
pub(crate) fn db_error(context: &'static str) -> impl FnOnce(sqlx::Error) -> DomainError {
    move |e| DomainError::new(ErrorCode::DatabaseError, format!("{}: {}", context, e))
}

/// Parses a stored enum column.
fn parse_column<T: FromStr>(column: &str, value: &str) -> Result<T, DomainError> {
    value.parse().map_err(|_| {
        DomainError::new(
            ErrorCode::DatabaseError,
            format!("Invalid {} value: {}", column, value),
        )
    })
}

fn parse_payment_id(value: Option<String>) -> Result<Option<GatewayPaymentId>, DomainError> {
    value
        .map(GatewayPaymentId::new)
        .transpose()
        .map_err(DomainError::from)
}

fn ts(value: DateTime<Utc>) -> Timestamp {
    Timestamp::from_datetime(value)
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct BalanceRow {
    user_id: i64,
    balance_cents: i64,
    updated_at: DateTime<Utc>,
}

impl From<BalanceRow> for UserBalance {
    fn from(row: BalanceRow) -> Self {
        UserBalance {
            user_id: UserId::new(row.user_id),
            balance_cents: row.balance_cents,
            updated_at: ts(row.updated_at),
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct LedgerRow {
    id: i64,
    user_id: i64,
    entry_type: String,
    delta_cents: i64,
    balance_after_cents: i64,
    comment: Option<String>,
    ref_request_id: Option<i64>,
    admin_id: Option<i64>,
    created_at: DateTime<Utc>,
}

impl TryFrom<LedgerRow> for BalanceLedgerEntry {
    type Error = DomainError;

    fn try_from(row: LedgerRow) -> Result<Self, Self::Error> {
        Ok(BalanceLedgerEntry {
            id: LedgerEntryId::new(row.id),
            user_id: UserId::new(row.user_id),
            entry_type: parse_column("entry_type", &row.entry_type)?,
            delta_cents: row.delta_cents,
            balance_after_cents: row.balance_after_cents,
            comment: row.comment,
            ref_request_id: row.ref_request_id.map(BalanceRequestId::new),
            admin_id: row.admin_id.map(AdminId::new),
            created_at: ts(row.created_at),
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct RequestRow {
    id: i64,
    user_id: i64,
    tx_ref: String,
    status: String,
    admin_comment: Option<String>,
    created_at: DateTime<Utc>,
    reviewed_at: Option<DateTime<Utc>>,
    reviewed_by_admin_id: Option<i64>,
}

impl TryFrom<RequestRow> for BalanceRequest {
    type Error = DomainError;

    fn try_from(row: RequestRow) -> Result<Self, Self::Error> {
        Ok(BalanceRequest {
            id: BalanceRequestId::new(row.id),
            user_id: UserId::new(row.user_id),
            tx_ref: row.tx_ref,
            status: parse_column("status", &row.status)?,
            admin_comment: row.admin_comment,
            created_at: ts(row.created_at),
            reviewed_at: row.reviewed_at.map(ts),
            reviewed_by_admin_id: row.reviewed_by_admin_id.map(AdminId::new),
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct BookingRow {
    id: i64,
    user_id: i64,
    kind: String,
    status: String,
    payment_status: String,
    gateway_payment_id: Option<String>,
    amount: Option<Decimal>,
    payment_date: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<BookingRow> for Booking {
    type Error = DomainError;

    fn try_from(row: BookingRow) -> Result<Self, Self::Error> {
        Ok(Booking {
            id: BookingId::new(row.id),
            user_id: UserId::new(row.user_id),
            kind: parse_column("kind", &row.kind)?,
            status: parse_column("status", &row.status)?,
            payment_status: parse_column("payment_status", &row.payment_status)?,
            gateway_payment_id: parse_payment_id(row.gateway_payment_id)?,
            amount: row.amount,
            payment_date: row.payment_date.map(ts),
            created_at: ts(row.created_at),
            updated_at: ts(row.updated_at),
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct PurchaseRow {
    id: i64,
    user_id: i64,
    order_id: Option<String>,
    amount: Decimal,
    price_currency: String,
    pay_currency: String,
    status: String,
    gateway_status: Option<String>,
    gateway_payment_id: Option<String>,
    pay_address: Option<String>,
    pay_amount: Option<Decimal>,
    raw_create_response: Option<Value>,
    raw_last_ipn: Option<Value>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    finished_at: Option<DateTime<Utc>>,
}

impl TryFrom<PurchaseRow> for Purchase {
    type Error = DomainError;

    fn try_from(row: PurchaseRow) -> Result<Self, Self::Error> {
        let id = PurchaseId::new(row.id);
        Ok(Purchase {
            id,
            user_id: UserId::new(row.user_id),
            order_id: row
                .order_id
                .unwrap_or_else(|| crate::domain::payment::OrderRef::Product(id).to_string()),
            amount: row.amount,
            price_currency: row.price_currency,
            pay_currency: row.pay_currency,
            status: parse_column("status", &row.status)?,
            gateway_status: row.gateway_status,
            gateway_payment_id: parse_payment_id(row.gateway_payment_id)?,
            pay_address: row.pay_address,
            pay_amount: row.pay_amount,
            raw_create_response: row.raw_create_response,
            raw_last_ipn: row.raw_last_ipn,
            created_at: ts(row.created_at),
            updated_at: ts(row.updated_at),
            finished_at: row.finished_at.map(ts),
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct PaymentRecordRow {
    payment_id: String,
    order_id: Option<String>,
    price_amount: Option<Decimal>,
    price_currency: Option<String>,
    pay_amount: Option<Decimal>,
    pay_currency: Option<String>,
    pay_address: Option<String>,
    gateway_status: Option<String>,
    settlement: String,
    booking_id: Option<i64>,
    purchase_id: Option<i64>,
    expires_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
    raw_create_response: Option<Value>,
    raw_last_status: Option<Value>,
    raw_last_ipn: Option<Value>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<PaymentRecordRow> for PaymentRecord {
    type Error = DomainError;

    fn try_from(row: PaymentRecordRow) -> Result<Self, Self::Error> {
        Ok(PaymentRecord {
            payment_id: GatewayPaymentId::new(row.payment_id)?,
            order_id: row.order_id,
            price_amount: row.price_amount,
            price_currency: row.price_currency,
            pay_amount: row.pay_amount,
            pay_currency: row.pay_currency,
            pay_address: row.pay_address,
            gateway_status: row.gateway_status,
            settlement: parse_column("settlement", &row.settlement)?,
            booking_id: row.booking_id.map(BookingId::new),
            purchase_id: row.purchase_id.map(PurchaseId::new),
            expires_at: row.expires_at.map(ts),
            completed_at: row.completed_at.map(ts),
            raw_create_response: row.raw_create_response,
            raw_last_status: row.raw_last_status,
            raw_last_ipn: row.raw_last_ipn,
            created_at: ts(row.created_at),
            updated_at: ts(row.updated_at),
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct EntitlementRow {
    user_id: i64,
    code: String,
    granted_at: DateTime<Utc>,
}

impl TryFrom<EntitlementRow> for Entitlement {
    type Error = DomainError;

    fn try_from(row: EntitlementRow) -> Result<Self, Self::Error> {
        Ok(Entitlement {
            user_id: UserId::new(row.user_id),
            code: EntitlementCode::new(row.code)?,
            granted_at: ts(row.granted_at),
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct IpnEventRow {
    id: i64,
    received_at: DateTime<Utc>,
    payment_id: Option<String>,
    payment_status: Option<String>,
    order_id: Option<String>,
    signature_valid: bool,
    signature_header: Option<String>,
    payload: String,
}

impl From<IpnEventRow> for IpnEvent {
    fn from(row: IpnEventRow) -> Self {
        IpnEvent {
            id: IpnEventId::new(row.id),
            received_at: ts(row.received_at),
            payment_id: row.payment_id,
            payment_status: row.payment_status,
            order_id: row.order_id,
            signature_valid: row.signature_valid,
            signature_header: row.signature_header,
            payload: row.payload,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::balance::{BalanceRequestStatus, LedgerEntryType};
    use crate::domain::payment::{BookingKind, BookingPaymentStatus, PurchaseStatus};

    fn now() -> DateTime<Utc> {
        Utc::now()
    }

    #[test]
    fn ledger_row_converts() {
        let row = LedgerRow {
            id: 7,
            user_id: 1,
            entry_type: "deposit_request_approved".into(),
            delta_cents: 10_000,
            balance_after_cents: 10_000,
            comment: None,
            ref_request_id: Some(3),
            admin_id: Some(99),
            created_at: now(),
        };
        let entry = BalanceLedgerEntry::try_from(row).unwrap();
        assert_eq!(entry.entry_type, LedgerEntryType::DepositRequestApproved);
        assert_eq!(entry.ref_request_id, Some(BalanceRequestId::new(3)));
    }

    #[test]
    fn unknown_entry_type_is_database_error() {
        let row = LedgerRow {
            id: 7,
            user_id: 1,
            entry_type: "mystery".into(),
            delta_cents: 0,
            balance_after_cents: 0,
            comment: None,
            ref_request_id: None,
            admin_id: None,
            created_at: now(),
        };
        let err = BalanceLedgerEntry::try_from(row).unwrap_err();
        assert_eq!(err.code, ErrorCode::DatabaseError);
    }

    #[test]
    fn request_row_converts() {
        let row = RequestRow {
            id: 1,
            user_id: 2,
            tx_ref: "abc".into(),
            status: "approved".into(),
            admin_comment: Some("ok".into()),
            created_at: now(),
            reviewed_at: Some(now()),
            reviewed_by_admin_id: Some(5),
        };
        let request = BalanceRequest::try_from(row).unwrap();
        assert_eq!(request.status, BalanceRequestStatus::Approved);
        assert_eq!(request.reviewed_by_admin_id, Some(AdminId::new(5)));
    }

    #[test]
    fn booking_row_converts() {
        let row = BookingRow {
            id: 3,
            user_id: 1,
            kind: "consultation".into(),
            status: "pending".into(),
            payment_status: "paid".into(),
            gateway_payment_id: Some("555".into()),
            amount: None,
            payment_date: None,
            created_at: now(),
            updated_at: now(),
        };
        let booking = Booking::try_from(row).unwrap();
        assert_eq!(booking.kind, BookingKind::Consultation);
        assert_eq!(booking.payment_status, BookingPaymentStatus::Paid);
        assert_eq!(booking.gateway_payment_id.unwrap().as_str(), "555");
    }

    #[test]
    fn purchase_without_order_id_derives_it() {
        let row = PurchaseRow {
            id: 42,
            user_id: 1,
            order_id: None,
            amount: Decimal::ONE,
            price_currency: "usd".into(),
            pay_currency: "usdttrc20".into(),
            status: "in_progress".into(),
            gateway_status: Some("confirming".into()),
            gateway_payment_id: None,
            pay_address: None,
            pay_amount: None,
            raw_create_response: None,
            raw_last_ipn: None,
            created_at: now(),
            updated_at: now(),
            finished_at: None,
        };
        let purchase = Purchase::try_from(row).unwrap();
        assert_eq!(purchase.order_id, "product-42");
        assert_eq!(purchase.status, PurchaseStatus::InProgress);
    }
}
