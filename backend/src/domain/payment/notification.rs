//! Payment status snapshots arriving from the gateway.
//!
//! Both IPN callbacks and polled status responses carry the same JSON
//! shape. Where the snapshot came from decides what reconciliation may do
//! with it.

use rust_decimal::Decimal;
use serde_json::Value;
use std::str::FromStr;

use crate::domain::foundation::{GatewayPaymentId, Timestamp, ValidationError};

use super::{GatewayStatus, OrderRef};

/// Origin of a payment snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationSource {
    /// Signed IPN callback. May settle payments.
    Verified,
    /// Outbound status poll. Mirror updates only.
    Polled,
}

/// A parsed payment snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentNotification {
    pub payment_id: GatewayPaymentId,
    pub status: GatewayStatus,
    pub order_id: Option<String>,
    pub price_amount: Option<Decimal>,
    pub price_currency: Option<String>,
    pub pay_amount: Option<Decimal>,
    pub actually_paid: Option<Decimal>,
    pub pay_currency: Option<String>,
    pub pay_address: Option<String>,
    pub expires_at: Option<Timestamp>,
    pub raw: Value,
    pub source: NotificationSource,
}

impl PaymentNotification {
    /// Parses a gateway payload.
    ///
    /// # Errors
    ///
    /// `EmptyField` when `payment_id` or `payment_status` is missing or blank.
    pub fn from_json(raw: Value, source: NotificationSource) -> Result<Self, ValidationError> {
        let payment_id = raw
            .get("payment_id")
            .and_then(GatewayPaymentId::from_json)
            .ok_or_else(|| ValidationError::empty_field("payment_id"))?;

        let status = text_field(&raw, "payment_status")
            .map(|s| GatewayStatus::parse(&s))
            .ok_or_else(|| ValidationError::empty_field("payment_status"))?;

        Ok(Self {
            payment_id,
            status,
            order_id: text_field(&raw, "order_id"),
            price_amount: decimal_field(&raw, "price_amount"),
            price_currency: text_field(&raw, "price_currency"),
            pay_amount: decimal_field(&raw, "pay_amount"),
            actually_paid: decimal_field(&raw, "actually_paid"),
            pay_currency: text_field(&raw, "pay_currency"),
            pay_address: text_field(&raw, "pay_address"),
            expires_at: text_field(&raw, "expiration_estimate_date")
                .and_then(|s| Timestamp::parse_rfc3339(&s)),
            raw,
            source,
        })
    }

    /// The parsed order reference, if the order id is well formed.
    pub fn order_ref(&self) -> Option<OrderRef> {
        self.order_id.as_deref().and_then(OrderRef::parse)
    }
}

/// Reads a non-blank string (or number rendered as text) field.
pub(crate) fn text_field(raw: &Value, key: &str) -> Option<String> {
    match raw.get(key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Reads a decimal sent either as a JSON number or a numeric string.
pub(crate) fn decimal_field(raw: &Value, key: &str) -> Option<Decimal> {
    let text = match raw.get(key)? {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.trim().to_string(),
        _ => return None,
    };
    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .ok()
}
