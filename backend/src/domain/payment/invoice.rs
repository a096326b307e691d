//! Invoice request and response exchanged with the gateway.

use rust_decimal::Decimal;
use serde_json::Value;

use crate::domain::foundation::{GatewayPaymentId, Timestamp, ValidationError};

use super::notification::{decimal_field, text_field};
use super::GatewayStatus;

/// Parameters for a new gateway invoice.
#[derive(Debug, Clone, PartialEq)]
pub struct InvoiceRequest {
    /// Correlation key echoed back in notifications.
    pub order_id: String,
    pub price_amount: Decimal,
    pub price_currency: String,
    pub pay_currency: String,
    pub order_description: String,
    pub ipn_callback_url: Option<String>,
}

/// A created invoice.
#[derive(Debug, Clone, PartialEq)]
pub struct Invoice {
    pub payment_id: GatewayPaymentId,
    pub status: Option<GatewayStatus>,
    pub pay_address: Option<String>,
    pub pay_amount: Option<Decimal>,
    pub pay_currency: Option<String>,
    pub price_amount: Option<Decimal>,
    pub price_currency: Option<String>,
    pub expires_at: Option<Timestamp>,
    /// Full create response.
    pub raw: Value,
}

impl Invoice {
    /// Reads a create-payment response body.
    ///
    /// Only `payment_id` is required.
    pub fn from_json(raw: Value) -> Result<Self, ValidationError> {
        let payment_id = raw
            .get("payment_id")
            .and_then(GatewayPaymentId::from_json)
            .ok_or_else(|| ValidationError::empty_field("payment_id"))?;

        Ok(Self {
            payment_id,
            status: text_field(&raw, "payment_status").map(|s| GatewayStatus::parse(&s)),
            pay_address: text_field(&raw, "pay_address"),
            pay_amount: decimal_field(&raw, "pay_amount"),
            pay_currency: text_field(&raw, "pay_currency"),
            price_amount: decimal_field(&raw, "price_amount"),
            price_currency: text_field(&raw, "price_currency"),
            expires_at: text_field(&raw, "expiration_estimate_date")
                .and_then(|s| Timestamp::parse_rfc3339(&s)),
            raw,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn reads_create_response() {
        let raw = json!({
            "payment_id": "5524759814",
            "payment_status": "waiting",
            "pay_address": "TNDFkiSmBQorNFacb3735q8MnT29sn8BLn",
            "price_amount": 5,
            "price_currency": "usd",
            "pay_amount": 5.00395,
            "pay_currency": "usdttrc20",
            "order_id": "product-7",
            "expiration_estimate_date": "2024-03-01T12:20:00.000Z"
        });

        let invoice = Invoice::from_json(raw).unwrap();
        assert_eq!(invoice.payment_id.as_str(), "5524759814");
        assert_eq!(invoice.status, Some(GatewayStatus::Waiting));
        assert_eq!(invoice.pay_amount, Some(dec!(5.00395)));
        assert_eq!(invoice.price_amount, Some(dec!(5)));
        assert!(invoice.expires_at.is_some());
    }

    #[test]
    fn payment_id_is_required() {
        let err = Invoice::from_json(json!({ "pay_address": "T" })).unwrap_err();
        assert_eq!(err, ValidationError::empty_field("payment_id"));
    }

    #[test]
    fn bad_expiry_is_dropped() {
        let invoice = Invoice::from_json(json!({
            "payment_id": 1,
            "expiration_estimate_date": "soon"
        }))
        .unwrap();
        assert!(invoice.expires_at.is_none());
    }
}
