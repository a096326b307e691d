//! HTTP DTOs for payment endpoints.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::application::handlers::{
    CreateInvoiceResult, CreateProductPaymentResult, PollPaymentStatusResult,
};
use crate::domain::foundation::{PurchaseId, Timestamp};

// ════════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Request to invoice an existing order id.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatePaymentRequest {
    pub order_id: String,
    /// Accepts a JSON number or a decimal string.
    pub amount: Decimal,
    pub price_currency: String,
    #[serde(default)]
    pub pay_currency: Option<String>,
    #[serde(default)]
    pub order_description: Option<String>,
}

fn default_price_currency() -> String {
    "usd".to_string()
}

/// Request to buy a product.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateProductPaymentRequest {
    pub amount: Decimal,
    #[serde(default = "default_price_currency")]
    pub price_currency: String,
    #[serde(default)]
    pub pay_currency: Option<String>,
    #[serde(default)]
    pub order_description: Option<String>,
}

// ════════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Invoice details the client needs to show a payment screen.
#[derive(Debug, Clone, Serialize)]
pub struct CreatePaymentResponse {
    pub payment_id: String,
    pub pay_address: Option<String>,
    pub pay_amount: Option<f64>,
    pub pay_currency: Option<String>,
}

impl From<CreateInvoiceResult> for CreatePaymentResponse {
    fn from(invoice: CreateInvoiceResult) -> Self {
        Self {
            payment_id: invoice.payment_id.to_string(),
            pay_address: invoice.pay_address,
            pay_amount: invoice.pay_amount.and_then(|a| a.to_f64()),
            pay_currency: invoice.pay_currency,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateProductPaymentResponse {
    pub purchase_id: PurchaseId,
    pub order_id: String,
    pub payment_id: String,
    pub pay_address: Option<String>,
    pub pay_amount: Option<f64>,
    pub pay_currency: Option<String>,
    pub payment_status: Option<String>,
    pub expiration_estimate_date: Option<Timestamp>,
}

impl From<CreateProductPaymentResult> for CreateProductPaymentResponse {
    fn from(result: CreateProductPaymentResult) -> Self {
        let invoice = result.invoice;
        Self {
            purchase_id: result.purchase.id,
            order_id: result.purchase.order_id,
            payment_id: invoice.payment_id.to_string(),
            pay_address: invoice.pay_address,
            pay_amount: invoice.pay_amount.and_then(|a| a.to_f64()),
            pay_currency: invoice.pay_currency,
            payment_status: invoice.status.map(|s| s.as_str().to_string()),
            expiration_estimate_date: invoice.expires_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PaymentStatusResponse {
    pub payment_id: String,
    pub payment_status: String,
}

impl From<PollPaymentStatusResult> for PaymentStatusResponse {
    fn from(result: PollPaymentStatusResult) -> Self {
        Self {
            payment_id: result.payment_id.to_string(),
            payment_status: result.status.as_str().to_string(),
        }
    }
}

/// Acknowledgement returned to the gateway.
#[derive(Debug, Clone, Serialize)]
pub struct IpnAckResponse {
    pub status: &'static str,
}

impl IpnAckResponse {
    pub fn ok() -> Self {
        Self { status: "ok" }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn amount_accepts_number_or_string() {
        let from_number: CreatePaymentRequest = serde_json::from_value(json!({
            "order_id": "booking-1", "amount": 12.5, "price_currency": "usd"
        }))
        .unwrap();
        let from_string: CreatePaymentRequest = serde_json::from_value(json!({
            "order_id": "booking-1", "amount": "12.5", "price_currency": "usd"
        }))
        .unwrap();
        assert_eq!(from_number.amount, dec!(12.5));
        assert_eq!(from_string.amount, dec!(12.5));
        assert!(from_number.pay_currency.is_none());
    }

    #[test]
    fn product_request_defaults_to_usd() {
        let req: CreateProductPaymentRequest = serde_json::from_value(json!({"amount": 5})).unwrap();
        assert_eq!(req.price_currency, "usd");
    }
}
