//! Wire types for the NOWPayments REST API.

use rust_decimal::prelude::ToPrimitive;
use serde::Serialize;
use serde_json::Value;

use crate::domain::payment::InvoiceRequest;

/// Body of `POST /payment`.
///
/// Amounts travel as JSON numbers.
#[derive(Debug, Serialize)]
pub(crate) struct CreatePaymentBody<'a> {
    pub price_amount: f64,
    pub price_currency: &'a str,
    pub pay_currency: &'a str,
    pub order_id: &'a str,
    pub order_description: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ipn_callback_url: Option<&'a str>,
}

impl<'a> CreatePaymentBody<'a> {
    pub fn from_request(request: &'a InvoiceRequest) -> Option<Self> {
        Some(Self {
            price_amount: request.price_amount.to_f64()?,
            price_currency: &request.price_currency,
            pay_currency: &request.pay_currency,
            order_id: &request.order_id,
            order_description: &request.order_description,
            ipn_callback_url: request.ipn_callback_url.as_deref(),
        })
    }
}

const GENERIC_ERROR: &str = "NOWPayments API error";

/// Picks the client-facing message out of an error body: the JSON
/// `message` field, else the raw text.
pub(crate) fn error_message(body: &str) -> String {
    let from_json = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
        .filter(|m| !m.trim().is_empty());

    match from_json {
        Some(message) => message,
        None if body.trim().is_empty() => GENERIC_ERROR.to_string(),
        None => body.trim().to_string(),
    }
}
