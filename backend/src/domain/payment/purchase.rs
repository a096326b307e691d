//! Standalone product purchases paid through the gateway.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::{GatewayPaymentId, PurchaseId, Timestamp, UserId, ValidationError};

use super::{GatewayStatus, Invoice, OrderRef};

/// Pay currency used when the buyer does not pick one.
pub const DEFAULT_PAY_CURRENCY: &str = "usdttrc20";

/// Status of a product purchase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PurchaseStatus {
    Pending,
    InProgress,
    Finished,
    Failed,
    Expired,
    Refunded,
}

impl PurchaseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PurchaseStatus::Pending => "pending",
            PurchaseStatus::InProgress => "in_progress",
            PurchaseStatus::Finished => "finished",
            PurchaseStatus::Failed => "failed",
            PurchaseStatus::Expired => "expired",
            PurchaseStatus::Refunded => "refunded",
        }
    }
}

impl fmt::Display for PurchaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PurchaseStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(PurchaseStatus::Pending),
            "in_progress" => Ok(PurchaseStatus::InProgress),
            "finished" => Ok(PurchaseStatus::Finished),
            "failed" => Ok(PurchaseStatus::Failed),
            "expired" => Ok(PurchaseStatus::Expired),
            "refunded" => Ok(PurchaseStatus::Refunded),
            other => Err(ValidationError::invalid_format(
                "status",
                format!("unknown purchase status: {}", other),
            )),
        }
    }
}

/// A product purchase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Purchase {
    pub id: PurchaseId,
    pub user_id: UserId,
    pub order_id: String,
    pub amount: Decimal,
    pub price_currency: String,
    pub pay_currency: String,
    pub status: PurchaseStatus,
    /// Last raw status string reported by the gateway.
    pub gateway_status: Option<String>,
    pub gateway_payment_id: Option<GatewayPaymentId>,
    pub pay_address: Option<String>,
    pub pay_amount: Option<Decimal>,
    pub raw_create_response: Option<Value>,
    pub raw_last_ipn: Option<Value>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub finished_at: Option<Timestamp>,
}

/// Input for inserting a purchase; storage assigns id and order id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPurchase {
    pub user_id: UserId,
    pub amount: Decimal,
    pub price_currency: String,
    pub pay_currency: String,
}

impl NewPurchase {
    /// Validates and normalizes purchase input.
    pub fn new(
        user_id: UserId,
        amount: Decimal,
        price_currency: &str,
        pay_currency: Option<&str>,
    ) -> Result<Self, ValidationError> {
        if amount <= Decimal::ZERO {
            return Err(ValidationError::invalid_format("amount", "must be greater than zero"));
        }
        let price_currency = price_currency.trim().to_ascii_lowercase();
        if price_currency.is_empty() {
            return Err(ValidationError::empty_field("price_currency"));
        }
        let pay_currency = pay_currency
            .map(|c| c.trim().to_ascii_lowercase())
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| DEFAULT_PAY_CURRENCY.to_string());

        Ok(Self {
            user_id,
            amount,
            price_currency,
            pay_currency,
        })
    }

    /// Materializes the row once storage has assigned an id.
    pub fn into_purchase(self, id: PurchaseId) -> Purchase {
        let now = Timestamp::now();
        Purchase {
            id,
            user_id: self.user_id,
            order_id: OrderRef::Product(id).to_string(),
            amount: self.amount,
            price_currency: self.price_currency,
            pay_currency: self.pay_currency,
            status: PurchaseStatus::Pending,
            gateway_status: None,
            gateway_payment_id: None,
            pay_address: None,
            pay_amount: None,
            raw_create_response: None,
            raw_last_ipn: None,
            created_at: now,
            updated_at: now,
            finished_at: None,
        }
    }
}

impl Purchase {
    pub fn is_finished(&self) -> bool {
        self.status == PurchaseStatus::Finished
    }

    pub fn is_refunded(&self) -> bool {
        self.status == PurchaseStatus::Refunded
    }

    /// Records the gateway invoice created for this purchase. Returns
    /// false if the purchase is already finished.
    pub fn attach_invoice(&mut self, invoice: &Invoice) -> bool {
        if self.is_finished() {
            return false;
        }
        self.gateway_payment_id = Some(invoice.payment_id.clone());
        self.pay_address = invoice.pay_address.clone();
        self.pay_amount = invoice.pay_amount;
        if let Some(currency) = &invoice.pay_currency {
            self.pay_currency = currency.clone();
        }
        if let Some(status) = &invoice.status {
            self.gateway_status = Some(status.as_str().to_string());
        }
        self.raw_create_response = Some(invoice.raw.clone());
        self.touch();
        true
    }

    /// Stores the latest raw IPN and gateway status string.
    pub fn mirror_ipn(&mut self, status: &GatewayStatus, raw: &Value) {
        self.gateway_status = Some(status.as_str().to_string());
        self.raw_last_ipn = Some(raw.clone());
        self.touch();
    }

    /// Terminal success.
    pub fn mark_finished(
        &mut self,
        payment_id: GatewayPaymentId,
        pay_address: Option<String>,
        pay_amount: Option<Decimal>,
    ) {
        self.status = PurchaseStatus::Finished;
        self.gateway_payment_id = Some(payment_id);
        if pay_address.is_some() {
            self.pay_address = pay_address;
        }
        if pay_amount.is_some() {
            self.pay_amount = pay_amount;
        }
        self.finished_at = Some(Timestamp::now());
        self.touch();
    }

    /// Moves to in-progress. Returns false if already finished or refunded.
    pub fn mark_in_progress(&mut self, status: &GatewayStatus) -> bool {
        if self.is_finished() || self.is_refunded() {
            return false;
        }
        self.status = match status {
            GatewayStatus::Waiting => PurchaseStatus::Pending,
            _ => PurchaseStatus::InProgress,
        };
        self.touch();
        true
    }

    /// Marks failed or expired. Returns false if already finished or
    /// refunded.
    pub fn mark_failed(&mut self, status: &GatewayStatus) -> bool {
        if self.is_finished() || self.is_refunded() {
            return false;
        }
        self.status = match status {
            GatewayStatus::Expired => PurchaseStatus::Expired,
            _ => PurchaseStatus::Failed,
        };
        self.touch();
        true
    }

    pub fn mark_refunded(&mut self) {
        self.status = PurchaseStatus::Refunded;
        self.touch();
    }

    fn touch(&mut self) {
        self.updated_at = Timestamp::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn purchase() -> Purchase {
        NewPurchase::new(UserId::new(1), dec!(10), "USD", None)
            .unwrap()
            .into_purchase(PurchaseId::new(42))
    }

    fn pid() -> GatewayPaymentId {
        GatewayPaymentId::new("999").unwrap()
    }

    #[test]
    fn new_purchase_defaults_pay_currency() {
        let p = purchase();
        assert_eq!(p.pay_currency, DEFAULT_PAY_CURRENCY);
        assert_eq!(p.price_currency, "usd");
        assert_eq!(p.order_id, "product-42");
        assert_eq!(p.status, PurchaseStatus::Pending);
    }

    #[test]
    fn new_purchase_requires_positive_amount() {
        assert!(NewPurchase::new(UserId::new(1), dec!(0), "usd", None).is_err());
        assert!(NewPurchase::new(UserId::new(1), dec!(-1), "usd", None).is_err());
    }

    #[test]
    fn attach_invoice_copies_gateway_fields() {
        let mut p = purchase();
        let invoice = Invoice {
            payment_id: pid(),
            status: Some(GatewayStatus::Waiting),
            pay_address: Some("TAddr".into()),
            pay_amount: Some(dec!(10.2)),
            pay_currency: Some("usdttrc20".into()),
            price_amount: Some(dec!(10)),
            price_currency: Some("usd".into()),
            expires_at: None,
            raw: json!({"payment_id": "999"}),
        };
        assert!(p.attach_invoice(&invoice));

        assert_eq!(p.gateway_payment_id, Some(pid()));
        assert_eq!(p.pay_address.as_deref(), Some("TAddr"));
        assert_eq!(p.gateway_status.as_deref(), Some("waiting"));
        assert!(p.raw_create_response.is_some());
    }

    #[test]
    fn finished_purchase_refuses_new_invoice() {
        let mut p = purchase();
        p.mark_finished(pid(), Some("TAddr".into()), None);

        let invoice = Invoice::from_json(json!({"payment_id": "1234", "pay_address": "TOther"})).unwrap();
        assert!(!p.attach_invoice(&invoice));
        assert_eq!(p.gateway_payment_id, Some(pid()));
        assert_eq!(p.pay_address.as_deref(), Some("TAddr"));
    }

    #[test]
    fn finished_purchase_ignores_late_failure() {
        let mut p = purchase();
        p.mark_finished(pid(), None, None);

        assert!(!p.mark_failed(&GatewayStatus::Expired));
        assert!(!p.mark_in_progress(&GatewayStatus::Confirming));
        assert!(p.is_finished());
    }

    #[test]
    fn expired_maps_to_expired() {
        let mut p = purchase();
        assert!(p.mark_failed(&GatewayStatus::Expired));
        assert_eq!(p.status, PurchaseStatus::Expired);
    }

    #[test]
    fn refund_applies_after_finish() {
        let mut p = purchase();
        p.mark_finished(pid(), None, None);
        p.mark_refunded();
        assert_eq!(p.status, PurchaseStatus::Refunded);
    }
}
