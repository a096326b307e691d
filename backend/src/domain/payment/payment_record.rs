//! Local mirror of a gateway payment.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::{
    BookingId, GatewayPaymentId, PurchaseId, StateMachine, Timestamp, ValidationError,
};

use super::{Invoice, NotificationSource, PaymentNotification};

/// Local settlement state of a gateway payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettlementStatus {
    Pending,
    Completed,
    Failed,
    Refunded,
}

impl SettlementStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SettlementStatus::Pending => "pending",
            SettlementStatus::Completed => "completed",
            SettlementStatus::Failed => "failed",
            SettlementStatus::Refunded => "refunded",
        }
    }
}

impl fmt::Display for SettlementStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SettlementStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(SettlementStatus::Pending),
            "completed" => Ok(SettlementStatus::Completed),
            "failed" => Ok(SettlementStatus::Failed),
            "refunded" => Ok(SettlementStatus::Refunded),
            other => Err(ValidationError::invalid_format(
                "settlement",
                format!("unknown settlement status: {}", other),
            )),
        }
    }
}

impl StateMachine for SettlementStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use SettlementStatus::*;
        matches!(
            (self, target),
            (Pending, Completed)
                | (Pending, Failed)
                | (Pending, Refunded)
                | (Failed, Completed)
                | (Failed, Refunded)
                | (Completed, Refunded)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use SettlementStatus::*;
        match self {
            Pending => vec![Completed, Failed, Refunded],
            Failed => vec![Completed, Refunded],
            Completed => vec![Refunded],
            Refunded => vec![],
        }
    }
}

/// Local aggregate a payment has been tied to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum PaymentTarget {
    Booking(BookingId),
    Purchase(PurchaseId),
}

/// Mirror of one gateway payment, keyed by its payment id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub payment_id: GatewayPaymentId,
    pub order_id: Option<String>,
    pub price_amount: Option<Decimal>,
    pub price_currency: Option<String>,
    pub pay_amount: Option<Decimal>,
    pub pay_currency: Option<String>,
    pub pay_address: Option<String>,
    pub gateway_status: Option<String>,
    pub settlement: SettlementStatus,
    pub booking_id: Option<BookingId>,
    pub purchase_id: Option<PurchaseId>,
    pub expires_at: Option<Timestamp>,
    pub completed_at: Option<Timestamp>,
    pub raw_create_response: Option<Value>,
    pub raw_last_status: Option<Value>,
    pub raw_last_ipn: Option<Value>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl PaymentRecord {
    /// An empty mirror for a payment seen for the first time.
    pub fn new(payment_id: GatewayPaymentId) -> Self {
        let now = Timestamp::now();
        Self {
            payment_id,
            order_id: None,
            price_amount: None,
            price_currency: None,
            pay_amount: None,
            pay_currency: None,
            pay_address: None,
            gateway_status: None,
            settlement: SettlementStatus::Pending,
            booking_id: None,
            purchase_id: None,
            expires_at: None,
            completed_at: None,
            raw_create_response: None,
            raw_last_status: None,
            raw_last_ipn: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Copies fields from a freshly created invoice.
    pub fn apply_invoice(&mut self, order_id: &str, invoice: &Invoice) {
        self.order_id = Some(order_id.to_string());
        self.price_amount = invoice.price_amount.or(self.price_amount);
        self.price_currency = invoice.price_currency.clone().or(self.price_currency.take());
        self.pay_amount = invoice.pay_amount;
        self.pay_currency = invoice.pay_currency.clone();
        self.pay_address = invoice.pay_address.clone();
        self.gateway_status = invoice.status.as_ref().map(|s| s.as_str().to_string());
        self.expires_at = invoice.expires_at;
        self.raw_create_response = Some(invoice.raw.clone());
        self.touch();
    }

    /// Copies mirror fields from a snapshot. Settlement is untouched.
    pub fn apply_notification(&mut self, notification: &PaymentNotification) {
        if let Some(order_id) = &notification.order_id {
            self.order_id = Some(order_id.clone());
        }
        if notification.price_amount.is_some() {
            self.price_amount = notification.price_amount;
        }
        if let Some(currency) = &notification.price_currency {
            self.price_currency = Some(currency.clone());
        }
        if notification.pay_amount.is_some() {
            self.pay_amount = notification.pay_amount;
        }
        if let Some(currency) = &notification.pay_currency {
            self.pay_currency = Some(currency.clone());
        }
        if let Some(address) = &notification.pay_address {
            self.pay_address = Some(address.clone());
        }
        if notification.expires_at.is_some() {
            self.expires_at = notification.expires_at;
        }
        self.gateway_status = Some(notification.status.as_str().to_string());
        match notification.source {
            NotificationSource::Verified => self.raw_last_ipn = Some(notification.raw.clone()),
            NotificationSource::Polled => self.raw_last_status = Some(notification.raw.clone()),
        }
        self.touch();
    }

    /// Ties the payment to its local aggregate.
    pub fn link(&mut self, target: PaymentTarget) {
        match target {
            PaymentTarget::Booking(id) => self.booking_id = Some(id),
            PaymentTarget::Purchase(id) => self.purchase_id = Some(id),
        }
    }

    /// Moves settlement forward if the transition is allowed.
    ///
    /// Returns whether the status changed.
    pub fn settle(&mut self, target: SettlementStatus) -> bool {
        match self.settlement.transition_to(target) {
            Ok(next) => {
                self.settlement = next;
                if next == SettlementStatus::Completed {
                    self.completed_at = Some(Timestamp::now());
                }
                self.touch();
                true
            }
            Err(_) => false,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.settlement == SettlementStatus::Completed
    }

    fn touch(&mut self) {
        self.updated_at = Timestamp::now();
    }
}
