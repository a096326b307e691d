//! Payable booking as seen by payment reconciliation.
//!
//! Bookings are created elsewhere. This module only owns the payment-side
//! fields and the transitions the gateway can drive.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::{BookingId, GatewayPaymentId, Timestamp, UserId, ValidationError};

/// What was booked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingKind {
    /// Free; never invoiced and never grants paid access.
    Webinar,
    Consultation,
    Payment,
}

/// Lifecycle status of the booking itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Pending,
    Confirmed,
}

/// Payment-side status of a booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingPaymentStatus {
    Pending,
    Paid,
    Failed,
    Refunded,
}

impl BookingKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingKind::Webinar => "webinar",
            BookingKind::Consultation => "consultation",
            BookingKind::Payment => "payment",
        }
    }
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
        }
    }
}

impl BookingPaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingPaymentStatus::Pending => "pending",
            BookingPaymentStatus::Paid => "paid",
            BookingPaymentStatus::Failed => "failed",
            BookingPaymentStatus::Refunded => "refunded",
        }
    }
}

impl FromStr for BookingKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "webinar" => Ok(BookingKind::Webinar),
            "consultation" => Ok(BookingKind::Consultation),
            "payment" => Ok(BookingKind::Payment),
            other => Err(ValidationError::invalid_format("kind", format!("unknown booking kind: {}", other))),
        }
    }
}

impl FromStr for BookingStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(BookingStatus::Pending),
            "confirmed" => Ok(BookingStatus::Confirmed),
            other => Err(ValidationError::invalid_format("status", format!("unknown booking status: {}", other))),
        }
    }
}

impl FromStr for BookingPaymentStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(BookingPaymentStatus::Pending),
            "paid" => Ok(BookingPaymentStatus::Paid),
            "failed" => Ok(BookingPaymentStatus::Failed),
            "refunded" => Ok(BookingPaymentStatus::Refunded),
            other => Err(ValidationError::invalid_format(
                "payment_status",
                format!("unknown booking payment status: {}", other),
            )),
        }
    }
}

impl fmt::Display for BookingPaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A booking row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    pub id: BookingId,
    pub user_id: UserId,
    pub kind: BookingKind,
    pub status: BookingStatus,
    pub payment_status: BookingPaymentStatus,
    pub gateway_payment_id: Option<GatewayPaymentId>,
    pub amount: Option<Decimal>,
    pub payment_date: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Booking {
    /// A new unpaid booking.
    pub fn new(id: BookingId, user_id: UserId, kind: BookingKind) -> Self {
        let now = Timestamp::now();
        Self {
            id,
            user_id,
            kind,
            status: BookingStatus::Pending,
            payment_status: BookingPaymentStatus::Pending,
            gateway_payment_id: None,
            amount: None,
            payment_date: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_paid(&self) -> bool {
        self.payment_status == BookingPaymentStatus::Paid
    }

    pub fn is_refunded(&self) -> bool {
        self.payment_status == BookingPaymentStatus::Refunded
    }

    /// Whether a completed payment for this booking grants paid access.
    pub fn grants_access(&self) -> bool {
        self.kind != BookingKind::Webinar
    }

    /// Records a freshly created invoice. Returns false if already paid.
    pub fn attach_invoice(&mut self, payment_id: GatewayPaymentId, amount: Decimal) -> bool {
        if self.is_paid() {
            return false;
        }
        self.payment_status = BookingPaymentStatus::Pending;
        self.gateway_payment_id = Some(payment_id);
        self.amount = Some(amount);
        self.touch();
        true
    }

    /// Terminal success: paid and confirmed.
    pub fn mark_paid(&mut self, payment_id: GatewayPaymentId, amount: Option<Decimal>) {
        self.payment_status = BookingPaymentStatus::Paid;
        self.status = BookingStatus::Confirmed;
        self.payment_date = Some(Timestamp::now());
        self.gateway_payment_id = Some(payment_id);
        if amount.is_some() {
            self.amount = amount;
        }
        self.touch();
    }

    /// Marks the payment pending again. Returns false if already paid or
    /// refunded.
    pub fn mark_in_progress(&mut self, payment_id: GatewayPaymentId) -> bool {
        if self.is_paid() || self.is_refunded() {
            return false;
        }
        self.payment_status = BookingPaymentStatus::Pending;
        self.gateway_payment_id.get_or_insert(payment_id);
        self.touch();
        true
    }

    /// Marks the payment failed. Returns false if already paid or refunded.
    pub fn mark_failed(&mut self, payment_id: GatewayPaymentId) -> bool {
        if self.is_paid() || self.is_refunded() {
            return false;
        }
        self.payment_status = BookingPaymentStatus::Failed;
        self.gateway_payment_id.get_or_insert(payment_id);
        self.touch();
        true
    }

    /// Refund: payment refunded, booking back to pending, payment date cleared.
    pub fn mark_refunded(&mut self) {
        self.payment_status = BookingPaymentStatus::Refunded;
        self.status = BookingStatus::Pending;
        self.payment_date = None;
        self.touch();
    }

    fn touch(&mut self) {
        self.updated_at = Timestamp::now();
    }
}
