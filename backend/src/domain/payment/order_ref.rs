//! Order reference echoed back by the gateway.
//!
//! Invoices are created with `order_id = "<kind>-<local_id>"`. The gateway
//! returns it verbatim in every notification, so it is the primary
//! correlation key. Parsing happens once at the boundary.

use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::{BookingId, PurchaseId, ValidationError};

const BOOKING_PREFIX: &str = "booking-";
const PRODUCT_PREFIX: &str = "product-";

/// Local aggregate an invoice belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrderRef {
    Booking(BookingId),
    Product(PurchaseId),
}

impl OrderRef {
    /// Parses an order id, returning `None` for anything not matching
    /// `booking-<n>` or `product-<n>` with a positive integer.
    pub fn parse(order_id: &str) -> Option<Self> {
        let order_id = order_id.trim();
        if let Some(rest) = order_id.strip_prefix(BOOKING_PREFIX) {
            return parse_positive(rest).map(|id| OrderRef::Booking(BookingId::new(id)));
        }
        if let Some(rest) = order_id.strip_prefix(PRODUCT_PREFIX) {
            return parse_positive(rest).map(|id| OrderRef::Product(PurchaseId::new(id)));
        }
        None
    }
}

fn parse_positive(digits: &str) -> Option<i64> {
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse::<i64>().ok().filter(|id| *id > 0)
}

impl fmt::Display for OrderRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderRef::Booking(id) => write!(f, "{}{}", BOOKING_PREFIX, id),
            OrderRef::Product(id) => write!(f, "{}{}", PRODUCT_PREFIX, id),
        }
    }
}

impl FromStr for OrderRef {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| {
            ValidationError::invalid_format("order_id", "expected booking-<id> or product-<id>")
        })
    }
}
