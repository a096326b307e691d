//! Strongly-typed identifier value objects.
//!
//! Local rows are keyed by database sequences, so identifiers wrap `i64`.
//! The gateway's payment identifier is opaque text and gets its own type.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

use super::ValidationError;

macro_rules! sequence_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Wraps a raw database identifier.
            pub const fn new(id: i64) -> Self {
                Self(id)
            }

            /// Returns the raw database identifier.
            pub const fn value(&self) -> i64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(s.trim().parse()?))
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id)
            }
        }
    };
}

sequence_id!(
    /// Identifier of an end user.
    UserId
);
sequence_id!(
    /// Identifier of an administrator acting on balances.
    AdminId
);
sequence_id!(
    /// Identifier of a payable booking.
    BookingId
);
sequence_id!(
    /// Identifier of a standalone product purchase.
    PurchaseId
);
sequence_id!(
    /// Identifier of a user-submitted deposit request.
    BalanceRequestId
);
sequence_id!(
    /// Identifier of an immutable ledger row.
    LedgerEntryId
);
sequence_id!(
    /// Identifier of a logged IPN delivery.
    IpnEventId
);

/// Payment identifier assigned by the gateway.
///
/// The gateway sends it as either a JSON number or a string; both are
/// normalized to text.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GatewayPaymentId(String);

impl GatewayPaymentId {
    /// Creates a payment id, rejecting blank input.
    pub fn new(id: impl Into<String>) -> Result<Self, ValidationError> {
        let id = id.into().trim().to_string();
        if id.is_empty() {
            return Err(ValidationError::empty_field("payment_id"));
        }
        Ok(Self(id))
    }

    /// Creates a payment id from caller-supplied text, accepting ASCII
    /// digits only. Used where the id ends up in a gateway URL.
    pub fn numeric(id: impl Into<String>) -> Result<Self, ValidationError> {
        let id = Self::new(id)?;
        if !id.is_numeric() {
            return Err(ValidationError::invalid_format(
                "payment_id",
                "must contain only digits",
            ));
        }
        Ok(id)
    }

    /// True when the id consists of ASCII digits only.
    pub fn is_numeric(&self) -> bool {
        self.0.bytes().all(|b| b.is_ascii_digit())
    }

    /// Builds a payment id from a JSON value (string or number).
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::String(s) => Self::new(s.as_str()).ok(),
            serde_json::Value::Number(n) => Self::new(n.to_string()).ok(),
            _ => None,
        }
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GatewayPaymentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for GatewayPaymentId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}
