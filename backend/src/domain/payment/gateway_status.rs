//! Gateway payment statuses and the buckets reconciliation acts on.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Payment status as reported by the gateway.
///
/// Unrecognized values are kept verbatim in `Unknown` and treated as
/// still in progress.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GatewayStatus {
    Waiting,
    Confirming,
    Confirmed,
    Sending,
    PartiallyPaid,
    Finished,
    Failed,
    Expired,
    Refunded,
    Unknown(String),
}

/// How a status affects local state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusBucket {
    /// Mirror fields only.
    InProgress,
    /// The only bucket that may grant value.
    Success,
    /// Mark the aggregate failed.
    Failure,
    /// Mark refunded. No clawback.
    Refund,
}

impl GatewayStatus {
    /// Parses a raw status string, case-insensitively.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "waiting" => GatewayStatus::Waiting,
            "confirming" => GatewayStatus::Confirming,
            "confirmed" => GatewayStatus::Confirmed,
            "sending" => GatewayStatus::Sending,
            "partially_paid" => GatewayStatus::PartiallyPaid,
            "finished" => GatewayStatus::Finished,
            "failed" => GatewayStatus::Failed,
            "expired" => GatewayStatus::Expired,
            "refunded" => GatewayStatus::Refunded,
            other => GatewayStatus::Unknown(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            GatewayStatus::Waiting => "waiting",
            GatewayStatus::Confirming => "confirming",
            GatewayStatus::Confirmed => "confirmed",
            GatewayStatus::Sending => "sending",
            GatewayStatus::PartiallyPaid => "partially_paid",
            GatewayStatus::Finished => "finished",
            GatewayStatus::Failed => "failed",
            GatewayStatus::Expired => "expired",
            GatewayStatus::Refunded => "refunded",
            GatewayStatus::Unknown(raw) => raw,
        }
    }

    pub fn bucket(&self) -> StatusBucket {
        match self {
            GatewayStatus::Finished => StatusBucket::Success,
            GatewayStatus::Failed | GatewayStatus::Expired => StatusBucket::Failure,
            GatewayStatus::Refunded => StatusBucket::Refund,
            GatewayStatus::Waiting
            | GatewayStatus::Confirming
            | GatewayStatus::Confirmed
            | GatewayStatus::Sending
            | GatewayStatus::PartiallyPaid
            | GatewayStatus::Unknown(_) => StatusBucket::InProgress,
        }
    }
}

impl fmt::Display for GatewayStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for GatewayStatus {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for GatewayStatus {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(GatewayStatus::parse(&raw))
    }
}
