//! Append-only audit log entries for IPN deliveries.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::foundation::{IpnEventId, Timestamp};

use super::notification::text_field;

/// A logged IPN delivery. Never updated or deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpnEvent {
    pub id: IpnEventId,
    pub received_at: Timestamp,
    pub payment_id: Option<String>,
    pub payment_status: Option<String>,
    pub order_id: Option<String>,
    pub signature_valid: bool,
    pub signature_header: Option<String>,
    /// Body exactly as received.
    pub payload: String,
}

/// An IPN delivery before storage assigns its id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewIpnEvent {
    pub received_at: Timestamp,
    pub payment_id: Option<String>,
    pub payment_status: Option<String>,
    pub order_id: Option<String>,
    pub signature_valid: bool,
    pub signature_header: Option<String>,
    pub payload: String,
}

impl NewIpnEvent {
    /// Extracts the indexed fields from a parsed body.
    pub fn from_payload(
        parsed: &Value,
        raw_body: &[u8],
        signature_header: Option<&str>,
        signature_valid: bool,
    ) -> Self {
        Self {
            received_at: Timestamp::now(),
            payment_id: text_field(parsed, "payment_id"),
            payment_status: text_field(parsed, "payment_status"),
            order_id: text_field(parsed, "order_id"),
            signature_valid,
            signature_header: signature_header.map(str::to_string),
            payload: String::from_utf8_lossy(raw_body).into_owned(),
        }
    }

    pub fn into_event(self, id: IpnEventId) -> IpnEvent {
        IpnEvent {
            id,
            received_at: self.received_at,
            payment_id: self.payment_id,
            payment_status: self.payment_status,
            order_id: self.order_id,
            signature_valid: self.signature_valid,
            signature_header: self.signature_header,
            payload: self.payload,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn extracts_indexed_fields() {
        let body = br#"{"payment_id":123,"payment_status":"finished","order_id":"product-1"}"#;
        let parsed: Value = serde_json::from_slice(body).unwrap();

        let event = NewIpnEvent::from_payload(&parsed, body, Some("abc"), false);

        assert_eq!(event.payment_id.as_deref(), Some("123"));
        assert_eq!(event.payment_status.as_deref(), Some("finished"));
        assert_eq!(event.order_id.as_deref(), Some("product-1"));
        assert!(!event.signature_valid);
        assert_eq!(event.signature_header.as_deref(), Some("abc"));
        assert_eq!(event.payload.as_bytes(), body);
    }

    #[test]
    fn tolerates_missing_fields() {
        let event = NewIpnEvent::from_payload(&json!({}), b"{}", None, true);
        assert!(event.payment_id.is_none());
        assert!(event.signature_header.is_none());
    }
}
