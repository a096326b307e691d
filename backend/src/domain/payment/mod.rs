//! Payment domain - gateway invoices, IPN verification, and reconciliation.
//!
//! # Module Organization
//!
//! - `order_ref` - `booking-<id>` / `product-<id>` correlation keys
//! - `gateway_status` - Gateway status enum and its reconciliation buckets
//! - `booking`, `purchase` - Local aggregates a payment settles
//! - `payment_record` - Local mirror of a gateway payment
//! - `webhook_verifier` - HMAC-SHA512 IPN signature checks
//! - `reconciliation` - Applies snapshots to local state

mod booking;
mod currency;
mod errors;
mod gateway_status;
mod invoice;
mod ipn_event;
mod notification;
mod order_ref;
mod payment_record;
mod purchase;
mod reconciliation;
mod webhook_errors;
mod webhook_verifier;

pub use booking::{Booking, BookingKind, BookingPaymentStatus, BookingStatus};
pub use currency::{normalize_price_currency, stablecoin_peg};
pub use errors::PaymentError;
pub use gateway_status::{GatewayStatus, StatusBucket};
pub use invoice::{Invoice, InvoiceRequest};
pub use ipn_event::{IpnEvent, NewIpnEvent};
pub use notification::{NotificationSource, PaymentNotification};
pub use order_ref::OrderRef;
pub use payment_record::{PaymentRecord, PaymentTarget, SettlementStatus};
pub use purchase::{NewPurchase, Purchase, PurchaseStatus, DEFAULT_PAY_CURRENCY};
pub use reconciliation::{reconcile, ReconcileOutcome};
pub use webhook_errors::WebhookError;
pub use webhook_verifier::{canonical_json, sign_payload, IpnVerifier, SignatureScheme, SIGNATURE_HEADER};
