//! Mock payment gateway for testing.
//!
//! Supports:
//! - Generated invoices with sequential payment ids
//! - Pre-configured status snapshots
//! - Error injection per method
//! - Call tracking

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::domain::foundation::GatewayPaymentId;
use crate::domain::payment::{
    GatewayStatus, Invoice, InvoiceRequest, NotificationSource, PaymentNotification,
};
use crate::ports::{GatewayError, PaymentGateway};

/// First payment id handed out by the mock.
const FIRST_PAYMENT_ID: u64 = 5_000_000_001;

/// Mock gateway for unit and integration tests.
#[derive(Clone, Default)]
pub struct MockPaymentGateway {
    inner: Arc<Mutex<MockState>>,
}

#[derive(Default)]
struct MockState {
    issued: u64,
    statuses: HashMap<String, Value>,
    create_error: Option<GatewayError>,
    status_error: Option<GatewayError>,
    invoice_requests: Vec<InvoiceRequest>,
    status_requests: Vec<GatewayPaymentId>,
}

impl MockPaymentGateway {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Configuration Methods
    // ════════════════════════════════════════════════════════════════════════════

    /// Fail the next `create_invoice` call.
    pub fn fail_next_create(&self, error: GatewayError) {
        self.state().create_error = Some(error);
    }

    /// Fail the next `get_status` call.
    pub fn fail_next_status(&self, error: GatewayError) {
        self.state().status_error = Some(error);
    }

    /// Sets the snapshot returned for a payment id.
    pub fn set_status(&self, payment_id: &str, status: GatewayStatus, order_id: Option<&str>) {
        let mut body = json!({
            "payment_id": payment_id,
            "payment_status": status.as_str(),
        });
        if let Some(order_id) = order_id {
            body["order_id"] = json!(order_id);
        }
        self.state().statuses.insert(payment_id.to_string(), body);
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Call Tracking
    // ════════════════════════════════════════════════════════════════════════════

    /// Every invoice request received, in order.
    pub fn invoice_requests(&self) -> Vec<InvoiceRequest> {
        self.state().invoice_requests.clone()
    }

    pub fn status_requests(&self) -> Vec<GatewayPaymentId> {
        self.state().status_requests.clone()
    }
}

#[async_trait]
impl PaymentGateway for MockPaymentGateway {
    async fn create_invoice(&self, request: &InvoiceRequest) -> Result<Invoice, GatewayError> {
        let mut state = self.state();
        state.invoice_requests.push(request.clone());
        if let Some(error) = state.create_error.take() {
            return Err(error);
        }

        let payment_id = (FIRST_PAYMENT_ID + state.issued).to_string();
        state.issued += 1;

        let raw = json!({
            "payment_id": payment_id,
            "payment_status": "waiting",
            "pay_address": format!("TMock{}", state.issued),
            "pay_amount": request.price_amount.to_string(),
            "pay_currency": request.pay_currency,
            "price_amount": request.price_amount.to_string(),
            "price_currency": request.price_currency,
            "order_id": request.order_id,
        });
        state.statuses.insert(payment_id, raw.clone());

        Invoice::from_json(raw).map_err(|e| GatewayError::MalformedResponse(e.to_string()))
    }

    async fn get_status(
        &self,
        payment_id: &GatewayPaymentId,
    ) -> Result<PaymentNotification, GatewayError> {
        let mut state = self.state();
        state.status_requests.push(payment_id.clone());
        if let Some(error) = state.status_error.take() {
            return Err(error);
        }

        let raw = state
            .statuses
            .get(payment_id.as_str())
            .cloned()
            .ok_or_else(|| GatewayError::Validation("Payment not found".to_string()))?;

        PaymentNotification::from_json(raw, NotificationSource::Polled)
            .map_err(|e| GatewayError::MalformedResponse(e.to_string()))
    }
}
