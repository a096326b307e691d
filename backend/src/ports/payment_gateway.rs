//! PaymentGateway port - outbound calls to the crypto payment gateway.
//!
//! Neither call has local side effects. A status poll in particular never
//! grants money or entitlements; callers feed its snapshot to
//! reconciliation as a polled (mirror-only) notification.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::foundation::{DomainError, ErrorCode, GatewayPaymentId};
use crate::domain::payment::{Invoice, InvoiceRequest, PaymentNotification};

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Creates an invoice.
    async fn create_invoice(&self, request: &InvoiceRequest) -> Result<Invoice, GatewayError>;

    /// Fetches the current status of a payment.
    async fn get_status(
        &self,
        payment_id: &GatewayPaymentId,
    ) -> Result<PaymentNotification, GatewayError>;
}

/// Classified gateway failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    /// Network error, timeout, or 5xx. Safe to retry.
    #[error("gateway unavailable: {0}")]
    UpstreamUnavailable(String),

    /// 4xx. Carries the gateway's own message. Terminal.
    #[error("gateway rejected request: {0}")]
    Validation(String),

    /// 2xx with a body we could not use.
    #[error("malformed gateway response: {0}")]
    MalformedResponse(String),
}

impl GatewayError {
    pub fn is_retryable(&self) -> bool {
        !matches!(self, GatewayError::Validation(_))
    }
}

impl From<GatewayError> for DomainError {
    fn from(err: GatewayError) -> Self {
        let code = match &err {
            GatewayError::Validation(_) => ErrorCode::ValidationFailed,
            _ => ErrorCode::UpstreamUnavailable,
        };
        DomainError::new(code, err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_validation_is_terminal() {
        assert!(GatewayError::UpstreamUnavailable("timeout".into()).is_retryable());
        assert!(GatewayError::MalformedResponse("eof".into()).is_retryable());
        assert!(!GatewayError::Validation("bad currency".into()).is_retryable());
    }

    #[test]
    fn converts_to_domain_codes() {
        let err: DomainError = GatewayError::Validation("bad".into()).into();
        assert_eq!(err.code, ErrorCode::ValidationFailed);

        let err: DomainError = GatewayError::UpstreamUnavailable("503".into()).into();
        assert_eq!(err.code, ErrorCode::UpstreamUnavailable);
    }
}
