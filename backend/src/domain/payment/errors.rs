//! Payment-side error types.
//!
//! # HTTP Status Mapping
//!
//! | Error | HTTP Status |
//! |-------|-------------|
//! | ValidationFailed | 400 |
//! | UpstreamRejected | 400 |
//! | NotFound | 404 |
//! | AlreadyPaid | 409 |
//! | UpstreamUnavailable | 502 |
//! | Infrastructure | 500 |

use crate::domain::foundation::{DomainError, ErrorCode, ValidationError};
use crate::ports::GatewayError;

/// Errors raised by invoice creation, polling, and reconciliation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentError {
    /// Request input failed validation.
    ValidationFailed { field: String, message: String },

    /// Referenced booking or purchase does not exist.
    NotFound(String),

    /// Order is already paid; it cannot be invoiced again.
    AlreadyPaid(String),

    /// Gateway unreachable, timed out, or returned 5xx.
    UpstreamUnavailable(String),

    /// Gateway refused the request (4xx). Carries its message.
    UpstreamRejected(String),

    /// Storage failure.
    Infrastructure(String),
}

impl PaymentError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        PaymentError::ValidationFailed {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        PaymentError::NotFound(what.into())
    }

    pub fn infrastructure(message: impl Into<String>) -> Self {
        PaymentError::Infrastructure(message.into())
    }

    /// Returns the error code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            PaymentError::ValidationFailed { .. } | PaymentError::UpstreamRejected(_) => {
                ErrorCode::ValidationFailed
            }
            PaymentError::NotFound(_) => ErrorCode::NotFound,
            PaymentError::AlreadyPaid(_) => ErrorCode::Conflict,
            PaymentError::UpstreamUnavailable(_) => ErrorCode::UpstreamUnavailable,
            PaymentError::Infrastructure(_) => ErrorCode::DatabaseError,
        }
    }

    /// Returns a client-facing error message.
    pub fn message(&self) -> String {
        match self {
            PaymentError::ValidationFailed { field, message } => {
                format!("Validation failed for '{}': {}", field, message)
            }
            PaymentError::NotFound(what) => format!("{} not found", what),
            PaymentError::AlreadyPaid(order_id) => format!("Order {} is already paid", order_id),
            PaymentError::UpstreamUnavailable(_) => "Payment gateway unavailable".to_string(),
            PaymentError::UpstreamRejected(msg) => msg.clone(),
            PaymentError::Infrastructure(msg) => format!("Error: {}", msg),
        }
    }

    /// Returns true if the caller may retry.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            PaymentError::UpstreamUnavailable(_) | PaymentError::Infrastructure(_)
        )
    }
}

impl std::fmt::Display for PaymentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for PaymentError {}

impl From<DomainError> for PaymentError {
    fn from(err: DomainError) -> Self {
        PaymentError::Infrastructure(err.to_string())
    }
}

impl From<ValidationError> for PaymentError {
    fn from(err: ValidationError) -> Self {
        let field = match &err {
            ValidationError::EmptyField { field }
            | ValidationError::OutOfRange { field, .. }
            | ValidationError::InvalidFormat { field, .. } => field.clone(),
        };
        PaymentError::ValidationFailed {
            field,
            message: err.to_string(),
        }
    }
}

impl From<GatewayError> for PaymentError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::UpstreamUnavailable(msg) | GatewayError::MalformedResponse(msg) => {
                PaymentError::UpstreamUnavailable(msg)
            }
            GatewayError::Validation(msg) => PaymentError::UpstreamRejected(msg),
        }
    }
}
