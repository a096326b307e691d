//! Balance-ledger error types.
//!
//! # HTTP Status Mapping
//!
//! | Error | HTTP Status |
//! |-------|-------------|
//! | RequestNotFound | 404 |
//! | Conflict | 409 |
//! | InvariantViolation | 422 |
//! | ValidationFailed | 400 |
//! | Infrastructure | 500 |

use crate::domain::foundation::{BalanceRequestId, DomainError, ErrorCode, ValidationError};

/// Errors raised by ledger operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BalanceError {
    /// Deposit request does not exist.
    RequestNotFound(BalanceRequestId),

    /// Deposit request was already resolved.
    Conflict {
        action: &'static str,
        status: String,
    },

    /// Mutation would leave the balance below zero.
    InvariantViolation { current: i64, delta: i64 },

    /// Input failed validation.
    ValidationFailed { field: String, message: String },

    /// Storage failure.
    Infrastructure(String),
}

impl BalanceError {
    pub fn request_not_found(id: BalanceRequestId) -> Self {
        BalanceError::RequestNotFound(id)
    }

    pub fn conflict(action: &'static str, status: impl Into<String>) -> Self {
        BalanceError::Conflict {
            action,
            status: status.into(),
        }
    }

    pub fn negative_balance(current: i64, delta: i64) -> Self {
        BalanceError::InvariantViolation { current, delta }
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        BalanceError::ValidationFailed {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn infrastructure(message: impl Into<String>) -> Self {
        BalanceError::Infrastructure(message.into())
    }

    /// Returns the error code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            BalanceError::RequestNotFound(_) => ErrorCode::NotFound,
            BalanceError::Conflict { .. } => ErrorCode::Conflict,
            BalanceError::InvariantViolation { .. } => ErrorCode::InvariantViolation,
            BalanceError::ValidationFailed { .. } => ErrorCode::ValidationFailed,
            BalanceError::Infrastructure(_) => ErrorCode::DatabaseError,
        }
    }

    /// Returns a client-facing error message.
    pub fn message(&self) -> String {
        match self {
            BalanceError::RequestNotFound(_) => "Balance request not found".to_string(),
            BalanceError::Conflict { action, status } => {
                format!("Cannot {}: request status is {}", action, status)
            }
            BalanceError::InvariantViolation { current, delta } => format!(
                "Balance cannot go below 0. Current: {}, delta: {}",
                current, delta
            ),
            BalanceError::ValidationFailed { field, message } => {
                format!("Validation failed for '{}': {}", field, message)
            }
            BalanceError::Infrastructure(msg) => format!("Error: {}", msg),
        }
    }

    /// Returns true if this error should trigger a retry.
    pub fn is_retryable(&self) -> bool {
        matches!(self, BalanceError::Infrastructure(_))
    }
}

impl std::fmt::Display for BalanceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for BalanceError {}

impl From<DomainError> for BalanceError {
    fn from(err: DomainError) -> Self {
        BalanceError::Infrastructure(err.to_string())
    }
}

impl From<ValidationError> for BalanceError {
    fn from(err: ValidationError) -> Self {
        let field = match &err {
            ValidationError::EmptyField { field }
            | ValidationError::OutOfRange { field, .. }
            | ValidationError::InvalidFormat { field, .. } => field.clone(),
        };
        BalanceError::ValidationFailed {
            field,
            message: err.to_string(),
        }
    }
}

impl From<BalanceError> for DomainError {
    fn from(err: BalanceError) -> Self {
        DomainError::new(err.code(), err.message())
    }
}
