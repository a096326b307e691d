//! UserIdentityValidator port - resolves the calling end user.
//!
//! The HTTP layer reads one credential header, named by the validator,
//! and asks the validator who it belongs to. Adapters decide how much to
//! trust it: a forwarded user id behind a trusted proxy, or a signed
//! Telegram WebApp `initData` string.
//!
//! # Contract
//!
//! Implementations must:
//! - Return `IdentityError::Invalid` for malformed or forged credentials
//! - Return `IdentityError::Expired` for credentials past their lifetime
//! - Never return a non-positive `UserId`

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::foundation::UserId;

#[async_trait]
pub trait UserIdentityValidator: Send + Sync {
    /// Request header carrying the credential (lowercase).
    fn credential_header(&self) -> &'static str;

    /// Resolves a credential to the user it identifies.
    async fn validate(&self, credential: &str) -> Result<UserId, IdentityError>;
}

/// Why a user credential was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityError {
    #[error("user credential is missing")]
    Missing,

    #[error("user credential is invalid: {0}")]
    Invalid(String),

    #[error("user credential has expired")]
    Expired,
}

impl IdentityError {
    pub fn invalid(reason: impl Into<String>) -> Self {
        IdentityError::Invalid(reason.into())
    }
}
