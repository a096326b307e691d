//! Forwarded user id header.

use async_trait::async_trait;

use crate::domain::foundation::UserId;
use crate::ports::{IdentityError, UserIdentityValidator};

pub const USER_ID_HEADER: &str = "x-user-id";

/// Trusts the `X-User-Id` header as set by the fronting proxy.
///
/// Only the shape is checked: a positive integer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TrustedHeaderValidator;

#[async_trait]
impl UserIdentityValidator for TrustedHeaderValidator {
    fn credential_header(&self) -> &'static str {
        USER_ID_HEADER
    }

    async fn validate(&self, credential: &str) -> Result<UserId, IdentityError> {
        credential
            .trim()
            .parse::<i64>()
            .ok()
            .filter(|id| *id > 0)
            .map(UserId::new)
            .ok_or_else(|| IdentityError::invalid("user id must be a positive integer"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn positive_id_is_accepted() {
        assert_eq!(TrustedHeaderValidator.validate(" 42 ").await, Ok(UserId::new(42)));
    }

    #[tokio::test]
    async fn malformed_ids_are_rejected() {
        for raw in ["abc", "0", "-3", ""] {
            let err = TrustedHeaderValidator.validate(raw).await.unwrap_err();
            assert!(matches!(err, IdentityError::Invalid(_)), "{raw}");
        }
    }
}
