//! Idempotent entitlement grants.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::{DomainError, Timestamp, UserId, ValidationError};
use crate::ports::EntitlementStore;

/// Name of a capability.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntitlementCode(String);

impl EntitlementCode {
    /// Granted on the first completed payment for a purchase or paid booking.
    pub const PAID_ACCESS: &'static str = "paid_access";

    pub fn new(code: impl Into<String>) -> Result<Self, ValidationError> {
        let code = code.into().trim().to_string();
        if code.is_empty() {
            return Err(ValidationError::empty_field("code"));
        }
        Ok(Self(code))
    }

    pub fn paid_access() -> Self {
        Self(Self::PAID_ACCESS.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntitlementCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A granted capability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entitlement {
    pub user_id: UserId,
    pub code: EntitlementCode,
    pub granted_at: Timestamp,
}

/// Result of a grant attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantOutcome {
    Granted,
    AlreadyGranted,
}

/// Grants `code` to `user` inside the caller's unit of work.
///
/// Storage performs insert-if-absent, so concurrent grants of the same
/// pair collapse to one row.
pub async fn grant<S>(store: &mut S, user: UserId, code: &EntitlementCode) -> Result<GrantOutcome, DomainError>
where
    S: EntitlementStore + ?Sized,
{
    let entitlement = Entitlement {
        user_id: user,
        code: code.clone(),
        granted_at: Timestamp::now(),
    };

    if store.insert_entitlement_if_absent(&entitlement).await? {
        tracing::info!(user_id = %user, code = %code, "entitlement granted");
        Ok(GrantOutcome::Granted)
    } else {
        tracing::debug!(user_id = %user, code = %code, "entitlement already held");
        Ok(GrantOutcome::AlreadyGranted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    #[derive(Default)]
    struct VecStore {
        rows: Vec<Entitlement>,
    }

    #[async_trait]
    impl EntitlementStore for VecStore {
        async fn insert_entitlement_if_absent(
            &mut self,
            entitlement: &Entitlement,
        ) -> Result<bool, DomainError> {
            if self
                .rows
                .iter()
                .any(|e| e.user_id == entitlement.user_id && e.code == entitlement.code)
            {
                return Ok(false);
            }
            self.rows.push(entitlement.clone());
            Ok(true)
        }

        async fn list_entitlements(&mut self, user: UserId) -> Result<Vec<Entitlement>, DomainError> {
            Ok(self.rows.iter().filter(|e| e.user_id == user).cloned().collect())
        }
    }

    #[tokio::test]
    async fn first_grant_inserts() {
        let mut store = VecStore::default();
        let outcome = grant(&mut store, UserId::new(1), &EntitlementCode::paid_access())
            .await
            .unwrap();

        assert_eq!(outcome, GrantOutcome::Granted);
        assert_eq!(store.rows.len(), 1);
    }

    #[tokio::test]
    async fn repeated_grant_is_noop() {
        let mut store = VecStore::default();
        let code = EntitlementCode::paid_access();
        grant(&mut store, UserId::new(1), &code).await.unwrap();

        let outcome = grant(&mut store, UserId::new(1), &code).await.unwrap();
        assert_eq!(outcome, GrantOutcome::AlreadyGranted);
        assert_eq!(store.rows.len(), 1);
    }

    #[tokio::test]
    async fn grants_are_per_user() {
        let mut store = VecStore::default();
        let code = EntitlementCode::paid_access();
        grant(&mut store, UserId::new(1), &code).await.unwrap();
        grant(&mut store, UserId::new(2), &code).await.unwrap();

        assert_eq!(store.list_entitlements(UserId::new(2)).await.unwrap().len(), 1);
    }

    #[test]
    fn blank_code_rejected() {
        assert!(EntitlementCode::new(" ").is_err());
        assert_eq!(EntitlementCode::paid_access().as_str(), "paid_access");
    }
}
