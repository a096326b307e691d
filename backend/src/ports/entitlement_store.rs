//! EntitlementStore port.

use async_trait::async_trait;

use crate::domain::entitlement::Entitlement;
use crate::domain::foundation::{DomainError, UserId};

#[async_trait]
pub trait EntitlementStore: Send {
    /// Inserts unless `(user_id, code)` already exists.
    ///
    /// Returns `true` if a row was inserted. Implementations must rely on
    /// the uniqueness constraint, not a prior read.
    async fn insert_entitlement_if_absent(
        &mut self,
        entitlement: &Entitlement,
    ) -> Result<bool, DomainError>;

    async fn list_entitlements(&mut self, user: UserId) -> Result<Vec<Entitlement>, DomainError>;
}
