//! UnitOfWork port - one storage transaction spanning every store.
//!
//! Service functions receive `&mut dyn UnitOfWork` and never commit
//! themselves. The application layer opens the unit, commits on success,
//! and rolls back on any error. Dropping an uncommitted unit discards its
//! changes.

use async_trait::async_trait;

use crate::domain::foundation::DomainError;

use super::{BalanceStore, EntitlementStore, PaymentStore};

#[async_trait]
pub trait UnitOfWork: BalanceStore + PaymentStore + EntitlementStore + Send {
    /// Makes all changes durable.
    async fn commit(self: Box<Self>) -> Result<(), DomainError>;

    /// Discards all changes.
    async fn rollback(self: Box<Self>) -> Result<(), DomainError>;
}

/// Opens units of work.
#[async_trait]
pub trait UnitOfWorkFactory: Send + Sync {
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, DomainError>;
}
