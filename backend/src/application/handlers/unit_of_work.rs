//! Helpers shared by handlers that open a unit of work.

use crate::ports::UnitOfWork;

/// Rolls back and logs, rather than returns, a rollback failure so the
/// original error reaches the caller.
pub(crate) async fn discard(uow: Box<dyn UnitOfWork>) {
    if let Err(err) = uow.rollback().await {
        tracing::warn!(error = %err, "rollback failed");
    }
}
