//! Admin review of deposit requests: approve or reject.
//!
//! Both commands lock the request and resolve it exactly once. A second
//! review of the same request fails with `Conflict` naming the status it
//! already has.

use std::sync::Arc;

use crate::application::handlers::unit_of_work::discard;
use crate::domain::balance::{
    approve_deposit_request, reject_deposit_request, BalanceError, DepositResolution,
};
use crate::domain::foundation::{AdminId, BalanceRequestId};
use crate::ports::UnitOfWorkFactory;

/// Command to approve a pending request and credit the user.
#[derive(Debug, Clone)]
pub struct ApproveDepositRequestCommand {
    pub request_id: BalanceRequestId,
    pub amount_cents: i64,
    pub admin_id: AdminId,
    pub comment: Option<String>,
}

/// Command to reject a pending request.
#[derive(Debug, Clone)]
pub struct RejectDepositRequestCommand {
    pub request_id: BalanceRequestId,
    pub admin_id: AdminId,
    pub comment: Option<String>,
}

pub type ReviewDepositRequestResult = DepositResolution;

pub struct ReviewDepositRequestHandler {
    uow_factory: Arc<dyn UnitOfWorkFactory>,
}

impl ReviewDepositRequestHandler {
    pub fn new(uow_factory: Arc<dyn UnitOfWorkFactory>) -> Self {
        Self { uow_factory }
    }

    pub async fn approve(
        &self,
        cmd: ApproveDepositRequestCommand,
    ) -> Result<ReviewDepositRequestResult, BalanceError> {
        let mut uow = self.uow_factory.begin().await?;
        let result = approve_deposit_request(
            &mut *uow,
            cmd.request_id,
            cmd.amount_cents,
            cmd.admin_id,
            cmd.comment,
        )
        .await;

        match result {
            Ok(resolution) => {
                uow.commit().await?;
                Ok(resolution)
            }
            Err(err) => {
                discard(uow).await;
                Err(err)
            }
        }
    }

    pub async fn reject(
        &self,
        cmd: RejectDepositRequestCommand,
    ) -> Result<ReviewDepositRequestResult, BalanceError> {
        let mut uow = self.uow_factory.begin().await?;
        let result =
            reject_deposit_request(&mut *uow, cmd.request_id, cmd.admin_id, cmd.comment)
                .await;

        match result {
            Ok(resolution) => {
                uow.commit().await?;
                Ok(resolution)
            }
            Err(err) => {
                discard(uow).await;
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryStore;
    use crate::application::handlers::balance::{
        CreateDepositRequestCommand, CreateDepositRequestHandler,
    };
    use crate::domain::balance::{BalanceRequestStatus, LedgerEntryType};
    use crate::domain::foundation::{ErrorCode, UserId};
    use crate::ports::BalanceReader;

    const USER: UserId = UserId::new(1);
    const ADMIN: AdminId = AdminId::new(99);

    async fn pending_request(store: &InMemoryStore) -> BalanceRequestId {
        CreateDepositRequestHandler::new(Arc::new(store.clone()))
            .handle(CreateDepositRequestCommand {
                user_id: USER,
                tx_ref: "0xfeed".to_string(),
            })
            .await
            .unwrap()
            .request
            .id
    }

    fn approve(id: BalanceRequestId, amount_cents: i64) -> ApproveDepositRequestCommand {
        ApproveDepositRequestCommand {
            request_id: id,
            amount_cents,
            admin_id: ADMIN,
            comment: Some("ok".to_string()),
        }
    }

    // ══════════════════════════════════════════════════════════════
    // Approve
    // ══════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn approve_credits_balance_once() {
        let store = InMemoryStore::new();
        let handler = ReviewDepositRequestHandler::new(Arc::new(store.clone()));
        let id = pending_request(&store).await;

        let resolution = handler.approve(approve(id, 10_000)).await.unwrap();
        assert_eq!(resolution.balance_cents, 10_000);
        assert_eq!(resolution.request.status, BalanceRequestStatus::Approved);
        assert_eq!(resolution.entry.entry_type, LedgerEntryType::DepositRequestApproved);

        let err = handler.approve(approve(id, 10_000)).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::Conflict);
        assert!(err.message().contains("status is approved"));
        assert_eq!(store.balance_cents(USER).await.unwrap(), 10_000);
    }

    #[tokio::test]
    async fn approve_rejects_non_positive_amount() {
        let store = InMemoryStore::new();
        let handler = ReviewDepositRequestHandler::new(Arc::new(store.clone()));
        let id = pending_request(&store).await;

        let err = handler.approve(approve(id, 0)).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::ValidationFailed);

        let request = store.balance_request(id).await.unwrap();
        assert_eq!(request.status, BalanceRequestStatus::Pending);
    }

    #[tokio::test]
    async fn approve_unknown_request_is_not_found() {
        let store = InMemoryStore::new();
        let handler = ReviewDepositRequestHandler::new(Arc::new(store.clone()));

        let err = handler
            .approve(approve(BalanceRequestId::new(404), 100))
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::NotFound);
    }

    // ══════════════════════════════════════════════════════════════
    // Reject
    // ══════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn reject_then_approve_conflicts() {
        let store = InMemoryStore::new();
        let handler = ReviewDepositRequestHandler::new(Arc::new(store.clone()));
        let id = pending_request(&store).await;

        let rejected = handler
            .reject(RejectDepositRequestCommand {
                request_id: id,
                admin_id: ADMIN,
                comment: Some("no such transfer".to_string()),
            })
            .await
            .unwrap();
        assert_eq!(rejected.request.status, BalanceRequestStatus::Rejected);
        assert_eq!(rejected.entry.delta_cents, 0);

        let err = handler.approve(approve(id, 500)).await.unwrap_err();
        assert!(err.message().contains("status is rejected"));
        assert_eq!(store.balance_cents(USER).await.unwrap(), 0);
    }
}
