//! GetUserLedgerHandler - Admin audit view of one user's ledger.
//!
//! Alongside the entries it reports whether the materialized balance
//! still equals the ledger sum.

use serde::Serialize;
use std::sync::Arc;

use crate::domain::balance::{BalanceError, BalanceLedgerEntry};
use crate::domain::foundation::UserId;
use crate::ports::BalanceReader;

use super::list_balance_requests::MAX_PAGE_SIZE;

#[derive(Debug, Clone)]
pub struct GetUserLedgerQuery {
    pub user_id: UserId,
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserLedgerView {
    pub user_id: UserId,
    pub balance_cents: i64,
    pub ledger_sum_cents: i64,
    pub consistent: bool,
    pub entries: Vec<BalanceLedgerEntry>,
}

pub struct GetUserLedgerHandler {
    reader: Arc<dyn BalanceReader>,
}

impl GetUserLedgerHandler {
    pub fn new(reader: Arc<dyn BalanceReader>) -> Self {
        Self { reader }
    }

    pub async fn handle(&self, query: GetUserLedgerQuery) -> Result<UserLedgerView, BalanceError> {
        let limit = query.limit.unwrap_or(MAX_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);

        let balance_cents = self.reader.balance_cents(query.user_id).await?;
        let ledger_sum_cents = self.reader.ledger_sum(query.user_id).await?;
        let entries = self.reader.list_ledger(query.user_id, limit).await?;

        let consistent = balance_cents == ledger_sum_cents;
        if !consistent {
            tracing::error!(
                user_id = %query.user_id,
                balance_cents,
                ledger_sum_cents,
                "balance diverges from ledger"
            );
        }

        Ok(UserLedgerView {
            user_id: query.user_id,
            balance_cents,
            ledger_sum_cents,
            consistent,
            entries,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryStore;
    use crate::application::handlers::balance::{
        AdjustBalanceCommand, AdjustBalanceHandler, ApproveDepositRequestCommand,
        CreateDepositRequestCommand, CreateDepositRequestHandler, ReviewDepositRequestHandler,
    };
    use crate::domain::balance::LedgerEntryType;
    use crate::domain::foundation::AdminId;

    #[tokio::test]
    async fn reports_entries_newest_first_and_consistency() {
        let store = InMemoryStore::new();
        let user = UserId::new(4);
        let admin = AdminId::new(1);

        let created = CreateDepositRequestHandler::new(Arc::new(store.clone()))
            .handle(CreateDepositRequestCommand {
                user_id: user,
                tx_ref: "tx".to_string(),
            })
            .await
            .unwrap();
        ReviewDepositRequestHandler::new(Arc::new(store.clone()))
            .approve(ApproveDepositRequestCommand {
                request_id: created.request.id,
                amount_cents: 5_000,
                admin_id: admin,
                comment: None,
            })
            .await
            .unwrap();
        AdjustBalanceHandler::new(Arc::new(store.clone()))
            .handle(AdjustBalanceCommand {
                user_id: user,
                delta_cents: -1_500,
                admin_id: admin,
                comment: Some("fee".to_string()),
                allow_negative: false,
            })
            .await
            .unwrap();

        let view = GetUserLedgerHandler::new(Arc::new(store))
            .handle(GetUserLedgerQuery { user_id: user, limit: None })
            .await
            .unwrap();

        assert!(view.consistent);
        assert_eq!(view.balance_cents, 3_500);
        assert_eq!(view.ledger_sum_cents, 3_500);
        let types: Vec<_> = view.entries.iter().map(|e| e.entry_type).collect();
        assert_eq!(
            types,
            vec![
                LedgerEntryType::AdminAdjust,
                LedgerEntryType::DepositRequestApproved,
                LedgerEntryType::DepositRequestCreated,
            ]
        );
    }
}
