//! ListBalanceRequestsHandler - A user's deposit requests, newest first.

use std::sync::Arc;

use crate::domain::balance::{BalanceError, BalanceRequest};
use crate::domain::foundation::UserId;
use crate::ports::{BalanceReader, Page};

/// Largest page the handler will return.
pub const MAX_PAGE_SIZE: u32 = 100;

const DEFAULT_PAGE_SIZE: u32 = 20;

#[derive(Debug, Clone)]
pub struct ListBalanceRequestsQuery {
    pub user_id: UserId,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

pub struct ListBalanceRequestsHandler {
    reader: Arc<dyn BalanceReader>,
}

impl ListBalanceRequestsHandler {
    pub fn new(reader: Arc<dyn BalanceReader>) -> Self {
        Self { reader }
    }

    /// Page defaults to 1 and limit to 20; limit is clamped to 1..=100.
    pub async fn handle(
        &self,
        query: ListBalanceRequestsQuery,
    ) -> Result<Page<BalanceRequest>, BalanceError> {
        let page = query.page.unwrap_or(1).max(1);
        let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);

        Ok(self.reader.list_requests(query.user_id, page, limit).await?)
    }
}
