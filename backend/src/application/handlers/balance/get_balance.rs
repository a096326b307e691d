//! GetBalanceHandler - Current balance for the balance page.

use serde::Serialize;
use std::sync::Arc;

use crate::domain::balance::BalanceError;
use crate::domain::foundation::{format_money, UserId};
use crate::ports::BalanceReader;

#[derive(Debug, Clone)]
pub struct GetBalanceQuery {
    pub user_id: UserId,
}

/// Balance as shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BalanceView {
    pub balance_cents: i64,
    pub balance_formatted: String,
    pub currency: String,
}

pub struct GetBalanceHandler {
    reader: Arc<dyn BalanceReader>,
    currency: String,
}

impl GetBalanceHandler {
    pub fn new(reader: Arc<dyn BalanceReader>, currency: impl Into<String>) -> Self {
        Self {
            reader,
            currency: currency.into(),
        }
    }

    pub async fn handle(&self, query: GetBalanceQuery) -> Result<BalanceView, BalanceError> {
        let balance_cents = self.reader.balance_cents(query.user_id).await?;
        Ok(BalanceView {
            balance_cents,
            balance_formatted: format_money(balance_cents, &self.currency),
            currency: self.currency.clone(),
        })
    }
}
