//! HTTP DTOs for balance endpoints.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::balance::{BalanceError, BalanceRequest, BalanceRequestStatus, DepositAddress};
use crate::domain::foundation::{parse_money, BalanceRequestId};
use crate::ports::Page;

// ════════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Deserialize)]
pub struct CreateBalanceRequestRequest {
    pub tx_ref: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

/// Human-entered amount: `"1 000,50"` or `1000.5`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum MoneyInput {
    Number(Decimal),
    Text(String),
}

impl MoneyInput {
    pub fn to_cents(&self) -> Result<i64, BalanceError> {
        let cents = match self {
            MoneyInput::Number(amount) => parse_money(&amount.to_string())?,
            MoneyInput::Text(text) => parse_money(text)?,
        };
        Ok(cents)
    }
}

/// Approval body; `amount_cents` wins when both amounts are given.
#[derive(Debug, Clone, Deserialize)]
pub struct ApproveBalanceRequestRequest {
    #[serde(default)]
    pub amount_cents: Option<i64>,
    #[serde(default)]
    pub amount: Option<MoneyInput>,
    #[serde(default)]
    pub comment: Option<String>,
}

impl ApproveBalanceRequestRequest {
    pub fn amount_cents(&self) -> Result<i64, BalanceError> {
        match (&self.amount_cents, &self.amount) {
            (Some(cents), _) => Ok(*cents),
            (None, Some(amount)) => amount.to_cents(),
            (None, None) => Err(BalanceError::validation("amount", "amount_cents or amount is required")),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RejectBalanceRequestRequest {
    #[serde(default)]
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AdjustBalanceRequest {
    pub delta_cents: i64,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub allow_negative: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LedgerParams {
    pub limit: Option<u32>,
}

// ════════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Serialize)]
pub struct BalanceRequestCreatedResponse {
    pub id: BalanceRequestId,
    pub status: BalanceRequestStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct DepositAddressResponse {
    pub address: String,
    pub network_label: String,
    pub qr_payload: String,
}

impl From<&DepositAddress> for DepositAddressResponse {
    fn from(deposit: &DepositAddress) -> Self {
        Self {
            address: deposit.address.clone(),
            network_label: deposit.network_label.clone(),
            qr_payload: deposit.qr_payload().to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BalanceRequestPageResponse {
    pub items: Vec<BalanceRequest>,
    pub total: u64,
    pub page: u32,
    pub limit: u32,
}

impl From<Page<BalanceRequest>> for BalanceRequestPageResponse {
    fn from(page: Page<BalanceRequest>) -> Self {
        Self {
            items: page.items,
            total: page.total,
            page: page.page,
            limit: page.limit,
        }
    }
}
