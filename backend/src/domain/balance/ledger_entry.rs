//! Immutable ledger rows.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::{
    AdminId, BalanceRequestId, LedgerEntryId, Timestamp, UserId, ValidationError,
};

/// Kind of balance movement recorded by a ledger row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerEntryType {
    DepositRequestCreated,
    DepositRequestApproved,
    DepositRequestRejected,
    AdminAdjust,
}

impl LedgerEntryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LedgerEntryType::DepositRequestCreated => "deposit_request_created",
            LedgerEntryType::DepositRequestApproved => "deposit_request_approved",
            LedgerEntryType::DepositRequestRejected => "deposit_request_rejected",
            LedgerEntryType::AdminAdjust => "admin_adjust",
        }
    }
}

impl fmt::Display for LedgerEntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LedgerEntryType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "deposit_request_created" => Ok(LedgerEntryType::DepositRequestCreated),
            "deposit_request_approved" => Ok(LedgerEntryType::DepositRequestApproved),
            "deposit_request_rejected" => Ok(LedgerEntryType::DepositRequestRejected),
            "admin_adjust" => Ok(LedgerEntryType::AdminAdjust),
            other => Err(ValidationError::invalid_format(
                "entry_type",
                format!("unknown ledger entry type: {}", other),
            )),
        }
    }
}

/// A persisted ledger row. Never updated or deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceLedgerEntry {
    pub id: LedgerEntryId,
    pub user_id: UserId,
    pub entry_type: LedgerEntryType,
    pub delta_cents: i64,
    pub balance_after_cents: i64,
    pub comment: Option<String>,
    pub ref_request_id: Option<BalanceRequestId>,
    pub admin_id: Option<AdminId>,
    pub created_at: Timestamp,
}

/// A ledger row before storage assigns its id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLedgerEntry {
    pub user_id: UserId,
    pub entry_type: LedgerEntryType,
    pub delta_cents: i64,
    pub balance_after_cents: i64,
    pub comment: Option<String>,
    pub ref_request_id: Option<BalanceRequestId>,
    pub admin_id: Option<AdminId>,
    pub created_at: Timestamp,
}

impl NewLedgerEntry {
    pub fn new(user_id: UserId, entry_type: LedgerEntryType, delta_cents: i64, balance_after_cents: i64) -> Self {
        Self {
            user_id,
            entry_type,
            delta_cents,
            balance_after_cents,
            comment: None,
            ref_request_id: None,
            admin_id: None,
            created_at: Timestamp::now(),
        }
    }

    pub fn with_comment(mut self, comment: Option<String>) -> Self {
        self.comment = comment;
        self
    }

    pub fn with_request(mut self, request_id: BalanceRequestId) -> Self {
        self.ref_request_id = Some(request_id);
        self
    }

    pub fn with_admin(mut self, admin_id: AdminId) -> Self {
        self.admin_id = Some(admin_id);
        self
    }

    /// Attaches the storage-assigned id.
    pub fn into_entry(self, id: LedgerEntryId) -> BalanceLedgerEntry {
        BalanceLedgerEntry {
            id,
            user_id: self.user_id,
            entry_type: self.entry_type,
            delta_cents: self.delta_cents,
            balance_after_cents: self.balance_after_cents,
            comment: self.comment,
            ref_request_id: self.ref_request_id,
            admin_id: self.admin_id,
            created_at: self.created_at,
        }
    }
}
