//! User-submitted deposit requests awaiting admin review.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::{
    AdminId, BalanceRequestId, StateMachine, Timestamp, UserId, ValidationError,
};

use super::BalanceError;

/// Longest accepted transaction reference.
pub const MAX_TX_REF_LEN: usize = 2048;

/// Review status of a deposit request.
///
/// `Pending` resolves exactly once, to either terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BalanceRequestStatus {
    Pending,
    Approved,
    Rejected,
}

impl BalanceRequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BalanceRequestStatus::Pending => "pending",
            BalanceRequestStatus::Approved => "approved",
            BalanceRequestStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for BalanceRequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BalanceRequestStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(BalanceRequestStatus::Pending),
            "approved" => Ok(BalanceRequestStatus::Approved),
            "rejected" => Ok(BalanceRequestStatus::Rejected),
            other => Err(ValidationError::invalid_format(
                "status",
                format!("unknown balance request status: {}", other),
            )),
        }
    }
}

impl StateMachine for BalanceRequestStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use BalanceRequestStatus::*;
        matches!((self, target), (Pending, Approved) | (Pending, Rejected))
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use BalanceRequestStatus::*;
        match self {
            Pending => vec![Approved, Rejected],
            Approved | Rejected => vec![],
        }
    }
}

/// A deposit request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceRequest {
    pub id: BalanceRequestId,
    pub user_id: UserId,
    pub tx_ref: String,
    pub status: BalanceRequestStatus,
    pub admin_comment: Option<String>,
    pub created_at: Timestamp,
    pub reviewed_at: Option<Timestamp>,
    pub reviewed_by_admin_id: Option<AdminId>,
}

impl BalanceRequest {
    /// Trims and validates a transaction reference.
    pub fn normalize_tx_ref(tx_ref: &str) -> Result<String, ValidationError> {
        let trimmed = tx_ref.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::empty_field("tx_ref"));
        }
        let len = trimmed.chars().count();
        if len > MAX_TX_REF_LEN {
            return Err(ValidationError::out_of_range(
                "tx_ref",
                1,
                MAX_TX_REF_LEN as i64,
                len as i64,
            ));
        }
        Ok(trimmed.to_string())
    }

    /// Marks the request approved by `admin`.
    ///
    /// # Errors
    ///
    /// `Conflict` naming the current status if the request is not pending.
    pub fn approve(&mut self, admin: AdminId, comment: Option<String>) -> Result<(), BalanceError> {
        self.resolve(BalanceRequestStatus::Approved, "approve", admin, comment)
    }

    /// Marks the request rejected by `admin`.
    ///
    /// # Errors
    ///
    /// `Conflict` naming the current status if the request is not pending.
    pub fn reject(&mut self, admin: AdminId, comment: Option<String>) -> Result<(), BalanceError> {
        self.resolve(BalanceRequestStatus::Rejected, "reject", admin, comment)
    }

    fn resolve(
        &mut self,
        target: BalanceRequestStatus,
        action: &'static str,
        admin: AdminId,
        comment: Option<String>,
    ) -> Result<(), BalanceError> {
        let current = self.status;
        self.status = current
            .transition_to(target)
            .map_err(|_| BalanceError::conflict(action, current.as_str()))?;
        self.admin_comment = comment;
        self.reviewed_at = Some(Timestamp::now());
        self.reviewed_by_admin_id = Some(admin);
        Ok(())
    }
}
