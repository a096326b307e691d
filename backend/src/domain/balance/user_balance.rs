//! Materialized per-user balance.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{Timestamp, UserId};

use super::BalanceError;

/// Current balance of one user.
///
/// # Invariants
///
/// - One row per user
/// - `balance_cents` equals the sum of the user's ledger deltas
/// - `balance_cents >= 0` unless an admin explicitly overrode the guard
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserBalance {
    pub user_id: UserId,
    pub balance_cents: i64,
    pub updated_at: Timestamp,
}

impl UserBalance {
    /// A fresh zero balance.
    pub fn zero(user_id: UserId) -> Self {
        Self {
            user_id,
            balance_cents: 0,
            updated_at: Timestamp::now(),
        }
    }

    /// Applies a signed delta and returns the new balance.
    ///
    /// # Errors
    ///
    /// - `InvariantViolation` if the result is negative and `allow_negative` is false
    /// - `ValidationFailed` if the result overflows
    pub fn apply_delta(&mut self, delta_cents: i64, allow_negative: bool) -> Result<i64, BalanceError> {
        let next = self
            .balance_cents
            .checked_add(delta_cents)
            .ok_or_else(|| BalanceError::validation("delta_cents", "balance overflow"))?;

        if next < 0 && !allow_negative {
            return Err(BalanceError::negative_balance(self.balance_cents, delta_cents));
        }

        self.balance_cents = next;
        self.updated_at = Timestamp::now();
        Ok(next)
    }

    /// Adds a positive amount. Only overflow is checked, so a credit
    /// lands even while the balance is below zero.
    pub fn credit(&mut self, amount_cents: i64) -> Result<i64, BalanceError> {
        self.apply_delta(amount_cents, true)
    }
}
