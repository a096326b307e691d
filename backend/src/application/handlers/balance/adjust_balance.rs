//! AdjustBalanceHandler - Admin credit or debit with an audit row.

use std::sync::Arc;

use crate::application::handlers::unit_of_work::discard;
use crate::domain::balance::{admin_adjust_balance, AdjustBalance, BalanceAdjustment, BalanceError};
use crate::domain::foundation::{AdminId, UserId};
use crate::ports::UnitOfWorkFactory;

#[derive(Debug, Clone)]
pub struct AdjustBalanceCommand {
    pub user_id: UserId,
    pub delta_cents: i64,
    pub admin_id: AdminId,
    pub comment: Option<String>,
    /// Permit the balance to go below zero.
    pub allow_negative: bool,
}

pub type AdjustBalanceResult = BalanceAdjustment;

pub struct AdjustBalanceHandler {
    uow_factory: Arc<dyn UnitOfWorkFactory>,
}

impl AdjustBalanceHandler {
    pub fn new(uow_factory: Arc<dyn UnitOfWorkFactory>) -> Self {
        Self { uow_factory }
    }

    pub async fn handle(&self, cmd: AdjustBalanceCommand) -> Result<AdjustBalanceResult, BalanceError> {
        let adjust = AdjustBalance {
            user: cmd.user_id,
            delta_cents: cmd.delta_cents,
            admin: cmd.admin_id,
            comment: cmd.comment,
            allow_negative: cmd.allow_negative,
        };

        let mut uow = self.uow_factory.begin().await?;
        match admin_adjust_balance(&mut *uow, adjust).await {
            Ok(adjustment) => {
                uow.commit().await?;
                Ok(adjustment)
            }
            Err(err) => {
                discard(uow).await;
                Err(err)
            }
        }
    }
}
