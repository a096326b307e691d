//! CreateDepositRequestHandler - Records a user's top-up claim.

use std::sync::Arc;

use crate::application::handlers::unit_of_work::discard;
use crate::domain::balance::{create_deposit_request, BalanceError, DepositRequestCreated};
use crate::domain::foundation::UserId;
use crate::ports::UnitOfWorkFactory;

/// Command to open a pending deposit request.
#[derive(Debug, Clone)]
pub struct CreateDepositRequestCommand {
    pub user_id: UserId,
    /// Transaction reference or free-text proof supplied by the user.
    pub tx_ref: String,
}

pub type CreateDepositRequestResult = DepositRequestCreated;

pub struct CreateDepositRequestHandler {
    uow_factory: Arc<dyn UnitOfWorkFactory>,
}

impl CreateDepositRequestHandler {
    pub fn new(uow_factory: Arc<dyn UnitOfWorkFactory>) -> Self {
        Self { uow_factory }
    }

    pub async fn handle(
        &self,
        cmd: CreateDepositRequestCommand,
    ) -> Result<CreateDepositRequestResult, BalanceError> {
        let mut uow = self.uow_factory.begin().await?;
        match create_deposit_request(&mut *uow, cmd.user_id, &cmd.tx_ref).await {
            Ok(created) => {
                uow.commit().await?;
                Ok(created)
            }
            Err(err) => {
                discard(uow).await;
                Err(err)
            }
        }
    }
}
