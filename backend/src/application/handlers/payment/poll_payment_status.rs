//! PollPaymentStatusHandler - Asks the gateway for a payment's status.
//!
//! The snapshot only refreshes the local mirror. Settlement and access
//! grants happen on signed IPN callbacks alone. A failure to write the
//! mirror is logged and the status is still returned. Ids that are not
//! plain digits are refused before the gateway is called.

use std::sync::Arc;

use crate::application::handlers::unit_of_work::discard;
use crate::domain::foundation::GatewayPaymentId;
use crate::domain::payment::{reconcile, GatewayStatus, PaymentError, PaymentNotification};
use crate::ports::{PaymentGateway, UnitOfWorkFactory};

#[derive(Debug, Clone)]
pub struct PollPaymentStatusQuery {
    pub payment_id: GatewayPaymentId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollPaymentStatusResult {
    pub payment_id: GatewayPaymentId,
    pub status: GatewayStatus,
}

pub struct PollPaymentStatusHandler {
    gateway: Arc<dyn PaymentGateway>,
    uow_factory: Arc<dyn UnitOfWorkFactory>,
}

impl PollPaymentStatusHandler {
    pub fn new(gateway: Arc<dyn PaymentGateway>, uow_factory: Arc<dyn UnitOfWorkFactory>) -> Self {
        Self { gateway, uow_factory }
    }

    pub async fn handle(&self, query: PollPaymentStatusQuery) -> Result<PollPaymentStatusResult, PaymentError> {
        if !query.payment_id.is_numeric() {
            return Err(PaymentError::validation("payment_id", "must contain only digits"));
        }
        let snapshot = self.gateway.get_status(&query.payment_id).await?;

        if let Err(err) = self.mirror(&snapshot).await {
            tracing::warn!(payment_id = %snapshot.payment_id, error = %err, "failed to mirror polled status");
        }

        Ok(PollPaymentStatusResult {
            payment_id: snapshot.payment_id,
            status: snapshot.status,
        })
    }

    async fn mirror(&self, snapshot: &PaymentNotification) -> Result<(), PaymentError> {
        let mut uow = self.uow_factory.begin().await?;
        match reconcile(&mut *uow, snapshot).await {
            Ok(_) => {
                uow.commit().await?;
                Ok(())
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
    use crate::adapters::nowpayments::MockPaymentGateway;
    use crate::domain::foundation::{BookingId, ErrorCode, UserId};
    use crate::domain::payment::{Booking, BookingKind, BookingPaymentStatus, SettlementStatus};
    use crate::ports::GatewayError;

    fn handler(gateway: &MockPaymentGateway, store: &InMemoryStore) -> PollPaymentStatusHandler {
        PollPaymentStatusHandler::new(Arc::new(gateway.clone()), Arc::new(store.clone()))
    }

    #[tokio::test]
    async fn finished_poll_mirrors_without_settling() {
        let gateway = MockPaymentGateway::new();
        gateway.set_status("6000", GatewayStatus::Finished, Some("booking-3"));
        let store = InMemoryStore::new();
        store
            .put_booking(Booking::new(BookingId::new(3), UserId::new(1), BookingKind::Consultation))
            .await;
        let payment_id = GatewayPaymentId::new("6000").unwrap();

        let result = handler(&gateway, &store)
            .handle(PollPaymentStatusQuery {
                payment_id: payment_id.clone(),
            })
            .await
            .unwrap();

        assert_eq!(result.status, GatewayStatus::Finished);
        let record = store.payment_record(&payment_id).await.unwrap();
        assert_eq!(record.gateway_status.as_deref(), Some("finished"));
        assert_eq!(record.settlement, SettlementStatus::Pending);
        let booking = store.booking(BookingId::new(3)).await.unwrap();
        assert_eq!(booking.payment_status, BookingPaymentStatus::Pending);
        assert!(store.entitlements(UserId::new(1)).await.is_empty());
    }

    #[tokio::test]
    async fn upstream_failure_is_returned() {
        let gateway = MockPaymentGateway::new();
        gateway.fail_next_status(GatewayError::UpstreamUnavailable("timeout".into()));
        let store = InMemoryStore::new();

        let err = handler(&gateway, &store)
            .handle(PollPaymentStatusQuery {
                payment_id: GatewayPaymentId::new("1").unwrap(),
            })
            .await
            .unwrap_err();

        assert_eq!(err.code(), ErrorCode::UpstreamUnavailable);
    }

    #[tokio::test]
    async fn non_numeric_id_is_refused_before_gateway() {
        let gateway = MockPaymentGateway::new();
        let store = InMemoryStore::new();

        let err = handler(&gateway, &store)
            .handle(PollPaymentStatusQuery {
                payment_id: GatewayPaymentId::new("../currencies").unwrap(),
            })
            .await
            .unwrap_err();

        assert_eq!(err.code(), ErrorCode::ValidationFailed);
        assert!(gateway.status_requests().is_empty());
    }
}
