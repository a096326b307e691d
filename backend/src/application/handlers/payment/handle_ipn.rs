//! HandleIpnHandler - Processes NOWPayments IPN callbacks.
//!
//! # Flow
//!
//! 1. Parse the body as JSON (bytes that are not JSON are not logged)
//! 2. Verify the `x-nowpayments-sig` HMAC
//! 3. Append the callback to the IPN log, valid or not
//! 4. Reject non-object payloads and invalid signatures
//! 5. Reconcile the snapshot in one unit of work
//!
//! The IPN log commits on its own, so a rejected or rolled-back callback
//! is still on record.

use serde_json::Value;
use std::sync::Arc;

use crate::application::handlers::unit_of_work::discard;
use crate::domain::foundation::IpnEventId;
use crate::domain::payment::{
    reconcile, IpnVerifier, NewIpnEvent, NotificationSource, PaymentNotification,
    ReconcileOutcome, SignatureScheme, WebhookError,
};
use crate::ports::{IpnEventLog, UnitOfWorkFactory};

/// A raw IPN delivery.
#[derive(Debug, Clone)]
pub struct HandleIpnCommand {
    pub payload: Vec<u8>,
    pub signature: Option<String>,
}

#[derive(Debug, Clone)]
pub struct HandleIpnResult {
    pub event_id: IpnEventId,
    pub scheme: SignatureScheme,
    pub outcome: ReconcileOutcome,
}

pub struct HandleIpnHandler {
    /// `None` when no IPN secret is configured; every callback fails.
    verifier: Option<IpnVerifier>,
    event_log: Arc<dyn IpnEventLog>,
    uow_factory: Arc<dyn UnitOfWorkFactory>,
}

impl HandleIpnHandler {
    pub fn new(
        verifier: Option<IpnVerifier>,
        event_log: Arc<dyn IpnEventLog>,
        uow_factory: Arc<dyn UnitOfWorkFactory>,
    ) -> Self {
        Self {
            verifier,
            event_log,
            uow_factory,
        }
    }

    pub async fn handle(&self, cmd: HandleIpnCommand) -> Result<HandleIpnResult, WebhookError> {
        // 1. Parse
        let parsed: Value = serde_json::from_slice(&cmd.payload)
            .map_err(|e| WebhookError::ParseError(e.to_string()))?;

        // 2. Verify
        let signature = cmd.signature.as_deref();
        let verified = match &self.verifier {
            Some(verifier) => verifier.verify(&cmd.payload, signature),
            None => Err(WebhookError::SecretNotConfigured),
        };

        // 3. Log
        let event = NewIpnEvent::from_payload(&parsed, &cmd.payload, signature, verified.is_ok());
        let event = self.event_log.append(event).await.map_err(|e| {
            tracing::error!(error = %e, "failed to log IPN callback");
            WebhookError::from(e)
        })?;

        tracing::info!(
            event_id = %event.id,
            payment_id = event.payment_id.as_deref().unwrap_or(""),
            payment_status = event.payment_status.as_deref().unwrap_or(""),
            signature_valid = event.signature_valid,
            "IPN received"
        );

        // 4. Reject
        if !parsed.is_object() {
            tracing::warn!(event_id = %event.id, "IPN payload is not a JSON object");
            return Err(WebhookError::ParseError("expected a JSON object".to_string()));
        }
        let scheme = match verified {
            Ok(scheme) => scheme,
            Err(err) => {
                tracing::warn!(event_id = %event.id, error = %err, "IPN signature rejected");
                return Err(err);
            }
        };

        let notification = PaymentNotification::from_json(parsed, NotificationSource::Verified)
            .map_err(|_| {
                let field = if event.payment_id.is_none() {
                    "payment_id"
                } else {
                    "payment_status"
                };
                WebhookError::MissingField(field)
            })?;

        // 5. Reconcile
        let mut uow = self.uow_factory.begin().await?;
        let outcome = match reconcile(&mut *uow, &notification).await {
            Ok(outcome) => outcome,
            Err(err) => {
                discard(uow).await;
                tracing::error!(
                    payment_id = %notification.payment_id,
                    error = %err,
                    "reconciliation failed"
                );
                return Err(WebhookError::Database(err.to_string()));
            }
        };
        uow.commit().await?;

        Ok(HandleIpnResult {
            event_id: event.id,
            scheme,
            outcome,
        })
    }
}
