//! Reconciliation engine - applies gateway payment snapshots to local state.
//!
//! ## Steps
//!
//! 1. Correlate the snapshot with a booking or purchase: parsed order id
//!    first, then the stored gateway payment id.
//! 2. Upsert the payment mirror unconditionally.
//! 3. Apply in-progress, failure, or refund buckets to the aggregate.
//! 4. On the first `finished`, mark the aggregate paid, settle the mirror,
//!    and grant paid access, all in the caller's unit of work.
//!
//! Polled snapshots stop after step 2. Only verified callbacks may move
//! money or grant entitlements.
//!
//! ## Duplicates and Reordering
//!
//! The aggregate row is locked before its status is read, so two
//! concurrent `finished` deliveries serialize and the second sees the
//! first one's committed result. In-progress and failure snapshots never
//! regress an aggregate that is already paid or refunded. A refund applies
//! from any state and does not revoke entitlements. A `finished` replayed
//! after the refund of the same payment is ignored.

use serde::Serialize;

use crate::domain::entitlement::{self, EntitlementCode, GrantOutcome};
use crate::domain::foundation::{GatewayPaymentId, UserId};
use crate::ports::{EntitlementStore, PaymentStore};

use super::{
    Booking, NotificationSource, OrderRef, PaymentError, PaymentNotification, PaymentRecord,
    PaymentTarget, Purchase, SettlementStatus, StatusBucket,
};

/// What reconciliation did with a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ReconcileOutcome {
    /// First terminal success: aggregate paid, mirror completed.
    Settled {
        target: PaymentTarget,
        entitlement: Option<GrantOutcome>,
    },
    /// Terminal success seen again; nothing changed beyond the mirror.
    AlreadySettled { target: PaymentTarget },
    /// Non-success bucket applied to the aggregate.
    StatusApplied {
        target: PaymentTarget,
        bucket: StatusBucket,
    },
    /// Snapshot would have regressed a paid or refunded aggregate.
    StaleIgnored {
        target: PaymentTarget,
        bucket: StatusBucket,
    },
    /// Polled snapshot; mirror only.
    MirrorUpdated,
    /// No local booking or purchase matched.
    Uncorrelated,
}

enum Aggregate {
    Booking(Booking),
    Purchase(Purchase),
}

impl Aggregate {
    fn target(&self) -> PaymentTarget {
        match self {
            Aggregate::Booking(b) => PaymentTarget::Booking(b.id),
            Aggregate::Purchase(p) => PaymentTarget::Purchase(p.id),
        }
    }

    /// Whether this aggregate was refunded for `payment_id`.
    fn refunded_for(&self, payment_id: &GatewayPaymentId) -> bool {
        match self {
            Aggregate::Booking(b) => b.is_refunded() && b.gateway_payment_id.as_ref() == Some(payment_id),
            Aggregate::Purchase(p) => p.is_refunded() && p.gateway_payment_id.as_ref() == Some(payment_id),
        }
    }
}

/// Applies one gateway snapshot inside the caller's unit of work.
pub async fn reconcile<S>(uow: &mut S, notification: &PaymentNotification) -> Result<ReconcileOutcome, PaymentError>
where
    S: PaymentStore + EntitlementStore + ?Sized,
{
    if notification.source == NotificationSource::Polled {
        upsert_mirror(uow, notification, None, None).await?;
        tracing::debug!(payment_id = %notification.payment_id, status = %notification.status, "polled status mirrored");
        return Ok(ReconcileOutcome::MirrorUpdated);
    }

    let Some(aggregate) = correlate(uow, notification).await? else {
        upsert_mirror(uow, notification, None, None).await?;
        tracing::warn!(
            payment_id = %notification.payment_id,
            order_id = notification.order_id.as_deref().unwrap_or(""),
            status = %notification.status,
            "notification matches no booking or purchase"
        );
        return Ok(ReconcileOutcome::Uncorrelated);
    };

    let target = aggregate.target();
    let bucket = notification.status.bucket();

    let outcome = match bucket {
        StatusBucket::Success => settle(uow, aggregate, notification).await?,
        StatusBucket::InProgress | StatusBucket::Failure | StatusBucket::Refund => {
            let applied = apply_non_success(uow, aggregate, notification, bucket).await?;
            let settlement = match bucket {
                StatusBucket::Failure if applied => Some(SettlementStatus::Failed),
                StatusBucket::Refund => Some(SettlementStatus::Refunded),
                _ => None,
            };
            upsert_mirror(uow, notification, Some(target), settlement).await?;
            if applied {
                ReconcileOutcome::StatusApplied { target, bucket }
            } else {
                ReconcileOutcome::StaleIgnored { target, bucket }
            }
        }
    };

    tracing::info!(
        payment_id = %notification.payment_id,
        status = %notification.status,
        outcome = ?outcome,
        "payment notification reconciled"
    );
    Ok(outcome)
}

/// Finds and locks the aggregate a snapshot belongs to.
async fn correlate<S>(uow: &mut S, notification: &PaymentNotification) -> Result<Option<Aggregate>, PaymentError>
where
    S: PaymentStore + ?Sized,
{
    match notification.order_ref() {
        Some(OrderRef::Booking(id)) => {
            if let Some(booking) = uow.lock_booking(id).await? {
                return Ok(Some(Aggregate::Booking(booking)));
            }
        }
        Some(OrderRef::Product(id)) => {
            if let Some(purchase) = uow.lock_purchase(id).await? {
                return Ok(Some(Aggregate::Purchase(purchase)));
            }
        }
        None => {}
    }

    if let Some(booking) = uow.lock_booking_by_payment_id(&notification.payment_id).await? {
        return Ok(Some(Aggregate::Booking(booking)));
    }
    if let Some(purchase) = uow.lock_purchase_by_payment_id(&notification.payment_id).await? {
        return Ok(Some(Aggregate::Purchase(purchase)));
    }
    Ok(None)
}

async fn settle<S>(uow: &mut S, aggregate: Aggregate, notification: &PaymentNotification) -> Result<ReconcileOutcome, PaymentError>
where
    S: PaymentStore + EntitlementStore + ?Sized,
{
    let target = aggregate.target();
    let payment_id = notification.payment_id.clone();

    // A refunded payment never settles again.
    let mirror_refunded = uow
        .lock_payment_record(&payment_id)
        .await?
        .is_some_and(|r| r.settlement == SettlementStatus::Refunded);
    if mirror_refunded || aggregate.refunded_for(&payment_id) {
        upsert_mirror(uow, notification, Some(target), None).await?;
        tracing::warn!(payment_id = %payment_id, "finished notification after refund ignored");
        return Ok(ReconcileOutcome::StaleIgnored {
            target,
            bucket: StatusBucket::Success,
        });
    }

    let grantee: Option<UserId> = match aggregate {
        Aggregate::Booking(mut booking) => {
            if booking.is_paid() {
                upsert_mirror(uow, notification, Some(target), None).await?;
                return Ok(ReconcileOutcome::AlreadySettled { target });
            }
            booking.mark_paid(payment_id, notification.price_amount);
            uow.save_booking(&booking).await?;
            booking.grants_access().then_some(booking.user_id)
        }
        Aggregate::Purchase(mut purchase) => {
            purchase.mirror_ipn(&notification.status, &notification.raw);
            if purchase.is_finished() {
                uow.save_purchase(&purchase).await?;
                upsert_mirror(uow, notification, Some(target), None).await?;
                return Ok(ReconcileOutcome::AlreadySettled { target });
            }
            purchase.mark_finished(
                payment_id,
                notification.pay_address.clone(),
                notification.pay_amount,
            );
            uow.save_purchase(&purchase).await?;
            Some(purchase.user_id)
        }
    };

    upsert_mirror(uow, notification, Some(target), Some(SettlementStatus::Completed)).await?;

    let entitlement = match grantee {
        Some(user) => Some(entitlement::grant(uow, user, &EntitlementCode::paid_access()).await?),
        None => None,
    };

    Ok(ReconcileOutcome::Settled { target, entitlement })
}

/// Applies an in-progress, failure, or refund snapshot.
///
/// Returns false when the snapshot was stale against a paid aggregate.
async fn apply_non_success<S>(
    uow: &mut S,
    aggregate: Aggregate,
    notification: &PaymentNotification,
    bucket: StatusBucket,
) -> Result<bool, PaymentError>
where
    S: PaymentStore + ?Sized,
{
    let payment_id = notification.payment_id.clone();

    match aggregate {
        Aggregate::Booking(mut booking) => {
            let applied = match bucket {
                StatusBucket::Failure => booking.mark_failed(payment_id),
                StatusBucket::Refund => {
                    booking.mark_refunded();
                    true
                }
                _ => booking.mark_in_progress(payment_id),
            };
            if applied {
                uow.save_booking(&booking).await?;
            }
            Ok(applied)
        }
        Aggregate::Purchase(mut purchase) => {
            purchase.mirror_ipn(&notification.status, &notification.raw);
            let applied = match bucket {
                StatusBucket::Failure => purchase.mark_failed(&notification.status),
                StatusBucket::Refund => {
                    purchase.mark_refunded();
                    true
                }
                _ => purchase.mark_in_progress(&notification.status),
            };
            uow.save_purchase(&purchase).await?;
            Ok(applied)
        }
    }
}

async fn upsert_mirror<S>(
    uow: &mut S,
    notification: &PaymentNotification,
    target: Option<PaymentTarget>,
    settlement: Option<SettlementStatus>,
) -> Result<PaymentRecord, PaymentError>
where
    S: PaymentStore + ?Sized,
{
    let mut record = uow
        .lock_payment_record(&notification.payment_id)
        .await?
        .unwrap_or_else(|| PaymentRecord::new(notification.payment_id.clone()));

    record.apply_notification(notification);
    if let Some(target) = target {
        record.link(target);
    }
    if let Some(settlement) = settlement {
        record.settle(settlement);
    }

    uow.upsert_payment_record(&record).await?;
    Ok(record)
}
