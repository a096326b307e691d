//! Stores a freshly created invoice on its local payment mirror.

use rust_decimal::Decimal;

use crate::domain::payment::{Invoice, PaymentError, PaymentRecord, PaymentTarget};
use crate::ports::{PaymentStore, UnitOfWork};

/// Upserts the mirror row for `invoice` and links it to `target`.
///
/// Price fields the gateway did not echo back fall back to what was sent.
pub(super) async fn mirror_invoice(
    uow: &mut dyn UnitOfWork,
    order_id: &str,
    invoice: &Invoice,
    price_amount: Decimal,
    price_currency: &str,
    target: Option<PaymentTarget>,
) -> Result<PaymentRecord, PaymentError> {
    let mut record = uow
        .lock_payment_record(&invoice.payment_id)
        .await?
        .unwrap_or_else(|| PaymentRecord::new(invoice.payment_id.clone()));

    record.apply_invoice(order_id, invoice);
    record.price_amount = record.price_amount.or(Some(price_amount));
    if record.price_currency.is_none() {
        record.price_currency = Some(price_currency.to_string());
    }
    if let Some(target) = target {
        record.link(target);
    }

    uow.upsert_payment_record(&record).await?;
    Ok(record)
}
