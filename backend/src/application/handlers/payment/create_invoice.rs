//! CreateInvoiceHandler - Creates a gateway invoice for an order id.
//!
//! The gateway is called with no unit of work open. Local state is
//! written afterwards in a short transaction:
//!
//! - a referenced booking gets the payment id and amount
//! - a referenced purchase gets the invoice details
//! - the payment mirror row is upserted and linked
//!
//! Webinar bookings are free and are refused before any gateway call,
//! as are bookings already paid and purchases already finished.

use rust_decimal::Decimal;
use std::sync::Arc;

use crate::application::handlers::unit_of_work::discard;
use crate::domain::payment::{
    normalize_price_currency, BookingKind, Invoice, InvoiceRequest, OrderRef, PaymentError,
    PaymentTarget, DEFAULT_PAY_CURRENCY,
};
use crate::ports::{PaymentGateway, PaymentStore, UnitOfWork, UnitOfWorkFactory};

use super::invoice_mirror::mirror_invoice;

/// Longest accepted order description.
pub const MAX_DESCRIPTION_LEN: usize = 255;

/// Command to create an invoice for an existing order id.
#[derive(Debug, Clone)]
pub struct CreateInvoiceCommand {
    pub order_id: String,
    pub amount: Decimal,
    pub price_currency: String,
    pub pay_currency: Option<String>,
    pub order_description: Option<String>,
}

pub type CreateInvoiceResult = Invoice;

pub struct CreateInvoiceHandler {
    gateway: Arc<dyn PaymentGateway>,
    uow_factory: Arc<dyn UnitOfWorkFactory>,
    ipn_callback_url: String,
}

impl CreateInvoiceHandler {
    pub fn new(
        gateway: Arc<dyn PaymentGateway>,
        uow_factory: Arc<dyn UnitOfWorkFactory>,
        ipn_callback_url: impl Into<String>,
    ) -> Self {
        Self {
            gateway,
            uow_factory,
            ipn_callback_url: ipn_callback_url.into(),
        }
    }

    pub async fn handle(&self, cmd: CreateInvoiceCommand) -> Result<CreateInvoiceResult, PaymentError> {
        // 1. Validate input
        let order_id = cmd.order_id.trim().to_string();
        if order_id.is_empty() {
            return Err(PaymentError::validation("order_id", "must not be empty"));
        }
        if cmd.amount <= Decimal::ZERO {
            return Err(PaymentError::validation("amount", "must be greater than zero"));
        }
        if cmd.price_currency.trim().len() < 2 {
            return Err(PaymentError::validation("price_currency", "must be at least 2 characters"));
        }
        if let Some(description) = &cmd.order_description {
            if description.chars().count() > MAX_DESCRIPTION_LEN {
                return Err(PaymentError::validation("order_description", "must be at most 255 characters"));
            }
        }
        let order_ref = OrderRef::parse(&order_id);

        // 2. Refuse free bookings and settled orders
        self.ensure_payable(&order_id, order_ref).await?;

        // 3. Shape currencies
        let pay_currency = cmd
            .pay_currency
            .as_deref()
            .map(|c| c.trim().to_ascii_lowercase())
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| DEFAULT_PAY_CURRENCY.to_string());
        let price_currency = normalize_price_currency(&cmd.price_currency, &pay_currency);

        // 4. Call the gateway
        let request = InvoiceRequest {
            order_id: order_id.clone(),
            price_amount: cmd.amount,
            price_currency: price_currency.clone(),
            pay_currency,
            order_description: cmd.order_description.unwrap_or_default(),
            ipn_callback_url: Some(self.ipn_callback_url.clone()),
        };
        let invoice = self.gateway.create_invoice(&request).await?;

        // 5. Record locally
        let mut uow = self.uow_factory.begin().await?;
        let recorded = record_invoice(&mut *uow, order_ref, &order_id, &invoice, cmd.amount, &price_currency).await;
        match recorded {
            Ok(()) => uow.commit().await?,
            Err(err) => {
                discard(uow).await;
                tracing::error!(
                    order_id = %order_id,
                    payment_id = %invoice.payment_id,
                    error = %err,
                    "invoice created but not recorded"
                );
                return Err(err);
            }
        }

        Ok(invoice)
    }
}

impl CreateInvoiceHandler {
    async fn ensure_payable(&self, order_id: &str, order_ref: Option<OrderRef>) -> Result<(), PaymentError> {
        let Some(order_ref) = order_ref else {
            return Ok(());
        };

        // (is_webinar, is_paid)
        let mut uow = self.uow_factory.begin().await?;
        let checked = match order_ref {
            OrderRef::Booking(id) => uow
                .lock_booking(id)
                .await
                .map(|b| b.map(|b| (b.kind == BookingKind::Webinar, b.is_paid()))),
            OrderRef::Product(id) => uow
                .lock_purchase(id)
                .await
                .map(|p| p.map(|p| (false, p.is_finished()))),
        };
        discard(uow).await;

        match checked? {
            Some((true, _)) => Err(PaymentError::validation(
                "order_id",
                "webinars are free; no payment required",
            )),
            Some((_, true)) => {
                tracing::warn!(order_id = %order_id, "invoice requested for paid order");
                Err(PaymentError::AlreadyPaid(order_id.to_string()))
            }
            _ => Ok(()),
        }
    }
}

async fn record_invoice(
    uow: &mut dyn UnitOfWork,
    order_ref: Option<OrderRef>,
    order_id: &str,
    invoice: &Invoice,
    amount: Decimal,
    price_currency: &str,
) -> Result<(), PaymentError> {
    let target = match order_ref {
        Some(OrderRef::Booking(id)) => match uow.lock_booking(id).await? {
            Some(mut booking) => {
                if !booking.attach_invoice(invoice.payment_id.clone(), amount) {
                    return Err(PaymentError::AlreadyPaid(order_id.to_string()));
                }
                uow.save_booking(&booking).await?;
                Some(PaymentTarget::Booking(id))
            }
            None => None,
        },
        Some(OrderRef::Product(id)) => match uow.lock_purchase(id).await? {
            Some(mut purchase) => {
                if !purchase.attach_invoice(invoice) {
                    return Err(PaymentError::AlreadyPaid(order_id.to_string()));
                }
                uow.save_purchase(&purchase).await?;
                Some(PaymentTarget::Purchase(id))
            }
            None => None,
        },
        None => None,
    };

    mirror_invoice(uow, order_id, invoice, amount, price_currency, target).await?;
    Ok(())
}
