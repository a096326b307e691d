//! CreateProductPaymentHandler - Product purchase plus gateway invoice.
//!
//! Runs in three steps so no transaction spans the gateway call:
//!
//! 1. Insert a pending purchase and commit, which fixes its `product-<id>`
//!    order id.
//! 2. Create the invoice for that order id.
//! 3. Lock the purchase, attach the invoice, and mirror it.
//!
//! If step 2 fails the purchase stays pending without a payment id.

use rust_decimal::Decimal;
use std::sync::Arc;

use crate::application::handlers::unit_of_work::discard;
use crate::domain::foundation::UserId;
use crate::domain::payment::{
    normalize_price_currency, Invoice, InvoiceRequest, NewPurchase, PaymentError, PaymentTarget,
    Purchase,
};
use crate::ports::{PaymentGateway, PaymentStore, UnitOfWork, UnitOfWorkFactory};

use super::create_invoice::MAX_DESCRIPTION_LEN;
use super::invoice_mirror::mirror_invoice;

const DEFAULT_DESCRIPTION: &str = "Product purchase";

#[derive(Debug, Clone)]
pub struct CreateProductPaymentCommand {
    pub user_id: UserId,
    pub amount: Decimal,
    pub price_currency: String,
    pub pay_currency: Option<String>,
    pub order_description: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CreateProductPaymentResult {
    pub purchase: Purchase,
    pub invoice: Invoice,
}

pub struct CreateProductPaymentHandler {
    gateway: Arc<dyn PaymentGateway>,
    uow_factory: Arc<dyn UnitOfWorkFactory>,
    ipn_callback_url: String,
}

impl CreateProductPaymentHandler {
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

    pub async fn handle(
        &self,
        cmd: CreateProductPaymentCommand,
    ) -> Result<CreateProductPaymentResult, PaymentError> {
        if let Some(description) = &cmd.order_description {
            if description.chars().count() > MAX_DESCRIPTION_LEN {
                return Err(PaymentError::validation("order_description", "must be at most 255 characters"));
            }
        }
        let new_purchase = NewPurchase::new(
            cmd.user_id,
            cmd.amount,
            &cmd.price_currency,
            cmd.pay_currency.as_deref(),
        )?;

        // 1. Insert the pending purchase
        let mut uow = self.uow_factory.begin().await?;
        let purchase = match uow.insert_purchase(new_purchase).await {
            Ok(purchase) => {
                uow.commit().await?;
                purchase
            }
            Err(err) => {
                discard(uow).await;
                return Err(err.into());
            }
        };

        // 2. Create the invoice
        let price_currency = normalize_price_currency(&purchase.price_currency, &purchase.pay_currency);
        let request = InvoiceRequest {
            order_id: purchase.order_id.clone(),
            price_amount: purchase.amount,
            price_currency: price_currency.clone(),
            pay_currency: purchase.pay_currency.clone(),
            order_description: cmd
                .order_description
                .filter(|d| !d.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string()),
            ipn_callback_url: Some(self.ipn_callback_url.clone()),
        };
        let invoice = match self.gateway.create_invoice(&request).await {
            Ok(invoice) => invoice,
            Err(err) => {
                tracing::warn!(
                    purchase_id = %purchase.id,
                    order_id = %purchase.order_id,
                    error = %err,
                    "invoice creation failed; purchase left pending"
                );
                return Err(err.into());
            }
        };

        // 3. Attach and mirror
        let mut uow = self.uow_factory.begin().await?;
        match attach(&mut *uow, &purchase, &invoice, &price_currency).await {
            Ok(purchase) => {
                uow.commit().await?;
                tracing::info!(
                    purchase_id = %purchase.id,
                    user_id = %purchase.user_id,
                    payment_id = %invoice.payment_id,
                    "product payment created"
                );
                Ok(CreateProductPaymentResult { purchase, invoice })
            }
            Err(err) => {
                discard(uow).await;
                Err(err)
            }
        }
    }
}

async fn attach(
    uow: &mut dyn UnitOfWork,
    inserted: &Purchase,
    invoice: &Invoice,
    price_currency: &str,
) -> Result<Purchase, PaymentError> {
    let mut purchase = uow
        .lock_purchase(inserted.id)
        .await?
        .ok_or_else(|| PaymentError::not_found("Purchase"))?;

    if !purchase.attach_invoice(invoice) {
        return Err(PaymentError::AlreadyPaid(purchase.order_id));
    }
    uow.save_purchase(&purchase).await?;

    mirror_invoice(
        uow,
        &purchase.order_id,
        invoice,
        purchase.amount,
        price_currency,
        Some(PaymentTarget::Purchase(purchase.id)),
    )
    .await?;

    Ok(purchase)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryStore;
    use crate::adapters::nowpayments::MockPaymentGateway;
    use crate::domain::foundation::ErrorCode;
    use crate::domain::payment::{PurchaseStatus, DEFAULT_PAY_CURRENCY};
    use crate::ports::GatewayError;
    use rust_decimal_macros::dec;

    fn handler(gateway: &MockPaymentGateway, store: &InMemoryStore) -> CreateProductPaymentHandler {
        CreateProductPaymentHandler::new(
            Arc::new(gateway.clone()),
            Arc::new(store.clone()),
            "https://pay.example.test/api/payments/ipn",
        )
    }

    fn cmd() -> CreateProductPaymentCommand {
        CreateProductPaymentCommand {
            user_id: UserId::new(9),
            amount: dec!(10),
            price_currency: "usd".to_string(),
            pay_currency: None,
            order_description: None,
        }
    }

    #[tokio::test]
    async fn creates_purchase_with_product_order_id() {
        let gateway = MockPaymentGateway::new();
        let store = InMemoryStore::new();

        let result = handler(&gateway, &store).handle(cmd()).await.unwrap();

        assert_eq!(result.purchase.order_id, format!("product-{}", result.purchase.id));
        assert_eq!(result.purchase.gateway_payment_id.as_ref(), Some(&result.invoice.payment_id));
        assert_eq!(result.purchase.status, PurchaseStatus::Pending);

        let sent = &gateway.invoice_requests()[0];
        assert_eq!(sent.order_id, result.purchase.order_id);
        assert_eq!(sent.pay_currency, DEFAULT_PAY_CURRENCY);
        assert_eq!(sent.order_description, "Product purchase");

        let record = store.payment_record(&result.invoice.payment_id).await.unwrap();
        assert_eq!(record.purchase_id, Some(result.purchase.id));
    }

    #[tokio::test]
    async fn gateway_outage_leaves_pending_unattached_purchase() {
        let gateway = MockPaymentGateway::new();
        gateway.fail_next_create(GatewayError::UpstreamUnavailable("503".into()));
        let store = InMemoryStore::new();

        let err = handler(&gateway, &store).handle(cmd()).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::UpstreamUnavailable);

        let purchase = store.purchase(crate::domain::foundation::PurchaseId::new(1)).await.unwrap();
        assert_eq!(purchase.status, PurchaseStatus::Pending);
        assert!(purchase.gateway_payment_id.is_none());
    }

    #[tokio::test]
    async fn non_positive_amount_is_rejected_before_insert() {
        let gateway = MockPaymentGateway::new();
        let store = InMemoryStore::new();
        let mut bad = cmd();
        bad.amount = dec!(-1);

        let err = handler(&gateway, &store).handle(bad).await.unwrap_err();

        assert_eq!(err.code(), ErrorCode::ValidationFailed);
        assert!(store.purchase(crate::domain::foundation::PurchaseId::new(1)).await.is_none());
    }
}
