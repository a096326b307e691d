//! Shared router state.

use axum::extract::FromRef;
use std::sync::Arc;

use crate::application::handlers::{
    AdjustBalanceHandler, CreateDepositRequestHandler, CreateInvoiceHandler,
    CreateProductPaymentHandler, GetBalanceHandler, GetUserLedgerHandler, HandleIpnHandler,
    ListBalanceRequestsHandler, PollPaymentStatusHandler, ReviewDepositRequestHandler,
};
use crate::domain::balance::DepositAddress;
use crate::domain::payment::IpnVerifier;
use crate::ports::{BalanceReader, IpnEventLog, PaymentGateway, UnitOfWorkFactory};

use super::middleware::{AdminToken, IdentityProvider};

/// Dependencies shared by every route.
///
/// Cloned per request; everything heavy sits behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub uow_factory: Arc<dyn UnitOfWorkFactory>,
    pub balance_reader: Arc<dyn BalanceReader>,
    pub ipn_log: Arc<dyn IpnEventLog>,
    pub gateway: Arc<dyn PaymentGateway>,
    /// `None` when no IPN secret is configured.
    pub ipn_verifier: Option<IpnVerifier>,
    pub ipn_callback_url: String,
    /// Ledger display currency.
    pub currency: String,
    /// Static address for manual top-ups.
    pub deposit_address: DepositAddress,
    pub admin_token: AdminToken,
    pub identity: IdentityProvider,
}

impl FromRef<AppState> for AdminToken {
    fn from_ref(state: &AppState) -> Self {
        state.admin_token.clone()
    }
}

impl FromRef<AppState> for IdentityProvider {
    fn from_ref(state: &AppState) -> Self {
        state.identity.clone()
    }
}

impl AppState {
    // Payment handlers

    pub fn create_invoice_handler(&self) -> CreateInvoiceHandler {
        CreateInvoiceHandler::new(
            self.gateway.clone(),
            self.uow_factory.clone(),
            self.ipn_callback_url.clone(),
        )
    }

    pub fn create_product_payment_handler(&self) -> CreateProductPaymentHandler {
        CreateProductPaymentHandler::new(
            self.gateway.clone(),
            self.uow_factory.clone(),
            self.ipn_callback_url.clone(),
        )
    }

    pub fn poll_payment_status_handler(&self) -> PollPaymentStatusHandler {
        PollPaymentStatusHandler::new(self.gateway.clone(), self.uow_factory.clone())
    }

    pub fn ipn_handler(&self) -> HandleIpnHandler {
        HandleIpnHandler::new(
            self.ipn_verifier.clone(),
            self.ipn_log.clone(),
            self.uow_factory.clone(),
        )
    }

    // Balance handlers

    pub fn get_balance_handler(&self) -> GetBalanceHandler {
        GetBalanceHandler::new(self.balance_reader.clone(), self.currency.clone())
    }

    pub fn create_deposit_request_handler(&self) -> CreateDepositRequestHandler {
        CreateDepositRequestHandler::new(self.uow_factory.clone())
    }

    pub fn list_balance_requests_handler(&self) -> ListBalanceRequestsHandler {
        ListBalanceRequestsHandler::new(self.balance_reader.clone())
    }

    pub fn review_deposit_request_handler(&self) -> ReviewDepositRequestHandler {
        ReviewDepositRequestHandler::new(self.uow_factory.clone())
    }

    pub fn adjust_balance_handler(&self) -> AdjustBalanceHandler {
        AdjustBalanceHandler::new(self.uow_factory.clone())
    }

    pub fn user_ledger_handler(&self) -> GetUserLedgerHandler {
        GetUserLedgerHandler::new(self.balance_reader.clone())
    }
}
