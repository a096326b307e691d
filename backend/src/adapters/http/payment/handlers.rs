//! HTTP handlers for payment endpoints.

use axum::body::Bytes;
use axum::extract::{Json, Path, State};
use axum::http::HeaderMap;
use axum::response::IntoResponse;

use crate::adapters::http::error::{status_for, ErrorResponse};
use crate::adapters::http::middleware::AuthenticatedUser;
use crate::adapters::http::state::AppState;
use crate::application::handlers::{
    CreateInvoiceCommand, CreateProductPaymentCommand, HandleIpnCommand, PollPaymentStatusQuery,
};
use crate::domain::foundation::{DomainError, GatewayPaymentId};
use crate::domain::payment::{PaymentError, WebhookError, SIGNATURE_HEADER};

use super::dto::{
    CreatePaymentRequest, CreatePaymentResponse, CreateProductPaymentRequest,
    CreateProductPaymentResponse, IpnAckResponse, PaymentStatusResponse,
};

// ════════════════════════════════════════════════════════════════════════════════
// Gateway-facing
// ════════════════════════════════════════════════════════════════════════════════

/// POST /api/payments/ipn - NOWPayments callback
///
/// Idempotent no-ops and uncorrelated payments still answer 200 so the
/// gateway stops redelivering.
pub async fn handle_ipn(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, WebhookApiError> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let cmd = HandleIpnCommand {
        payload: body.to_vec(),
        signature,
    };
    state.ipn_handler().handle(cmd).await?;

    Ok(Json(IpnAckResponse::ok()))
}

// ════════════════════════════════════════════════════════════════════════════════
// Client-facing
// ════════════════════════════════════════════════════════════════════════════════

/// POST /api/payments/create - Invoice an existing order id
pub async fn create_payment(
    State(state): State<AppState>,
    Json(request): Json<CreatePaymentRequest>,
) -> Result<impl IntoResponse, PaymentApiError> {
    let cmd = CreateInvoiceCommand {
        order_id: request.order_id,
        amount: request.amount,
        price_currency: request.price_currency,
        pay_currency: request.pay_currency,
        order_description: request.order_description,
    };

    let invoice = state.create_invoice_handler().handle(cmd).await?;
    Ok(Json(CreatePaymentResponse::from(invoice)))
}

/// GET /api/payments/status/{payment_id} - Poll the gateway
pub async fn payment_status(
    State(state): State<AppState>,
    Path(payment_id): Path<String>,
) -> Result<impl IntoResponse, PaymentApiError> {
    let payment_id = GatewayPaymentId::numeric(payment_id).map_err(PaymentError::from)?;
    let result = state
        .poll_payment_status_handler()
        .handle(PollPaymentStatusQuery { payment_id })
        .await?;

    Ok(Json(PaymentStatusResponse::from(result)))
}

/// POST /api/product-payments/create - Buy a product
pub async fn create_product_payment(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(request): Json<CreateProductPaymentRequest>,
) -> Result<impl IntoResponse, PaymentApiError> {
    let cmd = CreateProductPaymentCommand {
        user_id: user.user_id,
        amount: request.amount,
        price_currency: request.price_currency,
        pay_currency: request.pay_currency,
        order_description: request.order_description,
    };

    let result = state.create_product_payment_handler().handle(cmd).await?;
    Ok(Json(CreateProductPaymentResponse::from(result)))
}

// ════════════════════════════════════════════════════════════════════════════════
// Error Handling
// ════════════════════════════════════════════════════════════════════════════════

/// API error type for payment endpoints.
pub struct PaymentApiError(PaymentError);

impl From<PaymentError> for PaymentApiError {
    fn from(err: PaymentError) -> Self {
        Self(err)
    }
}

impl From<DomainError> for PaymentApiError {
    fn from(err: DomainError) -> Self {
        Self(PaymentError::from(err))
    }
}

impl IntoResponse for PaymentApiError {
    fn into_response(self) -> axum::response::Response {
        let code = self.0.code();
        if matches!(self.0, PaymentError::Infrastructure(_)) {
            tracing::error!(error = %self.0, "payment request failed");
        }
        let body = ErrorResponse::new(code.to_string(), self.0.message());
        (status_for(code), Json(body)).into_response()
    }
}

/// API error type for the IPN callback.
pub struct WebhookApiError(WebhookError);

impl From<WebhookError> for WebhookApiError {
    fn from(err: WebhookError) -> Self {
        Self(err)
    }
}

impl IntoResponse for WebhookApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, code) = match &self.0 {
            WebhookError::MissingSignature
            | WebhookError::InvalidSignature
            | WebhookError::SecretNotConfigured => (self.0.status_code(), "INVALID_SIGNATURE"),
            WebhookError::ParseError(_) | WebhookError::MissingField(_) => {
                (self.0.status_code(), "INVALID_PAYLOAD")
            }
            WebhookError::Database(_) => (self.0.status_code(), "INTERNAL_ERROR"),
        };
        let body = ErrorResponse::new(code, self.0.to_string());
        (status, Json(body)).into_response()
    }
}
