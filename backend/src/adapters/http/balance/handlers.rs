//! HTTP handlers for balance endpoints.
//!
//! User routes act on the caller's own balance. Admin routes take the
//! target user or request from the path.

use axum::extract::{Json, Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use crate::adapters::http::error::{status_for, ErrorResponse};
use crate::adapters::http::middleware::{AuthenticatedAdmin, AuthenticatedUser};
use crate::adapters::http::state::AppState;
use crate::application::handlers::{
    AdjustBalanceCommand, ApproveDepositRequestCommand, CreateDepositRequestCommand,
    GetBalanceQuery, GetUserLedgerQuery, ListBalanceRequestsQuery, RejectDepositRequestCommand,
};
use crate::domain::balance::BalanceError;
use crate::domain::foundation::{BalanceRequestId, DomainError, UserId};

use super::dto::{
    AdjustBalanceRequest, ApproveBalanceRequestRequest, BalanceRequestCreatedResponse,
    BalanceRequestPageResponse, CreateBalanceRequestRequest, DepositAddressResponse, LedgerParams,
    PageParams, RejectBalanceRequestRequest,
};

// ════════════════════════════════════════════════════════════════════════════════
// User Endpoints
// ════════════════════════════════════════════════════════════════════════════════

/// GET /api/me/balance
pub async fn get_balance(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<impl IntoResponse, BalanceApiError> {
    let view = state
        .get_balance_handler()
        .handle(GetBalanceQuery { user_id: user.user_id })
        .await?;
    Ok(Json(view))
}

/// GET /api/me/deposit-address
pub async fn get_deposit_address(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> impl IntoResponse {
    if !state.deposit_address.is_configured() {
        tracing::warn!(user_id = %user.user_id, "deposit address requested but not configured");
    }
    Json(DepositAddressResponse::from(&state.deposit_address))
}

/// POST /api/me/balance-requests
pub async fn create_balance_request(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(request): Json<CreateBalanceRequestRequest>,
) -> Result<impl IntoResponse, BalanceApiError> {
    let cmd = CreateDepositRequestCommand {
        user_id: user.user_id,
        tx_ref: request.tx_ref,
    };
    let created = state.create_deposit_request_handler().handle(cmd).await?;

    let response = BalanceRequestCreatedResponse {
        id: created.request.id,
        status: created.request.status,
    };
    Ok((StatusCode::CREATED, Json(response)))
}

/// GET /api/me/balance-requests?page&limit
pub async fn list_balance_requests(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Query(params): Query<PageParams>,
) -> Result<impl IntoResponse, BalanceApiError> {
    let query = ListBalanceRequestsQuery {
        user_id: user.user_id,
        page: params.page,
        limit: params.limit,
    };
    let page = state.list_balance_requests_handler().handle(query).await?;
    Ok(Json(BalanceRequestPageResponse::from(page)))
}

// ════════════════════════════════════════════════════════════════════════════════
// Admin Endpoints
// ════════════════════════════════════════════════════════════════════════════════

/// POST /api/admin/balance-requests/{id}/approve
pub async fn approve_balance_request(
    State(state): State<AppState>,
    admin: AuthenticatedAdmin,
    Path(request_id): Path<i64>,
    Json(request): Json<ApproveBalanceRequestRequest>,
) -> Result<impl IntoResponse, BalanceApiError> {
    let cmd = ApproveDepositRequestCommand {
        request_id: BalanceRequestId::new(request_id),
        amount_cents: request.amount_cents()?,
        admin_id: admin.admin_id,
        comment: request.comment,
    };
    let resolution = state.review_deposit_request_handler().approve(cmd).await?;
    Ok(Json(resolution))
}

/// POST /api/admin/balance-requests/{id}/reject
pub async fn reject_balance_request(
    State(state): State<AppState>,
    admin: AuthenticatedAdmin,
    Path(request_id): Path<i64>,
    body: Option<Json<RejectBalanceRequestRequest>>,
) -> Result<impl IntoResponse, BalanceApiError> {
    let request = body.map(|Json(b)| b).unwrap_or_default();
    let cmd = RejectDepositRequestCommand {
        request_id: BalanceRequestId::new(request_id),
        admin_id: admin.admin_id,
        comment: request.comment,
    };
    let resolution = state.review_deposit_request_handler().reject(cmd).await?;
    Ok(Json(resolution))
}

/// POST /api/admin/users/{id}/balance/adjust
pub async fn adjust_balance(
    State(state): State<AppState>,
    admin: AuthenticatedAdmin,
    Path(user_id): Path<i64>,
    Json(request): Json<AdjustBalanceRequest>,
) -> Result<impl IntoResponse, BalanceApiError> {
    let cmd = AdjustBalanceCommand {
        user_id: UserId::new(user_id),
        delta_cents: request.delta_cents,
        admin_id: admin.admin_id,
        comment: request.comment,
        allow_negative: request.allow_negative,
    };
    let adjustment = state.adjust_balance_handler().handle(cmd).await?;
    Ok(Json(adjustment))
}

/// GET /api/admin/users/{id}/ledger
pub async fn user_ledger(
    State(state): State<AppState>,
    _admin: AuthenticatedAdmin,
    Path(user_id): Path<i64>,
    Query(params): Query<LedgerParams>,
) -> Result<impl IntoResponse, BalanceApiError> {
    let query = GetUserLedgerQuery {
        user_id: UserId::new(user_id),
        limit: params.limit,
    };
    let view = state.user_ledger_handler().handle(query).await?;
    Ok(Json(view))
}

// ════════════════════════════════════════════════════════════════════════════════
// Error Handling
// ════════════════════════════════════════════════════════════════════════════════

/// API error type that converts ledger errors to HTTP responses.
pub struct BalanceApiError(BalanceError);

impl From<BalanceError> for BalanceApiError {
    fn from(err: BalanceError) -> Self {
        Self(err)
    }
}

impl From<DomainError> for BalanceApiError {
    fn from(err: DomainError) -> Self {
        Self(BalanceError::from(err))
    }
}

impl IntoResponse for BalanceApiError {
    fn into_response(self) -> axum::response::Response {
        let code = self.0.code();
        if self.0.is_retryable() {
            tracing::error!(error = %self.0, "balance request failed");
        }
        let body = ErrorResponse::new(code.to_string(), self.0.message());
        (status_for(code), Json(body)).into_response()
    }
}
