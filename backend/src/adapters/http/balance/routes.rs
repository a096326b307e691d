//! Axum routes for balance endpoints.

use axum::{
    routing::{get, post},
    Router,
};

use crate::adapters::http::state::AppState;

use super::handlers::{
    adjust_balance, approve_balance_request, create_balance_request, get_balance,
    get_deposit_address, list_balance_requests, reject_balance_request, user_ledger,
};

/// User balance routes, mounted under `/api`.
///
/// # Routes
///
/// - `GET /me/balance` - Current balance
/// - `GET /me/deposit-address` - Static top-up address and network
/// - `POST /me/balance-requests` - Submit a deposit request
/// - `GET /me/balance-requests` - Own deposit requests, paged
pub fn balance_routes() -> Router<AppState> {
    Router::new()
        .route("/me/balance", get(get_balance))
        .route("/me/deposit-address", get(get_deposit_address))
        .route(
            "/me/balance-requests",
            post(create_balance_request).get(list_balance_requests),
        )
}

/// Admin routes, mounted under `/api`.
///
/// # Routes
///
/// - `POST /admin/balance-requests/:id/approve`
/// - `POST /admin/balance-requests/:id/reject`
/// - `POST /admin/users/:id/balance/adjust`
/// - `GET /admin/users/:id/ledger`
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/admin/balance-requests/:id/approve", post(approve_balance_request))
        .route("/admin/balance-requests/:id/reject", post(reject_balance_request))
        .route("/admin/users/:id/balance/adjust", post(adjust_balance))
        .route("/admin/users/:id/ledger", get(user_ledger))
}
