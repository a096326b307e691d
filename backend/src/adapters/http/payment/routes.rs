//! Axum routes for payment endpoints.

use axum::{
    routing::{get, post},
    Router,
};

use crate::adapters::http::state::AppState;

use super::handlers::{create_payment, create_product_payment, handle_ipn, payment_status};

/// Payment routes, mounted under `/api`.
///
/// # Routes
///
/// - `POST /payments/ipn` - Gateway callback (signature verified)
/// - `POST /payments/create` - Invoice an order id
/// - `GET /payments/status/:payment_id` - Poll status (mirror only)
/// - `POST /product-payments/create` - Buy a product (requires user)
pub fn payment_routes() -> Router<AppState> {
    Router::new()
        .route("/payments/ipn", post(handle_ipn))
        .route("/payments/create", post(create_payment))
        .route("/payments/status/:payment_id", get(payment_status))
        .route("/product-payments/create", post(create_product_payment))
}
