//! Top-level router assembly.

use axum::{routing::get, Router};
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use super::balance::{admin_routes, balance_routes};
use super::payment::payment_routes;
use super::state::AppState;

/// Builds the full application router.
///
/// # Routes
///
/// - `GET /health` - Liveness check
/// - `/api/...` - Payment, balance, and admin endpoints
///
/// Every request gets an `x-request-id`, a trace span, and the configured
/// timeout.
pub fn app_router(state: AppState, request_timeout: Duration) -> Router {
    let api = Router::new()
        .merge(payment_routes())
        .merge(balance_routes())
        .merge(admin_routes());

    Router::new()
        .route("/health", get(health))
        .nest("/api", api)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(TimeoutLayer::new(request_timeout)),
        )
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}
