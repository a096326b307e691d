//! HTTP integration tests for the payment and balance API.
//!
//! Every request runs through the full router built by `app_router`:
//! request id, tracing, timeout, extractors and error mapping. Storage is
//! the in-memory adapter and the gateway is the scripted mock.

use std::sync::Arc;
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use secrecy::SecretString;
use serde_json::{json, Value};
use tower::ServiceExt;

use payledger::adapters::http::{app_router, AdminToken, AppState, IdentityProvider};
use payledger::adapters::identity::{sign_init_data, INIT_DATA_HEADER};
use payledger::adapters::{
    InMemoryIpnEventLog, InMemoryStore, MockPaymentGateway, TelegramInitDataValidator,
    TrustedHeaderValidator,
};
use payledger::domain::balance::DepositAddress;
use payledger::ports::UserIdentityValidator;
use payledger::domain::entitlement::EntitlementCode;
use payledger::domain::foundation::{PurchaseId, UserId};
use payledger::domain::payment::{
    sign_payload, GatewayStatus, IpnVerifier, PurchaseStatus, SIGNATURE_HEADER,
};
use payledger::ports::GatewayError;

// =============================================================================
// Test Infrastructure
// =============================================================================

const IPN_SECRET: &str = "ipn-secret";
const ADMIN_TOKEN: &str = "admin-token";
const DEPOSIT_ADDRESS: &str = "TQn9Y2khEsLJW1ChVWFMSMeRDow5KcbLSE";
const BOT_TOKEN: &str = "123456:test-bot";

struct TestApp {
    router: Router,
    store: InMemoryStore,
    ipn_log: Arc<InMemoryIpnEventLog>,
    gateway: Arc<MockPaymentGateway>,
}

impl TestApp {
    fn new() -> Self {
        Self::with_identity(Arc::new(TrustedHeaderValidator))
    }

    fn with_identity(identity: Arc<dyn UserIdentityValidator>) -> Self {
        let store = InMemoryStore::new();
        let ipn_log = Arc::new(InMemoryIpnEventLog::new());
        let gateway = Arc::new(MockPaymentGateway::new());

        let state = AppState {
            uow_factory: Arc::new(store.clone()),
            balance_reader: Arc::new(store.clone()),
            ipn_log: ipn_log.clone(),
            gateway: gateway.clone(),
            ipn_verifier: Some(IpnVerifier::new(SecretString::new(IPN_SECRET.to_string()))),
            ipn_callback_url: "https://pay.example.test/api/payments/ipn".to_string(),
            currency: "USD".to_string(),
            deposit_address: DepositAddress::new(DEPOSIT_ADDRESS, "USDT TRC20"),
            admin_token: AdminToken(SecretString::new(ADMIN_TOKEN.to_string())),
            identity: IdentityProvider(identity),
        };

        Self {
            router: app_router(state, Duration::from_secs(5)),
            store,
            ipn_log,
            gateway,
        }
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };
        (status, body)
    }

    async fn ipn(&self, body: &Value, signature: &str) -> (StatusCode, Value) {
        let request = Request::post("/api/payments/ipn")
            .header("content-type", "application/json")
            .header(SIGNATURE_HEADER, signature)
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await
    }
}

fn json_post(uri: &str) -> axum::http::request::Builder {
    Request::post(uri).header("content-type", "application/json")
}

fn user_post(uri: &str, user: i64, body: Value) -> Request<Body> {
    json_post(uri)
        .header("x-user-id", user.to_string())
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn admin_post(uri: &str, token: &str, body: Value) -> Request<Body> {
    json_post(uri)
        .header("x-admin-id", "1")
        .header("authorization", format!("Bearer {}", token))
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn signed(body: &Value) -> String {
    sign_payload(IPN_SECRET, body.to_string().as_bytes())
}

// =============================================================================
// Health
// =============================================================================

#[tokio::test]
async fn health_reports_ok() {
    let app = TestApp::new();

    let (status, body) = app
        .send(Request::get("/health").body(Body::empty()).unwrap())
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::String("ok".to_string()));
}

// =============================================================================
// Product Payment Settlement
// =============================================================================

#[tokio::test]
async fn finished_ipn_grants_paid_access_once() {
    let app = TestApp::new();
    let user = UserId::new(7);

    let (status, created) = app
        .send(user_post(
            "/api/product-payments/create",
            7,
            json!({ "amount": "10.00", "price_currency": "usd" }),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    let payment_id = created["payment_id"].as_str().unwrap().to_string();
    let order_id = created["order_id"].as_str().unwrap().to_string();
    assert!(created["pay_address"].is_string());

    let ipn = json!({
        "payment_id": payment_id,
        "payment_status": "finished",
        "order_id": order_id,
        "pay_amount": 10.02,
        "actually_paid": 10.02,
        "pay_currency": "usdttrc20"
    });

    let (status, ack) = app.ipn(&ipn, &signed(&ipn)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ack["status"], "ok");

    let (status, _) = app.ipn(&ipn, &signed(&ipn)).await;
    assert_eq!(status, StatusCode::OK);

    let entitlements = app.store.entitlements(user).await;
    assert_eq!(entitlements.len(), 1);
    assert_eq!(entitlements[0].code, EntitlementCode::paid_access());

    let purchase = app.store.purchase(PurchaseId::new(1)).await.unwrap();
    assert_eq!(purchase.status, PurchaseStatus::Finished);
    assert_eq!(app.ipn_log.len().await, 2);
}

#[tokio::test]
async fn array_ipn_is_logged_and_rejected() {
    let app = TestApp::new();
    let body = json!([]);

    let (status, _) = app.ipn(&body, &signed(&body)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let events = app.ipn_log.all().await;
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].payload, "[]");
}

#[tokio::test]
async fn invalid_signature_is_logged_and_rejected() {
    let app = TestApp::new();
    let user = UserId::new(8);

    let (_, created) = app
        .send(user_post("/api/product-payments/create", 8, json!({ "amount": 5 })))
        .await;

    let ipn = json!({
        "payment_id": created["payment_id"],
        "payment_status": "finished",
        "order_id": created["order_id"]
    });
    let (status, body) = app.ipn(&ipn, "deadbeef").await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error_code"], "INVALID_SIGNATURE");

    let events = app.ipn_log.all().await;
    assert_eq!(events.len(), 1);
    assert!(!events[0].signature_valid);

    assert!(app.store.entitlements(user).await.is_empty());
    let purchase = app.store.purchase(PurchaseId::new(1)).await.unwrap();
    assert_eq!(purchase.status, PurchaseStatus::Pending);
}

#[tokio::test]
async fn uncorrelated_ipn_is_acknowledged() {
    let app = TestApp::new();
    let ipn = json!({
        "payment_id": "999",
        "payment_status": "finished",
        "order_id": "unknown-1"
    });

    let (status, _) = app.ipn(&ipn, &signed(&ipn)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(app.ipn_log.len().await, 1);
}

#[tokio::test]
async fn upstream_outage_maps_to_bad_gateway() {
    let app = TestApp::new();
    app.gateway
        .fail_next_create(GatewayError::UpstreamUnavailable("HTTP 503".into()));

    let (status, body) = app
        .send(user_post("/api/product-payments/create", 9, json!({ "amount": 10 })))
        .await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error_code"], "UPSTREAM_UNAVAILABLE");

    let purchase = app.store.purchase(PurchaseId::new(1)).await.unwrap();
    assert_eq!(purchase.status, PurchaseStatus::Pending);
    assert!(purchase.gateway_payment_id.is_none());
}

#[tokio::test]
async fn status_poll_rejects_non_numeric_id() {
    let app = TestApp::new();

    for uri in [
        "/api/payments/status/..%2Fcurrencies",
        "/api/payments/status/12%3Fx=1",
        "/api/payments/status/abc",
    ] {
        let (status, _) = app.send(Request::get(uri).body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
    }
    assert!(app.gateway.status_requests().is_empty());
}

#[tokio::test]
async fn status_poll_forwards_numeric_id() {
    let app = TestApp::new();
    app.gateway.set_status("5077125051", GatewayStatus::Waiting, None);

    let (status, body) = app
        .send(
            Request::get("/api/payments/status/5077125051")
                .body(Body::empty())
                .unwrap(),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["payment_status"], "waiting");
    assert_eq!(app.gateway.status_requests().len(), 1);
}

#[tokio::test]
async fn product_payment_requires_user() {
    let app = TestApp::new();

    let request = json_post("/api/product-payments/create")
        .body(Body::from(json!({ "amount": 10 }).to_string()))
        .unwrap();
    let (status, body) = app.send(request).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error_code"], "AUTHENTICATION_FAILED");
    assert!(app.gateway.invoice_requests().is_empty());
}

// =============================================================================
// User Identity
// =============================================================================

fn telegram_app() -> TestApp {
    let validator = TelegramInitDataValidator::new(SecretString::new(BOT_TOKEN.to_string()));
    TestApp::with_identity(Arc::new(validator))
}

fn balance_request(header: &str, value: &str) -> Request<Body> {
    Request::get("/api/me/balance")
        .header(header, value)
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn signed_init_data_identifies_user() {
    let app = telegram_app();
    let init_data = sign_init_data(BOT_TOKEN, &[("user", r#"{"id":4242}"#)]);

    let (status, body) = app.send(balance_request(INIT_DATA_HEADER, &init_data)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["balance_cents"], 0);
}

#[tokio::test]
async fn forwarded_user_id_is_refused_when_init_data_is_required() {
    let app = telegram_app();

    let (status, body) = app.send(balance_request("x-user-id", "4242")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error_code"], "AUTHENTICATION_FAILED");

    let forged = sign_init_data("999:other-bot", &[("user", r#"{"id":4242}"#)]);
    let (status, _) = app.send(balance_request(INIT_DATA_HEADER, &forged)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

// =============================================================================
// Deposit Address
// =============================================================================

#[tokio::test]
async fn deposit_address_is_shown_to_users() {
    let app = TestApp::new();

    let (status, body) = app
        .send(
            Request::get("/api/me/deposit-address")
                .header("x-user-id", "3")
                .body(Body::empty())
                .unwrap(),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["address"], DEPOSIT_ADDRESS);
    assert_eq!(body["network_label"], "USDT TRC20");
    assert_eq!(body["qr_payload"], DEPOSIT_ADDRESS);
}

#[tokio::test]
async fn deposit_address_requires_user() {
    let app = TestApp::new();

    let (status, _) = app
        .send(Request::get("/api/me/deposit-address").body(Body::empty()).unwrap())
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

// =============================================================================
// Balance Requests
// =============================================================================

#[tokio::test]
async fn deposit_request_approval_flow() {
    let app = TestApp::new();

    let (status, created) = app
        .send(user_post("/api/me/balance-requests", 3, json!({ "tx_ref": "0xfeed" })))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["status"], "pending");
    let id = created["id"].as_i64().unwrap();
    let approve_uri = format!("/api/admin/balance-requests/{}/approve", id);

    let (status, _) = app
        .send(admin_post(&approve_uri, ADMIN_TOKEN, json!({ "amount": "100.00" })))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app
        .send(admin_post(&approve_uri, ADMIN_TOKEN, json!({ "amount": "100.00" })))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["message"].as_str().unwrap().contains("status is approved"));

    let (status, balance) = app
        .send(
            Request::get("/api/me/balance")
                .header("x-user-id", "3")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(balance["balance_cents"], 10_000);
}

#[tokio::test]
async fn admin_routes_reject_bad_token() {
    let app = TestApp::new();

    let (status, body) = app
        .send(admin_post(
            "/api/admin/users/3/balance/adjust",
            "wrong-token",
            json!({ "delta_cents": 500 }),
        ))
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error_code"], "AUTHENTICATION_FAILED");
    assert!(app.store.ledger_entries(UserId::new(3)).await.is_empty());
}

#[tokio::test]
async fn overdraw_adjustment_is_unprocessable() {
    let app = TestApp::new();

    let (status, _) = app
        .send(admin_post(
            "/api/admin/users/4/balance/adjust",
            ADMIN_TOKEN,
            json!({ "delta_cents": 1000 }),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app
        .send(admin_post(
            "/api/admin/users/4/balance/adjust",
            ADMIN_TOKEN,
            json!({ "delta_cents": -2000 }),
        ))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error_code"], "INVARIANT_VIOLATION");
    assert_eq!(app.store.ledger_entries(UserId::new(4)).await.len(), 1);
}
