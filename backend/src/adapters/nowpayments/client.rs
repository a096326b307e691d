//! NOWPayments REST client.
//!
//! Implements `PaymentGateway` over `POST /payment` and
//! `GET /payment/{id}`. Every request carries the `x-api-key` header and
//! is bounded by the configured timeout.
//!
//! # Failure Classification
//!
//! | Condition | Error |
//! |-----------|-------|
//! | Network error, timeout | `UpstreamUnavailable` |
//! | HTTP 5xx | `UpstreamUnavailable` |
//! | HTTP 4xx | `Validation` with the gateway's message |
//! | 2xx with unusable body | `MalformedResponse` |

use async_trait::async_trait;
use reqwest::{Client, Url};
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use std::time::{Duration, Instant};

use crate::domain::foundation::GatewayPaymentId;
use crate::domain::payment::{Invoice, InvoiceRequest, NotificationSource, PaymentNotification};
use crate::ports::{GatewayError, PaymentGateway};

use super::api_types::{error_message, CreatePaymentBody};

/// Default API root.
pub const DEFAULT_API_BASE_URL: &str = "https://api.nowpayments.io/v1";

/// Client configuration.
#[derive(Clone)]
pub struct NowPaymentsConfig {
    api_key: SecretString,
    api_base_url: String,
    timeout: Duration,
}

impl NowPaymentsConfig {
    pub fn new(api_key: SecretString) -> Self {
        Self {
            api_key,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            timeout: Duration::from_secs(15),
        }
    }

    /// Sets a custom API root (for testing). Trailing slashes are dropped.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl std::fmt::Debug for NowPaymentsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NowPaymentsConfig")
            .field("api_base_url", &self.api_base_url)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

/// NOWPayments gateway adapter.
pub struct NowPaymentsClient {
    config: NowPaymentsConfig,
    http_client: Client,
}

impl NowPaymentsClient {
    /// Builds the client.
    ///
    /// # Errors
    ///
    /// Fails only if the TLS backend cannot be initialized.
    pub fn new(config: NowPaymentsConfig) -> Result<Self, GatewayError> {
        let http_client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| GatewayError::UpstreamUnavailable(format!("HTTP client init failed: {}", e)))?;
        Ok(Self { config, http_client })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.api_base_url, path)
    }

    /// Builds `{base}/payment/{id}` with the id as one encoded segment.
    fn payment_url(&self, payment_id: &GatewayPaymentId) -> Result<Url, GatewayError> {
        let mut url = Url::parse(&self.url("/payment"))
            .map_err(|e| GatewayError::Validation(format!("invalid API base URL: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| GatewayError::Validation("API base URL cannot hold a path".to_string()))?
            .push(payment_id.as_str());
        Ok(url)
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<Value, GatewayError> {
        let response = request
            .header("x-api-key", self.config.api_key.expose_secret())
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GatewayError::UpstreamUnavailable(format!(
                        "timed out after {}s",
                        self.config.timeout.as_secs()
                    ))
                } else {
                    GatewayError::UpstreamUnavailable(e.to_string())
                }
            })?;

        let status = response.status();
        if status.is_client_error() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), body = %body, "NOWPayments rejected request");
            return Err(GatewayError::Validation(error_message(&body)));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = status.as_u16(), body = %body, "NOWPayments request failed");
            return Err(GatewayError::UpstreamUnavailable(format!("HTTP {}", status.as_u16())));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| GatewayError::MalformedResponse(e.to_string()))
    }
}

#[async_trait]
impl PaymentGateway for NowPaymentsClient {
    async fn create_invoice(&self, request: &InvoiceRequest) -> Result<Invoice, GatewayError> {
        let body = CreatePaymentBody::from_request(request).ok_or_else(|| {
            GatewayError::Validation(format!("amount {} is not representable", request.price_amount))
        })?;

        let started = Instant::now();
        tracing::info!(
            order_id = %request.order_id,
            amount = %request.price_amount,
            pay_currency = %request.pay_currency,
            "nowpayments create start"
        );

        let raw = self
            .send(self.http_client.post(self.url("/payment")).json(&body))
            .await?;
        let invoice =
            Invoice::from_json(raw).map_err(|e| GatewayError::MalformedResponse(e.to_string()))?;

        tracing::info!(
            order_id = %request.order_id,
            payment_id = %invoice.payment_id,
            took_ms = started.elapsed().as_millis() as u64,
            "nowpayments create ok"
        );
        Ok(invoice)
    }

    async fn get_status(
        &self,
        payment_id: &GatewayPaymentId,
    ) -> Result<PaymentNotification, GatewayError> {
        let url = self.payment_url(payment_id)?;
        let raw = self.send(self.http_client.get(url)).await?;
        PaymentNotification::from_json(raw, NotificationSource::Polled)
            .map_err(|e| GatewayError::MalformedResponse(e.to_string()))
    }
}
