//! NOWPayments gateway adapters.

mod api_types;
mod client;
mod mock_gateway;

pub use client::{NowPaymentsClient, NowPaymentsConfig, DEFAULT_API_BASE_URL};
pub use mock_gateway::MockPaymentGateway;
