//! HTTP adapter for payment endpoints.
//!
//! - `POST /api/payments/ipn` - NOWPayments IPN callback
//! - `POST /api/payments/create` - Create an invoice for an order id
//! - `GET /api/payments/status/{payment_id}` - Poll a payment
//! - `POST /api/product-payments/create` - Product purchase

pub mod dto;
pub mod handlers;
pub mod routes;

pub use routes::payment_routes;
