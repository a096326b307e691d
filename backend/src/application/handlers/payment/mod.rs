//! Payment command and query handlers.

mod create_invoice;
mod create_product_payment;
mod handle_ipn;
mod invoice_mirror;
mod poll_payment_status;

pub use create_invoice::{CreateInvoiceCommand, CreateInvoiceHandler, CreateInvoiceResult};
pub use create_product_payment::{
    CreateProductPaymentCommand, CreateProductPaymentHandler, CreateProductPaymentResult,
};
pub use handle_ipn::{HandleIpnCommand, HandleIpnHandler, HandleIpnResult};
pub use poll_payment_status::{
    PollPaymentStatusHandler, PollPaymentStatusQuery, PollPaymentStatusResult,
};
