//! PaymentStore port - transactional access to purchases, bookings, and
//! gateway payment mirrors.

use async_trait::async_trait;

use crate::domain::foundation::{BookingId, DomainError, GatewayPaymentId, PurchaseId};
use crate::domain::payment::{Booking, NewPurchase, PaymentRecord, Purchase};

#[async_trait]
pub trait PaymentStore: Send {
    /// Inserts a pending purchase. Storage assigns the id and derives the
    /// `product-<id>` order id from it.
    async fn insert_purchase(&mut self, purchase: NewPurchase) -> Result<Purchase, DomainError>;

    async fn lock_purchase(&mut self, id: PurchaseId) -> Result<Option<Purchase>, DomainError>;

    async fn lock_purchase_by_payment_id(
        &mut self,
        payment_id: &GatewayPaymentId,
    ) -> Result<Option<Purchase>, DomainError>;

    async fn save_purchase(&mut self, purchase: &Purchase) -> Result<(), DomainError>;

    async fn lock_booking(&mut self, id: BookingId) -> Result<Option<Booking>, DomainError>;

    async fn lock_booking_by_payment_id(
        &mut self,
        payment_id: &GatewayPaymentId,
    ) -> Result<Option<Booking>, DomainError>;

    async fn save_booking(&mut self, booking: &Booking) -> Result<(), DomainError>;

    async fn lock_payment_record(
        &mut self,
        payment_id: &GatewayPaymentId,
    ) -> Result<Option<PaymentRecord>, DomainError>;

    /// Inserts or replaces the mirror keyed by its payment id.
    async fn upsert_payment_record(&mut self, record: &PaymentRecord) -> Result<(), DomainError>;
}
