//! In-memory storage with serialized units of work.
//!
//! A unit of work holds the store's async mutex for its whole lifetime and
//! mutates a private copy of the state. Commit swaps the copy in; rollback
//! or drop discards it. Units of work therefore run one at a time, which
//! is stricter than the row locks the Postgres adapter takes.

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::domain::balance::{BalanceLedgerEntry, BalanceRequest, BalanceRequestStatus, NewLedgerEntry, UserBalance};
use crate::domain::entitlement::Entitlement;
use crate::domain::foundation::{
    BalanceRequestId, BookingId, DomainError, GatewayPaymentId, LedgerEntryId, PurchaseId,
    Timestamp, UserId,
};
use crate::domain::payment::{Booking, NewPurchase, PaymentRecord, Purchase};
use crate::ports::{
    BalanceReader, BalanceStore, EntitlementStore, Page, PaymentStore, UnitOfWork,
    UnitOfWorkFactory,
};

#[derive(Debug, Clone, Default)]
struct StoreState {
    balances: HashMap<UserId, UserBalance>,
    ledger: Vec<BalanceLedgerEntry>,
    requests: BTreeMap<BalanceRequestId, BalanceRequest>,
    purchases: BTreeMap<PurchaseId, Purchase>,
    bookings: BTreeMap<BookingId, Booking>,
    payment_records: HashMap<GatewayPaymentId, PaymentRecord>,
    entitlements: Vec<Entitlement>,
    last_ledger_id: i64,
    last_request_id: i64,
    last_purchase_id: i64,
}

/// Shared in-memory store.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<Mutex<StoreState>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a booking. Bookings are created outside this
    /// service, so this stands in for that CRUD path.
    pub async fn put_booking(&self, booking: Booking) {
        self.state.lock().await.bookings.insert(booking.id, booking);
    }

    pub async fn booking(&self, id: BookingId) -> Option<Booking> {
        self.state.lock().await.bookings.get(&id).cloned()
    }

    pub async fn purchase(&self, id: PurchaseId) -> Option<Purchase> {
        self.state.lock().await.purchases.get(&id).cloned()
    }

    pub async fn payment_record(&self, payment_id: &GatewayPaymentId) -> Option<PaymentRecord> {
        self.state.lock().await.payment_records.get(payment_id).cloned()
    }

    pub async fn entitlements(&self, user: UserId) -> Vec<Entitlement> {
        self.state
            .lock()
            .await
            .entitlements
            .iter()
            .filter(|e| e.user_id == user)
            .cloned()
            .collect()
    }

    /// Every ledger row for a user, oldest first.
    pub async fn ledger_entries(&self, user: UserId) -> Vec<BalanceLedgerEntry> {
        self.state
            .lock()
            .await
            .ledger
            .iter()
            .filter(|e| e.user_id == user)
            .cloned()
            .collect()
    }

    pub async fn balance_request(&self, id: BalanceRequestId) -> Option<BalanceRequest> {
        self.state.lock().await.requests.get(&id).cloned()
    }
}

#[async_trait]
impl UnitOfWorkFactory for InMemoryStore {
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, DomainError> {
        let guard = self.state.clone().lock_owned().await;
        let working = guard.clone();
        Ok(Box::new(InMemoryUnitOfWork { guard, working }))
    }
}

/// A unit of work over [`InMemoryStore`].
pub struct InMemoryUnitOfWork {
    guard: OwnedMutexGuard<StoreState>,
    working: StoreState,
}

#[async_trait]
impl UnitOfWork for InMemoryUnitOfWork {
    async fn commit(self: Box<Self>) -> Result<(), DomainError> {
        let InMemoryUnitOfWork { mut guard, working } = *self;
        *guard = working;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), DomainError> {
        Ok(())
    }
}

#[async_trait]
impl BalanceStore for InMemoryUnitOfWork {
    async fn ensure_balance(&mut self, user: UserId) -> Result<(), DomainError> {
        self.working
            .balances
            .entry(user)
            .or_insert_with(|| UserBalance::zero(user));
        Ok(())
    }

    async fn lock_balance(&mut self, user: UserId) -> Result<Option<UserBalance>, DomainError> {
        Ok(self.working.balances.get(&user).cloned())
    }

    async fn save_balance(&mut self, balance: &UserBalance) -> Result<(), DomainError> {
        self.working.balances.insert(balance.user_id, balance.clone());
        Ok(())
    }

    async fn insert_ledger_entry(
        &mut self,
        entry: NewLedgerEntry,
    ) -> Result<BalanceLedgerEntry, DomainError> {
        self.working.last_ledger_id += 1;
        let entry = entry.into_entry(LedgerEntryId::new(self.working.last_ledger_id));
        self.working.ledger.push(entry.clone());
        Ok(entry)
    }

    async fn insert_balance_request(
        &mut self,
        user: UserId,
        tx_ref: &str,
        created_at: Timestamp,
    ) -> Result<BalanceRequest, DomainError> {
        self.working.last_request_id += 1;
        let request = BalanceRequest {
            id: BalanceRequestId::new(self.working.last_request_id),
            user_id: user,
            tx_ref: tx_ref.to_string(),
            status: BalanceRequestStatus::Pending,
            admin_comment: None,
            created_at,
            reviewed_at: None,
            reviewed_by_admin_id: None,
        };
        self.working.requests.insert(request.id, request.clone());
        Ok(request)
    }

    async fn lock_balance_request(
        &mut self,
        id: BalanceRequestId,
    ) -> Result<Option<BalanceRequest>, DomainError> {
        Ok(self.working.requests.get(&id).cloned())
    }

    async fn save_balance_request(&mut self, request: &BalanceRequest) -> Result<(), DomainError> {
        self.working.requests.insert(request.id, request.clone());
        Ok(())
    }
}

#[async_trait]
impl PaymentStore for InMemoryUnitOfWork {
    async fn insert_purchase(&mut self, purchase: NewPurchase) -> Result<Purchase, DomainError> {
        self.working.last_purchase_id += 1;
        let purchase = purchase.into_purchase(PurchaseId::new(self.working.last_purchase_id));
        self.working.purchases.insert(purchase.id, purchase.clone());
        Ok(purchase)
    }

    async fn lock_purchase(&mut self, id: PurchaseId) -> Result<Option<Purchase>, DomainError> {
        Ok(self.working.purchases.get(&id).cloned())
    }

    async fn lock_purchase_by_payment_id(
        &mut self,
        payment_id: &GatewayPaymentId,
    ) -> Result<Option<Purchase>, DomainError> {
        Ok(self
            .working
            .purchases
            .values()
            .find(|p| p.gateway_payment_id.as_ref() == Some(payment_id))
            .cloned())
    }

    async fn save_purchase(&mut self, purchase: &Purchase) -> Result<(), DomainError> {
        if let Some(payment_id) = &purchase.gateway_payment_id {
            let taken = self.working.purchases.values().any(|p| {
                p.id != purchase.id && p.gateway_payment_id.as_ref() == Some(payment_id)
            });
            if taken {
                return Err(DomainError::database(format!(
                    "payment id {} already attached to another purchase",
                    payment_id
                )));
            }
        }
        self.working.purchases.insert(purchase.id, purchase.clone());
        Ok(())
    }

    async fn lock_booking(&mut self, id: BookingId) -> Result<Option<Booking>, DomainError> {
        Ok(self.working.bookings.get(&id).cloned())
    }

    async fn lock_booking_by_payment_id(
        &mut self,
        payment_id: &GatewayPaymentId,
    ) -> Result<Option<Booking>, DomainError> {
        Ok(self
            .working
            .bookings
            .values()
            .find(|b| b.gateway_payment_id.as_ref() == Some(payment_id))
            .cloned())
    }

    async fn save_booking(&mut self, booking: &Booking) -> Result<(), DomainError> {
        self.working.bookings.insert(booking.id, booking.clone());
        Ok(())
    }

    async fn lock_payment_record(
        &mut self,
        payment_id: &GatewayPaymentId,
    ) -> Result<Option<PaymentRecord>, DomainError> {
        Ok(self.working.payment_records.get(payment_id).cloned())
    }

    async fn upsert_payment_record(&mut self, record: &PaymentRecord) -> Result<(), DomainError> {
        self.working
            .payment_records
            .insert(record.payment_id.clone(), record.clone());
        Ok(())
    }
}

#[async_trait]
impl EntitlementStore for InMemoryUnitOfWork {
    async fn insert_entitlement_if_absent(
        &mut self,
        entitlement: &Entitlement,
    ) -> Result<bool, DomainError> {
        let exists = self
            .working
            .entitlements
            .iter()
            .any(|e| e.user_id == entitlement.user_id && e.code == entitlement.code);
        if exists {
            return Ok(false);
        }
        self.working.entitlements.push(entitlement.clone());
        Ok(true)
    }

    async fn list_entitlements(&mut self, user: UserId) -> Result<Vec<Entitlement>, DomainError> {
        Ok(self
            .working
            .entitlements
            .iter()
            .filter(|e| e.user_id == user)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl BalanceReader for InMemoryStore {
    async fn balance_cents(&self, user: UserId) -> Result<i64, DomainError> {
        Ok(self
            .state
            .lock()
            .await
            .balances
            .get(&user)
            .map(|b| b.balance_cents)
            .unwrap_or(0))
    }

    async fn list_requests(
        &self,
        user: UserId,
        page: u32,
        limit: u32,
    ) -> Result<Page<BalanceRequest>, DomainError> {
        let state = self.state.lock().await;
        let mine: Vec<&BalanceRequest> = state
            .requests
            .values()
            .rev()
            .filter(|r| r.user_id == user)
            .collect();
        let skip = (page.max(1) as usize - 1) * limit as usize;
        Ok(Page {
            total: mine.len() as u64,
            items: mine.into_iter().skip(skip).take(limit as usize).cloned().collect(),
            page: page.max(1),
            limit,
        })
    }

    async fn list_ledger(&self, user: UserId, limit: u32) -> Result<Vec<BalanceLedgerEntry>, DomainError> {
        Ok(self
            .state
            .lock()
            .await
            .ledger
            .iter()
            .rev()
            .filter(|e| e.user_id == user)
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn ledger_sum(&self, user: UserId) -> Result<i64, DomainError> {
        Ok(self
            .state
            .lock()
            .await
            .ledger
            .iter()
            .filter(|e| e.user_id == user)
            .map(|e| e.delta_cents)
            .sum())
    }
}
