//! Integration tests for the balance ledger.
//!
//! These tests drive the application handlers over the in-memory store:
//! 1. Deposit review resolves each request exactly once
//! 2. Concurrent reviews of one request serialize
//! 3. Any sequence of operations keeps balance equal to the ledger sum

use std::sync::Arc;

use payledger::adapters::memory::InMemoryStore;
use payledger::application::handlers::{
    AdjustBalanceCommand, AdjustBalanceHandler, ApproveDepositRequestCommand,
    CreateDepositRequestCommand, CreateDepositRequestHandler, RejectDepositRequestCommand,
    ReviewDepositRequestHandler,
};
use payledger::domain::balance::{BalanceError, BalanceRequestStatus, LedgerEntryType};
use payledger::domain::foundation::{AdminId, BalanceRequestId, ErrorCode, UserId};
use payledger::ports::BalanceReader;
use proptest::prelude::*;

// =============================================================================
// Test Infrastructure
// =============================================================================

const ADMIN: AdminId = AdminId::new(1);

struct Ledger {
    store: InMemoryStore,
    create: CreateDepositRequestHandler,
    review: Arc<ReviewDepositRequestHandler>,
    adjust: AdjustBalanceHandler,
}

impl Ledger {
    fn new() -> Self {
        let store = InMemoryStore::new();
        Self {
            create: CreateDepositRequestHandler::new(Arc::new(store.clone())),
            review: Arc::new(ReviewDepositRequestHandler::new(Arc::new(store.clone()))),
            adjust: AdjustBalanceHandler::new(Arc::new(store.clone())),
            store,
        }
    }

    async fn request(&self, user: UserId) -> BalanceRequestId {
        self.create
            .handle(CreateDepositRequestCommand {
                user_id: user,
                tx_ref: "0xabc".to_string(),
            })
            .await
            .unwrap()
            .request
            .id
    }

    async fn approve(&self, id: BalanceRequestId, amount_cents: i64) -> Result<i64, BalanceError> {
        self.review
            .approve(ApproveDepositRequestCommand {
                request_id: id,
                amount_cents,
                admin_id: ADMIN,
                comment: None,
            })
            .await
            .map(|r| r.balance_cents)
    }

    async fn adjust(&self, user: UserId, delta_cents: i64, allow_negative: bool) -> Result<i64, BalanceError> {
        self.adjust
            .handle(AdjustBalanceCommand {
                user_id: user,
                delta_cents,
                admin_id: ADMIN,
                comment: None,
                allow_negative,
            })
            .await
            .map(|a| a.balance_cents)
    }
}

// =============================================================================
// Deposit Review
// =============================================================================

#[tokio::test]
async fn deposit_approval_is_final() {
    let ledger = Ledger::new();
    let user = UserId::new(1);
    let id = ledger.request(user).await;

    assert_eq!(ledger.approve(id, 10_000).await, Ok(10_000));

    let err = ledger.approve(id, 10_000).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::Conflict);
    assert!(err.message().contains("status is approved"));

    assert_eq!(ledger.store.balance_cents(user).await.unwrap(), 10_000);
    let types: Vec<_> = ledger
        .store
        .ledger_entries(user)
        .await
        .into_iter()
        .map(|e| e.entry_type)
        .collect();
    assert_eq!(
        types,
        vec![LedgerEntryType::DepositRequestCreated, LedgerEntryType::DepositRequestApproved]
    );
}

#[tokio::test]
async fn rejected_request_cannot_be_approved() {
    let ledger = Ledger::new();
    let user = UserId::new(1);
    let id = ledger.request(user).await;

    ledger
        .review
        .reject(RejectDepositRequestCommand {
            request_id: id,
            admin_id: ADMIN,
            comment: None,
        })
        .await
        .unwrap();

    let err = ledger.approve(id, 500).await.unwrap_err();
    assert!(err.message().contains("status is rejected"));
    assert_eq!(
        ledger.store.balance_request(id).await.unwrap().status,
        BalanceRequestStatus::Rejected
    );
}

#[tokio::test]
async fn concurrent_approvals_credit_once() {
    let ledger = Ledger::new();
    let user = UserId::new(2);
    let id = ledger.request(user).await;

    let mut tasks = Vec::new();
    for _ in 0..8 {
        let review = ledger.review.clone();
        tasks.push(tokio::spawn(async move {
            review
                .approve(ApproveDepositRequestCommand {
                    request_id: id,
                    amount_cents: 2_500,
                    admin_id: ADMIN,
                    comment: None,
                })
                .await
        }));
    }

    let mut approved = 0;
    let mut conflicts = 0;
    for task in tasks {
        match task.await.unwrap() {
            Ok(_) => approved += 1,
            Err(err) if err.code() == ErrorCode::Conflict => conflicts += 1,
            Err(err) => panic!("unexpected error: {err}"),
        }
    }

    assert_eq!(approved, 1);
    assert_eq!(conflicts, 7);
    assert_eq!(ledger.store.balance_cents(user).await.unwrap(), 2_500);
}

// =============================================================================
// Negative Balance Guard
// =============================================================================

#[tokio::test]
async fn overdraw_is_refused_and_leaves_state_untouched() {
    let ledger = Ledger::new();
    let user = UserId::new(3);
    ledger.adjust(user, 1_000, false).await.unwrap();

    let err = ledger.adjust(user, -2_000, false).await.unwrap_err();

    assert_eq!(err.code(), ErrorCode::InvariantViolation);
    assert_eq!(ledger.store.balance_cents(user).await.unwrap(), 1_000);
    assert_eq!(ledger.store.ledger_entries(user).await.len(), 1);
}

// =============================================================================
// Replay Property
// =============================================================================

#[derive(Debug, Clone)]
enum Op {
    Deposit(i64),
    Reject,
    Adjust { delta: i64, allow_negative: bool },
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (1i64..100_000).prop_map(Op::Deposit),
        Just(Op::Reject),
        (-50_000i64..50_000, any::<bool>())
            .prop_map(|(delta, allow_negative)| Op::Adjust { delta, allow_negative }),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn balance_always_equals_ledger_replay(ops in prop::collection::vec(op(), 1..30)) {
        let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();
        runtime.block_on(async {
            let ledger = Ledger::new();
            let user = UserId::new(9);
            let mut expected = 0i64;

            for op in ops {
                match op {
                    Op::Deposit(amount) => {
                        let id = ledger.request(user).await;
                        ledger.approve(id, amount).await.unwrap();
                        expected += amount;
                    }
                    Op::Reject => {
                        let id = ledger.request(user).await;
                        ledger
                            .review
                            .reject(RejectDepositRequestCommand { request_id: id, admin_id: ADMIN, comment: None })
                            .await
                            .unwrap();
                    }
                    Op::Adjust { delta, allow_negative } => {
                        let allowed = delta != 0 && (allow_negative || expected + delta >= 0);
                        let result = ledger.adjust(user, delta, allow_negative).await;
                        assert_eq!(result.is_ok(), allowed);
                        if allowed {
                            expected += delta;
                        }
                    }
                }
            }

            let balance = ledger.store.balance_cents(user).await.unwrap();
            assert_eq!(balance, expected);
            assert_eq!(ledger.store.ledger_sum(user).await.unwrap(), balance);

            let mut running = 0i64;
            for entry in ledger.store.ledger_entries(user).await {
                running += entry.delta_cents;
                assert_eq!(entry.balance_after_cents, running);
            }
        });
    }
}
