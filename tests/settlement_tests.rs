use dutyreg::application::engine::DutyEngine;
use dutyreg::domain::identity::{AccountId, Credits};
use dutyreg::domain::payment::PayCode;
use dutyreg::domain::stamp::StampCode;
use dutyreg::domain::ports::TokenLedger;
use dutyreg::error::DutyError;
use dutyreg::infrastructure::in_memory::{InMemoryLedger, OwnerGate};

fn owner() -> AccountId {
    AccountId::new("authority")
}

fn code(s: &str) -> StampCode {
    StampCode::parse(s).unwrap()
}

fn engine() -> (DutyEngine, InMemoryLedger) {
    let ledger = InMemoryLedger::new(owner());
    let gate = OwnerGate::new(owner(), ledger.pause_flag());
    let engine = DutyEngine::new(Box::new(ledger.clone()), Box::new(gate));
    (engine, ledger)
}

async fn create_stamp(engine: &DutyEngine, c: &str, price: u64, active: bool) {
    engine
        .create_stamp(
            &owner(),
            code(c),
            format!("Revenue Stamp {price}"),
            Credits::new(price),
            "PP-2021-57".to_string(),
            active,
        )
        .await
        .unwrap();
}

async fn pay(engine: &DutyEngine, payer: &str, p: &str, s: &str) -> dutyreg::error::Result<()> {
    engine
        .create_payment(
            &AccountId::new(payer),
            PayCode::new(p),
            format!("hash-{p}"),
            code(s),
            format!("bloom-{p}"),
        )
        .await
}

#[tokio::test]
async fn test_full_settlement_flow() {
    let (engine, ledger) = engine();
    create_stamp(&engine, "S1", 5000, true).await;
    ledger.credit(&AccountId::new("alice"), Credits::new(5000)).await;

    pay(&engine, "alice", "P1", "S1").await.unwrap();

    assert_eq!(
        ledger.balance_of(&AccountId::new("alice")).await.unwrap(),
        Credits::ZERO
    );
    assert!(engine.is_payment(&PayCode::new("P1")).await);
    assert_eq!(
        engine.payment_detail(&PayCode::new("P1")).await.unwrap().stamp,
        code("S1")
    );

    // Immediate retry with the same code: rejected, no double charge.
    let retry = pay(&engine, "alice", "P1", "S1").await;
    assert!(matches!(retry, Err(DutyError::DuplicateKey(_))));
    assert_eq!(
        ledger.balance_of(&AccountId::new("alice")).await.unwrap(),
        Credits::ZERO
    );
    assert_eq!(engine.payment_count().await, 1);

    // Deactivated stamp blocks further settlements.
    engine.deactivate_stamp(&owner(), &code("S1")).await.unwrap();
    let blocked = pay(&engine, "alice", "P2", "S1").await;
    assert!(matches!(blocked, Err(DutyError::InactiveReference(_))));
}

#[tokio::test]
async fn test_settlement_ordering_across_stamps() {
    let (engine, ledger) = engine();
    create_stamp(&engine, "S1", 10, true).await;
    create_stamp(&engine, "S2", 20, true).await;
    ledger.credit(&AccountId::new("alice"), Credits::new(100)).await;

    pay(&engine, "alice", "P1", "S1").await.unwrap();
    pay(&engine, "alice", "P2", "S2").await.unwrap();
    pay(&engine, "alice", "P3", "S1").await.unwrap();

    // Global payment list keeps settlement order.
    assert_eq!(
        engine.pay_codes().await,
        vec![PayCode::new("P1"), PayCode::new("P2"), PayCode::new("P3")]
    );
    // Per-stamp lists keep their own order with positional lookup.
    assert_eq!(
        engine.stamp_pay_codes(&code("S1")).await.unwrap(),
        vec![PayCode::new("P1"), PayCode::new("P3")]
    );
    assert_eq!(
        engine.payment_of_stamp_at(&code("S1"), 1).await.unwrap(),
        PayCode::new("P3")
    );
    assert_eq!(engine.payments_of_stamp_count(&code("S2")).await.unwrap(), 1);

    // 10 + 20 + 10 settled.
    assert_eq!(
        ledger.balance_of(&owner()).await.unwrap(),
        Credits::new(40)
    );
}

#[tokio::test]
async fn test_stamp_catalog_queries() {
    let (engine, _ledger) = engine();
    create_stamp(&engine, "S1", 1000, true).await;
    create_stamp(&engine, "S2", 2000, false).await;

    assert_eq!(engine.stamp_count().await, 2);
    assert_eq!(engine.stamp_codes().await, vec![code("S1"), code("S2")]);

    let s2 = engine.stamp_detail(&code("S2")).await.unwrap();
    assert_eq!(s2.price, Credits::new(2000));
    assert!(!s2.active);
    assert_eq!(engine.stamp_detail_at(1).await.unwrap(), s2);

    assert!(matches!(
        engine.stamp_detail_at(2).await,
        Err(DutyError::NotFound(_))
    ));

    // Unknown codes are rejected even though position 0 is occupied.
    assert!(engine.is_stamp(&code("S1")).await);
    assert!(!engine.is_stamp(&code("S9")).await);
    assert!(!engine.is_payment(&PayCode::new("P1")).await);
}

#[tokio::test]
async fn test_repeated_reads_are_stable() {
    let (engine, ledger) = engine();
    create_stamp(&engine, "S1", 500, true).await;
    ledger.credit(&AccountId::new("alice"), Credits::new(500)).await;
    pay(&engine, "alice", "P1", "S1").await.unwrap();

    let stamp_first = engine.stamp_detail(&code("S1")).await.unwrap();
    let payment_first = engine.payment_detail(&PayCode::new("P1")).await.unwrap();
    for _ in 0..3 {
        assert_eq!(engine.stamp_detail(&code("S1")).await.unwrap(), stamp_first);
        assert_eq!(
            engine.payment_detail(&PayCode::new("P1")).await.unwrap(),
            payment_first
        );
    }
}

#[tokio::test]
async fn test_concurrent_settlements_cannot_overdraw() {
    let (engine, ledger) = engine();
    create_stamp(&engine, "S1", 5000, true).await;
    // Enough for exactly one settlement.
    ledger.credit(&AccountId::new("alice"), Credits::new(5000)).await;

    let engine = std::sync::Arc::new(engine);
    let mut handles = Vec::new();
    for i in 0..4 {
        let engine = std::sync::Arc::clone(&engine);
        handles.push(tokio::spawn(async move {
            engine
                .create_payment(
                    &AccountId::new("alice"),
                    PayCode::new(format!("P{i}")),
                    format!("hash{i}"),
                    StampCode::parse("S1").unwrap(),
                    format!("bloom{i}"),
                )
                .await
        }));
    }

    let mut succeeded = 0;
    for handle in handles {
        if handle.await.unwrap().is_ok() {
            succeeded += 1;
        }
    }

    // The write guard spans check, transfer and commit: only one can win.
    assert_eq!(succeeded, 1);
    assert_eq!(engine.payment_count().await, 1);
    assert_eq!(
        ledger.balance_of(&AccountId::new("alice")).await.unwrap(),
        Credits::ZERO
    );
    assert_eq!(
        ledger.balance_of(&owner()).await.unwrap(),
        Credits::new(5000)
    );
}
