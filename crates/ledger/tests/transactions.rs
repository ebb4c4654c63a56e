use std::sync::{Arc, Mutex};

use chrono::{TimeZone, Utc};
use sea_orm::Database;
use uuid::Uuid;

use ledger::{EventKind, Ledger, LedgerError, NewTransaction, Transaction};
use migration::MigratorTrait;

async fn ledger_with_db() -> Ledger {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    Ledger::builder().database(db).build()
}

fn capture_events(ledger: &Ledger, kind: EventKind) -> Arc<Mutex<Vec<Transaction>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    ledger.events().subscribe(kind, move |tx| {
        sink.lock().unwrap().push(tx.clone());
    });
    seen
}

#[tokio::test]
async fn add_persists_and_fires_added_event() {
    let ledger = ledger_with_db().await;
    let added = capture_events(&ledger, EventKind::TransactionAdded);

    let persisted = ledger
        .add(NewTransaction::new("Groceries", 1000), None)
        .await
        .unwrap();

    assert!(persisted.id > 0);
    assert_eq!(persisted.description, "Groceries");
    assert_eq!(persisted.amount_total_cents, 1000);
    assert!(!persisted.is_deleted);

    let active = ledger.list_active().await.unwrap();
    assert_eq!(active, vec![persisted.clone()]);

    let added = added.lock().unwrap();
    assert_eq!(added.len(), 1);
    assert_eq!(added[0], persisted);
}

#[tokio::test]
async fn add_rejects_blank_description() {
    let ledger = ledger_with_db().await;
    let added = capture_events(&ledger, EventKind::TransactionAdded);

    for description in ["", "   "] {
        let err = ledger
            .add(NewTransaction::new(description, 100), None)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("null or blank"), "{err}");
    }
    assert!(added.lock().unwrap().is_empty());
}

#[tokio::test]
async fn add_enforces_description_length_limit() {
    let ledger = ledger_with_db().await;

    let err = ledger
        .add(NewTransaction::new("x".repeat(51), 100), None)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("character limit is 50"), "{err}");

    ledger
        .add(NewTransaction::new("x", 100), None)
        .await
        .unwrap();
    ledger
        .add(NewTransaction::new("y".repeat(50), 100), None)
        .await
        .unwrap();
}

#[tokio::test]
async fn add_rejects_negative_amount() {
    let ledger = ledger_with_db().await;

    let err = ledger
        .add(NewTransaction::new("Refund gone wrong", -1), None)
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::Validation(_)));
    assert!(err.to_string().contains("negative"), "{err}");
}

#[tokio::test]
async fn add_rejects_duplicate_identifier() {
    let ledger = ledger_with_db().await;
    let added = capture_events(&ledger, EventKind::TransactionAdded);
    let uid = Uuid::new_v4();

    ledger
        .add(NewTransaction::new("First", 222).with_identifier(uid), None)
        .await
        .unwrap();

    let err = ledger
        .add(NewTransaction::new("Second", 1000).with_identifier(uid), None)
        .await
        .unwrap_err();
    assert_eq!(err, LedgerError::DuplicateIdentifier(uid));
    assert!(err.to_string().contains("already exists"), "{err}");
    assert_eq!(added.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn deleted_record_still_blocks_identifier_reuse() {
    let ledger = ledger_with_db().await;
    let uid = Uuid::new_v4();

    ledger
        .add(NewTransaction::new("Short lived", 500).with_identifier(uid), None)
        .await
        .unwrap();
    ledger.delete(uid).await.unwrap();

    let err = ledger
        .add(NewTransaction::new("Reuse attempt", 500).with_identifier(uid), None)
        .await
        .unwrap_err();
    assert_eq!(err, LedgerError::DuplicateIdentifier(uid));
}

#[tokio::test]
async fn delete_soft_deletes_and_fires_deleted_event() {
    let ledger = ledger_with_db().await;
    let deleted = capture_events(&ledger, EventKind::TransactionDeleted);

    let persisted = ledger
        .add(NewTransaction::new("Lunch", 1250), None)
        .await
        .unwrap();
    let uid = persisted.unique_identifier;

    ledger.delete(uid).await.unwrap();

    assert!(ledger.list_active().await.unwrap().is_empty());
    assert!(matches!(
        ledger.get_by_identifier(uid, false).await.unwrap_err(),
        LedgerError::NotFound(_)
    ));

    let shadow = ledger.get_by_identifier(uid, true).await.unwrap();
    assert!(shadow.is_deleted);
    assert_eq!(shadow.description, "Lunch");

    // The event carries the pre-deletion snapshot, exactly once.
    let deleted = deleted.lock().unwrap();
    assert_eq!(deleted.len(), 1);
    assert_eq!(deleted[0], persisted);
}

#[tokio::test]
async fn delete_of_missing_or_deleted_record_fails_with_not_found() {
    let ledger = ledger_with_db().await;

    let uid = Uuid::new_v4();
    assert_eq!(
        ledger.delete(uid).await.unwrap_err(),
        LedgerError::NotFound(uid)
    );

    let persisted = ledger
        .add(NewTransaction::new("Once", 100), None)
        .await
        .unwrap();
    ledger.delete(persisted.unique_identifier).await.unwrap();
    assert_eq!(
        ledger.delete(persisted.unique_identifier).await.unwrap_err(),
        LedgerError::NotFound(persisted.unique_identifier)
    );
}

#[tokio::test]
async fn total_active_cents_sums_only_non_deleted() {
    let ledger = ledger_with_db().await;
    assert_eq!(ledger.total_active_cents().await.unwrap(), 0);

    ledger
        .add(NewTransaction::new("a".repeat(10), 222), None)
        .await
        .unwrap();
    ledger
        .add(NewTransaction::new("b".repeat(10), 222), None)
        .await
        .unwrap();
    let big = ledger
        .add(NewTransaction::new("c".repeat(10), 1111), None)
        .await
        .unwrap();
    ledger.delete(big.unique_identifier).await.unwrap();

    assert_eq!(ledger.total_active_cents().await.unwrap(), 444);
}

#[tokio::test]
async fn date_override_is_stored() {
    let ledger = ledger_with_db().await;
    let stamp = Utc.with_ymd_and_hms(2025, 12, 24, 18, 30, 0).unwrap();

    let persisted = ledger
        .add(NewTransaction::new("Christmas dinner", 7500), Some(stamp))
        .await
        .unwrap();

    assert_eq!(persisted.transaction_date_utc, stamp);
    let read_back = ledger
        .get_by_identifier(persisted.unique_identifier, false)
        .await
        .unwrap();
    assert_eq!(read_back.transaction_date_utc, stamp);
}
