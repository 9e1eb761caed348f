//! Integration tests for the SQLite order store using the storage test harness.
//!
//! # Requirements
//!
//! - Feature flag `sqlite` must be enabled (it is part of the default set)
//! - No external services needed (the database is a local file)
//!
//! # Running
//!
//! ```sh
//! cargo test --test sqlite_tests
//! ```
//!
//! # Notes
//!
//! Each test gets a fresh temporary directory via `tempfile::TempDir`.
//! The database file is opened within that directory so tests are fully
//! isolated and can run in parallel.

#![cfg(feature = "sqlite")]

#[macro_use]
mod storage_harness;

use homechef::core::order::OrderStatus;
use homechef::store::{OrderStore, SqliteOrderStore, StoreError};
use storage_harness::*;
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Factory helpers (fresh temp dir per test for isolation)
// ---------------------------------------------------------------------------

async fn fresh_sqlite_store() -> SqliteOrderStore {
    let dir = TempDir::new().expect("Failed to create temp dir");
    // Leak the TempDir so it lives for the duration of the test
    // (otherwise it would be dropped immediately, deleting the DB file)
    let path = dir.path().join("orders.db");
    std::mem::forget(dir);
    SqliteOrderStore::open(&path)
        .await
        .expect("Failed to open SQLite order store")
}

// ---------------------------------------------------------------------------
// Test suite via macro
// ---------------------------------------------------------------------------

order_store_tests!(fresh_sqlite_store().await);

// ---------------------------------------------------------------------------
// File-backed specifics
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_orders_survive_reopen() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = dir.path().join("orders.db");

    {
        let store = SqliteOrderStore::open(&path).await.unwrap();
        store.create(sample_order("ORD-PERSIST", 900)).await.unwrap();
        store
            .update_status("ORD-PERSIST", OrderStatus::Paid)
            .await
            .unwrap();
    }

    let store = SqliteOrderStore::open(&path).await.unwrap();
    let order = store.get("ORD-PERSIST").await.unwrap();
    assert_eq!(order.total, 900);
    assert_eq!(order.status, OrderStatus::Paid);
}

#[tokio::test]
async fn test_parent_directories_are_created() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = dir.path().join("nested").join("data").join("orders.db");

    let store = SqliteOrderStore::open(&path).await.unwrap();
    store.create(sample_order("ORD-NEST", 100)).await.unwrap();
    assert!(path.exists());
}

#[tokio::test]
async fn test_corrupt_items_json_is_reported() {
    let store = fresh_sqlite_store().await;
    store.create(sample_order("ORD-BAD", 100)).await.unwrap();

    sqlx::query("UPDATE orders SET items_json = 'not json' WHERE id = ?")
        .bind("ORD-BAD")
        .execute(store.pool())
        .await
        .unwrap();

    let err = store.get("ORD-BAD").await.unwrap_err();
    assert!(matches!(err, StoreError::Corrupt { .. }));
    assert!(err.to_string().contains("ORD-BAD"));
}

#[tokio::test]
async fn test_unknown_status_text_is_reported() {
    let store = fresh_sqlite_store().await;
    store.create(sample_order("ORD-ODD", 100)).await.unwrap();

    sqlx::query("UPDATE orders SET status = 'refunded' WHERE id = ?")
        .bind("ORD-ODD")
        .execute(store.pool())
        .await
        .unwrap();

    let err = store.get("ORD-ODD").await.unwrap_err();
    assert!(matches!(err, StoreError::Corrupt { .. }));
}
