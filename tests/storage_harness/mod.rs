//! Shared test harness for order store backends
//!
//! Provides order fixtures plus the `order_store_tests!` macro, which
//! generates a conformance suite any [`OrderStore`] implementation must
//! pass: create/get, duplicate rejection, the status state machine
//! (idempotent repeats, terminal finality), listing order and the
//! racing-settlement guarantee.
//!
//! # Usage
//!
//! From any integration test file in `tests/`:
//! ```rust,ignore
//! #[macro_use]
//! mod storage_harness;
//!
//! use storage_harness::*;
//!
//! order_store_tests!(InMemoryOrderStore::new());
//! ```
//!
//! `$factory` is re-evaluated per test for isolation and may be an
//! `.await` expression for stores that open asynchronously.

#![allow(dead_code)]

use chrono::{DateTime, SubsecRound, Utc};
use homechef::core::order::{CustomerInfo, LineItem, Order, OrderStatus};

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// A pending single-line order with full contact details.
pub fn sample_order(id: &str, total: i64) -> Order {
    sample_order_at(id, total, Utc::now())
}

/// Same as [`sample_order`] with an explicit creation time, for tests
/// that assert on listing order.
///
/// Timestamps are truncated to milliseconds, the finest precision every
/// backend round-trips.
pub fn sample_order_at(id: &str, total: i64, created_at: DateTime<Utc>) -> Order {
    let created_at = created_at.trunc_subsecs(3);
    Order {
        id: id.to_string(),
        items: vec![LineItem {
            name: "Chicken Biryani".to_string(),
            variation: Some("Family".to_string()),
            price: total,
            quantity: 1,
        }],
        total,
        customer: CustomerInfo {
            name: Some("Ali Raza".to_string()),
            email: Some("ali@example.com".to_string()),
            phone: Some("+923001234567".to_string()),
            discount_percent: 0,
        },
        status: OrderStatus::Pending,
        created_at,
    }
}

// ---------------------------------------------------------------------------
// Conformance suite
// ---------------------------------------------------------------------------

/// Generate a full `OrderStore` conformance test suite.
///
/// `$factory` must be an expression that evaluates to an instance
/// implementing `OrderStore`. For the racing-settlement test it is
/// wrapped in an `Arc` and shared across tasks.
#[macro_export]
macro_rules! order_store_tests {
    ($factory:expr) => {
        mod order_store_contract_tests {
            use super::*;
            use chrono::{Duration, Utc};
            use homechef::core::order::OrderStatus;
            use homechef::store::{OrderStore, StoreError};

            // ==================================================================
            // Create & Get
            // ==================================================================

            #[tokio::test]
            async fn test_create_and_get() {
                let store = $factory;
                let order = sample_order("ORD-1001", 1500);

                let created = store.create(order.clone()).await.unwrap();
                assert_eq!(created.id, "ORD-1001");
                assert_eq!(created.status, OrderStatus::Pending);

                let fetched = store.get("ORD-1001").await.unwrap();
                assert_eq!(fetched.total, 1500);
                assert_eq!(fetched.items.len(), 1);
                assert_eq!(fetched.items[0].name, "Chicken Biryani");
                assert_eq!(fetched.items[0].variation.as_deref(), Some("Family"));
                assert_eq!(fetched.customer.name.as_deref(), Some("Ali Raza"));
                assert_eq!(fetched.customer.phone.as_deref(), Some("+923001234567"));
                assert_eq!(fetched.created_at, order.created_at);
            }

            #[tokio::test]
            async fn test_get_unknown_order() {
                let store = $factory;
                let err = store.get("ORD-404").await.unwrap_err();
                assert!(matches!(err, StoreError::NotFound { .. }));
            }

            #[tokio::test]
            async fn test_duplicate_id_rejected() {
                let store = $factory;
                store.create(sample_order("ORD-1", 500)).await.unwrap();

                let err = store.create(sample_order("ORD-1", 700)).await.unwrap_err();
                assert!(matches!(err, StoreError::DuplicateId { .. }));

                // The original row is untouched
                assert_eq!(store.get("ORD-1").await.unwrap().total, 500);
            }

            // ==================================================================
            // Status state machine
            // ==================================================================

            #[tokio::test]
            async fn test_settle_pending_order() {
                let store = $factory;
                store.create(sample_order("ORD-2", 500)).await.unwrap();

                let paid = store
                    .update_status("ORD-2", OrderStatus::Paid)
                    .await
                    .unwrap();
                assert_eq!(paid.status, OrderStatus::Paid);
                assert_eq!(
                    store.get("ORD-2").await.unwrap().status,
                    OrderStatus::Paid
                );
            }

            #[tokio::test]
            async fn test_repeating_a_status_is_idempotent() {
                let store = $factory;
                store.create(sample_order("ORD-3", 500)).await.unwrap();
                store
                    .update_status("ORD-3", OrderStatus::Paid)
                    .await
                    .unwrap();

                // A redelivered success callback must not error
                let again = store
                    .update_status("ORD-3", OrderStatus::Paid)
                    .await
                    .unwrap();
                assert_eq!(again.status, OrderStatus::Paid);
            }

            #[tokio::test]
            async fn test_paid_is_terminal() {
                let store = $factory;
                store.create(sample_order("ORD-4", 500)).await.unwrap();
                store
                    .update_status("ORD-4", OrderStatus::Paid)
                    .await
                    .unwrap();

                let err = store
                    .update_status("ORD-4", OrderStatus::Failed)
                    .await
                    .unwrap_err();
                assert!(matches!(
                    err,
                    StoreError::InvalidTransition {
                        from: OrderStatus::Paid,
                        to: OrderStatus::Failed,
                        ..
                    }
                ));
                assert_eq!(
                    store.get("ORD-4").await.unwrap().status,
                    OrderStatus::Paid
                );
            }

            #[tokio::test]
            async fn test_failed_is_terminal() {
                let store = $factory;
                store.create(sample_order("ORD-5", 500)).await.unwrap();
                store
                    .update_status("ORD-5", OrderStatus::Failed)
                    .await
                    .unwrap();

                let err = store
                    .update_status("ORD-5", OrderStatus::Paid)
                    .await
                    .unwrap_err();
                assert!(matches!(err, StoreError::InvalidTransition { .. }));
            }

            #[tokio::test]
            async fn test_update_unknown_order() {
                let store = $factory;
                let err = store
                    .update_status("ORD-404", OrderStatus::Paid)
                    .await
                    .unwrap_err();
                assert!(matches!(err, StoreError::NotFound { .. }));
            }

            // ==================================================================
            // Listing
            // ==================================================================

            #[tokio::test]
            async fn test_list_newest_first() {
                let store = $factory;
                let base = Utc::now();
                store
                    .create(sample_order_at("ORD-A", 100, base - Duration::minutes(2)))
                    .await
                    .unwrap();
                store
                    .create(sample_order_at("ORD-B", 200, base - Duration::minutes(1)))
                    .await
                    .unwrap();
                store
                    .create(sample_order_at("ORD-C", 300, base))
                    .await
                    .unwrap();

                let rows = store.list(10).await.unwrap();
                let ids: Vec<&str> = rows.iter().map(|r| r.id.as_str()).collect();
                assert_eq!(ids, vec!["ORD-C", "ORD-B", "ORD-A"]);
                assert_eq!(rows[0].total, 300);
                assert_eq!(rows[0].status, OrderStatus::Pending);
            }

            #[tokio::test]
            async fn test_list_respects_limit() {
                let store = $factory;
                let base = Utc::now();
                for i in 0..5 {
                    store
                        .create(sample_order_at(
                            &format!("ORD-{}", i),
                            100,
                            base - Duration::seconds(i),
                        ))
                        .await
                        .unwrap();
                }

                let rows = store.list(2).await.unwrap();
                assert_eq!(rows.len(), 2);
                assert_eq!(rows[0].id, "ORD-0");
                assert_eq!(rows[1].id, "ORD-1");
            }

            #[tokio::test]
            async fn test_list_empty_store() {
                let store = $factory;
                assert!(store.list(10).await.unwrap().is_empty());
            }

            // ==================================================================
            // Concurrency
            // ==================================================================

            #[tokio::test]
            async fn test_racing_settlements_pick_one_winner() {
                let store = ::std::sync::Arc::new($factory);
                store.create(sample_order("ORD-RACE", 500)).await.unwrap();

                let a = {
                    let store = store.clone();
                    tokio::spawn(async move {
                        store.update_status("ORD-RACE", OrderStatus::Paid).await
                    })
                };
                let b = {
                    let store = store.clone();
                    tokio::spawn(async move {
                        store.update_status("ORD-RACE", OrderStatus::Failed).await
                    })
                };

                let a = a.await.unwrap();
                let b = b.await.unwrap();

                // Exactly one side settles; the loser sees the conflict.
                assert_eq!(
                    a.is_ok() as u8 + b.is_ok() as u8,
                    1,
                    "one settlement must win, got {:?} and {:?}",
                    a,
                    b
                );
                let winner = if a.is_ok() {
                    OrderStatus::Paid
                } else {
                    OrderStatus::Failed
                };
                assert_eq!(store.get("ORD-RACE").await.unwrap().status, winner);
            }
        }
    };
}
