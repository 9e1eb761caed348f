//! In-memory implementation of OrderStore for testing and development

use super::{DEFAULT_LIST_LIMIT, OrderStore, StoreError};
use crate::core::order::{Order, OrderStatus, OrderSummary};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// In-memory order store.
///
/// Useful for testing and development. Uses RwLock for thread-safe access;
/// the write lock serializes status transitions the same way SQLite's
/// single writer does.
#[derive(Clone)]
pub struct InMemoryOrderStore {
    orders: Arc<RwLock<HashMap<String, Order>>>,
}

impl InMemoryOrderStore {
    /// Create a new in-memory order store
    pub fn new() -> Self {
        Self {
            orders: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl Default for InMemoryOrderStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn create(&self, order: Order) -> Result<Order, StoreError> {
        let mut orders = self.orders.write().map_err(|e| StoreError::Io {
            message: format!("Failed to acquire write lock: {}", e),
        })?;

        if orders.contains_key(&order.id) {
            return Err(StoreError::DuplicateId {
                id: order.id.clone(),
            });
        }

        orders.insert(order.id.clone(), order.clone());

        Ok(order)
    }

    async fn get(&self, id: &str) -> Result<Order, StoreError> {
        let orders = self.orders.read().map_err(|e| StoreError::Io {
            message: format!("Failed to acquire read lock: {}", e),
        })?;

        orders
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound { id: id.to_string() })
    }

    async fn update_status(
        &self,
        id: &str,
        status: OrderStatus,
    ) -> Result<Order, StoreError> {
        let mut orders = self.orders.write().map_err(|e| StoreError::Io {
            message: format!("Failed to acquire write lock: {}", e),
        })?;

        let order = orders
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound { id: id.to_string() })?;

        if order.status == status {
            // Idempotent repeat, nothing to write.
            return Ok(order.clone());
        }

        if !order.status.can_transition_to(status) {
            return Err(StoreError::InvalidTransition {
                id: id.to_string(),
                from: order.status,
                to: status,
            });
        }

        order.status = status;
        Ok(order.clone())
    }

    async fn list(&self, limit: u32) -> Result<Vec<OrderSummary>, StoreError> {
        let orders = self.orders.read().map_err(|e| StoreError::Io {
            message: format!("Failed to acquire read lock: {}", e),
        })?;

        let mut summaries: Vec<OrderSummary> =
            orders.values().map(OrderSummary::from).collect();
        // Newest first; id breaks ties within the same timestamp.
        summaries.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        summaries.truncate(limit.clamp(1, DEFAULT_LIST_LIMIT) as usize);

        Ok(summaries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::order::{CustomerInfo, LineItem};
    use chrono::{Duration, Utc};

    fn order(id: &str, minutes_ago: i64) -> Order {
        Order {
            id: id.to_string(),
            items: vec![LineItem {
                name: "Chicken Biryani".to_string(),
                variation: Some("Large".to_string()),
                price: 750,
                quantity: 2,
            }],
            total: 1500,
            customer: CustomerInfo::default(),
            status: OrderStatus::Pending,
            created_at: Utc::now() - Duration::minutes(minutes_ago),
        }
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let store = InMemoryOrderStore::new();
        store.create(order("ORD-1", 0)).await.unwrap();

        let fetched = store.get("ORD-1").await.unwrap();
        assert_eq!(fetched.total, 1500);
        assert_eq!(fetched.status, OrderStatus::Pending);
    }

    #[tokio::test]
    async fn test_duplicate_id_rejected() {
        let store = InMemoryOrderStore::new();
        store.create(order("ORD-1", 0)).await.unwrap();

        let err = store.create(order("ORD-1", 0)).await.unwrap_err();
        assert!(matches!(err, StoreError::DuplicateId { .. }));
    }

    #[tokio::test]
    async fn test_get_missing() {
        let store = InMemoryOrderStore::new();
        let err = store.get("ORD-404").await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_transition_and_idempotent_repeat() {
        let store = InMemoryOrderStore::new();
        store.create(order("ORD-1", 0)).await.unwrap();

        let paid = store
            .update_status("ORD-1", OrderStatus::Paid)
            .await
            .unwrap();
        assert_eq!(paid.status, OrderStatus::Paid);

        // Same status again succeeds without complaint.
        let again = store
            .update_status("ORD-1", OrderStatus::Paid)
            .await
            .unwrap();
        assert_eq!(again.status, OrderStatus::Paid);
    }

    #[tokio::test]
    async fn test_terminal_state_is_sticky() {
        let store = InMemoryOrderStore::new();
        store.create(order("ORD-1", 0)).await.unwrap();
        store
            .update_status("ORD-1", OrderStatus::Paid)
            .await
            .unwrap();

        let err = store
            .update_status("ORD-1", OrderStatus::Failed)
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

        // The stored status survived the bad update.
        assert_eq!(store.get("ORD-1").await.unwrap().status, OrderStatus::Paid);
    }

    #[tokio::test]
    async fn test_list_newest_first_with_limit() {
        let store = InMemoryOrderStore::new();
        store.create(order("ORD-old", 30)).await.unwrap();
        store.create(order("ORD-mid", 20)).await.unwrap();
        store.create(order("ORD-new", 10)).await.unwrap();

        let all = store.list(200).await.unwrap();
        let ids: Vec<&str> = all.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["ORD-new", "ORD-mid", "ORD-old"]);

        let top = store.list(2).await.unwrap();
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].id, "ORD-new");
    }

    #[tokio::test]
    async fn test_list_limit_is_clamped() {
        let store = InMemoryOrderStore::new();
        for i in 0..5 {
            store.create(order(&format!("ORD-{}", i), i)).await.unwrap();
        }
        // 0 is nonsense; clamps to at least one row.
        assert_eq!(store.list(0).await.unwrap().len(), 1);
    }
}
