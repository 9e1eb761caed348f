//! Order persistence
//!
//! The store is the single source of truth for order status. Two backends
//! implement the same contract: [`in_memory::InMemoryOrderStore`] for tests
//! and development, and [`sqlite::SqliteOrderStore`] (feature `sqlite`) for
//! the file-backed production table.
//!
//! Status updates go through [`OrderStore::update_status`], which is
//! idempotent for same-status repeats and refuses to move an order out of a
//! terminal state. Implementations serialize concurrent writes per order
//! id, so two racing gateway callbacks settle an order exactly once.

use crate::core::order::{Order, OrderStatus, OrderSummary};
use async_trait::async_trait;
use thiserror::Error;

/// Default and maximum row count for admin listings.
pub const DEFAULT_LIST_LIMIT: u32 = 200;

/// Store outcomes callers are expected to match on.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Order '{id}' already exists")]
    DuplicateId { id: String },

    #[error("Order '{id}' not found")]
    NotFound { id: String },

    #[error("Order '{id}' cannot move from {from} to {to}")]
    InvalidTransition {
        id: String,
        from: OrderStatus,
        to: OrderStatus,
    },

    #[error("Stored order '{id}' is corrupt: {message}")]
    Corrupt { id: String, message: String },

    #[error("Storage error: {message}")]
    Io { message: String },
}

/// Persistence capability for orders.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Insert a new order. Fails with [`StoreError::DuplicateId`] when the
    /// id is already taken.
    async fn create(&self, order: Order) -> Result<Order, StoreError>;

    /// Fetch one order by id.
    async fn get(&self, id: &str) -> Result<Order, StoreError>;

    /// Apply a status transition and return the updated order.
    ///
    /// Applying the current status again is a no-op that succeeds; any
    /// other move out of a terminal state is
    /// [`StoreError::InvalidTransition`].
    async fn update_status(&self, id: &str, status: OrderStatus)
    -> Result<Order, StoreError>;

    /// Most recent orders first. `limit` is clamped to
    /// [`DEFAULT_LIST_LIMIT`].
    async fn list(&self, limit: u32) -> Result<Vec<OrderSummary>, StoreError>;
}

pub mod in_memory;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use in_memory::InMemoryOrderStore;
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteOrderStore;
