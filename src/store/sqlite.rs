//! SQLite storage backend using sqlx.
//!
//! Provides the file-backed `SqliteOrderStore` behind the `sqlite` feature
//! flag. One process, one database file, WAL journal.
//!
//! # Schema
//!
//! Orders live in a single `orders` table. Line items are serialized to a
//! JSON column (they are only ever read back whole); the admin-facing
//! columns (total, status, created_at) are dedicated so listings never
//! touch the JSON. `created_at` is RFC 3339 text with millisecond
//! precision, which sorts lexicographically in creation order.
//!
//! # Transition atomicity
//!
//! `update_status` is a single conditional UPDATE. SQLite serializes
//! writers, so two racing callbacks settle an order exactly once; the
//! loser's UPDATE matches zero rows and is classified by a follow-up read.

use super::{DEFAULT_LIST_LIMIT, OrderStore, StoreError};
use crate::core::order::{CustomerInfo, LineItem, Order, OrderStatus, OrderSummary};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use std::path::Path;

// ---------------------------------------------------------------------------
// Schema management
// ---------------------------------------------------------------------------

/// Apply the required table and index (idempotent).
///
/// Safe to call on every startup.
pub async fn ensure_schema(pool: &SqlitePool) -> Result<(), StoreError> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS orders (
            id TEXT NOT NULL PRIMARY KEY,
            items_json TEXT NOT NULL,
            total INTEGER NOT NULL,
            customer_name TEXT NULL,
            customer_email TEXT NULL,
            customer_phone TEXT NULL,
            discount_percent INTEGER NOT NULL DEFAULT 0,
            status TEXT NOT NULL,
            created_at TEXT NOT NULL
        )",
    )
    .execute(pool)
    .await
    .map_err(|e| StoreError::Io {
        message: format!("Failed to create orders table: {}", e),
    })?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_orders_created_at ON orders (created_at)")
        .execute(pool)
        .await
        .map_err(|e| StoreError::Io {
            message: format!("Failed to create orders index: {}", e),
        })?;

    Ok(())
}

// ---------------------------------------------------------------------------
// Row mapping
// ---------------------------------------------------------------------------

type OrderRow = (
    String,         // id
    String,         // items_json
    i64,            // total
    Option<String>, // customer_name
    Option<String>, // customer_email
    Option<String>, // customer_phone
    i64,            // discount_percent
    String,         // status
    String,         // created_at
);

const ORDER_COLUMNS: &str = "id, items_json, total, customer_name, customer_email, \
                             customer_phone, discount_percent, status, created_at";

fn decode_order(row: OrderRow) -> Result<Order, StoreError> {
    let (id, items_json, total, name, email, phone, discount, status, created_at) = row;

    let corrupt = |message: String| StoreError::Corrupt {
        id: id.clone(),
        message,
    };

    let items: Vec<LineItem> = serde_json::from_str(&items_json)
        .map_err(|e| corrupt(format!("bad items_json: {}", e)))?;
    let status: OrderStatus = status.parse().map_err(corrupt)?;
    let created_at = DateTime::parse_from_rfc3339(&created_at)
        .map_err(|e| corrupt(format!("bad created_at: {}", e)))?
        .with_timezone(&Utc);
    let discount_percent = u8::try_from(discount)
        .map_err(|_| corrupt(format!("discount_percent {} out of range", discount)))?;

    Ok(Order {
        id,
        items,
        total,
        customer: CustomerInfo {
            name,
            email,
            phone,
            discount_percent,
        },
        status,
        created_at,
    })
}

fn encode_created_at(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn io_err(context: &str, e: sqlx::Error) -> StoreError {
    StoreError::Io {
        message: format!("{}: {}", context, e),
    }
}

// ---------------------------------------------------------------------------
// SqliteOrderStore
// ---------------------------------------------------------------------------

/// File-backed order store.
#[derive(Clone)]
pub struct SqliteOrderStore {
    pool: SqlitePool,
}

impl SqliteOrderStore {
    /// Open (or create) the database file and apply the schema.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| StoreError::Io {
                    message: format!("Failed to create {}: {}", parent.display(), e),
                })?;
            }
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(|e| io_err("Failed to open database", e))?;

        ensure_schema(&pool).await?;

        Ok(Self { pool })
    }

    /// Wrap an existing pool (schema must already be applied).
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl OrderStore for SqliteOrderStore {
    async fn create(&self, order: Order) -> Result<Order, StoreError> {
        let items_json = serde_json::to_string(&order.items).map_err(|e| StoreError::Io {
            message: format!("Failed to serialize items: {}", e),
        })?;

        let result = sqlx::query(
            "INSERT INTO orders (id, items_json, total, customer_name, customer_email, \
             customer_phone, discount_percent, status, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&order.id)
        .bind(&items_json)
        .bind(order.total)
        .bind(&order.customer.name)
        .bind(&order.customer.email)
        .bind(&order.customer.phone)
        .bind(i64::from(order.customer.discount_percent))
        .bind(order.status.as_str())
        .bind(encode_created_at(order.created_at))
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(order),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Err(StoreError::DuplicateId { id: order.id })
            }
            Err(e) => Err(io_err("Failed to insert order", e)),
        }
    }

    async fn get(&self, id: &str) -> Result<Order, StoreError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {} FROM orders WHERE id = ?",
            ORDER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| io_err("Failed to get order", e))?;

        match row {
            Some(row) => decode_order(row),
            None => Err(StoreError::NotFound { id: id.to_string() }),
        }
    }

    async fn update_status(
        &self,
        id: &str,
        status: OrderStatus,
    ) -> Result<Order, StoreError> {
        // Matches when the order is still pending or already carries the
        // requested status (idempotent repeat). Anything else is a
        // terminal-state conflict.
        let result = sqlx::query(
            "UPDATE orders SET status = ?2 \
             WHERE id = ?1 AND (status = ?2 OR status = 'pending')",
        )
        .bind(id)
        .bind(status.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| io_err("Failed to update order status", e))?;

        if result.rows_affected() == 0 {
            // Distinguish a missing order from an illegal transition.
            let current = self.get(id).await?;
            return Err(StoreError::InvalidTransition {
                id: id.to_string(),
                from: current.status,
                to: status,
            });
        }

        self.get(id).await
    }

    async fn list(&self, limit: u32) -> Result<Vec<OrderSummary>, StoreError> {
        let limit = limit.clamp(1, DEFAULT_LIST_LIMIT);

        let rows = sqlx::query_as::<_, (String, i64, String, String)>(
            "SELECT id, total, status, created_at FROM orders \
             ORDER BY created_at DESC, id DESC LIMIT ?",
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| io_err("Failed to list orders", e))?;

        rows.into_iter()
            .map(|(id, total, status, created_at)| {
                let corrupt = |message: String| StoreError::Corrupt {
                    id: id.clone(),
                    message,
                };
                let status: OrderStatus = status.parse().map_err(corrupt)?;
                let created_at = DateTime::parse_from_rfc3339(&created_at)
                    .map_err(|e| corrupt(format!("bad created_at: {}", e)))?
                    .with_timezone(&Utc);
                Ok(OrderSummary {
                    id,
                    total,
                    status,
                    created_at,
                })
            })
            .collect()
    }
}
