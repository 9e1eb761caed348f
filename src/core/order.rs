//! Core order domain model
//!
//! An order is created `pending` and moves forward exactly once: to `paid`
//! or to `failed`, driven by payment-gateway callbacks. Terminal states
//! never transition again; a repeated transition to the *same* status is an
//! idempotent no-op (gateways redeliver callbacks).
//!
//! All money is in whole rupees. Gateways that want minor units (paisa)
//! convert at the adapter boundary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};

/// Slack (in rupees) tolerated between a caller-declared total and the
/// server-computed one. Covers discount rounding drift in clients.
pub const TOTAL_TOLERANCE: u64 = 1;

/// Largest computed total (in rupees) an order may carry. Keeps every
/// stored total safe for the downstream arithmetic: paisa conversion
/// multiplies by 100, discount rounding by the percent.
pub const MAX_ORDER_TOTAL: i64 = 10_000_000;

// =============================================================================
// Status state machine
// =============================================================================

/// Lifecycle status of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    /// Created, payment not yet settled. The only state with exits.
    Pending,
    /// Gateway confirmed payment. Terminal.
    Paid,
    /// Gateway reported failure or cancellation. Terminal.
    Failed,
}

impl OrderStatus {
    /// `paid` and `failed` are terminal: nothing leaves them.
    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Paid | OrderStatus::Failed)
    }

    /// Whether applying `next` is legal. Same-status repeats are allowed
    /// (idempotent), otherwise only `pending` may move.
    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        self == next || self == OrderStatus::Pending
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Paid => "paid",
            OrderStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(OrderStatus::Pending),
            "paid" => Ok(OrderStatus::Paid),
            "failed" => Ok(OrderStatus::Failed),
            other => Err(format!("unknown order status '{}'", other)),
        }
    }
}

// =============================================================================
// Order data
// =============================================================================

/// A single line on an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    /// Menu item name as shown to the customer.
    pub name: String,

    /// Size or portion label ("Small", "Large", ...). Absent for
    /// single-size items.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variation: Option<String>,

    /// Unit price in whole rupees.
    pub price: i64,

    pub quantity: u32,
}

impl LineItem {
    pub fn line_total(&self) -> i64 {
        self.price * i64::from(self.quantity)
    }

    /// "Chicken Biryani (Large)" or just the name when there is no
    /// variation.
    pub fn display_name(&self) -> String {
        match &self.variation {
            Some(v) if !v.is_empty() => format!("{} ({})", self.name, v),
            _ => self.name.clone(),
        }
    }
}

/// Contact details captured at checkout. Everything is optional; a fully
/// empty value is a guest order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,

    /// Loyalty discount in percent (0..=100). Applied to the subtotal when
    /// totals and receipts are computed.
    #[serde(default)]
    pub discount_percent: u8,
}

impl CustomerInfo {
    /// Name to print on receipts; anonymous orders show as "Guest".
    pub fn display_name(&self) -> &str {
        match self.name.as_deref() {
            Some(n) if !n.trim().is_empty() => n,
            _ => "Guest",
        }
    }
}

/// A persisted order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    /// Immutable, unique, human-sortable id (see [`next_order_id`]).
    pub id: String,

    pub items: Vec<LineItem>,

    /// Grand total in whole rupees: subtotal minus discount. Server
    /// computed; never trusted from the client as-is.
    pub total: i64,

    #[serde(default)]
    pub customer: CustomerInfo,

    pub status: OrderStatus,

    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Sum of line totals before discount.
    pub fn subtotal(&self) -> i64 {
        self.items.iter().map(LineItem::line_total).sum()
    }

    /// Discount in rupees: `round(subtotal * percent / 100)`, half away
    /// from zero, matching how clients display it.
    pub fn discount(&self) -> i64 {
        discount_amount(self.subtotal(), self.customer.discount_percent)
    }

    /// Subtotal minus discount. Equal to `total` for orders that passed
    /// creation validation.
    pub fn computed_total(&self) -> i64 {
        self.subtotal() - self.discount()
    }
}

pub fn discount_amount(subtotal: i64, percent: u8) -> i64 {
    // Saturating, never panics; validated orders stay far from the
    // bound (subtotal is capped at MAX_ORDER_TOTAL).
    subtotal
        .saturating_mul(i64::from(percent))
        .saturating_add(50)
        / 100
}

/// Condensed row for admin listings: the columns the dashboard table shows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderSummary {
    pub id: String,
    pub total: i64,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

impl From<&Order> for OrderSummary {
    fn from(order: &Order) -> Self {
        OrderSummary {
            id: order.id.clone(),
            total: order.total,
            status: order.status,
            created_at: order.created_at,
        }
    }
}

// =============================================================================
// Id generation
// =============================================================================

static ORDER_SEQ: AtomicU64 = AtomicU64::new(0);

/// Generate an order id: `ORD-{unix_millis}{seq:04}`.
///
/// The millisecond prefix keeps ids roughly creation-ordered and easy to
/// eyeball; the process-local sequence suffix keeps two orders created in
/// the same millisecond distinct.
pub fn next_order_id(now: DateTime<Utc>) -> String {
    let seq = ORDER_SEQ.fetch_add(1, Ordering::Relaxed) % 10_000;
    format!("ORD-{}{:04}", now.timestamp_millis(), seq)
}

// =============================================================================
// Tests
// =============================================================================
