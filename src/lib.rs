//! # HomeChef Backend
//!
//! The ordering backend for a home-kitchen restaurant: order intake with
//! server-side total verification, wallet and offline payment flows with
//! signed gateway callbacks, deterministic PDF receipts, and SMS/email
//! confirmations on successful payment.
//!
//! ## Features
//!
//! - **Order Lifecycle**: `pending -> paid | failed`, with terminal states
//!   enforced by the store so racing callbacks settle an order exactly once
//! - **Total Verification**: client-declared totals are recomputed server-side
//!   and rejected on mismatch beyond a one-rupee rounding tolerance
//! - **Payment Gateways**: JazzCash and EasyPaisa wallet flows plus offline
//!   methods (bank transfer, cash on delivery) behind one trait
//! - **Signed Callbacks**: provider webhooks are verified against the shared
//!   secret before they can settle anything
//! - **PDF Receipts**: deterministic rendering with embedded core-font metrics,
//!   byte-identical for the same order
//! - **Notifications**: fire-and-forget SMS (Twilio) and email (SMTP), never
//!   blocking the payment path
//! - **Two Stores**: in-memory for tests and development, SQLite for the
//!   real table
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use homechef::prelude::*;
//!
//! let store = Arc::new(InMemoryOrderStore::new());
//! let mut gateways = GatewayRegistry::new();
//! gateways.register(Arc::new(OfflineGateway::cash_on_delivery()));
//!
//! let orders = Arc::new(OrderService::new(
//!     store,
//!     gateways,
//!     ReceiptRenderer::new(BrandingConfig::default()),
//!     Arc::new(NotificationDispatcher::new(BrandingConfig::default())),
//! ));
//!
//! homechef::server::serve(AppState { orders }, "127.0.0.1:3000").await?;
//! ```

pub mod cart;
pub mod config;
pub mod core;
pub mod notify;
pub mod orders;
pub mod payments;
pub mod receipt;
pub mod server;
pub mod store;

/// Re-exports of commonly used types and traits
pub mod prelude {
    // === Core Types ===
    pub use crate::core::{
        error::{
            AppError, AppResult, CallbackError, ConfigError, ErrorResponse, GatewayError,
            OrderError,
        },
        order::{CustomerInfo, LineItem, Order, OrderStatus, OrderSummary},
    };

    // === Orders ===
    pub use crate::orders::{
        CallbackAck, CheckoutRequest, CreateOrderRequest, CustomerRequest, OrderService,
    };

    // === Payments ===
    pub use crate::payments::{
        EasyPaisaGateway, GatewayRegistry, JazzCashGateway, OfflineGateway, PaymentAction,
        PaymentCallback, PaymentGateway, PaymentOutcome, PaymentRequest, SignatureScheme,
    };

    // === Receipts & Notifications ===
    pub use crate::notify::{
        EmailSender, NotificationDispatcher, SmsSender, SmtpEmailer, TwilioSmsSender,
    };
    pub use crate::receipt::ReceiptRenderer;

    // === Cart ===
    pub use crate::cart::{Cart, CustomerProfile};

    // === Storage ===
    #[cfg(feature = "sqlite")]
    pub use crate::store::SqliteOrderStore;
    pub use crate::store::{InMemoryOrderStore, OrderStore, StoreError};

    // === Config ===
    pub use crate::config::{AppConfig, BrandingConfig};

    // === Server ===
    pub use crate::server::{AppState, build_router};

    // === External dependencies ===
    pub use anyhow::Result;
    pub use async_trait::async_trait;
    pub use chrono::{DateTime, Utc};
    pub use serde::{Deserialize, Serialize};
    pub use uuid::Uuid;
}
