//! Typed error handling for the ordering backend
//!
//! One hierarchy, one HTTP mapping. Handlers return [`AppError`] and the
//! `IntoResponse` impl turns every variant into a JSON body with a stable
//! machine code, so clients match on `code` instead of parsing messages.
//!
//! # Error Categories
//!
//! - [`OrderError`]: Rejected order input (empty cart, bad totals)
//! - [`crate::store::StoreError`]: Storage outcomes (not found, duplicate
//!   id, illegal status transition, I/O)
//! - [`GatewayError`]: Payment checkout problems (unknown or unconfigured
//!   gateway, missing wallet phone)
//! - [`CallbackError`]: Inbound callback payloads that cannot be trusted.
//!   These are *acknowledged* to the gateway and logged, never applied;
//!   they only reach HTTP status mapping if a caller surfaces them.
//! - [`ConfigError`]: Environment configuration problems at startup

use crate::store::StoreError;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use std::fmt;

use crate::core::order::OrderStatus;

/// The main error type for the ordering backend.
#[derive(Debug)]
pub enum AppError {
    /// Rejected order input
    Order(OrderError),

    /// Storage outcomes
    Store(StoreError),

    /// Payment checkout errors
    Gateway(GatewayError),

    /// Untrusted inbound callback payloads
    Callback(CallbackError),

    /// Configuration errors
    Config(ConfigError),

    /// Internal errors (should not happen in normal operation)
    Internal(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Order(e) => write!(f, "{}", e),
            AppError::Store(e) => write!(f, "{}", e),
            AppError::Gateway(e) => write!(f, "{}", e),
            AppError::Callback(e) => write!(f, "{}", e),
            AppError::Config(e) => write!(f, "{}", e),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Order(e) => Some(e),
            AppError::Store(e) => Some(e),
            AppError::Gateway(e) => Some(e),
            AppError::Callback(e) => Some(e),
            AppError::Config(e) => Some(e),
            AppError::Internal(_) => None,
        }
    }
}

/// Error response structure for HTTP responses
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Optional additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl AppError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Order(_) => StatusCode::BAD_REQUEST,
            AppError::Store(e) => match e {
                StoreError::NotFound { .. } => StatusCode::NOT_FOUND,
                StoreError::DuplicateId { .. } => StatusCode::CONFLICT,
                StoreError::InvalidTransition { .. } => StatusCode::CONFLICT,
                StoreError::Corrupt { .. } => StatusCode::INTERNAL_SERVER_ERROR,
                StoreError::Io { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            },
            AppError::Gateway(e) => e.status_code(),
            AppError::Callback(_) => StatusCode::BAD_REQUEST,
            AppError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::Order(e) => e.error_code(),
            AppError::Store(e) => match e {
                StoreError::NotFound { .. } => "ORDER_NOT_FOUND",
                StoreError::DuplicateId { .. } => "DUPLICATE_ORDER_ID",
                StoreError::InvalidTransition { .. } => "INVALID_TRANSITION",
                StoreError::Corrupt { .. } => "STORAGE_CORRUPT",
                StoreError::Io { .. } => "STORAGE_ERROR",
            },
            AppError::Gateway(e) => e.error_code(),
            AppError::Callback(e) => e.error_code(),
            AppError::Config(_) => "CONFIG_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Convert to an error response
    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            code: self.error_code().to_string(),
            message: self.to_string(),
            details: self.details(),
        }
    }

    /// Get additional details for the error
    fn details(&self) -> Option<serde_json::Value> {
        match self {
            AppError::Order(OrderError::TotalMismatch { declared, computed }) => {
                Some(serde_json::json!({
                    "declared": declared,
                    "computed": computed,
                }))
            }
            AppError::Store(StoreError::InvalidTransition { id, from, to }) => {
                Some(serde_json::json!({
                    "order_id": id,
                    "from": from.as_str(),
                    "to": to.as_str(),
                }))
            }
            AppError::Gateway(GatewayError::OrderNotPending { order_id, status }) => {
                Some(serde_json::json!({
                    "order_id": order_id,
                    "status": status.as_str(),
                }))
            }
            _ => None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(self.to_response());
        (status, body).into_response()
    }
}

// =============================================================================
// Order Errors
// =============================================================================

/// Rejected order input. Everything here maps to a 400.
#[derive(Debug)]
pub enum OrderError {
    /// Order arrived with no line items
    NoItems,

    /// A line item has quantity zero
    BadQuantity {
        item: String,
    },

    /// A line item has a non-positive unit price
    BadPrice {
        item: String,
        price: i64,
    },

    /// Caller-declared total disagrees with the computed one beyond the
    /// rounding tolerance
    TotalMismatch {
        declared: i64,
        computed: i64,
    },

    /// Computed total would exceed the largest amount the payment flows
    /// can carry
    TotalTooLarge {
        max: i64,
    },

    /// DTO-level validation failed (formats, lengths)
    ValidationFailed {
        message: String,
    },
}

impl fmt::Display for OrderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderError::NoItems => {
                write!(f, "Order must contain at least one item")
            }
            OrderError::BadQuantity { item } => {
                write!(f, "Item '{}' must have quantity of at least 1", item)
            }
            OrderError::BadPrice { item, price } => {
                write!(f, "Item '{}' has invalid unit price {}", item, price)
            }
            OrderError::TotalMismatch { declared, computed } => {
                write!(
                    f,
                    "Declared total {} does not match computed total {}",
                    declared, computed
                )
            }
            OrderError::TotalTooLarge { max } => {
                write!(f, "Order total exceeds the maximum of Rs {}", max)
            }
            OrderError::ValidationFailed { message } => {
                write!(f, "Invalid order: {}", message)
            }
        }
    }
}

impl std::error::Error for OrderError {}

impl OrderError {
    pub fn error_code(&self) -> &'static str {
        match self {
            OrderError::NoItems => "ORDER_NO_ITEMS",
            OrderError::BadQuantity { .. } => "ORDER_BAD_QUANTITY",
            OrderError::BadPrice { .. } => "ORDER_BAD_PRICE",
            OrderError::TotalMismatch { .. } => "ORDER_TOTAL_MISMATCH",
            OrderError::TotalTooLarge { .. } => "ORDER_TOTAL_TOO_LARGE",
            OrderError::ValidationFailed { .. } => "ORDER_VALIDATION_FAILED",
        }
    }
}

impl From<OrderError> for AppError {
    fn from(err: OrderError) -> Self {
        AppError::Order(err)
    }
}

// =============================================================================
// Gateway Errors
// =============================================================================

/// Errors raised while preparing a payment checkout.
#[derive(Debug)]
pub enum GatewayError {
    /// No gateway registered under this id
    Unknown {
        gateway: String,
    },

    /// Gateway exists but its credentials are not configured
    NotConfigured {
        gateway: String,
    },

    /// In-app wallet charge requires a customer phone number
    MissingPhone {
        gateway: String,
        order_id: String,
    },

    /// Checkout requested for an order that already settled
    OrderNotPending {
        order_id: String,
        status: OrderStatus,
    },
}

impl fmt::Display for GatewayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GatewayError::Unknown { gateway } => {
                write!(f, "Unknown payment gateway '{}'", gateway)
            }
            GatewayError::NotConfigured { gateway } => {
                write!(f, "Payment gateway '{}' is not configured", gateway)
            }
            GatewayError::MissingPhone { gateway, order_id } => {
                write!(
                    f,
                    "Gateway '{}' needs a customer phone number for order '{}'",
                    gateway, order_id
                )
            }
            GatewayError::OrderNotPending { order_id, status } => {
                write!(
                    f,
                    "Order '{}' is already {} and cannot start a checkout",
                    order_id, status
                )
            }
        }
    }
}

impl std::error::Error for GatewayError {}

impl GatewayError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            GatewayError::Unknown { .. } => StatusCode::NOT_FOUND,
            GatewayError::NotConfigured { .. } => StatusCode::SERVICE_UNAVAILABLE,
            GatewayError::MissingPhone { .. } => StatusCode::BAD_REQUEST,
            GatewayError::OrderNotPending { .. } => StatusCode::CONFLICT,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            GatewayError::Unknown { .. } => "UNKNOWN_GATEWAY",
            GatewayError::NotConfigured { .. } => "GATEWAY_NOT_CONFIGURED",
            GatewayError::MissingPhone { .. } => "WALLET_PHONE_REQUIRED",
            GatewayError::OrderNotPending { .. } => "ORDER_NOT_PENDING",
        }
    }
}

impl From<GatewayError> for AppError {
    fn from(err: GatewayError) -> Self {
        AppError::Gateway(err)
    }
}

// =============================================================================
// Callback Errors
// =============================================================================

/// Inbound callback payloads that cannot be applied.
///
/// The callback route acknowledges these with a 2xx so the gateway stops
/// redelivering, logs them with an event id for manual reconciliation, and
/// leaves the order store untouched.
#[derive(Debug)]
pub enum CallbackError {
    /// No order correlation id could be extracted from the payload
    UnrecognizedPayload {
        gateway: String,
        reason: String,
    },

    /// Supplied integrity signature disagrees with the recomputed one
    SignatureMismatch {
        gateway: String,
        order_id: String,
    },
}

impl fmt::Display for CallbackError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallbackError::UnrecognizedPayload { gateway, reason } => {
                write!(f, "Unrecognized callback from '{}': {}", gateway, reason)
            }
            CallbackError::SignatureMismatch { gateway, order_id } => {
                write!(
                    f,
                    "Signature mismatch on callback from '{}' for order '{}'",
                    gateway, order_id
                )
            }
        }
    }
}

impl std::error::Error for CallbackError {}

impl CallbackError {
    pub fn error_code(&self) -> &'static str {
        match self {
            CallbackError::UnrecognizedPayload { .. } => "UNRECOGNIZED_PAYLOAD",
            CallbackError::SignatureMismatch { .. } => "SIGNATURE_MISMATCH",
        }
    }
}

impl From<CallbackError> for AppError {
    fn from(err: CallbackError) -> Self {
        AppError::Callback(err)
    }
}

// =============================================================================
// Config Errors
// =============================================================================

/// Errors related to environment configuration.
///
/// Optional subsystems (gateways, SMS, email) never produce these when
/// absent; they only fire for values that are present but unusable.
#[derive(Debug)]
pub enum ConfigError {
    /// Invalid value in an environment variable
    InvalidValue {
        var: String,
        value: String,
        message: String,
    },

    /// A variable is set but its required companion is missing
    MissingCompanion {
        present: String,
        missing: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidValue {
                var,
                value,
                message,
            } => {
                write!(f, "Invalid value '{}' for {}: {}", value, var, message)
            }
            ConfigError::MissingCompanion { present, missing } => {
                write!(f, "{} is set but {} is missing", present, missing)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<ConfigError> for AppError {
    fn from(err: ConfigError) -> Self {
        AppError::Config(err)
    }
}

// =============================================================================
// Conversions from external errors
// =============================================================================

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        AppError::Store(err)
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::Order(OrderError::ValidationFailed {
            message: err.to_string(),
        })
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

// =============================================================================
// Result type alias
// =============================================================================

/// A specialized Result type for ordering-backend operations
pub type AppResult<T> = Result<T, AppError>;

// =============================================================================
// Tests
// =============================================================================
