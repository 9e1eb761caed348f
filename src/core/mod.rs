//! Core module containing the order domain model and error types

pub mod error;
pub mod order;

pub use error::{
    AppError, AppResult, CallbackError, ConfigError, ErrorResponse, GatewayError, OrderError,
};
pub use order::{CustomerInfo, LineItem, Order, OrderStatus, OrderSummary};
