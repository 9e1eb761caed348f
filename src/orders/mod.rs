//! Order lifecycle: request types and the orchestrating service.

pub mod service;

pub use service::OrderService;

use crate::core::order::{CustomerInfo, LineItem};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use validator::{Validate, ValidationError};

/// Body of `POST /api/orders`.
///
/// `total` is what the client showed the customer. The service recomputes
/// the grand total from items + discount and rejects the request when the
/// two disagree by more than the rounding tolerance; the stored order
/// always carries the server-computed value.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateOrderRequest {
    #[validate(length(min = 1, message = "order must contain at least one item"))]
    pub items: Vec<LineItem>,

    pub total: i64,

    #[serde(default)]
    #[validate(nested)]
    pub customer: CustomerRequest,
}

/// Customer block of a create-order request. All fields optional; blank
/// strings count as absent, matching what the checkout form sends.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct CustomerRequest {
    #[serde(default, deserialize_with = "empty_as_none")]
    pub name: Option<String>,

    #[serde(default, deserialize_with = "empty_as_none")]
    #[validate(email(message = "invalid email address"))]
    pub email: Option<String>,

    #[serde(default, deserialize_with = "empty_as_none")]
    #[validate(custom(function = validate_phone))]
    pub phone: Option<String>,

    #[serde(default)]
    #[validate(range(max = 100, message = "discount percent cannot exceed 100"))]
    pub discount_percent: u8,
}

impl CustomerRequest {
    pub fn into_info(self) -> CustomerInfo {
        CustomerInfo {
            name: self.name,
            email: self.email,
            phone: self.phone,
            discount_percent: self.discount_percent,
        }
    }
}

/// Body of `POST /api/payments/{gateway}/checkout`.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutRequest {
    #[serde(rename = "orderId")]
    pub order_id: String,
}

/// Response for gateway callbacks. Always `{ "ok": true }`: providers
/// retry on anything else, and a payload we cannot apply will not become
/// applicable by being redelivered.
#[derive(Debug, Clone, Serialize)]
pub struct CallbackAck {
    pub ok: bool,
}

impl CallbackAck {
    pub fn acknowledged() -> Self {
        Self { ok: true }
    }
}

fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.trim().is_empty()))
}

fn validate_phone(phone: &str) -> Result<(), ValidationError> {
    static PHONE_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = PHONE_REGEX.get_or_init(|| {
        // At least 8 digits, max 15 (E.164 standard)
        Regex::new(r"^\+?[1-9]\d{7,14}$").unwrap()
    });
    if regex.is_match(phone) {
        Ok(())
    } else {
        let mut err = ValidationError::new("phone");
        err.message = Some("must be a valid phone number".into());
        Err(err)
    }
}
