//! Payment gateway adapters
//!
//! One trait, several personalities. A gateway does exactly two things:
//! build the signed outbound request for an order, and parse/verify the
//! inbound settlement callback. Everything stateful (applying the status,
//! notifications) stays in the lifecycle service; adapters are pure
//! functions over orders and payloads.
//!
//! Wallet gateways ([`JazzCashGateway`], [`EasyPaisaGateway`]) sign their
//! fields and consume webhooks. Offline methods ([`OfflineGateway`]) share
//! the trait but skip the round trip entirely: their built request is a
//! block of instructions and they never receive callbacks.

pub mod easypaisa;
pub mod jazzcash;
pub mod offline;
pub mod signature;

pub use easypaisa::EasyPaisaGateway;
pub use jazzcash::JazzCashGateway;
pub use offline::OfflineGateway;
pub use signature::SignatureScheme;

use crate::core::error::{CallbackError, GatewayError};
use crate::core::order::Order;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Rupees to paisa. Wallet providers bill in minor units.
///
/// Saturating: order totals are capped at creation
/// ([`crate::core::order::MAX_ORDER_TOTAL`]), far below where the
/// product could leave `i64`.
pub fn to_minor_units(rupees: i64) -> i64 {
    rupees.saturating_mul(100)
}

/// Every gateway id this crate ships an adapter for, configured or not.
pub const KNOWN_GATEWAY_IDS: [&str; 4] = [
    jazzcash::GATEWAY_ID,
    easypaisa::GATEWAY_ID,
    offline::BANK_TRANSFER_ID,
    offline::CASH_ON_DELIVERY_ID,
];

// =============================================================================
// Request / callback types
// =============================================================================

/// What the client should do with a built payment request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PaymentAction {
    /// Submit the signed fields as a form POST to the hosted checkout page.
    HostedRedirect { url: String },

    /// The gateway charges the customer's wallet directly; the customer
    /// confirms on their phone.
    WalletCharge { msisdn: String },

    /// No gateway involved; show these instructions to the customer.
    Instructions { text: String },
}

/// An outbound payment request, ready for the client to act on.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentRequest {
    /// Id of the gateway that built this request.
    pub gateway: String,

    /// Correlation key echoed back by callbacks.
    pub order_id: String,

    /// Amount in minor units (paisa).
    pub amount_minor: i64,

    pub action: PaymentAction,

    /// Gateway fields, key-sorted. The canonical signing string is built
    /// from exactly these pairs, so the map order is the signing order.
    pub fields: BTreeMap<String, String>,

    /// Signature over the canonical field string, when the gateway's
    /// scheme defines one. Offline methods carry none.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
}

/// Settlement outcome a callback maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentOutcome {
    Paid,
    Failed,
}

/// A parsed, signature-checked inbound callback.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentCallback {
    pub gateway: String,
    pub order_id: String,
    pub outcome: PaymentOutcome,

    /// Raw status code as the gateway sent it. Kept for logs; empty when
    /// the payload had no status field at all (mapped to `Failed`).
    pub status_code: String,

    /// Provider-side transaction reference, when present.
    pub reference: Option<String>,
}

// =============================================================================
// Gateway trait & registry
// =============================================================================

/// A payment gateway personality.
pub trait PaymentGateway: Send + Sync {
    /// Stable id used in routes and configuration ("jazzcash").
    fn id(&self) -> &'static str;

    /// Human-facing name for logs and instructions.
    fn display_name(&self) -> &'static str;

    /// Build the outbound request for an order. `now` is threaded in so
    /// builds are reproducible under test.
    fn build_request(
        &self,
        order: &Order,
        now: DateTime<Utc>,
    ) -> Result<PaymentRequest, GatewayError>;

    /// Parse and verify an inbound callback payload.
    fn parse_callback(&self, payload: &Value) -> Result<PaymentCallback, CallbackError>;
}

/// Configured gateways by id, iteration in registration order.
///
/// Only gateways whose credentials exist get registered; looking up an
/// absent id is how the service discovers a gateway is unavailable.
#[derive(Clone, Default)]
pub struct GatewayRegistry {
    gateways: IndexMap<&'static str, Arc<dyn PaymentGateway>>,
}

impl GatewayRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, gateway: Arc<dyn PaymentGateway>) {
        self.gateways.insert(gateway.id(), gateway);
    }

    pub fn get(&self, id: &str) -> Option<Arc<dyn PaymentGateway>> {
        self.gateways.get(id).cloned()
    }

    /// Like [`get`](Self::get), but classifies the miss: an id this crate
    /// ships an adapter for that was never registered (no credentials) is
    /// `NotConfigured`, anything else is `Unknown`.
    pub fn lookup(&self, id: &str) -> Result<Arc<dyn PaymentGateway>, GatewayError> {
        self.get(id).ok_or_else(|| {
            if KNOWN_GATEWAY_IDS.contains(&id) {
                GatewayError::NotConfigured {
                    gateway: id.to_string(),
                }
            } else {
                GatewayError::Unknown {
                    gateway: id.to_string(),
                }
            }
        })
    }

    pub fn ids(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.gateways.keys().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.gateways.is_empty()
    }

    pub fn len(&self) -> usize {
        self.gateways.len()
    }
}

// =============================================================================
// Callback payload helpers
// =============================================================================

/// Pull one field out of a callback payload, trying several historical
/// names in order. Numbers and booleans are stringified; containers and
/// nulls do not count as present.
pub(crate) fn extract_field(payload: &Value, names: &[&str]) -> Option<String> {
    let object = payload.as_object()?;
    for name in names {
        match object.get(*name) {
            Some(Value::String(s)) => return Some(s.clone()),
            Some(Value::Number(n)) => return Some(n.to_string()),
            Some(Value::Bool(b)) => return Some(b.to_string()),
            _ => continue,
        }
    }
    None
}

/// Flatten a payload's scalar fields into (name, value) pairs for
/// canonicalization. Nested values are skipped; gateways only sign flat
/// form fields.
pub(crate) fn scalar_fields(payload: &Value) -> Vec<(String, String)> {
    let Some(object) = payload.as_object() else {
        return Vec::new();
    };
    object
        .iter()
        .filter_map(|(key, value)| match value {
            Value::String(s) => Some((key.clone(), s.clone())),
            Value::Number(n) => Some((key.clone(), n.to_string())),
            Value::Bool(b) => Some((key.clone(), b.to_string())),
            _ => None,
        })
        .collect()
}

/// Shared callback signature check: recompute over the payload's scalar
/// fields (minus the signature field) and compare with the supplied value.
/// A missing signature field counts as a mismatch; the payload cannot be
/// trusted either way.
pub(crate) fn verify_callback_signature(
    gateway: &str,
    payload: &Value,
    signature_field: &str,
    scheme: SignatureScheme,
    secret: &str,
    order_id: &str,
) -> Result<(), CallbackError> {
    let fields = scalar_fields(payload);
    let canonical = signature::canonical_string(
        fields.iter().map(|(k, v)| (k.as_str(), v.as_str())),
        signature_field,
    );

    let mismatch = || CallbackError::SignatureMismatch {
        gateway: gateway.to_string(),
        order_id: order_id.to_string(),
    };

    match extract_field(payload, &[signature_field]) {
        Some(supplied) if signature::verify(scheme, secret, &canonical, &supplied) => Ok(()),
        _ => Err(mismatch()),
    }
}
