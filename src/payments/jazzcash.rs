//! JazzCash hosted-checkout gateway
//!
//! The merchant never talks to JazzCash directly at checkout time: the
//! signed fields go back to the client, which submits them as a form POST
//! to the hosted page. Settlement arrives later on the webhook. Field
//! names follow the `pp_*` merchant-form convention, amounts are paisa.

use super::{
    PaymentAction, PaymentCallback, PaymentGateway, PaymentOutcome, PaymentRequest,
    extract_field, signature, to_minor_units, verify_callback_signature,
};
use crate::config::JazzCashConfig;
use crate::core::error::{CallbackError, GatewayError};
use crate::core::order::Order;
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;
use std::collections::BTreeMap;

pub const GATEWAY_ID: &str = "jazzcash";

/// Hosted sandbox checkout page the signed form posts to.
const HOSTED_URL: &str =
    "https://sandbox.jazzcash.com.pk/CustomerPortal/merchant/merTransId";

/// Signature field on outbound fields and callbacks alike.
const SIGNATURE_FIELD: &str = "pp_SecureHash";

/// Response codes that mean the transaction settled.
const SUCCESS_CODES: [&str; 3] = ["000", "00", "SUCCESS"];

/// Names callbacks have used for the order reference, newest convention
/// first.
const REF_FIELDS: [&str; 3] = ["pp_TxnRefNo", "orderId", "txnRef"];
const STATUS_FIELDS: [&str; 3] = ["pp_ResponseCode", "responseCode", "status"];

pub struct JazzCashGateway {
    config: JazzCashConfig,
    return_url: String,
}

impl JazzCashGateway {
    pub fn new(config: JazzCashConfig, public_url: &str) -> Self {
        Self {
            config,
            return_url: format!(
                "{}/api/payments/jazzcash/return",
                public_url.trim_end_matches('/')
            ),
        }
    }
}

impl PaymentGateway for JazzCashGateway {
    fn id(&self) -> &'static str {
        GATEWAY_ID
    }

    fn display_name(&self) -> &'static str {
        "JazzCash"
    }

    fn build_request(
        &self,
        order: &Order,
        now: DateTime<Utc>,
    ) -> Result<PaymentRequest, GatewayError> {
        let amount_minor = to_minor_units(order.total);

        let mut fields = BTreeMap::new();
        fields.insert("pp_MerchantID".to_string(), self.config.merchant_id.clone());
        fields.insert("pp_Password".to_string(), self.config.password.clone());
        fields.insert("pp_Amount".to_string(), amount_minor.to_string());
        fields.insert("pp_TxnCurrency".to_string(), "PKR".to_string());
        fields.insert("pp_TxnRefNo".to_string(), order.id.clone());
        fields.insert(
            "pp_TxnDateTime".to_string(),
            now.to_rfc3339_opts(SecondsFormat::Millis, true),
        );
        fields.insert("pp_BillReference".to_string(), "billRef".to_string());
        fields.insert(
            "pp_Description".to_string(),
            format!("Payment for {}", order.id),
        );
        fields.insert("pp_ReturnURL".to_string(), self.return_url.clone());

        let canonical = signature::canonical_string(
            fields.iter().map(|(k, v)| (k.as_str(), v.as_str())),
            SIGNATURE_FIELD,
        );
        let sig = signature::sign(
            self.config.signature_scheme,
            &self.config.integrity_salt,
            &canonical,
        );

        Ok(PaymentRequest {
            gateway: GATEWAY_ID.to_string(),
            order_id: order.id.clone(),
            amount_minor,
            action: PaymentAction::HostedRedirect {
                url: HOSTED_URL.to_string(),
            },
            fields,
            signature: Some(sig),
        })
    }

    fn parse_callback(&self, payload: &Value) -> Result<PaymentCallback, CallbackError> {
        let order_id = extract_field(payload, &REF_FIELDS).ok_or_else(|| {
            CallbackError::UnrecognizedPayload {
                gateway: GATEWAY_ID.to_string(),
                reason: "no transaction reference field".to_string(),
            }
        })?;

        verify_callback_signature(
            GATEWAY_ID,
            payload,
            SIGNATURE_FIELD,
            self.config.signature_scheme,
            &self.config.integrity_salt,
            &order_id,
        )?;

        // Anything outside the success set is a failure; a missing status
        // field fails too rather than leaving the order dangling.
        let status_code = extract_field(payload, &STATUS_FIELDS).unwrap_or_default();
        let outcome = if SUCCESS_CODES.contains(&status_code.as_str()) {
            PaymentOutcome::Paid
        } else {
            PaymentOutcome::Failed
        };

        Ok(PaymentCallback {
            gateway: GATEWAY_ID.to_string(),
            order_id,
            outcome,
            status_code,
            reference: extract_field(payload, &["pp_RetreivalReferenceNo", "pp_AuthCode"]),
        })
    }
}
