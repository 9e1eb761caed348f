//! EasyPaisa in-app wallet gateway
//!
//! No redirect: the charge request targets the customer's wallet account
//! by phone number and the provider pushes an approval prompt to their
//! app. Approving or rejecting it is entirely between the customer and
//! the provider; the merchant just hears the result on the webhook.

use super::{
    PaymentAction, PaymentCallback, PaymentGateway, PaymentOutcome, PaymentRequest,
    extract_field, signature, to_minor_units, verify_callback_signature,
};
use crate::config::EasyPaisaConfig;
use crate::core::error::{CallbackError, GatewayError};
use crate::core::order::Order;
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;
use std::collections::BTreeMap;

pub const GATEWAY_ID: &str = "easypaisa";

const SIGNATURE_FIELD: &str = "signature";

const SUCCESS_CODES: [&str; 2] = ["0000", "SUCCESS"];

const REF_FIELDS: [&str; 2] = ["orderRefNum", "orderId"];
const STATUS_FIELDS: [&str; 2] = ["responseCode", "status"];

pub struct EasyPaisaGateway {
    config: EasyPaisaConfig,
    post_back_url: String,
}

impl EasyPaisaGateway {
    pub fn new(config: EasyPaisaConfig, public_url: &str) -> Self {
        Self {
            config,
            post_back_url: format!(
                "{}/api/payments/easypaisa/callback",
                public_url.trim_end_matches('/')
            ),
        }
    }
}

impl PaymentGateway for EasyPaisaGateway {
    fn id(&self) -> &'static str {
        GATEWAY_ID
    }

    fn display_name(&self) -> &'static str {
        "EasyPaisa"
    }

    fn build_request(
        &self,
        order: &Order,
        now: DateTime<Utc>,
    ) -> Result<PaymentRequest, GatewayError> {
        // The wallet account *is* the phone number; without one there is
        // nothing to charge.
        let msisdn = order
            .customer
            .phone
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .ok_or_else(|| GatewayError::MissingPhone {
                gateway: GATEWAY_ID.to_string(),
                order_id: order.id.clone(),
            })?
            .to_string();

        let amount_minor = to_minor_units(order.total);

        let mut fields = BTreeMap::new();
        fields.insert("storeId".to_string(), self.config.store_id.clone());
        fields.insert("amount".to_string(), amount_minor.to_string());
        fields.insert("orderRefNum".to_string(), order.id.clone());
        fields.insert("msisdn".to_string(), msisdn.clone());
        fields.insert(
            "timestamp".to_string(),
            now.to_rfc3339_opts(SecondsFormat::Millis, true),
        );
        fields.insert("postBackURL".to_string(), self.post_back_url.clone());

        let canonical = signature::canonical_string(
            fields.iter().map(|(k, v)| (k.as_str(), v.as_str())),
            SIGNATURE_FIELD,
        );
        let sig = signature::sign(
            self.config.signature_scheme,
            &self.config.shared_secret,
            &canonical,
        );

        Ok(PaymentRequest {
            gateway: GATEWAY_ID.to_string(),
            order_id: order.id.clone(),
            amount_minor,
            action: PaymentAction::WalletCharge { msisdn },
            fields,
            signature: Some(sig),
        })
    }

    fn parse_callback(&self, payload: &Value) -> Result<PaymentCallback, CallbackError> {
        let order_id = extract_field(payload, &REF_FIELDS).ok_or_else(|| {
            CallbackError::UnrecognizedPayload {
                gateway: GATEWAY_ID.to_string(),
                reason: "no order reference field".to_string(),
            }
        })?;

        verify_callback_signature(
            GATEWAY_ID,
            payload,
            SIGNATURE_FIELD,
            self.config.signature_scheme,
            &self.config.shared_secret,
            &order_id,
        )?;

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
            reference: extract_field(payload, &["transactionId", "txnId"]),
        })
    }
}
