//! Offline payment methods (bank transfer, cash on delivery)
//!
//! These skip the provider round-trip entirely: `build_request` hands the
//! customer printable instructions and the order stays `pending` until an
//! admin confirms receipt out of band. No provider ever calls back, so
//! `parse_callback` rejects every payload.

use super::{PaymentAction, PaymentCallback, PaymentGateway, PaymentRequest, to_minor_units};
use crate::core::error::{CallbackError, GatewayError};
use crate::core::order::Order;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::BTreeMap;

pub const BANK_TRANSFER_ID: &str = "banktransfer";
pub const CASH_ON_DELIVERY_ID: &str = "cod";

const BANK_ACCOUNT: &str = "Meezan Bank, account 0101-2345678-9 (Fatima's Kitchen)";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OfflineKind {
    BankTransfer,
    CashOnDelivery,
}

pub struct OfflineGateway {
    kind: OfflineKind,
}

impl OfflineGateway {
    pub fn bank_transfer() -> Self {
        Self {
            kind: OfflineKind::BankTransfer,
        }
    }

    pub fn cash_on_delivery() -> Self {
        Self {
            kind: OfflineKind::CashOnDelivery,
        }
    }

    fn instructions(&self, order: &Order) -> String {
        match self.kind {
            OfflineKind::BankTransfer => format!(
                "Transfer Rs {} to {} and share the deposit slip with us. \
                 We will confirm your order once the transfer clears.",
                order.total, BANK_ACCOUNT
            ),
            OfflineKind::CashOnDelivery => format!(
                "Please keep Rs {} ready in cash and pay the rider on delivery.",
                order.total
            ),
        }
    }
}

impl PaymentGateway for OfflineGateway {
    fn id(&self) -> &'static str {
        match self.kind {
            OfflineKind::BankTransfer => BANK_TRANSFER_ID,
            OfflineKind::CashOnDelivery => CASH_ON_DELIVERY_ID,
        }
    }

    fn display_name(&self) -> &'static str {
        match self.kind {
            OfflineKind::BankTransfer => "Bank Transfer",
            OfflineKind::CashOnDelivery => "Cash on Delivery",
        }
    }

    fn build_request(
        &self,
        order: &Order,
        _now: DateTime<Utc>,
    ) -> Result<PaymentRequest, GatewayError> {
        let mut fields = BTreeMap::new();
        fields.insert("method".to_string(), self.id().to_string());
        fields.insert("orderId".to_string(), order.id.clone());
        fields.insert("amount".to_string(), order.total.to_string());

        Ok(PaymentRequest {
            gateway: self.id().to_string(),
            order_id: order.id.clone(),
            amount_minor: to_minor_units(order.total),
            action: PaymentAction::Instructions {
                text: self.instructions(order),
            },
            fields,
            signature: None,
        })
    }

    fn parse_callback(&self, _payload: &Value) -> Result<PaymentCallback, CallbackError> {
        Err(CallbackError::UnrecognizedPayload {
            gateway: self.id().to_string(),
            reason: "offline method has no provider callbacks".to_string(),
        })
    }
}
