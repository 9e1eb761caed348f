//! Order confirmation notifications
//!
//! Best-effort SMS + email after a payment settles. Both transports sit
//! behind traits so the dispatcher can be wired with real providers in
//! the binary and with recorders in tests. Nothing here is allowed to
//! fail an order: missing transports and missing contact details are
//! skips, send errors are logged and swallowed.

pub mod email;
pub mod sms;

pub use email::SmtpEmailer;
pub use sms::TwilioSmsSender;

use crate::config::BrandingConfig;
use crate::core::order::Order;
use async_trait::async_trait;
use indexmap::IndexSet;
use std::sync::{Arc, Mutex, PoisonError};

/// How many handled order ids the dispatcher remembers. Past this the
/// oldest entry is dropped; gateways replay callbacks within minutes,
/// not thousands of orders later.
const NOTIFIED_CAPACITY: usize = 4096;

/// Outbound SMS transport.
#[async_trait]
pub trait SmsSender: Send + Sync {
    async fn send(&self, to: &str, body: &str) -> anyhow::Result<()>;
}

/// Outbound email transport.
#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(&self, to: &str, subject: &str, body: &str) -> anyhow::Result<()>;
}

/// Sends the confirmation messages for a paid order.
///
/// Gateways are allowed to replay settlement callbacks, so the dispatcher
/// keeps a bounded per-process set of order ids it has already handled
/// (most recent [`NOTIFIED_CAPACITY`]) and sends at most one SMS and one
/// email per order.
pub struct NotificationDispatcher {
    branding: BrandingConfig,
    sms: Option<Arc<dyn SmsSender>>,
    email: Option<Arc<dyn EmailSender>>,
    notified: Mutex<IndexSet<String>>,
}

impl NotificationDispatcher {
    pub fn new(branding: BrandingConfig) -> Self {
        Self {
            branding,
            sms: None,
            email: None,
            notified: Mutex::new(IndexSet::new()),
        }
    }

    pub fn with_sms(mut self, sender: Arc<dyn SmsSender>) -> Self {
        self.sms = Some(sender);
        self
    }

    pub fn with_email(mut self, sender: Arc<dyn EmailSender>) -> Self {
        self.email = Some(sender);
        self
    }

    /// Send the confirmation SMS and email for `order`, concurrently and
    /// best-effort. Safe to call repeatedly; only the first call for a
    /// given order id sends anything.
    pub async fn notify_paid(&self, order: &Order) {
        {
            // A poisoned guard only risks a duplicate message, so recover
            // the set instead of propagating.
            let mut sent = self
                .notified
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            if !sent.insert(order.id.clone()) {
                tracing::debug!(order_id = %order.id, "Notifications already sent, skipping");
                return;
            }
            if sent.len() > NOTIFIED_CAPACITY {
                sent.shift_remove_index(0);
            }
        }

        futures::future::join(self.send_sms(order), self.send_email(order)).await;
    }

    async fn send_sms(&self, order: &Order) {
        let Some(sender) = &self.sms else {
            tracing::debug!(order_id = %order.id, "SMS transport not configured, skipping");
            return;
        };
        let Some(phone) = order
            .customer
            .phone
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
        else {
            tracing::debug!(order_id = %order.id, "No customer phone, skipping SMS");
            return;
        };

        let body = format!(
            "Your order {} is confirmed. Total: Rs {}. Thank you!",
            order.id, order.total
        );
        match sender.send(phone, &body).await {
            Ok(()) => tracing::info!(order_id = %order.id, "Confirmation SMS sent"),
            Err(e) => {
                tracing::warn!(order_id = %order.id, error = %e, "Failed to send confirmation SMS")
            }
        }
    }

    async fn send_email(&self, order: &Order) {
        let Some(sender) = &self.email else {
            tracing::debug!(order_id = %order.id, "Email transport not configured, skipping");
            return;
        };
        let Some(address) = order
            .customer
            .email
            .as_deref()
            .map(str::trim)
            .filter(|a| !a.is_empty())
        else {
            tracing::debug!(order_id = %order.id, "No customer email, skipping email");
            return;
        };

        let name = order
            .customer
            .name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or("Customer");
        let subject = format!("Order Confirmed — {}", order.id);
        let body = format!(
            "Dear {},\n\nYour order {} has been confirmed. Total: Rs {}.\n\nThank you,\n{}",
            name, order.id, order.total, self.branding.name
        );
        match sender.send(address, &subject, &body).await {
            Ok(()) => tracing::info!(order_id = %order.id, "Confirmation email sent"),
            Err(e) => {
                tracing::warn!(order_id = %order.id, error = %e, "Failed to send confirmation email")
            }
        }
    }
}
