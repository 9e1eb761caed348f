//! HomeChef API server
//!
//! Wires the HTTP surface to a SQLite-backed order store, with payment
//! gateways and notification transports taken from the environment.
//! Subsystems whose credentials are absent are simply not registered;
//! the server starts either way.

use std::sync::Arc;

use anyhow::{Context, Result};
use homechef::config::AppConfig;
use homechef::notify::{NotificationDispatcher, SmtpEmailer, TwilioSmsSender};
use homechef::orders::OrderService;
use homechef::payments::{EasyPaisaGateway, GatewayRegistry, JazzCashGateway, OfflineGateway};
use homechef::receipt::ReceiptRenderer;
use homechef::server::{self, AppState};
use homechef::store::SqliteOrderStore;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let config = AppConfig::from_env().context("invalid environment configuration")?;

    let store = SqliteOrderStore::open(&config.storage.database_file)
        .await
        .with_context(|| {
            format!(
                "failed to open database {}",
                config.storage.database_file.display()
            )
        })?;
    tracing::info!(
        database = %config.storage.database_file.display(),
        "Order store ready"
    );

    let mut gateways = GatewayRegistry::new();
    if let Some(jazzcash) = config.jazzcash.clone() {
        gateways.register(Arc::new(JazzCashGateway::new(
            jazzcash,
            &config.http.public_url,
        )));
    }
    if let Some(easypaisa) = config.easypaisa.clone() {
        gateways.register(Arc::new(EasyPaisaGateway::new(
            easypaisa,
            &config.http.public_url,
        )));
    }
    // Offline methods need no credentials and are always available.
    gateways.register(Arc::new(OfflineGateway::bank_transfer()));
    gateways.register(Arc::new(OfflineGateway::cash_on_delivery()));
    tracing::info!(
        gateways = %gateways.ids().collect::<Vec<_>>().join(", "),
        "Payment gateways registered"
    );

    let mut notifier = NotificationDispatcher::new(config.branding.clone());
    if let Some(twilio) = config.twilio.clone() {
        notifier = notifier.with_sms(Arc::new(TwilioSmsSender::new(twilio)));
        tracing::info!("SMS notifications enabled");
    }
    if let Some(smtp) = config.smtp.as_ref() {
        notifier = notifier.with_email(Arc::new(SmtpEmailer::new(smtp)?));
        tracing::info!("Email notifications enabled");
    }

    let orders = OrderService::new(
        Arc::new(store),
        gateways,
        ReceiptRenderer::new(config.branding.clone()),
        Arc::new(notifier),
    );

    let addr = format!("0.0.0.0:{}", config.http.port);
    server::serve(
        AppState {
            orders: Arc::new(orders),
        },
        &addr,
    )
    .await
}
