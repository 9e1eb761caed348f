//! The order lifecycle service.
//!
//! Owns every order state change: creation (with total cross-checking),
//! checkout dispatch to the configured gateways, settlement callbacks,
//! receipt rendering and the admin listing. Handlers stay thin; anything
//! that touches more than one subsystem happens here.

use super::{CallbackAck, CreateOrderRequest};
use crate::core::error::{AppError, AppResult, CallbackError, GatewayError, OrderError};
use crate::core::order::{
    MAX_ORDER_TOTAL, Order, OrderStatus, OrderSummary, TOTAL_TOLERANCE, discount_amount,
    next_order_id,
};
use crate::notify::NotificationDispatcher;
use crate::payments::{GatewayRegistry, PaymentAction, PaymentOutcome, PaymentRequest};
use crate::receipt::ReceiptRenderer;
use crate::store::{DEFAULT_LIST_LIMIT, OrderStore, StoreError};
use chrono::Utc;
use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

pub struct OrderService {
    store: Arc<dyn OrderStore>,
    gateways: GatewayRegistry,
    receipts: ReceiptRenderer,
    notifier: Arc<NotificationDispatcher>,
}

impl OrderService {
    pub fn new(
        store: Arc<dyn OrderStore>,
        gateways: GatewayRegistry,
        receipts: ReceiptRenderer,
        notifier: Arc<NotificationDispatcher>,
    ) -> Self {
        Self {
            store,
            gateways,
            receipts,
            notifier,
        }
    }

    /// Validate and persist a new order in `pending` state.
    ///
    /// The client's declared total is only accepted when it agrees with
    /// the recomputed subtotal-minus-discount within [`TOTAL_TOLERANCE`];
    /// the stored order always carries the server-computed total.
    pub async fn create_order(&self, request: CreateOrderRequest) -> AppResult<Order> {
        request.validate()?;

        if request.items.is_empty() {
            return Err(OrderError::NoItems.into());
        }
        let mut subtotal: i64 = 0;
        for item in &request.items {
            if item.quantity == 0 {
                return Err(OrderError::BadQuantity {
                    item: item.display_name(),
                }
                .into());
            }
            if item.price <= 0 {
                return Err(OrderError::BadPrice {
                    item: item.display_name(),
                    price: item.price,
                }
                .into());
            }
            // Checked and capped: a stored total must survive the paisa
            // conversion (x100) and the discount intermediate.
            subtotal = item
                .price
                .checked_mul(i64::from(item.quantity))
                .and_then(|line_total| subtotal.checked_add(line_total))
                .filter(|subtotal| *subtotal <= MAX_ORDER_TOTAL)
                .ok_or(OrderError::TotalTooLarge {
                    max: MAX_ORDER_TOTAL,
                })?;
        }

        let computed = subtotal - discount_amount(subtotal, request.customer.discount_percent);
        if request.total.abs_diff(computed) > TOTAL_TOLERANCE {
            return Err(OrderError::TotalMismatch {
                declared: request.total,
                computed,
            }
            .into());
        }

        let now = Utc::now();
        let order = Order {
            id: next_order_id(now),
            items: request.items,
            total: computed,
            customer: request.customer.into_info(),
            status: OrderStatus::Pending,
            created_at: now,
        };

        let order = self.store.create(order).await?;
        tracing::info!(
            order_id = %order.id,
            total = order.total,
            items = order.items.len(),
            "Order created"
        );
        Ok(order)
    }

    pub async fn get_order(&self, id: &str) -> AppResult<Order> {
        Ok(self.store.get(id).await?)
    }

    /// Newest-first admin listing, capped at [`DEFAULT_LIST_LIMIT`].
    pub async fn list_orders(&self, limit: Option<u32>) -> AppResult<Vec<OrderSummary>> {
        Ok(self
            .store
            .list(limit.unwrap_or(DEFAULT_LIST_LIMIT))
            .await?)
    }

    /// Render the PDF receipt for an order.
    pub async fn render_receipt(&self, id: &str) -> AppResult<Vec<u8>> {
        let order = self.store.get(id).await?;
        Ok(self.receipts.render(&order))
    }

    /// Dispatch a pending order to the chosen payment method.
    ///
    /// Wallet gateways hand back a signed request for the client to act
    /// on. Offline methods return printable instructions and the order is
    /// marked as awaiting manual confirmation; no callback will ever
    /// arrive for those.
    pub async fn start_checkout(&self, gateway_id: &str, order_id: &str) -> AppResult<PaymentRequest> {
        let gateway = self.gateways.lookup(gateway_id)?;

        let order = self.store.get(order_id).await?;
        if order.status != OrderStatus::Pending {
            return Err(GatewayError::OrderNotPending {
                order_id: order_id.to_string(),
                status: order.status,
            }
            .into());
        }

        let request = gateway.build_request(&order, Utc::now())?;

        if matches!(request.action, PaymentAction::Instructions { .. }) {
            self.mark_pending_confirmation(order_id, gateway_id).await?;
        } else {
            tracing::info!(
                order_id = %order_id,
                gateway = %gateway_id,
                amount_minor = request.amount_minor,
                "Checkout started"
            );
        }

        Ok(request)
    }

    /// Record that an offline-method order is waiting for an out-of-band
    /// confirmation. The status stays `pending`; flipping it to `paid` is
    /// an admin action outside this service.
    pub async fn mark_pending_confirmation(&self, order_id: &str, method: &str) -> AppResult<Order> {
        let order = self.store.get(order_id).await?;
        if order.status != OrderStatus::Pending {
            return Err(GatewayError::OrderNotPending {
                order_id: order_id.to_string(),
                status: order.status,
            }
            .into());
        }
        tracing::info!(
            order_id = %order_id,
            method = %method,
            "Order awaiting manual payment confirmation"
        );
        Ok(order)
    }

    /// Apply a gateway settlement callback.
    ///
    /// Always acknowledges with `{ok: true}` unless the gateway id itself
    /// is unknown or the store fails: unverifiable payloads, unknown
    /// orders and conflicting transitions are logged under an event id
    /// for reconciliation and deliberately not surfaced to the caller,
    /// so providers stop redelivering them.
    pub async fn handle_callback(&self, gateway_id: &str, payload: &Value) -> AppResult<CallbackAck> {
        let gateway = self.gateways.lookup(gateway_id)?;

        let callback = match gateway.parse_callback(payload) {
            Ok(callback) => callback,
            Err(err) => {
                self.log_rejected_callback(gateway_id, &err);
                return Ok(CallbackAck::acknowledged());
            }
        };

        let new_status = match callback.outcome {
            PaymentOutcome::Paid => OrderStatus::Paid,
            PaymentOutcome::Failed => OrderStatus::Failed,
        };

        match self.store.update_status(&callback.order_id, new_status).await {
            Ok(order) => {
                tracing::info!(
                    order_id = %order.id,
                    gateway = %gateway_id,
                    status = %order.status,
                    status_code = %callback.status_code,
                    reference = callback.reference.as_deref().unwrap_or(""),
                    "Payment callback applied"
                );
                if order.status == OrderStatus::Paid {
                    let notifier = Arc::clone(&self.notifier);
                    tokio::spawn(async move {
                        notifier.notify_paid(&order).await;
                    });
                }
                Ok(CallbackAck::acknowledged())
            }
            Err(StoreError::NotFound { id }) => {
                tracing::warn!(
                    order_id = %id,
                    gateway = %gateway_id,
                    "Callback for unknown order, acknowledging without applying"
                );
                Ok(CallbackAck::acknowledged())
            }
            Err(StoreError::InvalidTransition { id, from, to }) => {
                tracing::warn!(
                    order_id = %id,
                    gateway = %gateway_id,
                    from = %from,
                    to = %to,
                    "Callback conflicts with settled order, acknowledging without applying"
                );
                Ok(CallbackAck::acknowledged())
            }
            Err(err) => Err(AppError::Store(err)),
        }
    }

    fn log_rejected_callback(&self, gateway_id: &str, err: &CallbackError) {
        // Event id ties the log line to the stored provider payload when
        // someone reconciles by hand.
        tracing::warn!(
            event_id = %Uuid::new_v4(),
            gateway = %gateway_id,
            code = err.error_code(),
            error = %err,
            "Rejected gateway callback, acknowledging without applying"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BrandingConfig, JazzCashConfig};
    use crate::core::order::LineItem;
    use crate::orders::CustomerRequest;
    use crate::payments::signature::{self, SignatureScheme};
    use crate::payments::{JazzCashGateway, OfflineGateway, scalar_fields};
    use crate::store::in_memory::InMemoryOrderStore;
    use serde_json::json;

    const SALT: &str = "test-salt";

    fn service_with_store() -> (OrderService, InMemoryOrderStore) {
        let store = InMemoryOrderStore::new();
        let mut gateways = GatewayRegistry::new();
        gateways.register(Arc::new(JazzCashGateway::new(
            JazzCashConfig {
                merchant_id: "MC10011".to_string(),
                password: "pw".to_string(),
                integrity_salt: SALT.to_string(),
                signature_scheme: SignatureScheme::HmacSha256,
            },
            "http://localhost:3000",
        )));
        gateways.register(Arc::new(OfflineGateway::cash_on_delivery()));

        let service = OrderService::new(
            Arc::new(store.clone()),
            gateways,
            ReceiptRenderer::new(BrandingConfig::default()),
            Arc::new(NotificationDispatcher::new(BrandingConfig::default())),
        );
        (service, store)
    }

    fn biryani_request(declared_total: i64, discount_percent: u8) -> CreateOrderRequest {
        CreateOrderRequest {
            items: vec![LineItem {
                name: "Chicken Biryani".to_string(),
                variation: Some("Family".to_string()),
                price: 750,
                quantity: 2,
            }],
            total: declared_total,
            customer: CustomerRequest {
                name: Some("Ali Raza".to_string()),
                email: Some("ali@example.com".to_string()),
                phone: Some("+923001234567".to_string()),
                discount_percent,
            },
        }
    }

    fn signed_jazzcash_callback(order_id: &str, response_code: &str) -> Value {
        let mut payload = json!({
            "pp_TxnRefNo": order_id,
            "pp_ResponseCode": response_code,
            "pp_Amount": "150000",
        });
        let pairs = scalar_fields(&payload);
        let canonical = signature::canonical_string(
            pairs.iter().map(|(k, v)| (k.as_str(), v.as_str())),
            "pp_SecureHash",
        );
        payload["pp_SecureHash"] =
            json!(signature::sign(SignatureScheme::HmacSha256, SALT, &canonical));
        payload
    }

    #[tokio::test]
    async fn test_create_order_happy_path() {
        let (service, _) = service_with_store();
        let order = service.create_order(biryani_request(1500, 0)).await.unwrap();

        assert!(order.id.starts_with("ORD-"));
        assert_eq!(order.total, 1500);
        assert_eq!(order.status, OrderStatus::Pending);

        let fetched = service.get_order(&order.id).await.unwrap();
        assert_eq!(fetched, order);
    }

    #[tokio::test]
    async fn test_create_order_applies_discount() {
        let (service, _) = service_with_store();
        // 1500 subtotal, 10% discount -> 1350
        let order = service.create_order(biryani_request(1350, 10)).await.unwrap();
        assert_eq!(order.total, 1350);
        assert_eq!(order.discount(), 150);
    }

    #[tokio::test]
    async fn test_create_order_tolerates_off_by_one_total() {
        let (service, _) = service_with_store();
        let order = service.create_order(biryani_request(1499, 0)).await.unwrap();
        // Stored total is the server-computed one, not the declared one.
        assert_eq!(order.total, 1500);
    }

    #[tokio::test]
    async fn test_create_order_rejects_total_mismatch() {
        let (service, _) = service_with_store();
        let err = service
            .create_order(biryani_request(1400, 0))
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "ORDER_TOTAL_MISMATCH");
    }

    #[tokio::test]
    async fn test_create_order_rejects_empty_and_invalid_items() {
        let (service, _) = service_with_store();

        let mut no_items = biryani_request(0, 0);
        no_items.items.clear();
        assert!(service.create_order(no_items).await.is_err());

        let mut zero_quantity = biryani_request(1500, 0);
        zero_quantity.items[0].quantity = 0;
        let err = service.create_order(zero_quantity).await.unwrap_err();
        assert_eq!(err.error_code(), "ORDER_BAD_QUANTITY");

        let mut free_item = biryani_request(0, 0);
        free_item.items[0].price = 0;
        let err = service.create_order(free_item).await.unwrap_err();
        assert_eq!(err.error_code(), "ORDER_BAD_PRICE");
    }

    #[tokio::test]
    async fn test_create_order_rejects_huge_line_total() {
        let (service, _) = service_with_store();

        // price * quantity would wrap i64.
        let mut request = biryani_request(0, 0);
        request.items[0].price = i64::MAX;
        request.total = i64::MAX;
        let err = service.create_order(request).await.unwrap_err();
        assert_eq!(err.error_code(), "ORDER_TOTAL_TOO_LARGE");

        // Fits in i64 but would wrap once converted to paisa at checkout.
        let mut request = biryani_request(0, 0);
        request.items[0].price = 200_000_000_000_000_000;
        request.items[0].quantity = 1;
        request.total = 200_000_000_000_000_000;
        let err = service.create_order(request).await.unwrap_err();
        assert_eq!(err.error_code(), "ORDER_TOTAL_TOO_LARGE");

        // Two lines that individually fit but sum past the cap.
        let mut request = biryani_request(0, 0);
        request.items[0].price = 6_000_000;
        request.items[0].quantity = 1;
        let second = request.items[0].clone();
        request.items.push(second);
        request.total = 12_000_000;
        let err = service.create_order(request).await.unwrap_err();
        assert_eq!(err.error_code(), "ORDER_TOTAL_TOO_LARGE");
    }

    #[tokio::test]
    async fn test_create_order_accepts_total_at_cap() {
        let (service, _) = service_with_store();

        let mut request = biryani_request(MAX_ORDER_TOTAL, 0);
        request.items[0].price = MAX_ORDER_TOTAL;
        request.items[0].quantity = 1;
        let order = service.create_order(request).await.unwrap();
        assert_eq!(order.total, MAX_ORDER_TOTAL);

        // The capped total survives the paisa conversion exactly.
        let request = service.start_checkout("cod", &order.id).await.unwrap();
        assert_eq!(request.amount_minor, MAX_ORDER_TOTAL * 100);
    }

    #[tokio::test]
    async fn test_create_order_rejects_extreme_declared_total() {
        let (service, _) = service_with_store();

        // A declared total at the far end of the range must fail the
        // tolerance check, not blow up computing the difference.
        let request = biryani_request(i64::MIN, 0);
        let err = service.create_order(request).await.unwrap_err();
        assert_eq!(err.error_code(), "ORDER_TOTAL_MISMATCH");
    }

    #[tokio::test]
    async fn test_checkout_unknown_gateway() {
        let (service, _) = service_with_store();
        let order = service.create_order(biryani_request(1500, 0)).await.unwrap();

        let err = service
            .start_checkout("stripe", &order.id)
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "UNKNOWN_GATEWAY");

        // Shipped adapter with no credentials registered in this setup.
        let err = service
            .start_checkout("easypaisa", &order.id)
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "GATEWAY_NOT_CONFIGURED");
    }

    #[tokio::test]
    async fn test_checkout_builds_wallet_request() {
        let (service, _) = service_with_store();
        let order = service.create_order(biryani_request(1500, 0)).await.unwrap();

        let request = service.start_checkout("jazzcash", &order.id).await.unwrap();
        assert_eq!(request.order_id, order.id);
        assert_eq!(request.amount_minor, 150000);
        assert!(matches!(request.action, PaymentAction::HostedRedirect { .. }));
        assert!(request.signature.is_some());
    }

    #[tokio::test]
    async fn test_offline_checkout_leaves_order_pending() {
        let (service, store) = service_with_store();
        let order = service.create_order(biryani_request(1500, 0)).await.unwrap();

        let request = service.start_checkout("cod", &order.id).await.unwrap();
        assert!(matches!(request.action, PaymentAction::Instructions { .. }));

        let stored = store.get(&order.id).await.unwrap();
        assert_eq!(stored.status, OrderStatus::Pending);
    }

    #[tokio::test]
    async fn test_checkout_refused_after_settlement() {
        let (service, store) = service_with_store();
        let order = service.create_order(biryani_request(1500, 0)).await.unwrap();
        store
            .update_status(&order.id, OrderStatus::Paid)
            .await
            .unwrap();

        let err = service
            .start_checkout("jazzcash", &order.id)
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "ORDER_NOT_PENDING");
    }

    #[tokio::test]
    async fn test_callback_settles_order() {
        let (service, store) = service_with_store();
        let order = service.create_order(biryani_request(1500, 0)).await.unwrap();

        let ack = service
            .handle_callback("jazzcash", &signed_jazzcash_callback(&order.id, "000"))
            .await
            .unwrap();
        assert!(ack.ok);
        assert_eq!(
            store.get(&order.id).await.unwrap().status,
            OrderStatus::Paid
        );
    }

    #[tokio::test]
    async fn test_callback_failure_code_marks_failed() {
        let (service, store) = service_with_store();
        let order = service.create_order(biryani_request(1500, 0)).await.unwrap();

        service
            .handle_callback("jazzcash", &signed_jazzcash_callback(&order.id, "124"))
            .await
            .unwrap();
        assert_eq!(
            store.get(&order.id).await.unwrap().status,
            OrderStatus::Failed
        );
    }

    #[tokio::test]
    async fn test_replayed_callback_is_idempotent() {
        let (service, store) = service_with_store();
        let order = service.create_order(biryani_request(1500, 0)).await.unwrap();
        let payload = signed_jazzcash_callback(&order.id, "000");

        service.handle_callback("jazzcash", &payload).await.unwrap();
        let ack = service.handle_callback("jazzcash", &payload).await.unwrap();

        assert!(ack.ok);
        assert_eq!(
            store.get(&order.id).await.unwrap().status,
            OrderStatus::Paid
        );
    }

    #[tokio::test]
    async fn test_conflicting_callback_acked_but_not_applied() {
        let (service, store) = service_with_store();
        let order = service.create_order(biryani_request(1500, 0)).await.unwrap();

        service
            .handle_callback("jazzcash", &signed_jazzcash_callback(&order.id, "000"))
            .await
            .unwrap();
        // A late failure report must not un-pay the order.
        let ack = service
            .handle_callback("jazzcash", &signed_jazzcash_callback(&order.id, "124"))
            .await
            .unwrap();

        assert!(ack.ok);
        assert_eq!(
            store.get(&order.id).await.unwrap().status,
            OrderStatus::Paid
        );
    }

    #[tokio::test]
    async fn test_tampered_callback_acked_but_not_applied() {
        let (service, store) = service_with_store();
        let order = service.create_order(biryani_request(1500, 0)).await.unwrap();

        let mut payload = signed_jazzcash_callback(&order.id, "124");
        payload["pp_ResponseCode"] = json!("000");

        let ack = service.handle_callback("jazzcash", &payload).await.unwrap();
        assert!(ack.ok);
        assert_eq!(
            store.get(&order.id).await.unwrap().status,
            OrderStatus::Pending
        );
    }

    #[tokio::test]
    async fn test_callback_for_unknown_order_is_acked() {
        let (service, _) = service_with_store();
        let ack = service
            .handle_callback("jazzcash", &signed_jazzcash_callback("ORD-missing", "000"))
            .await
            .unwrap();
        assert!(ack.ok);
    }

    #[tokio::test]
    async fn test_callback_unknown_gateway_is_an_error() {
        let (service, _) = service_with_store();
        let err = service
            .handle_callback("stripe", &json!({}))
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "UNKNOWN_GATEWAY");
    }

    #[tokio::test]
    async fn test_receipt_renders_for_stored_order() {
        let (service, _) = service_with_store();
        let order = service.create_order(biryani_request(1500, 0)).await.unwrap();

        let pdf = service.render_receipt(&order.id).await.unwrap();
        assert!(pdf.starts_with(b"%PDF-"));

        let err = service.render_receipt("ORD-missing").await.unwrap_err();
        assert_eq!(err.error_code(), "ORDER_NOT_FOUND");
    }

    #[tokio::test]
    async fn test_list_orders_defaults_limit() {
        let (service, _) = service_with_store();
        for _ in 0..3 {
            service.create_order(biryani_request(1500, 0)).await.unwrap();
        }
        let listed = service.list_orders(None).await.unwrap();
        assert_eq!(listed.len(), 3);
        let capped = service.list_orders(Some(2)).await.unwrap();
        assert_eq!(capped.len(), 2);
    }
}
