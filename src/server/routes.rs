//! HTTP handlers for the ordering API
//!
//! Handlers stay thin: extract, delegate to [`OrderService`], serialize.
//! Status-code mapping lives on [`AppError`], so every handler returns
//! `Result<_, AppError>` and lets the error type answer for itself.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::header,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::core::error::AppError;
use crate::core::order::{Order, OrderSummary};
use crate::orders::{CallbackAck, CheckoutRequest, CreateOrderRequest, OrderService};
use crate::payments::PaymentRequest;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub orders: Arc<OrderService>,
}

/// Response for order creation
///
/// Clients follow up with `GET /api/orders/{orderId}` for the full
/// snapshot.
#[derive(Debug, Serialize)]
pub struct CreateOrderResponse {
    pub ok: bool,
    #[serde(rename = "orderId")]
    pub order_id: String,
}

/// Query parameters for the admin listing
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub limit: Option<u32>,
}

/// Build the API router
///
/// All routes share one [`AppState`]. Request tracing and permissive CORS
/// are applied to the whole surface; the callback routes are reached by
/// provider servers, everything else by the storefront.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/healthz", get(health_check))
        .route("/api/orders", post(create_order))
        .route("/api/orders/{id}", get(get_order))
        .route("/api/orders/{id}/receipt", get(download_receipt))
        .route("/api/admin/orders", get(list_orders))
        .route("/api/payments/{gateway}/checkout", post(start_checkout))
        .route("/api/payments/{gateway}/callback", post(gateway_callback))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Health check endpoint handler
async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "homechef"
    }))
}

/// `POST /api/orders`
pub async fn create_order(
    State(state): State<AppState>,
    Json(request): Json<CreateOrderRequest>,
) -> Result<Json<CreateOrderResponse>, AppError> {
    let order = state.orders.create_order(request).await?;
    Ok(Json(CreateOrderResponse {
        ok: true,
        order_id: order.id,
    }))
}

/// `GET /api/orders/{id}`
pub async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Order>, AppError> {
    Ok(Json(state.orders.get_order(&id).await?))
}

/// `GET /api/orders/{id}/receipt`
///
/// Streams the rendered PDF as a download named `{id}-receipt.pdf`.
pub async fn download_receipt(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let pdf = state.orders.render_receipt(&id).await?;
    let headers = [
        (header::CONTENT_TYPE, "application/pdf".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename={id}-receipt.pdf"),
        ),
    ];
    Ok((headers, pdf).into_response())
}

/// `GET /api/admin/orders?limit=`
pub async fn list_orders(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<OrderSummary>>, AppError> {
    Ok(Json(state.orders.list_orders(query.limit).await?))
}

/// `POST /api/payments/{gateway}/checkout`
pub async fn start_checkout(
    State(state): State<AppState>,
    Path(gateway): Path<String>,
    Json(request): Json<CheckoutRequest>,
) -> Result<Json<PaymentRequest>, AppError> {
    let payment = state
        .orders
        .start_checkout(&gateway, &request.order_id)
        .await?;
    Ok(Json(payment))
}

/// `POST /api/payments/{gateway}/callback`
///
/// Provider webhook. The service acknowledges every payload it can parse
/// as JSON, including ones it rejects after verification; see
/// [`OrderService::handle_callback`] for the policy.
pub async fn gateway_callback(
    State(state): State<AppState>,
    Path(gateway): Path<String>,
    Json(payload): Json<Value>,
) -> Result<Json<CallbackAck>, AppError> {
    Ok(Json(state.orders.handle_callback(&gateway, &payload).await?))
}
