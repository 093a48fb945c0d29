//! Order administration.
//!
//! - GET  /api/orders?orderId=..     one order
//! - GET  /api/orders?email=..       a buyer's orders
//! - GET  /api/orders?all=true       most recent orders (`limit`, default 50)
//! - GET  /api/orders                orders awaiting review
//! - POST /api/orders                place an order directly
//! - PUT  /api/orders                change status, payment status or notes

use crate::server::state::AppState;
use crate::services::orders::{NewOrder, DEFAULT_LIST_LIMIT};
use crate::types::{Order, OrderStatus, PaymentStatus};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use wedding_web::{AppError, WebResult};

use super::Success;

/// Lookup filters, checked in field order
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderQuery {
    /// Document id
    #[serde(default)]
    pub order_id: Option<String>,
    /// Buyer email
    #[serde(default)]
    pub email: Option<String>,
    /// List everything rather than the pending queue
    #[serde(default)]
    pub all: Option<bool>,
    /// Page size for `all`
    #[serde(default)]
    pub limit: Option<usize>,
}

/// `{ "order": ... }`
#[derive(Debug, Serialize)]
pub struct OrderBody {
    /// The order
    pub order: Order,
}

/// `{ "orders": [...] }`
#[derive(Debug, Serialize)]
pub struct OrdersBody {
    /// Matching orders, newest first
    pub orders: Vec<Order>,
}

/// Order lookup answer
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum OrderLookup {
    /// Single order
    One(OrderBody),
    /// List
    Many(OrdersBody),
}

/// Answer to `POST /api/orders`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderCreated {
    /// Always true
    pub success: bool,
    /// Document id
    pub order_id: String,
    /// Human reference
    pub order_ref: String,
    /// Confirmation text
    pub message: String,
}

/// Body of `PUT /api/orders`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOrderRequest {
    /// Document id
    pub order_id: String,
    /// New fulfilment state
    #[serde(default)]
    pub order_status: Option<OrderStatus>,
    /// New payment state
    #[serde(default)]
    pub payment_status: Option<PaymentStatus>,
    /// Gateway payment id to store with the payment state
    #[serde(default)]
    pub payment_id: Option<String>,
    /// Replacement staff notes
    #[serde(default)]
    pub notes: Option<String>,
}

/// Look orders up by id, by email, all of them, or the pending queue.
///
/// ```bash
/// curl "http://localhost:8080/api/orders?email=ada@example.com"
/// ```
///
/// # Errors
///
/// 404 if `orderId` names no order.
pub async fn get_orders(
    State(state): State<AppState>,
    Query(query): Query<OrderQuery>,
) -> WebResult<Json<OrderLookup>> {
    if let Some(id) = query.order_id.filter(|id| !id.trim().is_empty()) {
        let order = state
            .orders
            .get(&id)
            .await?
            .ok_or_else(|| AppError::not_found("Order", &id))?;
        return Ok(Json(OrderLookup::One(OrderBody { order })));
    }

    let orders = if let Some(email) = query.email.filter(|email| !email.trim().is_empty()) {
        state.orders.by_email(&email).await?
    } else if query.all.unwrap_or(false) {
        state.orders.all(query.limit.unwrap_or(DEFAULT_LIST_LIMIT)).await?
    } else {
        state.orders.pending().await?
    };
    Ok(Json(OrderLookup::Many(OrdersBody { orders })))
}

/// Place a pending order.
///
/// # Errors
///
/// 400 for missing contact details or an empty item list.
pub async fn create_order(
    State(state): State<AppState>,
    Json(request): Json<NewOrder>,
) -> WebResult<(StatusCode, Json<OrderCreated>)> {
    let order = state.orders.create(request).await?;
    Ok((
        StatusCode::CREATED,
        Json(OrderCreated {
            success: true,
            message: format!("Order {} created", order.order_id),
            order_id: order.id,
            order_ref: order.order_id,
        }),
    ))
}

/// Apply staff changes to an order.
///
/// Any status may follow any other.
///
/// # Errors
///
/// 400 when nothing would change; 404 for an unknown order.
pub async fn update_order(
    State(state): State<AppState>,
    Json(request): Json<UpdateOrderRequest>,
) -> WebResult<Json<Success>> {
    if request.order_id.trim().is_empty() {
        return Err(AppError::bad_request("orderId is required"));
    }
    if request.order_status.is_none() && request.payment_status.is_none() && request.notes.is_none() {
        return Err(AppError::bad_request(
            "Provide at least one of orderStatus, paymentStatus or notes",
        ));
    }

    if let Some(status) = request.order_status {
        state.orders.update_order_status(&request.order_id, status).await?;
    }
    if let Some(status) = request.payment_status {
        state
            .orders
            .update_payment_status(&request.order_id, status, request.payment_id.as_deref())
            .await?;
    }
    if let Some(notes) = &request.notes {
        state.orders.add_notes(&request.order_id, notes).await?;
    }

    tracing::info!(order = %request.order_id, "Order updated by staff");
    Ok(Json(Success::ok()))
}
