//! Direct Aso-Ebi order form.
//!
//! - GET  /api/asoebi-orders?status=..
//! - POST /api/asoebi-orders
//! - PUT  /api/asoebi-orders   `{id, status?, paymentStatus?, notes?}`

use super::Success;
use crate::server::state::AppState;
use crate::services::asoebi::{AsoebiOrder, AsoebiStatus, AsoebiUpdate, NewAsoebiOrder};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use wedding_web::{AppError, WebResult};

/// `?status=`
#[derive(Debug, Deserialize)]
pub struct AsoebiQuery {
    /// Only orders in this state
    #[serde(default)]
    pub status: Option<AsoebiStatus>,
}

/// Answer to `POST /api/asoebi-orders`
#[derive(Debug, Serialize)]
pub struct AsoebiCreated {
    /// Always true
    pub success: bool,
    /// The stored order
    pub order: AsoebiOrder,
    /// Confirmation text
    pub message: String,
}

/// Body of `PUT /api/asoebi-orders`
#[derive(Debug, Deserialize)]
pub struct UpdateAsoebiRequest {
    /// Order id
    pub id: String,
    /// Fields to change
    #[serde(flatten)]
    pub update: AsoebiUpdate,
}

/// Orders, optionally with one status, newest first.
///
/// # Errors
///
/// 400 for an unknown status.
pub async fn list_asoebi_orders(
    State(state): State<AppState>,
    Query(query): Query<AsoebiQuery>,
) -> WebResult<Json<Vec<AsoebiOrder>>> {
    Ok(Json(state.asoebi.list(query.status).await?))
}

/// Submit the order form.
///
/// ```bash
/// curl -X POST http://localhost:8080/api/asoebi-orders -H "Content-Type: application/json" \
///   -d '{"customerName": "Ada", "customerEmail": "ada@example.com", "customerPhone": "0803",
///        "items": [{"itemId": "gele", "itemName": "Gele", "quantity": 1, "size": "One Size",
///        "color": "Gold", "price": 1500000}], "totalAmount": 1500000, "deliveryAddress": "Lagos"}'
/// ```
///
/// # Errors
///
/// 400 for missing contact details, a malformed email or no items.
pub async fn create_asoebi_order(
    State(state): State<AppState>,
    Json(order): Json<NewAsoebiOrder>,
) -> WebResult<(StatusCode, Json<AsoebiCreated>)> {
    let order = state.asoebi.create(order).await?;
    Ok((
        StatusCode::CREATED,
        Json(AsoebiCreated {
            success: true,
            message: "Order submitted successfully".to_string(),
            order,
        }),
    ))
}

/// Apply staff changes.
///
/// # Errors
///
/// 400 without an id or with nothing to change; 404 for an unknown order.
pub async fn update_asoebi_order(
    State(state): State<AppState>,
    Json(request): Json<UpdateAsoebiRequest>,
) -> WebResult<Json<Success>> {
    if request.id.trim().is_empty() {
        return Err(AppError::bad_request("id is required"));
    }
    state.asoebi.update(&request.id, request.update).await?;
    Ok(Json(Success::ok()))
}
