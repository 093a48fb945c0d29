//! Gateway status callbacks.
//!
//! - PUT /api/payments/card   `{paymentIntentId, orderId, status}`
//! - PUT /api/payments/wallet `{paypalOrderId, orderId, status}`

use crate::server::state::AppState;
use crate::services::payments::{CardCallback, Settlement, WalletCallback};
use crate::types::PaymentStatus;
use axum::extract::State;
use axum::Json;
use serde::Serialize;
use wedding_web::WebResult;

/// Callback acknowledgement
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CallbackResponse {
    /// Always true; failures render as error bodies
    pub success: bool,
    /// Payment status written onto the order
    pub payment_status: PaymentStatus,
}

impl From<Settlement> for CallbackResponse {
    fn from(settlement: Settlement) -> Self {
        Self {
            success: true,
            payment_status: match settlement {
                Settlement::Paid => PaymentStatus::Completed,
                Settlement::Failed => PaymentStatus::Failed,
            },
        }
    }
}

/// Record the card gateway's verdict on an order.
///
/// # Errors
///
/// 400 for blank ids; 404 for an unknown order.
pub async fn card_callback(
    State(state): State<AppState>,
    Json(callback): Json<CardCallback>,
) -> WebResult<Json<CallbackResponse>> {
    let settlement = state.payments.card(callback).await?;
    Ok(Json(settlement.into()))
}

/// Record the wallet gateway's verdict on an order.
///
/// # Errors
///
/// 400 for blank ids; 404 for an unknown order.
pub async fn wallet_callback(
    State(state): State<AppState>,
    Json(callback): Json<WalletCallback>,
) -> WebResult<Json<CallbackResponse>> {
    let settlement = state.payments.wallet(callback).await?;
    Ok(Json(settlement.into()))
}
