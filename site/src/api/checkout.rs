//! Checkout wizard endpoints.
//!
//! - GET  /api/checkout
//! - PUT  /api/checkout/customer
//! - PUT  /api/checkout/payment-method
//! - POST /api/checkout/back
//! - POST /api/checkout/pay
//! - POST /api/checkout/card/confirm
//! - POST /api/checkout/wallet/approve
//! - POST /api/checkout/reset
//!
//! Every call answers with the checkout state. Rejected input is reported in
//! its `error` field, not as an HTTP error. Calls that start gateway work
//! wait until the attempt reaches its next resting point.

use crate::checkout::{CheckoutAction, CheckoutState};
use crate::server::state::AppState;
use crate::session::{ShopAction, ShopStore};
use crate::types::{CustomerInfo, PaymentMethod};
use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use wedding_runtime::StoreError;
use wedding_web::{CorrelationId, SessionId, WebResult};

/// Body of `PUT /api/checkout/payment-method`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentMethodRequest {
    /// `stripe`/`card` or `paypal`/`wallet`
    pub payment_method: PaymentMethod,
}

/// Body of `POST /api/checkout/card/confirm`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmCardRequest {
    /// Tokenized payment method from the card widget
    pub payment_method: String,
}

/// Body of `POST /api/checkout/wallet/approve`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApproveWalletRequest {
    /// Gateway order id; the approval redirect calls it `token`
    #[serde(alias = "token", alias = "orderID")]
    pub wallet_order_id: String,
}

/// Dispatch a checkout action and, if it started gateway or storage work,
/// wait for that work to report back.
async fn step(store: &ShopStore, action: CheckoutAction, wait: Duration) -> WebResult<Json<CheckoutState>> {
    // Subscribe first so a fast effect result is not missed
    let mut results = store.subscribe_actions();
    store.send(ShopAction::Checkout(action)).await?;

    let (attempt, in_flight) = store
        .state(|s| (s.checkout.attempt, s.checkout.phase.in_flight()))
        .await;

    if in_flight {
        tokio::time::timeout(wait, async {
            loop {
                match results.recv().await {
                    Ok(ShopAction::Checkout(result))
                        if result.is_checkout_outcome() && result.attempt() == Some(attempt) =>
                    {
                        return Ok(());
                    },
                    Ok(_) => {},
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "Checkout observer lagged");
                    },
                    Err(RecvError::Closed) => return Err(StoreError::ChannelClosed),
                }
            }
        })
        .await
        .map_err(|_| StoreError::Timeout)??;
    }

    Ok(Json(store.state(|s| s.checkout.clone()).await))
}

async fn session_step(state: &AppState, session: &SessionId, action: CheckoutAction) -> WebResult<Json<CheckoutState>> {
    let store = state.sessions.get_or_create(session.as_str()).await;
    step(&store, action, state.checkout_wait).await
}

/// Read the checkout state.
pub async fn get_checkout(State(state): State<AppState>, session: SessionId) -> Json<CheckoutState> {
    let store = state.sessions.get_or_create(session.as_str()).await;
    Json(store.state(|s| s.checkout.clone()).await)
}

/// Step 1: buyer details.
///
/// # Errors
///
/// 503 while shutting down.
pub async fn set_customer(
    State(state): State<AppState>,
    session: SessionId,
    Json(customer): Json<CustomerInfo>,
) -> WebResult<Json<CheckoutState>> {
    session_step(&state, &session, CheckoutAction::SetCustomerInfo(customer)).await
}

/// Step 2: gateway choice.
///
/// # Errors
///
/// 503 while shutting down.
pub async fn set_payment_method(
    State(state): State<AppState>,
    session: SessionId,
    Json(request): Json<PaymentMethodRequest>,
) -> WebResult<Json<CheckoutState>> {
    session_step(&state, &session, CheckoutAction::SelectPaymentMethod(request.payment_method)).await
}

/// Go back one step.
///
/// # Errors
///
/// 503 while shutting down.
pub async fn back(State(state): State<AppState>, session: SessionId) -> WebResult<Json<CheckoutState>> {
    session_step(&state, &session, CheckoutAction::Back).await
}

/// Step 3: write the order and fetch a gateway handle.
///
/// Answers once the card client secret or wallet approval URL is in the
/// state, or the attempt failed.
///
/// ```bash
/// curl -X POST http://localhost:8080/api/checkout/pay -H "X-Session-ID: 3f2a"
/// ```
///
/// # Errors
///
/// 408 if the gateway does not answer in time.
pub async fn pay(
    State(state): State<AppState>,
    session: SessionId,
    correlation_id: CorrelationId,
) -> WebResult<Json<CheckoutState>> {
    tracing::info!(session = %session, correlation_id = %correlation_id.0, "Checkout payment requested");
    session_step(&state, &session, CheckoutAction::Pay).await
}

/// Charge the card with the tokenized payment method.
///
/// # Errors
///
/// 408 if the gateway does not answer in time.
pub async fn confirm_card(
    State(state): State<AppState>,
    session: SessionId,
    Json(request): Json<ConfirmCardRequest>,
) -> WebResult<Json<CheckoutState>> {
    session_step(
        &state,
        &session,
        CheckoutAction::ConfirmCard {
            payment_method: request.payment_method,
        },
    )
    .await
}

/// Capture the wallet order the shopper approved.
///
/// # Errors
///
/// 408 if the gateway does not answer in time.
pub async fn approve_wallet(
    State(state): State<AppState>,
    session: SessionId,
    Json(request): Json<ApproveWalletRequest>,
) -> WebResult<Json<CheckoutState>> {
    session_step(
        &state,
        &session,
        CheckoutAction::ApproveWallet {
            wallet_order_id: request.wallet_order_id,
        },
    )
    .await
}

/// Start over at step 1.
///
/// # Errors
///
/// 503 while shutting down.
pub async fn reset(State(state): State<AppState>, session: SessionId) -> WebResult<Json<CheckoutState>> {
    session_step(&state, &session, CheckoutAction::Reset).await
}
