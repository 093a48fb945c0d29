//! Session cart endpoints.
//!
//! - GET    /api/cart
//! - POST   /api/cart/items
//! - PUT    /api/cart/items/:entry_id
//! - DELETE /api/cart/items/:entry_id
//! - DELETE /api/cart
//! - POST   /api/cart/visibility
//!
//! Every call needs an `X-Session-ID` header and answers with the cart.

use crate::cart::{CartAction, CartItem, CartState};
use crate::catalog;
use crate::server::state::AppState;
use crate::session::{ShopAction, ShopStore};
use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;
use wedding_web::{AppError, SessionId, WebResult};

/// Body of `POST /api/cart/items`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddItemRequest {
    /// Catalog item id
    pub item_id: u32,
    /// Size, one the item is offered in
    pub size: String,
    /// Colour, one the item is offered in
    pub color: String,
    /// Units to add, default 1
    #[serde(default)]
    pub quantity: Option<u32>,
}

/// Body of `PUT /api/cart/items/:entry_id`
#[derive(Debug, Deserialize)]
pub struct SetQuantityRequest {
    /// New quantity; zero or less removes the line
    pub quantity: i64,
}

/// Cart drawer change
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    /// Show
    Open,
    /// Hide
    Close,
    /// Flip
    Toggle,
}

/// Body of `POST /api/cart/visibility`
#[derive(Debug, Deserialize)]
pub struct VisibilityRequest {
    /// What to do with the drawer
    pub action: Visibility,
}

async fn apply(state: &AppState, session: &SessionId, action: CartAction) -> WebResult<Json<CartState>> {
    let store = state.sessions.get_or_create(session.as_str()).await;
    store.send(ShopAction::Cart(action)).await?;
    Ok(Json(cart_of(&store).await))
}

async fn cart_of(store: &ShopStore) -> CartState {
    store.state(|s| s.cart.clone()).await
}

/// Read the session's cart.
pub async fn get_cart(State(state): State<AppState>, session: SessionId) -> Json<CartState> {
    let store = state.sessions.get_or_create(session.as_str()).await;
    Json(cart_of(&store).await)
}

/// Add a catalog item. Name and price come from the catalog, never the client.
///
/// ```bash
/// curl -X POST http://localhost:8080/api/cart/items \
///   -H "X-Session-ID: 3f2a" -H "Content-Type: application/json" \
///   -d '{"itemId": 1, "size": "M", "color": "Gold", "quantity": 1}'
/// ```
///
/// # Errors
///
/// 404 for an unknown item; 400 for a size or colour it is not offered in.
pub async fn add_item(
    State(state): State<AppState>,
    session: SessionId,
    Json(request): Json<AddItemRequest>,
) -> WebResult<Json<CartState>> {
    let item = catalog::find(request.item_id)
        .ok_or_else(|| AppError::not_found("Catalog item", request.item_id))?;
    item.check_variant(&request.size, &request.color)
        .map_err(|err| AppError::bad_request(err.to_string()))?;

    let line = CartItem::from_catalog(item, &request.size, &request.color, request.quantity.unwrap_or(1));
    tracing::debug!(session = %session, entry = %line.cart_entry_id, "Adding to cart");
    apply(&state, &session, CartAction::Add(line)).await
}

/// Set a line's quantity.
///
/// # Errors
///
/// 404 if the session's cart has no such line.
pub async fn set_quantity(
    State(state): State<AppState>,
    session: SessionId,
    Path(entry_id): Path<String>,
    Json(request): Json<SetQuantityRequest>,
) -> WebResult<Json<CartState>> {
    ensure_entry(&state, &session, &entry_id).await?;
    apply(
        &state,
        &session,
        CartAction::SetQuantity {
            cart_entry_id: entry_id,
            quantity: request.quantity,
        },
    )
    .await
}

/// Remove a line.
///
/// # Errors
///
/// 404 if the session's cart has no such line.
pub async fn remove_item(
    State(state): State<AppState>,
    session: SessionId,
    Path(entry_id): Path<String>,
) -> WebResult<Json<CartState>> {
    ensure_entry(&state, &session, &entry_id).await?;
    apply(&state, &session, CartAction::Remove { cart_entry_id: entry_id }).await
}

/// Empty the cart.
///
/// # Errors
///
/// 503 while shutting down.
pub async fn clear_cart(State(state): State<AppState>, session: SessionId) -> WebResult<Json<CartState>> {
    apply(&state, &session, CartAction::Clear).await
}

/// Open, close or toggle the cart drawer.
///
/// # Errors
///
/// 503 while shutting down.
pub async fn set_visibility(
    State(state): State<AppState>,
    session: SessionId,
    Json(request): Json<VisibilityRequest>,
) -> WebResult<Json<CartState>> {
    let action = match request.action {
        Visibility::Open => CartAction::Open,
        Visibility::Close => CartAction::Close,
        Visibility::Toggle => CartAction::Toggle,
    };
    apply(&state, &session, action).await
}

async fn ensure_entry(state: &AppState, session: &SessionId, entry_id: &str) -> WebResult<()> {
    let store = state.sessions.get_or_create(session.as_str()).await;
    if store.state(|s| s.cart.entry(entry_id).is_some()).await {
        Ok(())
    } else {
        Err(AppError::not_found("Cart entry", entry_id))
    }
}
