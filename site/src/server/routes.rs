//! Router configuration.

use super::state::AppState;
use crate::api::{asoebi, cart, catalog, checkout, content, orders, payments, rsvps};
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{
    routing::{delete, get, post, put},
    Json, Router,
};
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use wedding_web::track_request;
use wedding_web::handlers::{health_check, readiness, ReadinessBody};

/// Build the complete Axum router.
///
/// Shop routes (`/api/catalog`, `/api/cart`, `/api/checkout`) read the
/// shopper session from `X-Session-ID`. Operational routes sit at the root.
pub fn build_router(state: AppState, request_timeout: Duration) -> Router {
    let shop = Router::new()
        .route("/catalog", get(catalog::list_catalog))
        .route("/cart", get(cart::get_cart).delete(cart::clear_cart))
        .route("/cart/items", post(cart::add_item))
        .route(
            "/cart/items/:entry_id",
            put(cart::set_quantity).delete(cart::remove_item),
        )
        .route("/cart/visibility", post(cart::set_visibility))
        .route("/checkout", get(checkout::get_checkout))
        .route("/checkout/customer", put(checkout::set_customer))
        .route("/checkout/payment-method", put(checkout::set_payment_method))
        .route("/checkout/back", post(checkout::back))
        .route("/checkout/pay", post(checkout::pay))
        .route("/checkout/card/confirm", post(checkout::confirm_card))
        .route("/checkout/wallet/approve", post(checkout::approve_wallet))
        .route("/checkout/reset", post(checkout::reset))
        .route("/payments/card", put(payments::card_callback))
        .route("/payments/wallet", put(payments::wallet_callback));

    let admin = Router::new()
        .route(
            "/orders",
            get(orders::get_orders)
                .post(orders::create_order)
                .put(orders::update_order),
        )
        .route(
            "/rsvps",
            get(rsvps::get_rsvps)
                .post(rsvps::create_rsvp)
                .put(rsvps::update_rsvp)
                .delete(rsvps::delete_rsvp)
                .patch(rsvps::patch_rsvps),
        )
        .route("/rsvps/:id/check-in", post(rsvps::check_in))
        .route("/rsvps/:id/check-out", post(rsvps::check_out))
        .route(
            "/gallery",
            get(content::list_gallery)
                .post(content::add_gallery_image)
                .delete(content::delete_gallery_image),
        )
        .route(
            "/headers",
            get(content::list_headers)
                .post(content::add_header)
                .put(content::set_header_active)
                .delete(content::delete_header),
        )
        .route(
            "/comments",
            get(content::list_comments)
                .post(content::create_comment)
                .put(content::edit_comment)
                .delete(content::delete_comment),
        )
        .route(
            "/table-groups",
            get(content::list_table_groups).post(content::create_table_group),
        )
        .route(
            "/table-groups/:id",
            get(content::get_table_group).delete(content::delete_table_group),
        )
        .route(
            "/asoebi-orders",
            get(asoebi::list_asoebi_orders)
                .post(asoebi::create_asoebi_order)
                .put(asoebi::update_asoebi_order),
        );

    Router::new()
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .route("/metrics", get(metrics))
        .nest("/api", shop.merge(admin))
        .layer(TimeoutLayer::new(request_timeout))
        .layer(CorsLayer::permissive())
        .layer(axum::middleware::from_fn(track_request))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Readiness over the session registry and the document store.
///
/// ```text
/// GET /ready
/// ```
async fn readiness_check(State(state): State<AppState>) -> (StatusCode, Json<ReadinessBody>) {
    let checks = vec![state.sessions.health().await, state.document_store_health().await];
    readiness(checks)
}

/// Prometheus exposition text.
async fn metrics(State(state): State<AppState>) -> Response {
    match &state.metrics {
        Some(exporter) => match exporter.render() {
            Some(body) => (
                StatusCode::OK,
                [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
                body,
            )
                .into_response(),
            None => (StatusCode::SERVICE_UNAVAILABLE, "metrics recorder not installed").into_response(),
        },
        None => (StatusCode::NOT_FOUND, "metrics disabled").into_response(),
    }
}
