//! Request tracking for the shop API.
//!
//! [`track_request`] is mounted with `axum::middleware::from_fn`. Every
//! request gets a correlation id (taken from `X-Correlation-ID` when it is a
//! UUID), runs inside a `shop_request` span tagged with that id and the
//! shopper session, and answers with the id echoed back.
//!
//! ```ignore
//! use axum::{middleware::from_fn, routing::get, Router};
//! use wedding_web::middleware::track_request;
//!
//! let app = Router::new()
//!     .route("/api/cart", get(get_cart))
//!     .layer(from_fn(track_request));
//! ```

use crate::extractors::{CorrelationId, SESSION_ID_HEADER};
use axum::{
    extract::Request,
    http::{HeaderValue, StatusCode},
    middleware::Next,
    response::Response,
};
use std::time::Instant;
use tracing::Instrument;

/// Header name for correlation ID.
pub const CORRELATION_ID_HEADER: &str = "X-Correlation-ID";

/// Tag the request with a correlation id and log how it ended.
///
/// The id is stored in the request extensions so [`CorrelationId`] handlers
/// see the same value the client gets back.
pub async fn track_request(mut req: Request, next: Next) -> Response {
    let correlation_id = CorrelationId::from_headers(req.headers());
    req.extensions_mut().insert(correlation_id);

    let session = req
        .headers()
        .get(SESSION_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-")
        .to_owned();
    let span = tracing::info_span!(
        "shop_request",
        correlation_id = %correlation_id,
        session = %session,
        method = %req.method(),
        path = %req.uri().path(),
    );

    let started = Instant::now();
    let mut response = next.run(req).instrument(span.clone()).await;
    let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

    span.in_scope(|| log_outcome(response.status(), elapsed_ms));

    if let Ok(value) = HeaderValue::from_str(&correlation_id.to_string()) {
        response.headers_mut().insert(CORRELATION_ID_HEADER, value);
    }
    response
}

fn log_outcome(status: StatusCode, elapsed_ms: u64) {
    let status = status.as_u16();
    if status >= 500 {
        tracing::error!(status, elapsed_ms, "Request failed");
    } else if status >= 400 {
        tracing::warn!(status, elapsed_ms, "Request rejected");
    } else {
        tracing::debug!(status, elapsed_ms, "Request served");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::extractors::SessionId;
    use axum::{body::Body, middleware::from_fn, routing::get, Router};
    use tower::ServiceExt;
    use uuid::Uuid;

    async fn echo_ids(correlation_id: CorrelationId, session: SessionId) -> String {
        format!("{correlation_id} {session}")
    }

    fn app() -> Router {
        Router::new()
            .route("/api/cart", get(echo_ids))
            .route("/api/boom", get(|| async { StatusCode::BAD_GATEWAY }))
            .layer(from_fn(track_request))
    }

    fn response_id(response: &Response) -> String {
        response
            .headers()
            .get(CORRELATION_ID_HEADER)
            .expect("correlation id echoed")
            .to_str()
            .unwrap()
            .to_string()
    }

    #[tokio::test]
    async fn cart_call_gets_a_fresh_id_when_none_is_sent() {
        let request = Request::builder()
            .uri("/api/cart")
            .header(SESSION_ID_HEADER, "guest-7")
            .body(Body::empty())
            .unwrap();

        let response = app().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(Uuid::parse_str(&response_id(&response)).is_ok());
    }

    #[tokio::test]
    async fn client_id_reaches_the_handler_and_comes_back() {
        let sent = Uuid::new_v4();
        let request = Request::builder()
            .uri("/api/cart")
            .header(SESSION_ID_HEADER, "guest-7")
            .header(CORRELATION_ID_HEADER, sent.to_string())
            .body(Body::empty())
            .unwrap();

        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response_id(&response), sent.to_string());

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(
            String::from_utf8(body.to_vec()).unwrap(),
            format!("{sent} guest-7")
        );
    }

    #[tokio::test]
    async fn malformed_id_is_replaced_consistently() {
        let request = Request::builder()
            .uri("/api/cart")
            .header(SESSION_ID_HEADER, "guest-7")
            .header(CORRELATION_ID_HEADER, "not-a-uuid")
            .body(Body::empty())
            .unwrap();

        let response = app().oneshot(request).await.unwrap();
        let echoed = response_id(&response);
        assert_ne!(echoed, "not-a-uuid");

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(
            String::from_utf8(body.to_vec()).unwrap(),
            format!("{echoed} guest-7")
        );
    }

    #[tokio::test]
    async fn failed_requests_still_carry_the_id() {
        let request = Request::builder()
            .uri("/api/boom")
            .body(Body::empty())
            .unwrap();

        let response = app().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert!(Uuid::parse_str(&response_id(&response)).is_ok());
    }
}
