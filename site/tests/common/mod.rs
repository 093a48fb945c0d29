//! Shared router fixture for the integration tests.

#![allow(dead_code, clippy::unwrap_used)]

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;
use wedding_site::{build_router, AppState, Config};
use wedding_testing::{test_clock, InMemoryDocumentStore, MockCardGateway, MockWalletGateway};
use wedding_web::SESSION_ID_HEADER;

/// Router over in-memory storage and scripted gateways
pub struct TestApp {
    pub router: Router,
    pub docs: InMemoryDocumentStore,
    pub card: MockCardGateway,
    pub wallet: MockWalletGateway,
}

impl TestApp {
    pub fn new() -> Self {
        let docs = InMemoryDocumentStore::new();
        let card = MockCardGateway::new();
        let wallet = MockWalletGateway::new();
        let config = Config::from_lookup(|_| None);

        let state = AppState::new(
            &config,
            Arc::new(docs.clone()),
            Arc::new(test_clock()),
            Arc::new(card.clone()),
            Arc::new(wallet.clone()),
        )
        .with_checkout_wait(Duration::from_secs(5));

        Self {
            router: build_router(state, config.request_timeout()),
            docs,
            card,
            wallet,
        }
    }

    /// Send a request and decode the JSON answer (`Null` for an empty body,
    /// a JSON string for plain text).
    pub async fn call(
        &self,
        method: Method,
        uri: &str,
        session: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        if let Some(session) = session {
            request = request.header(SESSION_ID_HEADER, session);
        }
        let request = match body {
            Some(body) => request
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => request.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        (status, value)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.call(Method::GET, uri, None, None).await
    }

    pub async fn shop(&self, method: Method, uri: &str, session: &str, body: Option<Value>) -> (StatusCode, Value) {
        self.call(method, uri, Some(session), body).await
    }
}

pub fn customer() -> Value {
    json!({
        "firstName": "Ada",
        "lastName": "Obi",
        "email": "ada@example.com",
        "phone": "08030000000",
        "address": { "street": "1 Marina", "city": "Lagos", "state": "Lagos" }
    })
}

/// Fill the cart and walk the first two checkout steps.
pub async fn ready_to_pay(app: &TestApp, session: &str, method: &str) {
    let (status, cart) = app
        .shop(
            Method::POST,
            "/api/cart/items",
            session,
            Some(json!({ "itemId": 1, "size": "M", "color": "Gold", "quantity": 2 })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cart["totalItems"], 2);

    let (_, checkout) = app
        .shop(Method::PUT, "/api/checkout/customer", session, Some(customer()))
        .await;
    assert_eq!(checkout["step"], "paymentMethod");

    let (_, checkout) = app
        .shop(
            Method::PUT,
            "/api/checkout/payment-method",
            session,
            Some(json!({ "paymentMethod": method })),
        )
        .await;
    assert_eq!(checkout["step"], "payment");
    assert_eq!(checkout["lineItems"].as_array().unwrap().len(), 1);
}
