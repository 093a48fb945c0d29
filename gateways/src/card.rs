//! Card payments through a Stripe-compatible payment-intent API
//!
//! A card charge is a two-step affair: the server creates a payment intent
//! for the order total and hands its client secret to the browser, the
//! browser tokenizes the card, and the server confirms the intent with that
//! payment method token.

use crate::error::GatewayError;
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;

/// Default API base for the card gateway
pub const DEFAULT_CARD_API_BASE: &str = "https://api.stripe.com";

/// Boxed future returned by [`CardGateway`] methods.
pub type CardFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, GatewayError>> + Send + 'a>>;

/// Lifecycle status of a payment intent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentStatus {
    /// Waiting for a payment method
    RequiresPaymentMethod,
    /// Payment method attached, waiting for confirmation
    RequiresConfirmation,
    /// Customer action (e.g. 3-D Secure) required
    RequiresAction,
    /// Charge is being processed
    Processing,
    /// Waiting for manual capture
    RequiresCapture,
    /// Charge was cancelled
    Canceled,
    /// Charge succeeded
    Succeeded,
    /// Any status this client does not know about
    #[serde(other)]
    Unknown,
}

impl IntentStatus {
    /// Parse a status string reported by the gateway or a client callback.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        serde_json::from_value(serde_json::Value::String(value.to_string()))
            .unwrap_or(Self::Unknown)
    }

    /// Whether the money has been taken.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded)
    }
}

/// A payment intent as returned by the gateway
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentIntent {
    /// Intent id (`pi_...`)
    pub id: String,
    /// Secret the browser uses to collect card details
    pub client_secret: String,
    /// Current status
    pub status: IntentStatus,
    /// Amount in minor units
    #[serde(default)]
    pub amount: i64,
    /// Lower-case ISO currency code
    #[serde(default)]
    pub currency: String,
}

/// Parameters for creating a payment intent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateIntent {
    /// Amount in minor units (kobo for NGN)
    pub amount_minor: i64,
    /// Lower-case ISO currency code
    pub currency: String,
    /// Order document id recorded in the intent metadata
    pub order_id: String,
}

/// Card payment gateway
///
/// Uses explicit `Pin<Box<dyn Future>>` returns so checkout environments can
/// hold it as `Arc<dyn CardGateway>`.
pub trait CardGateway: Send + Sync {
    /// Create a payment intent for an order.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError`] if the gateway rejects the request or is unreachable.
    fn create_intent(&self, request: CreateIntent) -> CardFuture<'_, PaymentIntent>;

    /// Confirm an intent with a tokenized payment method.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Declined`] if the card is declined, or another
    /// [`GatewayError`] if the call fails.
    fn confirm_intent<'a>(
        &'a self,
        intent_id: &'a str,
        payment_method: &'a str,
    ) -> CardFuture<'a, IntentStatus>;

    /// Fetch the current status of an intent.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError`] if the call fails.
    fn retrieve_intent<'a>(&'a self, intent_id: &'a str) -> CardFuture<'a, IntentStatus>;
}

#[derive(Debug, Deserialize)]
struct StripeErrorBody {
    error: StripeErrorDetail,
}

#[derive(Debug, Deserialize)]
struct StripeErrorDetail {
    #[serde(default)]
    message: String,
    #[serde(rename = "type", default)]
    kind: String,
}

/// Stripe-compatible card gateway client
#[derive(Clone)]
pub struct StripeClient {
    client: Client,
    secret_key: String,
    api_base: String,
}

impl StripeClient {
    /// Create a client with an explicit secret key.
    ///
    /// An empty key is accepted; every call then fails with
    /// [`GatewayError::MissingCredentials`].
    #[must_use]
    pub fn new(secret_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            secret_key: secret_key.into(),
            api_base: DEFAULT_CARD_API_BASE.to_string(),
        }
    }

    /// Point the client at a different API base (test servers, proxies).
    #[must_use]
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    fn require_key(&self) -> Result<&str, GatewayError> {
        if self.secret_key.is_empty() {
            Err(GatewayError::MissingCredentials("card"))
        } else {
            Ok(&self.secret_key)
        }
    }

    async fn intent_status(response: Response) -> Result<IntentStatus, GatewayError> {
        let intent = Self::parse::<PaymentIntent>(response).await?;
        Ok(intent.status)
    }

    async fn parse<T: for<'de> Deserialize<'de>>(response: Response) -> Result<T, GatewayError> {
        match response.status() {
            status if status.is_success() => response
                .json::<T>()
                .await
                .map_err(|e| GatewayError::ResponseParseFailed(e.to_string())),
            StatusCode::TOO_MANY_REQUESTS => Err(GatewayError::RateLimited),
            StatusCode::UNAUTHORIZED => Err(GatewayError::Unauthorized),
            status => {
                let body = response.text().await.unwrap_or_default();
                let detail = serde_json::from_str::<StripeErrorBody>(&body).ok();
                match detail {
                    Some(StripeErrorBody { error })
                        if status == StatusCode::PAYMENT_REQUIRED || error.kind == "card_error" =>
                    {
                        Err(GatewayError::Declined(error.message))
                    },
                    Some(StripeErrorBody { error }) => Err(GatewayError::ApiError {
                        status: status.as_u16(),
                        message: error.message,
                    }),
                    None => Err(GatewayError::ApiError {
                        status: status.as_u16(),
                        message: body,
                    }),
                }
            },
        }
    }
}

impl CardGateway for StripeClient {
    fn create_intent(&self, request: CreateIntent) -> CardFuture<'_, PaymentIntent> {
        Box::pin(async move {
            let key = self.require_key()?;
            tracing::debug!(
                order_id = %request.order_id,
                amount = request.amount_minor,
                currency = %request.currency,
                "Creating payment intent"
            );

            let form = [
                ("amount", request.amount_minor.to_string()),
                ("currency", request.currency.to_lowercase()),
                ("automatic_payment_methods[enabled]", "true".to_string()),
                ("metadata[orderId]", request.order_id.clone()),
            ];

            let response = self
                .client
                .post(format!("{}/v1/payment_intents", self.api_base))
                .bearer_auth(key)
                .form(&form)
                .send()
                .await?;

            Self::parse::<PaymentIntent>(response).await
        })
    }

    fn confirm_intent<'a>(
        &'a self,
        intent_id: &'a str,
        payment_method: &'a str,
    ) -> CardFuture<'a, IntentStatus> {
        Box::pin(async move {
            let key = self.require_key()?;
            tracing::debug!(intent_id, "Confirming payment intent");

            let response = self
                .client
                .post(format!(
                    "{}/v1/payment_intents/{intent_id}/confirm",
                    self.api_base
                ))
                .bearer_auth(key)
                .form(&[("payment_method", payment_method)])
                .send()
                .await?;

            Self::intent_status(response).await
        })
    }

    fn retrieve_intent<'a>(&'a self, intent_id: &'a str) -> CardFuture<'a, IntentStatus> {
        Box::pin(async move {
            let key = self.require_key()?;

            let response = self
                .client
                .get(format!("{}/v1/payment_intents/{intent_id}", self.api_base))
                .bearer_auth(key)
                .send()
                .await?;

            Self::intent_status(response).await
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn intent_request() -> CreateIntent {
        CreateIntent {
            amount_minor: 4_500_000,
            currency: "NGN".to_string(),
            order_id: "doc-1".to_string(),
        }
    }

    #[test]
    fn test_status_parse() {
        assert_eq!(IntentStatus::parse("succeeded"), IntentStatus::Succeeded);
        assert_eq!(
            IntentStatus::parse("requires_action"),
            IntentStatus::RequiresAction
        );
        assert_eq!(IntentStatus::parse("exploded"), IntentStatus::Unknown);
        assert!(!IntentStatus::parse("processing").is_success());
    }

    #[tokio::test]
    async fn test_missing_key_short_circuits() {
        let client = StripeClient::new("");
        let err = client.create_intent(intent_request()).await.unwrap_err();
        assert_eq!(err, GatewayError::MissingCredentials("card"));
    }

    #[tokio::test]
    async fn test_create_intent_sends_form_and_parses_intent() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/payment_intents"))
            .and(header("authorization", "Bearer sk_test_123"))
            .and(body_string_contains("amount=4500000"))
            .and(body_string_contains("currency=ngn"))
            .and(body_string_contains("metadata%5BorderId%5D=doc-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "pi_1",
                "client_secret": "pi_1_secret_abc",
                "status": "requires_payment_method",
                "amount": 4_500_000,
                "currency": "ngn"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = StripeClient::new("sk_test_123").with_api_base(server.uri());
        let intent = client.create_intent(intent_request()).await.unwrap();

        assert_eq!(intent.id, "pi_1");
        assert_eq!(intent.client_secret, "pi_1_secret_abc");
        assert_eq!(intent.status, IntentStatus::RequiresPaymentMethod);
    }

    #[tokio::test]
    async fn test_confirm_declined_card() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/payment_intents/pi_1/confirm"))
            .respond_with(ResponseTemplate::new(402).set_body_json(json!({
                "error": { "type": "card_error", "message": "Your card was declined." }
            })))
            .mount(&server)
            .await;

        let client = StripeClient::new("sk_test_123").with_api_base(server.uri());
        let err = client.confirm_intent("pi_1", "pm_card").await.unwrap_err();

        assert_eq!(err, GatewayError::Declined("Your card was declined.".into()));
    }

    #[tokio::test]
    async fn test_confirm_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/payment_intents/pi_2/confirm"))
            .and(body_string_contains("payment_method=pm_card_visa"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "pi_2",
                "client_secret": "s",
                "status": "succeeded"
            })))
            .mount(&server)
            .await;

        let client = StripeClient::new("sk").with_api_base(server.uri());
        let status = client.confirm_intent("pi_2", "pm_card_visa").await.unwrap();
        assert!(status.is_success());
    }

    #[tokio::test]
    async fn test_status_mapping_for_auth_and_rate_limits() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/payment_intents/pi_auth"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1/payment_intents/pi_busy"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1/payment_intents/pi_gone"))
            .respond_with(ResponseTemplate::new(404).set_body_string("no such intent"))
            .mount(&server)
            .await;

        let client = StripeClient::new("sk").with_api_base(server.uri());

        assert_eq!(
            client.retrieve_intent("pi_auth").await.unwrap_err(),
            GatewayError::Unauthorized
        );
        assert_eq!(
            client.retrieve_intent("pi_busy").await.unwrap_err(),
            GatewayError::RateLimited
        );
        assert_eq!(
            client.retrieve_intent("pi_gone").await.unwrap_err(),
            GatewayError::ApiError {
                status: 404,
                message: "no such intent".into()
            }
        );
    }
}
