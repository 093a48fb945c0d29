//! Wallet payments through a PayPal-compatible orders/capture API
//!
//! The server creates a gateway-hosted order and returns its approval link.
//! The shopper approves the payment in the gateway's widget, after which the
//! server captures the order. Prices are held in naira; the wallet is charged
//! in US dollars at a fixed conversion rate.

use crate::error::GatewayError;
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// Sandbox API base
pub const SANDBOX_API_BASE: &str = "https://api-m.sandbox.paypal.com";

/// Live API base
pub const LIVE_API_BASE: &str = "https://api-m.paypal.com";

/// Default naira-per-dollar conversion rate
pub const DEFAULT_NGN_PER_USD: i64 = 1500;

/// Boxed future returned by [`WalletGateway`] methods.
pub type WalletFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, GatewayError>> + Send + 'a>>;

/// Which wallet environment to talk to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WalletMode {
    /// Test environment
    #[default]
    Sandbox,
    /// Real money
    Live,
}

impl WalletMode {
    /// Parse a mode name; anything but `live` selects the sandbox.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        if value.eq_ignore_ascii_case("live") || value.eq_ignore_ascii_case("production") {
            Self::Live
        } else {
            Self::Sandbox
        }
    }

    /// API base for this mode
    #[must_use]
    pub const fn api_base(self) -> &'static str {
        match self {
            Self::Sandbox => SANDBOX_API_BASE,
            Self::Live => LIVE_API_BASE,
        }
    }
}

/// Parameters for creating a wallet order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateWalletOrder {
    /// Order document id, sent as the purchase unit reference
    pub order_id: String,
    /// Human order reference, used in the description
    pub order_ref: String,
    /// Amount in naira minor units (kobo)
    pub amount_minor: i64,
    /// Where the gateway sends the shopper after approval
    pub return_url: String,
    /// Where the gateway sends the shopper after cancelling
    pub cancel_url: String,
}

/// A gateway-hosted wallet order awaiting approval
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletOrder {
    /// Gateway order id
    pub id: String,
    /// Link the shopper follows to approve the payment
    pub approval_url: String,
}

/// Result of capturing a wallet order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CaptureStatus {
    /// Funds captured
    Completed,
    /// Order approved but not captured
    Approved,
    /// Capture pending review
    Pending,
    /// Payment declined
    Declined,
    /// Order voided
    Voided,
    /// Any status this client does not know about
    #[serde(other)]
    Unknown,
}

impl CaptureStatus {
    /// Parse a status string reported by the gateway or a client callback.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        serde_json::from_value(serde_json::Value::String(value.to_ascii_uppercase()))
            .unwrap_or(Self::Unknown)
    }

    /// Whether the money has been taken.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Completed)
    }
}

/// Format a naira amount as a dollar string with two decimals.
///
/// `amount_minor` is in kobo; the result is rounded half-up to the cent.
///
/// ```
/// use wedding_gateways::wallet::usd_amount;
///
/// assert_eq!(usd_amount(4_500_000, 1500), "30.00");
/// assert_eq!(usd_amount(1_000_000, 1500), "6.67");
/// ```
#[must_use]
pub fn usd_amount(amount_minor: i64, ngn_per_usd: i64) -> String {
    let rate = ngn_per_usd.max(1);
    // kobo / rate == US cents
    let cents = (amount_minor * 2 + rate) / (rate * 2);
    format!("{}.{:02}", cents / 100, cents % 100)
}

/// Wallet payment gateway
///
/// Uses explicit `Pin<Box<dyn Future>>` returns so checkout environments can
/// hold it as `Arc<dyn WalletGateway>`.
pub trait WalletGateway: Send + Sync {
    /// Create a gateway order and return its approval link.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError`] if the gateway rejects the request or is unreachable.
    fn create_order(&self, request: CreateWalletOrder) -> WalletFuture<'_, WalletOrder>;

    /// Capture an approved order.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Declined`] if the payment instrument is
    /// declined, or another [`GatewayError`] if the call fails.
    fn capture_order<'a>(&'a self, wallet_order_id: &'a str) -> WalletFuture<'a, CaptureStatus>;
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: u64,
}

#[derive(Debug, Deserialize)]
struct OrderResponse {
    id: String,
    #[serde(default)]
    links: Vec<Link>,
}

#[derive(Debug, Deserialize)]
struct Link {
    href: String,
    rel: String,
}

#[derive(Debug, Deserialize)]
struct CaptureResponse {
    status: CaptureStatus,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    name: String,
    #[serde(default)]
    message: String,
    #[serde(default)]
    details: Vec<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    issue: String,
}

#[derive(Debug, Clone)]
struct CachedToken {
    value: String,
    expires_at: Instant,
}

/// PayPal-compatible wallet gateway client
///
/// Access tokens are cached until shortly before they expire.
#[derive(Clone)]
pub struct PayPalClient {
    client: Client,
    client_id: String,
    client_secret: String,
    api_base: String,
    ngn_per_usd: i64,
    token: Arc<Mutex<Option<CachedToken>>>,
}

impl PayPalClient {
    /// Create a client for the given environment.
    ///
    /// Empty credentials are accepted; every call then fails with
    /// [`GatewayError::MissingCredentials`].
    #[must_use]
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        mode: WalletMode,
    ) -> Self {
        Self {
            client: Client::new(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            api_base: mode.api_base().to_string(),
            ngn_per_usd: DEFAULT_NGN_PER_USD,
            token: Arc::new(Mutex::new(None)),
        }
    }

    /// Point the client at a different API base (test servers, proxies).
    #[must_use]
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    /// Override the naira-per-dollar conversion rate.
    #[must_use]
    pub const fn with_ngn_per_usd(mut self, rate: i64) -> Self {
        self.ngn_per_usd = rate;
        self
    }

    async fn access_token(&self) -> Result<String, GatewayError> {
        if self.client_id.is_empty() || self.client_secret.is_empty() {
            return Err(GatewayError::MissingCredentials("wallet"));
        }

        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref() {
            if token.expires_at > Instant::now() {
                return Ok(token.value.clone());
            }
        }

        tracing::debug!("Requesting wallet access token");
        let response = self
            .client
            .post(format!("{}/v1/oauth2/token", self.api_base))
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await?;

        let token = Self::parse::<TokenResponse>(response).await?;
        let lifetime = Duration::from_secs(token.expires_in.saturating_sub(60));
        *cached = Some(CachedToken {
            value: token.access_token.clone(),
            expires_at: Instant::now() + lifetime,
        });

        Ok(token.access_token)
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
                match serde_json::from_str::<ErrorResponse>(&body) {
                    Ok(error) if status == StatusCode::UNPROCESSABLE_ENTITY => {
                        let issue = error
                            .details
                            .first()
                            .map_or(error.name, |d| d.issue.clone());
                        Err(GatewayError::Declined(issue))
                    },
                    Ok(error) => Err(GatewayError::ApiError {
                        status: status.as_u16(),
                        message: error.message,
                    }),
                    Err(_) => Err(GatewayError::ApiError {
                        status: status.as_u16(),
                        message: body,
                    }),
                }
            },
        }
    }
}

impl WalletGateway for PayPalClient {
    fn create_order(&self, request: CreateWalletOrder) -> WalletFuture<'_, WalletOrder> {
        Box::pin(async move {
            let token = self.access_token().await?;
            let value = usd_amount(request.amount_minor, self.ngn_per_usd);
            tracing::debug!(order_id = %request.order_id, usd = %value, "Creating wallet order");

            let body = json!({
                "intent": "CAPTURE",
                "purchase_units": [{
                    "reference_id": request.order_id,
                    "amount": { "currency_code": "USD", "value": value },
                    "description": format!("Aso Ebi Order #{}", request.order_ref),
                }],
                "application_context": {
                    "return_url": request.return_url,
                    "cancel_url": request.cancel_url,
                },
            });

            let response = self
                .client
                .post(format!("{}/v2/checkout/orders", self.api_base))
                .bearer_auth(token)
                .json(&body)
                .send()
                .await?;

            let order = Self::parse::<OrderResponse>(response).await?;
            let approval_url = order
                .links
                .into_iter()
                .find(|link| link.rel == "approve")
                .map(|link| link.href)
                .ok_or_else(|| {
                    GatewayError::ResponseParseFailed("order has no approve link".to_string())
                })?;

            Ok(WalletOrder {
                id: order.id,
                approval_url,
            })
        })
    }

    fn capture_order<'a>(&'a self, wallet_order_id: &'a str) -> WalletFuture<'a, CaptureStatus> {
        Box::pin(async move {
            let token = self.access_token().await?;
            tracing::debug!(wallet_order_id, "Capturing wallet order");

            let response = self
                .client
                .post(format!(
                    "{}/v2/checkout/orders/{wallet_order_id}/capture",
                    self.api_base
                ))
                .bearer_auth(token)
                .json(&json!({}))
                .send()
                .await?;

            Ok(Self::parse::<CaptureResponse>(response).await?.status)
        })
    }
}
