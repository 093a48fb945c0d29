//! Configuration management for the wedding site.
//!
//! Loads configuration from environment variables with sensible defaults.
//! A `.env` file is honoured by the binary before this runs.

use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;
use wedding_gateways::wallet::DEFAULT_NGN_PER_USD;
use wedding_gateways::WalletMode;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// HTTP server configuration
    pub server: ServerConfig,
    /// Card gateway configuration
    pub card: CardConfig,
    /// Wallet gateway configuration
    pub wallet: WalletConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,
    /// Port to bind to
    pub port: u16,
    /// Default log filter when `RUST_LOG` is unset
    pub log_level: String,
    /// Whether to install the Prometheus recorder and serve `/metrics`
    pub metrics_enabled: bool,
    /// Graceful shutdown timeout in seconds
    pub shutdown_timeout: u64,
    /// Per-request timeout in seconds
    pub request_timeout: u64,
    /// Shopper sessions idle longer than this many seconds are pruned
    pub session_idle_timeout: u64,
    /// Public origin used for wallet return and cancel links
    pub public_base_url: String,
}

/// Card gateway configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct CardConfig {
    /// Secret API key (empty when unconfigured)
    pub secret_key: String,
    /// API base URL override
    pub api_base: Option<String>,
    /// Lower-case ISO currency for intents
    pub currency: String,
}

/// Wallet gateway configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct WalletConfig {
    /// OAuth client id (empty when unconfigured)
    pub client_id: String,
    /// OAuth client secret (empty when unconfigured)
    pub client_secret: String,
    /// `sandbox` or `live`
    pub mode: String,
    /// API base URL override
    pub api_base: Option<String>,
    /// Fixed naira per dollar conversion rate
    pub ngn_per_usd: i64,
}

impl std::fmt::Debug for CardConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CardConfig")
            .field("secret_key", &redact(&self.secret_key))
            .field("api_base", &self.api_base)
            .field("currency", &self.currency)
            .finish()
    }
}

impl std::fmt::Debug for WalletConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalletConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &redact(&self.client_secret))
            .field("mode", &self.mode)
            .field("api_base", &self.api_base)
            .field("ngn_per_usd", &self.ngn_per_usd)
            .finish()
    }
}

const fn redact(secret: &str) -> &'static str {
    if secret.is_empty() {
        "<unset>"
    } else {
        "<redacted>"
    }
}

impl Config {
    /// Load configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    ///
    /// Unparseable numbers fall back to their defaults.
    #[must_use]
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let string = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());
        let optional = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let host = string("HOST", "0.0.0.0");
        let port = lookup("PORT").and_then(|s| s.parse().ok()).unwrap_or(8080);

        Self {
            server: ServerConfig {
                public_base_url: optional("PUBLIC_BASE_URL")
                    .unwrap_or_else(|| format!("http://localhost:{port}"))
                    .trim_end_matches('/')
                    .to_string(),
                host,
                port,
                log_level: string("RUST_LOG", "wedding_site=info,tower_http=debug"),
                metrics_enabled: lookup("METRICS_ENABLED")
                    .map_or(true, |s| !matches!(s.as_str(), "0" | "false" | "no")),
                shutdown_timeout: lookup("SHUTDOWN_TIMEOUT")
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30),
                request_timeout: lookup("REQUEST_TIMEOUT")
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30),
                session_idle_timeout: lookup("SESSION_IDLE_TIMEOUT")
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(3600),
            },
            card: CardConfig {
                secret_key: string("STRIPE_SECRET_KEY", ""),
                api_base: optional("STRIPE_API_BASE"),
                currency: string("STRIPE_CURRENCY", "ngn").to_ascii_lowercase(),
            },
            wallet: WalletConfig {
                client_id: string("PAYPAL_CLIENT_ID", ""),
                client_secret: string("PAYPAL_CLIENT_SECRET", ""),
                mode: string("PAYPAL_MODE", "sandbox"),
                api_base: optional("PAYPAL_API_BASE"),
                ngn_per_usd: lookup("NGN_PER_USD")
                    .and_then(|s| s.parse().ok())
                    .filter(|rate: &i64| *rate > 0)
                    .unwrap_or(DEFAULT_NGN_PER_USD),
            },
        }
    }

    /// Socket address string to bind.
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Graceful shutdown timeout.
    #[must_use]
    pub const fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.server.shutdown_timeout)
    }

    /// Per-request timeout.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.server.request_timeout)
    }

    /// Idle time after which a shopper session is pruned.
    #[must_use]
    pub const fn session_idle_timeout(&self) -> Duration {
        Duration::from_secs(self.server.session_idle_timeout)
    }
}

impl WalletConfig {
    /// Parsed gateway mode.
    #[must_use]
    pub fn mode(&self) -> WalletMode {
        WalletMode::parse(&self.mode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults() {
        let config = config(&[]);
        assert_eq!(config.bind_address(), "0.0.0.0:8080");
        assert_eq!(config.server.public_base_url, "http://localhost:8080");
        assert!(config.server.metrics_enabled);
        assert_eq!(config.card.currency, "ngn");
        assert_eq!(config.wallet.ngn_per_usd, 1500);
        assert_eq!(config.wallet.mode(), WalletMode::Sandbox);
        assert_eq!(config.shutdown_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn overrides_and_bad_numbers() {
        let config = config(&[
            ("PORT", "3000"),
            ("METRICS_ENABLED", "false"),
            ("PUBLIC_BASE_URL", "https://wedding.example/"),
            ("PAYPAL_MODE", "live"),
            ("NGN_PER_USD", "not-a-number"),
            ("STRIPE_CURRENCY", "NGN"),
        ]);
        assert_eq!(config.server.port, 3000);
        assert!(!config.server.metrics_enabled);
        assert_eq!(config.server.public_base_url, "https://wedding.example");
        assert_eq!(config.wallet.mode(), WalletMode::Live);
        assert_eq!(config.wallet.ngn_per_usd, 1500);
        assert_eq!(config.card.currency, "ngn");
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let config = config(&[("STRIPE_SECRET_KEY", "sk_live_123")]);
        let debug = format!("{:?}", config.card);
        assert!(!debug.contains("sk_live_123"));
        assert!(debug.contains("<redacted>"));
    }
}
