//! Application state shared by every handler.

use crate::checkout::CheckoutEnvironment;
use crate::config::Config;
use crate::services::{
    AsoebiService, CommentService, GalleryService, HeaderService, OrderService, PaymentCallbacks,
    RsvpService, TableGroupService,
};
use crate::session::ShopEnvironment;
use crate::sessions::SessionRegistry;
use axum::extract::FromRef;
use std::sync::Arc;
use std::time::{Duration, Instant};
use wedding_core::document::{Collection, DocumentStore};
use wedding_core::environment::Clock;
use wedding_gateways::{CardGateway, WalletGateway};
use wedding_runtime::metrics::PrometheusExporter;
use wedding_runtime::HealthCheck;

/// Everything handlers need, cheap to clone
#[derive(Clone)]
pub struct AppState {
    /// Shopper sessions (cart + checkout stores)
    pub sessions: SessionRegistry,
    /// Checkout orders
    pub orders: OrderService,
    /// Gateway status callbacks
    pub payments: PaymentCallbacks,
    /// RSVPs
    pub rsvps: RsvpService,
    /// Gallery images
    pub gallery: GalleryService,
    /// Header images
    pub headers: HeaderService,
    /// Guest comments
    pub comments: CommentService,
    /// Reception tables
    pub table_groups: TableGroupService,
    /// Direct Aso-Ebi orders
    pub asoebi: AsoebiService,
    /// Backing store, probed by readiness checks
    pub docs: Arc<dyn DocumentStore>,
    /// Prometheus renderer, when metrics are enabled
    pub metrics: Option<Arc<PrometheusExporter>>,
    /// How long a shop request waits for its checkout step to finish
    pub checkout_wait: Duration,
}

impl AppState {
    /// Wire services and sessions over the given backends.
    #[must_use]
    pub fn new(
        config: &Config,
        docs: Arc<dyn DocumentStore>,
        clock: Arc<dyn Clock>,
        card: Arc<dyn CardGateway>,
        wallet: Arc<dyn WalletGateway>,
    ) -> Self {
        let orders = OrderService::new(Arc::clone(&docs), Arc::clone(&clock));
        let shop = ShopEnvironment {
            checkout: CheckoutEnvironment {
                orders: orders.clone(),
                card,
                wallet,
                currency: config.card.currency.clone(),
                public_base_url: config.server.public_base_url.clone(),
            },
        };

        Self {
            sessions: SessionRegistry::new(shop, config.session_idle_timeout()),
            payments: PaymentCallbacks::new(orders.clone()),
            orders,
            rsvps: RsvpService::new(Arc::clone(&docs), Arc::clone(&clock)),
            gallery: GalleryService::new(Arc::clone(&docs), Arc::clone(&clock)),
            headers: HeaderService::new(Arc::clone(&docs), Arc::clone(&clock)),
            comments: CommentService::new(Arc::clone(&docs), Arc::clone(&clock)),
            table_groups: TableGroupService::new(Arc::clone(&docs)),
            asoebi: AsoebiService::new(Arc::clone(&docs), clock),
            docs,
            metrics: None,
            // Leave the request timeout room to render the checkout error
            checkout_wait: config
                .request_timeout()
                .saturating_sub(Duration::from_secs(1))
                .max(Duration::from_secs(1)),
        }
    }

    /// Serve `/metrics` from this exporter.
    #[must_use]
    pub fn with_metrics(mut self, exporter: PrometheusExporter) -> Self {
        self.metrics = Some(Arc::new(exporter));
        self
    }

    /// Override how long shop requests wait on checkout effects.
    #[must_use]
    pub const fn with_checkout_wait(mut self, wait: Duration) -> Self {
        self.checkout_wait = wait;
        self
    }

    /// Probe the document store with a cheap read.
    pub async fn document_store_health(&self) -> HealthCheck {
        let start = Instant::now();
        match self.docs.list(Collection::TableGroups).await {
            Ok(_) => HealthCheck::healthy("document_store")
                .with_metadata("probe_ms", start.elapsed().as_millis().to_string()),
            Err(err) => HealthCheck::unhealthy("document_store", err.to_string()),
        }
    }
}

impl FromRef<AppState> for SessionRegistry {
    fn from_ref(state: &AppState) -> Self {
        state.sessions.clone()
    }
}
