//! Prometheus metrics for observability and monitoring.
//!
//! Metric collection for the site's moving parts:
//! - Store reducer and effect execution (recorded by [`crate::Store`] itself)
//! - Document store operations per collection
//! - Payment gateway calls
//! - Checkout outcomes
//! - Live shopper sessions
//!
//! The exporter does not bind its own socket; the HTTP server renders
//! [`PrometheusExporter::render`] on its `/metrics` route.
//!
//! # Example
//!
//! ```rust,no_run
//! use wedding_runtime::metrics::PrometheusExporter;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut exporter = PrometheusExporter::new();
//! exporter.install()?;
//! let text = exporter.render().unwrap_or_default();
//! # Ok(())
//! # }
//! ```

use metrics::{describe_counter, describe_gauge, describe_histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::time::Duration;
use thiserror::Error;

// Re-export metrics macros for use in other crates
pub use metrics::{counter, gauge, histogram};

/// Errors from metrics operations.
#[derive(Error, Debug)]
pub enum MetricsError {
    /// Failed to build metrics exporter
    #[error("Failed to build metrics exporter: {0}")]
    Build(String),
    /// Failed to install metrics exporter
    #[error("Failed to install metrics exporter: {0}")]
    Install(String),
}

/// Prometheus recorder installed as the global `metrics` backend.
#[derive(Clone, Default)]
pub struct PrometheusExporter {
    handle: Option<PrometheusHandle>,
}

impl PrometheusExporter {
    /// Create an exporter that has not been installed yet.
    #[must_use]
    pub const fn new() -> Self {
        Self { handle: None }
    }

    /// Register metric descriptions and install the global recorder.
    ///
    /// # Errors
    ///
    /// Returns error if the exporter cannot be built or installed. A recorder
    /// that is already installed (e.g. by another test) is not an error; the
    /// exporter is then left without a handle.
    pub fn install(&mut self) -> Result<(), MetricsError> {
        register_metrics();

        let builder = PrometheusBuilder::new()
            .set_buckets_for_metric(
                Matcher::Suffix("duration_seconds".to_string()),
                &[
                    0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
                ],
            )
            .map_err(|e| MetricsError::Build(e.to_string()))?;

        match builder.install_recorder() {
            Ok(handle) => {
                self.handle = Some(handle);
                tracing::info!("Prometheus recorder installed");
                Ok(())
            },
            Err(e) => {
                let err_msg = e.to_string();
                if err_msg.contains("already initialized") {
                    tracing::warn!("Metrics recorder already initialized, skipping re-initialization");
                    Ok(())
                } else {
                    Err(MetricsError::Install(err_msg))
                }
            },
        }
    }

    /// Render current metrics in Prometheus text format.
    ///
    /// Returns `None` if this exporter did not install the recorder.
    #[must_use]
    pub fn render(&self) -> Option<String> {
        self.handle.as_ref().map(PrometheusHandle::render)
    }
}

/// Register all metric descriptions.
fn register_metrics() {
    // Store
    describe_counter!("store.commands.total", "Total number of actions sent to stores");
    describe_histogram!(
        "store.reducer.duration_seconds",
        "Time taken to run a reducer"
    );
    describe_histogram!("store.effects.count", "Effects returned per action");
    describe_counter!("store.effects.executed", "Effects executed, by type");

    // Document store
    describe_counter!(
        "document_store_operations_total",
        "Document store operations, by collection and operation"
    );
    describe_counter!(
        "document_store_errors_total",
        "Failed document store operations"
    );
    describe_histogram!(
        "document_store_operation_duration_seconds",
        "Time taken by document store operations"
    );

    // Gateways
    describe_counter!("gateway_calls_total", "Payment gateway calls, by gateway and operation");
    describe_counter!("gateway_errors_total", "Failed payment gateway calls");
    describe_histogram!(
        "gateway_call_duration_seconds",
        "Time taken by payment gateway calls"
    );

    // Checkout
    describe_counter!("checkout_orders_created_total", "Orders created at checkout");
    describe_counter!(
        "checkout_payments_total",
        "Payment attempts, by method and outcome"
    );

    // Sessions
    describe_gauge!("shop_sessions_active", "Shopper sessions currently held in memory");
}

/// Document store metrics recorder.
pub struct DocumentStoreMetrics;

impl DocumentStoreMetrics {
    /// Record a completed operation.
    pub fn record_operation(collection: &'static str, operation: &'static str, duration: Duration) {
        counter!(
            "document_store_operations_total",
            "collection" => collection,
            "operation" => operation
        )
        .increment(1);
        histogram!("document_store_operation_duration_seconds", "operation" => operation)
            .record(duration.as_secs_f64());
    }

    /// Record a failed operation.
    pub fn record_error(collection: &'static str, operation: &'static str) {
        counter!(
            "document_store_errors_total",
            "collection" => collection,
            "operation" => operation
        )
        .increment(1);
    }
}

/// Payment gateway metrics recorder.
pub struct GatewayMetrics;

impl GatewayMetrics {
    /// Record a gateway call.
    pub fn record_call(gateway: &'static str, operation: &'static str, duration: Duration) {
        counter!("gateway_calls_total", "gateway" => gateway, "operation" => operation)
            .increment(1);
        histogram!("gateway_call_duration_seconds", "gateway" => gateway)
            .record(duration.as_secs_f64());
    }

    /// Record a failed gateway call with the kind of failure.
    pub fn record_error(gateway: &'static str, operation: &'static str, kind: &'static str) {
        counter!(
            "gateway_errors_total",
            "gateway" => gateway,
            "operation" => operation,
            "kind" => kind
        )
        .increment(1);
    }
}

/// Checkout metrics recorder.
pub struct CheckoutMetrics;

impl CheckoutMetrics {
    /// Record an order created at checkout.
    pub fn record_order_created() {
        counter!("checkout_orders_created_total").increment(1);
    }

    /// Record a payment outcome (`completed` or `failed`).
    pub fn record_payment(method: &'static str, outcome: &'static str) {
        counter!("checkout_payments_total", "method" => method, "outcome" => outcome)
            .increment(1);
    }
}

/// Session metrics recorder.
pub struct SessionMetrics;

impl SessionMetrics {
    /// Record the number of live sessions.
    #[allow(clippy::cast_precision_loss)] // session counts are small
    pub fn record_active(count: usize) {
        gauge!("shop_sessions_active").set(count as f64);
    }
}
