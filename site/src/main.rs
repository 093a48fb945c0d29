//! Wedding site HTTP server.

use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use wedding_core::environment::SystemClock;
use wedding_gateways::{PayPalClient, StripeClient};
use wedding_runtime::metrics::PrometheusExporter;
use wedding_site::sessions::SessionRegistry;
use wedding_site::storage::MemoryDocumentStore;
use wedding_site::{build_router, AppState, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env is fine
    dotenvy::dotenv().ok();
    let config = Config::from_env();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.server.log_level.as_str().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(config = ?config, "Starting wedding site");

    let mut card = StripeClient::new(config.card.secret_key.clone());
    if let Some(base) = &config.card.api_base {
        card = card.with_api_base(base.clone());
    }
    let mut wallet = PayPalClient::new(
        config.wallet.client_id.clone(),
        config.wallet.client_secret.clone(),
        config.wallet.mode(),
    )
    .with_ngn_per_usd(config.wallet.ngn_per_usd);
    if let Some(base) = &config.wallet.api_base {
        wallet = wallet.with_api_base(base.clone());
    }
    if config.card.secret_key.is_empty() {
        warn!("STRIPE_SECRET_KEY not set; card payments will fail");
    }
    if config.wallet.client_id.is_empty() {
        warn!("PAYPAL_CLIENT_ID not set; wallet payments will fail");
    }

    let mut state = AppState::new(
        &config,
        Arc::new(MemoryDocumentStore::new()),
        Arc::new(SystemClock),
        Arc::new(card),
        Arc::new(wallet),
    );

    if config.server.metrics_enabled {
        let mut exporter = PrometheusExporter::new();
        exporter.install()?;
        state = state.with_metrics(exporter);
    }

    let sessions = state.sessions.clone();
    let pruner = spawn_session_pruner(sessions.clone(), config.session_idle_timeout());

    let app = build_router(state, config.request_timeout());
    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(address = %addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    pruner.abort();
    let stuck = sessions.shutdown(config.shutdown_timeout()).await;
    info!(stuck, "Server stopped");
    Ok(())
}

/// Drop idle shopper sessions every quarter of the idle timeout.
fn spawn_session_pruner(
    sessions: SessionRegistry,
    idle_timeout: std::time::Duration,
) -> tokio::task::JoinHandle<()> {
    let period = (idle_timeout / 4).max(std::time::Duration::from_secs(1));
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.tick().await;
        loop {
            ticker.tick().await;
            sessions.prune_idle().await;
        }
    })
}

/// Wait for Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            error!(error = %err, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            },
            Err(err) => {
                error!(error = %err, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received Ctrl+C, shutting down"),
        () = terminate => info!("Received SIGTERM, shutting down"),
    }
}
