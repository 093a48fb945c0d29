//! Shopper session registry, keyed by the `X-Session-ID` header.

use crate::session::{new_session, ShopEnvironment, ShopStore};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;
use wedding_runtime::metrics::SessionMetrics;
use wedding_runtime::{HealthCheck, HealthStatus};

struct Session {
    store: ShopStore,
    last_seen: Instant,
}

/// Live shopper sessions
#[derive(Clone)]
pub struct SessionRegistry {
    env: ShopEnvironment,
    idle_timeout: Duration,
    sessions: Arc<RwLock<HashMap<String, Session>>>,
}

impl SessionRegistry {
    /// Create an empty registry; sessions idle longer than `idle_timeout`
    /// are dropped by [`Self::prune_idle`].
    #[must_use]
    pub fn new(env: ShopEnvironment, idle_timeout: Duration) -> Self {
        Self {
            env,
            idle_timeout,
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// The session's store, created on first use.
    pub async fn get_or_create(&self, session_id: &str) -> ShopStore {
        let mut sessions = self.sessions.write().await;
        if let Some(session) = sessions.get_mut(session_id) {
            session.last_seen = Instant::now();
            return session.store.clone();
        }

        let store = new_session(self.env.clone());
        sessions.insert(
            session_id.to_string(),
            Session {
                store: store.clone(),
                last_seen: Instant::now(),
            },
        );
        SessionMetrics::record_active(sessions.len());
        tracing::debug!(session_id, "Session started");
        store
    }

    /// Number of live sessions
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Whether no session is live
    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    /// Drop sessions idle past the timeout. Sessions with effects still
    /// running are kept until those finish.
    pub async fn prune_idle(&self) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        let idle_timeout = self.idle_timeout;
        sessions.retain(|_, session| {
            session.last_seen.elapsed() < idle_timeout || session.store.pending_effects() > 0
        });
        let pruned = before - sessions.len();
        SessionMetrics::record_active(sessions.len());
        if pruned > 0 {
            tracing::info!(pruned, active = sessions.len(), "Pruned idle sessions");
        }
        pruned
    }

    /// Aggregate health of every session store.
    pub async fn health(&self) -> HealthCheck {
        let sessions = self.sessions.read().await;
        let mut status = HealthStatus::Healthy;
        let mut pending = 0;
        for session in sessions.values() {
            let check = session.store.health();
            status = status.worst(check.status);
            pending += session.store.pending_effects();
        }

        let check = match status {
            HealthStatus::Healthy => HealthCheck::healthy("sessions"),
            HealthStatus::Degraded => HealthCheck::degraded("sessions", "Some sessions have an effect backlog"),
            HealthStatus::Unhealthy => HealthCheck::unhealthy("sessions", "Sessions are shutting down"),
        };
        check
            .with_metadata("active", sessions.len().to_string())
            .with_metadata("pending_effects", pending.to_string())
    }

    /// Shut every session down, waiting up to `timeout` for each one's
    /// effects. Returns how many sessions did not drain in time.
    pub async fn shutdown(&self, timeout: Duration) -> usize {
        let stores: Vec<ShopStore> = self
            .sessions
            .read()
            .await
            .values()
            .map(|session| session.store.clone())
            .collect();

        let results = futures::future::join_all(stores.iter().map(|store| store.shutdown(timeout))).await;
        let stuck = results.iter().filter(|result| result.is_err()).count();
        if stuck > 0 {
            tracing::warn!(stuck, "Sessions still had effects running at shutdown");
        }
        stuck
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::cart::CartAction;
    use crate::checkout::CheckoutEnvironment;
    use crate::services::OrderService;
    use crate::session::ShopAction;
    use wedding_testing::{test_clock, InMemoryDocumentStore, MockCardGateway, MockWalletGateway};

    fn registry(idle: Duration) -> SessionRegistry {
        let env = ShopEnvironment {
            checkout: CheckoutEnvironment {
                orders: OrderService::new(Arc::new(InMemoryDocumentStore::new()), Arc::new(test_clock())),
                card: Arc::new(MockCardGateway::new()),
                wallet: Arc::new(MockWalletGateway::new()),
                currency: "NGN".into(),
                public_base_url: "http://localhost:8080".into(),
            },
        };
        SessionRegistry::new(env, idle)
    }

    #[tokio::test]
    async fn sessions_are_isolated() {
        let sessions = registry(Duration::from_secs(60));
        let a = sessions.get_or_create("a").await;
        let b = sessions.get_or_create("b").await;

        a.send(ShopAction::Cart(CartAction::Open)).await.unwrap();

        assert!(sessions.get_or_create("a").await.state(|s| s.cart.is_open).await);
        assert!(!b.state(|s| s.cart.is_open).await);
        assert_eq!(sessions.len().await, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn idle_sessions_are_pruned() {
        let sessions = registry(Duration::from_secs(60));
        sessions.get_or_create("old").await;
        tokio::time::advance(Duration::from_secs(45)).await;
        sessions.get_or_create("fresh").await;
        tokio::time::advance(Duration::from_secs(30)).await;

        assert_eq!(sessions.prune_idle().await, 1);
        assert_eq!(sessions.len().await, 1);

        let health = sessions.health().await;
        assert_eq!(health.status, HealthStatus::Healthy);
        assert!(health.metadata.contains(&("active".to_string(), "1".to_string())));
    }

    #[tokio::test]
    async fn shutdown_marks_sessions_unhealthy() {
        let sessions = registry(Duration::from_secs(60));
        sessions.get_or_create("a").await;

        assert_eq!(sessions.shutdown(Duration::from_secs(1)).await, 0);
        assert_eq!(sessions.health().await.status, HealthStatus::Unhealthy);
    }
}
