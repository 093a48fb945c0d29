//! Health check endpoints.
//!
//! These endpoints are used by load balancers and monitoring systems
//! to verify service health.

use axum::{http::StatusCode, Json};
use serde::Serialize;
use std::collections::BTreeMap;
use wedding_runtime::{HealthCheck, HealthReport, HealthStatus};

/// Simple health check endpoint (for basic liveness).
///
/// Returns 200 OK to indicate the service is running.
/// This endpoint does NOT check dependencies.
///
/// ```text
/// GET /health
/// ```
#[allow(clippy::unused_async)]
pub async fn health_check() -> (StatusCode, &'static str) {
    (StatusCode::OK, "ok")
}

/// JSON body for a readiness report.
#[derive(Debug, Serialize)]
pub struct ReadinessBody {
    /// Overall status (worst of all checks)
    pub status: String,
    /// Per-component results
    pub checks: Vec<CheckBody>,
    /// RFC 3339 timestamp
    pub timestamp: String,
}

/// JSON body for one component check.
#[derive(Debug, Serialize)]
pub struct CheckBody {
    /// Component name
    pub component: String,
    /// Component status
    pub status: String,
    /// Optional detail
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Counts, thresholds and similar
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,
}

impl From<HealthCheck> for CheckBody {
    fn from(check: HealthCheck) -> Self {
        Self {
            component: check.component,
            status: check.status.to_string(),
            message: check.message,
            metadata: check.metadata.into_iter().collect(),
        }
    }
}

/// Render component checks as a readiness response.
///
/// # Status Codes
///
/// - 200 OK: Healthy or Degraded
/// - 503 Service Unavailable: Unhealthy
#[must_use]
pub fn readiness(checks: Vec<HealthCheck>) -> (StatusCode, Json<ReadinessBody>) {
    let report = HealthReport::new(checks);

    let status = match report.status {
        HealthStatus::Healthy | HealthStatus::Degraded => StatusCode::OK,
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    let body = ReadinessBody {
        status: report.status.to_string(),
        checks: report.checks.into_iter().map(CheckBody::from).collect(),
        timestamp: report.timestamp.to_rfc3339(),
    };

    (status, Json(body))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_simple_health_check() {
        let (status, body) = health_check().await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "ok");
    }

    #[test]
    fn test_degraded_is_still_ready() {
        let (status, Json(body)) = readiness(vec![
            HealthCheck::healthy("documents"),
            HealthCheck::degraded("sessions", "backlog").with_metadata("pending_effects", "150"),
        ]);

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.status, "degraded");
        assert_eq!(body.checks[1].metadata["pending_effects"], "150");
    }

    #[test]
    fn test_unhealthy_is_503() {
        let (status, Json(body)) = readiness(vec![HealthCheck::unhealthy(
            "documents",
            "storage unreachable",
        )]);

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body.checks[0].message.as_deref(), Some("storage unreachable"));
    }
}
