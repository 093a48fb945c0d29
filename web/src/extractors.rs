//! Custom Axum extractors.
//!
//! - `CorrelationId`: the request's correlation id
//! - `SessionId`: the shopper session a cart or checkout call belongs to
//!
//! # Examples
//!
//! ```ignore
//! use wedding_web::extractors::{CorrelationId, SessionId};
//!
//! async fn get_cart(
//!     State(state): State<AppState>,
//!     session: SessionId,
//!     correlation_id: CorrelationId,
//! ) -> Result<Json<CartState>, AppError> {
//!     tracing::info!(session = %session, correlation_id = %correlation_id.0, "Reading cart");
//!     // ...
//! }
//! ```

use crate::error::AppError;
use crate::middleware::CORRELATION_ID_HEADER;
use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap},
};
use std::fmt;
use uuid::Uuid;

/// Header carrying the shopper session id.
pub const SESSION_ID_HEADER: &str = "X-Session-ID";

const MAX_SESSION_ID_LEN: usize = 128;

/// Correlation ID for request tracing.
///
/// Prefers the id stored by the correlation middleware, then the
/// `X-Correlation-ID` header, and otherwise generates a new UUID v4.
#[derive(Debug, Clone, Copy)]
pub struct CorrelationId(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for CorrelationId
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(id) = parts.extensions.get::<Self>() {
            return Ok(*id);
        }
        Ok(Self::from_headers(&parts.headers))
    }
}

impl CorrelationId {
    /// Reads `X-Correlation-ID`, falling back to a fresh v4 id when the header
    /// is missing or not a UUID.
    #[must_use]
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let id = headers
            .get(CORRELATION_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| Uuid::parse_str(s.trim()).ok())
            .unwrap_or_else(Uuid::new_v4);
        Self(id)
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Shopper session id from the `X-Session-ID` header.
///
/// Ids are opaque client-generated strings of ASCII letters, digits, `-` and
/// `_`, at most 128 characters. Anything else is rejected with 400.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(pub String);

impl SessionId {
    /// Validate a raw session id.
    ///
    /// # Errors
    ///
    /// Returns a 400 [`AppError`] if the id is empty, too long, or contains
    /// characters outside `[A-Za-z0-9_-]`.
    pub fn parse(raw: &str) -> Result<Self, AppError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(AppError::bad_request("X-Session-ID header is empty"));
        }
        if raw.len() > MAX_SESSION_ID_LEN {
            return Err(AppError::bad_request("X-Session-ID header is too long"));
        }
        if !raw
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(AppError::bad_request(
                "X-Session-ID may only contain letters, digits, '-' and '_'",
            ));
        }
        Ok(Self(raw.to_string()))
    }

    /// The raw id.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for SessionId
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(SESSION_ID_HEADER)
            .ok_or_else(|| AppError::bad_request("Missing X-Session-ID header"))?
            .to_str()
            .map_err(|_| AppError::bad_request("X-Session-ID header is not valid ASCII"))?;

        Self::parse(raw)
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;
    use axum::http::{Request, StatusCode};

    #[tokio::test]
    async fn test_correlation_id_from_header() {
        let uuid = Uuid::new_v4();
        let req = Request::builder()
            .header(CORRELATION_ID_HEADER, uuid.to_string())
            .body(())
            .expect("Valid request");

        let (mut parts, _) = req.into_parts();
        let correlation_id = CorrelationId::from_request_parts(&mut parts, &())
            .await
            .expect("Should extract");

        assert_eq!(correlation_id.0, uuid);
    }

    #[tokio::test]
    async fn test_correlation_id_prefers_extension() {
        let stored = Uuid::new_v4();
        let req = Request::builder()
            .header(CORRELATION_ID_HEADER, Uuid::new_v4().to_string())
            .body(())
            .expect("Valid request");

        let (mut parts, _) = req.into_parts();
        parts.extensions.insert(CorrelationId(stored));
        let correlation_id = CorrelationId::from_request_parts(&mut parts, &())
            .await
            .expect("Should extract");

        assert_eq!(correlation_id.0, stored);
    }

    #[tokio::test]
    async fn test_session_id_from_header() {
        let req = Request::builder()
            .header(SESSION_ID_HEADER, "guest-42_a")
            .body(())
            .expect("Valid request");

        let (mut parts, _) = req.into_parts();
        let session = SessionId::from_request_parts(&mut parts, &())
            .await
            .expect("Should extract");

        assert_eq!(session.as_str(), "guest-42_a");
    }

    #[tokio::test]
    async fn test_missing_session_id_is_bad_request() {
        let req = Request::builder().body(()).expect("Valid request");

        let (mut parts, _) = req.into_parts();
        let err = SessionId::from_request_parts(&mut parts, &())
            .await
            .expect_err("Should reject");

        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_session_id_rejects_odd_characters() {
        assert!(SessionId::parse("abc def").is_err());
        assert!(SessionId::parse("../etc").is_err());
        assert!(SessionId::parse(&"x".repeat(129)).is_err());
        assert!(SessionId::parse("  ok-1  ").is_ok());
    }
}
