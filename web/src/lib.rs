//! Axum integration for the wedding site.
//!
//! Reducers stay pure; this crate is the imperative shell around them.
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │         Imperative Shell (Axum)         │  ← HTTP, JSON, session header
//! │  - Request parsing                      │  ← Correlation ids, tracing
//! │  - Response serialization               │  ← Error mapping
//! ├─────────────────────────────────────────┤
//! │         Functional Core                 │
//! │  - Cart and checkout reducers           │
//! │  - Effect descriptions (values)         │
//! └─────────────────────────────────────────┘
//! ```
//!
//! # Request Flow
//!
//! 1. **HTTP Request** arrives at an Axum handler
//! 2. **Extract** the session id, JSON body and query
//! 3. **Build Action** and dispatch it through the session's `Store`
//! 4. **Effects** call gateways and the document store
//! 5. **Map result** (or [`AppError`]) to an HTTP response

#![forbid(unsafe_code)]
#![warn(missing_docs, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;

pub use error::AppError;
pub use extractors::{CorrelationId, SessionId, SESSION_ID_HEADER};
pub use middleware::{track_request, CORRELATION_ID_HEADER};

/// Result type alias for web handlers.
pub type WebResult<T> = Result<T, AppError>;
