//! Record services over the document store.
//!
//! Each service owns one collection and speaks in typed records; handlers
//! never touch raw documents. Sorting and filtering happen in memory after a
//! full collection read.

use std::fmt;
use thiserror::Error;
use wedding_core::document::{Document, DocumentError};
use wedding_gateways::GatewayError;
use wedding_web::AppError;

pub mod asoebi;
pub mod comments;
pub mod gallery;
pub mod headers;
pub mod orders;
pub mod payments;
pub mod rsvps;
pub mod table_groups;

pub use asoebi::AsoebiService;
pub use comments::CommentService;
pub use gallery::GalleryService;
pub use headers::HeaderService;
pub use orders::OrderService;
pub use payments::PaymentCallbacks;
pub use rsvps::RsvpService;
pub use table_groups::TableGroupService;

/// Errors from the record services
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Input rejected before anything was stored
    #[error("{0}")]
    Validation(String),

    /// Record does not exist
    #[error("{resource} with id {id} not found")]
    NotFound {
        /// Record kind
        resource: &'static str,
        /// Requested id
        id: String,
    },

    /// Storage backend failed
    #[error(transparent)]
    Document(#[from] DocumentError),

    /// Payment gateway failed
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

impl ServiceError {
    /// Validation failure with a message
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Missing record
    pub fn not_found(resource: &'static str, id: impl fmt::Display) -> Self {
        Self::NotFound {
            resource,
            id: id.to_string(),
        }
    }

    /// Re-label a storage not-found as a missing `resource`.
    #[must_use]
    pub fn from_document(resource: &'static str, err: DocumentError) -> Self {
        match err {
            DocumentError::NotFound { id, .. } => Self::NotFound { resource, id },
            other => Self::Document(other),
        }
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Validation(message) => Self::bad_request(message),
            ServiceError::NotFound { resource, id } => Self::not_found(resource, id),
            ServiceError::Document(err) => err.into(),
            ServiceError::Gateway(err) => err.into(),
        }
    }
}

/// Result type for service calls
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Decode every document, skipping (and logging) the ones that do not fit `T`.
pub(crate) fn decode_all<T>(resource: &'static str, docs: Vec<Document>) -> Vec<T>
where
    T: serde::de::DeserializeOwned,
{
    docs.into_iter()
        .filter_map(|doc| {
            let id = doc.id.clone();
            match doc.decode() {
                Ok(record) => Some(record),
                Err(error) => {
                    tracing::warn!(resource, id = %id, %error, "Skipping malformed record");
                    None
                },
            }
        })
        .collect()
}

/// Reject a blank required string.
pub(crate) fn require(field: &str, value: &str) -> ServiceResult<()> {
    if value.trim().is_empty() {
        Err(ServiceError::validation(format!("{field} is required")))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use wedding_core::document::Collection;

    #[test]
    fn not_found_from_storage_takes_the_resource_name() {
        let err = ServiceError::from_document(
            "Order",
            DocumentError::not_found(Collection::Orders, "abc"),
        );
        assert_eq!(err.to_string(), "Order with id abc not found");
    }

    #[test]
    fn maps_to_http_statuses() {
        let status = |err: ServiceError| AppError::from(err).status();
        assert_eq!(status(ServiceError::validation("x")), StatusCode::BAD_REQUEST);
        assert_eq!(status(ServiceError::not_found("Rsvp", "1")), StatusCode::NOT_FOUND);
        assert_eq!(
            status(GatewayError::RateLimited.into()),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status(DocumentError::Storage("disk".into()).into()),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn require_rejects_blank() {
        assert!(require("name", "  ").is_err());
        assert!(require("name", "Ada").is_ok());
    }
}
