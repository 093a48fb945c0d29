//! Gallery images. Files live in object storage; only their URLs are kept.

use super::{decode_all, require, ServiceResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use wedding_core::document::{encode, Collection, DocumentStore};
use wedding_core::environment::Clock;

/// A stored gallery image
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GalleryImage {
    /// Document id
    #[serde(default)]
    pub id: String,
    /// Public file URL
    pub url: String,
    /// File name
    pub name: String,
    /// Bytes
    #[serde(default)]
    pub size: u64,
    /// Upload time, epoch milliseconds
    pub uploaded_at: i64,
    /// Record creation time
    pub created_at: DateTime<Utc>,
}

/// Image registered after an upload
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewGalleryImage {
    /// Public file URL
    #[serde(default)]
    pub url: String,
    /// File name, `Untitled` if absent
    #[serde(default)]
    pub name: Option<String>,
    /// Bytes, 0 if absent
    #[serde(default)]
    pub size: Option<u64>,
}

/// Gallery records in the `gallery` collection
#[derive(Clone)]
pub struct GalleryService {
    docs: Arc<dyn DocumentStore>,
    clock: Arc<dyn Clock>,
}

impl GalleryService {
    /// Create the service over a document store
    #[must_use]
    pub fn new(docs: Arc<dyn DocumentStore>, clock: Arc<dyn Clock>) -> Self {
        Self { docs, clock }
    }

    /// Every image, newest upload first.
    ///
    /// # Errors
    ///
    /// [`super::ServiceError::Document`] if the read fails.
    pub async fn list(&self) -> ServiceResult<Vec<GalleryImage>> {
        let docs = self.docs.list(Collection::Gallery).await?;
        let mut images: Vec<GalleryImage> = decode_all("GalleryImage", docs);
        images.sort_by(|a, b| b.uploaded_at.cmp(&a.uploaded_at));
        Ok(images)
    }

    /// Register an uploaded image.
    ///
    /// # Errors
    ///
    /// [`super::ServiceError::Validation`] without a URL.
    pub async fn add(&self, image: NewGalleryImage) -> ServiceResult<GalleryImage> {
        require("url", &image.url)?;
        let now = self.clock.now();
        let mut record = GalleryImage {
            id: String::new(),
            url: image.url,
            name: image
                .name
                .filter(|name| !name.trim().is_empty())
                .unwrap_or_else(|| "Untitled".to_string()),
            size: image.size.unwrap_or(0),
            uploaded_at: now.timestamp_millis(),
            created_at: now,
        };
        record.id = self.docs.create(Collection::Gallery, encode(&record)?).await?;
        tracing::info!(id = %record.id, "Gallery image added");
        Ok(record)
    }

    /// Remove an image record.
    ///
    /// # Errors
    ///
    /// [`super::ServiceError::Document`] if the delete fails.
    pub async fn delete(&self, id: &str) -> ServiceResult<()> {
        self.docs.delete(Collection::Gallery, id).await?;
        Ok(())
    }
}
