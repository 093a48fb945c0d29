//! Per-page header images. At most one image per page is active.

use super::{decode_all, require, ServiceError, ServiceResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use wedding_core::document::{encode, Collection, DocumentStore};
use wedding_core::environment::Clock;

const RESOURCE: &str = "HeaderImage";

/// A stored header image
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeaderImage {
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
    /// Page the image belongs to (`home`, `guest`, `events`, ...)
    pub page_id: String,
    /// Shown on the page
    #[serde(default)]
    pub is_active: bool,
    /// Upload time, epoch milliseconds
    pub uploaded_at: i64,
    /// Record creation time
    pub created_at: DateTime<Utc>,
}

/// Header image registered after an upload
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewHeaderImage {
    /// Public file URL
    #[serde(default)]
    pub url: String,
    /// File name
    #[serde(default)]
    pub name: String,
    /// Bytes
    #[serde(default)]
    pub size: Option<u64>,
    /// Owning page
    #[serde(default)]
    pub page_id: String,
    /// Show it right away, switching off the page's other images
    #[serde(default)]
    pub is_active: bool,
}

/// Header records in the `headers` collection
#[derive(Clone)]
pub struct HeaderService {
    docs: Arc<dyn DocumentStore>,
    clock: Arc<dyn Clock>,
}

impl HeaderService {
    /// Create the service over a document store
    #[must_use]
    pub fn new(docs: Arc<dyn DocumentStore>, clock: Arc<dyn Clock>) -> Self {
        Self { docs, clock }
    }

    /// Images, optionally for one page, newest upload first.
    ///
    /// # Errors
    ///
    /// [`ServiceError::Document`] if the read fails.
    pub async fn list(&self, page_id: Option<&str>) -> ServiceResult<Vec<HeaderImage>> {
        let docs = self.docs.list(Collection::Headers).await?;
        let mut images: Vec<HeaderImage> = decode_all(RESOURCE, docs);
        if let Some(page_id) = page_id {
            images.retain(|image| image.page_id == page_id);
        }
        images.sort_by(|a, b| b.uploaded_at.cmp(&a.uploaded_at));
        Ok(images)
    }

    /// Register an uploaded header image.
    ///
    /// An image added as active replaces the page's current active image.
    ///
    /// # Errors
    ///
    /// [`ServiceError::Validation`] without url, name or page id.
    pub async fn add(&self, image: NewHeaderImage) -> ServiceResult<HeaderImage> {
        if image.url.trim().is_empty() || image.name.trim().is_empty() || image.page_id.trim().is_empty() {
            return Err(ServiceError::validation("Missing required fields: url, name, pageId"));
        }
        let now = self.clock.now();
        let mut record = HeaderImage {
            id: String::new(),
            url: image.url,
            name: image.name,
            size: image.size.unwrap_or(0),
            page_id: image.page_id,
            is_active: image.is_active,
            uploaded_at: now.timestamp_millis(),
            created_at: now,
        };
        record.id = self.docs.create(Collection::Headers, encode(&record)?).await?;
        if record.is_active {
            self.deactivate_others(&record.page_id, &record.id).await?;
        }
        tracing::info!(id = %record.id, page = %record.page_id, active = record.is_active, "Header image added");
        Ok(record)
    }

    /// Switch an image on or off.
    ///
    /// Switching one on first switches off every other active image of the
    /// same page.
    ///
    /// # Errors
    ///
    /// [`ServiceError::Validation`] for a blank page id or one the image
    /// does not belong to; [`ServiceError::NotFound`] if the image does not
    /// exist.
    #[tracing::instrument(skip(self))]
    pub async fn set_active(&self, id: &str, page_id: &str, is_active: bool) -> ServiceResult<()> {
        require("pageId", page_id)?;
        let Some(doc) = self.docs.get(Collection::Headers, id).await? else {
            return Err(ServiceError::not_found(RESOURCE, id));
        };
        let stored: HeaderImage = doc.decode()?;
        if stored.page_id != page_id {
            return Err(ServiceError::validation(format!(
                "Header image {id} belongs to page {}",
                stored.page_id
            )));
        }

        if is_active {
            self.deactivate_others(page_id, id).await?;
        }

        self.docs
            .update(Collection::Headers, id, json!({ "isActive": is_active }))
            .await
            .map_err(|err| ServiceError::from_document(RESOURCE, err))
    }

    async fn deactivate_others(&self, page_id: &str, keep: &str) -> ServiceResult<()> {
        for other in self.list(Some(page_id)).await? {
            if other.id != keep && other.is_active {
                self.docs
                    .update(Collection::Headers, &other.id, json!({ "isActive": false }))
                    .await?;
            }
        }
        Ok(())
    }

    /// Remove a header image record.
    ///
    /// # Errors
    ///
    /// [`ServiceError::Document`] if the delete fails.
    pub async fn delete(&self, id: &str) -> ServiceResult<()> {
        self.docs.delete(Collection::Headers, id).await?;
        Ok(())
    }
}
