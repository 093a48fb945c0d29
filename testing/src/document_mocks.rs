//! In-memory document store testing utilities
//!
//! - [`InMemoryDocumentStore`]: HashMap-backed storage with predictable ids
//! - [`FailingDocumentStore`]: every call fails, for error-path tests

#![allow(clippy::unwrap_used)] // Test infrastructure uses unwrap for simplicity
#![allow(clippy::missing_panics_doc)] // Test utilities document panics where critical

use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use wedding_core::document::{
    merge_fields, Collection, Document, DocumentError, DocumentFuture, DocumentStore,
};

type Collections = HashMap<Collection, HashMap<String, Value>>;

/// In-memory document store for fast, deterministic testing.
///
/// Ids are handed out as `doc-1`, `doc-2`, ... across all collections, so
/// tests can assert on them directly.
///
/// # Example
///
/// ```
/// use wedding_testing::InMemoryDocumentStore;
/// use wedding_core::document::{Collection, DocumentStore};
/// use serde_json::json;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = InMemoryDocumentStore::new();
/// let id = store.create(Collection::Comments, json!({ "text": "Congrats!" })).await?;
/// assert_eq!(id, "doc-1");
/// assert_eq!(store.len(Collection::Comments), 1);
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug, Default)]
pub struct InMemoryDocumentStore {
    data: Arc<RwLock<Collections>>,
    next_id: Arc<AtomicU64>,
}

impl InMemoryDocumentStore {
    /// Create a new empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a document under a chosen id, replacing any existing one.
    ///
    /// Useful for seeding legacy records that a service would never create.
    pub fn insert(&self, collection: Collection, id: &str, data: Value) {
        self.data
            .write()
            .unwrap()
            .entry(collection)
            .or_default()
            .insert(id.to_string(), data);
    }

    /// Raw body of a stored document
    #[must_use]
    pub fn body(&self, collection: Collection, id: &str) -> Option<Value> {
        self.data
            .read()
            .unwrap()
            .get(&collection)
            .and_then(|docs| docs.get(id))
            .cloned()
    }

    /// Number of documents in a collection
    #[must_use]
    pub fn len(&self, collection: Collection) -> usize {
        self.data
            .read()
            .unwrap()
            .get(&collection)
            .map_or(0, HashMap::len)
    }

    /// Whether a collection has no documents
    #[must_use]
    pub fn is_empty(&self, collection: Collection) -> bool {
        self.len(collection) == 0
    }
}

impl DocumentStore for InMemoryDocumentStore {
    fn create(&self, collection: Collection, data: Value) -> DocumentFuture<'_, String> {
        Box::pin(async move {
            if !data.is_object() {
                return Err(DocumentError::Serialization(
                    "document body must be a JSON object".to_string(),
                ));
            }
            let id = format!("doc-{}", self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
            let mut body = Value::Object(serde_json::Map::new());
            merge_fields(&mut body, data)?;
            self.insert(collection, &id, body);
            Ok(id)
        })
    }

    fn get<'a>(
        &'a self,
        collection: Collection,
        id: &'a str,
    ) -> DocumentFuture<'a, Option<Document>> {
        Box::pin(async move {
            Ok(self
                .body(collection, id)
                .map(|data| Document::new(id.to_string(), data)))
        })
    }

    fn list(&self, collection: Collection) -> DocumentFuture<'_, Vec<Document>> {
        Box::pin(async move {
            let data = self.data.read().unwrap();
            Ok(data
                .get(&collection)
                .map(|docs| {
                    docs.iter()
                        .map(|(id, body)| Document::new(id.clone(), body.clone()))
                        .collect()
                })
                .unwrap_or_default())
        })
    }

    fn update<'a>(
        &'a self,
        collection: Collection,
        id: &'a str,
        patch: Value,
    ) -> DocumentFuture<'a, ()> {
        Box::pin(async move {
            let mut data = self.data.write().unwrap();
            let body = data
                .get_mut(&collection)
                .and_then(|docs| docs.get_mut(id))
                .ok_or_else(|| DocumentError::not_found(collection, id))?;
            merge_fields(body, patch)
        })
    }

    fn delete<'a>(&'a self, collection: Collection, id: &'a str) -> DocumentFuture<'a, ()> {
        Box::pin(async move {
            if let Some(docs) = self.data.write().unwrap().get_mut(&collection) {
                docs.remove(id);
            }
            Ok(())
        })
    }
}

/// Document store whose every operation fails with a storage error.
///
/// ```
/// use wedding_testing::FailingDocumentStore;
/// use wedding_core::document::{Collection, DocumentError, DocumentStore};
///
/// # async fn example() {
/// let store = FailingDocumentStore::new("disk full");
/// let err = store.list(Collection::Orders).await.unwrap_err();
/// assert!(matches!(err, DocumentError::Storage(msg) if msg == "disk full"));
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct FailingDocumentStore {
    message: String,
}

impl FailingDocumentStore {
    /// Create a store that fails with `message`
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    fn error(&self) -> DocumentError {
        DocumentError::Storage(self.message.clone())
    }
}

impl DocumentStore for FailingDocumentStore {
    fn create(&self, _collection: Collection, _data: Value) -> DocumentFuture<'_, String> {
        Box::pin(async move { Err(self.error()) })
    }

    fn get<'a>(
        &'a self,
        _collection: Collection,
        _id: &'a str,
    ) -> DocumentFuture<'a, Option<Document>> {
        Box::pin(async move { Err(self.error()) })
    }

    fn list(&self, _collection: Collection) -> DocumentFuture<'_, Vec<Document>> {
        Box::pin(async move { Err(self.error()) })
    }

    fn update<'a>(
        &'a self,
        _collection: Collection,
        _id: &'a str,
        _patch: Value,
    ) -> DocumentFuture<'a, ()> {
        Box::pin(async move { Err(self.error()) })
    }

    fn delete<'a>(&'a self, _collection: Collection, _id: &'a str) -> DocumentFuture<'a, ()> {
        Box::pin(async move { Err(self.error()) })
    }
}
