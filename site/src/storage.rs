//! In-process document store backing the site.
//!
//! Documents live in memory for the life of the process. Ids are 20 random
//! alphanumeric characters, the shape hosted document databases hand out,
//! so records can move to another [`DocumentStore`] backend unchanged.

use rand::distributions::Alphanumeric;
use rand::Rng;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;
use wedding_core::document::{
    merge_fields, Collection, Document, DocumentError, DocumentFuture, DocumentStore,
};
use wedding_runtime::metrics::DocumentStoreMetrics;

/// Length of generated document ids
pub const DOCUMENT_ID_LEN: usize = 20;

type Collections = HashMap<Collection, HashMap<String, Value>>;

/// Memory-backed [`DocumentStore`]
#[derive(Clone, Debug, Default)]
pub struct MemoryDocumentStore {
    collections: Arc<RwLock<Collections>>,
}

impl MemoryDocumentStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn new_id() -> String {
        rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(DOCUMENT_ID_LEN)
            .map(char::from)
            .collect()
    }
}

fn observe<T>(
    collection: Collection,
    operation: &'static str,
    start: Instant,
    result: Result<T, DocumentError>,
) -> Result<T, DocumentError> {
    DocumentStoreMetrics::record_operation(collection.as_str(), operation, start.elapsed());
    if let Err(err) = &result {
        DocumentStoreMetrics::record_error(collection.as_str(), operation);
        tracing::debug!(%collection, operation, error = %err, "Document operation failed");
    }
    result
}

impl DocumentStore for MemoryDocumentStore {
    fn create(&self, collection: Collection, data: Value) -> DocumentFuture<'_, String> {
        Box::pin(async move {
            let start = Instant::now();
            let result: Result<String, DocumentError> = async {
                let mut body = Value::Object(Map::new());
                merge_fields(&mut body, data)?;

                let mut collections = self.collections.write().await;
                let docs = collections.entry(collection).or_default();
                let mut id = Self::new_id();
                while docs.contains_key(&id) {
                    id = Self::new_id();
                }
                docs.insert(id.clone(), body);
                Ok(id)
            }
            .await;
            observe(collection, "create", start, result)
        })
    }

    fn get<'a>(
        &'a self,
        collection: Collection,
        id: &'a str,
    ) -> DocumentFuture<'a, Option<Document>> {
        Box::pin(async move {
            let start = Instant::now();
            let collections = self.collections.read().await;
            let doc = collections
                .get(&collection)
                .and_then(|docs| docs.get(id))
                .map(|body| Document::new(id.to_string(), body.clone()));
            observe(collection, "get", start, Ok(doc))
        })
    }

    fn list(&self, collection: Collection) -> DocumentFuture<'_, Vec<Document>> {
        Box::pin(async move {
            let start = Instant::now();
            let collections = self.collections.read().await;
            let docs = collections
                .get(&collection)
                .map(|docs| {
                    docs.iter()
                        .map(|(id, body)| Document::new(id.clone(), body.clone()))
                        .collect()
                })
                .unwrap_or_default();
            observe(collection, "list", start, Ok(docs))
        })
    }

    fn update<'a>(
        &'a self,
        collection: Collection,
        id: &'a str,
        patch: Value,
    ) -> DocumentFuture<'a, ()> {
        Box::pin(async move {
            let start = Instant::now();
            let mut collections = self.collections.write().await;
            let result = match collections.get_mut(&collection).and_then(|docs| docs.get_mut(id)) {
                Some(body) => merge_fields(body, patch),
                None => Err(DocumentError::not_found(collection, id)),
            };
            observe(collection, "update", start, result)
        })
    }

    fn delete<'a>(&'a self, collection: Collection, id: &'a str) -> DocumentFuture<'a, ()> {
        Box::pin(async move {
            let start = Instant::now();
            if let Some(docs) = self.collections.write().await.get_mut(&collection) {
                docs.remove(id);
            }
            observe(collection, "delete", start, Ok(()))
        })
    }
}
