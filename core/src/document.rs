//! Document storage for the site's persistent records.
//!
//! Every record the site keeps (orders, RSVPs, gallery and header images,
//! comments, direct Aso-Ebi orders and table groups) is a schemaless JSON
//! object living in a named [`Collection`]. Backends implement
//! [`DocumentStore`]; services query through it and do their filtering and
//! sorting in memory.
//!
//! Updates merge top-level fields: keys present in the patch overwrite the
//! stored ones, everything else is left alone.
//!
//! # Example
//!
//! ```ignore
//! let id = store.create(Collection::Gallery, json!({ "url": url })).await?;
//! store.update(Collection::Gallery, &id, json!({ "name": "First dance" })).await?;
//! let image: GalleryImage = store.get(Collection::Gallery, &id).await?
//!     .ok_or_else(|| DocumentError::not_found(Collection::Gallery, &id))?
//!     .decode()?;
//! ```

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;
use std::future::Future;
use std::pin::Pin;

/// Error type for document store operations.
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    /// The addressed document does not exist
    #[error("Document not found: {collection}/{id}")]
    NotFound {
        /// Collection that was searched
        collection: Collection,
        /// Document id that was requested
        id: String,
    },

    /// Storage backend error
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl DocumentError {
    /// Shorthand for [`DocumentError::NotFound`].
    #[must_use]
    pub fn not_found(collection: Collection, id: &str) -> Self {
        Self::NotFound {
            collection,
            id: id.to_string(),
        }
    }
}

impl From<serde_json::Error> for DocumentError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Result type for document store operations.
pub type Result<T> = std::result::Result<T, DocumentError>;

/// Boxed future returned by [`DocumentStore`] methods.
pub type DocumentFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'a>>;

/// Named document collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    /// Checkout orders paid through a gateway
    Orders,
    /// Guest RSVPs
    Rsvps,
    /// Gallery images
    Gallery,
    /// Per-page header images
    Headers,
    /// Guest comments
    Comments,
    /// Direct Aso-Ebi orders (no gateway)
    AsoebiOrders,
    /// Reception table groups
    TableGroups,
}

impl Collection {
    /// All collections, in a stable order.
    pub const ALL: [Self; 7] = [
        Self::Orders,
        Self::Rsvps,
        Self::Gallery,
        Self::Headers,
        Self::Comments,
        Self::AsoebiOrders,
        Self::TableGroups,
    ];

    /// Stored collection name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Orders => "orders",
            Self::Rsvps => "rsvps",
            Self::Gallery => "gallery",
            Self::Headers => "headers",
            Self::Comments => "comments",
            Self::AsoebiOrders => "asoebi_orders",
            Self::TableGroups => "tableGroups",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stored document: its id plus the JSON body.
///
/// The body never contains the `id` key; [`Document::decode`] splices it in
/// so record types can carry their id as a plain field.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Store-assigned document id
    pub id: String,
    /// JSON object body
    pub data: Value,
}

impl Document {
    /// Create a document from an id and body.
    #[must_use]
    pub const fn new(id: String, data: Value) -> Self {
        Self { id, data }
    }

    /// Read a top-level field.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.data.get(name)
    }

    /// Deserialize the document into a record type, with `id` populated.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::Serialization`] if the body does not match `T`.
    pub fn decode<T: DeserializeOwned>(self) -> Result<T> {
        let mut body = match self.data {
            Value::Object(map) => map,
            other => {
                return Err(DocumentError::Serialization(format!(
                    "document {} is not an object: {other}",
                    self.id
                )))
            },
        };
        body.insert("id".to_string(), Value::String(self.id));
        Ok(serde_json::from_value(Value::Object(body))?)
    }
}

/// Serialize a record into a document body, dropping any `id` field.
///
/// # Errors
///
/// Returns [`DocumentError::Serialization`] if `value` does not serialize to
/// a JSON object.
pub fn encode<T: Serialize>(value: &T) -> Result<Value> {
    match serde_json::to_value(value)? {
        Value::Object(mut map) => {
            map.remove("id");
            Ok(Value::Object(map))
        },
        other => Err(DocumentError::Serialization(format!(
            "expected a JSON object, got {other}"
        ))),
    }
}

/// Merge the top-level fields of `patch` into `target`.
///
/// `id` keys in the patch are ignored. A non-object patch is rejected.
///
/// # Errors
///
/// Returns [`DocumentError::Serialization`] if either side is not an object.
pub fn merge_fields(target: &mut Value, patch: Value) -> Result<()> {
    let (Value::Object(target), Value::Object(patch)) = (target, patch) else {
        return Err(DocumentError::Serialization(
            "updates must be JSON objects".to_string(),
        ));
    };
    merge_maps(target, patch);
    Ok(())
}

fn merge_maps(target: &mut Map<String, Value>, patch: Map<String, Value>) {
    for (key, value) in patch {
        if key != "id" {
            target.insert(key, value);
        }
    }
}

/// Collection-oriented JSON document storage.
///
/// Uses explicit `Pin<Box<dyn Future>>` returns so the store can be shared as
/// `Arc<dyn DocumentStore>` across services and effects.
pub trait DocumentStore: Send + Sync {
    /// Insert a new document and return its generated id.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::Storage`] if the backend fails, or
    /// [`DocumentError::Serialization`] if `data` is not an object.
    fn create(&self, collection: Collection, data: Value) -> DocumentFuture<'_, String>;

    /// Fetch a document by id.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::Storage`] if the backend fails.
    fn get<'a>(&'a self, collection: Collection, id: &'a str)
        -> DocumentFuture<'a, Option<Document>>;

    /// List every document in a collection, in no particular order.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::Storage`] if the backend fails.
    fn list(&self, collection: Collection) -> DocumentFuture<'_, Vec<Document>>;

    /// Merge `patch` into an existing document.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::NotFound`] if the document does not exist.
    fn update<'a>(
        &'a self,
        collection: Collection,
        id: &'a str,
        patch: Value,
    ) -> DocumentFuture<'a, ()>;

    /// Delete a document. Deleting a missing document is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::Storage`] if the backend fails.
    fn delete<'a>(&'a self, collection: Collection, id: &'a str) -> DocumentFuture<'a, ()>;

    /// List documents whose top-level `field` equals `value`.
    ///
    /// Default implementation filters [`DocumentStore::list`] in memory.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::Storage`] if the backend fails.
    fn find<'a>(
        &'a self,
        collection: Collection,
        field: &'a str,
        value: Value,
    ) -> DocumentFuture<'a, Vec<Document>> {
        Box::pin(async move {
            let docs = self.list(collection).await?;
            Ok(docs
                .into_iter()
                .filter(|doc| doc.field(field) == Some(&value))
                .collect())
        })
    }
}
