//! Guest comments and their moderation.

use super::{decode_all, require, ServiceError, ServiceResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use wedding_core::document::{encode, Collection, DocumentStore};
use wedding_core::environment::Clock;

const RESOURCE: &str = "Comment";

/// A stored guest comment
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    /// Document id
    #[serde(default)]
    pub id: String,
    /// Author
    #[serde(default)]
    pub name: String,
    /// Message
    pub comment: String,
    /// Posted at
    pub timestamp: DateTime<Utc>,
}

/// Moderation filters; every set filter must match
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct CommentFilter {
    /// Case-insensitive substring of the message
    #[serde(default, alias = "q")]
    pub search: Option<String>,
    /// Case-insensitive substring of the author
    #[serde(default)]
    pub name: Option<String>,
    /// Posted at or after
    #[serde(default)]
    pub from: Option<DateTime<Utc>>,
    /// Posted at or before
    #[serde(default)]
    pub to: Option<DateTime<Utc>>,
}

impl CommentFilter {
    fn matches(&self, comment: &Comment) -> bool {
        let contains = |haystack: &str, needle: &Option<String>| {
            needle
                .as_deref()
                .is_none_or(|n| haystack.to_lowercase().contains(&n.to_lowercase()))
        };
        contains(&comment.comment, &self.search)
            && contains(&comment.name, &self.name)
            && self.from.is_none_or(|from| comment.timestamp >= from)
            && self.to.is_none_or(|to| comment.timestamp <= to)
    }
}

/// Comment as posted by a guest
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct NewComment {
    /// Author
    #[serde(default)]
    pub name: String,
    /// Message
    #[serde(default)]
    pub comment: String,
}

/// Comment records in the `comments` collection
#[derive(Clone)]
pub struct CommentService {
    docs: Arc<dyn DocumentStore>,
    clock: Arc<dyn Clock>,
}

impl CommentService {
    /// Create the service over a document store
    #[must_use]
    pub fn new(docs: Arc<dyn DocumentStore>, clock: Arc<dyn Clock>) -> Self {
        Self { docs, clock }
    }

    /// Post a comment.
    ///
    /// # Errors
    ///
    /// [`ServiceError::Validation`] for an empty message.
    pub async fn create(&self, comment: NewComment) -> ServiceResult<Comment> {
        require("comment", &comment.comment)?;
        let mut record = Comment {
            id: String::new(),
            name: comment.name.trim().to_string(),
            comment: comment.comment,
            timestamp: self.clock.now(),
        };
        record.id = self.docs.create(Collection::Comments, encode(&record)?).await?;
        Ok(record)
    }

    /// Matching comments, newest first.
    ///
    /// # Errors
    ///
    /// [`ServiceError::Document`] if the read fails.
    pub async fn list(&self, filter: &CommentFilter) -> ServiceResult<Vec<Comment>> {
        let docs = self.docs.list(Collection::Comments).await?;
        let mut comments: Vec<Comment> = decode_all(RESOURCE, docs);
        comments.retain(|comment| filter.matches(comment));
        comments.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(comments)
    }

    /// Edit author and message.
    ///
    /// # Errors
    ///
    /// [`ServiceError::NotFound`] if the comment does not exist.
    pub async fn update(&self, id: &str, name: &str, comment: &str) -> ServiceResult<()> {
        self.docs
            .update(Collection::Comments, id, json!({ "name": name, "comment": comment }))
            .await
            .map_err(|err| ServiceError::from_document(RESOURCE, err))
    }

    /// Remove a comment.
    ///
    /// # Errors
    ///
    /// [`ServiceError::Document`] if the delete fails.
    pub async fn delete(&self, id: &str) -> ServiceResult<()> {
        self.docs.delete(Collection::Comments, id).await?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Duration;
    use wedding_testing::{test_clock, InMemoryDocumentStore};

    fn seed(docs: &InMemoryDocumentStore) {
        let noon = test_clock().now();
        for (id, name, text, offset) in [
            ("c1", "Ada", "Congratulations to the couple!", 0),
            ("c2", "Bola", "So happy for you", 1),
            ("c3", "ada obi", "Can't wait for the party", 2),
        ] {
            docs.insert(
                Collection::Comments,
                id,
                json!({ "name": name, "comment": text, "timestamp": noon + Duration::days(offset) }),
            );
        }
    }

    fn ids(comments: &[Comment]) -> Vec<&str> {
        comments.iter().map(|c| c.id.as_str()).collect()
    }

    #[tokio::test]
    async fn filters_combine_and_sort_newest_first() {
        let docs = InMemoryDocumentStore::new();
        seed(&docs);
        let comments = CommentService::new(Arc::new(docs), Arc::new(test_clock()));

        let all = comments.list(&CommentFilter::default()).await.unwrap();
        assert_eq!(ids(&all), vec!["c3", "c2", "c1"]);

        let by_name = comments
            .list(&CommentFilter {
                name: Some("ADA".into()),
                ..CommentFilter::default()
            })
            .await
            .unwrap();
        assert_eq!(ids(&by_name), vec!["c3", "c1"]);

        let narrowed = comments
            .list(&CommentFilter {
                name: Some("ada".into()),
                search: Some("congrat".into()),
                ..CommentFilter::default()
            })
            .await
            .unwrap();
        assert_eq!(ids(&narrowed), vec!["c1"]);

        let noon = test_clock().now();
        let window = comments
            .list(&CommentFilter {
                from: Some(noon + Duration::hours(1)),
                to: Some(noon + Duration::days(1)),
                ..CommentFilter::default()
            })
            .await
            .unwrap();
        assert_eq!(ids(&window), vec!["c2"]);
    }

    #[tokio::test]
    async fn create_update_delete() {
        let docs = InMemoryDocumentStore::new();
        let comments = CommentService::new(Arc::new(docs), Arc::new(test_clock()));

        assert!(matches!(
            comments.create(NewComment::default()).await,
            Err(ServiceError::Validation(_))
        ));

        let posted = comments
            .create(NewComment {
                name: " Tolu ".into(),
                comment: "Cheers!".into(),
            })
            .await
            .unwrap();
        assert_eq!(posted.name, "Tolu");

        comments.update(&posted.id, "Tolu A.", "Cheers!!").await.unwrap();
        let listed = comments.list(&CommentFilter::default()).await.unwrap();
        assert_eq!(listed[0].comment, "Cheers!!");

        assert!(matches!(
            comments.update("missing", "x", "y").await,
            Err(ServiceError::NotFound { .. })
        ));

        comments.delete(&posted.id).await.unwrap();
        assert!(comments.list(&CommentFilter::default()).await.unwrap().is_empty());
    }
}
