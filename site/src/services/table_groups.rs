//! Reception tables that RSVPs point at through `tableGroupId`.

use super::{decode_all, ServiceError, ServiceResult};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use wedding_core::document::{encode, Collection, DocumentStore};

const RESOURCE: &str = "TableGroup";

/// A stored table group
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableGroup {
    /// Document id
    #[serde(default)]
    pub id: String,
    /// Number on the table card
    pub table_number: u32,
    /// Optional label (`Family`, `Colleagues`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_name: Option<String>,
}

/// Input for [`TableGroupService::create`]
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTableGroup {
    /// Number on the table card
    pub table_number: u32,
    /// Optional label
    #[serde(default)]
    pub group_name: Option<String>,
}

/// Table group records in the `tableGroups` collection
#[derive(Clone)]
pub struct TableGroupService {
    docs: Arc<dyn DocumentStore>,
}

impl TableGroupService {
    /// Create the service over a document store
    #[must_use]
    pub fn new(docs: Arc<dyn DocumentStore>) -> Self {
        Self { docs }
    }

    /// Every table, by table number.
    ///
    /// # Errors
    ///
    /// [`ServiceError::Document`] if the read fails.
    pub async fn list(&self) -> ServiceResult<Vec<TableGroup>> {
        let docs = self.docs.list(Collection::TableGroups).await?;
        let mut groups: Vec<TableGroup> = decode_all(RESOURCE, docs);
        groups.sort_by_key(|group| group.table_number);
        Ok(groups)
    }

    /// Add a table.
    ///
    /// # Errors
    ///
    /// [`ServiceError::Validation`] for table number 0.
    pub async fn create(&self, group: NewTableGroup) -> ServiceResult<TableGroup> {
        if group.table_number == 0 {
            return Err(ServiceError::validation("tableNumber must be at least 1"));
        }
        let mut record = TableGroup {
            id: String::new(),
            table_number: group.table_number,
            group_name: group.group_name.filter(|name| !name.trim().is_empty()),
        };
        record.id = self.docs.create(Collection::TableGroups, encode(&record)?).await?;
        Ok(record)
    }

    /// Fetch one table.
    ///
    /// # Errors
    ///
    /// [`ServiceError::NotFound`] if the table does not exist.
    pub async fn get(&self, id: &str) -> ServiceResult<TableGroup> {
        self.docs
            .get(Collection::TableGroups, id)
            .await?
            .ok_or_else(|| ServiceError::not_found(RESOURCE, id))?
            .decode()
            .map_err(ServiceError::from)
    }

    /// Remove a table.
    ///
    /// # Errors
    ///
    /// [`ServiceError::Document`] if the delete fails.
    pub async fn delete(&self, id: &str) -> ServiceResult<()> {
        self.docs.delete(Collection::TableGroups, id).await?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use wedding_testing::InMemoryDocumentStore;

    #[tokio::test]
    async fn tables_sort_by_number() {
        let tables = TableGroupService::new(Arc::new(InMemoryDocumentStore::new()));
        for number in [3, 1, 2] {
            tables
                .create(NewTableGroup {
                    table_number: number,
                    group_name: Some(format!("Table {number}")),
                })
                .await
                .unwrap();
        }

        let numbers: Vec<u32> = tables.list().await.unwrap().iter().map(|t| t.table_number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn get_delete_and_validation() {
        let tables = TableGroupService::new(Arc::new(InMemoryDocumentStore::new()));
        let table = tables
            .create(NewTableGroup {
                table_number: 7,
                group_name: Some("  ".into()),
            })
            .await
            .unwrap();
        assert_eq!(table.group_name, None);
        assert_eq!(tables.get(&table.id).await.unwrap(), table);

        tables.delete(&table.id).await.unwrap();
        assert!(matches!(
            tables.get(&table.id).await,
            Err(ServiceError::NotFound { .. })
        ));

        assert!(matches!(
            tables
                .create(NewTableGroup {
                    table_number: 0,
                    group_name: None
                })
                .await,
            Err(ServiceError::Validation(_))
        ));
    }
}
