//! Point-in-time view of what the catalog already knows.

use super::model::{DatasetId, DatasetVariableRow, Keyword};
use super::store::CatalogStore;
use crate::error::{CatalogError, Result};
use std::collections::{BTreeMap, BTreeSet};

/// A registered dataset and the variable names recorded for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KnownDataset {
    pub id: DatasetId,
    /// Variable names in store row order
    pub variables: Vec<String>,
}

/// Read-only index of datasets and keywords, loaded once per session.
///
/// The snapshot drives autocompletion and the new-vs-existing decision. It is
/// stale by the time a registration commits, so uniqueness is re-checked by
/// the store inside the commit scope rather than trusted from here.
#[derive(Debug, Clone, Default)]
pub struct CatalogSnapshot {
    datasets: BTreeMap<String, KnownDataset>,
    keywords: BTreeSet<String>,
}

impl CatalogSnapshot {
    /// Reads all keywords and the dataset/variable join in one read scope.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::CatalogUnavailable`] if the store cannot be read.
    pub async fn load(store: &dyn CatalogStore) -> Result<Self> {
        let index = store
            .load_index()
            .await
            .map_err(|e| CatalogError::CatalogUnavailable(format!("reading catalog: {e}")))?;

        let snapshot = Self::from_rows(index.dataset_variables, index.keywords);
        tracing::info!(
            datasets = snapshot.datasets.len(),
            keywords = snapshot.keywords.len(),
            "Loaded catalog snapshot"
        );
        Ok(snapshot)
    }

    /// Groups join rows by `(dataset_id, table_name)`, keeping row order
    /// within each group.
    pub fn from_rows(rows: Vec<DatasetVariableRow>, keywords: Vec<Keyword>) -> Self {
        let mut datasets: BTreeMap<String, KnownDataset> = BTreeMap::new();
        for row in rows {
            let entry = datasets
                .entry(row.table_name)
                .or_insert_with(|| KnownDataset {
                    id: row.dataset_id,
                    variables: Vec::new(),
                });
            if entry.id == row.dataset_id {
                entry.variables.push(row.variable_name);
            } else {
                tracing::warn!(
                    dataset_id = row.dataset_id,
                    "Ignoring variable row for a second dataset with the same table name"
                );
            }
        }

        Self {
            datasets,
            keywords: keywords.into_iter().map(|k| k.content).collect(),
        }
    }

    pub fn known_datasets(&self) -> &BTreeMap<String, KnownDataset> {
        &self.datasets
    }

    pub fn known_keywords(&self) -> &BTreeSet<String> {
        &self.keywords
    }

    pub fn dataset(&self, table_name: &str) -> Option<&KnownDataset> {
        self.datasets.get(table_name)
    }

    pub fn dataset_names(&self) -> Vec<String> {
        self.datasets.keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::model::EditionRecord;
    use crate::catalog::store::{CatalogIndex, CatalogTransaction};
    use crate::error::{StoreError, StoreResult};
    use async_trait::async_trait;

    /// Serves the index but fails the one-table reads, so a snapshot built
    /// from separate queries would not load.
    struct IndexOnlyStore {
        index: CatalogIndex,
    }

    fn unsupported() -> StoreError {
        StoreError::Unavailable("separate read".to_owned())
    }

    #[async_trait]
    impl CatalogStore for IndexOnlyStore {
        async fn load_index(&self) -> StoreResult<CatalogIndex> {
            Ok(self.index.clone())
        }

        async fn load_keywords(&self) -> StoreResult<Vec<Keyword>> {
            Err(unsupported())
        }

        async fn load_dataset_variables(&self) -> StoreResult<Vec<DatasetVariableRow>> {
            Err(unsupported())
        }

        async fn load_editions(&self, _dataset_id: DatasetId) -> StoreResult<Vec<EditionRecord>> {
            Err(unsupported())
        }

        async fn begin(&self) -> StoreResult<Box<dyn CatalogTransaction>> {
            Err(unsupported())
        }
    }

    fn row(id: DatasetId, table: &str, variable: &str) -> DatasetVariableRow {
        DatasetVariableRow {
            dataset_id: id,
            table_name: table.to_owned(),
            variable_name: variable.to_owned(),
        }
    }

    #[test]
    fn test_groups_rows_per_dataset() {
        let rows = vec![
            row(1, "sales_v1", "store_id"),
            row(1, "sales_v1", "amount"),
            row(2, "stores", "store_id"),
            row(1, "sales_v1", "day"),
        ];
        let keywords = vec![Keyword {
            id: 7,
            content: "retail".to_owned(),
        }];

        let snapshot = CatalogSnapshot::from_rows(rows, keywords);

        assert_eq!(
            snapshot.dataset("sales_v1"),
            Some(&KnownDataset {
                id: 1,
                variables: vec!["store_id".to_owned(), "amount".to_owned(), "day".to_owned()],
            })
        );
        assert_eq!(snapshot.dataset("stores").map(|d| d.id), Some(2));
        assert!(snapshot.known_keywords().contains("retail"));
        assert_eq!(snapshot.dataset_names(), vec!["sales_v1", "stores"]);
    }

    #[test]
    fn test_empty_catalog() {
        let snapshot = CatalogSnapshot::from_rows(Vec::new(), Vec::new());
        assert!(snapshot.known_datasets().is_empty());
        assert!(snapshot.known_keywords().is_empty());
    }

    #[tokio::test]
    async fn test_load_reads_one_index() -> Result<()> {
        let store = IndexOnlyStore {
            index: CatalogIndex {
                keywords: vec![Keyword {
                    id: 1,
                    content: "retail".to_owned(),
                }],
                dataset_variables: vec![row(4, "stores", "store_id")],
            },
        };

        let snapshot = CatalogSnapshot::load(&store).await?;

        assert_eq!(snapshot.dataset_names(), vec!["stores"]);
        assert!(snapshot.known_keywords().contains("retail"));
        Ok(())
    }
}
