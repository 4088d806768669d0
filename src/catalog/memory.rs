//! In-process catalog.
//!
//! Mirrors the constraints of the relational schema (unique `table_name`,
//! unique keyword `content`, foreign keys from variables, editions and tags)
//! so the workflow can be exercised end to end without a database. A
//! transaction holds the catalog lock for its whole lifetime and works on a
//! private copy of the tables, which replaces the shared tables only on commit.

use super::model::{
    DatasetId, DatasetRecord, DatasetVariableRow, EditionId, EditionRecord, Keyword, KeywordId,
    NewDataset, NewEdition, Tag, VariableRecord, VariableRow,
};
use super::store::{CatalogIndex, CatalogStore, CatalogTransaction};
use crate::error::{StoreError, StoreResult, WriteStage};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Full contents of an in-memory catalog.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CatalogTables {
    pub datasets: Vec<DatasetRecord>,
    pub variables: Vec<VariableRecord>,
    pub editions: Vec<EditionRecord>,
    pub keywords: Vec<Keyword>,
    pub tags: Vec<Tag>,
    last_dataset_id: DatasetId,
    last_edition_id: EditionId,
    last_keyword_id: KeywordId,
}

impl CatalogTables {
    pub fn dataset_by_name(&self, table_name: &str) -> Option<&DatasetRecord> {
        self.datasets
            .iter()
            .find(|d| d.dataset.table_name == table_name)
    }

    pub fn variables_of(&self, dataset_id: DatasetId) -> Vec<&VariableRecord> {
        self.variables
            .iter()
            .filter(|v| v.dataset_id == dataset_id)
            .collect()
    }

    pub fn editions_of(&self, dataset_id: DatasetId) -> Vec<&EditionRecord> {
        self.editions
            .iter()
            .filter(|e| e.dataset_id == dataset_id)
            .collect()
    }

    /// Datasets joined to their variables; datasets without variables drop out.
    pub fn dataset_variables(&self) -> Vec<DatasetVariableRow> {
        let mut rows = Vec::new();
        for dataset in &self.datasets {
            for variable in self.variables_of(dataset.id) {
                rows.push(DatasetVariableRow {
                    dataset_id: dataset.id,
                    table_name: dataset.dataset.table_name.clone(),
                    variable_name: variable.variable.variable_name.clone(),
                });
            }
        }
        rows
    }

    fn has_dataset(&self, id: DatasetId) -> bool {
        self.datasets.iter().any(|d| d.id == id)
    }

    fn ensure_dataset(&self, table: &'static str, id: DatasetId) -> StoreResult<()> {
        if self.has_dataset(id) {
            Ok(())
        } else {
            Err(StoreError::ForeignKeyViolation {
                table,
                column: "dataset_id",
                value: id,
            })
        }
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    tables: CatalogTables,
    fail_at: Option<WriteStage>,
    unavailable: bool,
}

/// Catalog held in process memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryCatalog {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the committed tables.
    pub async fn tables(&self) -> CatalogTables {
        self.state.lock().await.tables.clone()
    }

    /// Makes the next transaction fail when it reaches `stage`.
    pub async fn fail_at(&self, stage: WriteStage) {
        self.state.lock().await.fail_at = Some(stage);
    }

    /// Makes every read fail as if the store could not be reached.
    pub async fn set_unavailable(&self, unavailable: bool) {
        self.state.lock().await.unavailable = unavailable;
    }

    async fn readable(&self) -> StoreResult<OwnedMutexGuard<MemoryState>> {
        let guard = Arc::clone(&self.state).lock_owned().await;
        if guard.unavailable {
            return Err(StoreError::Unavailable(
                "in-memory catalog marked unavailable".to_owned(),
            ));
        }
        Ok(guard)
    }
}

#[async_trait]
impl CatalogStore for MemoryCatalog {
    async fn load_index(&self) -> StoreResult<CatalogIndex> {
        let state = self.readable().await?;
        Ok(CatalogIndex {
            keywords: state.tables.keywords.clone(),
            dataset_variables: state.tables.dataset_variables(),
        })
    }

    async fn load_keywords(&self) -> StoreResult<Vec<Keyword>> {
        Ok(self.readable().await?.tables.keywords.clone())
    }

    async fn load_dataset_variables(&self) -> StoreResult<Vec<DatasetVariableRow>> {
        Ok(self.readable().await?.tables.dataset_variables())
    }

    async fn load_editions(&self, dataset_id: DatasetId) -> StoreResult<Vec<EditionRecord>> {
        let state = self.readable().await?;
        Ok(state
            .tables
            .editions_of(dataset_id)
            .into_iter()
            .cloned()
            .collect())
    }

    async fn begin(&self) -> StoreResult<Box<dyn CatalogTransaction>> {
        let mut guard = self.readable().await?;
        let working = guard.tables.clone();
        let fail_at = guard.fail_at.take();
        Ok(Box::new(MemoryTransaction {
            guard,
            working,
            fail_at,
        }))
    }
}

struct MemoryTransaction {
    guard: OwnedMutexGuard<MemoryState>,
    working: CatalogTables,
    fail_at: Option<WriteStage>,
}

impl MemoryTransaction {
    fn check(&self, stage: WriteStage) -> StoreResult<()> {
        if self.fail_at == Some(stage) {
            Err(StoreError::Fault(stage))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl CatalogTransaction for MemoryTransaction {
    async fn insert_dataset(&mut self, dataset: &NewDataset) -> StoreResult<DatasetId> {
        self.check(WriteStage::InsertDataset)?;
        if self.working.dataset_by_name(&dataset.table_name).is_some() {
            return Err(StoreError::UniqueViolation {
                table: "datasets",
                column: "table_name",
                value: dataset.table_name.clone(),
            });
        }

        self.working.last_dataset_id += 1;
        let id = self.working.last_dataset_id;
        self.working.datasets.push(DatasetRecord {
            id,
            dataset: dataset.clone(),
        });
        Ok(id)
    }

    async fn insert_variables(
        &mut self,
        dataset_id: DatasetId,
        variables: &[VariableRow<'_>],
    ) -> StoreResult<()> {
        self.check(WriteStage::InsertVariables)?;
        self.working.ensure_dataset("variables", dataset_id)?;

        for row in variables {
            let name = &row.variable.variable_name;
            let taken = self
                .working
                .variables_of(dataset_id)
                .iter()
                .any(|v| &v.variable.variable_name == name);
            if taken {
                return Err(StoreError::UniqueViolation {
                    table: "variables",
                    column: "variable_name",
                    value: name.clone(),
                });
            }
            self.working.variables.push(VariableRecord {
                dataset_id,
                variable: row.variable.clone(),
                standard_id: row.standard_id,
            });
        }
        Ok(())
    }

    async fn keyword_ids(&mut self, contents: &[String]) -> StoreResult<Vec<Keyword>> {
        self.check(WriteStage::ResolveKeywords)?;
        Ok(self
            .working
            .keywords
            .iter()
            .filter(|k| contents.contains(&k.content))
            .cloned()
            .collect())
    }

    async fn insert_keywords(&mut self, contents: &[String]) -> StoreResult<Vec<Keyword>> {
        self.check(WriteStage::InsertKeywords)?;
        let mut inserted = Vec::with_capacity(contents.len());
        for content in contents {
            if self.working.keywords.iter().any(|k| &k.content == content) {
                return Err(StoreError::UniqueViolation {
                    table: "keywords",
                    column: "content",
                    value: content.clone(),
                });
            }
            self.working.last_keyword_id += 1;
            let keyword = Keyword {
                id: self.working.last_keyword_id,
                content: content.clone(),
            };
            self.working.keywords.push(keyword.clone());
            inserted.push(keyword);
        }
        Ok(inserted)
    }

    async fn insert_tags(
        &mut self,
        dataset_id: DatasetId,
        keyword_ids: &[KeywordId],
    ) -> StoreResult<()> {
        self.check(WriteStage::InsertTags)?;
        self.working.ensure_dataset("tags", dataset_id)?;

        for &kw_id in keyword_ids {
            if !self.working.keywords.iter().any(|k| k.id == kw_id) {
                return Err(StoreError::ForeignKeyViolation {
                    table: "tags",
                    column: "kw_id",
                    value: kw_id,
                });
            }
            let tag = Tag { dataset_id, kw_id };
            if self.working.tags.contains(&tag) {
                return Err(StoreError::UniqueViolation {
                    table: "tags",
                    column: "(dataset_id, kw_id)",
                    value: format!("({dataset_id}, {kw_id})"),
                });
            }
            self.working.tags.push(tag);
        }
        Ok(())
    }

    async fn insert_edition(
        &mut self,
        dataset_id: DatasetId,
        edition: &NewEdition,
    ) -> StoreResult<EditionId> {
        self.check(WriteStage::InsertEdition)?;
        self.working.ensure_dataset("editions", dataset_id)?;

        self.working.last_edition_id += 1;
        let id = self.working.last_edition_id;
        self.working.editions.push(EditionRecord {
            id,
            dataset_id,
            edition: edition.clone(),
        });
        Ok(id)
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        self.check(WriteStage::Commit)?;
        let Self {
            mut guard, working, ..
        } = *self;
        guard.tables = working;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> StoreResult<()> {
        Ok(())
    }
}
