//! Storage capability behind the catalog.
//!
//! The workflow never talks to a database directly. Reads for the session
//! snapshot go through [`CatalogStore`]; every write happens inside one
//! [`CatalogTransaction`] opened by the
//! [`TransactionCoordinator`](super::TransactionCoordinator).

use super::model::{
    DatasetId, DatasetVariableRow, EditionId, EditionRecord, Keyword, KeywordId, NewDataset,
    NewEdition, VariableRow,
};
use crate::error::StoreResult;
use async_trait::async_trait;

/// Keywords and the dataset/variable join as of one point in time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogIndex {
    pub keywords: Vec<Keyword>,
    pub dataset_variables: Vec<DatasetVariableRow>,
}

/// Durable storage for datasets, variables, editions, keywords and tags.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Keywords and the dataset/variable join read together, so neither
    /// reflects a write the other missed.
    async fn load_index(&self) -> StoreResult<CatalogIndex>;

    /// All keyword rows.
    async fn load_keywords(&self) -> StoreResult<Vec<Keyword>>;

    /// Datasets joined to their variables, ordered by dataset then variable.
    async fn load_dataset_variables(&self) -> StoreResult<Vec<DatasetVariableRow>>;

    /// Editions registered for one dataset, oldest first.
    async fn load_editions(&self, dataset_id: DatasetId) -> StoreResult<Vec<EditionRecord>>;

    /// Opens a transactional scope. Nothing written through it is visible
    /// until [`CatalogTransaction::commit`] succeeds.
    async fn begin(&self) -> StoreResult<Box<dyn CatalogTransaction>>;
}

/// One open write scope against a [`CatalogStore`].
#[async_trait]
pub trait CatalogTransaction: Send {
    async fn insert_dataset(&mut self, dataset: &NewDataset) -> StoreResult<DatasetId>;

    async fn insert_variables(
        &mut self,
        dataset_id: DatasetId,
        variables: &[VariableRow<'_>],
    ) -> StoreResult<()>;

    /// Looks up keywords by content. Contents without a row are omitted.
    async fn keyword_ids(&mut self, contents: &[String]) -> StoreResult<Vec<Keyword>>;

    /// Inserts keywords and returns them with their assigned ids.
    async fn insert_keywords(&mut self, contents: &[String]) -> StoreResult<Vec<Keyword>>;

    async fn insert_tags(
        &mut self,
        dataset_id: DatasetId,
        keyword_ids: &[KeywordId],
    ) -> StoreResult<()>;

    async fn insert_edition(
        &mut self,
        dataset_id: DatasetId,
        edition: &NewEdition,
    ) -> StoreResult<EditionId>;

    async fn commit(self: Box<Self>) -> StoreResult<()>;

    async fn rollback(self: Box<Self>) -> StoreResult<()>;
}
