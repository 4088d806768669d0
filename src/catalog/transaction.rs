//! Atomic application of a [`RegistrationPlan`].

use super::model::{DatasetId, KeywordId, VariableRow};
use super::plan::{DatasetTarget, KeywordPlan, RegistrationPlan};
use super::standards::{StandardsResolver, UnlinkedStandards};
use super::store::{CatalogStore, CatalogTransaction};
use crate::error::{CatalogError, Result, WriteStage};

/// Writes everything one registration produced inside a single store
/// transaction. Either all rows land or none do.
pub struct TransactionCoordinator<'a> {
    store: &'a dyn CatalogStore,
    standards: Box<dyn StandardsResolver + 'a>,
}

impl<'a> TransactionCoordinator<'a> {
    pub fn new(store: &'a dyn CatalogStore) -> Self {
        Self {
            store,
            standards: Box::new(UnlinkedStandards::new()),
        }
    }

    pub fn with_standards(mut self, standards: impl StandardsResolver + 'a) -> Self {
        self.standards = Box::new(standards);
        self
    }

    /// Applies the plan and returns the id of the dataset the edition belongs to.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::CatalogWrite`] naming the failing stage. The
    /// transaction is rolled back before returning, so nothing from this plan
    /// is persisted.
    pub async fn commit(&self, plan: &RegistrationPlan) -> Result<DatasetId> {
        let mut tx = self
            .store
            .begin()
            .await
            .map_err(CatalogError::write(WriteStage::Begin))?;

        match self.apply(tx.as_mut(), plan).await {
            Ok(dataset_id) => {
                tx.commit()
                    .await
                    .map_err(CatalogError::write(WriteStage::Commit))?;
                tracing::info!(
                    dataset_id,
                    table_name = plan.table_name(),
                    new_dataset = plan.is_new_dataset(),
                    "Committed registration"
                );
                Ok(dataset_id)
            }
            Err(err) => {
                tracing::warn!("Rolling back registration of {}: {err}", plan.source);
                if let Err(rollback_err) = tx.rollback().await {
                    tracing::error!("Rollback failed: {rollback_err}");
                }
                Err(err)
            }
        }
    }

    async fn apply(
        &self,
        tx: &mut dyn CatalogTransaction,
        plan: &RegistrationPlan,
    ) -> Result<DatasetId> {
        let dataset_id = match &plan.target {
            DatasetTarget::New {
                dataset,
                variables,
                keywords,
            } => {
                let dataset_id = tx
                    .insert_dataset(dataset)
                    .await
                    .map_err(CatalogError::write(WriteStage::InsertDataset))?;

                let rows: Vec<VariableRow<'_>> = variables
                    .iter()
                    .map(|variable| VariableRow {
                        variable,
                        standard_id: variable.standard.as_deref().and_then(|standard| {
                            self.standards.resolve(&variable.variable_name, standard)
                        }),
                    })
                    .collect();
                tx.insert_variables(dataset_id, &rows)
                    .await
                    .map_err(CatalogError::write(WriteStage::InsertVariables))?;

                let keyword_ids = reconcile_keywords(tx, keywords).await?;
                tx.insert_tags(dataset_id, &keyword_ids)
                    .await
                    .map_err(CatalogError::write(WriteStage::InsertTags))?;

                dataset_id
            }
            DatasetTarget::Existing { id, .. } => *id,
        };

        tx.insert_edition(dataset_id, &plan.edition)
            .await
            .map_err(CatalogError::write(WriteStage::InsertEdition))?;

        Ok(dataset_id)
    }
}

/// Resolves keywords the snapshot knew to their current ids and inserts the
/// rest. A keyword the snapshot knew that has since disappeared is inserted
/// again; one that was created by another session since the snapshot makes
/// the insert fail on the unique constraint.
async fn reconcile_keywords(
    tx: &mut dyn CatalogTransaction,
    keywords: &KeywordPlan,
) -> Result<Vec<KeywordId>> {
    let mut ids = Vec::with_capacity(keywords.len());
    let mut to_insert = keywords.new.clone();

    if !keywords.known.is_empty() {
        let found = tx
            .keyword_ids(&keywords.known)
            .await
            .map_err(CatalogError::write(WriteStage::ResolveKeywords))?;
        for content in &keywords.known {
            match found.iter().find(|k| &k.content == content) {
                Some(keyword) => ids.push(keyword.id),
                None => {
                    tracing::warn!(
                        "Keyword '{content}' vanished since the snapshot, re-creating it"
                    );
                    to_insert.push(content.clone());
                }
            }
        }
    }

    let inserted = tx
        .insert_keywords(&to_insert)
        .await
        .map_err(CatalogError::write(WriteStage::InsertKeywords))?;
    ids.extend(inserted.into_iter().map(|k| k.id));

    let mut seen = std::collections::HashSet::new();
    ids.retain(|id| seen.insert(*id));
    Ok(ids)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::memory::MemoryCatalog;
    use crate::catalog::model::{Cadence, DataType, NewDataset, NewEdition, NewVariable};
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default()
    }

    fn plan(keywords: KeywordPlan) -> RegistrationPlan {
        RegistrationPlan {
            source: "sales.csv".to_owned(),
            target: DatasetTarget::New {
                dataset: NewDataset {
                    table_name: "sales_v1".to_owned(),
                    description: "Daily sales".to_owned(),
                    unit_of_analysis: "store-day".to_owned(),
                    universe: "All stores".to_owned(),
                    owner: "Finance".to_owned(),
                    collector: "POS".to_owned(),
                    collection_method: "Export".to_owned(),
                    collection_reason: "Reporting".to_owned(),
                    source_url: String::new(),
                    notes: String::new(),
                    use_conditions: String::new(),
                    cadence: Cadence::Month,
                    topic: "catalog".to_owned(),
                },
                variables: vec![NewVariable {
                    variable_name: "amount".to_owned(),
                    description: "Sale amount".to_owned(),
                    data_type: DataType::Numeric,
                    parent_variable: None,
                    suppression_threshold: None,
                    standard: Some("ISO 4217".to_owned()),
                }],
                keywords,
            },
            edition: NewEdition {
                num_records: 3,
                notes: String::new(),
                publish_date: date(2024, 1, 31),
                collection_start: date(2023, 1, 1),
                collection_end: date(2023, 12, 31),
                acquisition_date: date(2024, 2, 1),
            },
        }
    }

    #[tokio::test]
    async fn test_vanished_known_keyword_is_recreated() -> Result<()> {
        let catalog = MemoryCatalog::new();
        let keywords = KeywordPlan {
            known: vec!["retail".to_owned()],
            new: vec!["sales".to_owned()],
        };

        let dataset_id = TransactionCoordinator::new(&catalog)
            .commit(&plan(keywords))
            .await?;

        let tables = catalog.tables().await;
        assert_eq!(tables.keywords.len(), 2);
        assert_eq!(
            tables.tags.iter().filter(|t| t.dataset_id == dataset_id).count(),
            2
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_standard_requests_reach_resolver() -> Result<()> {
        let catalog = MemoryCatalog::new();
        let resolver = UnlinkedStandards::new();

        TransactionCoordinator::new(&catalog)
            .with_standards(&resolver)
            .commit(&plan(KeywordPlan::default()))
            .await?;

        assert_eq!(
            resolver.requested(),
            vec![("amount".to_owned(), "ISO 4217".to_owned())]
        );
        let tables = catalog.tables().await;
        assert_eq!(tables.variables.len(), 1);
        assert_eq!(tables.variables[0].standard_id, None);
        Ok(())
    }

    #[tokio::test]
    async fn test_commit_failure_rolls_back() {
        let catalog = MemoryCatalog::new();
        catalog.fail_at(WriteStage::Commit).await;

        let result = TransactionCoordinator::new(&catalog)
            .commit(&plan(KeywordPlan::default()))
            .await;

        assert!(matches!(
            result,
            Err(CatalogError::CatalogWrite {
                stage: WriteStage::Commit,
                ..
            })
        ));
        assert!(catalog.tables().await.datasets.is_empty());
    }
}
