//! The registration workflow.
//!
//! One run takes one input file from "which dataset is this?" to a committed
//! [`RegistrationPlan`]:
//!
//! ```text
//! SelectDataset ─┬─> NewDatasetDetails ─> NewVariableDetails ─┬─> EditionDetails
//!                └─> ExistingSchemaCheck ─────────────────────┘         │
//!                                                    Done <─ Commit <───┘
//! ```
//!
//! States only move forward. The questions live in [`interview`], the answer
//! rules in [`rules`] and the branch and plan decisions in [`decision`]; this
//! module sequences them. Nothing touches the store until
//! [`RegistrationWorkflow::commit`].
//!
//! ## Usage
//!
//! [`register`] is the one driver for a run. Prompting blocks, so the
//! prompter is opened and used on a blocking thread:
//!
//! ```no_run
//! use catalog_capture::catalog::MemoryCatalog;
//! use catalog_capture::input::InputFile;
//! use catalog_capture::prompt::TerminalPrompter;
//! use catalog_capture::workflow;
//!
//! # async fn example() -> catalog_capture::error::Result<()> {
//! let catalog = MemoryCatalog::new();
//! let input = InputFile::read("sales.csv".as_ref())?;
//! let dataset_id = workflow::register(&catalog, input, "catalog", TerminalPrompter::new).await?;
//! # Ok(())
//! # }
//! ```

pub mod decision;
pub mod interview;
pub mod rules;

use crate::catalog::model::DatasetId;
use crate::catalog::plan::RegistrationPlan;
use crate::catalog::snapshot::CatalogSnapshot;
use crate::catalog::store::CatalogStore;
use crate::catalog::transaction::TransactionCoordinator;
use crate::error::{CatalogError, Result};
use crate::input::InputFile;
use crate::prompt::Prompter;
use decision::Branch;
use std::fmt;
use tracing::Instrument as _;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowState {
    SelectDataset,
    NewDatasetDetails,
    NewVariableDetails,
    ExistingSchemaCheck,
    EditionDetails,
    Commit,
    Done,
}

impl WorkflowState {
    /// Whether `next` directly follows `self`.
    pub fn leads_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::SelectDataset, Self::NewDatasetDetails | Self::ExistingSchemaCheck)
                | (Self::NewDatasetDetails, Self::NewVariableDetails)
                | (
                    Self::NewVariableDetails | Self::ExistingSchemaCheck,
                    Self::EditionDetails
                )
                | (Self::EditionDetails, Self::Commit)
                | (Self::Commit, Self::Done)
        )
    }
}

impl fmt::Display for WorkflowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A single registration run over one input file.
#[derive(Debug)]
pub struct RegistrationWorkflow {
    snapshot: CatalogSnapshot,
    input: InputFile,
    topic: String,
    state: WorkflowState,
}

impl RegistrationWorkflow {
    pub fn new(snapshot: CatalogSnapshot, input: InputFile, topic: impl Into<String>) -> Self {
        Self {
            snapshot,
            input,
            topic: topic.into(),
            state: WorkflowState::SelectDataset,
        }
    }

    pub fn state(&self) -> WorkflowState {
        self.state
    }

    pub fn input(&self) -> &InputFile {
        &self.input
    }

    fn advance(&mut self, next: WorkflowState) -> Result<()> {
        if !self.state.leads_to(next) {
            return Err(CatalogError::Other(format!(
                "Registration of {} cannot move from {} to {next}",
                self.input.file_name, self.state
            )));
        }
        tracing::debug!(from = %self.state, to = %next, "Workflow transition");
        self.state = next;
        Ok(())
    }

    /// Runs the interview and returns the plan to commit.
    ///
    /// For a registered dataset the schema check runs before any edition
    /// question is asked.
    ///
    /// # Errors
    ///
    /// [`CatalogError::SchemaMismatch`] when the file does not match the
    /// dataset it names, [`CatalogError::Aborted`] when the operator quits,
    /// or any prompt failure.
    pub fn interview(&mut self, prompter: &mut dyn Prompter) -> Result<RegistrationPlan> {
        decision::require_columns(&self.input)?;
        let table_name = interview::ask_dataset_name(prompter, &self.snapshot, &self.input)?;

        let plan = match decision::choose_branch(&self.snapshot, &table_name) {
            Branch::NewDataset => {
                tracing::info!(table_name, "Registering a new dataset");
                self.advance(WorkflowState::NewDatasetDetails)?;
                let answers = interview::ask_dataset_details(
                    prompter,
                    &self.snapshot,
                    &table_name,
                    &self.topic,
                )?;

                self.advance(WorkflowState::NewVariableDetails)?;
                let variables = interview::ask_variable_details(prompter, &self.input)?;

                self.advance(WorkflowState::EditionDetails)?;
                let edition = interview::ask_edition_details(prompter, &self.input)?;

                decision::plan_new_dataset(
                    &self.snapshot,
                    &self.input,
                    answers.dataset,
                    variables,
                    answers.keywords,
                    edition,
                )?
            }
            Branch::ExistingDataset(known) => {
                tracing::info!(table_name, dataset_id = known.id, "Registering a new edition");
                self.advance(WorkflowState::ExistingSchemaCheck)?;
                decision::check_schema(&table_name, &known, &self.input)?;

                self.advance(WorkflowState::EditionDetails)?;
                let edition = interview::ask_edition_details(prompter, &self.input)?;

                decision::plan_new_edition(&self.snapshot, &self.input, &table_name, edition)?
            }
        };

        self.advance(WorkflowState::Commit)?;
        Ok(plan)
    }

    /// Commits a plan produced by [`Self::interview`].
    ///
    /// # Errors
    ///
    /// [`CatalogError::CatalogWrite`] when the store rejects the plan; the
    /// catalog is left as it was.
    pub async fn commit(
        &mut self,
        coordinator: &TransactionCoordinator<'_>,
        plan: &RegistrationPlan,
    ) -> Result<DatasetId> {
        if self.state != WorkflowState::Commit {
            return Err(CatalogError::Other(format!(
                "Registration of {} is not ready to commit (state: {})",
                self.input.file_name, self.state
            )));
        }

        let dataset_id = coordinator.commit(plan).await?;
        self.advance(WorkflowState::Done)?;
        tracing::info!("{} successfully logged.", self.input.file_name);
        Ok(dataset_id)
    }
}

/// Loads the snapshot, runs one interview and commits the result.
///
/// `open_prompter` is called on a blocking thread and the whole interview
/// runs there, so a terminal prompter never stalls the runtime. The snapshot
/// read and the commit stay on the runtime.
///
/// # Errors
///
/// [`CatalogError::CatalogUnavailable`] when the snapshot cannot be read,
/// [`CatalogError::Input`] when the file has no columns, otherwise as
/// `open_prompter`, [`RegistrationWorkflow::interview`] and
/// [`RegistrationWorkflow::commit`].
pub async fn register<F, P>(
    store: &dyn CatalogStore,
    input: InputFile,
    topic: &str,
    open_prompter: F,
) -> Result<DatasetId>
where
    F: FnOnce() -> Result<P> + Send + 'static,
    P: Prompter,
{
    let span = tracing::info_span!("registration", topic, file = %input.file_name);

    let snapshot = CatalogSnapshot::load(store).instrument(span.clone()).await?;

    let interview_span = span.clone();
    let topic = topic.to_owned();
    let (mut workflow, plan) = tokio::task::spawn_blocking(move || {
        interview_span.in_scope(|| {
            let mut prompter = open_prompter()?;
            let mut workflow = RegistrationWorkflow::new(snapshot, input, topic);
            let plan = workflow.interview(&mut prompter)?;
            Ok::<_, CatalogError>((workflow, plan))
        })
    })
    .await
    .map_err(|e| CatalogError::Other(format!("Interview thread failed: {e}")))??;

    workflow
        .commit(&TransactionCoordinator::new(store), &plan)
        .instrument(span)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::InputColumn;
    use crate::prompt::ScriptedPrompter;

    fn workflow() -> RegistrationWorkflow {
        let input = InputFile::new("sales.csv", vec![InputColumn::named("store_id")], 1);
        RegistrationWorkflow::new(CatalogSnapshot::default(), input, "catalog")
    }

    #[test]
    fn test_states_only_move_forward() {
        use WorkflowState as S;
        assert!(S::SelectDataset.leads_to(S::NewDatasetDetails));
        assert!(S::SelectDataset.leads_to(S::ExistingSchemaCheck));
        assert!(S::ExistingSchemaCheck.leads_to(S::EditionDetails));
        assert!(!S::ExistingSchemaCheck.leads_to(S::NewVariableDetails));
        assert!(!S::EditionDetails.leads_to(S::SelectDataset));
        assert!(!S::Done.leads_to(S::Commit));
        assert!(!S::SelectDataset.leads_to(S::Commit));
    }

    #[test]
    fn test_interview_stops_where_the_operator_quit() {
        let mut workflow = workflow();
        let mut prompter = ScriptedPrompter::new(["sales_v1", "Daily sales"]);

        let result = workflow.interview(&mut prompter);

        assert!(matches!(result, Err(CatalogError::Prompt(_))));
        assert_eq!(workflow.state(), WorkflowState::NewDatasetDetails);
    }

    #[tokio::test]
    async fn test_commit_requires_a_finished_interview() {
        let catalog = crate::catalog::MemoryCatalog::new();
        let mut workflow = workflow();
        let plan = RegistrationPlan {
            source: "sales.csv".to_owned(),
            target: crate::catalog::DatasetTarget::Existing {
                id: 1,
                table_name: "sales_v1".to_owned(),
            },
            edition: crate::catalog::NewEdition {
                num_records: 1,
                notes: String::new(),
                publish_date: chrono::NaiveDate::MIN,
                collection_start: chrono::NaiveDate::MIN,
                collection_end: chrono::NaiveDate::MIN,
                acquisition_date: chrono::NaiveDate::MIN,
            },
        };

        let result = workflow
            .commit(&TransactionCoordinator::new(&catalog), &plan)
            .await;

        assert!(matches!(result, Err(CatalogError::Other(_))));
        assert!(catalog.tables().await.editions.is_empty());
    }
}
