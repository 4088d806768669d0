//! Registration decisions over already-gathered answers.
//!
//! Nothing here prompts. Given the session snapshot, the input file and the
//! operator's answers, these functions pick the branch, check the schema and
//! assemble the [`RegistrationPlan`].

use super::rules;
use crate::catalog::model::{NewDataset, NewEdition, NewVariable};
use crate::catalog::plan::{DatasetTarget, KeywordPlan, RegistrationPlan};
use crate::catalog::snapshot::{CatalogSnapshot, KnownDataset};
use crate::error::{CatalogError, Result};
use crate::input::InputFile;
use std::collections::{BTreeSet, HashSet};

/// Refuses a file with no columns: it would become a dataset without
/// variables, which the snapshot join never shows again.
///
/// # Errors
///
/// Returns [`CatalogError::Input`] naming the file.
pub fn require_columns(input: &InputFile) -> Result<()> {
    if input.columns.is_empty() {
        return Err(CatalogError::Input(format!(
            "{} has no columns to register",
            input.file_name
        )));
    }
    Ok(())
}

/// Which way a registration goes once the dataset name is known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Branch {
    NewDataset,
    ExistingDataset(KnownDataset),
}

pub fn choose_branch(snapshot: &CatalogSnapshot, table_name: &str) -> Branch {
    match snapshot.dataset(table_name) {
        Some(known) => Branch::ExistingDataset(known.clone()),
        None => Branch::NewDataset,
    }
}

/// Compares file columns with recorded variables as unordered sets.
///
/// # Errors
///
/// Returns [`CatalogError::SchemaMismatch`] listing recorded variables the
/// file lacks and file columns the dataset does not record.
pub fn check_schema(table_name: &str, known: &KnownDataset, input: &InputFile) -> Result<()> {
    let stored: BTreeSet<&str> = known.variables.iter().map(String::as_str).collect();
    let incoming: BTreeSet<&str> = input.columns.iter().map(|c| c.name.as_str()).collect();

    if stored == incoming {
        return Ok(());
    }

    Err(CatalogError::SchemaMismatch {
        dataset: table_name.to_owned(),
        file: input.file_name.clone(),
        missing: stored.difference(&incoming).map(|s| (*s).to_owned()).collect(),
        unexpected: incoming.difference(&stored).map(|s| (*s).to_owned()).collect(),
    })
}

/// Drops repeated keywords, keeping first occurrences in order.
pub fn dedupe_keywords(keywords: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    keywords
        .into_iter()
        .map(|k| k.trim().to_owned())
        .filter(|k| seen.insert(k.clone()))
        .collect()
}

/// Splits keywords by whether the snapshot already knows them.
pub fn partition_keywords(
    keywords: Vec<String>,
    catalog_keywords: &BTreeSet<String>,
) -> KeywordPlan {
    let (known, new) = dedupe_keywords(keywords)
        .into_iter()
        .partition(|k| catalog_keywords.contains(k));
    KeywordPlan { known, new }
}

/// Checks that the variables describe the file's columns, in file order, and
/// that every declared parent is a sibling.
///
/// # Errors
///
/// Returns [`CatalogError::ValidationRejected`] for the first offending variable.
pub fn check_variables(input: &InputFile, variables: &[NewVariable]) -> Result<()> {
    let columns = input.column_names();
    let described: Vec<&str> = variables.iter().map(|v| v.variable_name.as_str()).collect();
    if described != columns.iter().map(String::as_str).collect::<Vec<_>>() {
        return Err(CatalogError::rejected(format!(
            "Variables {described:?} do not describe the columns of {} {columns:?}",
            input.file_name
        )));
    }

    for variable in variables {
        if let Some(parent) = &variable.parent_variable
            && !rules::parent_is_valid(parent, &variable.variable_name, &columns)
        {
            return Err(CatalogError::rejected(format!(
                "{} ({}: '{parent}')",
                rules::PARENT_MESSAGE,
                variable.variable_name
            )));
        }
        if let Some(threshold) = variable.suppression_threshold
            && !threshold.is_finite()
        {
            return Err(CatalogError::rejected(format!(
                "{} ({})",
                rules::THRESHOLD_MESSAGE,
                variable.variable_name
            )));
        }
    }
    Ok(())
}

/// Plan for a dataset the catalog has not seen.
pub fn plan_new_dataset(
    snapshot: &CatalogSnapshot,
    input: &InputFile,
    dataset: NewDataset,
    variables: Vec<NewVariable>,
    keywords: Vec<String>,
    edition: NewEdition,
) -> Result<RegistrationPlan> {
    if snapshot.dataset(&dataset.table_name).is_some() {
        return Err(CatalogError::Other(format!(
            "Dataset '{}' is already registered; register an edition instead",
            dataset.table_name
        )));
    }
    require_columns(input)?;
    check_variables(input, &variables)?;

    Ok(RegistrationPlan {
        source: input.file_name.clone(),
        target: DatasetTarget::New {
            dataset,
            variables,
            keywords: partition_keywords(keywords, snapshot.known_keywords()),
        },
        edition,
    })
}

/// Plan for another edition of a registered dataset.
pub fn plan_new_edition(
    snapshot: &CatalogSnapshot,
    input: &InputFile,
    table_name: &str,
    edition: NewEdition,
) -> Result<RegistrationPlan> {
    let known = snapshot
        .dataset(table_name)
        .ok_or_else(|| CatalogError::Other(format!("Dataset '{table_name}' is not registered")))?;
    check_schema(table_name, known, input)?;

    Ok(RegistrationPlan {
        source: input.file_name.clone(),
        target: DatasetTarget::Existing {
            id: known.id,
            table_name: table_name.to_owned(),
        },
        edition,
    })
}
