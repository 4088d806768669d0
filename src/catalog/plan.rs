//! The set of catalog mutations produced by one registration run.

use super::model::{DatasetId, NewDataset, NewEdition, NewVariable};

/// Keywords entered for a new dataset, split by whether the session snapshot
/// already knew them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeywordPlan {
    /// Resolved to existing ids at commit time
    pub known: Vec<String>,
    /// Inserted at commit time
    pub new: Vec<String>,
}

impl KeywordPlan {
    pub fn is_empty(&self) -> bool {
        self.known.is_empty() && self.new.is_empty()
    }

    pub fn len(&self) -> usize {
        self.known.len() + self.new.len()
    }
}

/// Which dataset an edition is attached to.
#[derive(Debug, Clone, PartialEq)]
pub enum DatasetTarget {
    /// First registration: dataset, its variables and keywords are created
    New {
        dataset: NewDataset,
        variables: Vec<NewVariable>,
        keywords: KeywordPlan,
    },
    /// Later registration: only an edition is added
    Existing { id: DatasetId, table_name: String },
}

/// Everything one run will write, applied atomically.
#[derive(Debug, Clone, PartialEq)]
pub struct RegistrationPlan {
    /// Name of the input file the plan was built from
    pub source: String,
    pub target: DatasetTarget,
    pub edition: NewEdition,
}

impl RegistrationPlan {
    pub fn table_name(&self) -> &str {
        match &self.target {
            DatasetTarget::New { dataset, .. } => &dataset.table_name,
            DatasetTarget::Existing { table_name, .. } => table_name,
        }
    }

    pub fn is_new_dataset(&self) -> bool {
        matches!(self.target, DatasetTarget::New { .. })
    }
}
