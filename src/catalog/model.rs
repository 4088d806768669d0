//! Core records of the metadata catalog.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub type DatasetId = i32;
pub type KeywordId = i32;
pub type EditionId = i32;
pub type StandardId = i32;

/// Error returned when text is not one of an enum's wire names.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("'{value}' is not one of {expected}")]
pub struct UnknownVariant {
    pub value: String,
    pub expected: &'static str,
}

/// Declared reporting frequency of a dataset.
///
/// Stored as its lowercase wire name. New frequencies are added as new
/// variants; unknown text is never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cadence {
    Month,
    Quarter,
    Year,
    #[serde(rename = "none")]
    Unreported,
}

impl Cadence {
    pub const ALL: [Self; 4] = [Self::Month, Self::Quarter, Self::Year, Self::Unreported];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Month => "month",
            Self::Quarter => "quarter",
            Self::Year => "year",
            Self::Unreported => "none",
        }
    }
}

impl fmt::Display for Cadence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Cadence {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == wanted)
            .ok_or_else(|| UnknownVariant {
                value: s.to_owned(),
                expected: "month, quarter, year, none",
            })
    }
}

/// Storage type declared for a variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    Numeric,
    String,
    Timestamp,
}

impl DataType {
    pub const ALL: [Self; 3] = [Self::Numeric, Self::String, Self::Timestamp];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Numeric => "numeric",
            Self::String => "string",
            Self::Timestamp => "timestamp",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DataType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == wanted)
            .ok_or_else(|| UnknownVariant {
                value: s.to_owned(),
                expected: "numeric, string, timestamp",
            })
    }
}

/// Table-level description captured the first time a dataset is registered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewDataset {
    /// Unique operator-facing name
    pub table_name: String,
    pub description: String,
    pub unit_of_analysis: String,
    pub universe: String,
    pub owner: String,
    pub collector: String,
    pub collection_method: String,
    pub collection_reason: String,
    pub source_url: String,
    pub notes: String,
    pub use_conditions: String,
    pub cadence: Cadence,
    /// Application name the dataset was registered under
    pub topic: String,
}

/// A described column of a dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewVariable {
    pub variable_name: String,
    pub description: String,
    pub data_type: DataType,
    /// Name of a sibling variable, never this one
    pub parent_variable: Option<String>,
    /// Values below this floor must be hidden by downstream tools
    pub suppression_threshold: Option<f64>,
    /// Name of the standard the operator says this variable follows
    pub standard: Option<String>,
}

/// One snapshot/download of a dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewEdition {
    pub num_records: i64,
    pub notes: String,
    pub publish_date: NaiveDate,
    pub collection_start: NaiveDate,
    pub collection_end: NaiveDate,
    pub acquisition_date: NaiveDate,
}

/// A variable row as handed to the store, with its resolved standard link.
#[derive(Debug, Clone, Copy)]
pub struct VariableRow<'a> {
    pub variable: &'a NewVariable,
    pub standard_id: Option<StandardId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Keyword {
    pub id: KeywordId,
    pub content: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tag {
    pub dataset_id: DatasetId,
    pub kw_id: KeywordId,
}

/// Named external classification a variable may conform to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Standard {
    pub id: StandardId,
    pub name: String,
    pub description: Option<String>,
}

/// One row of the dataset/variable join read at session start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetVariableRow {
    pub dataset_id: DatasetId,
    pub table_name: String,
    pub variable_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetRecord {
    pub id: DatasetId,
    pub dataset: NewDataset,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableRecord {
    pub dataset_id: DatasetId,
    pub variable: NewVariable,
    pub standard_id: Option<StandardId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditionRecord {
    pub id: EditionId,
    pub dataset_id: DatasetId,
    pub edition: NewEdition,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cadence_parsing() {
        assert_eq!("Quarter".parse::<Cadence>(), Ok(Cadence::Quarter));
        assert_eq!(" none ".parse::<Cadence>(), Ok(Cadence::Unreported));
        assert!("weekly".parse::<Cadence>().is_err());
        assert_eq!(Cadence::Unreported.to_string(), "none");
    }

    #[test]
    fn test_data_type_parsing() {
        for t in DataType::ALL {
            assert_eq!(t.as_str().parse::<DataType>(), Ok(t));
        }
        let err = "integer".parse::<DataType>().unwrap_err();
        assert_eq!(err.to_string(), "'integer' is not one of numeric, string, timestamp");
    }
}
