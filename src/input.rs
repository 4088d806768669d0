//! Reading the tabular file being registered.
//!
//! Only column names and the row count feed the registration decision. A few
//! example values per column are kept so the operator can see what a column
//! holds while describing it.

use crate::error::{CatalogError, Result};
use polars::prelude::*;
use std::path::Path;

/// Example values shown per column.
pub const PREVIEW_ROWS: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputColumn {
    pub name: String,
    pub examples: Vec<String>,
}

impl InputColumn {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            examples: Vec::new(),
        }
    }
}

/// Shape of a tabular input file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputFile {
    /// File name without directories, used in logs and diagnostics
    pub file_name: String,
    /// Columns in file order
    pub columns: Vec<InputColumn>,
    pub row_count: usize,
}

impl InputFile {
    pub fn new(file_name: impl Into<String>, columns: Vec<InputColumn>, row_count: usize) -> Self {
        Self {
            file_name: file_name.into(),
            columns,
            row_count,
        }
    }

    /// Reads a CSV, Parquet or JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Input`] for unsupported extensions or files
    /// polars cannot parse.
    pub fn read(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or("")
            .to_lowercase();

        let df = match ext.as_str() {
            "csv" => LazyCsvReader::new(path)
                .with_infer_schema_length(Some(10000))
                .with_has_header(true)
                .finish()?
                .collect()?,
            "parquet" => ParquetReader::new(std::fs::File::open(path)?).finish()?,
            "json" => JsonReader::new(std::fs::File::open(path)?).finish()?,
            _ => {
                return Err(CatalogError::Input(format!(
                    "Unsupported file extension '{ext}' for {}",
                    path.display()
                )));
            }
        };

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        let input = Self::from_dataframe(file_name, &df)?;
        tracing::info!(
            file = %input.file_name,
            rows = input.row_count,
            columns = input.columns.len(),
            "Read input file"
        );
        Ok(input)
    }

    /// # Errors
    ///
    /// Returns [`CatalogError::Input`] when the frame has no columns.
    pub fn from_dataframe(file_name: impl Into<String>, df: &DataFrame) -> Result<Self> {
        let file_name = file_name.into();
        if df.width() == 0 {
            return Err(CatalogError::Input(format!("{file_name} has no columns")));
        }

        let mut columns = Vec::with_capacity(df.width());
        for column in df.get_columns() {
            let series = column.as_materialized_series();
            let mut examples = Vec::new();
            for idx in 0..series.len().min(PREVIEW_ROWS) {
                examples.push(series.get(idx)?.to_string());
            }
            columns.push(InputColumn {
                name: column.name().as_str().to_owned(),
                examples,
            });
        }

        Ok(Self::new(file_name, columns, df.height()))
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    /// Names of every column except `name`.
    pub fn other_columns(&self, name: &str) -> Vec<String> {
        self.columns
            .iter()
            .filter(|c| c.name != name)
            .map(|c| c.name.clone())
            .collect()
    }
}
