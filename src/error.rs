//! Centralized error handling for catalog registration.
//!
//! Errors fall into two families:
//!
//! - [`StoreError`]: what a [`CatalogStore`](crate::catalog::CatalogStore)
//!   backend reports (constraint violations, driver failures).
//! - [`CatalogError`]: what a registration run reports to the operator. Store
//!   errors are wrapped into [`CatalogError::CatalogUnavailable`] when the
//!   snapshot cannot be read and into [`CatalogError::CatalogWrite`] when the
//!   commit fails.
//!
//! ```
//! use catalog_capture::error::CatalogError;
//!
//! fn diagnose(err: &CatalogError) -> &'static str {
//!     match err {
//!         CatalogError::SchemaMismatch { .. } => "rename the columns upstream and retry",
//!         CatalogError::CatalogWrite { .. } => "nothing was written",
//!         CatalogError::Aborted => "cancelled",
//!         _ => "see log",
//!     }
//! }
//! ```
//!
//! [`CatalogError::ValidationRejected`] is produced by prompt validators and
//! consumed by the prompter that asked the question; it only escapes a run
//! when answers are fed straight into the decision logic.

use std::fmt;

/// The step of a commit that was executing when a write failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WriteStage {
    Begin,
    InsertDataset,
    InsertVariables,
    ResolveKeywords,
    InsertKeywords,
    InsertTags,
    InsertEdition,
    Commit,
}

impl fmt::Display for WriteStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Begin => "opening the transaction",
            Self::InsertDataset => "inserting the dataset",
            Self::InsertVariables => "inserting variables",
            Self::ResolveKeywords => "resolving existing keywords",
            Self::InsertKeywords => "inserting new keywords",
            Self::InsertTags => "tagging the dataset",
            Self::InsertEdition => "inserting the edition",
            Self::Commit => "committing",
        };
        f.write_str(label)
    }
}

/// Errors reported by catalog store backends.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Driver-level failure from the relational engine
    #[error(transparent)]
    Database(#[from] sqlx::Error),

    /// A uniqueness constraint rejected the row
    #[error("duplicate value for {table}.{column}: '{value}'")]
    UniqueViolation {
        table: &'static str,
        column: &'static str,
        value: String,
    },

    /// A foreign key pointed at a missing row
    #[error("{table}.{column} references missing row {value}")]
    ForeignKeyViolation {
        table: &'static str,
        column: &'static str,
        value: i32,
    },

    /// The backend cannot be reached
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// Failure injected into an in-memory catalog
    #[error("injected failure while {0}")]
    Fault(WriteStage),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Main error type for registration runs.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// The catalog could not be read when the session started
    #[error("Catalog unavailable: {0}")]
    CatalogUnavailable(String),

    /// Incoming file columns differ from the dataset's recorded variables
    #[error(
        "The column names of {file} don't match the variables of dataset '{dataset}' \
         (missing: {missing:?}, unexpected: {unexpected:?}). Rename these columns \
         before registering the file again."
    )]
    SchemaMismatch {
        dataset: String,
        file: String,
        missing: Vec<String>,
        unexpected: Vec<String>,
    },

    /// A single answer failed its validator
    #[error("{message}")]
    ValidationRejected { message: String },

    /// A write inside the commit scope failed; the scope was rolled back
    #[error("Catalog write failed while {stage}: {source}")]
    CatalogWrite {
        stage: WriteStage,
        #[source]
        source: StoreError,
    },

    /// I/O errors (file operations, terminal, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The input file could not be read as a table
    #[error("Input file error: {0}")]
    Input(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// The prompt layer failed
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// Operation aborted by the operator
    #[error("Operation aborted by user")]
    Aborted,

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl CatalogError {
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::ValidationRejected {
            message: message.into(),
        }
    }

    /// Wraps a store error raised during the given commit stage.
    pub fn write(stage: WriteStage) -> impl FnOnce(StoreError) -> Self {
        move |source| Self::CatalogWrite { stage, source }
    }
}

impl From<polars::error::PolarsError> for CatalogError {
    fn from(err: polars::error::PolarsError) -> Self {
        Self::Input(err.to_string())
    }
}

impl From<toml::de::Error> for CatalogError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<rustyline::error::ReadlineError> for CatalogError {
    fn from(err: rustyline::error::ReadlineError) -> Self {
        use rustyline::error::ReadlineError;
        match err {
            ReadlineError::Interrupted | ReadlineError::Eof => Self::Aborted,
            ReadlineError::Io(e) => Self::Io(e),
            other => Self::Prompt(other.to_string()),
        }
    }
}

/// Result type alias for catalog operations.
pub type Result<T> = std::result::Result<T, CatalogError>;

/// Extension trait to add context to results.
pub trait ResultExt<T> {
    /// Add context to an error.
    fn context(self, msg: impl Into<String>) -> Result<T>;

    /// Add context using a closure (lazy evaluation).
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: Into<CatalogError>,
{
    fn context(self, msg: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let err: CatalogError = e.into();
            CatalogError::Other(format!("{}: {err}", msg.into()))
        })
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| {
            let err: CatalogError = e.into();
            CatalogError::Other(format!("{}: {err}", f()))
        })
    }
}
