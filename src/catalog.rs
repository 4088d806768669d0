//! The metadata catalog: its records, its storage backends, the session
//! snapshot and the atomic commit of a registration.
//!
//! ## Usage
//!
//! ```no_run
//! use catalog_capture::catalog::{CatalogSnapshot, PgCatalog};
//! use sqlx::postgres::PgConnectOptions;
//!
//! # async fn example() -> catalog_capture::error::Result<()> {
//! let catalog = PgCatalog::connect(PgConnectOptions::new()).await?;
//! let snapshot = CatalogSnapshot::load(&catalog).await?;
//! for (name, known) in snapshot.known_datasets() {
//!     println!("{name}: {} variables", known.variables.len());
//! }
//! # Ok(())
//! # }
//! ```

pub mod memory;
pub mod model;
pub mod plan;
pub mod postgres;
pub mod snapshot;
pub mod standards;
pub mod store;
pub mod transaction;

pub use memory::MemoryCatalog;
pub use model::{
    Cadence, DataType, DatasetId, Keyword, KeywordId, NewDataset, NewEdition, NewVariable,
};
pub use plan::{DatasetTarget, KeywordPlan, RegistrationPlan};
pub use postgres::PgCatalog;
pub use snapshot::{CatalogSnapshot, KnownDataset};
pub use standards::{StandardsResolver, UnlinkedStandards};
pub use store::{CatalogIndex, CatalogStore, CatalogTransaction};
pub use transaction::TransactionCoordinator;
