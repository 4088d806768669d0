//! # catalog-capture
//!
//! Interactive registration of tabular datasets into a relational metadata
//! catalog. An operator describes a dataset, its variables (columns) and the
//! specific edition being registered; the description is committed to the
//! catalog in one transaction so datasets can later be discovered, linked by
//! keyword and checked for schema drift between editions.
//!
//! ## Quick Start
//!
//! ```no_run
//! use catalog_capture::catalog::PgCatalog;
//! use catalog_capture::config::load_config;
//! use catalog_capture::input::InputFile;
//! use catalog_capture::prompt::TerminalPrompter;
//! use catalog_capture::workflow;
//!
//! # async fn example() -> catalog_capture::error::Result<()> {
//! let config = load_config("config.toml".as_ref())?;
//! let catalog = PgCatalog::connect(config.db.connect_options()).await?;
//! let input = InputFile::read("sales.csv".as_ref())?;
//! workflow::register(&catalog, input, &config.app.name, TerminalPrompter::new).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`catalog`]: records, storage backends, snapshot and atomic commit
//! - [`workflow`]: the registration state machine, its questions and rules
//! - [`prompt`]: how questions reach the operator
//! - [`input`]: reading the file being registered
//! - [`config`], [`logging`], [`error`]: ambient plumbing

#![warn(clippy::all, rust_2018_idioms)]

pub mod catalog;
pub mod config;
pub mod error;
pub mod input;
pub mod logging;
pub mod prompt;
pub mod workflow;
