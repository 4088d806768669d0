//! # catalog-capture entry point
//!
//! ```text
//! main()
//!   ├─> Parse CLI arguments (clap)
//!   ├─> Read config.toml
//!   ├─> Initialize logging (named after [app] name)
//!   ├─> Warn if config.toml was missing
//!   └─> Run the command on a Tokio runtime
//! ```
//!
//! ```bash
//! catalog-capture init-schema
//! catalog-capture register sales.csv
//! catalog-capture list --db-url postgres://localhost/warehouse
//! ```

#![warn(clippy::all, rust_2018_idioms)]
#![expect(clippy::print_stderr)] // Fatal diagnostics go to stderr

mod cli;

use catalog_capture::config::{self, AppConfig, AppSection};
use clap::Parser as _;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = cli::Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{err:#}");
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: cli::Cli) -> anyhow::Result<()> {
    let found = config::read_config(&cli.config)?;
    let app_name = found
        .as_ref()
        .map_or_else(|| AppSection::default().name, |c| c.app.name.clone());

    if let Err(err) = catalog_capture::logging::init(&app_name) {
        eprintln!("Warning: logging disabled: {err}");
    }

    let config = found.unwrap_or_else(|| {
        config::warn_missing(&cli.config);
        AppConfig::default()
    });

    tokio::runtime::Runtime::new()?.block_on(cli::run_command(cli, config))
}
