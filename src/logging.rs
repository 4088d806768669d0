//! Logging setup.
//!
//! Logs go to the console and to two daily-rolling files in the platform
//! data directory:
//!
//! - `<app>.log`: everything the filter lets through
//! - `error.log`: warnings and errors only
//!
//! `RUST_LOG` overrides the default `info` filter.
//!
//! ```no_run
//! catalog_capture::logging::init("catalog").expect("Failed to initialize logging");
//! tracing::info!("App started");
//! ```

use crate::error::{CatalogError, Result, ResultExt as _};
use std::path::{Path, PathBuf};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{
    EnvFilter, Layer as _, fmt, layer::SubscriberExt as _, util::SubscriberInitExt as _,
};

/// Log directory for `app_name`, created if missing.
///
/// - Linux: `~/.local/share/<app>/logs`
/// - macOS: `~/Library/Application Support/<app>/logs`
/// - Windows: `%APPDATA%/<app>/logs`
///
/// # Errors
///
/// Fails when the platform has no data directory or it cannot be created.
pub fn get_log_dir(app_name: &str) -> Result<PathBuf> {
    let base_dir = dirs::data_dir()
        .ok_or_else(|| CatalogError::Config("Failed to determine data directory".to_owned()))?;
    log_dir_in(&base_dir, app_name)
}

/// `<base_dir>/<app>/logs`, created if missing.
///
/// # Errors
///
/// Fails when the directory cannot be created.
pub fn log_dir_in(base_dir: &Path, app_name: &str) -> Result<PathBuf> {
    let log_dir = base_dir.join(app_name).join("logs");
    if !log_dir.exists() {
        std::fs::create_dir_all(&log_dir)
            .with_context(|| format!("Failed to create log directory: {}", log_dir.display()))?;
    }

    Ok(log_dir)
}

fn appender(log_dir: &Path, prefix: &str) -> Result<RollingFileAppender> {
    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .max_log_files(10)
        .filename_prefix(prefix)
        .filename_suffix("log")
        .build(log_dir)
        .map_err(|e| CatalogError::Config(format!("Failed to create {prefix} log appender: {e}")))
}

/// Installs the global subscriber. Call once at startup.
///
/// # Errors
///
/// Fails if the log directory or the file appenders cannot be created, or a
/// subscriber is already installed.
pub fn init(app_name: &str) -> Result<()> {
    let log_dir = get_log_dir(app_name)?;
    let all_logs_appender = appender(&log_dir, app_name)?;
    let error_logs_appender = appender(&log_dir, "error")?;

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .map_err(|e| CatalogError::Config(format!("Failed to create env filter: {e}")))?;

    let stdout_layer = fmt::layer().with_target(false).compact();

    let all_logs_layer = fmt::layer()
        .with_target(true)
        .with_line_number(true)
        .with_file(true)
        .with_ansi(false)
        .with_writer(all_logs_appender);

    let error_logs_layer = fmt::layer()
        .with_target(true)
        .with_line_number(true)
        .with_file(true)
        .with_ansi(false)
        .with_writer(error_logs_appender)
        .with_filter(EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(all_logs_layer)
        .with(error_logs_layer)
        .try_init()
        .map_err(|e| CatalogError::Config(format!("Failed to install logger: {e}")))?;

    tracing::debug!("Logging initialized, log directory: {}", log_dir.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_dir_is_created_under_base() -> Result<()> {
        let base = tempfile::tempdir()?;
        let log_dir = log_dir_in(base.path(), "catalog-capture-test")?;

        assert_eq!(log_dir, base.path().join("catalog-capture-test").join("logs"));
        assert!(log_dir.is_dir());
        assert_eq!(log_dir_in(base.path(), "catalog-capture-test")?, log_dir);
        Ok(())
    }
}
