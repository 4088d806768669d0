//! Application configuration loaded from `config.toml`.
//!
//! ```toml
//! [app]
//! name = "catalog"
//!
//! [db]
//! host = "localhost"
//! port = 5432
//! user = "postgres"
//! password = "secret"
//! name = "postgres"
//! metadata_schema = "metadata"
//! ```
//!
//! Every key is optional; a missing file yields the defaults above (with an
//! empty password).

use crate::error::{CatalogError, Result};
use secrecy::{ExposeSecret as _, SecretString};
use serde::Deserialize;
use sqlx::postgres::PgConnectOptions;
use std::path::Path;
use std::str::FromStr as _;

pub const DEFAULT_CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub app: AppSection,
    pub db: DbSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppSection {
    /// Recorded as every new dataset's topic and used to name the log files
    pub name: String,
}

impl Default for AppSection {
    fn default() -> Self {
        Self {
            name: "catalog".to_owned(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DbSettings {
    pub host: String,
    pub port: u16,
    pub user: String,
    #[serde(deserialize_with = "deserialize_password")]
    pub password: SecretString,
    pub name: String,
    /// Schema holding the catalog tables; becomes the connection's `search_path`
    pub metadata_schema: String,
}

fn deserialize_password<'de, D>(deserializer: D) -> std::result::Result<SecretString, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    Ok(SecretString::new(s.into()))
}

impl Default for DbSettings {
    fn default() -> Self {
        Self {
            host: "localhost".to_owned(),
            port: 5432,
            user: "postgres".to_owned(),
            password: SecretString::new(String::new().into()),
            name: "postgres".to_owned(),
            metadata_schema: "metadata".to_owned(),
        }
    }
}

impl DbSettings {
    pub fn connect_options(&self) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .password(self.password.expose_secret())
            .database(&self.name)
            .options([("search_path", self.metadata_schema.as_str())])
    }

    /// Connection options from a URL, still pointed at the metadata schema.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Config`] when the URL cannot be parsed.
    pub fn connect_options_from_url(&self, url: &str) -> Result<PgConnectOptions> {
        let options = PgConnectOptions::from_str(url)
            .map_err(|e| CatalogError::Config(format!("Invalid database URL: {e}")))?;
        Ok(options.options([("search_path", self.metadata_schema.as_str())]))
    }
}

/// Reads the configuration file without logging, so it can run before the
/// subscriber exists. `None` means the file is absent.
///
/// # Errors
///
/// Returns [`CatalogError::Config`] when the file exists but is not valid
/// TOML for [`AppConfig`].
pub fn read_config(path: &Path) -> Result<Option<AppConfig>> {
    if !path.exists() {
        return Ok(None);
    }

    let content = std::fs::read_to_string(path)?;
    Ok(Some(toml::from_str(&content)?))
}

/// Reads the configuration file, falling back to defaults when it is absent.
///
/// # Errors
///
/// As [`read_config`].
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let Some(config) = read_config(path)? else {
        warn_missing(path);
        return Ok(AppConfig::default());
    };
    tracing::debug!(app = %config.app.name, host = %config.db.host, "Loaded configuration");
    Ok(config)
}

pub fn warn_missing(path: &Path) {
    tracing::warn!("{} not found, using default configuration", path.display());
}
