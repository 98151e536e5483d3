//! Layered configuration for a provisioning run.
//!
//! Sources, later ones winning:
//! 1. built-in defaults (the literal constants of the incident dataset)
//! 2. an optional TOML file
//! 3. `PGPROVISION_*` environment variables, nested keys split on `__`
//!    (e.g. `PGPROVISION_CONNECTION__HOST=db.internal`)
//!
//! A `.env` file in the working directory is loaded before the environment is read.
//!
//! Environment values that look like numbers or booleans are parsed as such,
//! so a numeric password must be written as a reference, e.g.
//! `PGPROVISION_CONNECTION__PASSWORD_REF=plain:0123`.

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::domain::error::{AppError, Result};
use crate::domain::profile::SizingPolicy;
use crate::domain::provisioning::DatabaseLayout;

pub const ENV_PREFIX: &str = "PGPROVISION_";

/// How to reach the server with an account allowed to create databases and roles
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionSettings {
    pub host: String,
    pub port: u16,
    pub username: String,
    /// See `infrastructure::security::credentials::resolve_password`
    pub password_ref: String,
    /// Database used for CREATE/DROP DATABASE and role statements
    pub maintenance_database: String,
    pub ssl_mode: String,
    pub connect_timeout_secs: u64,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            username: "postgres".to_string(),
            password_ref: "env:PGPROVISION_ADMIN_PASSWORD".to_string(),
            maintenance_database: "postgres".to_string(),
            ssl_mode: "prefer".to_string(),
            connect_timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceSettings {
    pub csv_path: PathBuf,
    /// Single ASCII character
    pub delimiter: char,
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            csv_path: PathBuf::from("data/incident_reports.csv"),
            delimiter: ',',
        }
    }
}

impl SourceSettings {
    pub fn delimiter_byte(&self) -> Result<u8> {
        if self.delimiter.is_ascii() {
            Ok(self.delimiter as u8)
        } else {
            Err(AppError::ConfigError(format!(
                "Delimiter '{}' is not a single-byte ASCII character",
                self.delimiter
            )))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProvisionSettings {
    /// Run teardown before creating anything
    pub recreate: bool,
    /// Sample rows printed by verification
    pub sample_rows: u32,
}

impl Default for ProvisionSettings {
    fn default() -> Self {
        Self {
            recreate: false,
            sample_rows: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProvisionConfig {
    pub connection: ConnectionSettings,
    pub source: SourceSettings,
    pub layout: DatabaseLayout,
    pub provision: ProvisionSettings,
    pub policy: SizingPolicy,
}

impl ProvisionConfig {
    /// Load defaults, then `path` if given, then the environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        dotenvy::dotenv().ok();

        let mut figment = Figment::from(Serialized::defaults(ProvisionConfig::default()));
        if let Some(path) = path {
            if !path.exists() {
                return Err(AppError::ConfigError(format!(
                    "Config file {} does not exist",
                    path.display()
                )));
            }
            figment = figment.merge(Toml::file(path));
        }
        figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));

        Self::extract(figment)
    }

    fn extract(figment: Figment) -> Result<Self> {
        let config: ProvisionConfig = figment
            .extract()
            .map_err(|e| AppError::ConfigError(format!("Failed to load configuration: {}", e)))?;
        config.validate()?;

        debug!(
            database = %config.layout.database,
            schema = %config.layout.schema,
            table = %config.layout.table.name,
            "Configuration loaded"
        );
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.layout.validate()?;
        self.policy
            .validate()
            .map_err(|e| AppError::ConfigError(format!("Invalid sizing policy: {}", e)))?;
        self.source.delimiter_byte()?;
        if self.connection.connect_timeout_secs == 0 {
            return Err(AppError::ConfigError(
                "connect_timeout_secs must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}
