//! Configuration schema (migaudit.toml)
//!
//! Every connection setting is optional. A missing one is reported by the
//! adapter operation that needs it, so a half-configured environment can
//! still audit the side that is configured.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use crate::identifier::TableNameResolver;

/// Snowflake (origin) connection settings
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OriginConfig {
    pub account: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub warehouse: Option<String>,

    /// Default database for unqualified table names
    pub database: Option<String>,

    /// Default schema for bare table names
    pub schema: Option<String>,
    pub role: Option<String>,
}

impl fmt::Debug for OriginConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OriginConfig")
            .field("account", &self.account)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("warehouse", &self.warehouse)
            .field("database", &self.database)
            .field("schema", &self.schema)
            .field("role", &self.role)
            .finish()
    }
}

/// Redshift (target) connection settings
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub database: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,

    /// Connect over TLS
    #[serde(default)]
    pub tls: bool,
}

impl TargetConfig {
    /// Port used when none is configured
    pub const DEFAULT_PORT: u16 = 5439;
}

impl fmt::Debug for TargetConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TargetConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("tls", &self.tls)
            .finish()
    }
}

/// Defaults for the audit inputs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditSettings {
    /// Column holding the extraction timestamp
    pub date_column: String,

    /// Length of the trailing per-date window
    pub days: u32,

    /// Row limit for sample queries
    pub sample_limit: u32,

    /// Date used for sample queries and report naming
    pub sample_date: NaiveDate,
}

impl Default for AuditSettings {
    fn default() -> Self {
        Self {
            date_column: "time_extracted".to_string(),
            days: 5,
            sample_limit: 10,
            sample_date: NaiveDate::from_ymd_opt(2024, 9, 30).unwrap_or_default(),
        }
    }
}

/// Where and how reports are written
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportSettings {
    /// Directory for generated reports
    pub output_dir: PathBuf,

    /// Directory holding the TTF files of `font_family`
    pub font_dir: PathBuf,

    /// Font family name, files are `<family>-Regular.ttf` etc.
    pub font_family: String,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("audit_reports"),
            font_dir: PathBuf::from("./fonts"),
            font_family: "LiberationSans".to_string(),
        }
    }
}

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuditConfig {
    #[serde(default)]
    pub origin: OriginConfig,

    #[serde(default)]
    pub target: TargetConfig,

    #[serde(default)]
    pub audit: AuditSettings,

    #[serde(default)]
    pub report: ReportSettings,
}

impl AuditConfig {
    /// Load config from TOML file
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(e.to_string()))?;

        Self::from_toml(&contents)
    }

    /// Load config from TOML string
    pub fn from_toml(toml: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml)
            .map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Override settings from the process environment
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_env_with(|key| std::env::var(key).ok())
    }

    /// Override settings from `lookup`, which maps variable names to values.
    ///
    /// Origin: `USER_SNOW`, `PASSWORD_SNOW`, `ACCOUNT_SNOW`, `WAREHOUSE_SNOW`,
    /// `DATABASE_SNOW`, `SCHEMA_SNOW`, `ROLE_SNOW`.
    /// Target: `HOST`, `PORT`, `DBNAME`, `USERNAMERS`, `PASSWORD`, `SSL_RS`.
    pub fn apply_env_with<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let origin = &mut self.origin;
        for (key, slot) in [
            ("USER_SNOW", &mut origin.user),
            ("PASSWORD_SNOW", &mut origin.password),
            ("ACCOUNT_SNOW", &mut origin.account),
            ("WAREHOUSE_SNOW", &mut origin.warehouse),
            ("DATABASE_SNOW", &mut origin.database),
            ("SCHEMA_SNOW", &mut origin.schema),
            ("ROLE_SNOW", &mut origin.role),
        ] {
            if let Some(value) = get(key) {
                *slot = Some(value);
            }
        }

        let target = &mut self.target;
        for (key, slot) in [
            ("HOST", &mut target.host),
            ("DBNAME", &mut target.database),
            ("USERNAMERS", &mut target.user),
            ("PASSWORD", &mut target.password),
        ] {
            if let Some(value) = get(key) {
                *slot = Some(value);
            }
        }

        if let Some(port) = get("PORT") {
            let port = port.trim().parse::<u16>()
                .map_err(|_| ConfigError::InvalidValue(format!("PORT={} is not a port number", port)))?;
            target.port = Some(port);
        }

        if let Some(tls) = get("SSL_RS") {
            target.tls = matches!(tls.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "require");
        }

        Ok(())
    }

    /// Name resolver seeded with the origin's default database and schema
    pub fn resolver(&self) -> TableNameResolver {
        TableNameResolver::new(self.origin.database.clone(), self.origin.schema.clone())
    }
}

/// Config error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Invalid value: {0}")]
    InvalidValue(String),
}
