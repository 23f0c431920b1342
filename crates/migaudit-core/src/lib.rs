//! migaudit core
//!
//! Domain model shared by every audit crate: table identifiers and the
//! per-warehouse name resolution rules, fetched-data types, the error
//! taxonomy, and configuration.

pub mod error;
pub mod identifier;
pub mod model;
pub mod config;

pub use error::FetchError;
pub use identifier::{
    sanitize_table_name, SourceKind, TableIdentifier, TableNameResolver, TARGET_DEFAULT_SCHEMA,
};
pub use model::{
    ColumnDescriptor, CountResult, DateCount, DateWindow, ExistenceResult, FetchOutcome, RowSet,
};
pub use config::{AuditConfig, AuditSettings, ConfigError, OriginConfig, ReportSettings, TargetConfig};
