//! Table identifiers and per-warehouse name resolution

use crate::error::FetchError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Schema the target warehouse falls back to for bare table names
pub const TARGET_DEFAULT_SCHEMA: &str = "public";

/// Which side of the migration a warehouse sits on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Migration source (Snowflake)
    Origin,

    /// Migration destination (Redshift)
    Target,
}

impl SourceKind {
    /// Warehouse display name
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Origin => "Snowflake",
            Self::Target => "Redshift",
        }
    }

    /// Apply the catalog casing convention of this warehouse.
    ///
    /// Snowflake stores unquoted identifiers uppercased, Redshift lowercased.
    pub fn normalize(&self, ident: &str) -> String {
        match self {
            Self::Origin => ident.to_uppercase(),
            Self::Target => ident.to_lowercase(),
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Identifies a table in a warehouse
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TableIdentifier {
    /// Database name, absent when the warehouse has no database concept
    pub database: Option<String>,

    /// Schema name
    pub schema: String,

    /// Table name
    pub table: String,
}

impl TableIdentifier {
    /// Create a fully qualified identifier
    pub fn new(database: impl Into<String>, schema: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            database: Some(database.into()),
            schema: schema.into(),
            table: table.into(),
        }
    }

    /// Create an identifier without a database part
    pub fn without_database(schema: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            database: None,
            schema: schema.into(),
            table: table.into(),
        }
    }

    /// Dotted name of the present parts
    pub fn fqn(&self) -> String {
        match &self.database {
            Some(db) => format!("{}.{}.{}", db, self.schema, self.table),
            None => format!("{}.{}", self.schema, self.table),
        }
    }

    /// `schema.table` with the casing convention of `kind` applied
    pub fn lookup_key(&self, kind: SourceKind) -> String {
        format!("{}.{}", kind.normalize(&self.schema), kind.normalize(&self.table))
    }
}

impl fmt::Display for TableIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.fqn())
    }
}

/// Turns user-typed table names into [`TableIdentifier`]s.
///
/// Accepted shapes are `table`, `schema.table` and `database.schema.table`.
/// Missing parts come from the origin's configured defaults; the target uses
/// `public` and has no database, so a database segment given for the target
/// is dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableNameResolver {
    origin_database: Option<String>,
    origin_schema: Option<String>,
}

impl TableNameResolver {
    /// Create a resolver with the origin's default database and schema
    pub fn new(origin_database: Option<String>, origin_schema: Option<String>) -> Self {
        Self {
            origin_database,
            origin_schema,
        }
    }

    /// Resolve `full_name` for the given side
    pub fn resolve(&self, full_name: &str, kind: SourceKind) -> Result<TableIdentifier, FetchError> {
        let full_name = full_name.trim();
        if full_name.is_empty() {
            return Err(FetchError::InvalidFormat("table name is empty".to_string()));
        }

        let parts: Vec<&str> = full_name.split('.').collect();
        if parts.iter().any(|p| p.trim().is_empty()) {
            return Err(FetchError::InvalidFormat(format!(
                "'{}' contains an empty name segment",
                full_name
            )));
        }
        let parts: Vec<String> = parts.iter().map(|p| p.trim().to_string()).collect();

        match (kind, parts.as_slice()) {
            (SourceKind::Origin, [table]) => {
                let schema = self.origin_schema.clone().ok_or_else(|| {
                    FetchError::Configuration(format!(
                        "no default schema configured for {}; qualify '{}' as schema.table",
                        kind, table
                    ))
                })?;
                Ok(TableIdentifier {
                    database: self.origin_database.clone(),
                    schema,
                    table: table.clone(),
                })
            }
            (SourceKind::Origin, [schema, table]) => Ok(TableIdentifier {
                database: self.origin_database.clone(),
                schema: schema.clone(),
                table: table.clone(),
            }),
            (SourceKind::Origin, [database, schema, table]) => {
                Ok(TableIdentifier::new(database.clone(), schema.clone(), table.clone()))
            }
            (SourceKind::Target, [table]) => {
                Ok(TableIdentifier::without_database(TARGET_DEFAULT_SCHEMA, table.clone()))
            }
            (SourceKind::Target, [schema, table]) | (SourceKind::Target, [_, schema, table]) => {
                Ok(TableIdentifier::without_database(schema.clone(), table.clone()))
            }
            _ => Err(FetchError::InvalidFormat(format!(
                "'{}' has {} segments; expected table, schema.table or database.schema.table",
                full_name,
                parts.len()
            ))),
        }
    }
}

/// Replace dots and path separators with underscores so a table name can
/// go into a single file name
pub fn sanitize_table_name(full_name: &str) -> String {
    full_name
        .trim()
        .chars()
        .map(|c| match c {
            '.' | '/' | '\\' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect()
}
