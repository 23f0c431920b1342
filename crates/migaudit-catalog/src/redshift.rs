//! Amazon Redshift target adapter over the PostgreSQL wire protocol
//!
//! Catalog lookups query `information_schema` with bind parameters. Table
//! and column identifiers are double-quoted in Redshift's lowercase
//! convention. Sample rows use the simple-query protocol so every cell
//! arrives as text regardless of its column type.
//!
//! Each operation opens its own connection, optionally over TLS via
//! native-tls, and drops it before returning.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let adapter = RedshiftAdapter::new(config.target.clone());
//! let table = config.resolver().resolve("mfs_lending.loans", SourceKind::Target)?;
//! let exists = adapter.exists(&table).await?;
//! ```
//!
//! Reference: https://docs.aws.amazon.com/redshift/latest/dg/c_redshift-and-postgres-sql.html

use crate::adapter::SourceAdapter;
use crate::query::{self, quote_ident, quote_literal};
use chrono::NaiveDate;
use migaudit_core::{
    ColumnDescriptor, DateCount, FetchError, RowSet, SourceKind, TableIdentifier, TargetConfig,
};

#[cfg(feature = "redshift")]
use tokio_postgres::{Client, Config as PgConfig, NoTls, SimpleQueryMessage};

#[cfg(feature = "redshift")]
use postgres_native_tls::MakeTlsConnector;

#[cfg(feature = "redshift")]
use native_tls::TlsConnector;

const KIND: SourceKind = SourceKind::Target;

/// Catalog existence check, `$1` schema and `$2` table
pub const EXISTS_SQL: &str = "SELECT COUNT(*) FROM information_schema.tables \
     WHERE table_schema = $1 AND table_name = $2";

/// Column listing in ordinal order, `$1` schema and `$2` table
pub const COLUMNS_SQL: &str = "SELECT column_name::text, data_type::text \
     FROM information_schema.columns \
     WHERE table_schema = $1 AND table_name = $2 \
     ORDER BY ordinal_position";

/// Redshift warehouse adapter
#[derive(Debug, Clone)]
pub struct RedshiftAdapter {
    config: TargetConfig,
}

impl RedshiftAdapter {
    /// Create an adapter; no connection is opened until the first query
    pub fn new(config: TargetConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TargetConfig {
        &self.config
    }

    /// Configured port, or the Redshift default
    pub fn port(&self) -> u16 {
        self.config.port.unwrap_or(TargetConfig::DEFAULT_PORT)
    }

    /// Environment variables of required settings that are not configured
    pub fn missing_settings(&self) -> Vec<&'static str> {
        [
            ("HOST", &self.config.host),
            ("DBNAME", &self.config.database),
            ("USERNAMERS", &self.config.user),
            ("PASSWORD", &self.config.password),
        ]
        .into_iter()
        .filter(|(_, value)| value.as_deref().map_or(true, |v| v.trim().is_empty()))
        .map(|(var, _)| var)
        .collect()
    }

    /// Catalog lookup parameters: schema and table, lowercased
    pub fn catalog_params(table: &TableIdentifier) -> (String, String) {
        (KIND.normalize(&table.schema), KIND.normalize(&table.table))
    }

    /// `"schema"."table"`; a database part is never emitted
    pub fn qualified_name(table: &TableIdentifier) -> String {
        format!(
            "{}.{}",
            quote_ident(&KIND.normalize(&table.schema)),
            quote_ident(&KIND.normalize(&table.table))
        )
    }

    pub fn sample_sql(table: &TableIdentifier, date_column: &str, date: NaiveDate, limit: u32) -> String {
        format!(
            "SELECT * FROM {} WHERE DATE({}) = {} LIMIT {}",
            Self::qualified_name(table),
            quote_ident(&KIND.normalize(date_column)),
            quote_literal(&date.format("%Y-%m-%d").to_string()),
            limit
        )
    }

    pub fn total_count_sql(table: &TableIdentifier) -> String {
        format!("SELECT COUNT(*) FROM {}", Self::qualified_name(table))
    }

    pub fn count_by_date_sql(table: &TableIdentifier, date_column: &str, days: u32) -> String {
        let column = quote_ident(&KIND.normalize(date_column));
        format!(
            "SELECT DATE({col}) AS extraction_date, COUNT(*) AS record_count \
             FROM {table} \
             WHERE DATE({col}) >= CURRENT_DATE - {offset} \
             AND DATE({col}) <= CURRENT_DATE \
             GROUP BY 1 ORDER BY 1 DESC",
            col = column,
            table = Self::qualified_name(table),
            offset = query::window_offset(days)
        )
    }

    #[cfg(feature = "redshift")]
    async fn connect(&self) -> Result<Client, FetchError> {
        let missing = self.missing_settings();
        if !missing.is_empty() {
            return Err(FetchError::ConnectionFailure(format!(
                "Redshift credentials incomplete, set {}",
                missing.join(", ")
            )));
        }

        let host = self.config.host.as_deref().unwrap_or_default();
        let port = self.port();
        let endpoint = format!("{}:{}", host, port);

        let mut pg = PgConfig::new();
        pg.host(host)
            .port(port)
            .dbname(self.config.database.as_deref().unwrap_or_default())
            .user(self.config.user.as_deref().unwrap_or_default())
            .password(self.config.password.as_deref().unwrap_or_default());

        let connect_err = |e: tokio_postgres::Error| {
            FetchError::ConnectionFailure(format!(
                "Failed to connect to Redshift at {}: {}",
                endpoint, e
            ))
        };

        tracing::debug!(endpoint = %endpoint, tls = self.config.tls, "opening Redshift connection");

        let client = if self.config.tls {
            let connector = TlsConnector::builder()
                .build()
                .map_err(|e| FetchError::Configuration(format!(
                    "Failed to create TLS connector: {}", e
                )))?;

            let (client, connection) = pg
                .connect(MakeTlsConnector::new(connector))
                .await
                .map_err(connect_err)?;
            spawn_connection(connection, endpoint.clone());
            client
        } else {
            let (client, connection) = pg.connect(NoTls).await.map_err(connect_err)?;
            spawn_connection(connection, endpoint.clone());
            client
        };

        Ok(client)
    }
}

/// Drive the connection in the background until the client is dropped
#[cfg(feature = "redshift")]
fn spawn_connection<F>(connection: F, endpoint: String)
where
    F: std::future::Future<Output = Result<(), tokio_postgres::Error>> + Send + 'static,
{
    tokio::spawn(async move {
        match connection.await {
            Ok(()) => tracing::debug!(endpoint = %endpoint, "Redshift connection closed"),
            Err(e) => tracing::warn!(endpoint = %endpoint, error = %e, "Redshift connection error"),
        }
    });
}

#[cfg(feature = "redshift")]
fn query_failure(operation: &str, e: tokio_postgres::Error) -> FetchError {
    let message = e
        .as_db_error()
        .map(|db| db.message().to_string())
        .unwrap_or_else(|| e.to_string());
    tracing::warn!(operation, error = %message, "Redshift query failed");
    FetchError::QueryFailure(message)
}

#[cfg(feature = "redshift")]
fn to_count(value: i64) -> Result<u64, FetchError> {
    u64::try_from(value)
        .map_err(|_| FetchError::InvalidResponse(format!("negative row count {}", value)))
}

#[cfg(not(feature = "redshift"))]
fn not_compiled<T>() -> Result<T, FetchError> {
    Err(FetchError::Configuration(
        "Redshift support not compiled. Rebuild with: cargo build --features redshift".to_string(),
    ))
}

#[async_trait::async_trait]
impl SourceAdapter for RedshiftAdapter {
    fn name(&self) -> &'static str {
        KIND.display_name()
    }

    fn kind(&self) -> SourceKind {
        KIND
    }

    #[cfg(feature = "redshift")]
    async fn exists(&self, table: &TableIdentifier) -> Result<bool, FetchError> {
        let client = self.connect().await?;
        let (schema, name) = Self::catalog_params(table);

        let row = client
            .query_one(EXISTS_SQL, &[&schema, &name])
            .await
            .map_err(|e| query_failure("exists", e))?;
        let count: i64 = row
            .try_get(0)
            .map_err(|e| FetchError::InvalidResponse(e.to_string()))?;

        Ok(count > 0)
    }

    #[cfg(not(feature = "redshift"))]
    async fn exists(&self, _table: &TableIdentifier) -> Result<bool, FetchError> {
        not_compiled()
    }

    #[cfg(feature = "redshift")]
    async fn sample_rows(
        &self,
        table: &TableIdentifier,
        date_column: &str,
        date: NaiveDate,
        limit: u32,
    ) -> Result<RowSet, FetchError> {
        let client = self.connect().await?;
        let sql = Self::sample_sql(table, date_column, date, limit);

        let messages = client
            .simple_query(&sql)
            .await
            .map_err(|e| query_failure("sample_rows", e))?;

        let mut rows = RowSet::default();
        for message in messages {
            match message {
                SimpleQueryMessage::RowDescription(columns) => {
                    rows.columns = columns.iter().map(|c| c.name().to_string()).collect();
                }
                SimpleQueryMessage::Row(row) => {
                    if rows.columns.is_empty() {
                        rows.columns = row.columns().iter().map(|c| c.name().to_string()).collect();
                    }
                    rows.rows.push((0..row.len()).map(|i| row.get(i).map(str::to_string)).collect());
                }
                _ => {}
            }
        }

        Ok(rows)
    }

    #[cfg(not(feature = "redshift"))]
    async fn sample_rows(
        &self,
        _table: &TableIdentifier,
        _date_column: &str,
        _date: NaiveDate,
        _limit: u32,
    ) -> Result<RowSet, FetchError> {
        not_compiled()
    }

    #[cfg(feature = "redshift")]
    async fn total_count(&self, table: &TableIdentifier) -> Result<u64, FetchError> {
        let client = self.connect().await?;

        let row = client
            .query_one(Self::total_count_sql(table).as_str(), &[])
            .await
            .map_err(|e| query_failure("total_count", e))?;
        let count: i64 = row
            .try_get(0)
            .map_err(|e| FetchError::InvalidResponse(e.to_string()))?;

        to_count(count)
    }

    #[cfg(not(feature = "redshift"))]
    async fn total_count(&self, _table: &TableIdentifier) -> Result<u64, FetchError> {
        not_compiled()
    }

    #[cfg(feature = "redshift")]
    async fn count_by_date(
        &self,
        table: &TableIdentifier,
        date_column: &str,
        days: u32,
    ) -> Result<Vec<DateCount>, FetchError> {
        let client = self.connect().await?;

        let rows = client
            .query(Self::count_by_date_sql(table, date_column, days).as_str(), &[])
            .await
            .map_err(|e| query_failure("count_by_date", e))?;

        rows.iter()
            .map(|row| {
                let date: NaiveDate = row
                    .try_get(0)
                    .map_err(|e| FetchError::InvalidResponse(e.to_string()))?;
                let count: i64 = row
                    .try_get(1)
                    .map_err(|e| FetchError::InvalidResponse(e.to_string()))?;
                Ok(DateCount::new(date, to_count(count)?))
            })
            .collect()
    }

    #[cfg(not(feature = "redshift"))]
    async fn count_by_date(
        &self,
        _table: &TableIdentifier,
        _date_column: &str,
        _days: u32,
    ) -> Result<Vec<DateCount>, FetchError> {
        not_compiled()
    }

    #[cfg(feature = "redshift")]
    async fn columns(&self, table: &TableIdentifier) -> Result<Vec<ColumnDescriptor>, FetchError> {
        let client = self.connect().await?;
        let (schema, name) = Self::catalog_params(table);

        let rows = client
            .query(COLUMNS_SQL, &[&schema, &name])
            .await
            .map_err(|e| query_failure("columns", e))?;

        rows.iter()
            .map(|row| {
                let column: String = row
                    .try_get(0)
                    .map_err(|e| FetchError::InvalidResponse(e.to_string()))?;
                let data_type: String = row
                    .try_get(1)
                    .map_err(|e| FetchError::InvalidResponse(e.to_string()))?;
                Ok(ColumnDescriptor::new(column, data_type))
            })
            .collect()
    }

    #[cfg(not(feature = "redshift"))]
    async fn columns(&self, _table: &TableIdentifier) -> Result<Vec<ColumnDescriptor>, FetchError> {
        not_compiled()
    }

    #[cfg(feature = "redshift")]
    async fn test_connection(&self) -> Result<(), FetchError> {
        let client = self.connect().await?;
        client
            .simple_query("SELECT 1")
            .await
            .map_err(|e| query_failure("test_connection", e))?;
        Ok(())
    }

    #[cfg(not(feature = "redshift"))]
    async fn test_connection(&self) -> Result<(), FetchError> {
        not_compiled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn identifiers_are_lowercased_and_quoted() {
        let table = TableIdentifier::without_database("MFS_Lending", "Loans");
        assert_eq!(RedshiftAdapter::qualified_name(&table), "\"mfs_lending\".\"loans\"");
        assert_eq!(
            RedshiftAdapter::catalog_params(&table),
            ("mfs_lending".to_string(), "loans".to_string())
        );
    }

    #[test]
    fn database_part_never_reaches_queries() {
        let table = TableIdentifier::new("DB", "schema", "orders");
        assert_eq!(RedshiftAdapter::total_count_sql(&table), "SELECT COUNT(*) FROM \"schema\".\"orders\"");
        assert!(!RedshiftAdapter::count_by_date_sql(&table, "time_extracted", 5).contains("db"));
    }

    #[test]
    fn sample_query_inlines_escaped_date() {
        let table = TableIdentifier::without_database("sales", "orders");
        let date = NaiveDate::from_ymd_opt(2024, 9, 30).unwrap();
        assert_eq!(
            RedshiftAdapter::sample_sql(&table, "Time_Extracted", date, 10),
            "SELECT * FROM \"sales\".\"orders\" WHERE DATE(\"time_extracted\") = '2024-09-30' LIMIT 10"
        );
    }

    #[test]
    fn count_by_date_covers_trailing_window() {
        let table = TableIdentifier::without_database("sales", "orders");
        let sql = RedshiftAdapter::count_by_date_sql(&table, "time_extracted", 5);
        assert!(sql.contains(">= CURRENT_DATE - 4"));
        assert!(sql.contains("<= CURRENT_DATE"));
        assert!(sql.ends_with("GROUP BY 1 ORDER BY 1 DESC"));
    }

    #[test]
    fn default_port_and_missing_settings() {
        let adapter = RedshiftAdapter::new(TargetConfig {
            host: Some("cluster.example.com".to_string()),
            user: Some("auditor".to_string()),
            ..Default::default()
        });
        assert_eq!(adapter.port(), 5439);
        assert_eq!(adapter.missing_settings(), vec!["DBNAME", "PASSWORD"]);
        assert_eq!(adapter.name(), "Redshift");
    }

    #[cfg(not(feature = "redshift"))]
    #[tokio::test]
    async fn operations_fail_without_feature() {
        let adapter = RedshiftAdapter::new(TargetConfig::default());
        let table = TableIdentifier::without_database("sales", "orders");
        assert!(matches!(adapter.exists(&table).await, Err(FetchError::Configuration(_))));
        assert!(matches!(adapter.columns(&table).await, Err(FetchError::Configuration(_))));
    }
}
