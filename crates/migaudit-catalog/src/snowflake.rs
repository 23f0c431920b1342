//! Snowflake origin adapter using INFORMATION_SCHEMA
//!
//! Queries go through the Snowflake SQL REST API, one session per operation.
//! The API takes no bind parameters, so schema and table names are inlined
//! as escaped literals and identifiers are double-quoted in Snowflake's
//! uppercase convention.
//!
//! Required privileges:
//! - USAGE on the warehouse, database and schema
//! - SELECT on the audited table and INFORMATION_SCHEMA views
//!
//! ## Usage
//!
//! ```rust,ignore
//! let adapter = SnowflakeAdapter::new(config.origin.clone());
//! let table = config.resolver().resolve("MFS_LENDING.LOANS", SourceKind::Origin)?;
//! let columns = adapter.columns(&table).await?;
//! ```
//!
//! Reference: https://docs.snowflake.com/en/sql-reference/info-schema

use crate::adapter::SourceAdapter;
use crate::query::{self, quote_ident, quote_literal};
use chrono::NaiveDate;
use migaudit_core::{
    ColumnDescriptor, DateCount, FetchError, OriginConfig, RowSet, SourceKind, TableIdentifier,
};

const KIND: SourceKind = SourceKind::Origin;

/// Snowflake warehouse adapter
#[derive(Debug, Clone)]
pub struct SnowflakeAdapter {
    config: OriginConfig,
}

impl SnowflakeAdapter {
    /// Create an adapter; no session is opened until the first query
    pub fn new(config: OriginConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &OriginConfig {
        &self.config
    }

    /// Environment variables of required settings that are not configured
    pub fn missing_settings(&self) -> Vec<&'static str> {
        [
            ("ACCOUNT_SNOW", &self.config.account),
            ("USER_SNOW", &self.config.user),
            ("PASSWORD_SNOW", &self.config.password),
        ]
        .into_iter()
        .filter(|(_, value)| value.as_deref().map_or(true, |v| v.trim().is_empty()))
        .map(|(var, _)| var)
        .collect()
    }

    /// `"DB"."SCHEMA"."TABLE"`, or `"SCHEMA"."TABLE"` without a database
    pub fn qualified_name(table: &TableIdentifier) -> String {
        table
            .database
            .iter()
            .chain([&table.schema, &table.table])
            .map(|part| quote_ident(&KIND.normalize(part)))
            .collect::<Vec<_>>()
            .join(".")
    }

    /// INFORMATION_SCHEMA of the table's database, or of the session's
    fn catalog(table: &TableIdentifier) -> String {
        match &table.database {
            Some(db) => format!("{}.INFORMATION_SCHEMA", quote_ident(&KIND.normalize(db))),
            None => "INFORMATION_SCHEMA".to_string(),
        }
    }

    fn schema_filter(table: &TableIdentifier) -> String {
        format!(
            "TABLE_SCHEMA = {} AND TABLE_NAME = {}",
            quote_literal(&KIND.normalize(&table.schema)),
            quote_literal(&KIND.normalize(&table.table))
        )
    }

    pub fn exists_sql(table: &TableIdentifier) -> String {
        format!(
            "SELECT COUNT(*) AS TABLE_COUNT FROM {}.TABLES WHERE {}",
            Self::catalog(table),
            Self::schema_filter(table)
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
        format!("SELECT COUNT(*) AS TOTAL_COUNT FROM {}", Self::qualified_name(table))
    }

    pub fn count_by_date_sql(table: &TableIdentifier, date_column: &str, days: u32) -> String {
        let column = quote_ident(&KIND.normalize(date_column));
        format!(
            "SELECT DATE({col}) AS EXTRACTION_DATE, COUNT(*) AS RECORD_COUNT \
             FROM {table} \
             WHERE DATE({col}) >= DATEADD(day, -{offset}, CURRENT_DATE()) \
             AND DATE({col}) <= CURRENT_DATE() \
             GROUP BY 1 ORDER BY 1 DESC",
            col = column,
            table = Self::qualified_name(table),
            offset = query::window_offset(days)
        )
    }

    pub fn columns_sql(table: &TableIdentifier) -> String {
        format!(
            "SELECT COLUMN_NAME, DATA_TYPE FROM {}.COLUMNS WHERE {} ORDER BY ORDINAL_POSITION",
            Self::catalog(table),
            Self::schema_filter(table)
        )
    }

    /// Open a session, run one statement and close the session
    #[cfg(feature = "snowflake")]
    async fn run(&self, sql: &str) -> Result<RowSet, FetchError> {
        use snowflake_api::{QueryResult, SnowflakeApi};

        let missing = self.missing_settings();
        if !missing.is_empty() {
            return Err(FetchError::ConnectionFailure(format!(
                "Snowflake credentials incomplete, set {}",
                missing.join(", ")
            )));
        }

        let account = self.config.account.as_deref().unwrap_or_default();
        let user = self.config.user.as_deref().unwrap_or_default();
        let password = self.config.password.as_deref().unwrap_or_default();

        tracing::debug!(account, "opening Snowflake session");
        let mut api = SnowflakeApi::with_password_auth(
            account,
            self.config.warehouse.as_deref(),
            self.config.database.as_deref(),
            self.config.schema.as_deref(),
            user,
            self.config.role.as_deref(),
            password,
        )
        .map_err(|e| FetchError::ConnectionFailure(format!(
            "Failed to set up Snowflake session for {}: {}",
            account, e
        )))?;

        let result = api.exec(sql).await;

        if let Err(e) = api.close_session().await {
            tracing::debug!(error = %e, "closing Snowflake session failed");
        }
        tracing::debug!(account, "Snowflake session closed");

        let result = result.map_err(|e| {
            let err_str = e.to_string();
            let lowered = err_str.to_lowercase();
            if lowered.contains("auth") || lowered.contains("login") || lowered.contains("connect") {
                FetchError::ConnectionFailure(err_str)
            } else {
                FetchError::QueryFailure(err_str)
            }
        })?;

        match result {
            QueryResult::Arrow(batches) => Ok(arrow_text::to_rowset(&batches)),
            QueryResult::Json(_) => Err(FetchError::InvalidResponse(
                "Unexpected JSON result format".to_string(),
            )),
            QueryResult::Empty => Ok(RowSet::default()),
        }
    }

    #[cfg(not(feature = "snowflake"))]
    async fn run(&self, _sql: &str) -> Result<RowSet, FetchError> {
        Err(FetchError::Configuration(
            "Snowflake support not compiled. Rebuild with: cargo build --features snowflake".to_string(),
        ))
    }

    async fn run_logged(&self, operation: &str, sql: &str) -> Result<RowSet, FetchError> {
        self.run(sql).await.map_err(|e| {
            tracing::warn!(operation, error = %e, "Snowflake query failed");
            e
        })
    }
}

#[async_trait::async_trait]
impl SourceAdapter for SnowflakeAdapter {
    fn name(&self) -> &'static str {
        KIND.display_name()
    }

    fn kind(&self) -> SourceKind {
        KIND
    }

    async fn exists(&self, table: &TableIdentifier) -> Result<bool, FetchError> {
        let rows = self.run_logged("exists", &Self::exists_sql(table)).await?;
        Ok(query::single_count(&rows)? > 0)
    }

    async fn sample_rows(
        &self,
        table: &TableIdentifier,
        date_column: &str,
        date: NaiveDate,
        limit: u32,
    ) -> Result<RowSet, FetchError> {
        self.run_logged("sample_rows", &Self::sample_sql(table, date_column, date, limit))
            .await
    }

    async fn total_count(&self, table: &TableIdentifier) -> Result<u64, FetchError> {
        let rows = self.run_logged("total_count", &Self::total_count_sql(table)).await?;
        query::single_count(&rows)
    }

    async fn count_by_date(
        &self,
        table: &TableIdentifier,
        date_column: &str,
        days: u32,
    ) -> Result<Vec<DateCount>, FetchError> {
        let rows = self
            .run_logged("count_by_date", &Self::count_by_date_sql(table, date_column, days))
            .await?;
        query::date_counts(&rows)
    }

    async fn columns(&self, table: &TableIdentifier) -> Result<Vec<ColumnDescriptor>, FetchError> {
        let rows = self.run_logged("columns", &Self::columns_sql(table)).await?;
        query::column_list(&rows)
    }

    async fn test_connection(&self) -> Result<(), FetchError> {
        self.run_logged("test_connection", "SELECT 1").await.map(|_| ())
    }
}

/// Render Arrow result batches as text cells
#[cfg(feature = "snowflake")]
mod arrow_text {
    use arrow_array::cast::AsArray;
    use arrow_array::types::{
        Date32Type, Decimal128Type, Float32Type, Float64Type, Int16Type, Int32Type, Int64Type,
        Int8Type,
    };
    use arrow_array::{Array, ArrayRef, RecordBatch};
    use arrow_schema::{DataType, Field};
    use chrono::{DateTime, NaiveDate};
    use migaudit_core::RowSet;

    /// Days from 0001-01-01 to 1970-01-01
    const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

    pub fn to_rowset(batches: &[RecordBatch]) -> RowSet {
        let columns = batches
            .first()
            .map(|b| b.schema().fields().iter().map(|f| f.name().clone()).collect())
            .unwrap_or_default();

        let mut rows = Vec::new();
        for batch in batches {
            let schema = batch.schema();
            for row in 0..batch.num_rows() {
                rows.push(
                    schema
                        .fields()
                        .iter()
                        .zip(batch.columns())
                        .map(|(field, array)| cell(field, array, row))
                        .collect(),
                );
            }
        }

        RowSet::new(columns, rows)
    }

    fn cell(field: &Field, array: &ArrayRef, row: usize) -> Option<String> {
        if array.is_null(row) {
            return None;
        }

        let scale = field
            .metadata()
            .get("scale")
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(0);
        let logical = field
            .metadata()
            .get("logicalType")
            .map(String::as_str)
            .unwrap_or("");

        let text = match array.data_type() {
            DataType::Utf8 => array.as_string::<i32>().value(row).to_string(),
            DataType::LargeUtf8 => array.as_string::<i64>().value(row).to_string(),
            DataType::Boolean => array.as_boolean().value(row).to_string(),
            DataType::Int8 => fixed(array.as_primitive::<Int8Type>().value(row).into(), scale, logical),
            DataType::Int16 => fixed(array.as_primitive::<Int16Type>().value(row).into(), scale, logical),
            DataType::Int32 => fixed(array.as_primitive::<Int32Type>().value(row).into(), scale, logical),
            DataType::Int64 => fixed(array.as_primitive::<Int64Type>().value(row).into(), scale, logical),
            DataType::Float32 => array.as_primitive::<Float32Type>().value(row).to_string(),
            DataType::Float64 => array.as_primitive::<Float64Type>().value(row).to_string(),
            DataType::Decimal128(_, s) => {
                decimal(array.as_primitive::<Decimal128Type>().value(row), (*s).max(0) as u32)
            }
            DataType::Date32 => {
                let days = array.as_primitive::<Date32Type>().value(row);
                NaiveDate::from_num_days_from_ce_opt(days + UNIX_EPOCH_DAYS_FROM_CE)
                    .map(|d| d.to_string())
                    .unwrap_or_else(|| days.to_string())
            }
            DataType::Struct(_) => struct_timestamp(array, row),
            other => format!("<unsupported {}>", other),
        };

        Some(text)
    }

    /// Snowflake FIXED values carry their scale in field metadata, and
    /// timestamps arrive as scaled epoch values
    fn fixed(value: i128, scale: u32, logical: &str) -> String {
        if logical.starts_with("TIMESTAMP") {
            let factor = 10i128.pow(scale);
            let secs = value.div_euclid(factor);
            let nanos = value.rem_euclid(factor) * 10i128.pow(9u32.saturating_sub(scale));
            return i64::try_from(secs)
                .ok()
                .and_then(|s| DateTime::from_timestamp(s, nanos as u32))
                .map(|ts| ts.naive_utc().to_string())
                .unwrap_or_else(|| value.to_string());
        }

        if scale == 0 {
            value.to_string()
        } else {
            decimal(value, scale)
        }
    }

    fn decimal(value: i128, scale: u32) -> String {
        if scale == 0 {
            return value.to_string();
        }
        let factor = 10u128.pow(scale);
        let sign = if value < 0 { "-" } else { "" };
        let abs = value.unsigned_abs();
        format!(
            "{}{}.{:0width$}",
            sign,
            abs / factor,
            abs % factor,
            width = scale as usize
        )
    }

    /// TIMESTAMP_TZ and high-precision timestamps: `{epoch, fraction}`
    fn struct_timestamp(array: &ArrayRef, row: usize) -> String {
        let parts = array.as_struct();
        let epoch = parts
            .column_by_name("epoch")
            .and_then(|c| c.as_primitive_opt::<Int64Type>())
            .map(|a| a.value(row));
        let fraction = parts
            .column_by_name("fraction")
            .and_then(|c| c.as_primitive_opt::<Int32Type>())
            .map(|a| a.value(row))
            .unwrap_or(0);

        epoch
            .and_then(|secs| DateTime::from_timestamp(secs, fraction.max(0) as u32))
            .map(|ts| ts.naive_utc().to_string())
            .unwrap_or_else(|| "<unsupported struct>".to_string())
    }

}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn orders() -> TableIdentifier {
        TableIdentifier::new("analytics", "sales", "orders")
    }

    #[test]
    fn identifiers_are_uppercased_and_quoted() {
        assert_eq!(
            SnowflakeAdapter::qualified_name(&orders()),
            "\"ANALYTICS\".\"SALES\".\"ORDERS\""
        );
        assert_eq!(
            SnowflakeAdapter::qualified_name(&TableIdentifier::without_database("sales", "orders")),
            "\"SALES\".\"ORDERS\""
        );
    }

    #[test]
    fn catalog_queries_use_database_information_schema() {
        assert_eq!(
            SnowflakeAdapter::exists_sql(&orders()),
            "SELECT COUNT(*) AS TABLE_COUNT FROM \"ANALYTICS\".INFORMATION_SCHEMA.TABLES \
             WHERE TABLE_SCHEMA = 'SALES' AND TABLE_NAME = 'ORDERS'"
        );

        let sql = SnowflakeAdapter::columns_sql(&TableIdentifier::without_database("sales", "orders"));
        assert!(sql.starts_with("SELECT COLUMN_NAME, DATA_TYPE FROM INFORMATION_SCHEMA.COLUMNS"));
        assert!(sql.ends_with("ORDER BY ORDINAL_POSITION"));
    }

    #[test]
    fn literals_are_escaped() {
        let sql = SnowflakeAdapter::exists_sql(&TableIdentifier::without_database("sales", "o'rders"));
        assert!(sql.contains("TABLE_NAME = 'O''RDERS'"));
    }

    #[test]
    fn sample_query_shape() {
        let date = NaiveDate::from_ymd_opt(2024, 9, 30).unwrap();
        assert_eq!(
            SnowflakeAdapter::sample_sql(&orders(), "time_extracted", date, 10),
            "SELECT * FROM \"ANALYTICS\".\"SALES\".\"ORDERS\" \
             WHERE DATE(\"TIME_EXTRACTED\") = '2024-09-30' LIMIT 10"
        );
    }

    #[test]
    fn count_by_date_covers_trailing_window() {
        let sql = SnowflakeAdapter::count_by_date_sql(&orders(), "time_extracted", 5);
        assert!(sql.contains("DATEADD(day, -4, CURRENT_DATE())"));
        assert!(sql.contains("<= CURRENT_DATE()"));
        assert!(sql.ends_with("GROUP BY 1 ORDER BY 1 DESC"));
    }

    #[test]
    fn missing_settings_are_listed() {
        let adapter = SnowflakeAdapter::new(OriginConfig {
            account: Some("xy12345".to_string()),
            ..Default::default()
        });
        assert_eq!(adapter.missing_settings(), vec!["USER_SNOW", "PASSWORD_SNOW"]);
        assert_eq!(adapter.name(), "Snowflake");
        assert_eq!(adapter.kind(), SourceKind::Origin);
    }

    #[cfg(not(feature = "snowflake"))]
    #[tokio::test]
    async fn operations_fail_without_feature() {
        let adapter = SnowflakeAdapter::new(OriginConfig::default());
        let result = adapter.total_count(&orders()).await;
        assert!(matches!(result, Err(FetchError::Configuration(_))));
    }
}
