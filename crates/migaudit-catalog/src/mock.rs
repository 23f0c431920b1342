//! Mock warehouse adapter for testing
//!
//! This adapter serves predefined tables without connecting to any warehouse.
//! It's useful for:
//! - Unit testing reconciliation and report logic
//! - Integration testing the audit runner end to end
//! - Demos without real credentials
//! - Simulating per-operation failures
//!
//! ## Usage
//!
//! ```rust,ignore
//! use migaudit_catalog::{MockAdapter, MockTable, SourceAdapter};
//!
//! let adapter = MockAdapter::target();
//! adapter
//!     .add_table("sales", "orders", MockTable::new()
//!         .with_column("id", "integer")
//!         .with_total(42))
//!     .await;
//!
//! let table = TableIdentifier::without_database("sales", "orders");
//! assert_eq!(adapter.total_count(&table).await?, 42);
//! ```
//!
//! ## Simulating Failures
//!
//! ```rust,ignore
//! // Every operation fails to connect
//! let adapter = MockAdapter::origin().with_connection_failure();
//!
//! // Only the column listing of one table fails
//! adapter.add_error(&table, MockOperation::Columns,
//!     FetchError::QueryFailure("permission denied".to_string())).await;
//! ```

use crate::adapter::SourceAdapter;
use chrono::{NaiveDate, Utc};
use migaudit_core::{
    ColumnDescriptor, DateCount, DateWindow, FetchError, RowSet, SourceKind, TableIdentifier,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Adapter operations, for error injection and request recording
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MockOperation {
    Exists,
    SampleRows,
    TotalCount,
    CountByDate,
    Columns,
}

/// One call received by a [`MockAdapter`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockRequest {
    pub operation: MockOperation,
    pub table: TableIdentifier,
}

/// In-memory table contents
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MockTable {
    pub columns: Vec<ColumnDescriptor>,
    pub total_rows: u64,

    /// Per-date row counts; only those inside the requested window are served
    pub date_counts: Vec<DateCount>,

    /// Sample rows by date
    pub samples: HashMap<NaiveDate, RowSet>,
}

impl MockTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_column(mut self, name: &str, data_type: &str) -> Self {
        self.columns.push(ColumnDescriptor::new(name, data_type));
        self
    }

    pub fn with_total(mut self, total_rows: u64) -> Self {
        self.total_rows = total_rows;
        self
    }

    pub fn with_date_count(mut self, date: NaiveDate, count: u64) -> Self {
        self.date_counts.push(DateCount::new(date, count));
        self
    }

    pub fn with_sample(mut self, date: NaiveDate, rows: RowSet) -> Self {
        self.samples.insert(date, rows);
        self
    }
}

/// Mock warehouse adapter for testing
///
/// Tables are keyed by `schema.table` with the casing convention of the
/// adapter's [`SourceKind`] applied, so lookups match the way the real
/// warehouse would treat unquoted names.
///
/// # Example
///
/// ```rust,ignore
/// let adapter = MockAdapter::origin()
///     .with_today(NaiveDate::from_ymd_opt(2024, 10, 5).unwrap())
///     .with_latency(50);
/// ```
pub struct MockAdapter {
    kind: SourceKind,

    /// Tables by normalized `schema.table`
    tables: Arc<RwLock<HashMap<String, MockTable>>>,

    /// Errors to return for specific table operations
    errors: Arc<RwLock<HashMap<(String, MockOperation), FetchError>>>,

    /// Every request received, in order
    requests: Arc<RwLock<Vec<MockRequest>>>,

    /// Simulate connection failure on every operation
    fail_connection: bool,

    /// Simulate query latency (milliseconds)
    latency_ms: u64,

    /// Anchor of the trailing date window
    today: NaiveDate,

    adapter_name: &'static str,
}

impl MockAdapter {
    /// Create an empty mock for the given side
    pub fn new(kind: SourceKind) -> Self {
        MockAdapterBuilder::new(kind).build()
    }

    /// Empty mock behaving like the Snowflake origin
    pub fn origin() -> Self {
        Self::new(SourceKind::Origin)
    }

    /// Empty mock behaving like the Redshift target
    pub fn target() -> Self {
        Self::new(SourceKind::Target)
    }

    /// Add or replace a table
    pub async fn add_table(&self, schema: &str, table: &str, contents: MockTable) {
        let key = self.key(&TableIdentifier::without_database(schema, table));
        self.tables.write().await.insert(key, contents);
    }

    /// Configure an error for one operation on one table
    pub async fn add_error(&self, table: &TableIdentifier, operation: MockOperation, error: FetchError) {
        let key = self.key(table);
        self.errors.write().await.insert((key, operation), error);
    }

    /// Configure to fail every operation with a connection failure
    pub fn with_connection_failure(mut self) -> Self {
        self.fail_connection = true;
        self
    }

    /// Configure simulated latency for all operations
    pub fn with_latency(mut self, latency_ms: u64) -> Self {
        self.latency_ms = latency_ms;
        self
    }

    /// Set the date the trailing window ends on
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }

    /// Set a custom adapter name
    pub fn with_name(mut self, name: &'static str) -> Self {
        self.adapter_name = name;
        self
    }

    /// Get the number of tables stored in the adapter
    pub async fn table_count(&self) -> usize {
        self.tables.read().await.len()
    }

    /// Requests received so far
    pub async fn requests(&self) -> Vec<MockRequest> {
        self.requests.read().await.clone()
    }

    /// Forget recorded requests
    pub async fn clear_requests(&self) {
        self.requests.write().await.clear();
    }

    fn key(&self, table: &TableIdentifier) -> String {
        table.lookup_key(self.kind)
    }

    /// Record the request, then apply latency and injected failures
    async fn enter(&self, operation: MockOperation, table: &TableIdentifier) -> Result<(), FetchError> {
        self.requests.write().await.push(MockRequest {
            operation,
            table: table.clone(),
        });

        if self.latency_ms > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(self.latency_ms)).await;
        }

        if self.fail_connection {
            return Err(FetchError::ConnectionFailure(
                "Simulated connection failure".to_string(),
            ));
        }

        match self.errors.read().await.get(&(self.key(table), operation)) {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }

    /// Look up a table, failing like a query against a missing relation
    async fn table(&self, table: &TableIdentifier) -> Result<MockTable, FetchError> {
        self.tables
            .read()
            .await
            .get(&self.key(table))
            .cloned()
            .ok_or_else(|| FetchError::QueryFailure(format!("relation {} does not exist", table.fqn())))
    }
}

impl Clone for MockAdapter {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            tables: Arc::clone(&self.tables),
            errors: Arc::clone(&self.errors),
            requests: Arc::clone(&self.requests),
            fail_connection: self.fail_connection,
            latency_ms: self.latency_ms,
            today: self.today,
            adapter_name: self.adapter_name,
        }
    }
}

#[async_trait::async_trait]
impl SourceAdapter for MockAdapter {
    fn name(&self) -> &'static str {
        self.adapter_name
    }

    fn kind(&self) -> SourceKind {
        self.kind
    }

    async fn exists(&self, table: &TableIdentifier) -> Result<bool, FetchError> {
        self.enter(MockOperation::Exists, table).await?;
        Ok(self.tables.read().await.contains_key(&self.key(table)))
    }

    async fn sample_rows(
        &self,
        table: &TableIdentifier,
        _date_column: &str,
        date: NaiveDate,
        limit: u32,
    ) -> Result<RowSet, FetchError> {
        self.enter(MockOperation::SampleRows, table).await?;
        let contents = self.table(table).await?;

        let columns = contents.columns.iter().map(|c| c.name.clone()).collect();
        let mut rows = contents
            .samples
            .get(&date)
            .cloned()
            .unwrap_or_else(|| RowSet::new(columns, Vec::new()));
        rows.rows.truncate(limit as usize);

        Ok(rows)
    }

    async fn total_count(&self, table: &TableIdentifier) -> Result<u64, FetchError> {
        self.enter(MockOperation::TotalCount, table).await?;
        Ok(self.table(table).await?.total_rows)
    }

    async fn count_by_date(
        &self,
        table: &TableIdentifier,
        _date_column: &str,
        days: u32,
    ) -> Result<Vec<DateCount>, FetchError> {
        self.enter(MockOperation::CountByDate, table).await?;
        let window = DateWindow::trailing(self.today, days);

        let mut counts: Vec<DateCount> = self
            .table(table)
            .await?
            .date_counts
            .into_iter()
            .filter(|dc| window.contains(dc.date))
            .collect();
        counts.sort_by(|a, b| b.date.cmp(&a.date));

        Ok(counts)
    }

    async fn columns(&self, table: &TableIdentifier) -> Result<Vec<ColumnDescriptor>, FetchError> {
        self.enter(MockOperation::Columns, table).await?;
        Ok(self.table(table).await?.columns)
    }

    async fn test_connection(&self) -> Result<(), FetchError> {
        if self.fail_connection {
            Err(FetchError::ConnectionFailure(
                "Simulated connection failure".to_string(),
            ))
        } else {
            Ok(())
        }
    }
}

/// Builder for creating MockAdapter with multiple tables
///
/// # Example
///
/// ```rust,ignore
/// let adapter = MockAdapterBuilder::new(SourceKind::Target)
///     .with_table("sales", "orders", MockTable::new().with_total(10))
///     .with_error("sales", "orders", MockOperation::Columns,
///         FetchError::QueryFailure("permission denied".to_string()))
///     .build();
/// ```
pub struct MockAdapterBuilder {
    kind: SourceKind,
    tables: HashMap<String, MockTable>,
    errors: HashMap<(String, MockOperation), FetchError>,
    fail_connection: bool,
    latency_ms: u64,
    today: NaiveDate,
    adapter_name: &'static str,
}

impl MockAdapterBuilder {
    /// Create a new builder
    pub fn new(kind: SourceKind) -> Self {
        Self {
            kind,
            tables: HashMap::new(),
            errors: HashMap::new(),
            fail_connection: false,
            latency_ms: 0,
            today: Utc::now().date_naive(),
            adapter_name: kind.display_name(),
        }
    }

    /// Add a table
    pub fn with_table(mut self, schema: &str, table: &str, contents: MockTable) -> Self {
        let key = TableIdentifier::without_database(schema, table).lookup_key(self.kind);
        self.tables.insert(key, contents);
        self
    }

    /// Add an error for one operation on a table
    pub fn with_error(mut self, schema: &str, table: &str, operation: MockOperation, error: FetchError) -> Self {
        let key = TableIdentifier::without_database(schema, table).lookup_key(self.kind);
        self.errors.insert((key, operation), error);
        self
    }

    /// Configure connection failure
    pub fn with_connection_failure(mut self) -> Self {
        self.fail_connection = true;
        self
    }

    /// Configure latency
    pub fn with_latency(mut self, latency_ms: u64) -> Self {
        self.latency_ms = latency_ms;
        self
    }

    /// Set the date the trailing window ends on
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }

    /// Set adapter name
    pub fn with_name(mut self, name: &'static str) -> Self {
        self.adapter_name = name;
        self
    }

    /// Build the MockAdapter
    pub fn build(self) -> MockAdapter {
        MockAdapter {
            kind: self.kind,
            tables: Arc::new(RwLock::new(self.tables)),
            errors: Arc::new(RwLock::new(self.errors)),
            requests: Arc::new(RwLock::new(Vec::new())),
            fail_connection: self.fail_connection,
            latency_ms: self.latency_ms,
            today: self.today,
            adapter_name: self.adapter_name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 10, day).unwrap()
    }

    fn orders() -> TableIdentifier {
        TableIdentifier::without_database("sales", "orders")
    }

    #[tokio::test]
    async fn test_mock_adapter_basic() {
        let adapter = MockAdapter::target();
        adapter
            .add_table(
                "sales",
                "orders",
                MockTable::new()
                    .with_column("id", "integer")
                    .with_column("name", "character varying")
                    .with_total(7),
            )
            .await;

        assert!(adapter.exists(&orders()).await.unwrap());
        assert_eq!(adapter.total_count(&orders()).await.unwrap(), 7);

        let columns = adapter.columns(&orders()).await.unwrap();
        assert_eq!(columns.len(), 2);
        assert_eq!(columns[0].name, "id");
    }

    #[tokio::test]
    async fn test_missing_table() {
        let adapter = MockAdapter::target();

        assert!(!adapter.exists(&orders()).await.unwrap());
        assert!(matches!(
            adapter.total_count(&orders()).await,
            Err(FetchError::QueryFailure(_))
        ));
    }

    #[tokio::test]
    async fn test_lookup_follows_casing_convention() {
        let adapter = MockAdapterBuilder::new(SourceKind::Origin)
            .with_table("SALES", "ORDERS", MockTable::new().with_total(3))
            .build();

        let typed = TableIdentifier::new("ANALYTICS", "sales", "orders");
        assert_eq!(adapter.total_count(&typed).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_connection_failure_hits_every_operation() {
        let adapter = MockAdapter::origin().with_connection_failure();

        assert!(matches!(adapter.test_connection().await, Err(FetchError::ConnectionFailure(_))));
        assert!(matches!(adapter.exists(&orders()).await, Err(FetchError::ConnectionFailure(_))));
        assert!(matches!(adapter.columns(&orders()).await, Err(FetchError::ConnectionFailure(_))));
    }

    #[tokio::test]
    async fn test_error_injection_is_per_operation() {
        let adapter = MockAdapterBuilder::new(SourceKind::Target)
            .with_table("sales", "orders", MockTable::new().with_total(5))
            .with_error(
                "sales",
                "orders",
                MockOperation::Columns,
                FetchError::QueryFailure("permission denied".to_string()),
            )
            .build();

        assert_eq!(adapter.total_count(&orders()).await.unwrap(), 5);
        assert_eq!(
            adapter.columns(&orders()).await,
            Err(FetchError::QueryFailure("permission denied".to_string()))
        );
    }

    #[tokio::test]
    async fn test_count_by_date_uses_trailing_window() {
        let adapter = MockAdapterBuilder::new(SourceKind::Target)
            .with_today(date(5))
            .with_table(
                "sales",
                "orders",
                MockTable::new()
                    .with_date_count(date(1), 10)
                    .with_date_count(date(3), 30)
                    .with_date_count(date(5), 50)
                    .with_date_count(date(6), 60)
                    .with_date_count(NaiveDate::from_ymd_opt(2024, 9, 30).unwrap(), 1),
            )
            .build();

        let counts = adapter.count_by_date(&orders(), "time_extracted", 5).await.unwrap();
        assert_eq!(
            counts,
            vec![
                DateCount::new(date(5), 50),
                DateCount::new(date(3), 30),
                DateCount::new(date(1), 10),
            ]
        );
    }

    #[tokio::test]
    async fn test_sample_rows_respects_limit() {
        let rows = RowSet::new(
            vec!["id".to_string()],
            (1..=5).map(|i| vec![Some(i.to_string())]).collect(),
        );
        let adapter = MockAdapterBuilder::new(SourceKind::Target)
            .with_table(
                "sales",
                "orders",
                MockTable::new().with_column("id", "integer").with_sample(date(1), rows),
            )
            .build();

        let sample = adapter.sample_rows(&orders(), "time_extracted", date(1), 3).await.unwrap();
        assert_eq!(sample.len(), 3);

        let empty = adapter.sample_rows(&orders(), "time_extracted", date(2), 3).await.unwrap();
        assert!(empty.is_empty());
        assert_eq!(empty.columns, vec!["id".to_string()]);
    }

    #[tokio::test]
    async fn test_requests_are_recorded() {
        let adapter = MockAdapter::target();
        let table = TableIdentifier::without_database("schema", "orders");

        let _ = adapter.exists(&table).await;
        let _ = adapter.total_count(&table).await;

        let requests = adapter.requests().await;
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].operation, MockOperation::Exists);
        assert_eq!(requests[1].table, table);

        adapter.clear_requests().await;
        assert!(adapter.requests().await.is_empty());
    }

    #[tokio::test]
    async fn test_mock_adapter_name_and_clone() {
        let adapter = MockAdapter::origin();
        assert_eq!(adapter.name(), "Snowflake");
        assert_eq!(adapter.kind(), SourceKind::Origin);

        let renamed = MockAdapter::target().with_name("TestRedshift");
        assert_eq!(renamed.name(), "TestRedshift");

        let cloned = adapter.clone();
        adapter.add_table("s", "t", MockTable::new()).await;
        assert_eq!(cloned.table_count().await, 1);
    }
}
