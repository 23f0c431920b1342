//! Source adapter trait for the five audit queries

use chrono::NaiveDate;
use migaudit_core::{ColumnDescriptor, DateCount, FetchError, RowSet, SourceKind, TableIdentifier};

/// A warehouse that can be audited.
///
/// Every operation opens its own session and closes it before returning,
/// whatever the outcome. Operations are independent: there is no
/// transaction spanning them and no retry.
#[async_trait::async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Get the adapter name (e.g., "Snowflake", "Redshift")
    fn name(&self) -> &'static str;

    /// Which side of the migration this warehouse is
    fn kind(&self) -> SourceKind;

    /// Check the catalog for a table with this schema and name
    async fn exists(&self, table: &TableIdentifier) -> Result<bool, FetchError>;

    /// `SELECT * FROM table WHERE DATE(date_column) = date LIMIT limit`
    ///
    /// An empty result is `Ok` with zero rows.
    async fn sample_rows(
        &self,
        table: &TableIdentifier,
        date_column: &str,
        date: NaiveDate,
        limit: u32,
    ) -> Result<RowSet, FetchError>;

    /// `SELECT COUNT(*) FROM table`
    async fn total_count(&self, table: &TableIdentifier) -> Result<u64, FetchError>;

    /// Row counts per `DATE(date_column)` over the last `days` days ending
    /// today (warehouse clock), newest first.
    async fn count_by_date(
        &self,
        table: &TableIdentifier,
        date_column: &str,
        days: u32,
    ) -> Result<Vec<DateCount>, FetchError>;

    /// Column names and types in ordinal order
    async fn columns(&self, table: &TableIdentifier) -> Result<Vec<ColumnDescriptor>, FetchError>;

    /// Open and close a session without querying any table.
    ///
    /// This is useful for validating credentials before running checks.
    async fn test_connection(&self) -> Result<(), FetchError>;
}
