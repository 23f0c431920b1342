//! Data fetched from a warehouse during an audit

use crate::error::FetchError;
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

/// A column as listed by a warehouse catalog
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    /// Column name as stored in the catalog
    pub name: String,

    /// Data type name as reported by the catalog
    pub data_type: String,
}

impl ColumnDescriptor {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
        }
    }

    /// Name used for cross-warehouse matching
    pub fn match_name(&self) -> String {
        self.name.to_uppercase()
    }

    /// Type used for cross-warehouse matching
    pub fn match_type(&self) -> String {
        self.data_type.to_lowercase()
    }
}

/// Number of rows whose date column falls on `date`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DateCount {
    pub date: NaiveDate,
    pub count: u64,
}

impl DateCount {
    pub fn new(date: NaiveDate, count: u64) -> Self {
        Self { date, count }
    }
}

/// Inclusive range of calendar days ending at `end`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    /// The last `days` days ending at `today`, i.e. `[today - (days-1), today]`.
    ///
    /// A zero-day window is treated as one day. A window reaching past the
    /// earliest representable date starts at `NaiveDate::MIN`.
    pub fn trailing(today: NaiveDate, days: u32) -> Self {
        let span = i64::from(days.max(1)) - 1;
        Self {
            start: today
                .checked_sub_signed(Duration::days(span))
                .unwrap_or(NaiveDate::MIN),
            end: today,
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }
}

/// Rows returned by a sample query, every cell rendered as text
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowSet {
    /// Column names in result order
    pub columns: Vec<String>,

    /// Row values; `None` is SQL NULL
    pub rows: Vec<Vec<Option<String>>>,
}

impl RowSet {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Option<String>>>) -> Self {
        Self { columns, rows }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }
}

/// Outcome of a table existence check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExistenceResult {
    /// Whether the table was found; always false when `error` is set
    pub exists: bool,

    /// Failure text, takes precedence over `exists` when displayed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ExistenceResult {
    pub fn found(exists: bool) -> Self {
        Self { exists, error: None }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            exists: false,
            error: Some(error.into()),
        }
    }
}

impl From<Result<bool, FetchError>> for ExistenceResult {
    fn from(result: Result<bool, FetchError>) -> Self {
        match result {
            Ok(exists) => Self::found(exists),
            Err(e) => Self::failed(e.to_string()),
        }
    }
}

/// Outcome of a total row count
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountResult {
    /// Row count, absent iff `error` is set
    pub total: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CountResult {
    pub fn counted(total: u64) -> Self {
        Self {
            total: Some(total),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            total: None,
            error: Some(error.into()),
        }
    }
}

impl From<Result<u64, FetchError>> for CountResult {
    fn from(result: Result<u64, FetchError>) -> Self {
        match result {
            Ok(total) => Self::counted(total),
            Err(e) => Self::failed(e.to_string()),
        }
    }
}

/// Result-or-error pair for data-returning operations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchOutcome<T> {
    /// Fetched value, absent iff `error` is set
    pub value: Option<T>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> FetchOutcome<T> {
    pub fn ok(value: T) -> Self {
        Self {
            value: Some(value),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            value: None,
            error: Some(error.into()),
        }
    }

    pub fn as_ref(&self) -> Option<&T> {
        self.value.as_ref()
    }

    pub fn is_ok(&self) -> bool {
        self.value.is_some()
    }
}

impl<T> From<Result<T, FetchError>> for FetchOutcome<T> {
    fn from(result: Result<T, FetchError>) -> Self {
        match result {
            Ok(value) => Self::ok(value),
            Err(e) => Self::failed(e.to_string()),
        }
    }
}
