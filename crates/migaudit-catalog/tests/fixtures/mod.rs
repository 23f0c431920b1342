//! Test fixtures for warehouse adapter integration tests
//!
//! A loans table as it looks in Snowflake before migration and in Redshift
//! after it, with catalog types in each warehouse's own spelling.

#![allow(dead_code)]

use chrono::NaiveDate;
use migaudit_catalog::{MockAdapter, MockAdapterBuilder, MockTable};
use migaudit_core::{RowSet, SourceKind};

/// Date the fixture adapters treat as today
pub fn today() -> NaiveDate {
    day(5)
}

/// A day in October 2024
pub fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 10, d).unwrap()
}

/// Loans table in Snowflake
///
/// Columns are uppercase with Snowflake type names, and three days of
/// extractions fall inside a five day window.
pub fn origin_loans() -> MockTable {
    MockTable::new()
        .with_column("LOAN_ID", "NUMBER")
        .with_column("CUSTOMER_ID", "NUMBER")
        .with_column("AMOUNT", "NUMBER")
        .with_column("STATUS", "TEXT")
        .with_column("TIME_EXTRACTED", "TIMESTAMP_NTZ")
        .with_total(1_200)
        .with_date_count(day(5), 400)
        .with_date_count(day(4), 400)
        .with_date_count(day(3), 400)
        .with_sample(day(5), sample_rows(&["LOAN_ID", "STATUS"]))
}

/// Loans table in Redshift after migration
///
/// Lowercase names and Redshift type names. `AMOUNT` became a numeric and
/// one day is missing rows.
pub fn target_loans() -> MockTable {
    MockTable::new()
        .with_column("loan_id", "bigint")
        .with_column("customer_id", "bigint")
        .with_column("amount", "numeric")
        .with_column("status", "character varying")
        .with_column("time_extracted", "timestamp without time zone")
        .with_total(1_150)
        .with_date_count(day(5), 400)
        .with_date_count(day(4), 350)
        .with_date_count(day(3), 400)
        .with_sample(day(5), sample_rows(&["loan_id", "status"]))
}

/// Three sample rows, the last one with a NULL status
pub fn sample_rows(columns: &[&str]) -> RowSet {
    RowSet::new(
        columns.iter().map(|c| c.to_string()).collect(),
        vec![
            vec![Some("1".to_string()), Some("ACTIVE".to_string())],
            vec![Some("2".to_string()), Some("CLOSED".to_string())],
            vec![Some("3".to_string()), None],
        ],
    )
}

/// Snowflake mock holding `MFS_LENDING.LOANS`
pub fn origin_adapter() -> MockAdapter {
    MockAdapterBuilder::new(SourceKind::Origin)
        .with_today(today())
        .with_table("MFS_LENDING", "LOANS", origin_loans())
        .build()
}

/// Redshift mock holding `mfs_lending.loans`
pub fn target_adapter() -> MockAdapter {
    MockAdapterBuilder::new(SourceKind::Target)
        .with_today(today())
        .with_table("mfs_lending", "loans", target_loans())
        .build()
}
