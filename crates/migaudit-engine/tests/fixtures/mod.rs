//! Shared mock warehouses for audit runner tests

#![allow(dead_code)]

use chrono::NaiveDate;
use migaudit_catalog::{MockAdapter, MockAdapterBuilder, MockTable};
use migaudit_core::{SourceKind, TableNameResolver};
use migaudit_engine::AuditRunner;

pub fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 10, d).unwrap()
}

pub fn today() -> NaiveDate {
    day(5)
}

pub fn resolver() -> TableNameResolver {
    TableNameResolver::new(Some("PROD".to_string()), Some("MFS_LENDING".to_string()))
}

/// Loans table with matching contents in both warehouses
pub fn clean_pair() -> (MockAdapter, MockAdapter) {
    let origin = MockAdapterBuilder::new(SourceKind::Origin)
        .with_today(today())
        .with_table(
            "MFS_LENDING",
            "LOANS",
            MockTable::new()
                .with_column("LOAN_ID", "NUMBER")
                .with_column("STATUS", "TEXT")
                .with_total(600)
                .with_date_count(day(5), 300)
                .with_date_count(day(4), 300),
        )
        .build();

    let target = MockAdapterBuilder::new(SourceKind::Target)
        .with_today(today())
        .with_table(
            "mfs_lending",
            "loans",
            MockTable::new()
                .with_column("loan_id", "number")
                .with_column("status", "text")
                .with_total(600)
                .with_date_count(day(5), 300)
                .with_date_count(day(4), 300),
        )
        .build();

    (origin, target)
}

/// Loans table that lost rows and changed a type on the way to Redshift
pub fn drifted_pair() -> (MockAdapter, MockAdapter) {
    let (origin, _) = clean_pair();

    let target = MockAdapterBuilder::new(SourceKind::Target)
        .with_today(today())
        .with_table(
            "mfs_lending",
            "loans",
            MockTable::new()
                .with_column("loan_id", "bigint")
                .with_column("status", "text")
                .with_column("loaded_at", "timestamp")
                .with_total(550)
                .with_date_count(day(5), 300)
                .with_date_count(day(4), 250),
        )
        .build();

    (origin, target)
}

pub fn runner(origin: &MockAdapter, target: &MockAdapter) -> AuditRunner {
    AuditRunner::new(resolver(), Box::new(origin.clone()), Box::new(target.clone()))
}
