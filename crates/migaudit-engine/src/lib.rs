//! migaudit engine - reconciliation and audit orchestration
//!
//! This crate implements the audit logic on top of the adapters:
//! - Pure comparisons of two sides' fetched metadata
//! - Assembly of an immutable audit result
//! - The runner that fetches both sides and folds failures into data

pub mod reconcile;
pub mod audit;
pub mod runner;

pub use audit::{AuditResult, BothSides, SideFetch};
pub use reconcile::{
    compare_columns, compare_date_counts, compare_existence, compare_totals, ColumnDiff,
    DateCountDiff, DateCountRow, ExistenceVerdict, TotalsVerdict, TypeMismatch,
};
pub use runner::AuditRunner;
