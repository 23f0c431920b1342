//! Audit result assembly

use crate::reconcile::{
    compare_columns, compare_date_counts, compare_existence, compare_totals, ColumnDiff,
    DateCountDiff, ExistenceVerdict, TotalsVerdict,
};
use chrono::{NaiveDate, NaiveDateTime};
use migaudit_core::{
    ColumnDescriptor, CountResult, DateCount, ExistenceResult, FetchOutcome, SourceKind,
    TableIdentifier,
};
use serde::{Deserialize, Serialize};

/// One value per warehouse
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BothSides<T> {
    pub origin: T,
    pub target: T,
}

impl<T> BothSides<T> {
    pub fn new(origin: T, target: T) -> Self {
        Self { origin, target }
    }

    /// Origin first, then target
    pub fn iter(&self) -> impl Iterator<Item = (SourceKind, &T)> {
        [(SourceKind::Origin, &self.origin), (SourceKind::Target, &self.target)].into_iter()
    }
}

fn both_fetched<T, R>(
    origin: &FetchOutcome<T>,
    target: &FetchOutcome<T>,
    compare: impl FnOnce(&T, &T) -> R,
) -> Option<R> {
    match (origin.as_ref(), target.as_ref()) {
        (Some(left), Some(right)) => Some(compare(left, right)),
        _ => None,
    }
}

impl BothSides<CountResult> {
    pub fn compare(&self) -> TotalsVerdict {
        compare_totals(self.origin.total, self.target.total)
    }
}

impl BothSides<ExistenceResult> {
    pub fn compare(&self) -> ExistenceVerdict {
        compare_existence(&self.origin, &self.target)
    }
}

impl BothSides<FetchOutcome<Vec<DateCount>>> {
    /// Merged per-date rows; `None` when either side failed
    pub fn compare(&self) -> Option<DateCountDiff> {
        both_fetched(&self.origin, &self.target, |l, r| compare_date_counts(l, r))
    }
}

impl BothSides<FetchOutcome<Vec<ColumnDescriptor>>> {
    /// Column differences; `None` when either side failed
    pub fn compare(&self) -> Option<ColumnDiff> {
        both_fetched(&self.origin, &self.target, |l, r| compare_columns(l, r))
    }
}

/// Everything fetched from one warehouse
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SideFetch {
    pub source: SourceKind,

    /// Resolved identifier; absent when the name did not resolve
    pub table: Option<TableIdentifier>,

    pub existence: ExistenceResult,
    pub total: CountResult,
    pub date_counts: FetchOutcome<Vec<DateCount>>,
    pub columns: FetchOutcome<Vec<ColumnDescriptor>>,
}

/// Immutable outcome of one full audit run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditResult {
    /// Table name as the user typed it
    pub table: String,

    /// Date the audit is about, used in the report name
    pub analysis_date: NaiveDate,

    /// Local time the audit ran
    pub generated_at: NaiveDateTime,

    pub date_column: String,
    pub days: u32,

    pub origin: SideFetch,
    pub target: SideFetch,

    pub existence: ExistenceVerdict,
    pub totals: TotalsVerdict,

    /// Absent when either side's per-date counts failed
    pub date_counts: Option<DateCountDiff>,

    /// Absent when either side's column listing failed
    pub columns: Option<ColumnDiff>,
}

impl AuditResult {
    /// Run every comparison over both sides' fetches
    pub fn assemble(
        table: impl Into<String>,
        analysis_date: NaiveDate,
        generated_at: NaiveDateTime,
        date_column: impl Into<String>,
        days: u32,
        origin: SideFetch,
        target: SideFetch,
    ) -> Self {
        let existence = compare_existence(&origin.existence, &target.existence);
        let totals = compare_totals(origin.total.total, target.total.total);

        let date_counts = both_fetched(&origin.date_counts, &target.date_counts, |l, r| compare_date_counts(l, r));
        let columns = both_fetched(&origin.columns, &target.columns, |l, r| compare_columns(l, r));

        Self {
            table: table.into(),
            analysis_date,
            generated_at,
            date_column: date_column.into(),
            days,
            origin,
            target,
            existence,
            totals,
            date_counts,
            columns,
        }
    }

    /// Both sides agree on every check
    pub fn is_clean(&self) -> bool {
        self.existence == ExistenceVerdict::BothExist
            && self.totals == TotalsVerdict::Match
            && self.date_counts.as_ref().is_some_and(DateCountDiff::all_match)
            && self.columns.as_ref().is_some_and(ColumnDiff::is_clean)
    }

    /// Fetch of one side
    pub fn side(&self, kind: SourceKind) -> &SideFetch {
        match kind {
            SourceKind::Origin => &self.origin,
            SourceKind::Target => &self.target,
        }
    }
}
