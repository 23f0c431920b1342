//! Reconciliation of origin ("left") and target ("right") metadata
//!
//! Every function here is pure: it takes already-fetched values and
//! classifies their differences. No SQL, no I/O.

use migaudit_core::{ColumnDescriptor, DateCount, ExistenceResult};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Where the table was found
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExistenceVerdict {
    BothExist,
    NeitherExists,
    OnlyLeft,
    OnlyRight,
}

impl ExistenceVerdict {
    /// Both sides agree
    pub fn is_consistent(&self) -> bool {
        matches!(self, Self::BothExist | Self::NeitherExists)
    }
}

/// Compare existence; an errored side counts as not existing
pub fn compare_existence(left: &ExistenceResult, right: &ExistenceResult) -> ExistenceVerdict {
    let found = |r: &ExistenceResult| r.error.is_none() && r.exists;

    match (found(left), found(right)) {
        (true, true) => ExistenceVerdict::BothExist,
        (false, false) => ExistenceVerdict::NeitherExists,
        (true, false) => ExistenceVerdict::OnlyLeft,
        (false, true) => ExistenceVerdict::OnlyRight,
    }
}

/// Outcome of comparing total row counts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TotalsVerdict {
    Match,
    Mismatch,

    /// At least one side has no count
    Indeterminate,
}

pub fn compare_totals(left: Option<u64>, right: Option<u64>) -> TotalsVerdict {
    match (left, right) {
        (Some(l), Some(r)) if l == r => TotalsVerdict::Match,
        (Some(_), Some(_)) => TotalsVerdict::Mismatch,
        _ => TotalsVerdict::Indeterminate,
    }
}

/// One date of the merged per-date counts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateCountRow {
    pub date: NaiveDate,

    /// 0 when the date is absent on the left
    pub left_count: u64,

    /// 0 when the date is absent on the right
    pub right_count: u64,

    pub matches: bool,
}

/// Full outer join of two sides' per-date counts, newest date first
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateCountDiff {
    pub rows: Vec<DateCountRow>,
}

impl DateCountDiff {
    /// Every date matches; vacuously true when there are no dates
    pub fn all_match(&self) -> bool {
        self.rows.iter().all(|r| r.matches)
    }

    pub fn mismatches(&self) -> impl Iterator<Item = &DateCountRow> {
        self.rows.iter().filter(|r| !r.matches)
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Join per-date counts on date.
///
/// Duplicate dates within one side are summed.
pub fn compare_date_counts(left: &[DateCount], right: &[DateCount]) -> DateCountDiff {
    let mut merged: BTreeMap<NaiveDate, (u64, u64)> = BTreeMap::new();

    for dc in left {
        merged.entry(dc.date).or_default().0 += dc.count;
    }
    for dc in right {
        merged.entry(dc.date).or_default().1 += dc.count;
    }

    let rows = merged
        .into_iter()
        .rev()
        .map(|(date, (left_count, right_count))| DateCountRow {
            date,
            left_count,
            right_count,
            matches: left_count == right_count,
        })
        .collect();

    DateCountDiff { rows }
}

/// A column present on both sides with different types
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeMismatch {
    /// Uppercased column name
    pub column: String,

    /// Lowercased left type
    pub left_type: String,

    /// Lowercased right type
    pub right_type: String,
}

/// Column name and type differences
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDiff {
    pub only_in_left: BTreeSet<String>,
    pub only_in_right: BTreeSet<String>,

    /// Ordered by column name
    pub type_mismatches: Vec<TypeMismatch>,
}

impl ColumnDiff {
    /// Same column names with the same types
    pub fn is_clean(&self) -> bool {
        self.only_in_left.is_empty() && self.only_in_right.is_empty() && self.type_mismatches.is_empty()
    }
}

/// Uppercased name to lowercased type; the first occurrence of a name wins
fn column_map(columns: &[ColumnDescriptor]) -> BTreeMap<String, String> {
    let mut map = BTreeMap::new();
    for column in columns {
        map.entry(column.match_name()).or_insert_with(|| column.match_type());
    }
    map
}

/// Compare column lists case-insensitively
pub fn compare_columns(left: &[ColumnDescriptor], right: &[ColumnDescriptor]) -> ColumnDiff {
    let left = column_map(left);
    let right = column_map(right);

    let only_in_left = left.keys().filter(|k| !right.contains_key(*k)).cloned().collect();
    let only_in_right = right.keys().filter(|k| !left.contains_key(*k)).cloned().collect();

    let type_mismatches = left
        .iter()
        .filter_map(|(name, left_type)| {
            let right_type = right.get(name)?;
            (left_type != right_type).then(|| TypeMismatch {
                column: name.clone(),
                left_type: left_type.clone(),
                right_type: right_type.clone(),
            })
        })
        .collect();

    ColumnDiff {
        only_in_left,
        only_in_right,
        type_mismatches,
    }
}
