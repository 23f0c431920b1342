//! Turns an audit result into a report document
//!
//! Sections always appear in the same order. A section whose data could
//! not be fetched explains why instead of showing its table.

use crate::document::{ReportDocument, TableBlock, REPORT_TITLE};
use migaudit_core::{CountResult, DateCount, ExistenceResult, FetchOutcome, SourceKind};
use migaudit_engine::{AuditResult, ColumnDiff, ExistenceVerdict, SideFetch, TotalsVerdict};
use std::collections::BTreeSet;

pub const SUMMARY_HEADING: &str = "Executive Summary";
pub const EXISTENCE_HEADING: &str = "Table Existence Check";
pub const TOTALS_HEADING: &str = "Total Record Count Comparison";
pub const COLUMNS_HEADING: &str = "Column Comparison between Snowflake and Redshift";
pub const DATE_COMPARISON_TABLE: &str = "Date Comparison Result";
pub const TYPE_MISMATCH_TABLE: &str = "Columns with Different Data Types";

/// Builds the report document for one audit
#[derive(Debug, Clone, Default)]
pub struct ReportBuilder;

impl ReportBuilder {
    pub fn new() -> Self {
        Self
    }

    pub fn build(&self, result: &AuditResult) -> ReportDocument {
        let mut doc = ReportDocument::new(REPORT_TITLE);

        summary_section(&mut doc, result);
        existence_section(&mut doc, result);
        totals_section(&mut doc, result);
        date_count_section(&mut doc, result);
        column_section(&mut doc, result);

        doc
    }
}

fn sides(result: &AuditResult) -> [&SideFetch; 2] {
    [&result.origin, &result.target]
}

fn origin_name(result: &AuditResult) -> &'static str {
    result.origin.source.display_name()
}

fn target_name(result: &AuditResult) -> &'static str {
    result.target.source.display_name()
}

fn summary_section(doc: &mut ReportDocument, result: &AuditResult) {
    doc.heading(SUMMARY_HEADING);
    doc.paragraph(format!(
        "This report audits the migration of table {} from {} to {}.",
        result.table,
        origin_name(result),
        target_name(result)
    ));
    doc.bullets(vec![
        format!("Analysis date: {}", result.analysis_date.format("%Y-%m-%d")),
        format!("Report generated: {}", result.generated_at.format("%Y-%m-%d %H:%M:%S")),
        format!("Date column: {}", result.date_column),
    ]);

    if result.is_clean() {
        doc.paragraph("Overall result: every check passed.");
    } else {
        doc.paragraph("Overall result: discrepancies or errors were found, see the sections below.");
    }
    doc.paragraph("The results of each check follow.");
}

fn existence_line(kind: SourceKind, existence: &ExistenceResult) -> String {
    match (&existence.error, existence.exists) {
        (Some(error), _) => format!("{}: could not be checked ({}).", kind, error),
        (None, true) => format!("{}: exists.", kind),
        (None, false) => format!("{}: does not exist.", kind),
    }
}

fn existence_section(doc: &mut ReportDocument, result: &AuditResult) {
    doc.heading(EXISTENCE_HEADING);
    doc.bullets(
        sides(result)
            .iter()
            .map(|side| existence_line(side.source, &side.existence))
            .collect(),
    );

    let verdict = match result.existence {
        ExistenceVerdict::BothExist => "The table exists in both warehouses.".to_string(),
        ExistenceVerdict::NeitherExists => "The table exists in neither warehouse.".to_string(),
        ExistenceVerdict::OnlyLeft => format!("The table exists only in {}.", origin_name(result)),
        ExistenceVerdict::OnlyRight => format!("The table exists only in {}.", target_name(result)),
    };
    doc.paragraph(verdict);
}

fn total_line(kind: SourceKind, total: &CountResult) -> String {
    match (total.total, &total.error) {
        (Some(n), _) => format!("Total records in {}: {}.", kind, n),
        (None, Some(error)) => format!("Total records in {}: Error ({}).", kind, error),
        (None, None) => format!("Total records in {}: Error.", kind),
    }
}

fn totals_section(doc: &mut ReportDocument, result: &AuditResult) {
    doc.heading(TOTALS_HEADING);
    doc.bullets(
        sides(result)
            .iter()
            .map(|side| total_line(side.source, &side.total))
            .collect(),
    );

    let verdict = match result.totals {
        TotalsVerdict::Match => "The total record count is identical in both warehouses.".to_string(),
        TotalsVerdict::Mismatch => {
            let left = result.origin.total.total.unwrap_or_default();
            let right = result.target.total.total.unwrap_or_default();
            format!(
                "The total record count is different in the two warehouses (difference of {}).",
                left.abs_diff(right)
            )
        }
        TotalsVerdict::Indeterminate => {
            "The total record counts could not be compared because of errors in the counts.".to_string()
        }
    };
    doc.paragraph(verdict);
}

fn raw_date_table(doc: &mut ReportDocument, kind: SourceKind, counts: &FetchOutcome<Vec<DateCount>>) {
    match (&counts.value, &counts.error) {
        (Some(counts), _) => {
            let mut table = TableBlock::new(
                format!("Records by Date in {}", kind),
                &["extraction_date", "record_count"],
            );
            for dc in counts {
                table = table.with_row(vec![dc.date.format("%Y-%m-%d").to_string(), dc.count.to_string()]);
            }
            doc.table(table);
        }
        (None, error) => doc.paragraph(format!(
            "Records by date in {} could not be fetched: {}.",
            kind,
            error.as_deref().unwrap_or("unknown error")
        )),
    }
}

fn date_count_section(doc: &mut ReportDocument, result: &AuditResult) {
    doc.heading(format!("Record Count by Date Comparison (Last {} Days)", result.days));

    for side in sides(result) {
        raw_date_table(doc, side.source, &side.date_counts);
    }

    doc.paragraph(format!(
        "Record counts grouped by {} date were compared for the last {} days ending on the day of the audit.",
        result.date_column, result.days
    ));

    let Some(diff) = &result.date_counts else {
        doc.paragraph("Record counts by date could not be compared because of query errors.");
        return;
    };

    let origin = origin_name(result).to_lowercase();
    let target = target_name(result).to_lowercase();
    let mut table = TableBlock::new(
        DATE_COMPARISON_TABLE,
        &[
            "extraction_date",
            &format!("record_count_{}", origin),
            &format!("record_count_{}", target),
            "match",
        ],
    );
    for row in &diff.rows {
        table = table.with_row(vec![
            row.date.format("%Y-%m-%d").to_string(),
            row.left_count.to_string(),
            row.right_count.to_string(),
            if row.matches { "yes" } else { "no" }.to_string(),
        ]);
    }
    doc.table(table);

    if diff.is_empty() {
        doc.paragraph("Neither warehouse has records in this window.");
    } else if diff.all_match() {
        doc.paragraph("Record counts by date match in both warehouses.");
    } else {
        doc.paragraph(format!(
            "There are discrepancies in record counts by date between {} and {} ({} of {} dates differ).",
            origin_name(result),
            target_name(result),
            diff.mismatches().count(),
            diff.rows.len()
        ));
    }
}

fn name_list(names: &BTreeSet<String>) -> String {
    if names.is_empty() {
        "None".to_string()
    } else {
        names.iter().cloned().collect::<Vec<_>>().join(", ")
    }
}

fn column_section(doc: &mut ReportDocument, result: &AuditResult) {
    doc.heading(COLUMNS_HEADING);

    let Some(diff) = &result.columns else {
        doc.bullets(
            sides(result)
                .iter()
                .filter_map(|side| {
                    side.columns
                        .error
                        .as_ref()
                        .map(|e| format!("Columns in {} could not be fetched: {}.", side.source, e))
                })
                .collect(),
        );
        doc.paragraph("Columns could not be compared because of query errors.");
        return;
    };

    column_diff_body(doc, result, diff);
}

fn column_diff_body(doc: &mut ReportDocument, result: &AuditResult, diff: &ColumnDiff) {
    doc.bullets(vec![
        format!("Columns only in {}: {}.", origin_name(result), name_list(&diff.only_in_left)),
        format!("Columns only in {}: {}.", target_name(result), name_list(&diff.only_in_right)),
    ]);

    if diff.type_mismatches.is_empty() {
        doc.paragraph("No data type discrepancies were found in common columns.");
        return;
    }

    let mut table = TableBlock::new(
        TYPE_MISMATCH_TABLE,
        &[
            "Column",
            &format!("Type in {}", origin_name(result)),
            &format!("Type in {}", target_name(result)),
        ],
    )
    .with_weights(vec![2, 1, 1]);
    for mismatch in &diff.type_mismatches {
        table = table.with_row(vec![
            mismatch.column.clone(),
            mismatch.left_type.clone(),
            mismatch.right_type.clone(),
        ]);
    }
    doc.table(table);
    doc.paragraph("Data type discrepancies were found in common columns.");
}
